/// crate固有のエラー型.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(trackable::error::TrackableError<ErrorKind>);

/// 発生し得るエラーの種別.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// プールの確保に失敗した.
    ///
    /// 下位のアロケータ(`posix_memalign`)が要求サイズのバッファを用意できなかった場合に返される.
    ///
    /// # 典型的な対応策
    ///
    /// - より小さなプールサイズで初期化し直す
    OutOfMemory,

    /// 台帳(ledger)のスロットが枯渇している.
    ///
    /// 生存中の領域数が、構築時に指定された容量を超えようとした場合に返される.
    /// この場合、台帳の状態は一切変更されていない.
    ///
    /// # 典型的な対応策
    ///
    /// - 不要な割当領域を解放する
    /// - より大きな`ledger_capacity`でアロケータを構築し直す
    LedgerFull,

    /// 解放対象のアドレスが、生存中の割当領域のいずれとも一致しない.
    ///
    /// 二重解放や、アロケータが返していないアドレスの解放がこれに該当する.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者側のプログラムを修正する
    InvalidFree,

    /// プールを保持していないアロケータに対して操作が行われた.
    ///
    /// # 典型的な対応策
    ///
    /// - 先に`Allocator::initialize`を呼び出す
    Uninitialized,

    /// 入力が不正.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者側のプログラムを修正して入力を正しくする
    InvalidInput,

    /// 内部状態が不整合に陥っている.
    ///
    /// プログラムにバグがあることを示している.
    ///
    /// # 典型的な対応策
    ///
    /// - バグ修正を行ってプログラムを更新する
    InconsistentState,
}
impl trackable::error::ErrorKind for ErrorKind {}
