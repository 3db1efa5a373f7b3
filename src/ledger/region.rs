//! Region

use crate::Address;

/// 領域の種別.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// 利用者に割り当て済みの領域.
    Process,

    /// 空き(割当可能)領域.
    Hole,
}

/// 台帳に記録されるプール内の部分領域.
///
/// `[base, base + size)`の範囲を表す.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// 領域の開始位置.
    pub base: Address,

    /// 領域の長さ(バイト単位).
    ///
    /// 常にアライメント単位の倍数となる.
    pub size: usize,

    /// 領域の種別.
    pub kind: RegionKind,
}
impl Region {
    /// 領域の終端位置を返す.
    ///
    /// **注意**: 終端は排他的であり、`end`の位置自体は領域に含まれない.
    pub fn end(&self) -> Address {
        self.base + self.size
    }

    /// 空き領域かどうかを判定する.
    pub fn is_hole(&self) -> bool {
        self.kind == RegionKind::Hole
    }

    /// 割当済み領域かどうかを判定する.
    pub fn is_process(&self) -> bool {
        self.kind == RegionKind::Process
    }
}
