//! 領域サイズおよびアドレスのアライメント関連の構成要素.
use crate::{ErrorKind, Result};

/// アロケータのアライメント単位を表現するための構造体.
///
/// プールのサイズ、各領域のサイズおよび開始アドレスは、全てこの単位の倍数に揃えられる.
///
/// アライメント単位は二の冪であり、かつ`Alignment::MIN`以上である必要がある.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment(usize);
impl Alignment {
    /// 許容されるアライメントの最小値(ワード境界).
    ///
    /// また`Alignment::default()`で使われる値でもある.
    pub const MIN: usize = 4;

    /// 最小のアライメントを持つ`Alignment`インスタンスを返す.
    ///
    /// # Examples
    ///
    /// ```
    /// use fitalloc::Alignment;
    ///
    /// assert_eq!(Alignment::min().as_usize(), Alignment::MIN);
    /// ```
    pub fn min() -> Self {
        Alignment(Self::MIN)
    }

    /// 指定された値のアライメントを表現する`Alignment`インスタンスを生成する.
    ///
    /// # Errors
    ///
    /// 以下の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される:
    ///
    /// - `alignment`が`Alignment::MIN`未満
    /// - `alignment`が二の冪ではない
    ///
    /// # Examples
    ///
    /// ```
    /// use fitalloc::{Alignment, ErrorKind};
    ///
    /// assert_eq!(Alignment::new(4).ok().map(|a| a.as_usize()), Some(4));
    /// assert_eq!(Alignment::new(16).ok().map(|a| a.as_usize()), Some(16));
    ///
    /// assert_eq!(Alignment::new(2).err().map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
    /// assert_eq!(Alignment::new(12).err().map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new(alignment: usize) -> Result<Self> {
        track_assert!(alignment >= Self::MIN, ErrorKind::InvalidInput; alignment);
        track_assert!(alignment.is_power_of_two(), ErrorKind::InvalidInput; alignment);
        Ok(Alignment(alignment))
    }

    /// `size`以上の最小のアライメント境界を返す.
    ///
    /// 結果が`usize`に収まらない場合には`None`が返される.
    ///
    /// # Examples
    ///
    /// ```
    /// use fitalloc::Alignment;
    ///
    /// let alignment = Alignment::min();
    /// assert_eq!(alignment.ceil_align(0), Some(0));
    /// assert_eq!(alignment.ceil_align(1), Some(4));
    /// assert_eq!(alignment.ceil_align(10), Some(12));
    /// assert_eq!(alignment.ceil_align(12), Some(12));
    /// assert_eq!(alignment.ceil_align(usize::MAX), None);
    /// ```
    pub fn ceil_align(self, size: usize) -> Option<usize> {
        let mask = self.0 - 1;
        size.checked_add(mask).map(|n| n & !mask)
    }

    /// `size`以下の最大のアライメント境界を返す.
    pub fn floor_align(self, size: usize) -> usize {
        size & !(self.0 - 1)
    }

    /// 指定値がアライメント境界に沿っているかどうかを判定する.
    pub fn is_aligned(self, size: usize) -> bool {
        self.floor_align(size) == size
    }

    /// アライメント値を`usize`に変換して返す.
    pub fn as_usize(self) -> usize {
        self.0
    }
}
impl Default for Alignment {
    fn default() -> Self {
        Self::min()
    }
}
