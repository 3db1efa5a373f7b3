use std::fmt;
use std::ops::Add;

/// プール内の位置を表すアドレス.
///
/// 値はプールの先頭からのオフセット(バイト単位)である.
/// 実際のポインタへの変換は[`Allocator::as_ptr`]で行う.
///
/// [`Allocator::as_ptr`]: ./struct.Allocator.html#method.as_ptr
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Default)]
pub struct Address(usize);
impl Address {
    /// プールの先頭を示すアドレス.
    pub const BASE: Address = Address(0);

    /// アドレスの値(オフセット)を返す.
    pub fn as_usize(self) -> usize {
        self.0
    }
}
impl From<usize> for Address {
    fn from(from: usize) -> Self {
        Address(from)
    }
}
impl Add<usize> for Address {
    type Output = Self;
    fn add(self, rhs: usize) -> Self {
        Address(self.0 + rhs)
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
