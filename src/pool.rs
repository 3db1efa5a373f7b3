//! アロケータが領域を切り出す元となる、連続したメモリプール.
use std::ptr::{self, NonNull};
use std::slice;

use crate::alignment::Alignment;
use crate::{Address, ErrorKind, Result};

/// 一度だけ確保され、一度だけ解放される生のバイト列.
///
/// アロケータが返すアドレスは、全てこのプールの先頭からのオフセットである.
///
/// 確保直後の内容はゼロで埋められている.
#[derive(Debug)]
pub struct Pool {
    ptr: NonNull<u8>,
    len: usize,
}
unsafe impl Send for Pool {}
impl Pool {
    /// `len`バイトのプールを確保する.
    ///
    /// 先頭アドレスは`alignment`の境界に揃えられている.
    ///
    /// # Errors
    ///
    /// - `len`が`0`、あるいは`alignment`の倍数ではない場合には`ErrorKind::InvalidInput`
    /// - 下位のアロケータが失敗した場合には`ErrorKind::OutOfMemory`
    pub fn acquire(len: usize, alignment: Alignment) -> Result<Self> {
        track_assert_ne!(len, 0, ErrorKind::InvalidInput);
        track_assert!(alignment.is_aligned(len), ErrorKind::InvalidInput; len, alignment);

        // `posix_memalign`はポインタサイズの倍数のアライメントしか受け付けない
        let align = std::cmp::max(alignment.as_usize(), std::mem::size_of::<*mut libc::c_void>());
        let mut raw: *mut libc::c_void = ptr::null_mut();
        let errno = unsafe { libc::posix_memalign(&mut raw, align, len) };
        track_assert_eq!(errno, 0, ErrorKind::OutOfMemory; len, align);
        let ptr = track_assert_some!(NonNull::new(raw as *mut u8), ErrorKind::OutOfMemory; len);
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, len);
        }
        Ok(Pool { ptr, len })
    }

    /// プールのサイズ(バイト単位)を返す.
    pub fn len(&self) -> usize {
        self.len
    }

    /// プールの先頭ポインタを返す.
    pub fn base_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// `ptr`がプール内を指している場合には、対応するアドレスを返す.
    pub fn address_of(&self, ptr: *const u8) -> Option<Address> {
        let base = self.base_ptr() as usize;
        let ptr = ptr as usize;
        if base <= ptr && ptr < base + self.len {
            Some(Address::from(ptr - base))
        } else {
            None
        }
    }

    /// `address`から`len`バイト分の領域を返す.
    ///
    /// # Panics
    ///
    /// 範囲がプールを超えている場合には、現在のスレッドがパニックする.
    pub fn slice(&self, address: Address, len: usize) -> &[u8] {
        assert!(address.as_usize() + len <= self.len);
        unsafe { slice::from_raw_parts(self.ptr.as_ptr().add(address.as_usize()), len) }
    }

    /// `address`から`len`バイト分の領域を、変更可能な形式で返す.
    ///
    /// # Panics
    ///
    /// 範囲がプールを超えている場合には、現在のスレッドがパニックする.
    pub fn slice_mut(&mut self, address: Address, len: usize) -> &mut [u8] {
        assert!(address.as_usize() + len <= self.len);
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().add(address.as_usize()), len) }
    }
}
impl Drop for Pool {
    fn drop(&mut self) {
        unsafe {
            libc::free(self.ptr.as_ptr() as *mut libc::c_void);
        }
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;

    #[test]
    fn acquire_works() -> TestResult {
        let alignment = track!(Alignment::new(16))?;
        let mut pool = track!(Pool::acquire(64, alignment))?;
        assert_eq!(pool.len(), 64);
        assert_eq!(pool.base_ptr() as usize % 16, 0);
        assert!(pool.slice(Address::BASE, 64).iter().all(|&b| b == 0));

        pool.slice_mut(Address::from(8), 4).copy_from_slice(b"abcd");
        assert_eq!(pool.slice(Address::from(8), 4), b"abcd");
        Ok(())
    }

    #[test]
    fn address_of_works() -> TestResult {
        let pool = track!(Pool::acquire(32, Alignment::min()))?;
        let base = pool.base_ptr();
        assert_eq!(pool.address_of(base), Some(Address::BASE));
        assert_eq!(
            pool.address_of(unsafe { base.add(12) }),
            Some(Address::from(12))
        );
        assert_eq!(pool.address_of(unsafe { base.add(32) }), None);
        assert_eq!(pool.address_of(ptr::null()), None);
        Ok(())
    }

    #[test]
    fn invalid_length() {
        assert_eq!(
            Pool::acquire(0, Alignment::min()).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        assert_eq!(
            Pool::acquire(10, Alignment::min()).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
    }

    #[test]
    fn exhausted() {
        let len = Alignment::min().floor_align(usize::MAX);
        assert_eq!(
            Pool::acquire(len, Alignment::min()).err().map(|e| *e.kind()),
            Some(ErrorKind::OutOfMemory)
        );
    }
}
