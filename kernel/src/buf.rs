// SPDX-License-Identifier: GPL-2.0

//! Checked data transfer between driver code and caller-supplied buffers.
//!
//! The caller's buffer is untrusted from the driver's point of view: every
//! copy is validated against the remaining capacity of the transfer and
//! fails atomically with [`EFAULT`], never leaving a partial value behind.

use core::mem::{size_of, MaybeUninit};

use crate::error::{linux_err::EFAULT, KernelResult as Result};

/// Types that may be materialized from raw caller bytes.
///
/// # Safety
///
/// Every bit pattern of the right width must be a valid value of the
/// implementing type.
pub unsafe trait FromBytes: Sized {}

/// Types whose in-memory bytes may be copied to a caller buffer.
///
/// # Safety
///
/// The type must contain no padding and no pointers.
pub unsafe trait AsBytes: Sized {}

macro_rules! impl_transfer_for_int {
    ($($t:ty),+ $(,)?) => {
        $(
        // SAFETY: Integers have no padding and accept any bit pattern.
        unsafe impl FromBytes for $t {}
        // SAFETY: Integers have no padding and no pointers.
        unsafe impl AsBytes for $t {}
        )+
    };
}

impl_transfer_for_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// An incremental writer for the caller half of a `read()` transfer.
pub struct UserSliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> UserSliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        UserSliceWriter { buf, pos: 0 }
    }

    /// Returns the number of bytes still writable. Note that even writing
    /// less than this number of bytes may fail.
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` if no capacity is left in the transfer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Write the provided slice into the caller buffer.
    ///
    /// Returns [`EFAULT`] if `data` is larger than the remaining capacity,
    /// in which case no data is written.
    pub fn write_slice(&mut self, data: &[u8]) -> Result {
        if data.len() > self.len() {
            return Err(EFAULT);
        }
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    /// Copy a scalar into the caller buffer, `put_user` style.
    ///
    /// The copy is all-or-nothing: on [`EFAULT`] not a single byte of
    /// `value` reaches the destination.
    pub fn write<T: AsBytes>(&mut self, value: &T) -> Result {
        let len = size_of::<T>();
        if len > self.len() {
            return Err(EFAULT);
        }
        // SAFETY: `T: AsBytes` guarantees the value is plain bytes without
        // padding, so viewing it as a byte slice of its size is sound.
        let bytes =
            unsafe { core::slice::from_raw_parts(value as *const T as *const u8, len) };
        self.write_slice(bytes)
    }
}

/// An incremental reader for the caller half of a `write()` transfer.
pub struct UserSliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> UserSliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        UserSliceReader { buf, pos: 0 }
    }

    /// Returns the number of bytes left to be read.
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` if no data remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read from the caller buffer into `out`.
    ///
    /// Returns [`EFAULT`] if `out` is larger than the remaining data, in
    /// which case `out` is not modified.
    pub fn read_slice(&mut self, out: &mut [u8]) -> Result {
        if out.len() > self.len() {
            return Err(EFAULT);
        }
        out.copy_from_slice(&self.buf[self.pos..self.pos + out.len()]);
        self.pos += out.len();
        Ok(())
    }

    /// Reads a scalar of the specified type, `get_user` style.
    pub fn read<T: FromBytes>(&mut self) -> Result<T> {
        let len = size_of::<T>();
        if len > self.len() {
            return Err(EFAULT);
        }
        let mut out: MaybeUninit<T> = MaybeUninit::uninit();
        // SAFETY: `out` is valid for writing `len` bytes and the source
        // range was bounds-checked above.
        unsafe {
            core::ptr::copy_nonoverlapping(
                self.buf.as_ptr().add(self.pos),
                out.as_mut_ptr().cast::<u8>(),
                len,
            );
        }
        self.pos += len;
        // SAFETY: All bytes of `out` are initialized, and `T: FromBytes`
        // accepts any bit pattern.
        Ok(unsafe { out.assume_init() })
    }

    /// Read all data remaining in the caller buffer.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.len()];
        self.read_slice(&mut data)?;
        Ok(data)
    }
}
