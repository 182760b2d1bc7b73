// SPDX-License-Identifier: GPL-2.0

//! The dispatch table a character device binds to its device numbers, and
//! the open-file objects that route through it.

use core::marker::PhantomData;
use std::sync::Arc;

use crate::buf::{UserSliceReader, UserSliceWriter};
use crate::error::KernelResult;
use crate::types::DevT;

bitflags::bitflags! {
    /// Access flags for `open`, `O_*` style. Read-only access is the empty
    /// set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const O_WRONLY = 1;
        const O_RDWR = 2;
        const O_ACCMODE = 3;
    }
}

/// Per-open metadata handed to every file operation.
pub struct File {
    devt: DevT,
    flags: OpenFlags,
}

impl File {
    pub(crate) fn new(devt: DevT, flags: OpenFlags) -> File {
        File { devt, flags }
    }

    /// Device number of the node this file was opened on.
    pub fn devt(&self) -> DevT {
        self.devt
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}

/// Operation callbacks for one character device.
///
/// One value of the implementing type is created per `open` and lives for
/// the open-to-close interval; it is the session state, and both shipped
/// device variants keep none. All four slots are required: the host only
/// routes file operations through a fully populated table, so a device
/// node is never visible with a partially bound table behind it.
///
/// `read` and `write` return the number of bytes transferred; errors
/// travel back to the caller as negative errnos and leave the session
/// usable for further calls.
pub trait FileOperations: Send + Sync + Sized + 'static {
    /// Called when the device node is opened. Returns the session value.
    fn open() -> KernelResult<Self>;

    /// Called when the open file is closed. Must not fail.
    fn release(&self);

    /// Copy device data into the caller's buffer at `offset`.
    fn read(
        &self,
        file: &File,
        writer: &mut UserSliceWriter<'_>,
        offset: u64,
    ) -> KernelResult<usize>;

    /// Consume data from the caller's buffer at `offset`.
    fn write(
        &self,
        file: &File,
        reader: &mut UserSliceReader<'_>,
        offset: u64,
    ) -> KernelResult<usize>;
}

/// Object-safe face of a bound dispatch table: what the host stores per
/// device number and opens sessions through.
pub trait FileOpener: Send + Sync {
    fn open_session(&self) -> KernelResult<Box<dyn FileSession>>;
}

/// Object-safe face of one open session.
pub trait FileSession: Send + Sync {
    fn read(
        &self,
        file: &File,
        writer: &mut UserSliceWriter<'_>,
        offset: u64,
    ) -> KernelResult<usize>;
    fn write(
        &self,
        file: &File,
        reader: &mut UserSliceReader<'_>,
        offset: u64,
    ) -> KernelResult<usize>;
    fn release(&self, file: &File);
}

impl<T: FileOperations> FileSession for T {
    fn read(
        &self,
        file: &File,
        writer: &mut UserSliceWriter<'_>,
        offset: u64,
    ) -> KernelResult<usize> {
        FileOperations::read(self, file, writer, offset)
    }

    fn write(
        &self,
        file: &File,
        reader: &mut UserSliceReader<'_>,
        offset: u64,
    ) -> KernelResult<usize> {
        FileOperations::write(self, file, reader, offset)
    }

    fn release(&self, _file: &File) {
        FileOperations::release(self)
    }
}

/// Adapts a `FileOperations` implementation into the type-erased table the
/// host can store and open through.
pub struct OperationsAdapter<T>(PhantomData<T>);

impl<T: FileOperations> OperationsAdapter<T> {
    pub(crate) fn arc() -> Arc<dyn FileOpener> {
        Arc::new(OperationsAdapter::<T>(PhantomData))
    }
}

impl<T: FileOperations> FileOpener for OperationsAdapter<T> {
    fn open_session(&self) -> KernelResult<Box<dyn FileSession>> {
        Ok(Box::new(T::open()?))
    }
}

/// An open handle on a device node, as seen from user space.
///
/// Owns the session created by the device's `open` callback and the stream
/// offset; dropping the handle invokes `release`. Transfer results follow
/// the host contract: a byte count on success, otherwise an error whose
/// [`to_errno`](crate::error::Error::to_errno) is the negative return the
/// C caller would see.
pub struct OpenFile {
    file: File,
    session: Box<dyn FileSession>,
    pos: u64,
}

impl core::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpenFile").field("pos", &self.pos).finish_non_exhaustive()
    }
}

impl OpenFile {
    pub(crate) fn new(file: File, session: Box<dyn FileSession>) -> OpenFile {
        OpenFile {
            file,
            session,
            pos: 0,
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> KernelResult<usize> {
        let mut writer = UserSliceWriter::new(buf);
        let read = self.session.read(&self.file, &mut writer, self.pos)?;
        self.pos += read as u64;
        Ok(read)
    }

    pub fn write(&mut self, data: &[u8]) -> KernelResult<usize> {
        let mut reader = UserSliceReader::new(data);
        let written = self.session.write(&self.file, &mut reader, self.pos)?;
        self.pos += written as u64;
        Ok(written)
    }

    pub fn flags(&self) -> OpenFlags {
        self.file.flags()
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        self.session.release(&self.file);
    }
}
