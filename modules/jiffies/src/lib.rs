//! The data-transfer step of the driver progression: `read` hands the
//! caller a live snapshot of the host tick counter through a checked
//! user-space copy, `put_user` style.

use core::mem::size_of;
use std::sync::Arc;

use kernel::{
    buf::{UserSliceReader, UserSliceWriter},
    chrdev,
    code::EINVAL,
    error::KernelResult,
    fs::{File, FileOperations},
    logger, module, time, Kernel, Module,
};

/// Per-open session; the counter lives in the host, not here.
pub struct JiffiesFile;

impl FileOperations for JiffiesFile {
    fn open() -> KernelResult<Self> {
        log::info!("device_open");
        Ok(JiffiesFile)
    }

    fn release(&self) {
        log::info!("device_release");
    }

    /// Copies the current jiffies value to the caller.
    ///
    /// The caller must offer room for the whole 8-byte counter; smaller
    /// requests fail with `EINVAL` before anything is written. The copy
    /// itself is all-or-nothing, so the caller never observes a partial
    /// snapshot.
    fn read(
        &self,
        _file: &File,
        writer: &mut UserSliceWriter<'_>,
        _offset: u64,
    ) -> KernelResult<usize> {
        log::info!("device_read");
        if writer.len() < size_of::<u64>() {
            return Err(EINVAL);
        }
        writer.write(&time::jiffies())?;
        Ok(size_of::<u64>())
    }

    /// Reports the full request as consumed without storing anything.
    fn write(
        &self,
        _file: &File,
        reader: &mut UserSliceReader<'_>,
        _offset: u64,
    ) -> KernelResult<usize> {
        log::info!("device_write");
        Ok(reader.len())
    }
}

pub struct JiffiesModule {
    _registration: chrdev::Registration,
}

impl Module for JiffiesModule {
    fn init(kernel: &Arc<Kernel>) -> KernelResult<Self> {
        logger::init_logger();
        let registration = chrdev::builder(kernel.clone(), "jiffies", 0..1)?
            .class("myclass")
            .register_device::<JiffiesFile>("jiffies")
            .build()?;
        log::info!("major number received: {}", registration.devt().major());
        Ok(JiffiesModule {
            _registration: registration,
        })
    }
}

module! {
    type: JiffiesModule,
    name: "jiffies",
    author: "Chardev Examples Authors",
    description: "Character device exposing the host tick counter",
    license: "GPL",
}
