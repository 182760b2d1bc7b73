//! The minimal character device: a registered node whose read always
//! reports EOF and whose write accepts everything without storing a byte.
//! First step of the driver progression; the interesting part is the
//! registration chain, not the data path.

use std::sync::Arc;

use kernel::{
    buf::{UserSliceReader, UserSliceWriter},
    chrdev,
    error::KernelResult,
    fs::{File, FileOperations},
    logger, module, Kernel, Module,
};

/// Per-open session. The device keeps no state, so this is a unit.
pub struct ChardevFile;

impl FileOperations for ChardevFile {
    fn open() -> KernelResult<Self> {
        log::info!("device_open");
        Ok(ChardevFile)
    }

    fn release(&self) {
        log::info!("device_release");
    }

    /// Discards the request: the device is permanently at EOF.
    fn read(
        &self,
        _file: &File,
        _writer: &mut UserSliceWriter<'_>,
        _offset: u64,
    ) -> KernelResult<usize> {
        log::info!("device_read");
        Ok(0)
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

pub struct ChardevModule {
    _registration: chrdev::Registration,
}

impl Module for ChardevModule {
    fn init(kernel: &Arc<Kernel>) -> KernelResult<Self> {
        logger::init_logger();
        let registration = chrdev::builder(kernel.clone(), "mychardev", 0..1)?
            .class("myclass")
            .register_device::<ChardevFile>("mychardev")
            .build()?;
        log::info!("major number received: {}", registration.devt().major());
        Ok(ChardevModule {
            _registration: registration,
        })
    }
}

module! {
    type: ChardevModule,
    name: "mychardev",
    author: "Chardev Examples Authors",
    description: "Minimal character device with stubbed file operations",
    license: "GPL",
}
