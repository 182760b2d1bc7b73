//! An in-process rendition of the Linux character-device subsystem, built
//! to teach the classic driver progression: register a block of device
//! numbers, bind a dispatch table of file operations, publish a node, then
//! move data across the user/kernel boundary with checked copies.
//!
//! The [`host`] module plays the kernel. It owns the dynamic major pool,
//! the class and device-node registry, and the VFS routing that turns an
//! `open` on a node into a session against the bound [`fs::FileOperations`]
//! table. Everything else is the driver-facing API a module builds
//! against: [`chrdev`] registration, [`buf`] transfers, [`time::jiffies`]
//! and printk-style logging.

pub mod buf;
pub mod chrdev;
pub mod error;
pub mod fs;
pub mod host;
pub mod logger;
pub mod module;
pub mod printk;
pub mod time;
pub mod types;

pub use error::linux_err as code;
pub use error::{Error, KernelResult};
pub use fs::{File, FileOperations, OpenFile, OpenFlags};
pub use host::Kernel;
pub use module::Module;
pub use types::DevT;
