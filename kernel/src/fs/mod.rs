//! File-system facing abstractions for character devices.

pub mod file_operations;

pub use file_operations::{File, FileOperations, OpenFile, OpenFlags};
