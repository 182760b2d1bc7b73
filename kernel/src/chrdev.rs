// SPDX-License-Identifier: GPL-2.0

//! Character device registration.
//!
//! Follows the C driver pattern end to end: allocate a region of device
//! numbers, bind the dispatch tables, create the class grouping, publish
//! the visible nodes. [`Registration`] owns the whole chain and its `Drop`
//! tears it down in strict reverse order, so a module struct only needs to
//! hold the registration to get symmetric teardown.

use core::ops::Range;
use std::sync::Arc;

use crate::error::{linux_err::EINVAL, KernelResult};
use crate::fs::file_operations::{FileOpener, FileOperations, OperationsAdapter};
use crate::host::{Class, Kernel};
use crate::types::DevT;

/// Begin building a registration for a block of character devices.
///
/// `name` identifies the device-number region towards the host; `minors`
/// is the contiguous minor range the devices will occupy.
pub fn builder(
    kernel: Arc<Kernel>,
    name: &'static str,
    minors: Range<u32>,
) -> KernelResult<Builder> {
    if minors.is_empty() {
        return Err(EINVAL);
    }
    Ok(Builder {
        kernel,
        name,
        class_name: name,
        minors,
        devices: Vec::new(),
    })
}

pub struct Builder {
    kernel: Arc<Kernel>,
    name: &'static str,
    class_name: &'static str,
    minors: Range<u32>,
    devices: Vec<(&'static str, Arc<dyn FileOpener>)>,
}

impl Builder {
    /// Names the class grouping the nodes are published under. Defaults to
    /// the region name.
    pub fn class(mut self, name: &'static str) -> Builder {
        self.class_name = name;
        self
    }

    /// Registers a device backed by `T`, published as `/dev/<node_name>`.
    ///
    /// Devices take minors from the builder's range in registration order.
    pub fn register_device<T: FileOperations>(mut self, node_name: &'static str) -> Builder {
        self.devices.push((node_name, OperationsAdapter::<T>::arc()));
        self
    }

    /// Acquires the device numbers and publishes the nodes.
    ///
    /// Ordering matters and is fixed: region acquisition, dispatch
    /// binding, class creation, node creation. A node therefore never
    /// becomes visible before its table is routable. A failure at any step
    /// unwinds exactly the steps already taken and leaves the host as it
    /// was.
    pub fn build(self) -> KernelResult<Registration> {
        if self.devices.len() > self.minors.len() {
            return Err(EINVAL);
        }
        let count = self.minors.len() as u32;
        let devt = self
            .kernel
            .alloc_chrdev_region(self.minors.start, count, self.name)?;

        // From here on, a partially filled `Registration` carries the
        // unwind state: any early return drops it and rolls back.
        let mut registration = Registration {
            kernel: self.kernel.clone(),
            name: self.name,
            devt,
            count,
            bound: 0,
            class: None,
            nodes: Vec::new(),
        };

        for (i, (_, opener)) in self.devices.iter().enumerate() {
            let device = DevT::new(devt.major(), devt.minor() + i as u32);
            self.kernel.cdev_add(device, 1, opener.clone())?;
            registration.bound += 1;
        }

        let class = self.kernel.class_create(self.class_name)?;
        for (i, (node_name, _)) in self.devices.iter().enumerate() {
            let device = DevT::new(devt.major(), devt.minor() + i as u32);
            match self.kernel.device_create(&class, device, node_name) {
                Ok(()) => registration.nodes.push(device),
                Err(err) => {
                    registration.class = Some(class);
                    return Err(err);
                }
            }
        }
        registration.class = Some(class);

        log::info!(
            "chrdev region {} registered: major {}, {} device(s)",
            self.name,
            devt.major(),
            self.devices.len()
        );
        Ok(registration)
    }
}

/// A live character-device registration.
///
/// Owns the device-number region, the bound dispatch tables, the class
/// handle and the published nodes. Dropping it unpublishes the nodes,
/// releases the class, unbinds the tables and returns the region, in that
/// order. A registration abandoned mid-`build` unwinds only what had
/// succeeded, so teardown is safe against partial initialization.
pub struct Registration {
    kernel: Arc<Kernel>,
    name: &'static str,
    devt: DevT,
    count: u32,
    bound: u32,
    class: Option<Class>,
    nodes: Vec<DevT>,
}

impl Registration {
    /// First device number of the allocated region.
    pub fn devt(&self) -> DevT {
        self.devt
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        for devt in self.nodes.drain(..).rev() {
            self.kernel.device_destroy(devt);
        }
        if let Some(class) = self.class.take() {
            self.kernel.class_destroy(class);
        }
        for i in (0..self.bound).rev() {
            self.kernel
                .cdev_del(DevT::new(self.devt.major(), self.devt.minor() + i), 1);
        }
        self.kernel.unregister_chrdev_region(self.devt, self.count);
        log::info!("chrdev region {} released", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::{UserSliceReader, UserSliceWriter};
    use crate::error::linux_err::{EEXIST, EINVAL};
    use crate::fs::{File, OpenFlags};

    struct NullFile;

    impl FileOperations for NullFile {
        fn open() -> KernelResult<Self> {
            Ok(NullFile)
        }
        fn release(&self) {}
        fn read(
            &self,
            _file: &File,
            _writer: &mut UserSliceWriter<'_>,
            _offset: u64,
        ) -> KernelResult<usize> {
            Ok(0)
        }
        fn write(
            &self,
            _file: &File,
            reader: &mut UserSliceReader<'_>,
            _offset: u64,
        ) -> KernelResult<usize> {
            Ok(reader.len())
        }
    }

    #[test]
    fn registration_lifecycle_is_symmetric() {
        let kernel = Kernel::new();
        let registration = builder(kernel.clone(), "nulldev", 0..1)
            .unwrap()
            .class("nullclass")
            .register_device::<NullFile>("nulldev")
            .build()
            .unwrap();

        assert_eq!(kernel.region_count(), 1);
        assert_eq!(kernel.cdev_count(), 1);
        assert!(kernel.class_exists("nullclass"));
        assert!(kernel.node_exists("/dev/nulldev"));

        drop(registration);
        assert_eq!(kernel.region_count(), 0);
        assert_eq!(kernel.cdev_count(), 0);
        assert!(!kernel.class_exists("nullclass"));
        assert!(!kernel.node_exists("/dev/nulldev"));
    }

    #[test]
    fn empty_minor_range_is_rejected() {
        let kernel = Kernel::new();
        assert!(builder(kernel, "none", 0..0).is_err());
    }

    #[test]
    fn more_devices_than_minors_is_rejected() {
        let kernel = Kernel::new();
        let result = builder(kernel.clone(), "tight", 0..1)
            .unwrap()
            .register_device::<NullFile>("a")
            .register_device::<NullFile>("b")
            .build();
        assert_eq!(result.err(), Some(EINVAL));
        assert_eq!(kernel.region_count(), 0);
    }

    #[test]
    fn region_alone_can_be_registered() {
        // The region-allocation step works without any published device.
        let kernel = Kernel::new();
        let registration = builder(kernel.clone(), "region-only", 0..1)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(kernel.region_count(), 1);
        assert_eq!(kernel.cdev_count(), 0);
        drop(registration);
        assert_eq!(kernel.region_count(), 0);
    }

    #[test]
    fn failed_acquire_performs_no_publish() {
        let kernel = Kernel::new();
        let _first = builder(kernel.clone(), "dup", 0..1)
            .unwrap()
            .register_device::<NullFile>("dup0")
            .build()
            .unwrap();

        // Same region name: acquisition fails, and nothing of the second
        // build becomes visible.
        let second = builder(kernel.clone(), "dup", 0..1)
            .unwrap()
            .register_device::<NullFile>("dup1")
            .build();
        assert_eq!(second.err(), Some(EEXIST));
        assert_eq!(kernel.region_count(), 1);
        assert!(!kernel.node_exists("/dev/dup1"));
    }

    #[test]
    fn failed_publish_unwinds_acquire() {
        let kernel = Kernel::new();
        let _first = builder(kernel.clone(), "left", 0..1)
            .unwrap()
            .class("shared")
            .register_device::<NullFile>("same-node")
            .build()
            .unwrap();

        // Node name collision: the second build fails at device_create and
        // must give back its region, its cdev and its class reference.
        let second = builder(kernel.clone(), "right", 0..1)
            .unwrap()
            .class("shared")
            .register_device::<NullFile>("same-node")
            .build();
        assert_eq!(second.err(), Some(EEXIST));
        assert_eq!(kernel.region_count(), 1);
        assert_eq!(kernel.cdev_count(), 1);
        assert!(kernel.class_exists("shared"));
        assert!(kernel.node_exists("/dev/same-node"));

        // The survivor still opens.
        assert!(kernel.open("/dev/same-node", OpenFlags::O_RDWR).is_ok());
    }

    #[test]
    fn multiple_devices_share_one_region() {
        let kernel = Kernel::new();
        let registration = builder(kernel.clone(), "pair", 0..2)
            .unwrap()
            .register_device::<NullFile>("pair0")
            .register_device::<NullFile>("pair1")
            .build()
            .unwrap();
        assert!(kernel.node_exists("/dev/pair0"));
        assert!(kernel.node_exists("/dev/pair1"));
        assert_eq!(kernel.cdev_count(), 2);
        drop(registration);
        assert_eq!(kernel.cdev_count(), 0);
    }
}
