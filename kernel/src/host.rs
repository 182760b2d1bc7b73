//! The simulated host kernel: device-number allocator, class and
//! device-node registry, and the VFS routing that dispatches `open` on a
//! node into the bound file-operations table.
//!
//! This is the set of collaborators a real module consumes through
//! `alloc_chrdev_region` / `cdev_add` / `class_create` / `device_create`.
//! All machine state lives in one owned [`Kernel`] value, so tests and
//! clients create isolated instances instead of sharing hidden globals.

use std::collections::BTreeMap;
use std::sync::Arc;

use spin::Mutex;

use crate::error::{linux_err::*, KernelResult};
use crate::fs::file_operations::{File, FileOpener, OpenFile, OpenFlags};
use crate::types::DevT;

/// Dynamic chrdev majors are handed out from the top of this range down,
/// the way Linux assigns them.
const DYNAMIC_MAJOR_MAX: u32 = 254;
const DYNAMIC_MAJOR_MIN: u32 = 234;

struct Region {
    base_minor: u32,
    count: u32,
    name: String,
}

struct Node {
    devt: DevT,
    class: String,
}

#[derive(Default)]
struct HostState {
    /// Allocated device-number regions, keyed by major.
    regions: BTreeMap<u32, Region>,
    /// Dispatch tables bound per device number.
    cdevs: BTreeMap<DevT, Arc<dyn FileOpener>>,
    /// Class refcounts, keyed by class name.
    classes: BTreeMap<String, usize>,
    /// Visible device nodes, keyed by node name under `/dev`.
    nodes: BTreeMap<String, Node>,
}

/// Handle on a device class grouping.
///
/// Creation is refcounted: asking for an existing class reuses it, and the
/// class only disappears when its last handle is destroyed. The handle is
/// consumed by [`Kernel::class_destroy`], so it cannot be torn down twice.
pub struct Class {
    name: String,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One simulated host machine.
pub struct Kernel {
    state: Mutex<HostState>,
}

impl Kernel {
    pub fn new() -> Arc<Kernel> {
        Arc::new(Kernel {
            state: Mutex::new(HostState::default()),
        })
    }

    /// Allocates a region of `count` device numbers starting at
    /// `base_minor` under a fresh dynamic major.
    ///
    /// The allocation is atomic: on any failure the pool is untouched.
    /// Fails with `EINVAL` for a zero count or empty name, `EEXIST` when
    /// the name is already registered, and `EBUSY` once the dynamic major
    /// range is exhausted.
    pub fn alloc_chrdev_region(
        &self,
        base_minor: u32,
        count: u32,
        name: &str,
    ) -> KernelResult<DevT> {
        if count == 0 || name.is_empty() {
            return Err(EINVAL);
        }
        let mut state = self.state.lock();
        if state.regions.values().any(|region| region.name == name) {
            return Err(EEXIST);
        }
        let major = (DYNAMIC_MAJOR_MIN..=DYNAMIC_MAJOR_MAX)
            .rev()
            .find(|major| !state.regions.contains_key(major))
            .ok_or(EBUSY)?;
        state.regions.insert(
            major,
            Region {
                base_minor,
                count,
                name: String::from(name),
            },
        );
        log::debug!("chrdev region {}: major {}, count {}", name, major, count);
        Ok(DevT::new(major, base_minor))
    }

    /// Returns a region to the pool. Tolerates (but reports) a region that
    /// was never allocated or was already released.
    pub fn unregister_chrdev_region(&self, devt: DevT, count: u32) {
        let mut state = self.state.lock();
        match state.regions.remove(&devt.major()) {
            Some(region) => {
                log::debug!(
                    "chrdev region {}: major {} released ({} minors)",
                    region.name,
                    devt.major(),
                    count
                );
            }
            None => {
                log::warn!("release of unallocated chrdev region {:?}", devt);
            }
        }
    }

    /// Binds a dispatch table to `count` device numbers starting at
    /// `devt`. The numbers must lie inside an allocated region and must
    /// not already be bound.
    pub fn cdev_add(
        &self,
        devt: DevT,
        count: u32,
        opener: Arc<dyn FileOpener>,
    ) -> KernelResult {
        let mut state = self.state.lock();
        let region = state.regions.get(&devt.major()).ok_or(ENXIO)?;
        let in_region = devt.minor() >= region.base_minor
            && devt.minor() + count <= region.base_minor + region.count;
        if count == 0 || !in_region {
            return Err(ENXIO);
        }
        let minors = devt.minor()..devt.minor() + count;
        if minors
            .clone()
            .any(|minor| state.cdevs.contains_key(&DevT::new(devt.major(), minor)))
        {
            return Err(EBUSY);
        }
        for minor in minors {
            state
                .cdevs
                .insert(DevT::new(devt.major(), minor), opener.clone());
        }
        Ok(())
    }

    /// Unbinds the dispatch tables for `count` device numbers starting at
    /// `devt`. Sessions already open keep their table until they close.
    pub fn cdev_del(&self, devt: DevT, count: u32) {
        let mut state = self.state.lock();
        for minor in devt.minor()..devt.minor() + count {
            state.cdevs.remove(&DevT::new(devt.major(), minor));
        }
    }

    /// Creates (or reuses) the class grouping named `name`.
    pub fn class_create(&self, name: &str) -> KernelResult<Class> {
        if name.is_empty() {
            return Err(EINVAL);
        }
        let mut state = self.state.lock();
        *state.classes.entry(String::from(name)).or_insert(0) += 1;
        Ok(Class {
            name: String::from(name),
        })
    }

    /// Drops one handle on a class; the class itself goes away with the
    /// last handle.
    pub fn class_destroy(&self, class: Class) {
        let mut state = self.state.lock();
        if let Some(refs) = state.classes.get_mut(&class.name) {
            *refs -= 1;
            if *refs == 0 {
                state.classes.remove(&class.name);
            }
        }
    }

    /// Publishes the node `/dev/<name>` for `devt` under `class`.
    ///
    /// The dispatch table for `devt` must already be bound: a node is
    /// never visible while opens against it could find no table.
    pub fn device_create(&self, class: &Class, devt: DevT, name: &str) -> KernelResult {
        if name.is_empty() {
            return Err(EINVAL);
        }
        let mut state = self.state.lock();
        if !state.cdevs.contains_key(&devt) {
            return Err(ENXIO);
        }
        if state.nodes.contains_key(name) {
            return Err(EEXIST);
        }
        state.nodes.insert(
            String::from(name),
            Node {
                devt,
                class: String::from(class.name()),
            },
        );
        log::debug!("device node /dev/{} -> {:?}", name, devt);
        Ok(())
    }

    /// Removes every node published for `devt`.
    pub fn device_destroy(&self, devt: DevT) {
        let mut state = self.state.lock();
        state.nodes.retain(|name, node| {
            if node.devt == devt {
                log::debug!("device node /dev/{} ({}) removed", name, node.class);
                false
            } else {
                true
            }
        });
    }

    /// Opens a device node and routes into its dispatch table.
    pub fn open(&self, path: &str, flags: OpenFlags) -> KernelResult<OpenFile> {
        let name = path.strip_prefix("/dev/").unwrap_or(path);
        let (devt, opener) = {
            let state = self.state.lock();
            let node = state.nodes.get(name).ok_or(ENOENT)?;
            let opener = state.cdevs.get(&node.devt).ok_or(ENXIO)?.clone();
            (node.devt, opener)
        };
        // The table's open callback runs outside the host lock.
        let session = opener.open_session()?;
        Ok(OpenFile::new(File::new(devt, flags), session))
    }

    /// Number of live device-number regions.
    pub fn region_count(&self) -> usize {
        self.state.lock().regions.len()
    }

    /// Number of bound dispatch tables.
    pub fn cdev_count(&self) -> usize {
        self.state.lock().cdevs.len()
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.state.lock().classes.contains_key(name)
    }

    pub fn node_exists(&self, path: &str) -> bool {
        let name = path.strip_prefix("/dev/").unwrap_or(path);
        self.state.lock().nodes.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::{UserSliceReader, UserSliceWriter};
    use crate::fs::file_operations::{FileOperations, OperationsAdapter};

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
    fn alloc_then_release_restores_the_pool() {
        let kernel = Kernel::new();
        let devt = kernel.alloc_chrdev_region(0, 1, "mychardev").unwrap();
        assert_eq!(kernel.region_count(), 1);
        kernel.unregister_chrdev_region(devt, 1);
        assert_eq!(kernel.region_count(), 0);
        // The same major is handed out again.
        let again = kernel.alloc_chrdev_region(0, 1, "mychardev").unwrap();
        assert_eq!(again.major(), devt.major());
    }

    #[test]
    fn double_release_is_reported_not_fatal() {
        let kernel = Kernel::new();
        let devt = kernel.alloc_chrdev_region(0, 1, "once").unwrap();
        kernel.unregister_chrdev_region(devt, 1);
        kernel.unregister_chrdev_region(devt, 1);
        assert_eq!(kernel.region_count(), 0);
    }

    #[test]
    fn invalid_requests_allocate_nothing() {
        let kernel = Kernel::new();
        assert_eq!(kernel.alloc_chrdev_region(0, 0, "zero"), Err(EINVAL));
        assert_eq!(kernel.alloc_chrdev_region(0, 1, ""), Err(EINVAL));
        assert_eq!(kernel.region_count(), 0);
    }

    #[test]
    fn name_collision_is_rejected() {
        let kernel = Kernel::new();
        kernel.alloc_chrdev_region(0, 1, "taken").unwrap();
        assert_eq!(kernel.alloc_chrdev_region(0, 1, "taken"), Err(EEXIST));
        assert_eq!(kernel.region_count(), 1);
    }

    #[test]
    fn exhausted_major_pool_fails_cleanly() {
        let kernel = Kernel::new();
        let capacity = (DYNAMIC_MAJOR_MAX - DYNAMIC_MAJOR_MIN + 1) as usize;
        for i in 0..capacity {
            kernel
                .alloc_chrdev_region(0, 1, &format!("dev{}", i))
                .unwrap();
        }
        assert_eq!(kernel.alloc_chrdev_region(0, 1, "straw"), Err(EBUSY));
        assert_eq!(kernel.region_count(), capacity);
    }

    #[test]
    fn cdev_add_requires_an_allocated_region() {
        let kernel = Kernel::new();
        let result = kernel.cdev_add(DevT::new(250, 0), 1, OperationsAdapter::<NullFile>::arc());
        assert_eq!(result, Err(ENXIO));
    }

    #[test]
    fn cdev_add_rejects_minors_outside_the_region() {
        let kernel = Kernel::new();
        let devt = kernel.alloc_chrdev_region(0, 1, "narrow").unwrap();
        let outside = DevT::new(devt.major(), 1);
        let result = kernel.cdev_add(outside, 1, OperationsAdapter::<NullFile>::arc());
        assert_eq!(result, Err(ENXIO));
    }

    #[test]
    fn node_is_unreachable_until_the_table_is_bound() {
        let kernel = Kernel::new();
        let devt = kernel.alloc_chrdev_region(0, 1, "unbound").unwrap();
        let class = kernel.class_create("myclass").unwrap();
        // Publishing before cdev_add must fail: no window where the node
        // exists but routes nowhere.
        assert_eq!(kernel.device_create(&class, devt, "unbound"), Err(ENXIO));
        assert!(!kernel.node_exists("/dev/unbound"));

        kernel
            .cdev_add(devt, 1, OperationsAdapter::<NullFile>::arc())
            .unwrap();
        kernel.device_create(&class, devt, "unbound").unwrap();
        assert!(kernel.node_exists("/dev/unbound"));
        kernel.class_destroy(class);
    }

    #[test]
    fn class_is_refcounted_across_users() {
        let kernel = Kernel::new();
        let first = kernel.class_create("shared").unwrap();
        let second = kernel.class_create("shared").unwrap();
        kernel.class_destroy(first);
        assert!(kernel.class_exists("shared"));
        kernel.class_destroy(second);
        assert!(!kernel.class_exists("shared"));
    }

    #[test]
    fn open_of_unknown_node_fails() {
        let kernel = Kernel::new();
        let err = kernel.open("/dev/nothing", OpenFlags::O_RDWR).unwrap_err();
        assert_eq!(err, ENOENT);
    }
}
