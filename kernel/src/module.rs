//! Module lifecycle: the [`Module`] trait, static metadata and the
//! insmod-style loader.

use std::sync::Arc;

use crate::error::KernelResult;
use crate::host::Kernel;

/// The top level entrypoint to implementing a kernel module.
///
/// `init` receives an explicit handle on the host it registers against;
/// everything the module acquires lives in the returned value, and
/// teardown happens through [`Drop`] in the reverse of acquisition order.
pub trait Module: Sized + Send + Sync {
    /// Called at module load time.
    fn init(kernel: &Arc<Kernel>) -> KernelResult<Self>;
}

/// Static module metadata, normally supplied through the [`module!`]
/// macro.
///
/// [`module!`]: crate::module!
pub trait ModuleMetadata {
    const NAME: &'static str;
    const AUTHOR: &'static str;
    const DESCRIPTION: &'static str;
    const LICENSE: &'static str;
}

/// A loaded module. Dropping it unloads the module, which unwinds
/// whatever the module registered.
pub struct LoadedModule<M> {
    _module: M,
    name: &'static str,
}

/// Loads `M` against `kernel`.
///
/// A failed `init` propagates the error and leaves no trace on the host:
/// the module's own drop glue unwinds any partial registration before the
/// error reaches the caller.
pub fn load<M: Module + ModuleMetadata>(kernel: &Arc<Kernel>) -> KernelResult<LoadedModule<M>> {
    log::info!("loading module {} ({})", M::NAME, M::LICENSE);
    let module = M::init(kernel)?;
    Ok(LoadedModule {
        _module: module,
        name: M::NAME,
    })
}

impl<M> Drop for LoadedModule<M> {
    fn drop(&mut self) {
        log::info!("unloading module {}", self.name);
    }
}

/// Declares the metadata of a kernel module.
///
/// # Examples
///
/// ```ignore
/// module! {
///     type: MyModule,
///     name: "mymodule",
///     author: "...",
///     description: "...",
///     license: "GPL",
/// }
/// ```
#[macro_export]
macro_rules! module {
    (
        type: $type:ty,
        name: $name:literal,
        author: $author:literal,
        description: $description:literal,
        license: $license:literal $(,)?
    ) => {
        impl $crate::module::ModuleMetadata for $type {
            const NAME: &'static str = $name;
            const AUTHOR: &'static str = $author;
            const DESCRIPTION: &'static str = $description;
            const LICENSE: &'static str = $license;
        }
    };
}
