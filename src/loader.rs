pub mod build;
pub use build::{BuildLoader, BuildLoaderOptions};

pub mod generic;
pub use generic::GenericLoader;

pub mod path;
pub use path::PathLoader;

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use crate::family::Family;

/// A live loader instance, owned by the host.
///
/// The crate never assumes anything about a loader beyond this trait: every
/// other capability is reached through a
/// [`CapabilityAdapter`](crate::adapter::CapabilityAdapter) resolved for the
/// loader's [`Family`].
pub trait Loader: Any + Send + Sync + Debug {
    /// Type descriptor used for adapter resolution.
    fn family(&self) -> &'static Family;

    /// Concrete type name, captured verbatim in reports.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The parent link the loader advertises about itself. Some loader kinds
    /// keep their real parent elsewhere, in which case their adapter knows
    /// better than this.
    fn native_parent(&self) -> Option<LoaderRef> {
        None
    }

    /// Packages defined by the loader, `None` when the loader cannot tell.
    fn defined_packages(&self) -> Option<Vec<String>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared reference to a host-owned loader.
pub type LoaderRef = Arc<dyn Loader>;

/// Loaders are compared by identity, never by value.
pub fn same_loader(a: &LoaderRef, b: &LoaderRef) -> bool {
    identity(a) == identity(b)
}

/// A stable key for the identity of a loader while it is alive.
pub(crate) fn identity(loader: &LoaderRef) -> usize {
    Arc::as_ptr(loader) as *const () as usize
}

/// Borrows the concrete loader behind a reference, if it is a `T`.
pub fn downcast<T: Loader>(loader: &LoaderRef) -> Option<&T> {
    loader.as_any().downcast_ref::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::LOADER;

    #[test]
    fn test_identity_not_value() {
        let a: LoaderRef = Arc::new(GenericLoader::new("a"));
        let b: LoaderRef = Arc::new(GenericLoader::new("a"));
        let a2 = a.clone();

        assert!(same_loader(&a, &a2));
        assert!(!same_loader(&a, &b));
    }

    #[test]
    fn test_downcast() {
        let loader: LoaderRef = Arc::new(GenericLoader::new("a"));
        assert!(downcast::<GenericLoader>(&loader).is_some());
        assert!(downcast::<PathLoader>(&loader).is_none());
        assert_eq!(loader.family(), &LOADER);
    }
}
