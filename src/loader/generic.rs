use std::any::Any;
use std::sync::{PoisonError, RwLock};

use crate::family::{Family, LOADER};
use crate::loader::{Loader, LoaderRef};

/// A loader with nothing but a name, a family and a parent link.
///
/// Useful to stand in for host loaders the crate cannot look into, such as
/// the system or extension loader, and to build arbitrary delegation graphs.
#[derive(Debug)]
pub struct GenericLoader {
    name: String,
    family: &'static Family,
    parent: RwLock<Option<LoaderRef>>,
    packages: Option<Vec<String>>,
}

impl GenericLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: &LOADER,
            parent: RwLock::new(None),
            packages: None,
        }
    }

    pub fn with_family(mut self, family: &'static Family) -> Self {
        self.family = family;
        self
    }

    pub fn with_parent(self, parent: LoaderRef) -> Self {
        self.set_parent(Some(parent));
        self
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relinks the loader; this is how cyclic graphs come to be.
    pub fn set_parent(&self, parent: Option<LoaderRef>) {
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = parent;
    }
}

impl Loader for GenericLoader {
    fn family(&self) -> &'static Family {
        self.family
    }

    fn native_parent(&self) -> Option<LoaderRef> {
        self.parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn defined_packages(&self) -> Option<Vec<String>> {
        self.packages.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
