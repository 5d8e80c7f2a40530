use std::any::Any;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use crate::family::{Family, PATH_LOADER};
use crate::loader::{Loader, LoaderRef};

/// Searches an ordered list of URL locators, after delegating to its parent.
///
/// The parent is fixed at construction, entries can only ever be appended.
#[derive(Debug)]
pub struct PathLoader {
    name: String,
    parent: Option<LoaderRef>,
    entries: RwLock<Vec<String>>,
    packages: RwLock<BTreeSet<String>>,
}

impl PathLoader {
    pub fn new(name: impl Into<String>, parent: Option<LoaderRef>, entries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            entries: RwLock::new(entries),
            packages: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_entry(&self, locator: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(locator.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e == locator)
    }

    pub fn define_package(&self, package: impl Into<String>) {
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(package.into());
    }
}

impl Loader for PathLoader {
    fn family(&self) -> &'static Family {
        &PATH_LOADER
    }

    fn native_parent(&self) -> Option<LoaderRef> {
        self.parent.clone()
    }

    fn defined_packages(&self) -> Option<Vec<String>> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        Some(packages.iter().cloned().collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
