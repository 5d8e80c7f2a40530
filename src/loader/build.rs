use std::any::Any;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};

use crate::family::{BUILD_LOADER, Family};
use crate::loader::{Loader, LoaderRef};

/// Lookup options of a [`BuildLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLoaderOptions {
    /// Never delegate to the parent.
    pub isolated: bool,
    /// Ask the parent before searching own entries.
    pub parent_first: bool,
    /// Package prefixes always searched in own entries first.
    pub loader_package_roots: Vec<String>,
    /// Package prefixes always delegated to the parent.
    pub system_package_roots: Vec<String>,
}

impl Default for BuildLoaderOptions {
    fn default() -> Self {
        Self {
            isolated: false,
            parent_first: true,
            loader_package_roots: Vec::new(),
            system_package_roots: Vec::new(),
        }
    }
}

/// A loader created by the build engine over plain file system entries.
///
/// Its real parent is kept out of band: `native_parent` reports the loader
/// that *defined* this one, which is what the host would see, and only the
/// build adapter reads the actual delegation parent via [`BuildLoader::parent`].
#[derive(Debug)]
pub struct BuildLoader {
    name: String,
    defined_by: Option<LoaderRef>,
    parent: RwLock<Option<LoaderRef>>,
    entries: RwLock<Vec<Utf8PathBuf>>,
    options: RwLock<BuildLoaderOptions>,
    packages: RwLock<BTreeSet<String>>,
}

impl BuildLoader {
    pub fn new(name: impl Into<String>, defined_by: Option<LoaderRef>) -> Self {
        Self {
            name: name.into(),
            defined_by,
            parent: RwLock::new(None),
            entries: RwLock::new(Vec::new()),
            options: RwLock::new(BuildLoaderOptions::default()),
            packages: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defined_by(&self) -> Option<LoaderRef> {
        self.defined_by.clone()
    }

    pub fn parent(&self) -> Option<LoaderRef> {
        self.parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_parent(&self, parent: Option<LoaderRef>) {
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = parent;
    }

    pub fn add_path_element(&self, path: impl AsRef<Utf8Path>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.as_ref().to_path_buf());
    }

    pub fn entries(&self) -> Vec<Utf8PathBuf> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn options(&self) -> BuildLoaderOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_options(&self, options: BuildLoaderOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    pub fn define_package(&self, package: impl Into<String>) {
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(package.into());
    }
}

impl Loader for BuildLoader {
    fn family(&self) -> &'static Family {
        &BUILD_LOADER
    }

    fn native_parent(&self) -> Option<LoaderRef> {
        self.defined_by.clone()
    }

    fn defined_packages(&self) -> Option<Vec<String>> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        Some(packages.iter().cloned().collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
