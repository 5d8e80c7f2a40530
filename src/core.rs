use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ProbeFailure;
use crate::loader::LoaderRef;

/// A named value held by the host. Only loader references take part in
/// reports; anything else is skipped.
#[derive(Debug, Clone)]
pub enum Reference {
    Loader(LoaderRef),
    Value(String),
}

/// The host as seen by this crate: its well-known loaders, the named
/// references and component definitions that may point at loaders, and a
/// handful of string properties.
///
/// The bootstrap loader has no instance; it is represented by its search
/// path, which the host may or may not be able to tell.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Directory relative classpath entries are resolved against.
    base_dir: Utf8PathBuf,
    /// `None` when the host cannot tell its bootstrap path.
    bootstrap_path: Option<Vec<String>>,
    extension: Option<LoaderRef>,
    system: Option<LoaderRef>,
    host: Option<LoaderRef>,
    core: Option<LoaderRef>,
    thread_context: Option<LoaderRef>,
    current: Option<LoaderRef>,
    references: BTreeMap<String, Reference>,
    definitions: BTreeMap<String, Option<LoaderRef>>,
    properties: BTreeMap<String, String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Environment {
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            bootstrap_path: None,
            extension: None,
            system: None,
            host: None,
            core: None,
            thread_context: None,
            current: None,
            references: BTreeMap::new(),
            definitions: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_bootstrap_path<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_path = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_extension(mut self, loader: LoaderRef) -> Self {
        self.extension = Some(loader);
        self
    }

    pub fn with_system(mut self, loader: LoaderRef) -> Self {
        self.system = Some(loader);
        self
    }

    pub fn with_host(mut self, loader: LoaderRef) -> Self {
        self.host = Some(loader);
        self
    }

    pub fn with_current(mut self, loader: LoaderRef) -> Self {
        self.current = Some(loader);
        self
    }

    pub fn with_thread_context(mut self, loader: LoaderRef) -> Self {
        self.thread_context = Some(loader);
        self
    }

    pub fn with_core(mut self, loader: LoaderRef) -> Self {
        self.core = Some(loader);
        self
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Probes the bootstrap search path.
    pub fn bootstrap_path(&self) -> Result<&[String], ProbeFailure> {
        self.bootstrap_path.as_deref().ok_or(ProbeFailure::NotSupported)
    }

    pub fn extension(&self) -> Option<&LoaderRef> {
        self.extension.as_ref()
    }

    pub fn system(&self) -> Option<&LoaderRef> {
        self.system.as_ref()
    }

    pub fn host(&self) -> Option<&LoaderRef> {
        self.host.as_ref()
    }

    pub fn core(&self) -> Option<&LoaderRef> {
        self.core.as_ref()
    }

    pub fn thread_context(&self) -> Option<&LoaderRef> {
        self.thread_context.as_ref()
    }

    pub fn current(&self) -> Option<&LoaderRef> {
        self.current.as_ref()
    }

    pub fn set_core(&mut self, loader: Option<LoaderRef>) {
        self.core = loader;
    }

    pub fn set_thread_context(&mut self, loader: Option<LoaderRef>) {
        self.thread_context = loader;
    }

    pub fn references(&self) -> &BTreeMap<String, Reference> {
        &self.references
    }

    pub fn reference(&self, name: &str) -> Option<&Reference> {
        self.references.get(name)
    }

    pub fn add_reference(&mut self, name: impl Into<String>, reference: Reference) {
        self.references.insert(name.into(), reference);
    }

    pub fn definitions(&self) -> &BTreeMap<String, Option<LoaderRef>> {
        &self.definitions
    }

    /// Records a component definition and the loader it was loaded through,
    /// if any.
    pub fn define(&mut self, name: impl Into<String>, loader: Option<LoaderRef>) {
        self.definitions.insert(name.into(), loader);
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }
}
