use camino::Utf8Path;

use crate::diagnostics::Diagnostics;
use crate::error::AdapterError;
use crate::loader::LoaderRef;
use crate::locator;
use crate::policy::{DuplicateEntryPolicy, EntryFilter};
use crate::task::{LoaderParameters, LoaderRequest};

/// Everything an adapter needs to create or extend a loader: the request,
/// the resolved parent and super loaders, the duplicate entry filter and a
/// place to report what happened.
pub struct LoaderContext<'a> {
    name: String,
    request: &'a LoaderRequest,
    parent: Option<LoaderRef>,
    super_loader: Option<LoaderRef>,
    filter: EntryFilter<'a>,
    base_dir: &'a Utf8Path,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> LoaderContext<'a> {
    pub fn new(
        request: &'a LoaderRequest,
        filter: EntryFilter<'a>,
        base_dir: &'a Utf8Path,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            name: request.loader.to_string(),
            request,
            parent: None,
            super_loader: None,
            filter,
            base_dir,
            diagnostics,
        }
    }

    pub fn with_parent(mut self, parent: Option<LoaderRef>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_super_loader(mut self, super_loader: Option<LoaderRef>) -> Self {
        self.super_loader = super_loader;
        self
    }

    /// Name used for the loader in messages.
    pub fn loader_name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &'a LoaderRequest {
        self.request
    }

    pub fn classpath(&self) -> &'a [String] {
        self.request.classpath.as_deref().unwrap_or_default()
    }

    pub fn parameters(&self) -> &'a LoaderParameters {
        &self.request.parameters
    }

    pub fn parent(&self) -> Option<&LoaderRef> {
        self.parent.as_ref()
    }

    pub fn super_loader(&self) -> Option<&LoaderRef> {
        self.super_loader.as_ref()
    }

    pub fn policy(&self) -> DuplicateEntryPolicy {
        self.filter.policy()
    }

    /// Normalizes a raw entry. A malformed entry is a handled error: the
    /// entry is skipped (`Ok(None)`) unless the request fails on errors.
    pub fn locate(&mut self, raw: &str) -> Result<Option<String>, AdapterError> {
        match locator::normalize(self.base_dir, raw) {
            Ok(locator) => Ok(Some(locator)),
            Err(e) => {
                self.handle_error(format!("cannot use classpath entry '{raw}': {e}"))?;
                Ok(None)
            }
        }
    }

    /// See [`EntryFilter::should_add`].
    pub fn should_add(&mut self, loader: Option<&LoaderRef>, locator: &str) -> bool {
        self.filter.should_add(loader, locator, self.diagnostics)
    }

    /// See [`EntryFilter::skip_listed`].
    pub fn skip_listed(&mut self, locator: &str) -> bool {
        self.filter.skip_listed(locator, &self.name, self.diagnostics)
    }

    pub fn handle_error(&mut self, message: String) -> Result<(), AdapterError> {
        if self.request.fail_on_error {
            return Err(AdapterError::Failed(message));
        }
        self.diagnostics.error(message);
        Ok(())
    }

    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }
}
