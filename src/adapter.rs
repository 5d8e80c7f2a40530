pub mod base;
pub use base::BaseAdapter;

pub mod build;
pub use build::BuildLoaderAdapter;

pub mod path;
pub use path::PathLoaderAdapter;

use std::fmt::{self, Debug};

use crate::context::LoaderContext;
use crate::error::{AdapterError, ProbeFailure};
use crate::handle::LoaderHandle;
use crate::loader::LoaderRef;
use crate::report::ReportSink;

/// The operations an adapter may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Append,
    GetPath,
    Report,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Append => "append",
            Operation::GetPath => "get-path",
            Operation::Report => "report",
        })
    }
}

/// Uniform access to one loader family.
///
/// Every method has a default, so an adapter only implements what its family
/// can actually do. Callers are expected to ask [`supports`] before using a
/// capability; the defaults for unsupported mutations fail with
/// [`AdapterError::Unsupported`].
///
/// [`supports`]: CapabilityAdapter::supports
pub trait CapabilityAdapter: Send + Sync + Debug {
    /// Short name, also used to refer to the adapter from configuration.
    fn name(&self) -> &'static str;

    fn supports(&self, operation: Operation) -> bool {
        operation == Operation::Report
    }

    /// Builds a new loader from the context's classpath, parent and options.
    fn create_loader(&self, _ctx: &mut LoaderContext<'_>) -> Result<LoaderRef, AdapterError> {
        Err(AdapterError::Unsupported {
            adapter: self.name(),
            operation: Operation::Create,
        })
    }

    /// Appends the context's classpath to an existing loader.
    fn append_path(
        &self,
        _ctx: &mut LoaderContext<'_>,
        _loader: &LoaderRef,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::Unsupported {
            adapter: self.name(),
            operation: Operation::Append,
        })
    }

    /// The loader's own entries as locators, or as plain file paths where
    /// possible when `normalize_file_urls` is set.
    fn get_path(
        &self,
        _loader: &LoaderRef,
        _normalize_file_urls: bool,
    ) -> Result<Vec<String>, AdapterError> {
        Err(AdapterError::Unsupported {
            adapter: self.name(),
            operation: Operation::GetPath,
        })
    }

    /// The explicitly configured parent. `None` means "use the default".
    fn get_parent(&self, loader: &LoaderRef) -> Option<LoaderRef> {
        loader.native_parent()
    }

    /// The parent used when none is configured. `None` means bootstrap.
    fn default_parent(&self) -> Option<LoaderRef> {
        None
    }

    /// Emits family specific attributes of the loader.
    fn report(&self, _sink: &mut dyn ReportSink, _loader: &LoaderRef, _role: &LoaderHandle) {}

    /// Further loaders worth reporting alongside this one, with the roles
    /// to report them under.
    fn reportables(&self, _loader: &LoaderRef, _role: &LoaderHandle) -> Vec<(LoaderHandle, LoaderRef)> {
        Vec::new()
    }

    fn list_packages(&self, loader: &LoaderRef) -> Result<Vec<String>, ProbeFailure> {
        loader.defined_packages().ok_or(ProbeFailure::NotSupported)
    }
}
