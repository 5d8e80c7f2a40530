#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod adapter;
mod config;
mod context;
mod core;
mod diagnostics;
mod error;
pub mod family;
mod handle;
pub mod loader;
mod locator;
#[cfg(feature = "logging")]
mod logging;
mod policy;
pub mod registry;
pub mod report;
mod task;
mod walker;

pub use crate::adapter::{CapabilityAdapter, Operation};
pub use crate::config::Config;
pub use crate::context::LoaderContext;
pub use crate::core::{Environment, Reference};
pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
pub use crate::error::*;
pub use crate::family::Family;
pub use crate::handle::{Category, LoaderHandle};
pub use crate::loader::{Loader, LoaderRef, same_loader};
pub use crate::locator::{normalize as normalize_locator, to_file_path};
#[cfg(feature = "logging")]
pub use crate::logging::init_logging;
pub use crate::policy::{DuplicateEntryPolicy, EntryFilter};
pub use crate::registry::{AdapterCatalog, HandlerRegistry, HandlerSpec, Registration, RegistryConfig};
pub use crate::report::{Format, Hierarchy, ReportOptions, ReportTask, render};
pub use crate::task::{
    LoaderParameters, LoaderRequest, LoaderSlot, LoaderTask, Outcome, SYSPATH_PROPERTY,
};
pub use crate::walker::{DelegationWalker, ParentLink};
