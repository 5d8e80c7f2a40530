pub use anyhow::Error as RuntimeError;
use thiserror::Error;

use crate::adapter::Operation;
use crate::handle::LoaderHandle;

/// Renders an optional operation, where `None` means "any operation".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyOperation(pub Option<Operation>);

impl std::fmt::Display for AnyOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(op) => op.fmt(f),
            None => f.write_str("any"),
        }
    }
}

/// Why a loader could not be matched with an adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no handler registry configured")]
    NoRegistry,

    #[error("no handler found for family '{family}' (operation: {operation})")]
    NoHandler {
        family: &'static str,
        operation: AnyOperation,
    },

    #[error("handler for family '{family}' retrieves no adapter ('{adapter}')")]
    AdapterRejected {
        family: &'static str,
        adapter: String,
    },
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter '{adapter}' does not support operation '{operation}'")]
    Unsupported {
        adapter: &'static str,
        operation: Operation,
    },

    #[error("adapter '{adapter}' cannot handle a loader of family '{family}'")]
    Incompatible {
        adapter: &'static str,
        family: &'static str,
    },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("An error occured in the adapter.\n{0}")]
    Other(#[from] anyhow::Error),
}

/// An optional host capability that could not be queried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("not supported")]
    NotSupported,

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("Couldn't parse '{0}' as a URL.\n{1}")]
    Malformed(String, url::ParseError),

    #[error("Couldn't turn '{0}' into a file URL")]
    NotAbsolute(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("role {0} is registered twice")]
    DuplicateRole(LoaderHandle),

    #[error("internal error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("report pass is {actual}, expected {expected}")]
    PassState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("internal error: inconsistent report ({0})")]
    Inconsistent(String),

    #[error("Couldn't write the report.\n{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("reference '{0}' is not a loader")]
    NotALoader(String),

    #[error("loader slot '{0}' cannot be assigned")]
    NotAssignable(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown loader family '{0}'")]
    UnknownFamily(String),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't read configuration file.\n{0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Couldn't parse configuration.\n{0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
