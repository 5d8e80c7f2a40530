use crate::adapter::CapabilityAdapter;

/// Fallback for every loader: reports what the loader says about itself and
/// supports nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseAdapter;

impl CapabilityAdapter for BaseAdapter {
    fn name(&self) -> &'static str {
        "base"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapter::Operation;
    use crate::error::{AdapterError, ProbeFailure};
    use crate::loader::{GenericLoader, LoaderRef, same_loader};

    #[test]
    fn test_supports_report_only() {
        assert!(BaseAdapter.supports(Operation::Report));
        assert!(!BaseAdapter.supports(Operation::Create));
        assert!(!BaseAdapter.supports(Operation::Append));
        assert!(!BaseAdapter.supports(Operation::GetPath));
    }

    #[test]
    fn test_unsupported_operations_fail() {
        let loader: LoaderRef = Arc::new(GenericLoader::new("a"));
        assert!(matches!(
            BaseAdapter.get_path(&loader, false),
            Err(AdapterError::Unsupported { operation: Operation::GetPath, .. })
        ));
    }

    #[test]
    fn test_native_parent_and_packages() {
        let parent: LoaderRef = Arc::new(GenericLoader::new("p"));
        let loader: LoaderRef = Arc::new(GenericLoader::new("a").with_parent(parent.clone()));

        assert!(same_loader(&BaseAdapter.get_parent(&loader).unwrap(), &parent));
        assert!(BaseAdapter.default_parent().is_none());
        assert_eq!(BaseAdapter.list_packages(&loader), Err(ProbeFailure::NotSupported));

        let loader: LoaderRef = Arc::new(GenericLoader::new("b").with_packages(["org.x"]));
        assert_eq!(BaseAdapter.list_packages(&loader), Ok(vec!["org.x".to_string()]));
    }
}
