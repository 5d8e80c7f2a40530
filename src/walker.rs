//! Walks the delegation graph of loaders: parent lookup for reporting, and
//! the duplicate entry search used while building classpaths.

use std::collections::HashSet;

use crate::adapter::Operation;
use crate::core::Environment;
use crate::diagnostics::Diagnostics;
use crate::error::ResolutionError;
use crate::loader::{LoaderRef, identity};
use crate::registry::HandlerRegistry;

/// How a loader's parent was determined.
#[derive(Debug, Clone)]
pub enum ParentLink {
    /// Configured on the loader itself.
    Explicit(LoaderRef),
    /// Supplied by the adapter as the family default.
    Implicit(LoaderRef),
    /// No parent at all, the bootstrap loader takes its place.
    Bootstrap,
}

impl ParentLink {
    pub fn loader(&self) -> Option<&LoaderRef> {
        match self {
            ParentLink::Explicit(loader) | ParentLink::Implicit(loader) => Some(loader),
            ParentLink::Bootstrap => None,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, ParentLink::Explicit(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DelegationWalker<'a> {
    registry: &'a HandlerRegistry,
    env: &'a Environment,
}

impl<'a> DelegationWalker<'a> {
    pub fn new(registry: &'a HandlerRegistry, env: &'a Environment) -> Self {
        Self { registry, env }
    }

    pub fn registry(&self) -> &'a HandlerRegistry {
        self.registry
    }

    pub fn parent_of(&self, loader: &LoaderRef) -> Result<ParentLink, ResolutionError> {
        let adapter = self.registry.resolve(loader, None)?;
        let link = match adapter.get_parent(loader) {
            Some(parent) => ParentLink::Explicit(parent),
            None => match adapter.default_parent() {
                Some(parent) => ParentLink::Implicit(parent),
                None => ParentLink::Bootstrap,
            },
        };
        Ok(link)
    }

    /// Whether `locator` is reachable from `loader` (`None` meaning the
    /// bootstrap loader).
    ///
    /// The loader's own entries are searched before its parent's, which is
    /// not necessarily the order the loader itself uses. Anything that could
    /// not be investigated along the way is reported in one warning, but only
    /// when the entry was not found.
    pub fn contains_entry(
        &self,
        loader: Option<&LoaderRef>,
        locator: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let mut reasons = Vec::new();
        let found = self.search(loader, locator, &mut reasons);

        if !found && !reasons.is_empty() {
            let mut message =
                String::from("Check for duplicate entries fails due to the following reason(s):");
            for reason in &reasons {
                message.push_str("\n  - ");
                message.push_str(reason);
            }
            diagnostics.warn(message);
        }

        found
    }

    fn search(&self, loader: Option<&LoaderRef>, locator: &str, reasons: &mut Vec<String>) -> bool {
        let mut visited = HashSet::new();
        let mut current = loader.cloned();

        loop {
            let Some(loader) = current.take() else {
                return match self.env.bootstrap_path() {
                    Ok(entries) => entries.iter().any(|e| e == locator),
                    Err(e) => {
                        reasons.push(format!("bootstrap path not investigable ({e})"));
                        false
                    }
                };
            };

            // delegation cycle, everything on it has been searched
            if !visited.insert(identity(&loader)) {
                return false;
            }

            if self.contains_own(&loader, locator, reasons) {
                return true;
            }

            match self.parent_of(&loader) {
                Ok(link) => current = link.loader().cloned(),
                Err(e) => {
                    reasons.push(format!(
                        "parent of {} not investigable ({e})",
                        loader.type_name()
                    ));
                    return false;
                }
            }
        }
    }

    fn contains_own(&self, loader: &LoaderRef, locator: &str, reasons: &mut Vec<String>) -> bool {
        let adapter = match self.registry.resolve(loader, Some(Operation::GetPath)) {
            Ok(adapter) => adapter,
            Err(e) => {
                reasons.push(format!("path of {} not investigable ({e})", loader.type_name()));
                return false;
            }
        };

        match adapter.get_path(loader, false) {
            Ok(entries) => entries.iter().any(|e| e == locator),
            Err(e) => {
                reasons.push(format!("path of {} not investigable ({e})", loader.type_name()));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diagnostics::Severity;
    use crate::loader::{GenericLoader, PathLoader, same_loader};

    fn path(name: &str, parent: Option<LoaderRef>, entries: &[&str]) -> LoaderRef {
        let entries = entries.iter().map(|e| e.to_string()).collect();
        Arc::new(PathLoader::new(name, parent, entries))
    }

    #[test]
    fn test_found_in_ancestor() {
        let env = Environment::default().with_bootstrap_path(["file:///rt.jar"]);
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let root = path("root", None, &["file:///a.jar"]);
        let child = path("child", Some(root), &["file:///b.jar"]);

        let mut diagnostics = Diagnostics::new();
        assert!(walker.contains_entry(Some(&child), "file:///a.jar", &mut diagnostics));
        assert!(walker.contains_entry(Some(&child), "file:///b.jar", &mut diagnostics));
        assert!(walker.contains_entry(Some(&child), "file:///rt.jar", &mut diagnostics));
        assert!(walker.contains_entry(None, "file:///rt.jar", &mut diagnostics));
        assert!(!walker.contains_entry(Some(&child), "file:///c.jar", &mut diagnostics));
        assert!(diagnostics.messages().is_empty());
    }

    #[test]
    fn test_gaps_are_aggregated_into_one_warning() {
        let env = Environment::default();
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let opaque: LoaderRef = Arc::new(GenericLoader::new("opaque"));
        let child = path("child", Some(opaque), &[]);

        let mut diagnostics = Diagnostics::new();
        assert!(!walker.contains_entry(Some(&child), "file:///x.jar", &mut diagnostics));
        assert_eq!(diagnostics.count(Severity::Warning), 1);

        let warning = diagnostics.with_severity(Severity::Warning).next().unwrap();
        assert!(warning.starts_with("Check for duplicate entries fails"));
        assert!(warning.contains("path of"));
        assert!(warning.contains("bootstrap path not investigable"));
    }

    #[test]
    fn test_no_warning_when_found() {
        let env = Environment::default();
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let loader = path("p", None, &["file:///x.jar"]);
        let mut diagnostics = Diagnostics::new();
        assert!(walker.contains_entry(Some(&loader), "file:///x.jar", &mut diagnostics));
        assert!(diagnostics.messages().is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let env = Environment::default().with_bootstrap_path(Vec::<String>::new());
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let a = Arc::new(GenericLoader::new("a"));
        let b: LoaderRef = Arc::new(GenericLoader::new("b").with_parent(a.clone()));
        a.set_parent(Some(b.clone()));

        let mut diagnostics = Diagnostics::new();
        assert!(!walker.contains_entry(Some(&b), "file:///x.jar", &mut diagnostics));
    }

    #[test]
    fn test_parent_link_kinds() {
        let system: LoaderRef = Arc::new(GenericLoader::new("system"));
        let env = Environment::default().with_system(system.clone());
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let build: LoaderRef = Arc::new(crate::loader::BuildLoader::new("b", None));
        match walker.parent_of(&build).unwrap() {
            ParentLink::Implicit(parent) => assert!(same_loader(&parent, &system)),
            other => panic!("unexpected {other:?}"),
        }

        let child = path("child", Some(system.clone()), &[]);
        assert!(walker.parent_of(&child).unwrap().is_explicit());
        assert!(matches!(walker.parent_of(&system).unwrap(), ParentLink::Bootstrap));
    }
}
