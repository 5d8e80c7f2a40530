use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::adapter::{BaseAdapter, BuildLoaderAdapter, CapabilityAdapter, Operation, PathLoaderAdapter};
use crate::core::Environment;
use crate::error::{AnyOperation, RegistryError, ResolutionError};
use crate::family::{self, BUILD_LOADER, Family, LOADER, PATH_LOADER};
use crate::loader::LoaderRef;

/// Declares that loaders of `family` are handled by an adapter.
#[derive(Clone)]
pub struct Registration {
    family: &'static Family,
    adapter_name: String,
    /// Missing when the named adapter could not be instantiated.
    adapter: Option<Arc<dyn CapabilityAdapter>>,
}

impl Registration {
    pub fn new(family: &'static Family, adapter: Arc<dyn CapabilityAdapter>) -> Self {
        Self {
            family,
            adapter_name: adapter.name().to_string(),
            adapter: Some(adapter),
        }
    }

    fn unresolved(family: &'static Family, adapter_name: &str) -> Self {
        Self {
            family,
            adapter_name: adapter_name.to_string(),
            adapter: None,
        }
    }

    pub fn family(&self) -> &'static Family {
        self.family
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn adapter(&self) -> Result<Arc<dyn CapabilityAdapter>, ResolutionError> {
        self.adapter
            .clone()
            .ok_or_else(|| ResolutionError::AdapterRejected {
                family: self.family.name(),
                adapter: self.adapter_name.clone(),
            })
    }

    /// An adapter that could not be instantiated cannot declare support for
    /// anything, but still competes when any operation will do.
    fn accepts(&self, operation: Option<Operation>) -> bool {
        match operation {
            None => true,
            Some(op) => self.adapter.as_ref().is_some_and(|a| a.supports(op)),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("family", &self.family.name())
            .field("adapter", &self.adapter_name)
            .field("resolved", &self.adapter.is_some())
            .finish()
    }
}

/// Maps loader families to capability adapters and picks the most specific
/// one for a given loader.
///
/// Explicit registrations are consulted before the built-in defaults, and a
/// family registered explicitly shadows its default.
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
    add_defaults: bool,
    system: Option<LoaderRef>,
    /// Explicit registrations followed by the defaults, computed on first use.
    effective: OnceLock<Vec<Registration>>,
}

impl HandlerRegistry {
    /// A registry with the built-in defaults for `env`.
    pub fn new(env: &Environment) -> Self {
        Self {
            registrations: Vec::new(),
            add_defaults: true,
            system: env.system().cloned(),
            effective: OnceLock::new(),
        }
    }

    /// A registry without any defaults.
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
            add_defaults: false,
            system: None,
            effective: OnceLock::new(),
        }
    }

    pub fn from_config(
        config: &RegistryConfig,
        env: &Environment,
        catalog: &AdapterCatalog,
    ) -> Result<Self, RegistryError> {
        let mut registry = match config.add_defaults {
            true => Self::new(env),
            false => Self::empty(),
        };
        for spec in &config.handlers {
            registry.register_spec(spec, catalog)?;
        }
        Ok(registry)
    }

    /// Registers `adapter` for `family`. A family can only be registered once;
    /// later registrations are ignored and `false` is returned.
    pub fn register(&mut self, family: &'static Family, adapter: Arc<dyn CapabilityAdapter>) -> bool {
        self.push(Registration::new(family, adapter))
    }

    /// Registers a handler named in configuration.
    pub fn register_spec(
        &mut self,
        spec: &HandlerSpec,
        catalog: &AdapterCatalog,
    ) -> Result<bool, RegistryError> {
        let family = catalog
            .family(&spec.loader)
            .ok_or_else(|| RegistryError::UnknownFamily(spec.loader.clone()))?;

        let registration = match catalog.adapter(&spec.adapter) {
            Some(adapter) => Registration::new(family, adapter),
            None => {
                tracing::warn!("unknown adapter '{}' for family '{}'", spec.adapter, family);
                Registration::unresolved(family, &spec.adapter)
            }
        };

        Ok(self.push(registration))
    }

    fn push(&mut self, registration: Registration) -> bool {
        if self.registrations.iter().any(|r| r.family == registration.family) {
            tracing::debug!("family '{}' is already registered", registration.family);
            return false;
        }
        self.registrations.push(registration);
        self.effective = OnceLock::new();
        true
    }

    fn defaults(&self) -> Vec<Registration> {
        vec![
            Registration::new(&PATH_LOADER, Arc::new(PathLoaderAdapter)),
            Registration::new(&BUILD_LOADER, Arc::new(BuildLoaderAdapter::new(self.system.clone()))),
            Registration::new(&LOADER, Arc::new(BaseAdapter)),
        ]
    }

    /// Every registration in consultation order.
    pub fn registrations(&self) -> &[Registration] {
        self.effective.get_or_init(|| {
            let mut all = self.registrations.clone();
            if self.add_defaults {
                let defaults = self.defaults();
                all.extend(
                    defaults
                        .into_iter()
                        .filter(|d| !self.registrations.iter().any(|r| r.family == d.family)),
                );
            }
            all
        })
    }

    /// The registration made for exactly this family.
    pub fn declared(&self, family_name: &str) -> Option<&Registration> {
        self.registrations()
            .iter()
            .find(|r| r.family.name() == family_name)
    }

    /// Finds the adapter for `loader` supporting `operation` (`None` meaning
    /// any operation).
    ///
    /// Among all registrations whose family accepts the loader, the most
    /// specific one wins. Registrations unrelated to each other keep their
    /// consultation order.
    pub fn resolve(
        &self,
        loader: &LoaderRef,
        operation: Option<Operation>,
    ) -> Result<Arc<dyn CapabilityAdapter>, ResolutionError> {
        let registrations = self.registrations();
        if registrations.is_empty() {
            return Err(ResolutionError::NoRegistry);
        }

        let actual = loader.family();
        let mut candidates: Vec<&Registration> = registrations
            .iter()
            .filter(|r| r.family.is_assignable_from(actual) && r.accepts(operation))
            .collect();

        sort_by_specificity(&mut candidates, |r| r.family);

        match candidates.first() {
            Some(best) => best.adapter(),
            None => Err(ResolutionError::NoHandler {
                family: actual.name(),
                operation: AnyOperation(operation),
            }),
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registrations", &self.registrations)
            .field("add_defaults", &self.add_defaults)
            .finish_non_exhaustive()
    }
}

/// Stable insertion sort over a partial order: each item moves in front of
/// the first already-sorted item it is strictly more specific than.
pub(crate) fn sort_by_specificity<T>(items: &mut [T], family: impl Fn(&T) -> &'static Family) {
    for current in 1..items.len() {
        let candidate = family(&items[current]);
        let target = (0..current).find(|&sorted| candidate.is_more_specific_than(family(&items[sorted])));
        if let Some(sorted) = target {
            items[sorted..=current].rotate_right(1);
        }
    }
}

/// A handler as written in configuration: family and adapter by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandlerSpec {
    pub loader: String,
    pub adapter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub add_defaults: bool,
    pub handlers: Vec<HandlerSpec>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            add_defaults: true,
            handlers: Vec::new(),
        }
    }
}

/// Families and adapters that configuration may refer to by name.
#[derive(Debug, Clone)]
pub struct AdapterCatalog {
    families: BTreeMap<&'static str, &'static Family>,
    adapters: BTreeMap<&'static str, Arc<dyn CapabilityAdapter>>,
}

impl AdapterCatalog {
    pub fn builtin(env: &Environment) -> Self {
        let catalog = Self {
            families: BTreeMap::new(),
            adapters: BTreeMap::new(),
        };

        let catalog = family::builtin()
            .into_iter()
            .fold(catalog, |catalog, family| catalog.with_family(family));

        catalog
            .with_adapter(Arc::new(BaseAdapter))
            .with_adapter(Arc::new(PathLoaderAdapter))
            .with_adapter(Arc::new(BuildLoaderAdapter::new(env.system().cloned())))
    }

    pub fn with_family(mut self, family: &'static Family) -> Self {
        self.families.insert(family.name(), family);
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn CapabilityAdapter>) -> Self {
        self.adapters.insert(adapter.name(), adapter);
        self
    }

    pub fn family(&self, name: &str) -> Option<&'static Family> {
        self.families.get(name).copied()
    }

    pub fn adapter(&self, name: &str) -> Option<Arc<dyn CapabilityAdapter>> {
        self.adapters.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{GenericLoader, PathLoader};

    const SIGNED: Family = Family::new("signed", &[&LOADER]);
    const SIGNED_PATH: Family = Family::new("signed-path", &[&PATH_LOADER, &SIGNED]);
    const ARCHIVE: Family = Family::new("archive", &[&LOADER]);
    const REMOTE: Family = Family::new("remote", &[&LOADER]);
    const COMPOSITE: Family = Family::new("composite", &[&SIGNED, &ARCHIVE, &REMOTE, &PATH_LOADER]);

    #[derive(Debug)]
    struct Named(&'static str);

    impl CapabilityAdapter for Named {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    fn loader(family: &'static Family) -> LoaderRef {
        Arc::new(GenericLoader::new("l").with_family(family))
    }

    #[test]
    fn test_defaults() {
        let registry = HandlerRegistry::new(&Environment::default());

        let path: LoaderRef = Arc::new(PathLoader::new("p", None, vec![]));
        assert_eq!(registry.resolve(&path, None).unwrap().name(), "path");
        assert_eq!(registry.resolve(&loader(&LOADER), None).unwrap().name(), "base");
        assert_eq!(
            registry.resolve(&loader(&LOADER), Some(Operation::Report)).unwrap().name(),
            "base"
        );
    }

    #[test]
    fn test_no_handler_for_operation() {
        let registry = HandlerRegistry::new(&Environment::default());
        let err = registry
            .resolve(&loader(&LOADER), Some(Operation::GetPath))
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NoHandler {
                family: "loader",
                operation: AnyOperation(Some(Operation::GetPath)),
            }
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::empty();
        assert_eq!(
            registry.resolve(&loader(&LOADER), None).unwrap_err(),
            ResolutionError::NoRegistry
        );
    }

    #[test]
    fn test_most_specific_wins_regardless_of_order() {
        let mut registry = HandlerRegistry::empty();
        registry.register(&LOADER, Arc::new(Named("general")));
        registry.register(&PATH_LOADER, Arc::new(Named("special")));
        assert_eq!(registry.resolve(&loader(&SIGNED_PATH), None).unwrap().name(), "special");

        let mut registry = HandlerRegistry::empty();
        registry.register(&PATH_LOADER, Arc::new(Named("special")));
        registry.register(&LOADER, Arc::new(Named("general")));
        assert_eq!(registry.resolve(&loader(&SIGNED_PATH), None).unwrap().name(), "special");
    }

    #[test]
    fn test_unrelated_candidates_keep_registration_order() {
        let mut registry = HandlerRegistry::empty();
        registry.register(&SIGNED, Arc::new(Named("signed")));
        registry.register(&PATH_LOADER, Arc::new(Named("path")));
        assert_eq!(registry.resolve(&loader(&SIGNED_PATH), None).unwrap().name(), "signed");

        let mut registry = HandlerRegistry::empty();
        registry.register(&PATH_LOADER, Arc::new(Named("path")));
        registry.register(&SIGNED, Arc::new(Named("signed")));
        assert_eq!(registry.resolve(&loader(&SIGNED_PATH), None).unwrap().name(), "path");
    }

    #[test]
    fn test_many_unrelated_candidates_keep_registration_order() {
        let orders: [[&'static Family; 5]; 2] = [
            [&REMOTE, &LOADER, &SIGNED, &ARCHIVE, &PATH_LOADER],
            [&LOADER, &ARCHIVE, &PATH_LOADER, &REMOTE, &SIGNED],
        ];
        let expected = [
            ["remote", "signed", "archive", "path-loader", "loader"],
            ["archive", "path-loader", "remote", "signed", "loader"],
        ];

        for (order, expected) in orders.into_iter().zip(expected) {
            let mut registry = HandlerRegistry::empty();
            for family in order {
                registry.register(family, Arc::new(Named(family.name())));
            }
            assert_eq!(registry.resolve(&loader(&COMPOSITE), None).unwrap().name(), expected[0]);

            let mut sorted = order.to_vec();
            sort_by_specificity(&mut sorted, |family| *family);
            let names: Vec<&str> = sorted.iter().map(|family| family.name()).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_explicit_registration_shadows_default() {
        let mut registry = HandlerRegistry::new(&Environment::default());
        assert_eq!(registry.registrations().len(), 3);

        assert!(registry.register(&PATH_LOADER, Arc::new(Named("mine"))));
        assert!(!registry.register(&PATH_LOADER, Arc::new(Named("again"))));

        let path: LoaderRef = Arc::new(PathLoader::new("p", None, vec![]));
        assert_eq!(registry.resolve(&path, None).unwrap().name(), "mine");
        assert_eq!(registry.registrations().len(), 3);
    }

    #[test]
    fn test_operation_filter_skips_to_less_specific() {
        let mut registry = HandlerRegistry::empty();
        registry.register(&PATH_LOADER, Arc::new(Named("report-only")));
        registry.register(&LOADER, Arc::new(PathLoaderAdapter));

        let path: LoaderRef = Arc::new(PathLoader::new("p", None, vec![]));
        assert_eq!(registry.resolve(&path, None).unwrap().name(), "report-only");
        assert_eq!(
            registry.resolve(&path, Some(Operation::GetPath)).unwrap().name(),
            "path"
        );
    }

    #[test]
    fn test_register_spec() {
        let env = Environment::default();
        let catalog = AdapterCatalog::builtin(&env).with_family(&SIGNED);
        let mut registry = HandlerRegistry::empty();

        let spec = HandlerSpec {
            loader: "signed".into(),
            adapter: "no-such-adapter".into(),
        };
        assert!(registry.register_spec(&spec, &catalog).unwrap());
        assert_eq!(
            registry.resolve(&loader(&SIGNED), None).unwrap_err(),
            ResolutionError::AdapterRejected {
                family: "signed",
                adapter: "no-such-adapter".into(),
            }
        );
        assert!(matches!(
            registry.resolve(&loader(&SIGNED), Some(Operation::Report)),
            Err(ResolutionError::NoHandler { .. })
        ));

        let spec = HandlerSpec {
            loader: "nope".into(),
            adapter: "base".into(),
        };
        assert!(matches!(
            registry.register_spec(&spec, &catalog),
            Err(RegistryError::UnknownFamily(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_from_config() {
        let config: RegistryConfig = serde_json::from_str(
            r#"{ "add_defaults": false, "handlers": [{ "loader": "loader", "adapter": "base" }] }"#,
        )
        .unwrap();
        let env = Environment::default();
        let registry = HandlerRegistry::from_config(&config, &env, &AdapterCatalog::builtin(&env)).unwrap();
        assert_eq!(registry.registrations().len(), 1);
        assert_eq!(registry.declared("loader").unwrap().adapter_name(), "base");
        assert!(registry.declared("path-loader").is_none());
    }
}
