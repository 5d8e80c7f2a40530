use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::diagnostics::{Diagnostics, Severity};
use crate::loader::LoaderRef;
use crate::walker::DelegationWalker;

/// What to do with a classpath entry that is already reachable through the
/// loader it is being added to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateEntryPolicy {
    /// Add without looking.
    Ignore,
    /// Look, warn, add anyway unless the loader itself lists it.
    Warn,
    /// Look, log quietly, leave it out.
    #[default]
    Omit,
}

impl DuplicateEntryPolicy {
    pub fn requires_check(self) -> bool {
        self != DuplicateEntryPolicy::Ignore
    }

    pub fn keeps_duplicates(self) -> bool {
        self != DuplicateEntryPolicy::Omit
    }

    fn severity(self) -> Severity {
        match self {
            DuplicateEntryPolicy::Warn => Severity::Warning,
            _ => Severity::Verbose,
        }
    }
}

impl fmt::Display for DuplicateEntryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicateEntryPolicy::Ignore => "ignore",
            DuplicateEntryPolicy::Warn => "warn",
            DuplicateEntryPolicy::Omit => "omit",
        })
    }
}

impl FromStr for DuplicateEntryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(DuplicateEntryPolicy::Ignore),
            "warn" => Ok(DuplicateEntryPolicy::Warn),
            "omit" => Ok(DuplicateEntryPolicy::Omit),
            other => Err(format!("unknown duplicate entry policy '{other}'")),
        }
    }
}

/// Decides, entry by entry, whether a locator may be added below a loader.
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter<'a> {
    policy: DuplicateEntryPolicy,
    walker: DelegationWalker<'a>,
}

impl<'a> EntryFilter<'a> {
    pub fn new(policy: DuplicateEntryPolicy, walker: DelegationWalker<'a>) -> Self {
        Self { policy, walker }
    }

    pub fn policy(&self) -> DuplicateEntryPolicy {
        self.policy
    }

    /// `loader` is where the search starts, `None` being the bootstrap loader.
    pub fn should_add(
        &self,
        loader: Option<&LoaderRef>,
        locator: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if !self.policy.requires_check() {
            return true;
        }

        if !self.walker.contains_entry(loader, locator, diagnostics) {
            return true;
        }

        let action = match self.policy.keeps_duplicates() {
            true => "adding it anyway",
            false => "omitting it",
        };
        diagnostics.log(
            self.policy.severity(),
            format!("entry {locator} is already reachable through the delegation chain, {action}"),
        );

        self.policy.keeps_duplicates()
    }

    /// Called for a locator the target loader itself already lists. A checking
    /// policy never stores it twice, WARN still warns about it.
    pub fn skip_listed(&self, locator: &str, owner: &str, diagnostics: &mut Diagnostics) -> bool {
        if !self.policy.requires_check() {
            return false;
        }

        diagnostics.log(
            self.policy.severity(),
            format!("entry {locator} is already listed by loader {owner}, skipping it"),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::Environment;
    use crate::loader::PathLoader;
    use crate::registry::HandlerRegistry;

    #[test]
    fn test_parse_policy() {
        assert_eq!("WARN".parse(), Ok(DuplicateEntryPolicy::Warn));
        assert_eq!("omit".parse(), Ok(DuplicateEntryPolicy::Omit));
        assert!("drop".parse::<DuplicateEntryPolicy>().is_err());
        assert_eq!(DuplicateEntryPolicy::default(), DuplicateEntryPolicy::Omit);
    }

    #[test]
    fn test_should_add_per_policy() {
        let env = Environment::default().with_bootstrap_path(Vec::<String>::new());
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);
        let loader: LoaderRef = Arc::new(PathLoader::new("p", None, vec!["file:///a.jar".into()]));

        let cases = [
            (DuplicateEntryPolicy::Ignore, true, 0, 0),
            (DuplicateEntryPolicy::Warn, true, 1, 0),
            (DuplicateEntryPolicy::Omit, false, 0, 1),
        ];

        for (policy, expected, warnings, verbose) in cases {
            let mut diagnostics = Diagnostics::new();
            let filter = EntryFilter::new(policy, walker);
            assert_eq!(
                filter.should_add(Some(&loader), "file:///a.jar", &mut diagnostics),
                expected,
                "{policy}"
            );
            assert_eq!(diagnostics.count(Severity::Warning), warnings, "{policy}");
            assert_eq!(diagnostics.count(Severity::Verbose), verbose, "{policy}");

            let mut diagnostics = Diagnostics::new();
            assert!(filter.should_add(Some(&loader), "file:///b.jar", &mut diagnostics));
            assert!(diagnostics.messages().is_empty());
        }
    }

    #[test]
    fn test_skip_listed_per_policy() {
        let env = Environment::default().with_bootstrap_path(Vec::<String>::new());
        let registry = HandlerRegistry::new(&env);
        let walker = DelegationWalker::new(&registry, &env);

        let cases = [
            (DuplicateEntryPolicy::Ignore, false, 0, 0),
            (DuplicateEntryPolicy::Warn, true, 1, 0),
            (DuplicateEntryPolicy::Omit, true, 0, 1),
        ];

        for (policy, skipped, warnings, verbose) in cases {
            let mut diagnostics = Diagnostics::new();
            let filter = EntryFilter::new(policy, walker);
            assert_eq!(filter.skip_listed("file:///a.jar", "p", &mut diagnostics), skipped, "{policy}");
            assert_eq!(diagnostics.count(Severity::Warning), warnings, "{policy}");
            assert_eq!(diagnostics.count(Severity::Verbose), verbose, "{policy}");
            assert!(diagnostics.messages().iter().all(|m| m.message.contains("skipping it")));
        }
    }
}
