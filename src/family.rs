use std::fmt;

/// A loader family: the type descriptor adapters are registered against.
///
/// Families form a subtype lattice through their declared supertypes. A
/// family may declare several supertypes, which is how two otherwise
/// unrelated registrations can both match the same loader.
///
/// ```
/// use loaderkit::family::{Family, LOADER};
///
/// const JAR: Family = Family::new("jar-loader", &[&LOADER]);
///
/// assert!(LOADER.is_assignable_from(&JAR));
/// assert!(!JAR.is_assignable_from(&LOADER));
/// ```
pub struct Family {
    name: &'static str,
    supers: &'static [&'static Family],
}

impl Family {
    pub const fn new(name: &'static str, supers: &'static [&'static Family]) -> Self {
        Self { name, supers }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn supers(&self) -> &'static [&'static Family] {
        self.supers
    }

    /// Whether a loader of family `other` may be handled as `self`.
    /// Reflexive and transitive over declared supertypes.
    pub fn is_assignable_from(&self, other: &Family) -> bool {
        self == other || other.supers.iter().any(|s| self.is_assignable_from(s))
    }

    /// Strictly more specific: `self` is a proper subtype of `other`.
    pub fn is_more_specific_than(&self, other: &Family) -> bool {
        self != other && other.is_assignable_from(self)
    }
}

impl PartialEq for Family {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Family {}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Family").field(&self.name).finish()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Root family every loader belongs to.
pub const LOADER: Family = Family::new("loader", &[]);

/// Loaders searching an ordered list of URL locators.
pub const PATH_LOADER: Family = Family::new("path-loader", &[&LOADER]);

/// Loaders created by the build engine, searching file system entries.
pub const BUILD_LOADER: Family = Family::new("build-loader", &[&LOADER]);

/// Families known by name without any extra configuration.
pub fn builtin() -> [&'static Family; 3] {
    [&LOADER, &PATH_LOADER, &BUILD_LOADER]
}
