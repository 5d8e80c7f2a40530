use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ReportError;
use crate::handle::LoaderHandle;
use crate::report::sink::{Event, ReportSink, Section, emit_section};

/// How loader records are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hierarchy {
    /// Every record at top level, children listed by role.
    Flat,
    /// Records nested below their parent's record.
    Tree,
}

impl FromStr for Hierarchy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Hierarchy::Flat),
            "tree" => Ok(Hierarchy::Tree),
            other => Err(format!("unknown hierarchy '{other}'")),
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hierarchy::Flat => "flat",
            Hierarchy::Tree => "tree",
        })
    }
}

#[derive(Debug, Clone)]
struct ParentRef {
    role: LoaderHandle,
    explicit: bool,
}

#[derive(Debug, Clone)]
struct CollectedLoader {
    role: LoaderHandle,
    parent: Option<ParentRef>,
    type_name: Option<String>,
    attributes: Vec<(String, String)>,
    entries: Vec<String>,
    roles: Vec<LoaderHandle>,
    packages: Option<Vec<String>>,
}

impl CollectedLoader {
    fn new(role: &LoaderHandle) -> Self {
        Self {
            role: role.clone(),
            parent: None,
            type_name: None,
            attributes: Vec::new(),
            entries: Vec::new(),
            roles: Vec::new(),
            packages: None,
        }
    }
}

/// Collects a report as it streams in, then replays it in a fixed section
/// order: errors, unassigned roles, aliases, then the loader records, laid
/// out per [`Hierarchy`].
#[derive(Debug)]
pub struct ReportBuilder {
    hierarchy: Hierarchy,
    records: BTreeMap<LoaderHandle, CollectedLoader>,
    current: Option<CollectedLoader>,
    errors: Vec<String>,
    unassigned: Vec<LoaderHandle>,
    aliases: Vec<(LoaderHandle, LoaderHandle)>,
}

impl ReportBuilder {
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            hierarchy,
            records: BTreeMap::new(),
            current: None,
            errors: Vec::new(),
            unassigned: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn hierarchy(&self) -> Hierarchy {
        self.hierarchy
    }

    /// Replays everything collected into `to`.
    pub fn replay(&self, to: &mut dyn ReportSink) -> Result<(), ReportError> {
        let children = self.children()?;

        to.accept(Event::BeginReport);

        if !self.errors.is_empty() {
            emit_section(to, Section::Errors, &self.errors, |e| Event::Error(e));
        }
        if !self.unassigned.is_empty() {
            emit_section(to, Section::UnassignedRoles, &self.unassigned, |r| {
                Event::UnassignedRole(r)
            });
        }
        if !self.aliases.is_empty() {
            emit_section(to, Section::Aliases, &self.aliases, |(alias, canonical)| {
                Event::Alias { alias, canonical }
            });
        }

        match self.hierarchy {
            Hierarchy::Flat => {
                for record in self.records.values() {
                    self.emit_flat(to, record, &children);
                }
            }
            Hierarchy::Tree => {
                let mut visited = BTreeSet::new();
                let roots = self.records.values().filter(|r| r.parent.is_none());
                for record in roots {
                    self.emit_tree(to, record, &children, &mut visited);
                }
                // members of a delegation cycle have no parentless ancestor
                for record in self.records.values() {
                    self.emit_tree(to, record, &children, &mut visited);
                }
            }
        }

        to.accept(Event::EndReport);
        Ok(())
    }

    /// Child roles per parent role; every referenced parent must have a record.
    fn children(&self) -> Result<BTreeMap<&LoaderHandle, Vec<&LoaderHandle>>, ReportError> {
        let mut children: BTreeMap<&LoaderHandle, Vec<&LoaderHandle>> = BTreeMap::new();

        for record in self.records.values() {
            let Some(parent) = &record.parent else {
                continue;
            };
            if !self.records.contains_key(&parent.role) {
                return Err(ReportError::Inconsistent(format!(
                    "parent {} of {} has no record",
                    parent.role, record.role
                )));
            }
            children.entry(&parent.role).or_default().push(&record.role);
        }

        Ok(children)
    }

    fn emit_head(&self, to: &mut dyn ReportSink, record: &CollectedLoader) {
        to.accept(Event::BeginLoader(&record.role));

        if let Some(parent) = &record.parent {
            match parent.explicit {
                true => to.accept(Event::ExplicitParent(&parent.role)),
                false => to.accept(Event::ImplicitParent(&parent.role)),
            }
        }
        if let Some(name) = &record.type_name {
            to.accept(Event::TypeName(name));
        }
        if !record.attributes.is_empty() {
            emit_section(to, Section::Attributes, &record.attributes, |(name, value)| {
                Event::Attribute { name, value }
            });
        }
        emit_section(to, Section::Entries, &record.entries, |e| Event::Entry(e));
        emit_section(to, Section::Roles, &record.roles, |r| Event::Role(r));
        if let Some(packages) = &record.packages {
            emit_section(to, Section::Packages, packages, |p| Event::Package(p));
        }
    }

    fn emit_flat(
        &self,
        to: &mut dyn ReportSink,
        record: &CollectedLoader,
        children: &BTreeMap<&LoaderHandle, Vec<&LoaderHandle>>,
    ) {
        self.emit_head(to, record);
        if let Some(children) = children.get(&record.role) {
            emit_section(to, Section::Children, children, |c| Event::Child(c));
        }
        to.accept(Event::EndLoader(&record.role));
    }

    fn emit_tree<'s>(
        &'s self,
        to: &mut dyn ReportSink,
        record: &'s CollectedLoader,
        children: &BTreeMap<&'s LoaderHandle, Vec<&'s LoaderHandle>>,
        visited: &mut BTreeSet<&'s LoaderHandle>,
    ) {
        if !visited.insert(&record.role) {
            return;
        }

        self.emit_head(to, record);

        let pending: Vec<&CollectedLoader> = children
            .get(&record.role)
            .into_iter()
            .flatten()
            .filter(|c| !visited.contains(*c))
            .filter_map(|c| self.records.get(*c))
            .collect();

        if !pending.is_empty() {
            let count = pending.len();
            to.accept(Event::BeginSection(Section::Children, count));
            for child in pending {
                self.emit_tree(to, child, children, visited);
            }
            to.accept(Event::EndSection(Section::Children, count));
        }

        to.accept(Event::EndLoader(&record.role));
    }
}

impl ReportSink for ReportBuilder {
    fn accept(&mut self, event: Event<'_>) {
        match event {
            Event::BeginLoader(role) => self.current = Some(CollectedLoader::new(role)),
            Event::EndLoader(role) => match self.current.take() {
                Some(record) => {
                    self.records.insert(role.clone(), record);
                }
                None => tracing::warn!("end of {} without a beginning", role),
            },
            Event::Error(message) => self.errors.push(message.to_string()),
            Event::UnassignedRole(role) => self.unassigned.push(role.clone()),
            Event::Alias { alias, canonical } => {
                self.aliases.push((alias.clone(), canonical.clone()));
            }
            event => {
                let Some(record) = self.current.as_mut() else {
                    return;
                };
                match event {
                    Event::ExplicitParent(role) => {
                        record.parent = Some(ParentRef { role: role.clone(), explicit: true });
                    }
                    Event::ImplicitParent(role) => {
                        record.parent = Some(ParentRef { role: role.clone(), explicit: false });
                    }
                    Event::TypeName(name) => record.type_name = Some(name.to_string()),
                    Event::Attribute { name, value } => {
                        record.attributes.push((name.to_string(), value.to_string()));
                    }
                    Event::Entry(locator) => record.entries.push(locator.to_string()),
                    Event::Role(role) => record.roles.push(role.clone()),
                    Event::BeginSection(Section::Packages, _) => record.packages = Some(Vec::new()),
                    Event::Package(name) => {
                        record.packages.get_or_insert_with(Vec::new).push(name.to_string());
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records events as strings, for comparing replays.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl ReportSink for Trace {
        fn accept(&mut self, event: Event<'_>) {
            self.0.push(match event {
                Event::BeginLoader(role) => format!("begin {role}"),
                Event::EndLoader(role) => format!("end {role}"),
                Event::BeginSection(section, n) => format!("{section:?}({n})"),
                Event::Error(message) => format!("error {message}"),
                Event::Alias { alias, canonical } => format!("alias {alias}={canonical}"),
                Event::Child(role) => format!("child {role}"),
                other => format!("{other:?}"),
            });
        }
    }

    fn record(builder: &mut ReportBuilder, role: &LoaderHandle, parent: Option<&LoaderHandle>) {
        builder.accept(Event::BeginLoader(role));
        if let Some(parent) = parent {
            builder.accept(Event::ExplicitParent(parent));
        }
        builder.accept(Event::BeginSection(Section::Roles, 1));
        builder.accept(Event::Role(role));
        builder.accept(Event::EndSection(Section::Roles, 1));
        builder.accept(Event::EndLoader(role));
    }

    fn begins(trace: &Trace) -> Vec<&str> {
        trace
            .0
            .iter()
            .filter(|e| e.starts_with("begin "))
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_flat_lists_children_by_role() {
        let boot = LoaderHandle::bootstrap();
        let system = LoaderHandle::system();
        let mut builder = ReportBuilder::new(Hierarchy::Flat);
        record(&mut builder, &system, Some(&boot));
        record(&mut builder, &boot, None);

        let mut trace = Trace::default();
        builder.replay(&mut trace).unwrap();

        assert_eq!(begins(&trace), ["begin BootstrapLoader", "begin SystemLoader"]);
        assert!(trace.0.contains(&"child SystemLoader".to_string()));
    }

    #[test]
    fn test_tree_nests_records() {
        let boot = LoaderHandle::bootstrap();
        let system = LoaderHandle::system();
        let project = LoaderHandle::referenced("project");

        let mut builder = ReportBuilder::new(Hierarchy::Tree);
        record(&mut builder, &project, Some(&system));
        record(&mut builder, &system, Some(&boot));
        record(&mut builder, &boot, None);

        let mut trace = Trace::default();
        builder.replay(&mut trace).unwrap();

        let position = |needle: &str| trace.0.iter().position(|e| e == needle).unwrap();
        assert!(position("begin BootstrapLoader") < position("begin SystemLoader"));
        assert!(position("begin SystemLoader") < position("begin Referenced=project"));
        assert!(position("end Referenced=project") < position("end SystemLoader"));
        assert!(position("end SystemLoader") < position("end BootstrapLoader"));
    }

    #[test]
    fn test_tree_renders_cycles_once() {
        let a = LoaderHandle::referenced("a");
        let b = LoaderHandle::parent_of(&a);
        let c = LoaderHandle::parent_of(&b);

        let mut builder = ReportBuilder::new(Hierarchy::Tree);
        record(&mut builder, &a, Some(&b));
        record(&mut builder, &b, Some(&c));
        record(&mut builder, &c, Some(&a));

        let mut trace = Trace::default();
        builder.replay(&mut trace).unwrap();

        assert_eq!(begins(&trace).len(), 3);
        let ends = trace.0.iter().filter(|e| e.starts_with("end ")).count();
        assert_eq!(ends, 3);
    }

    #[test]
    fn test_missing_parent_record() {
        let system = LoaderHandle::system();
        let mut builder = ReportBuilder::new(Hierarchy::Flat);
        record(&mut builder, &system, Some(&LoaderHandle::bootstrap()));

        let mut trace = Trace::default();
        assert!(matches!(
            builder.replay(&mut trace),
            Err(ReportError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_report_sections_come_first() {
        let boot = LoaderHandle::bootstrap();
        let mut builder = ReportBuilder::new(Hierarchy::Flat);
        record(&mut builder, &boot, None);
        builder.accept(Event::Error("oops"));
        builder.accept(Event::Alias {
            alias: &LoaderHandle::thread_context(),
            canonical: &boot,
        });

        let mut trace = Trace::default();
        builder.replay(&mut trace).unwrap();

        assert_eq!(trace.0[0], "BeginReport");
        assert_eq!(trace.0[1], "Errors(1)");
        assert_eq!(trace.0[2], "error oops");
        assert_eq!(trace.0[5], "alias ThreadContextLoader=BootstrapLoader");
        assert_eq!(trace.0[7], "begin BootstrapLoader");
    }
}
