use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::adapter::Operation;
use crate::core::{Environment, Reference};
use crate::error::{ReportError, ResolutionError};
use crate::handle::{Category, LoaderHandle};
use crate::loader::{LoaderRef, identity};
use crate::registry::HandlerRegistry;
use crate::report::sink::{AttributeCollector, Event, ReportSink, Section, emit_section};
use crate::walker::{DelegationWalker, ParentLink};

const MISSING_HANDLERS: &str = "WARNING: because of missing handlers this report might not be complete";

/// The named entry points of a report pass, in the order they are visited.
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    roots: Vec<(LoaderHandle, Option<LoaderRef>)>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The well-known loaders of the host, then every reference holding a
    /// loader and every definition with a loader, each ordered by name.
    pub fn from_environment(env: &Environment) -> Self {
        let mut roots = Self::new();

        roots.push(LoaderHandle::bootstrap(), None);
        if let Some(extension) = env.extension() {
            roots.push(LoaderHandle::extension(), Some(extension.clone()));
        }
        roots.push(LoaderHandle::system(), env.system().cloned());
        roots.push(LoaderHandle::core_host(), env.host().cloned());
        roots.push(LoaderHandle::thread_context(), env.thread_context().cloned());
        roots.push(LoaderHandle::core(), env.core().cloned());
        roots.push(LoaderHandle::current_component(), env.current().cloned());

        for (name, reference) in env.references() {
            if let Reference::Loader(loader) = reference {
                roots.push(LoaderHandle::referenced(name), Some(loader.clone()));
            }
        }
        for (name, loader) in env.definitions() {
            if let Some(loader) = loader {
                roots.push(LoaderHandle::defined(name), Some(loader.clone()));
            }
        }

        roots
    }

    pub fn push(&mut self, handle: LoaderHandle, loader: Option<LoaderRef>) {
        self.roots.push((handle, loader));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LoaderHandle, Option<&LoaderRef>)> {
        self.roots.iter().map(|(handle, loader)| (handle, loader.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    NotStarted,
    Walking,
    Finalizing,
    Done,
}

impl PassState {
    fn name(self) -> &'static str {
        match self {
            PassState::NotStarted => "not started",
            PassState::Walking => "walking",
            PassState::Finalizing => "finalizing",
            PassState::Done => "done",
        }
    }
}

/// What a handle was assigned to.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// The bootstrap loader, which has no instance.
    Sentinel,
    /// A root without a live loader.
    Unassigned,
    Loader(NodeIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delegation {
    Explicit,
    Implicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentState {
    /// Not looked at yet, or resolved to another loader (see the edges).
    Loader,
    Bootstrap,
    /// The loader's adapter could not be resolved.
    Unknown,
}

#[derive(Debug)]
struct LoaderNode {
    loader: LoaderRef,
    /// Insertion ordered, the first one is canonical.
    roles: Vec<LoaderHandle>,
    parent: ParentState,
}

/// Discovers the loaders reachable from a [`RootSet`], one record per loader
/// identity, and streams them into a [`ReportSink`].
///
/// The walk follows parent links and whatever adapters declare reportable.
/// A loader is expanded only the first time it is seen, so delegation
/// cycles terminate; later sightings merely add a role.
#[derive(Debug)]
pub struct ReportAccumulator<'a> {
    walker: DelegationWalker<'a>,
    env: &'a Environment,
    report_packages: bool,
    state: PassState,
    graph: Graph<LoaderNode, Delegation>,
    by_identity: HashMap<usize, NodeIndex>,
    by_handle: BTreeMap<LoaderHandle, Slot>,
    errors: Vec<String>,
    missing_handlers: bool,
}

impl<'a> ReportAccumulator<'a> {
    pub fn new(registry: &'a HandlerRegistry, env: &'a Environment) -> Self {
        Self {
            walker: DelegationWalker::new(registry, env),
            env,
            report_packages: true,
            state: PassState::NotStarted,
            graph: Graph::new(),
            by_identity: HashMap::new(),
            by_handle: BTreeMap::new(),
            errors: Vec::new(),
            missing_handlers: false,
        }
    }

    pub fn with_packages(mut self, report_packages: bool) -> Self {
        self.report_packages = report_packages;
        self
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Number of distinct loaders seen so far.
    pub fn loader_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The canonical role of the loader `handle` was assigned to.
    pub fn canonical(&self, handle: &LoaderHandle) -> Option<&LoaderHandle> {
        match self.by_handle.get(handle)? {
            Slot::Loader(index) => self.graph[*index].roles.first(),
            Slot::Sentinel | Slot::Unassigned => None,
        }
    }

    /// Walks all roots, then finalizes into `sink`.
    pub fn run(mut self, roots: &RootSet, sink: &mut dyn ReportSink) -> Result<(), ReportError> {
        for (handle, loader) in roots.iter() {
            self.add_loader_to_report(loader, handle.clone())?;
        }
        self.finish(sink)
    }

    /// Assigns `handle` to `loader`, expanding the loader if it has not been
    /// seen before. `None` marks the bootstrap sentinel when `handle` is the
    /// bootstrap role, and an unassigned role otherwise.
    pub fn add_loader_to_report(
        &mut self,
        loader: Option<&LoaderRef>,
        handle: LoaderHandle,
    ) -> Result<(), ReportError> {
        match self.state {
            PassState::NotStarted | PassState::Walking => self.state = PassState::Walking,
            other => {
                return Err(ReportError::PassState {
                    expected: PassState::Walking.name(),
                    actual: other.name(),
                });
            }
        }

        if self.by_handle.contains_key(&handle) {
            return Err(ReportError::DuplicateRole(handle));
        }

        let Some(loader) = loader else {
            let slot = match handle.category() {
                Category::Bootstrap => Slot::Sentinel,
                _ => Slot::Unassigned,
            };
            self.by_handle.insert(handle, slot);
            return Ok(());
        };

        let known = self.by_identity.get(&identity(loader)).copied();
        let index = known.unwrap_or_else(|| {
            let index = self.graph.add_node(LoaderNode {
                loader: loader.clone(),
                roles: Vec::new(),
                parent: ParentState::Loader,
            });
            self.by_identity.insert(identity(loader), index);
            index
        });

        self.by_handle.insert(handle.clone(), Slot::Loader(index));
        self.graph[index].roles.push(handle.clone());

        if known.is_none() {
            tracing::debug!("reporting {} as {}", loader.type_name(), handle);
            self.expand(index, loader, &handle)?;
        }

        Ok(())
    }

    fn expand(
        &mut self,
        index: NodeIndex,
        loader: &LoaderRef,
        handle: &LoaderHandle,
    ) -> Result<(), ReportError> {
        match self.walker.parent_of(loader) {
            Ok(ParentLink::Bootstrap) => self.graph[index].parent = ParentState::Bootstrap,
            Ok(link) => {
                let delegation = match link.is_explicit() {
                    true => Delegation::Explicit,
                    false => Delegation::Implicit,
                };
                if let Some(parent) = link.loader() {
                    self.add_loader_to_report(Some(parent), LoaderHandle::parent_of(handle))?;
                    let parent_index = self.by_identity.get(&identity(parent)).copied();
                    let parent_index = parent_index.ok_or_else(|| {
                        ReportError::Inconsistent(format!("parent of {handle} was not recorded"))
                    })?;
                    self.graph.add_edge(index, parent_index, delegation);
                }
            }
            Err(e) => {
                self.graph[index].parent = ParentState::Unknown;
                self.gap(&e)?;
                self.errors.push(format!("parent of {handle} not investigable ({e})"));
            }
        }

        match self.walker.registry().resolve(loader, Some(Operation::Report)) {
            Ok(adapter) => {
                for (role, extra) in adapter.reportables(loader, handle) {
                    self.add_loader_to_report(Some(&extra), role)?;
                }
            }
            Err(e) => self.gap(&e)?,
        }

        Ok(())
    }

    /// Records a resolution failure. Only a missing registry is fatal.
    fn gap(&mut self, error: &ResolutionError) -> Result<(), ReportError> {
        match error {
            ResolutionError::NoRegistry => Err(ReportError::Resolution(error.clone())),
            _ => {
                tracing::debug!("resolution gap: {}", error);
                self.missing_handlers = true;
                Ok(())
            }
        }
    }

    /// Emits every record, unassigned role and alias into `sink`, ordered
    /// by handle.
    pub fn finish(&mut self, sink: &mut dyn ReportSink) -> Result<(), ReportError> {
        match self.state {
            PassState::NotStarted | PassState::Walking => self.state = PassState::Finalizing,
            other => {
                return Err(ReportError::PassState {
                    expected: PassState::Walking.name(),
                    actual: other.name(),
                });
            }
        }

        // every implicit parent link ends here
        self.by_handle
            .entry(LoaderHandle::bootstrap())
            .or_insert(Slot::Sentinel);

        let slots: Vec<(LoaderHandle, Slot)> = self
            .by_handle
            .iter()
            .map(|(handle, slot)| (handle.clone(), *slot))
            .collect();

        for (handle, slot) in &slots {
            match *slot {
                Slot::Sentinel => self.emit_bootstrap(sink, handle),
                Slot::Unassigned if handle.is_popular() => {
                    sink.accept(Event::BeginSection(Section::UnassignedRoles, 1));
                    sink.accept(Event::UnassignedRole(handle));
                    sink.accept(Event::EndSection(Section::UnassignedRoles, 1));
                }
                Slot::Unassigned => {}
                Slot::Loader(index) => {
                    let canonical = self.graph[index].roles.first().cloned();
                    match canonical {
                        Some(canonical) if &canonical != handle => {
                            sink.accept(Event::BeginSection(Section::Aliases, 1));
                            sink.accept(Event::Alias { alias: handle, canonical: &canonical });
                            sink.accept(Event::EndSection(Section::Aliases, 1));
                        }
                        _ => self.emit_record(sink, index, handle)?,
                    }
                }
            }
        }

        if self.missing_handlers {
            self.errors.push(MISSING_HANDLERS.to_string());
        }
        for error in &self.errors {
            sink.report_error(error);
        }

        self.state = PassState::Done;
        Ok(())
    }

    fn emit_bootstrap(&mut self, sink: &mut dyn ReportSink, handle: &LoaderHandle) {
        sink.accept(Event::BeginLoader(handle));
        match self.env.bootstrap_path() {
            Ok(entries) => emit_section(sink, Section::Entries, entries, |e| Event::Entry(e)),
            Err(e) => self.errors.push(format!("entries of {handle} not investigable ({e})")),
        }
        emit_section(sink, Section::Roles, std::slice::from_ref(handle), |r| Event::Role(r));
        sink.accept(Event::EndLoader(handle));
    }

    fn emit_record(
        &mut self,
        sink: &mut dyn ReportSink,
        index: NodeIndex,
        handle: &LoaderHandle,
    ) -> Result<(), ReportError> {
        let node = &self.graph[index];
        let loader = node.loader.clone();
        let roles = node.roles.clone();
        let parent = match node.parent {
            ParentState::Bootstrap => Some((LoaderHandle::bootstrap(), Delegation::Implicit)),
            ParentState::Unknown => None,
            ParentState::Loader => self
                .graph
                .edges_directed(index, Direction::Outgoing)
                .next()
                .and_then(|edge| {
                    let canonical = self.graph[edge.target()].roles.first()?;
                    Some((canonical.clone(), *edge.weight()))
                }),
        };
        let registry = self.walker.registry();

        sink.accept(Event::BeginLoader(handle));

        match &parent {
            Some((role, Delegation::Explicit)) => sink.accept(Event::ExplicitParent(role)),
            Some((role, Delegation::Implicit)) => sink.accept(Event::ImplicitParent(role)),
            None => {}
        }

        sink.accept(Event::TypeName(loader.type_name()));

        match registry.resolve(&loader, Some(Operation::Report)) {
            Ok(adapter) => {
                let mut collector = AttributeCollector::default();
                adapter.report(&mut collector, &loader, handle);
                if !collector.attributes.is_empty() {
                    emit_section(sink, Section::Attributes, &collector.attributes, |(n, v)| {
                        Event::Attribute { name: n, value: v }
                    });
                }
            }
            Err(e) => self.gap(&e)?,
        }

        // a family without a path capability is opaque, not a missing handler
        match registry.resolve(&loader, Some(Operation::GetPath)) {
            Ok(adapter) => match adapter.get_path(&loader, false) {
                Ok(entries) => emit_section(sink, Section::Entries, &entries, |e| Event::Entry(e)),
                Err(e) => self.errors.push(format!("entries of {handle} not investigable ({e})")),
            },
            Err(ResolutionError::NoRegistry) => {
                return Err(ReportError::Resolution(ResolutionError::NoRegistry));
            }
            Err(e) => self.errors.push(format!("entries of {handle} not investigable ({e})")),
        }

        emit_section(sink, Section::Roles, &roles, |r| Event::Role(r));

        if self.report_packages {
            let packages = match registry.resolve(&loader, None) {
                Ok(adapter) => adapter.list_packages(&loader).map_err(|e| e.to_string()),
                Err(e) => {
                    self.gap(&e)?;
                    Err(e.to_string())
                }
            };
            match packages {
                Ok(packages) => {
                    emit_section(sink, Section::Packages, &packages, |p| Event::Package(p));
                }
                Err(reason) => {
                    self.errors.push(format!("packages of {handle} not investigable ({reason})"));
                }
            }
        }

        sink.accept(Event::EndLoader(handle));
        Ok(())
    }
}
