use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::adapter::Operation;
use crate::context::LoaderContext;
use crate::core::{Environment, Reference};
use crate::diagnostics::Diagnostics;
use crate::error::{SlotError, TaskError};
use crate::family::BUILD_LOADER;
use crate::loader::LoaderRef;
use crate::policy::{DuplicateEntryPolicy, EntryFilter};
use crate::registry::HandlerRegistry;
use crate::walker::DelegationWalker;

/// Environment property that, set to `only`, freezes the system-like loaders.
pub const SYSPATH_PROPERTY: &str = "build.syspath";

/// Where a loader lives in the environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum LoaderSlot {
    Core,
    System,
    Current,
    Thread,
    Host,
    /// Explicitly no loader.
    Unset,
    /// A named reference.
    Named(String),
}

impl LoaderSlot {
    pub fn resolve(&self, env: &Environment) -> Result<Option<LoaderRef>, SlotError> {
        let loader = match self {
            LoaderSlot::Core => env.core(),
            LoaderSlot::System => env.system(),
            LoaderSlot::Current => env.current(),
            LoaderSlot::Thread => env.thread_context(),
            LoaderSlot::Host => env.host(),
            LoaderSlot::Unset => None,
            LoaderSlot::Named(name) => match env.reference(name) {
                Some(Reference::Loader(loader)) => Some(loader),
                Some(Reference::Value(_)) => return Err(SlotError::NotALoader(name.clone())),
                None => None,
            },
        };
        Ok(loader.cloned())
    }

    /// Only these slots can be pointed at a new loader.
    pub fn is_reset_possible(&self) -> bool {
        matches!(self, LoaderSlot::Thread | LoaderSlot::Core | LoaderSlot::Named(_))
    }

    pub fn is_system_like(&self) -> bool {
        matches!(self, LoaderSlot::Core | LoaderSlot::Host | LoaderSlot::System)
    }

    pub fn assign(&self, env: &mut Environment, loader: LoaderRef) -> Result<(), SlotError> {
        match self {
            LoaderSlot::Thread => env.set_thread_context(Some(loader)),
            LoaderSlot::Core => env.set_core(Some(loader)),
            LoaderSlot::Named(name) => env.add_reference(name.clone(), Reference::Loader(loader)),
            other => return Err(SlotError::NotAssignable(other.to_string())),
        }
        Ok(())
    }
}

impl From<String> for LoaderSlot {
    fn from(value: String) -> Self {
        match value.as_str() {
            "core" => LoaderSlot::Core,
            "system" => LoaderSlot::System,
            "current" => LoaderSlot::Current,
            "thread" => LoaderSlot::Thread,
            "host" => LoaderSlot::Host,
            "none" => LoaderSlot::Unset,
            _ => LoaderSlot::Named(value),
        }
    }
}

impl FromStr for LoaderSlot {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LoaderSlot::from(s.to_string()))
    }
}

impl fmt::Display for LoaderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoaderSlot::Core => "core",
            LoaderSlot::System => "system",
            LoaderSlot::Current => "current",
            LoaderSlot::Thread => "thread",
            LoaderSlot::Host => "host",
            LoaderSlot::Unset => "none",
            LoaderSlot::Named(name) => name,
        })
    }
}

/// Family specific options for newly created loaders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderParameters {
    pub isolated: bool,
    pub parent_first: bool,
    pub loader_package_roots: Vec<String>,
    pub system_package_roots: Vec<String>,
}

impl Default for LoaderParameters {
    fn default() -> Self {
        Self {
            isolated: false,
            parent_first: true,
            loader_package_roots: Vec::new(),
            system_package_roots: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Create a loader in a slot, or extend the one already there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoaderRequest {
    pub loader: LoaderSlot,
    /// `None` leaves an existing loader untouched.
    #[serde(default)]
    pub classpath: Option<Vec<String>>,
    #[serde(default)]
    pub parent: Option<LoaderSlot>,
    /// The loader the new loader is defined by.
    #[serde(default, rename = "super")]
    pub super_loader: Option<LoaderSlot>,
    #[serde(default)]
    pub duplicate_entry: DuplicateEntryPolicy,
    #[serde(default)]
    pub parameters: LoaderParameters,
    /// Family of the loader to create, `build-loader` when unset.
    #[serde(default)]
    pub handler: Option<String>,
    /// Receives the loader's path, `;`-separated, once the request is done.
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub reset: bool,
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

impl LoaderRequest {
    pub fn new(loader: LoaderSlot) -> Self {
        Self {
            loader,
            classpath: None,
            parent: None,
            super_loader: None,
            duplicate_entry: DuplicateEntryPolicy::default(),
            parameters: LoaderParameters::default(),
            handler: None,
            property: None,
            reset: false,
            fail_on_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Extended,
    Unchanged,
    Skipped,
    /// A handled error stopped the request.
    Aborted(String),
}

/// Runs [`LoaderRequest`]s against an environment.
pub struct LoaderTask<'a> {
    env: &'a mut Environment,
    registry: &'a HandlerRegistry,
    diagnostics: Diagnostics,
}

impl<'a> LoaderTask<'a> {
    pub fn new(env: &'a mut Environment, registry: &'a HandlerRegistry) -> Self {
        Self {
            env,
            registry,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn execute(&mut self, request: &LoaderRequest) -> Result<Outcome, TaskError> {
        tracing::debug!("executing loader request for '{}'", request.loader);

        let outcome = self.create_or_modify(request)?;
        if matches!(outcome, Outcome::Skipped | Outcome::Aborted(_)) {
            return Ok(outcome);
        }

        if let Some(property) = &request.property {
            if let Some(aborted) = self.export_property(request, property)? {
                return Ok(aborted);
            }
        }

        Ok(outcome)
    }

    fn create_or_modify(&mut self, request: &LoaderRequest) -> Result<Outcome, TaskError> {
        let slot = &request.loader;
        if *slot == LoaderSlot::Unset {
            return self.fail(request, "no loader slot given".to_string());
        }
        if request.reset && !slot.is_reset_possible() {
            return self.fail(request, format!("loader '{slot}' cannot be reset"));
        }

        let existing = match request.reset {
            true => None,
            false => match slot.resolve(self.env) {
                Ok(existing) => existing,
                Err(e) => return self.abort(request, e.into()),
            },
        };

        if existing.is_some() && request.classpath.is_none() {
            self.diagnostics
                .verbose(format!("nothing to do for loader '{slot}'"));
            return Ok(Outcome::Unchanged);
        }

        if slot.is_system_like() && self.env.property(SYSPATH_PROPERTY) == Some("only") {
            self.diagnostics.warn(format!(
                "loader '{slot}' is left alone because {SYSPATH_PROPERTY} is 'only'"
            ));
            return Ok(Outcome::Skipped);
        }

        match existing {
            Some(loader) => self.modify(request, &loader),
            None if !slot.is_reset_possible() => {
                self.fail(request, format!("loader '{slot}' does not exist and cannot be created"))
            }
            None => self.create(request),
        }
    }

    fn create(&mut self, request: &LoaderRequest) -> Result<Outcome, TaskError> {
        let family = request.handler.as_deref().unwrap_or(BUILD_LOADER.name());
        let adapter = match self.registry.declared(family).map(|r| r.adapter()) {
            Some(Ok(adapter)) if adapter.supports(Operation::Create) => adapter,
            Some(Ok(adapter)) => {
                let message = format!("adapter '{}' cannot create loaders", adapter.name());
                return self.fail(request, message);
            }
            Some(Err(e)) => return self.fail(request, e.to_string()),
            None => return self.fail(request, format!("no handler registered for family '{family}'")),
        };

        let parent = match self.resolve_optional(request.parent.as_ref()) {
            Ok(parent) => parent,
            Err(e) => return self.abort(request, e.into()),
        };
        let super_loader = match self.resolve_optional(request.super_loader.as_ref()) {
            Ok(super_loader) => super_loader,
            Err(e) => return self.abort(request, e.into()),
        };

        let created = {
            let walker = DelegationWalker::new(self.registry, self.env);
            let filter = EntryFilter::new(request.duplicate_entry, walker);
            let mut ctx = LoaderContext::new(request, filter, self.env.base_dir(), &mut self.diagnostics)
                .with_parent(parent)
                .with_super_loader(super_loader);
            adapter.create_loader(&mut ctx)
        };
        let loader = match created {
            Ok(loader) => loader,
            Err(e) => return self.abort(request, e.into()),
        };

        self.diagnostics
            .verbose(format!("created loader '{}' ({})", request.loader, loader.type_name()));
        request.loader.assign(self.env, loader)?;

        Ok(Outcome::Created)
    }

    fn modify(&mut self, request: &LoaderRequest, loader: &LoaderRef) -> Result<Outcome, TaskError> {
        let adapter = match self.registry.resolve(loader, Some(Operation::Append)) {
            Ok(adapter) => adapter,
            Err(e) => {
                let message = format!("cannot extend loader '{}': {e}", request.loader);
                return self.fail(request, message);
            }
        };

        let appended = {
            let walker = DelegationWalker::new(self.registry, self.env);
            let filter = EntryFilter::new(request.duplicate_entry, walker);
            let mut ctx = LoaderContext::new(request, filter, self.env.base_dir(), &mut self.diagnostics);
            adapter.append_path(&mut ctx, loader)
        };

        match appended {
            Ok(()) => Ok(Outcome::Extended),
            Err(e) => self.abort(request, e.into()),
        }
    }

    fn export_property(
        &mut self,
        request: &LoaderRequest,
        property: &str,
    ) -> Result<Option<Outcome>, TaskError> {
        let loader = match request.loader.resolve(self.env) {
            Ok(Some(loader)) => loader,
            Ok(None) => {
                let message = format!("no loader '{}' to read the path from", request.loader);
                return self.fail(request, message).map(Some);
            }
            Err(e) => return self.abort(request, e.into()).map(Some),
        };

        let adapter = match self.registry.resolve(&loader, Some(Operation::GetPath)) {
            Ok(adapter) => adapter,
            Err(e) => {
                let message = format!("cannot read the path of loader '{}': {e}", request.loader);
                return self.fail(request, message).map(Some);
            }
        };

        let path = match adapter.get_path(&loader, true) {
            Ok(entries) => entries.join(";"),
            Err(e) => return self.abort(request, e.into()).map(Some),
        };
        self.diagnostics
            .verbose(format!("setting {property} to {path}"));
        self.env.set_property(property, path);

        Ok(None)
    }

    fn resolve_optional(&self, slot: Option<&LoaderSlot>) -> Result<Option<LoaderRef>, SlotError> {
        match slot {
            Some(slot) => slot.resolve(self.env),
            None => Ok(None),
        }
    }

    fn fail(&mut self, request: &LoaderRequest, message: String) -> Result<Outcome, TaskError> {
        self.abort(request, TaskError::Failed(message))
    }

    /// Handled errors abort the request, loudly or quietly.
    fn abort(&mut self, request: &LoaderRequest, error: TaskError) -> Result<Outcome, TaskError> {
        if request.fail_on_error {
            return Err(error);
        }
        let message = error.to_string();
        self.diagnostics.error(message.clone());
        Ok(Outcome::Aborted(message))
    }
}
