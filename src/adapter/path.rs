use std::collections::HashSet;
use std::sync::Arc;

use crate::adapter::{CapabilityAdapter, Operation};
use crate::context::LoaderContext;
use crate::error::AdapterError;
use crate::loader::{LoaderRef, PathLoader, downcast};
use crate::locator;

/// Adapter for [`PathLoader`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLoaderAdapter;

impl PathLoaderAdapter {
    fn target<'l>(&self, loader: &'l LoaderRef) -> Result<&'l PathLoader, AdapterError> {
        downcast::<PathLoader>(loader).ok_or(AdapterError::Incompatible {
            adapter: self.name(),
            family: loader.family().name(),
        })
    }
}

impl CapabilityAdapter for PathLoaderAdapter {
    fn name(&self) -> &'static str {
        "path"
    }

    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    fn create_loader(&self, ctx: &mut LoaderContext<'_>) -> Result<LoaderRef, AdapterError> {
        let parent = ctx.parent().cloned();
        let name = ctx.loader_name().to_string();
        let mut seen = HashSet::new();
        let mut accepted: Vec<String> = Vec::new();

        for raw in ctx.classpath() {
            let Some(locator) = ctx.locate(raw)? else {
                continue;
            };
            if !seen.insert(locator.clone()) || !ctx.should_add(parent.as_ref(), &locator) {
                continue;
            }
            ctx.diagnostics()
                .debug(format!("adding {locator} to new loader {name}"));
            accepted.push(locator);
        }

        Ok(Arc::new(PathLoader::new(name, parent, accepted)))
    }

    fn append_path(&self, ctx: &mut LoaderContext<'_>, loader: &LoaderRef) -> Result<(), AdapterError> {
        let target = self.target(loader)?;
        let name = ctx.loader_name().to_string();
        let mut seen = HashSet::new();

        for raw in ctx.classpath() {
            let Some(locator) = ctx.locate(raw)? else {
                continue;
            };
            if !seen.insert(locator.clone()) {
                continue;
            }
            if target.contains(&locator) && ctx.skip_listed(&locator) {
                continue;
            }
            if !ctx.should_add(Some(loader), &locator) {
                continue;
            }
            ctx.diagnostics()
                .debug(format!("adding {locator} to loader {name}"));
            target.add_entry(locator);
        }

        Ok(())
    }

    fn get_path(&self, loader: &LoaderRef, normalize_file_urls: bool) -> Result<Vec<String>, AdapterError> {
        let entries = self.target(loader)?.entries();
        if !normalize_file_urls {
            return Ok(entries);
        }

        let entries = entries
            .into_iter()
            .map(|entry| match locator::to_file_path(&entry) {
                Some(path) => path.into_string(),
                None => entry,
            })
            .collect();

        Ok(entries)
    }
}
