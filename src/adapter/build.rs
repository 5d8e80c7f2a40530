use std::collections::HashSet;
use std::sync::Arc;

use camino::Utf8Path;

use crate::adapter::{CapabilityAdapter, Operation};
use crate::context::LoaderContext;
use crate::error::AdapterError;
use crate::handle::LoaderHandle;
use crate::loader::{BuildLoader, BuildLoaderOptions, LoaderRef, downcast};
use crate::locator;
use crate::report::ReportSink;

/// Adapter for [`BuildLoader`]s.
///
/// A build loader without a configured parent delegates to the system loader,
/// so that is what this adapter reports as the default parent.
#[derive(Debug, Default, Clone)]
pub struct BuildLoaderAdapter {
    system: Option<LoaderRef>,
}

impl BuildLoaderAdapter {
    pub fn new(system: Option<LoaderRef>) -> Self {
        Self { system }
    }

    fn target<'l>(&self, loader: &'l LoaderRef) -> Result<&'l BuildLoader, AdapterError> {
        downcast::<BuildLoader>(loader).ok_or(AdapterError::Incompatible {
            adapter: self.name(),
            family: loader.family().name(),
        })
    }

    /// `check` is where the duplicate search starts.
    fn add_entries(
        &self,
        ctx: &mut LoaderContext<'_>,
        target: &BuildLoader,
        check: Option<&LoaderRef>,
    ) -> Result<(), AdapterError> {
        let name = ctx.loader_name().to_string();
        let mut seen = HashSet::new();

        for raw in ctx.classpath() {
            let Some(locator) = ctx.locate(raw)? else {
                continue;
            };
            if !seen.insert(locator.clone()) {
                continue;
            }
            let Some(path) = locator::to_file_path(&locator) else {
                ctx.handle_error(format!("{locator} is not a file, build loaders only take files"))?;
                continue;
            };
            if !path.exists() {
                ctx.diagnostics()
                    .warn(format!("ignoring nonexistent path {path}"));
                continue;
            }
            if target.entries().contains(&path) && ctx.skip_listed(&locator) {
                continue;
            }
            if !ctx.should_add(check, &locator) {
                continue;
            }
            ctx.diagnostics()
                .debug(format!("adding {path} to loader {name}"));
            target.add_path_element(path);
        }

        Ok(())
    }
}

impl CapabilityAdapter for BuildLoaderAdapter {
    fn name(&self) -> &'static str {
        "build"
    }

    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    fn create_loader(&self, ctx: &mut LoaderContext<'_>) -> Result<LoaderRef, AdapterError> {
        let params = ctx.parameters();
        let loader = BuildLoader::new(ctx.loader_name(), ctx.super_loader().cloned());
        loader.set_parent(ctx.parent().cloned());
        loader.set_options(BuildLoaderOptions {
            isolated: params.isolated,
            parent_first: params.parent_first,
            loader_package_roots: params.loader_package_roots.clone(),
            system_package_roots: params.system_package_roots.clone(),
        });

        let check = ctx.parent().cloned().or_else(|| self.system.clone());
        self.add_entries(ctx, &loader, check.as_ref())?;

        Ok(Arc::new(loader))
    }

    fn append_path(&self, ctx: &mut LoaderContext<'_>, loader: &LoaderRef) -> Result<(), AdapterError> {
        let target = self.target(loader)?;
        self.add_entries(ctx, target, Some(loader))
    }

    fn get_path(&self, loader: &LoaderRef, normalize_file_urls: bool) -> Result<Vec<String>, AdapterError> {
        let entries = self.target(loader)?.entries();
        if normalize_file_urls {
            return Ok(entries.into_iter().map(|p| p.into_string()).collect());
        }

        let root = Utf8Path::new("/");
        entries
            .iter()
            .map(|path| locator::normalize(root, path.as_str()).map_err(AdapterError::from))
            .collect()
    }

    fn get_parent(&self, loader: &LoaderRef) -> Option<LoaderRef> {
        match downcast::<BuildLoader>(loader) {
            Some(build) => build.parent(),
            None => loader.native_parent(),
        }
    }

    fn default_parent(&self) -> Option<LoaderRef> {
        self.system.clone()
    }

    fn report(&self, sink: &mut dyn ReportSink, loader: &LoaderRef, _role: &LoaderHandle) {
        let Some(build) = downcast::<BuildLoader>(loader) else {
            return;
        };
        let options = build.options();
        sink.report_attribute("isolated", &options.isolated.to_string());
        sink.report_attribute("parentFirst", &options.parent_first.to_string());
        sink.report_attribute("loaderPackageRoots", &options.loader_package_roots.join(","));
        sink.report_attribute("systemPackageRoots", &options.system_package_roots.join(","));
    }

    fn reportables(&self, loader: &LoaderRef, role: &LoaderHandle) -> Vec<(LoaderHandle, LoaderRef)> {
        downcast::<BuildLoader>(loader)
            .and_then(BuildLoader::defined_by)
            .map(|definer| (LoaderHandle::other(&format!("super of {role}")), definer))
            .into_iter()
            .collect()
    }
}
