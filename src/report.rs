//! Reports on the loader graph: who delegates to whom, with which entries,
//! under which roles.
//!
//! A pass is split in three: the [`ReportAccumulator`] discovers the graph
//! and streams [`Event`]s, a [`ReportBuilder`] orders them as a flat or tree
//! hierarchy, and a [`Formatter`] turns them into text.

pub mod accumulator;
pub use accumulator::{PassState, ReportAccumulator, RootSet};

pub mod builder;
pub use builder::{Hierarchy, ReportBuilder};

pub mod format;
pub use format::{FormattedReporter, Formatter, Indent};

pub mod markup;
pub use markup::MarkupFormatter;

pub mod sink;
pub use sink::{Event, ReportSink, Section};

pub mod text;
pub use text::TextFormatter;

use std::fmt;
use std::fs;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::core::Environment;
use crate::error::ReportError;
use crate::registry::HandlerRegistry;

/// Output flavour of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Indented plain text.
    Txt,
    /// Nested tags.
    Xml,
}

impl Format {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            Format::Txt => Box::new(TextFormatter),
            Format::Xml => Box::new(MarkupFormatter),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(Format::Txt),
            "xml" => Ok(Format::Xml),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Txt => "txt",
            Format::Xml => "xml",
        })
    }
}

/// How and where to report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Defaults to `txt`, or `xml` when writing to a destination.
    pub format: Option<Format>,
    /// Defaults to `flat` for `txt` and `tree` for `xml`.
    pub hierarchy: Option<Hierarchy>,
    pub report_packages: bool,
    /// File to write the report to, the log otherwise.
    pub destination: Option<Utf8PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: None,
            hierarchy: None,
            report_packages: true,
            destination: None,
        }
    }
}

impl ReportOptions {
    pub fn format(&self) -> Format {
        match (self.format, &self.destination) {
            (Some(format), _) => format,
            (None, Some(_)) => Format::Xml,
            (None, None) => Format::Txt,
        }
    }

    pub fn hierarchy(&self) -> Hierarchy {
        match (self.hierarchy, self.format()) {
            (Some(hierarchy), _) => hierarchy,
            (None, Format::Txt) => Hierarchy::Flat,
            (None, Format::Xml) => Hierarchy::Tree,
        }
    }
}

/// Runs one complete report pass over the loaders known to `env`.
pub fn render(
    env: &Environment,
    registry: &HandlerRegistry,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    let mut builder = ReportBuilder::new(options.hierarchy());

    ReportAccumulator::new(registry, env)
        .with_packages(options.report_packages)
        .run(&RootSet::from_environment(env), &mut builder)?;

    let mut reporter = FormattedReporter::new(options.format().formatter());
    builder.replay(&mut reporter)?;

    Ok(reporter.into_string())
}

/// Renders a report and delivers it to its destination.
#[derive(Debug)]
pub struct ReportTask<'a> {
    env: &'a Environment,
    registry: &'a HandlerRegistry,
    options: ReportOptions,
}

impl<'a> ReportTask<'a> {
    pub fn new(env: &'a Environment, registry: &'a HandlerRegistry, options: ReportOptions) -> Self {
        Self { env, registry, options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Writes the report to the destination file, or line by line to the
    /// log, and returns it.
    pub fn run(&self) -> Result<String, ReportError> {
        let report = render(self.env, self.registry, &self.options)?;

        match &self.options.destination {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, &report)?;
                tracing::info!("Wrote loader report to {}", path);
            }
            None => {
                for line in report.lines() {
                    tracing::info!("{}", line);
                }
            }
        }

        Ok(report)
    }
}
