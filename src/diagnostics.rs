use std::fmt;

/// Severity of a collected message, mirroring the levels of the host log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Verbose => "verbose",
            Severity::Debug => "debug",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Messages produced while creating or extending loaders.
///
/// Every message is forwarded to `tracing` as it is recorded, and kept so the
/// caller can inspect what happened after the fact.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Info => tracing::info!("{}", message),
            Severity::Verbose => tracing::debug!("{}", message),
            Severity::Debug => tracing::trace!("{}", message),
        }
        self.messages.push(Diagnostic { severity, message });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn verbose(&mut self, message: impl Into<String>) {
        self.log(Severity::Verbose, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |m| m.severity == severity)
            .map(|m| m.message.as_str())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("one");
        diagnostics.debug("two");
        diagnostics.warn("three");

        assert_eq!(diagnostics.count(Severity::Warning), 2);
        assert_eq!(diagnostics.count(Severity::Error), 0);
        assert_eq!(
            diagnostics.with_severity(Severity::Warning).collect::<Vec<_>>(),
            ["one", "three"]
        );
    }
}
