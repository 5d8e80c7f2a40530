use crate::report::format::{Formatter, Indent};
use crate::report::sink::{Event, Section};

/// Plain, indented text.
///
/// ```text
/// loader report:
///   loader: SystemLoader
///     parent:     NULL (Default: BootstrapLoader)
///     type:       loaderkit::loader::path::PathLoader
///     entries:    1 entries
///       - file:///opt/app.jar
///   ----- end of SystemLoader
/// end of loader report
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormatter;

fn label(section: Section) -> &'static str {
    match section {
        Section::Attributes => "attributes:",
        Section::Entries => "entries:",
        Section::Roles => "roles:",
        Section::Packages => "packages:",
        Section::Children => "children:",
        Section::Errors => "errors:",
        Section::UnassignedRoles => "unassigned roles:",
        Section::Aliases => "aliases:",
    }
}

impl Formatter for TextFormatter {
    fn format(&self, event: &Event<'_>, indent: &mut Indent) -> Option<String> {
        let line = match *event {
            Event::BeginReport => {
                let line = format!("{indent}loader report:");
                indent.push("  ");
                line
            }
            Event::EndReport => {
                indent.pop();
                format!("{indent}end of loader report")
            }
            Event::BeginLoader(role) => {
                let line = format!("{indent}loader: {role}");
                indent.push("  ");
                line
            }
            Event::EndLoader(role) => {
                indent.pop();
                format!("{indent}----- end of {role}")
            }
            Event::ExplicitParent(role) => format!("{indent}parent:     {role}"),
            Event::ImplicitParent(role) => format!("{indent}parent:     NULL (Default: {role})"),
            Event::TypeName(name) => format!("{indent}type:       {name}"),
            Event::BeginSection(section, count) => {
                let line = format!("{indent}{:<11} {count} entries", label(section));
                indent.push(match section {
                    Section::Children => "  ",
                    _ => "  - ",
                });
                line
            }
            Event::EndSection(..) => {
                indent.pop();
                return None;
            }
            Event::Attribute { name, value } => format!("{indent}{name} = {value}"),
            Event::Entry(locator) => format!("{indent}{locator}"),
            Event::Role(role) | Event::Child(role) | Event::UnassignedRole(role) => {
                format!("{indent}{role}")
            }
            Event::Package(name) => format!("{indent}{name}"),
            Event::Error(message) => format!("{indent}{message}"),
            Event::Alias { alias, canonical } => format!("{indent}{alias} (same as {canonical})"),
        };

        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handle::LoaderHandle;
    use crate::report::format::FormattedReporter;
    use crate::report::sink::ReportSink;

    #[test]
    fn test_loader_record() {
        let system = LoaderHandle::system();
        let bootstrap = LoaderHandle::bootstrap();

        let mut reporter = FormattedReporter::new(Box::new(TextFormatter));
        reporter.accept(Event::BeginReport);
        reporter.accept(Event::BeginLoader(&system));
        reporter.accept(Event::ImplicitParent(&bootstrap));
        reporter.accept(Event::BeginSection(Section::Entries, 1));
        reporter.accept(Event::Entry("file:///opt/app.jar"));
        reporter.accept(Event::EndSection(Section::Entries, 1));
        reporter.accept(Event::EndLoader(&system));
        reporter.accept(Event::EndReport);

        assert_eq!(
            reporter.into_string(),
            "\
loader report:
  loader: SystemLoader
    parent:     NULL (Default: BootstrapLoader)
    entries:    1 entries
      - file:///opt/app.jar
  ----- end of SystemLoader
end of loader report
"
        );
    }

    #[test]
    fn test_alias_and_unassigned() {
        let alias = LoaderHandle::thread_context();
        let canonical = LoaderHandle::system();
        let mut indent = Indent::default();

        assert_eq!(
            TextFormatter.format(&Event::Alias { alias: &alias, canonical: &canonical }, &mut indent),
            Some("ThreadContextLoader (same as SystemLoader)".to_string())
        );
        assert_eq!(
            TextFormatter.format(&Event::BeginSection(Section::UnassignedRoles, 2), &mut indent),
            Some("unassigned roles: 2 entries".to_string())
        );
    }
}
