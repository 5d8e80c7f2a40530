use std::borrow::Cow;

use crate::handle::LoaderHandle;
use crate::report::format::{Formatter, Indent};
use crate::report::sink::{Event, Section};

/// Nested XML-like tags, attribute values escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupFormatter;

fn tag(section: Section) -> &'static str {
    match section {
        Section::Attributes => "attributes",
        Section::Entries => "entries",
        Section::Roles => "roles",
        Section::Packages => "packages",
        Section::Children => "children",
        Section::Errors => "errors",
        Section::UnassignedRoles => "unassigned-roles",
        Section::Aliases => "aliases",
    }
}

pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// `type="..."` plus `name="..."` when the handle has a label.
fn role_attributes(prefix: &str, role: &LoaderHandle) -> String {
    match role.label() {
        Some(label) => format!(
            r#"{prefix}type="{}" {prefix}name="{}""#,
            role.type_name(),
            escape(label)
        ),
        None => format!(r#"{prefix}type="{}""#, role.type_name()),
    }
}

impl Formatter for MarkupFormatter {
    fn format(&self, event: &Event<'_>, indent: &mut Indent) -> Option<String> {
        let line = match *event {
            Event::BeginReport => {
                let line = format!("{indent}<loaderreport>");
                indent.push("  ");
                line
            }
            Event::EndReport => {
                indent.pop();
                format!("{indent}</loaderreport>")
            }
            Event::BeginLoader(role) => {
                let line = format!("{indent}<loader {}>", role_attributes("", role));
                indent.push("  ");
                line
            }
            Event::EndLoader(_) => {
                indent.pop();
                format!("{indent}</loader>")
            }
            Event::ExplicitParent(role) => {
                format!(r#"{indent}<parent definition="explicit" {}/>"#, role_attributes("", role))
            }
            Event::ImplicitParent(role) => {
                format!(r#"{indent}<parent definition="default" {}/>"#, role_attributes("", role))
            }
            Event::TypeName(name) => format!(r#"{indent}<type name="{}"/>"#, escape(name)),
            Event::BeginSection(section, count) => {
                let line = format!(r#"{indent}<{} count="{count}">"#, tag(section));
                indent.push("  ");
                line
            }
            Event::EndSection(section, _) => {
                indent.pop();
                format!("{indent}</{}>", tag(section))
            }
            Event::Attribute { name, value } => format!(
                r#"{indent}<attribute name="{}" value="{}"/>"#,
                escape(name),
                escape(value)
            ),
            Event::Entry(locator) => format!(r#"{indent}<entry url="{}"/>"#, escape(locator)),
            Event::Role(role) | Event::UnassignedRole(role) => {
                format!("{indent}<role {}/>", role_attributes("", role))
            }
            Event::Child(role) => format!("{indent}<child {}/>", role_attributes("", role)),
            Event::Package(name) => format!(r#"{indent}<package name="{}"/>"#, escape(name)),
            Event::Error(message) => format!(r#"{indent}<error message="{}"/>"#, escape(message)),
            Event::Alias { alias, canonical } => format!(
                "{indent}<alias {} {}/>",
                role_attributes("", alias),
                role_attributes("same-as-", canonical)
            ),
        };

        Some(line)
    }
}
