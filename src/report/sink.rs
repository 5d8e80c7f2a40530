use crate::handle::LoaderHandle;

/// Named groups of items within a report or a loader record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Attributes,
    Entries,
    Roles,
    Packages,
    Children,
    Errors,
    UnassignedRoles,
    Aliases,
}

/// One step of a report as it streams from producer to consumer.
///
/// A loader record is bracketed by `BeginLoader`/`EndLoader`, and every group
/// of items by `BeginSection`/`EndSection` carrying the item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'r> {
    BeginReport,
    EndReport,
    BeginLoader(&'r LoaderHandle),
    EndLoader(&'r LoaderHandle),
    ExplicitParent(&'r LoaderHandle),
    ImplicitParent(&'r LoaderHandle),
    TypeName(&'r str),
    BeginSection(Section, usize),
    EndSection(Section, usize),
    Attribute { name: &'r str, value: &'r str },
    Entry(&'r str),
    Role(&'r LoaderHandle),
    Package(&'r str),
    Child(&'r LoaderHandle),
    Error(&'r str),
    UnassignedRole(&'r LoaderHandle),
    Alias {
        alias: &'r LoaderHandle,
        canonical: &'r LoaderHandle,
    },
}

/// Consumer of report events.
pub trait ReportSink {
    fn accept(&mut self, event: Event<'_>);

    fn report_attribute(&mut self, name: &str, value: &str) {
        self.accept(Event::Attribute { name, value });
    }

    fn report_error(&mut self, message: &str) {
        self.accept(Event::Error(message));
    }
}

/// Emits a bracketed section with one event per item.
pub(crate) fn emit_section<T>(
    sink: &mut dyn ReportSink,
    section: Section,
    items: &[T],
    item: impl Fn(&T) -> Event<'_>,
) {
    sink.accept(Event::BeginSection(section, items.len()));
    for it in items {
        sink.accept(item(it));
    }
    sink.accept(Event::EndSection(section, items.len()));
}

/// Keeps the attributes an adapter reports, ignores everything else.
#[derive(Debug, Default)]
pub(crate) struct AttributeCollector {
    pub(crate) attributes: Vec<(String, String)>,
}

impl ReportSink for AttributeCollector {
    fn accept(&mut self, event: Event<'_>) {
        if let Event::Attribute { name, value } = event {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }
}
