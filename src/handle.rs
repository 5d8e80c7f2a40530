use std::fmt;
use std::sync::Arc;

/// The well-known role categories a loader can be found under.
///
/// The declaration order is significant: it drives the total order of
/// [`LoaderHandle`], which is the order loaders appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Bootstrap,
    Extension,
    System,
    CoreHost,
    Core,
    ThreadContext,
    CurrentComponent,
    Referenced,
    Defined,
    ParentOf,
    Other,
}

impl Category {
    /// Display name used in rendered reports.
    pub fn type_name(self) -> &'static str {
        match self {
            Category::Bootstrap => "BootstrapLoader",
            Category::Extension => "ExtensionLoader",
            Category::System => "SystemLoader",
            Category::CoreHost => "HostLoader",
            Category::Core => "CoreLoader",
            Category::ThreadContext => "ThreadContextLoader",
            Category::CurrentComponent => "CurrentLoader",
            Category::Referenced => "Referenced",
            Category::Defined => "Defined",
            Category::ParentOf => "ParentOf",
            Category::Other => "Other",
        }
    }

    /// Popular categories are expected to be filled in every environment, so
    /// a missing loader for them is worth mentioning.
    pub fn is_popular(self) -> bool {
        self <= Category::CurrentComponent
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Identifies one *role* under which a loader is observed.
///
/// Handles are ordered by category first and label second, with a missing
/// label sorting before any present one. One loader may be reachable under
/// many handles; every handle is unique within a single report pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoaderHandle {
    category: Category,
    label: Option<Arc<str>>,
}

impl LoaderHandle {
    pub fn new(category: Category, label: Option<&str>) -> Self {
        Self {
            category,
            label: label.map(Arc::from),
        }
    }

    pub fn bootstrap() -> Self {
        Self::new(Category::Bootstrap, None)
    }

    pub fn extension() -> Self {
        Self::new(Category::Extension, None)
    }

    pub fn system() -> Self {
        Self::new(Category::System, None)
    }

    pub fn core_host() -> Self {
        Self::new(Category::CoreHost, None)
    }

    pub fn core() -> Self {
        Self::new(Category::Core, None)
    }

    pub fn thread_context() -> Self {
        Self::new(Category::ThreadContext, None)
    }

    pub fn current_component() -> Self {
        Self::new(Category::CurrentComponent, None)
    }

    pub fn referenced(name: &str) -> Self {
        Self::new(Category::Referenced, Some(name))
    }

    pub fn defined(name: &str) -> Self {
        Self::new(Category::Defined, Some(name))
    }

    /// The role of "parent of `child`"; the label is the child's rendering.
    pub fn parent_of(child: &LoaderHandle) -> Self {
        Self::new(Category::ParentOf, Some(&child.to_string()))
    }

    pub fn other(label: &str) -> Self {
        Self::new(Category::Other, Some(label))
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn type_name(&self) -> &'static str {
        self.category.type_name()
    }

    pub fn is_popular(&self) -> bool {
        self.category.is_popular()
    }
}

impl fmt::Display for LoaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}={}", self.type_name(), label),
            None => f.write_str(self.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_category_then_label() {
        let mut handles = vec![
            LoaderHandle::other("x"),
            LoaderHandle::referenced("b"),
            LoaderHandle::system(),
            LoaderHandle::referenced("a"),
            LoaderHandle::bootstrap(),
            LoaderHandle::new(Category::Referenced, None),
        ];
        handles.sort();

        let rendered: Vec<String> = handles.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "BootstrapLoader",
                "SystemLoader",
                "Referenced",
                "Referenced=a",
                "Referenced=b",
                "Other=x",
            ]
        );
    }

    #[test]
    fn test_popular_categories() {
        assert!(LoaderHandle::bootstrap().is_popular());
        assert!(LoaderHandle::core().is_popular());
        assert!(LoaderHandle::current_component().is_popular());
        assert!(!LoaderHandle::referenced("a").is_popular());
        assert!(!LoaderHandle::other("a").is_popular());
    }

    #[test]
    fn test_parent_of_label() {
        let child = LoaderHandle::referenced("project");
        let parent = LoaderHandle::parent_of(&child);
        assert_eq!(parent.category(), Category::ParentOf);
        assert_eq!(parent.label(), Some("Referenced=project"));
        assert_eq!(
            LoaderHandle::parent_of(&parent).to_string(),
            "ParentOf=ParentOf=Referenced=project"
        );
    }

    #[test]
    fn test_equality_includes_label() {
        assert_eq!(LoaderHandle::defined("a"), LoaderHandle::defined("a"));
        assert_ne!(LoaderHandle::defined("a"), LoaderHandle::referenced("a"));
        assert_ne!(LoaderHandle::defined("a"), LoaderHandle::defined("b"));
    }
}
