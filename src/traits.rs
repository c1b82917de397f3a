use crate::element::Element;
use crate::engine::WalkConfig;
use crate::error::ListError;
use crate::kind::Classifier;

/// A source of elements to list.
///
/// The built-in [`FsSource`](crate::engine::FsSource) walks directories and
/// archives; implement this to feed the filter and process stages from
/// anything else.
///
/// # Error Handling
///
/// Yield recoverable errors (unreadable directories) as `Err` and keep
/// going. A fatal error should be the last item yielded: the engine stops
/// at the first error for which [`ListError::is_recoverable`] is `false`.
///
/// # Example
///
/// ```rust
/// use ldx::{Classifier, Element, ListError, Source};
/// use ldx::engine::WalkConfig;
///
/// struct VecSource(Vec<&'static str>);
///
/// impl Source for VecSource {
///     fn walk<'a>(
///         &'a self,
///         _config: &'a WalkConfig,
///         classifier: &'a Classifier,
///     ) -> Box<dyn Iterator<Item = Result<Element, ListError>> + 'a> {
///         Box::new(self.0.iter().map(move |name| {
///             Ok::<_, ListError>(Element::new(*name, *name, false, classifier))
///         }))
///     }
/// }
/// ```
pub trait Source {
    /// Traverse the source and yield elements in traversal order.
    ///
    /// Sources should honour the depth window in `config` and populate
    /// [`Element::vany`] for the configured sort key.
    fn walk<'a>(
        &'a self,
        config: &'a WalkConfig,
        classifier: &'a Classifier,
    ) -> Box<dyn Iterator<Item = Result<Element, ListError>> + 'a>;
}

/// Decides whether an element survives traversal.
///
/// Filters are combined with logical AND, so their order does not matter.
/// Closures `Fn(&Element) -> bool` are filters too.
///
/// # Example
///
/// ```rust
/// use ldx::{Element, Filter};
///
/// struct LargerThan(i64);
///
/// impl Filter for LargerThan {
///     fn is_match(&self, element: &Element) -> bool {
///         element.vany > self.0
///     }
/// }
/// ```
pub trait Filter {
    /// Returns `true` if this element should be kept.
    fn is_match(&self, element: &Element) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Element) -> bool,
{
    fn is_match(&self, element: &Element) -> bool {
        self(element)
    }
}

/// A post-traversal transformation over the collected list.
///
/// Unlike filters, processes run in sequence and their order matters:
/// slicing after sorting is not the same as slicing before.
pub trait Process {
    fn apply(&self, elements: Vec<Element>) -> Vec<Element>;
}

impl<F> Process for F
where
    F: Fn(Vec<Element>) -> Vec<Element>,
{
    fn apply(&self, elements: Vec<Element>) -> Vec<Element> {
        self(elements)
    }
}
