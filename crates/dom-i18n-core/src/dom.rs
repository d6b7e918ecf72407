//! The document seam.
//!
//! The binding engine never touches a concrete DOM. It needs four things from an element
//! (identity, attribute reads, text writes, descendant queries) and one thing from a document:
//! a way to hear about inserted subtrees.

use std::fmt::Debug;
use std::hash::Hash;

/// Attribute an element carries to opt into automatic binding. Its value is the translation key.
pub const DEFAULT_MARKER: &str = "data-i18n";

/// Handler receiving the root elements of each batch of insertions.
///
/// Only element roots are delivered; descendants of an inserted root are the handler's business.
pub type InsertionHandler<E> = Box<dyn FnMut(Vec<E>)>;

/// A borrowed handle onto an element that lives in a document this crate does not own.
pub trait DomElement: Clone + 'static {
    /// Stable identity of the underlying node. Two handles to the same node yield equal ids.
    type Id: Clone + Debug + Eq + Hash;

    fn id(&self) -> Self::Id;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Replaces the visible text of the element. Must be harmless on a detached element.
    fn set_text_content(&self, text: &str);

    /// Every descendant (not the element itself) carrying attribute `name`, in document order.
    fn descendants_with_attribute(&self, name: &str) -> Vec<Self>;

    /// Whether the element is currently attached to its document.
    fn is_connected(&self) -> bool;
}

/// A running insertion observation. Dropping it without `disconnect` is allowed to leak the
/// observation until the document goes away.
pub trait Observation {
    fn disconnect(self);
}

pub trait DomDocument {
    type Element: DomElement;
    type Observation: Observation;

    /// Every element in the document carrying attribute `name`, in document order.
    fn elements_with_attribute(&self, name: &str) -> Vec<Self::Element>;

    /// Starts observing the subtree rooted at the document body for node insertions.
    ///
    /// Each physical insertion must be reported exactly once per observation.
    fn observe_insertions(&self, handler: InsertionHandler<Self::Element>) -> Self::Observation;
}

/// Reads the translation key an element is marked with.
///
/// An absent attribute and an empty value both mean "not marked".
pub fn marker_key<E: DomElement>(element: &E, marker: &str) -> Option<String> {
    element.attribute(marker).filter(|key| !key.is_empty())
}
