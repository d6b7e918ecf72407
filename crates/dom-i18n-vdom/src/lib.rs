#![doc = include_str!("../README.md")]

use dom_i18n_core::{DomDocument, DomElement, InsertionHandler, Observation};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum VdomError {
    /// The insertion would make a node its own ancestor, or move the body.
    #[error("node cannot be inserted at this position")]
    HierarchyRequest,
    /// The node was created by a different document.
    #[error("node belongs to a different document")]
    WrongDocument,
}

/// Identity of a node within its document.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u64);

struct Node {
    id: NodeId,
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    text: RefCell<String>,
    children: RefCell<Vec<VirtualElement>>,
    parent: RefCell<Weak<Node>>,
    document: Weak<DocumentInner>,
}

/// A handle onto an element of a [`VirtualDocument`]. Clones share the same node.
#[derive(Clone)]
pub struct VirtualElement {
    node: Rc<Node>,
}

impl VirtualElement {
    fn new(document: Weak<DocumentInner>, id: NodeId, tag: &str) -> Self {
        Self {
            node: Rc::new(Node {
                id,
                tag: tag.to_string(),
                attributes: RefCell::new(BTreeMap::new()),
                text: RefCell::new(String::new()),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                document,
            }),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn tag(&self) -> &str {
        &self.node.tag
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.node
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.node.attributes.borrow_mut().remove(name);
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// The element's own text followed by the text of its descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = self.node.text.borrow().clone();
        for child in self.node.children.borrow().iter() {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn children(&self) -> Vec<VirtualElement> {
        self.node.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<VirtualElement> {
        self.node
            .parent
            .borrow()
            .upgrade()
            .map(|node| VirtualElement { node })
    }

    /// Appends `child` as the last child of `self`, detaching it from any previous parent.
    ///
    /// If `self` is attached to the document, every live observer gets an insertion record for
    /// `child`.
    pub fn append_child(&self, child: &VirtualElement) -> Result<(), VdomError> {
        if !self.node.document.ptr_eq(&child.node.document) {
            return Err(VdomError::WrongDocument);
        }
        if self.is_inclusive_descendant_of(child) || child.is_body() {
            return Err(VdomError::HierarchyRequest);
        }

        child.remove();
        *child.node.parent.borrow_mut() = Rc::downgrade(&self.node);
        self.node.children.borrow_mut().push(child.clone());

        if self.is_connected()
            && let Some(document) = self.node.document.upgrade()
        {
            document.record_insertion(child);
        }
        Ok(())
    }

    /// Builder-style [`append_child`](Self::append_child) for assembling detached fragments.
    pub fn with_child(self, child: VirtualElement) -> Result<Self, VdomError> {
        self.append_child(&child)?;
        Ok(self)
    }

    /// Detaches the element from its parent. Removals are not reported to observers.
    pub fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .node
            .children
            .borrow_mut()
            .retain(|sibling| !Rc::ptr_eq(&sibling.node, &self.node));
        *self.node.parent.borrow_mut() = Weak::new();
    }

    fn is_body(&self) -> bool {
        self.node
            .document
            .upgrade()
            .is_some_and(|document| Rc::ptr_eq(&document.body.node, &self.node))
    }

    fn is_inclusive_descendant_of(&self, ancestor: &VirtualElement) -> bool {
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            if Rc::ptr_eq(&node, &ancestor.node) {
                return true;
            }
            current = node.parent.borrow().upgrade();
        }
        false
    }

    fn collect_marked(&self, name: &str, out: &mut Vec<VirtualElement>) {
        for child in self.node.children.borrow().iter() {
            if child.node.attributes.borrow().contains_key(name) {
                out.push(child.clone());
            }
            child.collect_marked(name, out);
        }
    }
}

impl fmt::Debug for VirtualElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualElement")
            .field("id", &self.node.id)
            .field("tag", &self.node.tag)
            .field("attributes", &self.node.attributes.borrow())
            .finish()
    }
}

impl PartialEq for VirtualElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for VirtualElement {}

impl DomElement for VirtualElement {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.node.id
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.node.attributes.borrow().get(name).cloned()
    }

    /// Replaces the children with the text, as a browser does.
    fn set_text_content(&self, text: &str) {
        let children = std::mem::take(&mut *self.node.children.borrow_mut());
        for child in children {
            *child.node.parent.borrow_mut() = Weak::new();
        }
        *self.node.text.borrow_mut() = text.to_string();
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<Self> {
        let mut out = Vec::new();
        self.collect_marked(name, &mut out);
        out
    }

    fn is_connected(&self) -> bool {
        match self.node.document.upgrade() {
            Some(document) => self.is_inclusive_descendant_of(&document.body),
            None => false,
        }
    }
}

struct ObserverSlot {
    id: u64,
    pending: Vec<VirtualElement>,
    /// `None` while the handler is running.
    handler: Option<InsertionHandler<VirtualElement>>,
}

struct DocumentInner {
    body: VirtualElement,
    next_node: Cell<u64>,
    next_observer: Cell<u64>,
    observers: RefCell<Vec<ObserverSlot>>,
}

impl DocumentInner {
    fn record_insertion(&self, element: &VirtualElement) {
        for slot in self.observers.borrow_mut().iter_mut() {
            slot.pending.push(element.clone());
        }
    }
}

/// An in-memory document with a `<body>` root.
#[derive(Clone)]
pub struct VirtualDocument {
    inner: Rc<DocumentInner>,
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDocument {
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|document: &Weak<DocumentInner>| DocumentInner {
            body: VirtualElement::new(document.clone(), NodeId(0), "body"),
            next_node: Cell::new(1),
            next_observer: Cell::new(0),
            observers: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    pub fn body(&self) -> VirtualElement {
        self.inner.body.clone()
    }

    /// Creates a detached element owned by this document.
    pub fn create_element(&self, tag: &str) -> VirtualElement {
        let id = self.inner.next_node.get();
        self.inner.next_node.set(id + 1);
        VirtualElement::new(Rc::downgrade(&self.inner), NodeId(id), tag)
    }

    /// Creates a detached element carrying `marker="key"`.
    pub fn create_marked(&self, tag: &str, marker: &str, key: &str) -> VirtualElement {
        self.create_element(tag).with_attribute(marker, key)
    }

    /// Delivers queued insertion records, one batch per observer, until no records remain.
    ///
    /// Records produced by a handler are delivered in the same flush. Returns the number of
    /// batches delivered.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut observers = self.inner.observers.borrow_mut();
                observers
                    .iter_mut()
                    .find(|slot| !slot.pending.is_empty() && slot.handler.is_some())
                    .and_then(|slot| {
                        let handler = slot.handler.take()?;
                        Some((slot.id, std::mem::take(&mut slot.pending), handler))
                    })
            };
            let Some((id, batch, mut handler)) = next else {
                break;
            };

            tracing::trace!(observer = id, records = batch.len(), "delivering insertion records");
            handler(batch);
            delivered += 1;

            if let Some(slot) = self
                .inner
                .observers
                .borrow_mut()
                .iter_mut()
                .find(|slot| slot.id == id)
            {
                slot.handler = Some(handler);
            }
        }
        delivered
    }

    /// Number of insertion records waiting for the next [`flush`](Self::flush).
    pub fn pending_records(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .map(|slot| slot.pending.len())
            .sum()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }
}

impl fmt::Debug for VirtualDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualDocument")
            .field("observers", &self.observer_count())
            .field("pending_records", &self.pending_records())
            .finish()
    }
}

/// Handle returned by [`VirtualDocument::observe_insertions`].
#[derive(Debug)]
pub struct VirtualObservation {
    id: u64,
    document: Weak<DocumentInner>,
}

impl Observation for VirtualObservation {
    fn disconnect(self) {
        if let Some(document) = self.document.upgrade() {
            document
                .observers
                .borrow_mut()
                .retain(|slot| slot.id != self.id);
        }
    }
}

impl DomDocument for VirtualDocument {
    type Element = VirtualElement;
    type Observation = VirtualObservation;

    fn elements_with_attribute(&self, name: &str) -> Vec<VirtualElement> {
        let body = &self.inner.body;
        let mut out = Vec::new();
        if body.attribute(name).is_some() {
            out.push(body.clone());
        }
        body.collect_marked(name, &mut out);
        out
    }

    fn observe_insertions(&self, handler: InsertionHandler<VirtualElement>) -> VirtualObservation {
        let id = self.inner.next_observer.get();
        self.inner.next_observer.set(id + 1);
        self.inner.observers.borrow_mut().push(ObserverSlot {
            id,
            pending: Vec::new(),
            handler: Some(handler),
        });
        VirtualObservation {
            id,
            document: Rc::downgrade(&self.inner),
        }
    }
}
