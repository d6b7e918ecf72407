use dom_i18n_core::{DomDocument, DomElement, InsertionHandler, Observation as _, marker_key};
use std::cell::RefCell;
use tracing::debug;

/// Discovers marked elements, eagerly by scanning and reactively by observing insertions.
///
/// Discovered elements are handed to a sink as `(element, key)`; the watcher itself keeps no
/// bindings. At most one observation is live per watcher.
pub struct DomWatcher<D: DomDocument> {
    document: D,
    marker: String,
    observation: RefCell<Option<D::Observation>>,
}

impl<D: DomDocument> DomWatcher<D> {
    pub fn new(document: D, marker: impl Into<String>) -> Self {
        Self {
            document,
            marker: marker.into(),
            observation: RefCell::new(None),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Name of the marker attribute this watcher looks for.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Feeds every marked element currently in the document to `sink`.
    ///
    /// Elements whose marker value is empty are skipped. Returns how many elements were fed.
    pub fn scan_existing(&self, mut sink: impl FnMut(D::Element, String)) -> usize {
        let mut found = 0;
        for element in self.document.elements_with_attribute(&self.marker) {
            if let Some(key) = marker_key(&element, &self.marker) {
                sink(element, key);
                found += 1;
            }
        }
        debug!(marker = %self.marker, found, "scanned document for marked elements");
        found
    }

    /// Starts observing insertions under the document body.
    ///
    /// Every inserted element root is fed to `sink` if marked, followed by each of its marked
    /// descendants. Returns `false` without doing anything if already observing.
    pub fn start_observing<F>(&self, sink: F) -> bool
    where
        F: Fn(D::Element, String) + 'static,
    {
        if self.is_observing() {
            debug!("insertion observer already running");
            return false;
        }

        let marker = self.marker.clone();
        let handler: InsertionHandler<D::Element> = Box::new(move |roots| {
            for root in roots {
                bind_subtree(&root, &marker, &sink);
            }
        });
        let observation = self.document.observe_insertions(handler);
        *self.observation.borrow_mut() = Some(observation);
        debug!(marker = %self.marker, "started insertion observer");
        true
    }

    /// Stops observing. Returns `false` if no observation was running.
    pub fn stop_observing(&self) -> bool {
        let observation = self.observation.borrow_mut().take();
        match observation {
            Some(observation) => {
                observation.disconnect();
                debug!("stopped insertion observer");
                true
            },
            None => false,
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observation.borrow().is_some()
    }
}

fn bind_subtree<E, F>(root: &E, marker: &str, sink: &F)
where
    E: DomElement,
    F: Fn(E, String),
{
    // Rendering the root replaces its children, so they are collected first.
    let descendants = root.descendants_with_attribute(marker);
    if let Some(key) = marker_key(root, marker) {
        sink(root.clone(), key);
    }
    for element in descendants {
        if let Some(key) = marker_key(&element, marker) {
            sink(element, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_i18n_core::DEFAULT_MARKER;
    use dom_i18n_vdom::{VirtualDocument, VirtualElement};
    use std::rc::Rc;

    type Seen = Rc<RefCell<Vec<(VirtualElement, String)>>>;

    fn collector() -> (Seen, impl Fn(VirtualElement, String) + 'static) {
        let seen: Seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |element: VirtualElement, key: String| {
            sink.borrow_mut().push((element, key));
        })
    }

    fn keys(seen: &Seen) -> Vec<String> {
        seen.borrow().iter().map(|(_, key)| key.clone()).collect()
    }

    #[test]
    fn scan_skips_empty_markers() {
        let doc = VirtualDocument::new();
        let body = doc.body();
        body.append_child(&doc.create_marked("p", DEFAULT_MARKER, "title"))
            .unwrap();
        body.append_child(&doc.create_marked("p", DEFAULT_MARKER, ""))
            .unwrap();
        body.append_child(&doc.create_element("p")).unwrap();

        let watcher = DomWatcher::new(doc.clone(), DEFAULT_MARKER);
        let mut keys = Vec::new();
        let found = watcher.scan_existing(|_, key| keys.push(key));

        assert_eq!(found, 1);
        assert_eq!(keys, vec!["title"]);
    }

    #[test]
    fn inserted_subtree_reports_root_and_nested_descendants() {
        let doc = VirtualDocument::new();
        let watcher = DomWatcher::new(doc.clone(), DEFAULT_MARKER);
        let (seen, sink) = collector();
        assert!(watcher.start_observing(sink));

        let deep = doc
            .create_element("section")
            .with_child(doc.create_marked("em", DEFAULT_MARKER, "c"))
            .unwrap();
        let fragment = doc
            .create_marked("div", DEFAULT_MARKER, "root")
            .with_child(doc.create_marked("span", DEFAULT_MARKER, "a"))
            .unwrap()
            .with_child(doc.create_marked("span", DEFAULT_MARKER, ""))
            .unwrap()
            .with_child(deep)
            .unwrap();
        doc.body().append_child(&fragment).unwrap();
        doc.flush();

        assert_eq!(keys(&seen), vec!["root", "a", "c"]);
    }

    #[test]
    fn starting_twice_keeps_a_single_observer() {
        let doc = VirtualDocument::new();
        let watcher = DomWatcher::new(doc.clone(), DEFAULT_MARKER);
        let (seen, sink) = collector();
        let (_, second_sink) = collector();

        assert!(watcher.start_observing(sink));
        assert!(!watcher.start_observing(second_sink));
        assert_eq!(doc.observer_count(), 1);

        doc.body()
            .append_child(&doc.create_marked("p", DEFAULT_MARKER, "once"))
            .unwrap();
        doc.flush();
        assert_eq!(keys(&seen), vec!["once"]);
    }

    #[test]
    fn stop_observing_ends_discovery() {
        let doc = VirtualDocument::new();
        let watcher = DomWatcher::new(doc.clone(), DEFAULT_MARKER);
        let (seen, sink) = collector();
        watcher.start_observing(sink);

        assert!(watcher.stop_observing());
        assert!(!watcher.stop_observing());
        assert!(!watcher.is_observing());

        doc.body()
            .append_child(&doc.create_marked("p", DEFAULT_MARKER, "late"))
            .unwrap();
        doc.flush();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn custom_marker_attribute_is_honoured() {
        let doc = VirtualDocument::new();
        doc.body()
            .append_child(&doc.create_marked("p", "data-t", "custom"))
            .unwrap();
        doc.body()
            .append_child(&doc.create_marked("p", DEFAULT_MARKER, "default"))
            .unwrap();

        let watcher = DomWatcher::new(doc, "data-t");
        let mut keys = Vec::new();
        watcher.scan_existing(|_, key| keys.push(key));
        assert_eq!(keys, vec!["custom"]);
    }
}
