#![doc = include_str!("../README.md")]

use dom_i18n_core::{DomDocument, DomElement, InsertionHandler, Observation};
use js_sys::{Array, Reflect};
use std::cell::Cell;
use tracing::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit, MutationRecord, NodeList};

/// Expando property holding an element's identity.
const ID_PROPERTY: &str = "__domI18nId";

thread_local! {
    static NEXT_ID: Cell<u32> = const { Cell::new(1) };
}

/// `[name]`, the selector matching every element carrying attribute `name`.
///
/// The name is escaped as a CSS identifier, so `i18n:key` gives `[i18n\:key]`.
pub fn attribute_selector(name: &str) -> String {
    format!("[{}]", escape_identifier(name))
}

/// Serializes `ident` as a CSS identifier, like `CSS.escape`.
fn escape_identifier(ident: &str) -> String {
    let starts_with_dash = ident.starts_with('-');
    let mut escaped = String::with_capacity(ident.len());
    for (index, ch) in ident.chars().enumerate() {
        let leading_digit =
            ch.is_ascii_digit() && (index == 0 || (index == 1 && starts_with_dash));
        match ch {
            '\0' => escaped.push('\u{fffd}'),
            _ if leading_digit || ch.is_ascii_control() => {
                escaped.push_str(&format!("\\{:x} ", u32::from(ch)));
            },
            '-' if ident.len() == 1 => escaped.push_str("\\-"),
            _ if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() => {
                escaped.push(ch);
            },
            _ => {
                escaped.push('\\');
                escaped.push(ch);
            },
        }
    }
    escaped
}

fn elements(list: &NodeList) -> Vec<WebElement> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(WebElement)
        .collect()
}

fn query_all(result: Result<NodeList, JsValue>, name: &str) -> Vec<WebElement> {
    match result {
        Ok(list) => elements(&list),
        Err(err) => {
            warn!(attribute = name, ?err, "attribute query rejected");
            Vec::new()
        },
    }
}

/// A handle onto a browser element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebElement(Element);

impl WebElement {
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &Element {
        &self.0
    }

    pub fn into_inner(self) -> Element {
        self.0
    }
}

impl From<Element> for WebElement {
    fn from(element: Element) -> Self {
        Self(element)
    }
}

impl DomElement for WebElement {
    type Id = u32;

    /// Reads the identity stamped on the element, stamping a fresh one on first use.
    fn id(&self) -> u32 {
        let property = JsValue::from_str(ID_PROPERTY);
        if let Some(id) = Reflect::get(&self.0, &property)
            .ok()
            .and_then(|value| value.as_f64())
        {
            return id as u32;
        }

        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id.wrapping_add(1));
            id
        });
        if !matches!(Reflect::set(&self.0, &property, &JsValue::from(id)), Ok(true)) {
            warn!(id, "could not stamp element identity, element may be bound twice");
        }
        id
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<Self> {
        query_all(self.0.query_selector_all(&attribute_selector(name)), name)
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }
}

/// A browser document.
#[derive(Clone, Debug)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The current window's document, if running in a window.
    pub fn from_window() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl DomDocument for WebDocument {
    type Element = WebElement;
    type Observation = WebObservation;

    fn elements_with_attribute(&self, name: &str) -> Vec<WebElement> {
        query_all(self.document.query_selector_all(&attribute_selector(name)), name)
    }

    fn observe_insertions(&self, mut handler: InsertionHandler<WebElement>) -> WebObservation {
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let mut roots = Vec::new();
                for record in records.iter() {
                    let record: MutationRecord = record.unchecked_into();
                    roots.extend(elements(&record.added_nodes()));
                }
                if !roots.is_empty() {
                    handler(roots);
                }
            },
        );

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                error!(?err, "failed to create MutationObserver, insertions will not be bound");
                return WebObservation {
                    observer: None,
                    _callback: callback,
                };
            },
        };

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        let observed = match self.document.body() {
            Some(body) => observer.observe_with_options(&body, &init),
            None => observer.observe_with_options(&self.document, &init),
        };
        if let Err(err) = observed {
            error!(?err, "failed to start MutationObserver");
        } else {
            debug!("observing document insertions");
        }

        WebObservation {
            observer: Some(observer),
            _callback: callback,
        }
    }
}

/// A running `MutationObserver`.
///
/// The observer is disconnected before its callback is released, on `disconnect` and on drop.
pub struct WebObservation {
    observer: Option<MutationObserver>,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl Observation for WebObservation {
    fn disconnect(mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
            debug!("stopped observing document insertions");
        }
    }
}

impl Drop for WebObservation {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}
