#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use dom_i18n::{BinderConfig, Catalog, DomDocument as _, DomElement as _, I18n};
use dom_i18n_core::Observation as _;
use dom_i18n_host::{InProcessChannel, LocaleHost};
use dom_i18n_web::{WebDocument, WebElement};
use js_sys::Promise;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, Element};

wasm_bindgen_test_configure!(run_in_browser);

type Page = I18n<WebDocument, InProcessChannel>;
type Seen = Rc<RefCell<Vec<WebElement>>>;

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn marked(document: &Document, marker: &str, key: &str) -> Element {
    let element = document.create_element("span").unwrap();
    element.set_attribute(marker, key).unwrap();
    element
}

/// Resolves on the next task, after every queued MutationObserver callback has run.
async fn next_task() {
    let promise = Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback(&resolve)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

async fn loaded_page(marker: &str) -> (Arc<LocaleHost>, Page) {
    let catalog: Catalog = [
        ("en", "a", "A"),
        ("fr", "a", "À"),
        ("en", "b", "B"),
        ("fr", "b", "Bé"),
    ]
    .into_iter()
    .collect();
    let host = Arc::new(LocaleHost::with_default_locale(catalog));
    let page = I18n::with_config(
        WebDocument::new(document()),
        host.connect(),
        BinderConfig::default().with_marker(marker),
    );
    page.load().await.unwrap();
    (host, page)
}

fn recorder(document: &WebDocument) -> (Seen, dom_i18n_web::WebObservation) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let observation = document.observe_insertions(Box::new(move |roots: Vec<WebElement>| {
        sink.borrow_mut().extend(roots);
    }));
    (seen, observation)
}

#[wasm_bindgen_test]
fn same_element_keeps_its_id() {
    let document = document();
    let element = document.create_element("p").unwrap();
    let other = document.create_element("p").unwrap();

    let id = WebElement::new(element.clone()).id();

    assert_eq!(WebElement::new(element).id(), id);
    assert_ne!(WebElement::new(other).id(), id);
}

#[wasm_bindgen_test]
fn descendants_are_found_in_document_order() {
    const MARKER: &str = "data-t-descendants";
    let document = document();
    let container = document.create_element("div").unwrap();
    let list = document.create_element("ul").unwrap();
    list.append_child(&marked(&document, MARKER, "b")).unwrap();
    container.append_child(&marked(&document, MARKER, "a")).unwrap();
    container.append_child(&list).unwrap();
    container
        .append_child(&document.create_element("p").unwrap())
        .unwrap();

    let keys: Vec<_> = WebElement::new(container)
        .descendants_with_attribute(MARKER)
        .iter()
        .filter_map(|element| element.attribute(MARKER))
        .collect();

    assert_eq!(keys, vec!["a", "b"]);
}

#[wasm_bindgen_test]
fn marker_names_with_selector_syntax_are_matched_literally() {
    const MARKER: &str = "data-i18n:key.name";
    let document = document();
    let element = marked(&document, MARKER, "a");
    document.body().unwrap().append_child(&element).unwrap();

    let found = WebDocument::new(document).elements_with_attribute(MARKER);
    element.remove();

    assert_eq!(found, vec![WebElement::new(element)]);
}

#[wasm_bindgen_test]
async fn inserted_container_binds_both_children() {
    const MARKER: &str = "data-t-inserted";
    let document = document();
    let (host, page) = loaded_page(MARKER).await;
    let a = marked(&document, MARKER, "a");
    let b = marked(&document, MARKER, "b");
    let container = document.create_element("div").unwrap();
    container.append_child(&a).unwrap();
    container.append_child(&b).unwrap();

    document.body().unwrap().append_child(&container).unwrap();
    next_task().await;

    assert_eq!(a.text_content().as_deref(), Some("A"));
    assert_eq!(b.text_content().as_deref(), Some("B"));
    assert_eq!(page.binding_count(), 2);

    host.set_locale("fr");
    page.channel().dispatch_pending();
    assert_eq!(a.text_content().as_deref(), Some("À"));
    assert_eq!(b.text_content().as_deref(), Some("Bé"));

    page.teardown();
    container.remove();
}

#[wasm_bindgen_test]
async fn nothing_binds_after_teardown() {
    const MARKER: &str = "data-t-teardown";
    let document = document();
    let (_host, page) = loaded_page(MARKER).await;
    assert!(page.is_observing());

    page.teardown();
    let late = marked(&document, MARKER, "a");
    document.body().unwrap().append_child(&late).unwrap();
    next_task().await;

    assert_eq!(late.text_content().as_deref(), Some(""));
    assert_eq!(page.binding_count(), 0);
    late.remove();
}

#[wasm_bindgen_test]
async fn observation_reports_element_roots_only() {
    let document = document();
    let body = document.body().unwrap();
    let (seen, observation) = recorder(&WebDocument::new(document.clone()));

    let text = document.create_text_node("plain text");
    body.append_child(&text).unwrap();
    next_task().await;
    assert!(seen.borrow().is_empty());

    let element = document.create_element("p").unwrap();
    body.append_child(&element).unwrap();
    next_task().await;
    assert_eq!(*seen.borrow(), vec![WebElement::new(element.clone())]);

    observation.disconnect();
    body.remove_child(&text).unwrap();
    element.remove();
}

#[wasm_bindgen_test]
async fn disconnected_observation_reports_nothing() {
    let document = document();
    let (seen, observation) = recorder(&WebDocument::new(document.clone()));

    observation.disconnect();
    let element = document.create_element("p").unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    next_task().await;

    assert!(seen.borrow().is_empty());
    element.remove();
}

#[wasm_bindgen_test]
async fn dropped_observation_reports_nothing() {
    let document = document();
    let (seen, observation) = recorder(&WebDocument::new(document.clone()));

    drop(observation);
    let element = document.create_element("p").unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    next_task().await;

    assert!(seen.borrow().is_empty());
    element.remove();
}

#[wasm_bindgen_test]
async fn document_without_body_is_observed_from_its_root() {
    let detached = document()
        .implementation()
        .unwrap()
        .create_html_document()
        .unwrap();
    let root = detached.document_element().unwrap();
    if let Some(body) = detached.body() {
        root.remove_child(&body).unwrap();
    }
    assert!(detached.body().is_none());
    let (seen, _observation) = recorder(&WebDocument::new(detached.clone()));

    let element = detached.create_element("p").unwrap();
    root.append_child(&element).unwrap();
    next_task().await;

    assert_eq!(*seen.borrow(), vec![WebElement::new(element)]);
}
