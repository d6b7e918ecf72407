use dom_i18n_core::{DomElement, TranslationView};
use indexmap::IndexMap;
use tracing::debug;

/// One tracked `(element, key)` association.
#[derive(Clone, Debug)]
pub struct Binding<E> {
    pub element: E,
    pub key: String,
}

/// The live set of bound elements, at most one entry per element.
///
/// The registry borrows elements; it never owns their lifetime and never evicts on its own.
/// Detached elements keep their entry and keep receiving (harmless) text writes until
/// [`prune_detached`](Self::prune_detached) is called.
#[derive(Debug)]
pub struct BindingRegistry<E: DomElement> {
    bindings: IndexMap<E::Id, Binding<E>>,
}

impl<E: DomElement> Default for BindingRegistry<E> {
    fn default() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }
}

impl<E: DomElement> BindingRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the key for `element` and renders it immediately.
    ///
    /// Returns `true` when a new entry was created, `false` when an existing one was overwritten.
    pub fn bind(&mut self, element: E, key: &str, view: TranslationView<'_>) -> bool {
        let created = self
            .bindings
            .insert(
                element.id(),
                Binding {
                    element: element.clone(),
                    key: key.to_string(),
                },
            )
            .is_none();

        element.set_text_content(&view.resolve(key));
        created
    }

    /// Re-renders every tracked element from `view`. Returns the number of elements written.
    pub fn render_all(&self, view: TranslationView<'_>) -> usize {
        for binding in self.bindings.values() {
            binding.element.set_text_content(&view.resolve(&binding.key));
        }
        debug!(
            locale = view.locale,
            bindings = self.bindings.len(),
            "re-rendered bindings"
        );
        self.bindings.len()
    }

    pub fn key_for(&self, element: &E) -> Option<&str> {
        self.bindings
            .get(&element.id())
            .map(|binding| binding.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates bindings in first-bound order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding<E>> {
        self.bindings.values()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Drops bindings whose element is no longer attached. Returns how many were dropped.
    pub fn prune_detached(&mut self) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, binding| binding.element.is_connected());
        let pruned = before - self.bindings.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.bindings.len(), "pruned detached bindings");
        }
        pruned
    }
}
