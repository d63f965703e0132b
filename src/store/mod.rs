//! In-memory recipe collection, the system of record while the process runs.
//!
//! One `RecipeStore` is built at startup and handed to consumers as
//! `Arc<RecipeStore>`. Every action is a single state transition: the new
//! `RecipesState` is installed under the write lock and listeners are called
//! afterwards with `(next, prev)`.

mod actions;
pub mod state;

pub use state::{RecipeMap, RecipesState};

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Listener = Arc<dyn Fn(&RecipesState, &RecipesState) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

pub struct RecipeStore {
    state: RwLock<Arc<RecipesState>>,
    listeners: Arc<Mutex<ListenerRegistry>>,
}

impl Default for RecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(RecipesState::default())),
            listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
        }
    }

    /// Current state. Cheap: clones one `Arc`.
    pub fn state(&self) -> Arc<RecipesState> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn is_hydrated(&self) -> bool {
        self.state().is_hydrated
    }

    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty()
    }

    /// Registers a change listener. It is called with `(next, prev)` after
    /// every transition until the returned handle is dropped.
    ///
    /// Listeners run on the mutating thread and must not call back into the
    /// store's actions.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RecipesState, &RecipesState) + Send + Sync + 'static,
    {
        let mut registry = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(listener)));

        Subscription {
            registry: Arc::downgrade(&self.listeners),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Runs `f` against the current state under the write lock. When `f`
    /// returns a next state it is installed and listeners are notified;
    /// `None` leaves the state, and every reference in it, untouched.
    pub(crate) fn transition<R>(
        &self,
        f: impl FnOnce(&RecipesState) -> (Option<RecipesState>, R),
    ) -> R {
        let (next, prev, output) = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let (next, output) = f(&guard);
            let Some(next) = next else {
                return output;
            };
            let next = Arc::new(next);
            let prev = std::mem::replace(&mut *guard, Arc::clone(&next));
            (next, prev, output)
        };

        self.notify(&next, &prev);
        output
    }

    fn notify(&self, next: &RecipesState, prev: &RecipesState) {
        let listeners: Vec<Listener> = {
            let registry = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        for listener in listeners {
            listener(next, prev);
        }
    }
}

/// Handle for a store listener; dropping it detaches the listener.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    registry: Weak<Mutex<ListenerRegistry>>,
    id: u64,
}

impl Subscription {
    /// Detaches the listener; consuming the handle runs its `Drop`.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.entries.retain(|(id, _)| *id != self.id);
        }
    }
}
