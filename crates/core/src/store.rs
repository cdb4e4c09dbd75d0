//! Shared client state: observable cells and their key/value persistence.
//!
//! Persistence goes through the [`Storage`] trait so the same stores work over
//! the CLI's file-backed storage, an in-memory map, or nothing at all. Storage
//! failures never propagate out of a store: they are logged and the store keeps
//! working in memory.

use crate::catalog::{get_category_by_id, get_category_path_by_id};
use std::collections::HashMap;

/// Storage key holding the selected category id.
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// A string key/value store with local-storage semantics.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Handle returned by [`Observable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Listener<T> = Box<dyn FnMut(&T)>;

/// A value holder that notifies subscribers, in registration order, on every
/// `set`.
pub struct Observable<T> {
    value: T,
    next_id: usize,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.clone()
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.value);
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Parse a persisted category id. `0` and garbage both mean "all".
/// Stored ids that no longer name a category read back as all.
fn parse_persisted_category(raw: &str) -> Option<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|id| *id != 0 && get_category_by_id(Some(*id)).is_some())
}

/// The currently selected category (`None` = all), persisted on every write.
pub struct SelectedCategoryStore<S: Storage> {
    storage: S,
    cell: Observable<Option<u32>>,
}

impl<S: Storage> SelectedCategoryStore<S> {
    pub fn new(storage: S) -> Self {
        let initial = match storage.get_item(SELECTED_CATEGORY_KEY) {
            Ok(Some(raw)) => parse_persisted_category(&raw),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Could not read the selected category, starting from all: {e}");
                None
            }
        };

        Self {
            storage,
            cell: Observable::new(initial),
        }
    }

    pub fn get(&self) -> Option<u32> {
        self.cell.get()
    }

    /// Persist then notify. A failed write leaves the in-memory value updated.
    pub fn set(&mut self, value: Option<u32>) {
        let value = value.filter(|id| *id != 0);
        let persisted = match value {
            None => self.storage.remove_item(SELECTED_CATEGORY_KEY),
            Some(id) => self
                .storage
                .set_item(SELECTED_CATEGORY_KEY, &id.to_string()),
        };
        if let Err(e) = persisted {
            log::warn!("Could not persist the selected category: {e}");
        }
        self.cell.set(value);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Option<u32>) + 'static) -> SubscriptionId {
        self.cell.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.cell.unsubscribe(id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Open/closed state of the mobile navigation menu. Never persisted.
#[derive(Debug)]
pub struct MobileMenuStore {
    cell: Observable<bool>,
}

impl Default for MobileMenuStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileMenuStore {
    pub fn new() -> Self {
        Self {
            cell: Observable::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.cell.get()
    }

    pub fn open(&mut self) {
        self.cell.set(true);
    }

    pub fn close(&mut self) {
        self.cell.set(false);
    }

    pub fn toggle(&mut self) {
        let next = !self.cell.get();
        self.cell.set(next);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.cell.subscribe(listener)
    }
}

/// Process-wide client state handed explicitly to whatever renders it.
pub struct AppContext<S: Storage> {
    pub selected_category: SelectedCategoryStore<S>,
    pub mobile_menu: MobileMenuStore,
}

impl<S: Storage> AppContext<S> {
    pub fn new(storage: S) -> Self {
        Self {
            selected_category: SelectedCategoryStore::new(storage),
            mobile_menu: MobileMenuStore::new(),
        }
    }

    /// Select a category the way the category filter does: store it, close
    /// the mobile menu, and return the path to navigate to. Returns `None`
    /// when `current_path` already is that path.
    ///
    /// Unknown ids are stored as-is but navigate to the "all" path.
    pub fn select_category(&mut self, id: Option<u32>, current_path: &str) -> Option<String> {
        self.selected_category.set(id);
        self.mobile_menu.close();

        let path = get_category_path_by_id(id);
        (path != current_path).then_some(path)
    }

    /// Sync the store with the page being loaded (initial page-load logic).
    pub fn sync_with_path(&mut self, path: &str) {
        let id = crate::catalog::get_category_id_from_path(path);
        if self.selected_category.get() != id {
            self.selected_category.set(id);
        }
    }

    /// Display name of the current selection.
    pub fn current_category_name(&self) -> &'static str {
        get_category_by_id(self.selected_category.get())
            .map(|c| c.name)
            .unwrap_or(crate::catalog::ALL_CATEGORY.name)
    }
}
