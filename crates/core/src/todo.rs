//! To-do list: items, list operations and persistence through [`Storage`].

use crate::store::{Storage, StorageError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized list.
pub const TODOS_KEY: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    #[error("Please enter a task")]
    EmptyText,

    #[error("No task with id {0}")]
    NotFound(String),

    #[error("Failed to load saved tasks: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoCategory {
    Work,
    Personal,
    Shopping,
    Study,
    Other,
}

impl TodoCategory {
    pub const ALL: [TodoCategory; 5] = [
        TodoCategory::Work,
        TodoCategory::Personal,
        TodoCategory::Shopping,
        TodoCategory::Study,
        TodoCategory::Other,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TodoCategory::Work => "work",
            TodoCategory::Personal => "personal",
            TodoCategory::Shopping => "shopping",
            TodoCategory::Study => "study",
            TodoCategory::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TodoCategory::Work => "Work",
            TodoCategory::Personal => "Personal",
            TodoCategory::Shopping => "Shopping",
            TodoCategory::Study => "Study",
            TodoCategory::Other => "Other",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<TodoCategory>,
}

impl TodoItem {
    /// Overdue means the due date is strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }
}

/// Ordered in-memory list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<TodoItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Pick an id for a new item from a millisecond timestamp, bumping it
    /// past the newest existing numeric id so ids stay unique and increasing.
    fn next_id(&self, now_millis: i64) -> String {
        let newest = self
            .items
            .iter()
            .filter_map(|item| item.id.parse::<i64>().ok())
            .max();
        let id = match newest {
            Some(newest) if newest >= now_millis => newest + 1,
            _ => now_millis,
        };
        id.to_string()
    }

    pub fn add(
        &mut self,
        text: &str,
        due_date: Option<NaiveDate>,
        category: Option<TodoCategory>,
        now_millis: i64,
    ) -> Result<&TodoItem, TodoError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TodoError::EmptyText);
        }

        let item = TodoItem {
            id: self.next_id(now_millis),
            text: text.to_string(),
            completed: false,
            due_date,
            category,
        };
        let index = self.items.len();
        self.items.push(item);
        Ok(&self.items[index])
    }

    pub fn toggle(&mut self, id: &str) -> Result<&TodoItem, TodoError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        item.completed = !item.completed;
        Ok(item)
    }

    pub fn delete(&mut self, id: &str) -> Result<TodoItem, TodoError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Remove completed items, returning how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.completed);
        before - self.items.len()
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&TodoItem> {
        self.items
            .iter()
            .filter(|item| !item.completed && item.is_overdue(today))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, TodoError> {
        serde_json::to_string(&self.items).map_err(|e| TodoError::Corrupt(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, TodoError> {
        serde_json::from_str(raw)
            .map(Self::from_items)
            .map_err(|e| TodoError::Corrupt(e.to_string()))
    }
}

/// A [`TodoList`] mirrored to storage after every mutation.
pub struct TodoStore<S: Storage> {
    storage: S,
    list: TodoList,
    load_error: Option<TodoError>,
}

impl<S: Storage> TodoStore<S> {
    /// Rehydrate from storage. Corrupt or unreadable data yields an empty
    /// list and is reported through [`TodoStore::load_error`].
    pub fn load(storage: S) -> Self {
        let (list, load_error) = match storage.get_item(TODOS_KEY) {
            Ok(None) => (TodoList::new(), None),
            Ok(Some(raw)) => match TodoList::from_json(&raw) {
                Ok(list) => (list, None),
                Err(e) => {
                    log::error!("Saved tasks could not be parsed: {e}");
                    (TodoList::new(), Some(e))
                }
            },
            Err(e) => {
                log::error!("Saved tasks could not be read: {e}");
                (TodoList::new(), Some(TodoError::Storage(e)))
            }
        };

        Self {
            storage,
            list,
            load_error,
        }
    }

    pub fn list(&self) -> &TodoList {
        &self.list
    }

    pub fn load_error(&self) -> Option<&TodoError> {
        self.load_error.as_ref()
    }

    fn persist(&mut self) {
        let result = self
            .list
            .to_json()
            .and_then(|json| {
                self.storage
                    .set_item(TODOS_KEY, &json)
                    .map_err(TodoError::from)
            });
        if let Err(e) = result {
            log::warn!("Could not save tasks: {e}");
        }
    }

    pub fn add(
        &mut self,
        text: &str,
        due_date: Option<NaiveDate>,
        category: Option<TodoCategory>,
        now_millis: i64,
    ) -> Result<TodoItem, TodoError> {
        let item = self.list.add(text, due_date, category, now_millis)?.clone();
        self.persist();
        Ok(item)
    }

    pub fn toggle(&mut self, id: &str) -> Result<TodoItem, TodoError> {
        let item = self.list.toggle(id)?.clone();
        self.persist();
        Ok(item)
    }

    pub fn delete(&mut self, id: &str) -> Result<TodoItem, TodoError> {
        let item = self.list.delete(id)?;
        self.persist();
        Ok(item)
    }

    pub fn clear_completed(&mut self) -> usize {
        let removed = self.list.clear_completed();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
