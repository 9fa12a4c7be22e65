//! Task-scoped working memory
//!
//! Each completed task's result is recorded under its `TaskId`, so later
//! tasks read their dependencies' output by id rather than through
//! free-form string keys. Values stay opaque JSON; `get_as` gives typed
//! access where the shape is known.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::task::TaskId;

#[derive(Debug, Default)]
pub struct TaskMemory {
    entries: RwLock<BTreeMap<TaskId, Value>>,
}

impl TaskMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the value for `task`
    pub async fn record(&self, task: &TaskId, value: Value) {
        self.entries.write().await.insert(task.clone(), value);
    }

    pub async fn get(&self, task: &TaskId) -> Option<Value> {
        self.entries.read().await.get(task).cloned()
    }

    /// Deserialize the value for `task`, or `None` if absent or of another shape
    pub async fn get_as<T: DeserializeOwned>(&self, task: &TaskId) -> Option<T> {
        let value = self.get(task).await?;
        serde_json::from_value(value).ok()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Every entry as a JSON object keyed by task id
    pub async fn snapshot(&self) -> Value {
        let entries = self.entries.read().await;
        Value::Object(
            entries
                .iter()
                .map(|(id, v)| (id.to_string(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}
