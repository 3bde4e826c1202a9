// ── Queue registry ──

use indexmap::IndexMap;
use rbwatch_api::Record;
use tracing::debug;

use crate::model::Queue;

/// Simple queues in router order, keyed by `.id`.
#[derive(Debug, Clone, Default)]
pub struct QueueRegistry {
    queues: IndexMap<String, Queue>,
}

impl QueueRegistry {
    pub fn from_records(rows: &[Record]) -> Self {
        let queues = rows
            .iter()
            .filter_map(|row| match Queue::try_from(row) {
                Ok(queue) => Some((queue.id.clone(), queue)),
                Err(e) => {
                    debug!(error = %e, "skipping queue row");
                    None
                }
            })
            .collect();
        Self { queues }
    }

    pub fn get(&self, id: &str) -> Option<&Queue> {
        self.queues.get(id)
    }

    /// Look up by `.id` first, then by queue name.
    pub fn find(&self, identifier: &str) -> Option<&Queue> {
        self.get(identifier)
            .or_else(|| self.queues.values().find(|q| q.name == identifier))
    }

    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.get(id).map(Queue::is_enabled)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Queue> {
        self.queues.values()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
