//! Test doubles shared across unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::events::CanonicalEvent;
use crate::store::{EventAppender, StateReader, StoreError};
use crate::types::{PartitionKey, StreamName};

/// An in-memory stand-in for the external event store.
///
/// Records every append, serves canned projection state, and can be primed
/// with failures to exercise the retry and error paths. Cloning shares the
/// underlying state, so a single store can be handed to the orchestrator as
/// both appender and reader.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    states: Mutex<HashMap<(&'static str, String), serde_json::Value>>,
    /// (projection, partition, state, remaining empty reads) — the state
    /// becomes visible only after the countdown reaches zero, simulating
    /// projection lag.
    delayed: Mutex<Vec<(&'static str, String, serde_json::Value, u32)>>,
    appends: Mutex<Vec<(StreamName, Vec<CanonicalEvent>)>>,
    append_failures: Mutex<VecDeque<StoreError>>,
    read_failures: Mutex<VecDeque<StoreError>>,
    read_count: Mutex<u32>,
}

impl InMemoryStore {
    /// Seeds materialized state for a projection partition.
    pub fn insert_state(
        &self,
        projection: &'static str,
        partition: &PartitionKey,
        state: serde_json::Value,
    ) {
        self.inner
            .states
            .lock()
            .unwrap()
            .insert((projection, partition.as_str().to_string()), state);
    }

    /// Seeds state that only materializes after `empty_reads` queries.
    pub fn materialize_after_reads(
        &self,
        projection: &'static str,
        partition: &PartitionKey,
        state: serde_json::Value,
        empty_reads: u32,
    ) {
        self.inner.delayed.lock().unwrap().push((
            projection,
            partition.as_str().to_string(),
            state,
            empty_reads,
        ));
    }

    /// Queues an error for the next append call; queued errors are consumed
    /// in order before appends start succeeding again.
    pub fn fail_next_append(&self, error: StoreError) {
        self.inner.append_failures.lock().unwrap().push_back(error);
    }

    /// Queues an error for the next read call.
    pub fn fail_next_read(&self, error: StoreError) {
        self.inner.read_failures.lock().unwrap().push_back(error);
    }

    /// Every batch appended so far, in order.
    pub fn appends(&self) -> Vec<(StreamName, Vec<CanonicalEvent>)> {
        self.inner.appends.lock().unwrap().clone()
    }

    /// How many reads have been served (including failed ones).
    pub fn read_count(&self) -> u32 {
        *self.inner.read_count.lock().unwrap()
    }
}

impl EventAppender for InMemoryStore {
    async fn append(
        &self,
        stream: &StreamName,
        events: &[CanonicalEvent],
    ) -> Result<(), StoreError> {
        if let Some(error) = self.inner.append_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.inner
            .appends
            .lock()
            .unwrap()
            .push((stream.clone(), events.to_vec()));
        Ok(())
    }
}

impl StateReader for InMemoryStore {
    async fn get_state(
        &self,
        projection: &'static str,
        partition: &PartitionKey,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        *self.inner.read_count.lock().unwrap() += 1;

        if let Some(error) = self.inner.read_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let key = (projection, partition.as_str().to_string());

        // Tick down any delayed state for this partition; promote it once its
        // countdown is spent.
        {
            let mut delayed = self.inner.delayed.lock().unwrap();
            if let Some(pos) = delayed
                .iter()
                .position(|(p, part, _, _)| *p == key.0 && *part == key.1)
            {
                if delayed[pos].3 == 0 {
                    let (_, _, state, _) = delayed.remove(pos);
                    self.inner
                        .states
                        .lock()
                        .unwrap()
                        .insert(key.clone(), state);
                } else {
                    delayed[pos].3 -= 1;
                    return Ok(None);
                }
            }
        }

        Ok(self.inner.states.lock().unwrap().get(&key).cloned())
    }
}
