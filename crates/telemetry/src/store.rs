//! Thread-safe, bounded event store with progress consolidation.

use crate::model::{LogEvent, Stage};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 2000;

/// The shared activity timeline.
///
/// All mutations run under one mutex covering the whole
/// check-consolidate-or-append sequence, so concurrent agent executions
/// can write freely. `tail`/`dump` take snapshots under the same lock and
/// never observe a half-applied write.
pub struct LogStore {
    inner: Mutex<Inner>,
}

struct Inner {
    capacity: usize,
    events: VecDeque<LogEvent>,
    /// Per-agent index of the open `process` entry, kept in lockstep with
    /// `events` across FIFO eviction.
    buffers: HashMap<String, usize>,
    /// Last issued timestamp, for per-store monotonicity.
    last_stamp: DateTime<Utc>,
}

impl Inner {
    /// Issue a timestamp that never goes backwards within this store.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = if now > self.last_stamp {
            now
        } else {
            self.last_stamp + TimeDelta::microseconds(1)
        };
        self.last_stamp = stamp;
        stamp
    }

    /// Append an event, evicting the oldest entry once full.
    fn push(&mut self, event: LogEvent) {
        if self.capacity > 0 && self.events.len() == self.capacity {
            self.events.pop_front();
            // An evicted open buffer is gone; surviving indices shift left.
            self.buffers.retain(|_, idx| *idx != 0);
            for idx in self.buffers.values_mut() {
                *idx -= 1;
            }
        }
        self.events.push_back(event);
    }
}

impl LogStore {
    /// Create a store holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                buffers: HashMap::new(),
                last_stamp: DateTime::<Utc>::MIN_UTC,
            }),
        }
    }

    /// Record an event, returning a snapshot of the stored entry.
    ///
    /// Payload-less `process` events are consolidated: while an agent's
    /// process buffer is open, each new notice is space-joined onto the
    /// buffered entry and its timestamp refreshed in place. Any other
    /// stage, or any payload-carrying event, closes that agent's buffer
    /// and is appended as a fresh entry.
    pub fn add(
        &self,
        agent: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> LogEvent {
        let agent = agent.into();
        let message = message.into().trim().to_string();
        let mut inner = self.inner.lock().unwrap();
        let timestamp = inner.next_stamp();

        if stage == Stage::Process && payload.is_none() {
            if let Some(&idx) = inner.buffers.get(&agent) {
                let event = &mut inner.events[idx];
                if !message.is_empty() {
                    if !event.message.is_empty() {
                        event.message.push(' ');
                    }
                    event.message.push_str(&message);
                }
                event.timestamp = timestamp;
                return event.clone();
            }

            let event = LogEvent {
                timestamp,
                agent: agent.clone(),
                stage,
                message,
                payload: None,
            };
            inner.push(event.clone());
            let idx = inner.events.len() - 1;
            inner.buffers.insert(agent, idx);
            return event;
        }

        // Anything non-bufferable closes the agent's open process buffer.
        inner.buffers.remove(&agent);
        let event = LogEvent {
            timestamp,
            agent,
            stage,
            message,
            payload,
        };
        inner.push(event.clone());
        event
    }

    /// The last `min(n, len)` events in insertion order.
    pub fn tail(&self, n: usize) -> Vec<LogEvent> {
        let inner = self.inner.lock().unwrap();
        let skip = inner.events.len().saturating_sub(n);
        inner.events.iter().skip(skip).cloned().collect()
    }

    /// A snapshot of the full timeline in insertion order.
    pub fn dump(&self) -> Vec<LogEvent> {
        let inner = self.inner.lock().unwrap();
        inner.events.iter().cloned().collect()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    /// Whether the timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries and open buffers.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.clear();
        inner.buffers.clear();
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
