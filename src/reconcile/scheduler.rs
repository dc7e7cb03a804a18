use crate::device::{EntityKey, FieldSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Highlight window timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// How long changed fields stay marked
    #[serde(default = "default_field_highlight_ms")]
    pub field_highlight_ms: u64,
    /// Extra delay after the field marks clear before the device leaves the updating set
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u64,
}

fn default_field_highlight_ms() -> u64 {
    1500
}

fn default_release_delay_ms() -> u64 {
    100
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            field_highlight_ms: default_field_highlight_ms(),
            release_delay_ms: default_release_delay_ms(),
        }
    }
}

/// Phase of an open highlight window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPhase {
    Highlighted,
    FieldsCleared,
}

/// Deadline fired by the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    FieldsCleared(EntityKey),
    Released(EntityKey),
}

#[derive(Debug)]
struct HighlightWindow {
    started_at: Instant,
    /// Armed until the field marks are cleared
    fields_clear_at: Option<Instant>,
    release_at: Instant,
    fields: FieldSet,
}

impl HighlightWindow {
    fn phase(&self) -> HighlightPhase {
        if self.fields_clear_at.is_some() {
            HighlightPhase::Highlighted
        } else {
            HighlightPhase::FieldsCleared
        }
    }

    fn armed_timers(&self) -> usize {
        1 + usize::from(self.fields_clear_at.is_some())
    }
}

/// Per-device highlight windows with their pending deadlines.
///
/// A device absent from the map is idle. Every deadline lives inside its
/// window, so removing a window cancels its timers.
#[derive(Debug)]
pub struct HighlightScheduler {
    windows: BTreeMap<EntityKey, HighlightWindow>,
    field_duration: Duration,
    release_delay: Duration,
}

impl HighlightScheduler {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            windows: BTreeMap::new(),
            field_duration: Duration::from_millis(config.field_highlight_ms),
            release_delay: Duration::from_millis(config.release_delay_ms),
        }
    }

    /// Report a change for `key`.
    ///
    /// Opens a window for an idle device and returns true. A device whose
    /// window is already open keeps its original deadlines; while its field
    /// marks are live the new fields join them.
    pub fn on_change(&mut self, key: EntityKey, fields: &FieldSet, now: Instant) -> bool {
        if fields.is_empty() {
            return false;
        }

        if let Some(window) = self.windows.get_mut(&key) {
            if window.phase() == HighlightPhase::Highlighted {
                window.fields.extend(fields.iter().copied());
            }
            debug!(key = %key, "Highlight already in flight, not rescheduled");
            return false;
        }

        let fields_clear_at = now + self.field_duration;
        self.windows.insert(
            key,
            HighlightWindow {
                started_at: now,
                fields_clear_at: Some(fields_clear_at),
                release_at: fields_clear_at + self.release_delay,
                fields: fields.clone(),
            },
        );
        debug!(key = %key, fields = ?fields, "Highlight window opened");
        true
    }

    /// Process every deadline at or before `now`
    pub fn fire_due(&mut self, now: Instant) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for (key, window) in self.windows.iter_mut() {
            if let Some(at) = window.fields_clear_at {
                if at <= now {
                    window.fields_clear_at = None;
                    window.fields.clear();
                    transitions.push(Transition::FieldsCleared(*key));
                }
            }
        }

        let released: Vec<EntityKey> = self
            .windows
            .iter()
            .filter(|(_, w)| w.fields_clear_at.is_none() && w.release_at <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in released {
            self.windows.remove(&key);
            transitions.push(Transition::Released(key));
        }

        transitions
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.windows
            .values()
            .map(|w| w.fields_clear_at.unwrap_or(w.release_at))
            .min()
    }

    pub fn is_active(&self, key: EntityKey) -> bool {
        self.windows.contains_key(&key)
    }

    /// Whether the device is in the "updating" set
    pub fn is_updating(&self, key: EntityKey) -> bool {
        self.is_active(key)
    }

    pub fn phase(&self, key: EntityKey) -> Option<HighlightPhase> {
        self.windows.get(&key).map(HighlightWindow::phase)
    }

    /// Fields currently marked as changed
    pub fn highlighted(&self, key: EntityKey) -> Option<&FieldSet> {
        self.windows
            .get(&key)
            .filter(|w| w.phase() == HighlightPhase::Highlighted)
            .map(|w| &w.fields)
    }

    pub fn started_at(&self, key: EntityKey) -> Option<Instant> {
        self.windows.get(&key).map(|w| w.started_at)
    }

    /// Number of deadlines still armed for `key`
    pub fn pending_timers(&self, key: EntityKey) -> usize {
        self.windows.get(&key).map_or(0, HighlightWindow::armed_timers)
    }

    pub fn active_count(&self) -> usize {
        self.windows.len()
    }

    /// Cancel the window of every device not accepted by `keep`
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(EntityKey) -> bool,
    {
        let before = self.windows.len();
        self.windows.retain(|key, _| keep(*key));
        before - self.windows.len()
    }

    /// Cancel all outstanding timers
    pub fn teardown(&mut self) -> usize {
        let cancelled = self.windows.len();
        self.windows.clear();
        cancelled
    }
}
