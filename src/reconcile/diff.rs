use crate::device::{Device, EntityKey, FieldSet, Snapshot};
use crate::reconcile::identity::IdentityMap;
use tracing::{debug, info};

/// Fields that changed for one device in one reconciliation pass
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    pub index: usize,
    pub key: EntityKey,
    pub fields: FieldSet,
    /// False when the device was already mid-animation
    pub newly_changed: bool,
}

/// How a snapshot was merged into the retained state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeKind {
    /// First snapshot seen; nothing to compare against
    Initial,
    /// Same device count; compared index by index
    Positional,
    /// Device count changed; incoming replaced the retained state wholesale
    Replaced,
}

/// Result of one reconciliation pass
#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub kind: MergeKind,
    pub records: Vec<ChangeRecord>,
}

impl Reconciliation {
    /// Keys of devices that start a new highlight window
    pub fn newly_changed(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.records
            .iter()
            .filter(|r| r.newly_changed)
            .map(|r| r.key)
    }

    pub fn is_quiet(&self) -> bool {
        self.records.is_empty()
    }
}

/// Compares each incoming snapshot with the retained one and keeps identities stable
#[derive(Debug, Default)]
pub struct DiffEngine {
    retained: Option<Vec<Device>>,
    identities: IdentityMap,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile `incoming` against the retained snapshot.
    ///
    /// Every change record is computed before this returns, so callers see the
    /// whole pass at once. `is_animating` tells whether a device already has
    /// a highlight window in flight.
    pub fn reconcile<F>(&mut self, incoming: Snapshot, is_animating: F) -> Reconciliation
    where
        F: Fn(EntityKey) -> bool,
    {
        let previous = match self.retained.take() {
            Some(previous) => previous,
            None => {
                let merged = self.replace(incoming);
                info!(devices = merged.len(), "Initial snapshot retained");
                self.retained = Some(merged);
                return Reconciliation {
                    kind: MergeKind::Initial,
                    records: Vec::new(),
                };
            }
        };

        if previous.len() != incoming.len() {
            info!(
                previous = previous.len(),
                incoming = incoming.len(),
                "Device count changed, replacing retained snapshot"
            );
            let merged = self.replace(incoming);
            self.retained = Some(merged);
            return Reconciliation {
                kind: MergeKind::Replaced,
                records: Vec::new(),
            };
        }

        let mut records = Vec::new();
        let mut merged = Vec::with_capacity(previous.len());

        for (index, (old, reading)) in previous.into_iter().zip(incoming.devices).enumerate() {
            let fields = old.reading.changed_fields(&reading);
            if !fields.is_empty() {
                let newly_changed = !is_animating(old.key);
                debug!(
                    key = %old.key,
                    index = index,
                    fields = ?fields,
                    newly_changed = newly_changed,
                    "Device changed"
                );
                records.push(ChangeRecord {
                    index,
                    key: old.key,
                    fields,
                    newly_changed,
                });
            }
            self.identities.bind(&reading.name, old.key);
            merged.push(Device {
                key: old.key,
                reading,
            });
        }

        self.retained = Some(merged);
        Reconciliation {
            kind: MergeKind::Positional,
            records,
        }
    }

    /// Retained snapshot with identity keys
    pub fn retained(&self) -> &[Device] {
        self.retained.as_deref().unwrap_or(&[])
    }

    /// Whether any snapshot has been seen yet
    pub fn is_initialized(&self) -> bool {
        self.retained.is_some()
    }

    fn replace(&mut self, incoming: Snapshot) -> Vec<Device> {
        let keys = self
            .identities
            .assign(incoming.devices.iter().map(|d| d.name.as_str()));
        keys.into_iter()
            .zip(incoming.devices)
            .map(|(key, reading)| Device { key, reading })
            .collect()
    }
}
