//! Presets and preset change events.

use serde::{Deserialize, Serialize};

/// A named snapshot of a plugin's parameter state.
///
/// A negative `number` marks a preset that has not been persisted yet; the
/// instance assigns a non-negative number when it saves one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preset {
    pub number: i64,
    pub name: String,
}

impl Preset {
    pub fn new(number: i64, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }

    /// Preset to hand to a save request.
    pub fn unsaved(name: impl Into<String>) -> Self {
        Self::new(-1, name)
    }

    pub fn is_persisted(&self) -> bool {
        self.number >= 0
    }
}

/// Why the user preset list changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetChangeKind {
    Save,
    Delete,
    /// Changed outside this session, e.g. by another process sharing the store.
    External,
}

/// A locally-initiated preset action awaiting its change signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum PendingChange {
    #[default]
    None = 0,
    Save = 1,
    Delete = 2,
}

impl PendingChange {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PendingChange::Save,
            2 => PendingChange::Delete,
            _ => PendingChange::None,
        }
    }

    /// Change kind to report for a signal arriving while this is pending.
    pub fn classify(self) -> PresetChangeKind {
        match self {
            PendingChange::Save => PresetChangeKind::Save,
            PendingChange::Delete => PresetChangeKind::Delete,
            PendingChange::None => PresetChangeKind::External,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetChangeEvent {
    pub kind: PresetChangeKind,
    /// User presets after the change, newest first.
    pub presets: Vec<Preset>,
}
