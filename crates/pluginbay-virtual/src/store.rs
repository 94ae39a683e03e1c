//! User preset storage shared between plugin instances.
//!
//! Every instance of the same plugin sees the same store, and every change
//! signals all of them, whichever instance (or process, for file-backed
//! stores) made it.

use parking_lot::Mutex;
use pluginbay_core::{Preset, PresetOperation, PresetSignal, Result, SessionError, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    presets: Vec<Preset>,
}

pub struct PresetStore {
    presets: Mutex<Vec<Preset>>,
    path: Option<PathBuf>,
    subscribers: Mutex<Vec<(SubscriptionId, Arc<dyn Fn() + Send + Sync>)>>,
    next_subscription: AtomicU64,
}

impl PresetStore {
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::with_presets(Vec::new(), None))
    }

    /// Open a JSON-backed store, creating it on first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Arc<Self>> {
        let path = path.into();
        let presets = read_store_file(&path)?;
        tracing::debug!(
            "Opened preset store {} ({} preset(s))",
            path.display(),
            presets.len()
        );
        Ok(Arc::new(Self::with_presets(presets, Some(path))))
    }

    fn with_presets(presets: Vec<Preset>, path: Option<PathBuf>) -> Self {
        Self {
            presets: Mutex::new(presets),
            path,
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stored presets, oldest first.
    pub fn presets(&self) -> Vec<Preset> {
        self.presets.lock().clone()
    }

    /// Store `preset`. An unsaved preset gets the next free number and must
    /// not reuse an existing name; a persisted one replaces the entry with
    /// the same number. Nothing changes if the write fails.
    pub fn save(&self, preset: &Preset) -> Result<Preset> {
        let mut presets = self.presets.lock();
        let mut updated = presets.clone();

        let saved = if preset.is_persisted() {
            let slot = updated
                .iter_mut()
                .find(|p| p.number == preset.number)
                .ok_or_else(|| {
                    SessionError::persistence(
                        PresetOperation::Save,
                        format!("no preset numbered {}", preset.number),
                    )
                })?;
            *slot = preset.clone();
            preset.clone()
        } else {
            if updated.iter().any(|p| p.name == preset.name) {
                return Err(SessionError::persistence(
                    PresetOperation::Save,
                    format!("a preset named '{}' already exists", preset.name),
                ));
            }
            let number = updated.iter().map(|p| p.number + 1).max().unwrap_or(0);
            let saved = Preset::new(number, preset.name.clone());
            updated.push(saved.clone());
            saved
        };

        self.write(&updated, PresetOperation::Save)?;
        *presets = updated;
        drop(presets);

        self.notify();
        Ok(saved)
    }

    pub fn delete(&self, preset: &Preset) -> Result<()> {
        let mut presets = self.presets.lock();
        let mut updated = presets.clone();
        updated.retain(|p| p.number != preset.number);
        if updated.len() == presets.len() {
            return Err(SessionError::persistence(
                PresetOperation::Delete,
                format!("no preset numbered {}", preset.number),
            ));
        }

        self.write(&updated, PresetOperation::Delete)?;
        *presets = updated;
        drop(presets);

        self.notify();
        Ok(())
    }

    /// Re-read the backing file and signal subscribers if another process
    /// changed it. Returns whether anything changed.
    pub fn reload(&self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let on_disk = read_store_file(path)?;
        let changed = {
            let mut presets = self.presets.lock();
            if *presets == on_disk {
                false
            } else {
                *presets = on_disk;
                true
            }
        };

        if changed {
            tracing::info!("Preset store {} changed externally", path.display());
            self.notify();
        }
        Ok(changed)
    }

    pub fn subscribe(&self, signal: PresetSignal) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::from(signal)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(existing, _)| *existing != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn notify(&self) {
        let subscribers: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, signal)| Arc::clone(signal))
            .collect();
        for signal in subscribers {
            signal();
        }
    }

    fn write(&self, presets: &[Preset], operation: PresetOperation) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = StoreFile {
            presets: presets.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SessionError::persistence(operation, e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| SessionError::persistence(operation, e.to_string()))
    }
}

fn read_store_file(path: &Path) -> Result<Vec<Preset>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(path)?;
    let file: StoreFile = serde_json::from_str(&json).map_err(|e| {
        SessionError::persistence(
            PresetOperation::Load,
            format!("corrupt preset store {}: {}", path.display(), e),
        )
    })?;
    Ok(file.presets)
}
