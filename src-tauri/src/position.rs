//! Remembers where the user last left the floating reminder.
//!
//! Positions are stored as two numeric preferences. No validation happens
//! here: coordinates from a display that is no longer attached are handed
//! back as-is and the caller re-clamps them to the current screen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::reminder::geometry::Point;

pub const X_KEY: &str = "floatingWindowX";
pub const Y_KEY: &str = "floatingWindowY";

/// Minimal key-value surface over the platform preference store
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn delete(&self, key: &str);
    /// Flush to durable storage
    fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<R: tauri::Runtime> PreferenceStore for tauri_plugin_store::Store<R> {
    fn get(&self, key: &str) -> Option<Value> {
        tauri_plugin_store::Store::get(self, key)
    }

    fn set(&self, key: &str, value: Value) {
        tauri_plugin_store::Store::set(self, key, value)
    }

    fn delete(&self, key: &str) {
        tauri_plugin_store::Store::delete(self, key);
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.save()?;
        Ok(())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }

    fn flush(&self) -> anyhow::Result<()> {
        (**self).flush()
    }
}

/// In-memory preferences, used when the durable store is unavailable and in tests
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, Value>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}

pub struct PositionManager<P> {
    prefs: P,
}

impl<P: PreferenceStore> PositionManager<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    pub fn save_position(&self, origin: Point) {
        self.prefs.set(X_KEY, Value::from(origin.x));
        self.prefs.set(Y_KEY, Value::from(origin.y));
        if let Err(e) = self.prefs.flush() {
            tracing::warn!(error = %e, "Failed to persist window position");
        }
    }

    /// Both coordinates must be present
    pub fn load_position(&self) -> Option<Point> {
        let x = self.prefs.get(X_KEY)?.as_f64()?;
        let y = self.prefs.get(Y_KEY)?.as_f64()?;
        Some(Point::new(x, y))
    }

    pub fn clear_position(&self) {
        self.prefs.delete(X_KEY);
        self.prefs.delete(Y_KEY);
        if let Err(e) = self.prefs.flush() {
            tracing::warn!(error = %e, "Failed to persist cleared window position");
        }
    }
}
