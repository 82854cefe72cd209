//! Named, clamped tuning parameters with change notification
//!
//! Replaces ad-hoc path lookups with a fixed table. Observers get a channel
//! receiver and see every effective change in order.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::WaveError;

/// One registered parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

/// Sent to subscribers when a value actually changes
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub name: &'static str,
    pub value: f32,
}

#[derive(Debug, Default)]
pub struct ParamRegistry {
    entries: Vec<ParamSpec>,
    subscribers: Vec<Sender<ParamChange>>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Re-registering a name replaces its range and value.
    pub fn register(&mut self, name: &'static str, min: f32, max: f32, value: f32) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let spec = ParamSpec {
            name,
            min,
            max,
            value: value.clamp(min, max),
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = spec,
            None => self.entries.push(spec),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.spec(name).map(|e| e.value)
    }

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.entries.iter()
    }

    /// Set a value, clamped to its range. Returns the stored value.
    pub fn set(&mut self, name: &str, value: f32) -> Result<f32, WaveError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| WaveError::UnknownParam(name.to_string()))?;
        let clamped = value.clamp(entry.min, entry.max);
        if clamped != entry.value {
            entry.value = clamped;
            let change = ParamChange {
                name: entry.name,
                value: clamped,
            };
            self.notify(change);
        }
        Ok(clamped)
    }

    /// New receiver for all later changes
    pub fn subscribe(&mut self) -> Receiver<ParamChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self, change: ParamChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParamRegistry {
        let mut reg = ParamRegistry::new();
        reg.register("wave_speed", 0.0, 1.0, 0.6);
        reg.register("damping", 0.9, 1.0, 1.0);
        reg
    }

    #[test]
    fn test_set_clamps() {
        let mut reg = registry();
        assert_eq!(reg.set("wave_speed", 2.0).unwrap(), 1.0);
        assert_eq!(reg.set("damping", 0.1).unwrap(), 0.9);
        assert_eq!(reg.get("wave_speed"), Some(1.0));
    }

    #[test]
    fn test_unknown_name() {
        let mut reg = registry();
        assert!(matches!(
            reg.set("nope", 1.0),
            Err(WaveError::UnknownParam(name)) if name == "nope"
        ));
        assert_eq!(reg.get("nope"), None);
    }

    #[test]
    fn test_subscribers_see_changes_only() {
        let mut reg = registry();
        let rx = reg.subscribe();
        reg.set("wave_speed", 0.6).unwrap();
        reg.set("wave_speed", 0.3).unwrap();
        let changes: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![ParamChange {
                name: "wave_speed",
                value: 0.3
            }]
        );
    }

    #[test]
    fn test_dropped_receivers_pruned() {
        let mut reg = registry();
        let keep = reg.subscribe();
        drop(reg.subscribe());
        assert_eq!(reg.subscriber_count(), 2);
        reg.set("damping", 0.95).unwrap();
        assert_eq!(reg.subscriber_count(), 1);
        assert_eq!(keep.try_iter().count(), 1);
    }

    #[test]
    fn test_register_replaces() {
        let mut reg = registry();
        reg.register("wave_speed", 0.0, 0.5, 0.9);
        assert_eq!(reg.get("wave_speed"), Some(0.5));
        assert_eq!(reg.iter().count(), 2);
    }
}
