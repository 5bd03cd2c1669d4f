//! Per-object property oscillators.
//!
//! An oscillator drives one numeric property of one object with a sine wave
//! around a base value snapshotted when the oscillator is created. The engine
//! owns no timer: the host calls [`OscillatorEngine::tick`] once per render
//! frame with the current scene time, and each enabled descriptor performs
//! exactly one write through the scene API.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fmt;

use serde::Serialize;

use crate::property_path::{PathError, PropertyPath};
use crate::scene::SceneApi;

/// One periodic mutation descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Oscillator {
    pub id: String,
    pub enabled: bool,
    #[serde(rename = "property")]
    pub path_raw: String,
    #[serde(skip_serializing)]
    pub path: PropertyPath,
    pub frequency: f32,
    pub amplitude: f32,
    pub offset: f32,
    /// Snapshotted at creation, never recomputed.
    pub base_value: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscillatorError {
    /// The path's root bucket is not animatable.
    BadPath(PathError),
    /// The path does not resolve to a numeric leaf on this object.
    InvalidTarget { key: String, path: String },
}

impl fmt::Display for OscillatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscillatorError::BadPath(err) => {
                write!(f, "Cannot oscillate: {err}")
            }
            OscillatorError::InvalidTarget { key, path } => {
                write!(f, "Property '{path}' not found or not a number on {key}")
            }
        }
    }
}

impl std::error::Error for OscillatorError {}

/// Outcome of a `remove` request, so the caller can pick the right console
/// entry kind (a no-op stop is an info notice, not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    RemovedOne,
    RemovedAll(usize),
    NoMatch,
}

/// All oscillator descriptors, bucketed by object key.
#[derive(Default)]
pub struct OscillatorEngine {
    by_object: HashMap<String, Vec<Oscillator>>,
    next_serial: u64,
}

impl OscillatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a descriptor for `(key, path)`, snapshotting the current value
    /// as the base. A prior descriptor on the same property is replaced.
    pub fn add(
        &mut self,
        api: &dyn SceneApi,
        key: &str,
        path_raw: &str,
        frequency: f32,
        amplitude: f32,
        offset: f32,
    ) -> Result<&Oscillator, OscillatorError> {
        let path = PropertyPath::parse(path_raw).map_err(OscillatorError::BadPath)?;
        let base_value = api
            .read_property(key, &path)
            .ok_or_else(|| OscillatorError::InvalidTarget {
                key: key.to_string(),
                path: path_raw.to_string(),
            })?;

        self.next_serial += 1;
        let descriptor = Oscillator {
            id: format!("{path_raw}-{}", self.next_serial),
            enabled: true,
            path_raw: path_raw.to_string(),
            path,
            frequency,
            amplitude,
            offset,
            base_value,
        };

        let list = self.by_object.entry(key.to_string()).or_default();
        list.retain(|o| o.path_raw != path_raw);
        list.push(descriptor);
        Ok(list.last().expect("descriptor just pushed"))
    }

    /// Remove one descriptor by property path, or every descriptor for the
    /// object when `target` is `"all"`.
    pub fn remove(&mut self, key: &str, target: &str) -> RemoveOutcome {
        if target == "all" {
            match self.by_object.remove(key) {
                Some(list) if !list.is_empty() => RemoveOutcome::RemovedAll(list.len()),
                _ => RemoveOutcome::NoMatch,
            }
        } else {
            let Some(list) = self.by_object.get_mut(key) else {
                return RemoveOutcome::NoMatch;
            };
            let before = list.len();
            list.retain(|o| o.path_raw != target);
            if list.len() < before {
                RemoveOutcome::RemovedOne
            } else {
                RemoveOutcome::NoMatch
            }
        }
    }

    /// Drop every descriptor belonging to `key`. Called on object deletion.
    pub fn purge(&mut self, key: &str) {
        self.by_object.remove(key);
    }

    /// Advance every enabled descriptor to scene time `t`:
    /// `value = base + amplitude * sin(2π·frequency·t + offset)`,
    /// one write per descriptor. Disabled descriptors are retained but
    /// skipped.
    pub fn tick(&self, t: f32, api: &dyn SceneApi) {
        for (key, list) in &self.by_object {
            for descriptor in list.iter().filter(|o| o.enabled) {
                let value = descriptor.base_value
                    + descriptor.amplitude * (TAU * descriptor.frequency * t + descriptor.offset).sin();
                api.write_property(key, &descriptor.path, value);
            }
        }
    }

    /// Enable or disable one descriptor in place.
    pub fn set_enabled(&mut self, key: &str, path_raw: &str, enabled: bool) -> bool {
        if let Some(list) = self.by_object.get_mut(key) {
            if let Some(descriptor) = list.iter_mut().find(|o| o.path_raw == path_raw) {
                descriptor.enabled = enabled;
                return true;
            }
        }
        false
    }

    pub fn oscillators(&self, key: &str) -> &[Oscillator] {
        self.by_object.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.by_object.values().map(Vec::len).sum()
    }
}
