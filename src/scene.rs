//! Scene object state and the mutation contract.
//!
//! The engine never touches renderer state directly. Everything a verb,
//! script, or oscillator does to an object goes through [`SceneApi`], a
//! narrow read/write contract over transforms and type-specific numeric
//! parameters. Writes are synchronous and last-writer-wins per key; there are
//! no cross-key transactions.
//!
//! [`MemoryScene`] is the in-process implementation backing the REPL and the
//! test suite. A host embedding the engine in a real viewport supplies its
//! own implementation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::console::{ConsoleHandle, EntryKind};
use crate::property_path::{Bucket, PropertyPath};

/// Transform component for scene objects.
///
/// Rotation is a quaternion, matching the exchange shape `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Kinds of primitive geometry objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Torus,
    Plane,
    Dodecahedron,
    Icosahedron,
    Octahedron,
    Tetrahedron,
    TorusKnot,
    Point,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Box => "box",
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Torus => "torus",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Dodecahedron => "dodecahedron",
            PrimitiveKind::Icosahedron => "icosahedron",
            PrimitiveKind::Octahedron => "octahedron",
            PrimitiveKind::Tetrahedron => "tetrahedron",
            PrimitiveKind::TorusKnot => "torusKnot",
            PrimitiveKind::Point => "point",
        }
    }

    /// Default geometry parameters for a freshly created primitive.
    pub fn default_parameters(&self) -> BTreeMap<String, f32> {
        let fields: &[(&str, f32)] = match self {
            PrimitiveKind::Box => &[("width", 10.0), ("height", 10.0), ("depth", 10.0)],
            PrimitiveKind::Sphere => &[
                ("radius", 5.0),
                ("widthSegments", 32.0),
                ("heightSegments", 16.0),
            ],
            PrimitiveKind::Cylinder => &[
                ("radiusTop", 5.0),
                ("radiusBottom", 5.0),
                ("height", 10.0),
                ("radialSegments", 32.0),
            ],
            PrimitiveKind::Cone => &[("radius", 5.0), ("height", 10.0), ("radialSegments", 32.0)],
            PrimitiveKind::Torus => &[
                ("radius", 10.0),
                ("tube", 3.0),
                ("radialSegments", 16.0),
                ("tubularSegments", 100.0),
            ],
            PrimitiveKind::Plane => &[("width", 10.0), ("height", 10.0)],
            PrimitiveKind::Dodecahedron
            | PrimitiveKind::Icosahedron
            | PrimitiveKind::Octahedron
            | PrimitiveKind::Tetrahedron => &[("radius", 10.0), ("detail", 0.0)],
            PrimitiveKind::TorusKnot => &[
                ("radius", 10.0),
                ("tube", 3.0),
                ("tubularSegments", 100.0),
                ("radialSegments", 16.0),
                ("p", 2.0),
                ("q", 3.0),
            ],
            PrimitiveKind::Point => &[],
        };
        fields.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

/// The discriminated union of scene object sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SceneObject {
    /// A loaded binary model, referenced by filename.
    Model { filename: String },
    /// A parametric primitive.
    Primitive { kind: PrimitiveKind },
    /// An extruded font glyph.
    Glyph { glyph: char },
}

impl SceneObject {
    pub fn kind_str(&self) -> &'static str {
        match self {
            SceneObject::Model { .. } => "model",
            SceneObject::Primitive { .. } => "primitive",
            SceneObject::Glyph { .. } => "glyph",
        }
    }
}

/// Flat numeric field table used by the non-transform buckets.
pub type FieldMap = BTreeMap<String, f32>;

/// A read-only snapshot of one object, handed to verb callables and scripts.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectSnapshot {
    pub key: String,
    pub object: SceneObject,
    pub transform: Transform,
    pub modifiers: FieldMap,
    pub parameters: FieldMap,
    pub settings: FieldMap,
}

/// Default extrude settings applied to new glyph objects.
pub fn default_glyph_settings() -> FieldMap {
    [
        ("depth".to_string(), 8.0),
        ("bevelThickness".to_string(), 1.0),
        ("bevelSize".to_string(), 0.5),
    ]
    .into_iter()
    .collect()
}

/// The narrow contract through which verbs, scripts, and oscillators affect
/// object state.
pub trait SceneApi {
    /// Full snapshot of one object, or `None` if the key is unknown.
    fn get_object(&self, key: &str) -> Option<ObjectSnapshot>;

    /// Apply `updater` to the current transform (identity default if the
    /// object has none yet) and commit the result.
    fn update_transform(&self, key: &str, updater: &dyn Fn(Transform) -> Transform);

    /// Same pattern for the primitive-specific numeric parameter fields.
    fn update_parameters(&self, key: &str, updater: &dyn Fn(FieldMap) -> FieldMap);

    /// Schedule a one-shot transform update `delay` seconds from the current
    /// scene time. Used for transient pulse effects; once queued it cannot be
    /// retracted.
    fn update_transform_after(
        &self,
        key: &str,
        delay: f32,
        updater: Box<dyn Fn(Transform) -> Transform>,
    );

    /// Read a numeric leaf through the shared property-path lens.
    /// `None` if the object, path, or leaf does not resolve to a number.
    fn read_property(&self, key: &str, path: &PropertyPath) -> Option<f32>;

    /// Write a numeric leaf through the shared lens. Returns false if the
    /// path does not resolve on this object.
    fn write_property(&self, key: &str, path: &PropertyPath, value: f32) -> bool;

    /// Append an output-kind entry to the console transcript.
    fn log(&self, message: &str);
}

/// Read one numeric field out of a transform by path segments.
fn transform_field(t: &Transform, segments: &[String]) -> Option<f32> {
    let [vector, axis] = segments else { return None };
    let value = match (vector.as_str(), axis.as_str()) {
        ("position", "x") => t.position.x,
        ("position", "y") => t.position.y,
        ("position", "z") => t.position.z,
        ("rotation", "x") => t.rotation.x,
        ("rotation", "y") => t.rotation.y,
        ("rotation", "z") => t.rotation.z,
        ("rotation", "w") => t.rotation.w,
        ("scale", "x") => t.scale.x,
        ("scale", "y") => t.scale.y,
        ("scale", "z") => t.scale.z,
        _ => return None,
    };
    Some(value)
}

/// Write one numeric field of a transform by path segments.
fn set_transform_field(t: &mut Transform, segments: &[String], value: f32) -> bool {
    let [vector, axis] = segments else {
        return false;
    };
    let slot = match (vector.as_str(), axis.as_str()) {
        ("position", "x") => &mut t.position.x,
        ("position", "y") => &mut t.position.y,
        ("position", "z") => &mut t.position.z,
        ("rotation", "x") => &mut t.rotation.x,
        ("rotation", "y") => &mut t.rotation.y,
        ("rotation", "z") => &mut t.rotation.z,
        ("rotation", "w") => &mut t.rotation.w,
        ("scale", "x") => &mut t.scale.x,
        ("scale", "y") => &mut t.scale.y,
        ("scale", "z") => &mut t.scale.z,
        _ => return false,
    };
    *slot = value;
    true
}

/// A transform update queued for a later scene time.
struct DeferredMutation {
    due: f32,
    key: String,
    updater: Box<dyn Fn(Transform) -> Transform>,
}

impl fmt::Debug for DeferredMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredMutation")
            .field("due", &self.due)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SceneState {
    objects: BTreeMap<String, SceneObject>,
    transforms: BTreeMap<String, Transform>,
    modifiers: BTreeMap<String, FieldMap>,
    parameters: BTreeMap<String, FieldMap>,
    settings: BTreeMap<String, FieldMap>,
    deferred: Vec<DeferredMutation>,
    /// Current scene time, advanced by the host each frame.
    clock: f32,
    next_serial: u64,
}

/// In-memory scene backing the REPL and tests.
#[derive(Default)]
pub struct MemoryScene {
    state: RefCell<SceneState>,
    console: ConsoleHandle,
}

impl MemoryScene {
    pub fn new(console: ConsoleHandle) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(SceneState::default()),
            console,
        })
    }

    fn mint_key(&self, prefix: &str, tag: &str) -> String {
        let mut state = self.state.borrow_mut();
        state.next_serial += 1;
        format!("{prefix}-{tag}-{}", state.next_serial)
    }

    /// Create a primitive with its default parameter set. Returns the key.
    pub fn add_primitive(&self, kind: PrimitiveKind) -> String {
        let key = self.mint_key("primitive", kind.as_str());
        let mut state = self.state.borrow_mut();
        state.objects.insert(key.clone(), SceneObject::Primitive { kind });
        state.parameters.insert(key.clone(), kind.default_parameters());
        state.transforms.insert(key.clone(), Transform::default());
        key
    }

    pub fn add_model(&self, filename: &str) -> String {
        let key = self.mint_key("model", filename);
        let mut state = self.state.borrow_mut();
        state.objects.insert(
            key.clone(),
            SceneObject::Model {
                filename: filename.to_string(),
            },
        );
        state.transforms.insert(key.clone(), Transform::default());
        key
    }

    pub fn add_glyph(&self, glyph: char) -> String {
        let key = self.mint_key("glyph", &glyph.to_string());
        let mut state = self.state.borrow_mut();
        state.objects.insert(key.clone(), SceneObject::Glyph { glyph });
        state.settings.insert(key.clone(), default_glyph_settings());
        state.transforms.insert(key.clone(), Transform::default());
        key
    }

    /// Remove an object and every per-object record attached to it.
    /// Oscillator purging is the caller's responsibility (the engine that
    /// owns the descriptors is told separately).
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let existed = state.objects.remove(key).is_some();
        state.transforms.remove(key);
        state.modifiers.remove(key);
        state.parameters.remove(key);
        state.settings.remove(key);
        state.deferred.retain(|d| d.key != key);
        existed
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.borrow().objects.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().objects.keys().cloned().collect()
    }

    /// Replace an object's modifier table (host-side editing surface).
    pub fn set_modifiers(&self, key: &str, fields: FieldMap) {
        self.state.borrow_mut().modifiers.insert(key.to_string(), fields);
    }

    /// Advance scene time and apply every deferred mutation that has come
    /// due. Called once per host frame, after the oscillator tick.
    pub fn drain_due(&self, t: f32) {
        // Take the due entries out first; an updater must not observe a
        // half-drained queue through reentrant API calls.
        let due: Vec<DeferredMutation> = {
            let mut state = self.state.borrow_mut();
            state.clock = t;
            let mut due = Vec::new();
            let mut i = 0;
            while i < state.deferred.len() {
                if state.deferred[i].due <= t {
                    due.push(state.deferred.swap_remove(i));
                } else {
                    i += 1;
                }
            }
            due
        };
        for pending in due {
            self.update_transform(&pending.key, &*pending.updater);
        }
    }

    /// Number of pending deferred mutations (test hook).
    pub fn deferred_len(&self) -> usize {
        self.state.borrow().deferred.len()
    }

    pub fn console(&self) -> &ConsoleHandle {
        &self.console
    }
}

impl SceneApi for MemoryScene {
    fn get_object(&self, key: &str) -> Option<ObjectSnapshot> {
        let state = self.state.borrow();
        let object = state.objects.get(key)?.clone();
        Some(ObjectSnapshot {
            key: key.to_string(),
            object,
            transform: state.transforms.get(key).copied().unwrap_or_default(),
            modifiers: state.modifiers.get(key).cloned().unwrap_or_default(),
            parameters: state.parameters.get(key).cloned().unwrap_or_default(),
            settings: state.settings.get(key).cloned().unwrap_or_default(),
        })
    }

    fn update_transform(&self, key: &str, updater: &dyn Fn(Transform) -> Transform) {
        let mut state = self.state.borrow_mut();
        if !state.objects.contains_key(key) {
            return;
        }
        let current = state.transforms.get(key).copied().unwrap_or_default();
        state.transforms.insert(key.to_string(), updater(current));
    }

    fn update_parameters(&self, key: &str, updater: &dyn Fn(FieldMap) -> FieldMap) {
        let mut state = self.state.borrow_mut();
        if !state.objects.contains_key(key) {
            return;
        }
        let current = state.parameters.get(key).cloned().unwrap_or_default();
        state.parameters.insert(key.to_string(), updater(current));
    }

    fn update_transform_after(
        &self,
        key: &str,
        delay: f32,
        updater: Box<dyn Fn(Transform) -> Transform>,
    ) {
        let mut state = self.state.borrow_mut();
        let due = state.clock + delay.max(0.0);
        state.deferred.push(DeferredMutation {
            due,
            key: key.to_string(),
            updater,
        });
    }

    fn read_property(&self, key: &str, path: &PropertyPath) -> Option<f32> {
        let state = self.state.borrow();
        if !state.objects.contains_key(key) {
            return None;
        }
        match path.bucket {
            Bucket::Transform => {
                let t = state.transforms.get(key).copied().unwrap_or_default();
                transform_field(&t, &path.segments)
            }
            Bucket::Modifiers => flat_field(state.modifiers.get(key), &path.segments),
            Bucket::Parameters => flat_field(state.parameters.get(key), &path.segments),
            Bucket::Settings => flat_field(state.settings.get(key), &path.segments),
        }
    }

    fn write_property(&self, key: &str, path: &PropertyPath, value: f32) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.objects.contains_key(key) {
            return false;
        }
        match path.bucket {
            Bucket::Transform => {
                let mut t = state.transforms.get(key).copied().unwrap_or_default();
                if !set_transform_field(&mut t, &path.segments, value) {
                    return false;
                }
                state.transforms.insert(key.to_string(), t);
                true
            }
            Bucket::Modifiers => set_flat_field(state.modifiers.entry(key.to_string()), &path.segments, value),
            Bucket::Parameters => set_flat_field(state.parameters.entry(key.to_string()), &path.segments, value),
            Bucket::Settings => set_flat_field(state.settings.entry(key.to_string()), &path.segments, value),
        }
    }

    fn log(&self, message: &str) {
        self.console.push(EntryKind::Output, message);
    }
}

fn flat_field(fields: Option<&FieldMap>, segments: &[String]) -> Option<f32> {
    let [name] = segments else { return None };
    fields?.get(name).copied()
}

/// Flat-bucket writes only overwrite existing numeric leaves; a path that
/// never resolved to a number cannot be conjured by a write.
fn set_flat_field(
    entry: std::collections::btree_map::Entry<'_, String, FieldMap>,
    segments: &[String],
    value: f32,
) -> bool {
    let [name] = segments else { return false };
    match entry {
        std::collections::btree_map::Entry::Occupied(mut occupied) => {
            match occupied.get_mut().get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        }
        std::collections::btree_map::Entry::Vacant(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleHandle;

    fn scene() -> Rc<MemoryScene> {
        MemoryScene::new(ConsoleHandle::new())
    }

    #[test]
    fn test_primitive_defaults() {
        let scene = scene();
        let key = scene.add_primitive(PrimitiveKind::Sphere);
        let snapshot = scene.get_object(&key).unwrap();

        assert_eq!(snapshot.object, SceneObject::Primitive { kind: PrimitiveKind::Sphere });
        assert_eq!(snapshot.parameters.get("radius"), Some(&5.0));
        assert_eq!(snapshot.transform, Transform::default());
    }

    #[test]
    fn test_update_transform_defaults_to_identity() {
        let scene = scene();
        let key = scene.add_model("ship.glb");
        scene.update_transform(&key, &|mut t| {
            t.position.x += 4.0;
            t
        });

        let snapshot = scene.get_object(&key).unwrap();
        assert_eq!(snapshot.transform.position, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(snapshot.transform.rotation, Quat::IDENTITY);
        assert_eq!(snapshot.transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_property_lens_round_trip() {
        let scene = scene();
        let key = scene.add_primitive(PrimitiveKind::Box);

        let pos_x = PropertyPath::parse("transform.position.x").unwrap();
        assert!(scene.write_property(&key, &pos_x, 7.5));
        assert_eq!(scene.read_property(&key, &pos_x), Some(7.5));

        let width = PropertyPath::parse("parameters.width").unwrap();
        assert_eq!(scene.read_property(&key, &width), Some(10.0));
        assert!(scene.write_property(&key, &width, 12.0));
        assert_eq!(scene.read_property(&key, &width), Some(12.0));
    }

    #[test]
    fn test_lens_rejects_missing_leaf() {
        let scene = scene();
        let key = scene.add_primitive(PrimitiveKind::Plane);

        let bogus = PropertyPath::parse("parameters.radius").unwrap();
        assert_eq!(scene.read_property(&key, &bogus), None);
        assert!(!scene.write_property(&key, &bogus, 1.0));
    }

    #[test]
    fn test_deferred_mutation_applies_at_due_time() {
        let scene = scene();
        let key = scene.add_primitive(PrimitiveKind::Box);
        scene.drain_due(0.0);

        scene.update_transform_after(
            &key,
            0.3,
            Box::new(|mut t| {
                t.scale = Vec3::splat(2.0);
                t
            }),
        );

        scene.drain_due(0.1);
        assert_eq!(scene.get_object(&key).unwrap().transform.scale, Vec3::ONE);
        assert_eq!(scene.deferred_len(), 1);

        scene.drain_due(0.35);
        assert_eq!(scene.get_object(&key).unwrap().transform.scale, Vec3::splat(2.0));
        assert_eq!(scene.deferred_len(), 0);
    }

    #[test]
    fn test_delete_drops_pending_mutations() {
        let scene = scene();
        let key = scene.add_primitive(PrimitiveKind::Box);
        scene.update_transform_after(&key, 1.0, Box::new(|t| t));

        assert!(scene.delete(&key));
        assert_eq!(scene.deferred_len(), 0);
        assert!(scene.get_object(&key).is_none());
    }
}
