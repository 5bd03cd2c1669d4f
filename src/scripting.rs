//! Sandboxed Rhai host for custom verb override scripts.
//!
//! A script replaces the builtin effect of one relationship triple. It runs
//! once per selected object, top to bottom; there is no callback surface.
//!
//! Available API:
//! - `target` - read-only snapshot of the object being acted on
//!   (`target.key`, `target.type`, `target.position.x/y/z`,
//!   `target.rotation.x/y/z/w`, `target.scale.x/y/z`, `target.parameters`)
//! - `scene.log(msg)` - append a line to the console transcript
//! - `scene.read(path)` - read a numeric property (`"transform.position.x"`)
//! - `scene.write(path, value)` - write a numeric property
//! - `scene.translate(x, y, z)` - offset the target's position
//! - `scene.scale_by(x, y, z)` - multiply the target's scale
//!
//! Scripts never hold references into engine state: reads copy, writes go
//! through the scene API installed for the duration of the run.

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Dynamic, Engine, ImmutableString, Scope, AST};

use crate::property_path::PropertyPath;
use crate::scene::{ObjectSnapshot, SceneApi};
use crate::script_diagnostics::{from_eval_error, from_parse_error, ScriptDiagnostic};
use crate::scripts::Triple;

thread_local! {
    /// Scene API for the script currently running on this thread. The engine
    /// is single-threaded; host functions registered on the Rhai engine reach
    /// the scene through here.
    static CURRENT_SCENE: RefCell<Option<Rc<dyn SceneApi>>> = const { RefCell::new(None) };
}

fn with_scene<R>(f: impl FnOnce(&dyn SceneApi) -> R) -> Option<R> {
    CURRENT_SCENE.with(|cell| cell.borrow().as_ref().map(|api| f(api.as_ref())))
}

/// Clears the installed scene API when a run ends, error or not.
struct SceneGuard;

impl Drop for SceneGuard {
    fn drop(&mut self) {
        CURRENT_SCENE.with(|cell| cell.borrow_mut().take());
    }
}

/// Namespace definitions injected ahead of every user script.
///
/// Note: anonymous functions capture `__target_key` from the scope, and the
/// `* 1.0` coercions let scripts pass integer literals to float-typed host
/// functions.
const PRELUDE: &str = r#"let scene = #{};
scene.__type = "scene_namespace";
scene.log = |msg| { __scene_log("" + msg); };
scene.read = |path| { __scene_read(__target_key, path) };
scene.write = |path, value| { __scene_write(__target_key, path, value * 1.0) };
scene.translate = |x, y, z| { __scene_translate(__target_key, x * 1.0, y * 1.0, z * 1.0); };
scene.scale_by = |x, y, z| { __scene_scale_by(__target_key, x * 1.0, y * 1.0, z * 1.0); };
"#;

/// One compiled override, cached at graph rebuild so every invocation reuses
/// the AST.
#[derive(Debug, Clone)]
pub struct CompiledOverride {
    ast: AST,
    /// `Concept -> Verb -> Concept` rendering for diagnostics.
    pub triple: String,
    user_line_offset: usize,
}

/// Rhai engine with the sandbox settings and host functions installed.
pub struct ScriptHost {
    engine: Engine,
}

impl ScriptHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();

        // Sandbox settings
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        engine.set_max_operations(100_000); // Prevent infinite loops
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(500);

        engine.register_fn("__scene_log", |msg: ImmutableString| {
            with_scene(|api| api.log(&msg));
        });

        // Returns unit when the path does not resolve, so scripts can probe.
        engine.register_fn(
            "__scene_read",
            |key: ImmutableString, path: ImmutableString| -> Dynamic {
                let Ok(parsed) = PropertyPath::parse(&path) else {
                    return Dynamic::UNIT;
                };
                with_scene(|api| api.read_property(&key, &parsed))
                    .flatten()
                    .map(Dynamic::from)
                    .unwrap_or(Dynamic::UNIT)
            },
        );

        engine.register_fn(
            "__scene_write",
            |key: ImmutableString, path: ImmutableString, value: f32| -> bool {
                let Ok(parsed) = PropertyPath::parse(&path) else {
                    return false;
                };
                with_scene(|api| api.write_property(&key, &parsed, value)).unwrap_or(false)
            },
        );

        engine.register_fn(
            "__scene_translate",
            |key: ImmutableString, x: f32, y: f32, z: f32| {
                with_scene(|api| {
                    api.update_transform(&key, &move |mut t| {
                        t.position += glam::Vec3::new(x, y, z);
                        t
                    });
                });
            },
        );

        engine.register_fn(
            "__scene_scale_by",
            |key: ImmutableString, x: f32, y: f32, z: f32| {
                with_scene(|api| {
                    api.update_transform(&key, &move |mut t| {
                        t.scale *= glam::Vec3::new(x, y, z);
                        t
                    });
                });
            },
        );

        Self { engine }
    }

    /// Compile one override script with the prelude attached. Error positions
    /// are mapped back onto the user's own lines.
    pub fn compile(&self, triple: &Triple, source: &str) -> Result<CompiledOverride, ScriptDiagnostic> {
        let triple_str = triple.to_string();
        let user_line_offset = PRELUDE.matches('\n').count();
        let full_script = format!("{PRELUDE}{source}");

        match self.engine.compile(&full_script) {
            Ok(ast) => Ok(CompiledOverride {
                ast,
                triple: triple_str,
                user_line_offset,
            }),
            Err(e) => Err(from_parse_error(&triple_str, &e, user_line_offset)),
        }
    }

    /// Run a compiled override against one object. The snapshot becomes the
    /// `target` variable; the scene API stays installed only for the duration
    /// of the run.
    pub fn run(
        &self,
        compiled: &CompiledOverride,
        snapshot: &ObjectSnapshot,
        api: Rc<dyn SceneApi>,
    ) -> Result<(), ScriptDiagnostic> {
        CURRENT_SCENE.with(|cell| *cell.borrow_mut() = Some(api));
        let _guard = SceneGuard;

        let mut scope = Scope::new();
        scope.push("__target_key", ImmutableString::from(snapshot.key.as_str()));
        scope.push("target", snapshot_to_map(snapshot));

        self.engine
            .run_ast_with_scope(&mut scope, &compiled.ast)
            .map_err(|e| from_eval_error(&compiled.triple, &e, compiled.user_line_offset))
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

fn vec3_map(x: f32, y: f32, z: f32) -> rhai::Map {
    let mut m = rhai::Map::new();
    m.insert("x".into(), Dynamic::from(x));
    m.insert("y".into(), Dynamic::from(y));
    m.insert("z".into(), Dynamic::from(z));
    m
}

fn field_map(fields: &crate::scene::FieldMap) -> rhai::Map {
    fields
        .iter()
        .map(|(k, v)| (k.as_str().into(), Dynamic::from(*v)))
        .collect()
}

/// Build the read-only `target` map handed to scripts.
fn snapshot_to_map(snapshot: &ObjectSnapshot) -> rhai::Map {
    let mut map = rhai::Map::new();
    map.insert("key".into(), Dynamic::from(snapshot.key.clone()));
    map.insert("type".into(), Dynamic::from(snapshot.object.kind_str().to_string()));

    let t = &snapshot.transform;
    map.insert("position".into(), Dynamic::from(vec3_map(t.position.x, t.position.y, t.position.z)));
    let mut rotation = vec3_map(t.rotation.x, t.rotation.y, t.rotation.z);
    rotation.insert("w".into(), Dynamic::from(t.rotation.w));
    map.insert("rotation".into(), Dynamic::from(rotation));
    map.insert("scale".into(), Dynamic::from(vec3_map(t.scale.x, t.scale.y, t.scale.z)));

    map.insert("parameters".into(), Dynamic::from(field_map(&snapshot.parameters)));
    map.insert("modifiers".into(), Dynamic::from(field_map(&snapshot.modifiers)));
    map.insert("settings".into(), Dynamic::from(field_map(&snapshot.settings)));
    map
}
