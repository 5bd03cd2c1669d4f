//! End-to-end console command flows through a full session: scene, graph,
//! oscillators, and the streamed fallback boundary.
//!
//! Run with: cargo test --test console_commands

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use ontoconsole::backend::{Backend, StreamData, TransportError};
use ontoconsole::console::{ConsoleHandle, EntryKind};
use ontoconsole::fallback::{FallbackClient, FallbackEnvelope, SourceRef};
use ontoconsole::matrix::default_matrix;
use ontoconsole::property_path::PropertyPath;
use ontoconsole::router::ConsoleSession;
use ontoconsole::scene::{MemoryScene, PrimitiveKind, SceneApi};
use ontoconsole::scripts::{ScriptOverrideStore, Triple};

struct OfflineBackend;

impl Backend for OfflineBackend {
    fn run_tool(
        &mut self,
        _command: &str,
        _on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError> {
        Err(TransportError("offline".to_string()))
    }

    fn relay(
        &mut self,
        _url: &str,
        _payload: serde_json::Value,
        _on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError> {
        Err(TransportError("offline".to_string()))
    }
}

/// Replays one canned source event and a chunked answer.
struct CannedFallback {
    queries: Rc<RefCell<Vec<String>>>,
}

impl FallbackClient for CannedFallback {
    fn query(
        &mut self,
        query: &str,
        on_event: &mut dyn FnMut(FallbackEnvelope),
    ) -> Result<(), TransportError> {
        self.queries.borrow_mut().push(query.to_string());
        on_event(FallbackEnvelope::Source(vec![
            SourceRef { label: "Self".to_string(), similarity: 0.91 },
            SourceRef { label: "Unity".to_string(), similarity: 0.84 },
        ]));
        on_event(FallbackEnvelope::Chunk("The Self seeks ".to_string()));
        on_event(FallbackEnvelope::Chunk("Unity.".to_string()));
        Ok(())
    }
}

fn session_with_fallback() -> (ConsoleSession, Rc<RefCell<Vec<String>>>) {
    let scene = MemoryScene::new(ConsoleHandle::new());
    let queries = Rc::new(RefCell::new(Vec::new()));
    let fallback = CannedFallback { queries: queries.clone() };
    let session = ConsoleSession::new(scene, Box::new(OfflineBackend), Box::new(fallback));
    (session, queries)
}

#[test]
fn oscillate_command_builds_descriptor_and_animates() {
    let (mut session, _) = session_with_fallback();
    let key = session.scene().add_primitive(PrimitiveKind::Box);
    let path = PropertyPath::parse("transform.position.x").unwrap();
    session.scene().write_property(&key, &path, 3.0);
    session.set_selection(vec![key.clone()]);

    session.dispatch("oscillate transform.position.x 2 5");

    let descriptors = session.oscillators().oscillators(&key);
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].frequency, 2.0);
    assert_eq!(descriptors[0].amplitude, 5.0);
    assert_eq!(descriptors[0].offset, 0.0);
    assert_eq!(descriptors[0].base_value, 3.0);

    session.tick(0.0);
    assert_eq!(session.scene().read_property(&key, &path), Some(3.0));

    // Quarter period of a 2 Hz wave: sin(2π·2·0.125) = 1, peak amplitude.
    session.tick(0.125);
    let value = session.scene().read_property(&key, &path).unwrap();
    assert!((value - 8.0).abs() < 1e-3, "expected peak 8.0, got {value}");
}

#[test]
fn stop_all_removes_every_descriptor() {
    let (mut session, _) = session_with_fallback();
    let key = session.scene().add_primitive(PrimitiveKind::Sphere);
    session.set_selection(vec![key.clone()]);

    session.dispatch("oscillate transform.position.x 1 1");
    session.dispatch("oscillate transform.position.y 1 1");
    session.dispatch("oscillate parameters.radius 1 1");
    assert_eq!(session.oscillators().total(), 3);

    session.dispatch("stop all");
    assert_eq!(session.oscillators().total(), 0);
    assert!(session.oscillators().oscillators(&key).is_empty());
}

#[test]
fn builtin_verb_applies_to_every_selected_object_in_order() {
    let (mut session, _) = session_with_fallback();
    let a = session.scene().add_primitive(PrimitiveKind::Box);
    let b = session.scene().add_primitive(PrimitiveKind::Sphere);
    for key in [&a, &b] {
        session.scene().update_transform(key, &|mut t| {
            t.position = Vec3::new(10.0, 5.0, 10.0);
            t
        });
    }
    session.set_selection(vec![a.clone(), b.clone()]);

    session.dispatch("seeks");

    for key in [&a, &b] {
        let p = session.scene().get_object(key).unwrap().transform.position;
        assert!(p.x.abs() < 10.0, "{key} did not approach origin");
        assert!(p.z.abs() < 10.0);
        assert_eq!(p.y, 5.0, "height must be preserved");
    }
}

#[test]
fn unknown_verb_streams_fallback_even_with_selection() {
    let (mut session, queries) = session_with_fallback();
    let key = session.scene().add_primitive(PrimitiveKind::Box);
    session.set_selection(vec![key]);

    session.dispatch("zzznotaverb tell me about unity");

    // The whole raw line, not just the verb, reaches the fallback.
    assert_eq!(
        queries.borrow().as_slice(),
        ["zzznotaverb tell me about unity"]
    );

    let log = session.console().entries_since(0);
    assert_eq!(log[0].kind, EntryKind::Input);
    assert_eq!(log[1].kind, EntryKind::Ai);

    let streamed = log.iter().find(|e| e.kind == EntryKind::Output).unwrap();
    assert_eq!(streamed.text, "The Self seeks Unity.");
    assert!(!streamed.streaming);

    let sources = log.iter().find(|e| e.kind == EntryKind::Source).unwrap();
    assert_eq!(sources.text, "Context sources: Self (0.91), Unity (0.84)");

    // No MissingSelection error was raised on the way down.
    assert!(!log.iter().any(|e| e.kind == EntryKind::Error));
}

#[test]
fn script_override_wins_over_builtin_until_removed() {
    let scene = MemoryScene::new(ConsoleHandle::new());
    let mut scripts = ScriptOverrideStore::new();
    scripts.insert(
        &Triple::new("Self", "Seeks", "Unity"),
        r#"
        scene.log("custom seek for " + target.key);
        scene.write("transform.position.y", 50);
        "#,
    );
    let queries = Rc::new(RefCell::new(Vec::new()));
    let mut session = ConsoleSession::with_matrix(
        scene,
        Box::new(OfflineBackend),
        Box::new(CannedFallback { queries }),
        default_matrix(),
        scripts,
    );
    let key = session.scene().add_primitive(PrimitiveKind::Box);
    session.set_selection(vec![key.clone()]);

    session.dispatch("Seeks");
    let snapshot = session.scene().get_object(&key).unwrap();
    assert_eq!(snapshot.transform.position.y, 50.0);

    let log = session.console().entries_since(0);
    assert!(log.iter().any(|e| e.text == "Executing custom script for: Self -> Seeks -> Unity"));
    assert!(log.iter().any(|e| e.text == format!("custom seek for {key}")));

    // Dropping the override falls back to the builtin horizontal lerp.
    session.remove_script(&Triple::new("Self", "Seeks", "Unity"));
    session.scene().update_transform(&key, &|mut t| {
        t.position = Vec3::new(10.0, 0.0, 10.0);
        t
    });
    session.dispatch("Seeks");
    let p = session.scene().get_object(&key).unwrap().transform.position;
    assert!((p.x - 8.0).abs() < 1e-5);
    assert!((p.z - 8.0).abs() < 1e-5);
}

#[test]
fn failing_script_logs_error_and_other_objects_still_run() {
    let scene = MemoryScene::new(ConsoleHandle::new());
    let mut scripts = ScriptOverrideStore::new();
    scripts.insert(&Triple::new("Self", "Affirms", "Existence"), "no_such_fn();");
    let queries = Rc::new(RefCell::new(Vec::new()));
    let mut session = ConsoleSession::with_matrix(
        scene,
        Box::new(OfflineBackend),
        Box::new(CannedFallback { queries }),
        default_matrix(),
        scripts,
    );
    let a = session.scene().add_primitive(PrimitiveKind::Box);
    let b = session.scene().add_primitive(PrimitiveKind::Box);
    session.set_selection(vec![a.clone(), b.clone()]);

    session.dispatch("Affirms");

    let log = session.console().entries_since(0);
    let errors: Vec<_> = log.iter().filter(|e| e.kind == EntryKind::Error).collect();
    // One failure per object; the loop never aborts early.
    assert_eq!(errors.len(), 2);
    assert!(errors[0].text.contains("Self -> Affirms -> Existence"));
}

#[test]
fn deleting_an_object_purges_descriptors_and_selection() {
    let (mut session, _) = session_with_fallback();
    let key = session.scene().add_primitive(PrimitiveKind::Box);
    session.set_selection(vec![key.clone()]);
    session.dispatch("oscillate transform.scale.x 1 0.5");
    assert_eq!(session.oscillators().total(), 1);

    assert!(session.delete_object(&key));
    assert_eq!(session.oscillators().total(), 0);
    assert!(session.selection().is_empty());

    // A later tick is a no-op rather than a resurrecting write.
    session.tick(1.0);
    assert!(session.scene().get_object(&key).is_none());
}

#[test]
fn parameter_oscillation_targets_primitive_fields() {
    let (mut session, _) = session_with_fallback();
    let key = session.scene().add_primitive(PrimitiveKind::Sphere);
    session.set_selection(vec![key.clone()]);

    session.dispatch("oscillate parameters.radius 1 2");
    session.tick(0.25);

    let path = PropertyPath::parse("parameters.radius").unwrap();
    let value = session.scene().read_property(&key, &path).unwrap();
    assert!((value - 7.0).abs() < 1e-3, "5 + 2·sin(π/2) = 7, got {value}");
}
