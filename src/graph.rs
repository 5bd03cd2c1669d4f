//! The executable concept graph.
//!
//! Rebuilt from scratch whenever the relationship matrix or the script
//! override store changes: every cell becomes a verb entry whose callable is
//! resolved once, in priority order - custom script, then builtin, then a
//! logging stub. Scripts are compiled at rebuild time so invocation never
//! recompiles; a script that fails to compile keeps its diagnostic and
//! reports it on every invocation attempt.

use std::fmt;
use std::rc::Rc;

use crate::matrix::RelationshipMatrix;
use crate::registry::{Builtin, FunctionRegistry};
use crate::scene::SceneApi;
use crate::script_diagnostics::ScriptDiagnostic;
use crate::scripting::{CompiledOverride, ScriptHost};
use crate::scripts::{ScriptOverrideStore, Triple};

/// What a verb entry does when invoked.
pub enum ResolvedVerb {
    /// User script override, compiled and cached.
    Script(CompiledOverride),
    /// User script override that failed to compile.
    BrokenScript(ScriptDiagnostic),
    Builtin(&'static Builtin),
    /// No script and no builtin: log-only default action.
    Stub,
}

/// One outgoing edge of a concept.
pub struct VerbEntry {
    /// Verb label exactly as it appears in the matrix cell.
    pub label: String,
    /// Target concept name.
    pub target: String,
    pub resolved: ResolvedVerb,
}

pub struct Concept {
    pub name: String,
    pub verbs: Vec<VerbEntry>,
}

pub struct ConceptGraph {
    pub concepts: Vec<Concept>,
}

/// Failure of one verb invocation on one object.
#[derive(Debug, Clone)]
pub enum VerbError {
    Script(ScriptDiagnostic),
    Builtin(String),
    MissingTarget(String),
}

impl fmt::Display for VerbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbError::Script(diag) => write!(f, "{}", diag.console_message()),
            VerbError::Builtin(msg) => write!(f, "Action failed: {msg}"),
            VerbError::MissingTarget(key) => write!(f, "Object '{key}' no longer exists"),
        }
    }
}

impl std::error::Error for VerbError {}

impl ConceptGraph {
    /// Resolve every matrix cell into a callable verb entry.
    pub fn rebuild(
        matrix: &RelationshipMatrix,
        scripts: &ScriptOverrideStore,
        host: &ScriptHost,
    ) -> ConceptGraph {
        let registry = FunctionRegistry::shared();
        let concepts = matrix
            .0
            .iter()
            .map(|(row, cells)| Concept {
                name: row.clone(),
                verbs: cells
                    .iter()
                    .map(|(col, label)| {
                        let triple = Triple::new(row, label, col);
                        let resolved = match scripts.get(&triple) {
                            Some(source) => match host.compile(&triple, source) {
                                Ok(compiled) => ResolvedVerb::Script(compiled),
                                Err(diag) => {
                                    log::warn!("override for {triple} failed to compile: {}", diag.message);
                                    ResolvedVerb::BrokenScript(diag)
                                }
                            },
                            None => match registry.resolve(label) {
                                Some(builtin) => ResolvedVerb::Builtin(builtin),
                                None => ResolvedVerb::Stub,
                            },
                        };
                        VerbEntry {
                            label: label.clone(),
                            target: col.clone(),
                            resolved,
                        }
                    })
                    .collect(),
            })
            .collect();
        ConceptGraph { concepts }
    }

    /// Find a verb entry by label, case-insensitively, scanning concepts in
    /// row order. The first match wins when several concepts share a label.
    pub fn find_verb(&self, label: &str) -> Option<(&Concept, &VerbEntry)> {
        for concept in &self.concepts {
            for entry in &concept.verbs {
                if entry.label.eq_ignore_ascii_case(label) {
                    return Some((concept, entry));
                }
            }
        }
        None
    }

    /// Invoke one verb entry on one object.
    pub fn invoke(
        &self,
        concept: &Concept,
        entry: &VerbEntry,
        key: &str,
        api: Rc<dyn SceneApi>,
        host: &ScriptHost,
    ) -> Result<(), VerbError> {
        let snapshot = api
            .get_object(key)
            .ok_or_else(|| VerbError::MissingTarget(key.to_string()))?;

        match &entry.resolved {
            ResolvedVerb::Script(compiled) => {
                api.log(&format!("Executing custom script for: {}", compiled.triple));
                host.run(compiled, &snapshot, api.clone())
                    .map_err(VerbError::Script)
            }
            ResolvedVerb::BrokenScript(diag) => Err(VerbError::Script(diag.clone())),
            ResolvedVerb::Builtin(builtin) => {
                builtin.invoke(key, api.as_ref()).map_err(VerbError::Builtin)
            }
            ResolvedVerb::Stub => {
                api.log(&format!(
                    "[Default Action] {} -> {} -> {} on {key}",
                    concept.name, entry.label, entry.target
                ));
                Ok(())
            }
        }
    }

    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleHandle;
    use crate::matrix::default_matrix;
    use crate::scene::{MemoryScene, PrimitiveKind};
    use glam::Vec3;

    fn graph_with(scripts: &ScriptOverrideStore) -> (ConceptGraph, ScriptHost) {
        let host = ScriptHost::new();
        let graph = ConceptGraph::rebuild(&default_matrix(), scripts, &host);
        (graph, host)
    }

    #[test]
    fn test_default_rebuild_resolves_every_cell_to_a_builtin() {
        let (graph, _) = graph_with(&ScriptOverrideStore::new());
        assert_eq!(graph.concepts.len(), 10);
        for concept in &graph.concepts {
            assert_eq!(concept.verbs.len(), 10);
            for entry in &concept.verbs {
                assert!(
                    matches!(entry.resolved, ResolvedVerb::Builtin(_)),
                    "{} -> {} -> {} did not resolve to a builtin",
                    concept.name,
                    entry.label,
                    entry.target
                );
            }
        }
    }

    #[test]
    fn test_find_verb_is_case_insensitive_row_major() {
        let (graph, _) = graph_with(&ScriptOverrideStore::new());
        let (concept, entry) = graph.find_verb("seeks").unwrap();
        assert_eq!(concept.name, "Self");
        assert_eq!(entry.target, "Unity");

        assert!(graph.find_verb("zzznotaverb").is_none());
    }

    #[test]
    fn test_script_override_takes_precedence() {
        let mut scripts = ScriptOverrideStore::new();
        scripts.insert(
            &Triple::new("Self", "Seeks", "Unity"),
            r#"scene.write("transform.position.y", 99);"#,
        );
        let (graph, host) = graph_with(&scripts);

        let (concept, entry) = graph.find_verb("Seeks").unwrap();
        assert!(matches!(entry.resolved, ResolvedVerb::Script(_)));

        let scene = MemoryScene::new(ConsoleHandle::new());
        let key = scene.add_primitive(PrimitiveKind::Box);
        graph.invoke(concept, entry, &key, scene.clone(), &host).unwrap();

        let t = scene.get_object(&key).unwrap().transform;
        assert_eq!(t.position, Vec3::new(0.0, 99.0, 0.0));
        scene.console().with_entries(|entries| {
            assert!(entries[0].text.contains("Executing custom script for: Self -> Seeks -> Unity"));
        });
    }

    #[test]
    fn test_broken_script_reports_on_every_invoke() {
        let mut scripts = ScriptOverrideStore::new();
        scripts.insert(&Triple::new("Self", "Seeks", "Unity"), "let = ;");
        let (graph, host) = graph_with(&scripts);

        let (concept, entry) = graph.find_verb("Seeks").unwrap();
        assert!(matches!(entry.resolved, ResolvedVerb::BrokenScript(_)));

        let scene = MemoryScene::new(ConsoleHandle::new());
        let key = scene.add_primitive(PrimitiveKind::Box);
        let err = graph.invoke(concept, entry, &key, scene.clone(), &host).unwrap_err();
        assert!(matches!(err, VerbError::Script(_)));
        assert!(err.to_string().contains("Self -> Seeks -> Unity"));
    }

    #[test]
    fn test_unknown_label_becomes_logging_stub() {
        let mut matrix = default_matrix();
        matrix
            .0
            .get_mut("Self")
            .unwrap()
            .insert("Unity".to_string(), "Zigzags".to_string());
        let host = ScriptHost::new();
        let graph = ConceptGraph::rebuild(&matrix, &ScriptOverrideStore::new(), &host);

        let (concept, entry) = graph.find_verb("Zigzags").unwrap();
        assert!(matches!(entry.resolved, ResolvedVerb::Stub));

        let scene = MemoryScene::new(ConsoleHandle::new());
        let key = scene.add_primitive(PrimitiveKind::Box);
        graph.invoke(concept, entry, &key, scene.clone(), &host).unwrap();
        scene.console().with_entries(|entries| {
            assert_eq!(
                entries[0].text,
                format!("[Default Action] Self -> Zigzags -> Unity on {key}")
            );
        });
    }

    #[test]
    fn test_missing_object_reported() {
        let (graph, host) = graph_with(&ScriptOverrideStore::new());
        let (concept, entry) = graph.find_verb("Seeks").unwrap();

        let scene = MemoryScene::new(ConsoleHandle::new());
        let err = graph
            .invoke(concept, entry, "ghost-1", scene.clone(), &host)
            .unwrap_err();
        assert!(matches!(err, VerbError::MissingTarget(_)));
    }
}
