//! The console command router.
//!
//! One session owns the concept graph, the oscillator engine, the backend and
//! fallback boundaries, and the externally-driven selection. `dispatch`
//! processes one console line in a fixed priority order:
//!
//! 1. echo the line
//! 2. passthrough prefixes (`bun `, `proxy_call `), forwarded unparsed
//! 3. the reserved `oscillate` / `stop` keywords
//! 4. concept verbs, case-insensitive, invoked sequentially per selection
//! 5. the AI fallback with the entire raw line
//!
//! The ordering is load-bearing: passthroughs must never be token-parsed, the
//! animation keywords must win over same-named concept verbs, and concept
//! verbs must win over free-text interpretation.

use std::rc::Rc;

use crate::backend::{entry_kind_for, Backend};
use crate::console::{ConsoleHandle, EntryKind};
use crate::fallback::{FallbackClient, FallbackEnvelope};
use crate::graph::ConceptGraph;
use crate::matrix::{default_matrix, RelationshipMatrix};
use crate::oscillator::{OscillatorEngine, RemoveOutcome};
use crate::scene::MemoryScene;
use crate::scripting::ScriptHost;
use crate::scripts::{ScriptOverrideStore, Triple};

const TOOL_PREFIX: &str = "bun ";
const RELAY_PREFIX: &str = "proxy_call ";

pub struct ConsoleSession {
    console: ConsoleHandle,
    scene: Rc<MemoryScene>,
    host: ScriptHost,
    matrix: RelationshipMatrix,
    scripts: ScriptOverrideStore,
    graph: ConceptGraph,
    oscillators: OscillatorEngine,
    backend: Box<dyn Backend>,
    fallback: Box<dyn FallbackClient>,
    selection: Vec<String>,
}

impl ConsoleSession {
    pub fn new(
        scene: Rc<MemoryScene>,
        backend: Box<dyn Backend>,
        fallback: Box<dyn FallbackClient>,
    ) -> Self {
        Self::with_matrix(scene, backend, fallback, default_matrix(), ScriptOverrideStore::new())
    }

    pub fn with_matrix(
        scene: Rc<MemoryScene>,
        backend: Box<dyn Backend>,
        fallback: Box<dyn FallbackClient>,
        matrix: RelationshipMatrix,
        scripts: ScriptOverrideStore,
    ) -> Self {
        let console = scene.console().clone();
        let host = ScriptHost::new();
        let graph = ConceptGraph::rebuild(&matrix, &scripts, &host);
        Self {
            console,
            scene,
            host,
            matrix,
            scripts,
            graph,
            oscillators: OscillatorEngine::new(),
            backend,
            fallback,
            selection: Vec::new(),
        }
    }

    /// Replace the relationship matrix and rebuild the graph wholesale.
    pub fn set_matrix(&mut self, matrix: RelationshipMatrix) {
        self.matrix = matrix;
        self.rebuild();
    }

    /// Install or replace one script override and rebuild.
    pub fn set_script(&mut self, triple: &Triple, source: impl Into<String>) {
        self.scripts.insert(triple, source);
        self.rebuild();
    }

    pub fn remove_script(&mut self, triple: &Triple) {
        if self.scripts.remove(triple).is_some() {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        self.graph = ConceptGraph::rebuild(&self.matrix, &self.scripts, &self.host);
        log::debug!("concept graph rebuilt: {} concepts", self.graph.concepts.len());
    }

    /// Selection is owned by the host (hierarchy panel, click-picking); the
    /// router only reads it.
    pub fn set_selection(&mut self, keys: Vec<String>) {
        self.selection = keys;
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn scene(&self) -> &Rc<MemoryScene> {
        &self.scene
    }

    pub fn console(&self) -> &ConsoleHandle {
        &self.console
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    pub fn oscillators(&self) -> &OscillatorEngine {
        &self.oscillators
    }

    /// Advance one render frame: oscillator writes first, then any deferred
    /// pulse restores that have come due.
    pub fn tick(&mut self, t: f32) {
        self.oscillators.tick(t, self.scene.as_ref());
        self.scene.drain_due(t);
    }

    /// Delete an object and purge everything attached to it.
    pub fn delete_object(&mut self, key: &str) -> bool {
        let existed = self.scene.delete(key);
        self.oscillators.purge(key);
        self.selection.retain(|k| k != key);
        existed
    }

    /// Process one console line. See the module docs for the priority order.
    pub fn dispatch(&mut self, line: &str) {
        self.console.push(EntryKind::Input, line);

        if line.starts_with(TOOL_PREFIX) {
            self.run_tool(line);
            return;
        }
        if line.starts_with(RELAY_PREFIX) {
            self.run_relay(line);
            return;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return;
        };

        if verb.eq_ignore_ascii_case("oscillate") {
            if let Some(key) = self.require_single_selection() {
                self.handle_oscillate(args, &key);
            }
            return;
        }
        if verb.eq_ignore_ascii_case("stop") {
            if let Some(key) = self.require_single_selection() {
                self.handle_stop(args, &key);
            }
            return;
        }

        if self.graph.find_verb(verb).is_some() {
            self.run_verb(verb);
            return;
        }

        self.run_fallback(line);
    }

    fn require_single_selection(&self) -> Option<String> {
        if self.selection.len() == 1 {
            Some(self.selection[0].clone())
        } else {
            self.console.push(
                EntryKind::Error,
                "Oscillation commands require exactly one selected object.",
            );
            None
        }
    }

    fn run_tool(&mut self, line: &str) {
        self.console.push(EntryKind::System, format!("Executing: {line}"));
        let console = self.console.clone();
        let result = self.backend.run_tool(line, &mut |data| {
            console.push(entry_kind_for(&data.kind), data.payload_text());
        });
        if let Err(e) = result {
            self.console.push(EntryKind::Error, format!("Bun Command Error: {e}"));
        }
    }

    fn run_relay(&mut self, line: &str) {
        let body = &line[RELAY_PREFIX.len()..];

        // Everything before the first single quote is the URL; the quoted
        // remainder is the JSON payload.
        let (url, payload_str) = match body.find('\'') {
            Some(idx) => (body[..idx].trim(), body[idx..].trim()),
            None => (body.trim(), ""),
        };

        if url.is_empty() {
            self.console.push(
                EntryKind::Error,
                "Usage: proxy_call <url> '[json_payload]'",
            );
            return;
        }

        let payload = if payload_str.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            let inner = payload_str
                .trim_start_matches('\'')
                .trim_end_matches('\'');
            match serde_json::from_str(inner) {
                Ok(value) => value,
                Err(e) => {
                    self.console
                        .push(EntryKind::Error, format!("Invalid JSON payload: {e}"));
                    return;
                }
            }
        };

        self.console
            .push(EntryKind::System, format!("Proxying call to {url}..."));
        let console = self.console.clone();
        let result = self.backend.relay(url, payload, &mut |data| {
            console.push(entry_kind_for(&data.kind), data.payload_text());
        });
        if let Err(e) = result {
            self.console.push(EntryKind::Error, format!("Proxy call failed: {e}"));
        }
    }

    fn handle_oscillate(&mut self, args: &[&str], key: &str) {
        if args.len() < 3 {
            self.console.push(
                EntryKind::Error,
                "Usage: oscillate <property> <frequency> <amplitude> [offset]",
            );
            return;
        }
        let path = args[0];
        let frequency = args[1].parse::<f32>();
        let amplitude = args[2].parse::<f32>();
        let offset = args.get(3).map(|s| s.parse::<f32>()).unwrap_or(Ok(0.0));

        let (Ok(frequency), Ok(amplitude), Ok(offset)) = (frequency, amplitude, offset) else {
            self.console.push(
                EntryKind::Error,
                "Invalid parameters. Frequency, amplitude, and offset must be numbers.",
            );
            return;
        };
        if frequency.is_nan() || amplitude.is_nan() || offset.is_nan() {
            self.console.push(
                EntryKind::Error,
                "Invalid parameters. Frequency, amplitude, and offset must be numbers.",
            );
            return;
        }

        match self
            .oscillators
            .add(self.scene.as_ref(), key, path, frequency, amplitude, offset)
        {
            Ok(_) => {
                self.console.push(
                    EntryKind::Success,
                    format!("Started oscillating '{path}' on {key}"),
                );
            }
            Err(e) => {
                self.console.push(EntryKind::Error, e.to_string());
            }
        }
    }

    fn handle_stop(&mut self, args: &[&str], key: &str) {
        let Some(&target) = args.first() else {
            self.console.push(EntryKind::Error, "Usage: stop <property|all>");
            return;
        };

        match self.oscillators.remove(key, target) {
            RemoveOutcome::RemovedAll(_) => {
                self.console.push(
                    EntryKind::Success,
                    format!("Stopped all oscillations on {key}"),
                );
            }
            RemoveOutcome::RemovedOne => {
                self.console.push(
                    EntryKind::Success,
                    format!("Stopped oscillating '{target}' on {key}"),
                );
            }
            RemoveOutcome::NoMatch => {
                let notice = if target == "all" {
                    format!("No active oscillations on {key}")
                } else {
                    format!("No active oscillation found for property '{target}'")
                };
                self.console.push(EntryKind::Info, notice);
            }
        }
    }

    fn run_verb(&mut self, verb: &str) {
        if self.selection.is_empty() {
            self.console.push(
                EntryKind::Error,
                format!("The command '{verb}' requires a selected object."),
            );
            return;
        }

        self.console.push(
            EntryKind::System,
            format!(
                "Executing command: '{verb}' on {} objects...",
                self.selection.len()
            ),
        );

        // Strictly sequential over the selection, in order; a per-object
        // failure is logged and the loop continues.
        let keys = self.selection.clone();
        for key in &keys {
            let Some((concept, entry)) = self.graph.find_verb(verb) else {
                return;
            };
            if let Err(e) = self
                .graph
                .invoke(concept, entry, key, self.scene.clone(), &self.host)
            {
                self.console.push(EntryKind::Error, e.to_string());
            }
        }
    }

    fn run_fallback(&mut self, line: &str) {
        self.console
            .push(EntryKind::Ai, "No command found. Querying the ontology AI...");
        let stream_id = self.console.begin_stream(EntryKind::Output);

        let console = self.console.clone();
        let result = self.fallback.query(line, &mut |event| match event {
            FallbackEnvelope::Source(sources) => {
                let rendered = sources
                    .iter()
                    .map(|s| format!("{} ({:.2})", s.label, s.similarity))
                    .collect::<Vec<_>>()
                    .join(", ");
                console.push(EntryKind::Source, format!("Context sources: {rendered}"));
            }
            FallbackEnvelope::Chunk(text) => {
                console.append_chunk(stream_id, &text);
            }
        });

        match result {
            Ok(()) => self.console.end_stream(stream_id),
            Err(e) => self.console.fail_stream(stream_id, &e.to_string()),
        }
    }
}
