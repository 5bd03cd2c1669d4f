//! Structured script diagnostics.
//!
//! Rhai provides rich error types (parse + runtime) with positions. The engine
//! wraps those into a stable, JSON-serializable diagnostic format that the
//! console can surface without requiring access to Rust logs. Every diagnostic
//! carries the triple it belongs to, so a broken override names its matrix
//! cell in the transcript.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDiagnosticKind {
    /// Syntax/parse errors (compile time).
    ParseError,
    /// Runtime errors in user code.
    RuntimeError,
    /// Script attempted to use the host API incorrectly (missing members, wrong types, etc).
    HostApiMisuse,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    Compile,
    Invoke,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptLocation {
    /// 1-based line number in the user script (not the injected prelude).
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptDiagnostic {
    pub kind: ScriptDiagnosticKind,
    pub phase: ScriptPhase,
    /// The `Concept -> Verb -> Concept` cell this script overrides.
    pub triple: String,
    pub message: String,
    pub location: Option<ScriptLocation>,
    /// Raw engine error string (useful for bug reports).
    pub raw: Option<String>,
}

impl ScriptDiagnostic {
    /// One-line rendering for the console transcript.
    pub fn console_message(&self) -> String {
        match &self.location {
            Some(loc) => format!(
                "Custom script error in {}: {} (line {}, column {})",
                self.triple, self.message, loc.line, loc.column
            ),
            None => format!("Custom script error in {}: {}", self.triple, self.message),
        }
    }
}

fn classify_message(message: &str) -> ScriptDiagnosticKind {
    // Rhai error strings are fairly stable; this provides a pragmatic
    // classification without depending on Rhai's internal enum variants.
    let lower = message.to_ascii_lowercase();

    // Common "you used the API wrong" cases.
    if lower.contains("property not found")
        || lower.contains("variable not found")
        || lower.contains("function not found")
        || lower.contains("index")
        || lower.contains("array index")
        || lower.contains("map key")
        || lower.contains("mismatched types")
        || lower.contains("invalid")
    {
        return ScriptDiagnosticKind::HostApiMisuse;
    }

    ScriptDiagnosticKind::RuntimeError
}

fn map_position_to_user(
    line: u32,
    column: u32,
    user_line_offset: usize,
) -> Option<ScriptLocation> {
    let offset = user_line_offset as u32;
    if line == 0 {
        return None;
    }
    if line <= offset {
        return None;
    }
    Some(ScriptLocation {
        line: line - offset,
        column: column.max(1),
    })
}

pub fn from_parse_error(
    triple: &str,
    err: &rhai::ParseError,
    user_line_offset: usize,
) -> ScriptDiagnostic {
    let raw = err.to_string();

    // Rhai's ParseError exposes a Position.
    let pos = err.position();
    let line = pos.line().unwrap_or(0) as u32;
    let column = pos.position().unwrap_or(0) as u32;
    let location = map_position_to_user(line, column, user_line_offset);

    ScriptDiagnostic {
        kind: ScriptDiagnosticKind::ParseError,
        phase: ScriptPhase::Compile,
        triple: triple.to_string(),
        message: raw.clone(),
        location,
        raw: Some(raw),
    }
}

pub fn from_eval_error(
    triple: &str,
    err: &rhai::EvalAltResult,
    user_line_offset: usize,
) -> ScriptDiagnostic {
    let raw = err.to_string();
    let kind = classify_message(&raw);

    let pos = err.position();
    let line = pos.line().unwrap_or(0) as u32;
    let column = pos.position().unwrap_or(0) as u32;
    let location = map_position_to_user(line, column, user_line_offset);

    ScriptDiagnostic {
        kind,
        phase: ScriptPhase::Invoke,
        triple: triple.to_string(),
        message: raw.clone(),
        location,
        raw: Some(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_maps_line_past_prelude() {
        let engine = rhai::Engine::new();
        // Prelude occupies two lines; the bad token sits on user line 1.
        let err = engine
            .compile("let a = 1;\nlet b = 2;\nlet = ;")
            .unwrap_err();
        let diag = from_parse_error("Self -> Seeks -> Unity", &err, 2);

        assert_eq!(diag.kind, ScriptDiagnosticKind::ParseError);
        assert_eq!(diag.phase, ScriptPhase::Compile);
        assert_eq!(diag.location.as_ref().map(|l| l.line), Some(1));
        assert!(diag.console_message().contains("Self -> Seeks -> Unity"));
    }

    #[test]
    fn test_missing_variable_classified_as_api_misuse() {
        let engine = rhai::Engine::new();
        let err = engine.eval::<()>("nonexistent_thing + 1").unwrap_err();
        let diag = from_eval_error("Self -> Seeks -> Unity", &*err, 0);

        assert_eq!(diag.kind, ScriptDiagnosticKind::HostApiMisuse);
        assert_eq!(diag.phase, ScriptPhase::Invoke);
    }
}
