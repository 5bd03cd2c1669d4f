//! The relationship matrix.
//!
//! A square table over one concept set: every concept is both a row and a
//! column, and each cell names the relationship verb directed from the row
//! concept to the column concept. The exchange shape is a nested JSON object
//! of string leaves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// conceptName → targetConceptName → verb label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipMatrix(pub BTreeMap<String, BTreeMap<String, String>>);

impl RelationshipMatrix {
    /// Row concepts in stable order.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn row(&self, concept: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(concept)
    }

    pub fn verb_for(&self, row: &str, col: &str) -> Option<&str> {
        self.0.get(row)?.get(col).map(String::as_str)
    }

    /// Check that the matrix is square over one key set. The engine itself is
    /// permissive; hosts that want eager rejection call this on load.
    pub fn validate_square(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        for (row, cells) in &self.0 {
            for col in cells.keys() {
                if !self.0.contains_key(col) {
                    problems.push(format!("row '{row}' references unknown column '{col}'"));
                }
            }
            for expected in self.0.keys() {
                if !cells.contains_key(expected) {
                    problems.push(format!("row '{row}' is missing column '{expected}'"));
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// The seeded ten-concept ontology.
pub fn default_matrix() -> RelationshipMatrix {
    let rows: &[(&str, &[(&str, &str)])] = &[
        ("Self", &[
            ("Self", "Identity"), ("Thought", "Subject Of"), ("Logic", "Applies"),
            ("Unity", "Seeks"), ("Existence", "Affirms"), ("Improvement", "Undergoes"),
            ("Mastery", "Pursues"), ("Resonance", "Experiences"),
            ("Transcendence", "Aspires To"), ("Nothing/Everything", "Is Realized by"),
        ]),
        ("Thought", &[
            ("Self", "Informs"), ("Thought", "Recursion"), ("Logic", "Utilizes"),
            ("Unity", "Synthesizes"), ("Existence", "Represents"), ("Improvement", "Drives"),
            ("Mastery", "Develops"), ("Resonance", "Articulates"),
            ("Transcendence", "Enables"), ("Nothing/Everything", "Transcends"),
        ]),
        ("Logic", &[
            ("Self", "Structures"), ("Thought", "Governs"), ("Logic", "Foundation"),
            ("Unity", "Ensures"), ("Existence", "Describes"), ("Improvement", "Validates"),
            ("Mastery", "Underpins"), ("Resonance", "Contradicts"),
            ("Transcendence", "Grounds"), ("Nothing/Everything", "Is the Foundation Of"),
        ]),
        ("Unity", &[
            ("Self", "Integrates"), ("Thought", "Harmonizes"), ("Logic", "Requires"),
            ("Unity", "Essence"), ("Existence", "Binds"), ("Improvement", "Fosters"),
            ("Mastery", "Culminates In"), ("Resonance", "Amplifies"),
            ("Transcendence", "Achieves"), ("Nothing/Everything", "Is the Ultimate Expression Of"),
        ]),
        ("Existence", &[
            ("Self", "Manifests In"), ("Thought", "Is Pondered By"), ("Logic", "Obeys"),
            ("Unity", "Comprises"), ("Existence", "Is"), ("Improvement", "Evolves Through"),
            ("Mastery", "Is Domain Of"), ("Resonance", "Vibrates In"),
            ("Transcendence", "Is Surpassed By"), ("Nothing/Everything", "Gives Rise To"),
        ]),
        ("Improvement", &[
            ("Self", "Refines"), ("Thought", "Optimizes"), ("Logic", "Systematizes"),
            ("Unity", "Strengthens"), ("Existence", "Enhances"), ("Improvement", "Process"),
            ("Mastery", "Leads To"), ("Resonance", "Fine-tunes"),
            ("Transcendence", "Is Path To"), ("Nothing/Everything", "Is the Cycle Of"),
        ]),
        ("Mastery", &[
            ("Self", "Actualizes"), ("Thought", "Requires Deep"), ("Logic", "Applies Perfected"),
            ("Unity", "Embodies"), ("Existence", "Commands"), ("Improvement", "Is Goal Of"),
            ("Mastery", "Pinnacle"), ("Resonance", "Generates"),
            ("Transcendence", "Approaches"), ("Nothing/Everything", "Is the Totality Of"),
        ]),
        ("Resonance", &[
            ("Self", "Is Felt By"), ("Thought", "Is Evoked By"), ("Logic", "Eludes"),
            ("Unity", "Creates"), ("Existence", "Echoes Through"), ("Improvement", "Aligns With"),
            ("Mastery", "Radiates From"), ("Resonance", "Sympathy"),
            ("Transcendence", "Facilitates"), ("Nothing/Everything", "Is the Ground Of"),
        ]),
        ("Transcendence", &[
            ("Self", "Elevates"), ("Thought", "Goes Beyond"), ("Logic", "Is Not Bound By"),
            ("Unity", "Is A State Of"), ("Existence", "Rises Above"), ("Improvement", "Is Aim Of"),
            ("Mastery", "Is Pinnacle Of"), ("Resonance", "Induces"),
            ("Transcendence", "Action"), ("Nothing/Everything", "Is the Nature Of"),
        ]),
        ("Nothing/Everything", &[
            ("Self", "Merges With"), ("Thought", "Contemplates"), ("Logic", "Is a Subset Of"),
            ("Unity", "Is an Aspect Of"), ("Existence", "Emerges From"),
            ("Improvement", "Occurs Within"), ("Mastery", "Seeks to Understand"),
            ("Resonance", "Harmonizes With"), ("Transcendence", "Aspires To"),
            ("Nothing/Everything", "is"),
        ]),
    ];

    RelationshipMatrix(
        rows.iter()
            .map(|(row, cells)| {
                (
                    row.to_string(),
                    cells
                        .iter()
                        .map(|(col, verb)| (col.to_string(), verb.to_string()))
                        .collect(),
                )
            })
            .collect(),
    )
}
