//! The fixed ontological knowledge corpus.
//!
//! One entry per concept in the seeded relationship matrix. These texts are
//! the retrieval substrate for the AI fallback; they are data, not code, and
//! deliberately live in their own module so editing them never touches engine
//! logic.

/// `(label, content)` pairs for every concept the default matrix knows.
pub fn default_corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Self",
            "The Self is a complex, multi-layered phenomenon that integrates consciousness, \
             identity, personal narrative, embodiment, and social existence into a dynamic \
             experience of being an individual. It is both a continuous thread and a momentary \
             flicker, always in a state of becoming. It emerged for survival, cognitive \
             coherence, social interaction, and meaning-making, and is distributed across \
             brain activity, the body, subjective consciousness, and social context rather \
             than located in any single place.",
        ),
        (
            "Thought",
            "Thought is the mental activity of using the mind to consider or reason about \
             something: interpreting information, generating ideas, solving problems, making \
             decisions. It is a collaborative creation, constantly emerging from the \
             intersection of individual awareness, biological hardware, the unconscious mind, \
             and the surrounding world. Thought informs the Self and, through recursion, \
             reflects upon itself.",
        ),
        (
            "Logic",
            "Logic is the systematic study of valid inference and correct reasoning: the \
             rules by which conclusions follow from premises. It structures the Self, governs \
             Thought, and serves as its own foundation. Logic describes Existence through \
             state and relation, validates Improvement by rationalizing change, and grounds \
             what would otherwise float free of justification.",
        ),
        (
            "Unity",
            "Unity is the state of being one: the integration of parts into a coherent whole. \
             It integrates the Self toward a center, harmonizes Thought into stable \
             configurations, requires Logic for its coherence, and binds Existence together. \
             Unity amplifies Resonance and culminates in Mastery; it is the ultimate \
             expression of the whole.",
        ),
        (
            "Existence",
            "Existence is the fact of being. It manifests in the Self, is pondered by \
             Thought, obeys Logic, and comprises Unity. Existence simply is; it evolves \
             through Improvement, vibrates in Resonance, and gives rise to everything that \
             can be named. It is the domain within which Mastery is exercised and the ground \
             Transcendence surpasses.",
        ),
        (
            "Improvement",
            "Improvement is directed change toward a better state. It refines the Self, is \
             optimized by Thought, systematizes Logic, and strengthens Unity. Improvement is \
             its own process: a cycle of assessment, adjustment, and renewed assessment that \
             leads to Mastery and is the path to Transcendence.",
        ),
        (
            "Mastery",
            "Mastery is comprehensive skill and command of a domain. It actualizes the Self, \
             requires deep Thought, applies perfected Logic, and embodies Unity. Mastery \
             commands Existence, is the goal of Improvement, and is its own pinnacle; it \
             generates Resonance in others and approaches Transcendence without claiming it.",
        ),
        (
            "Resonance",
            "Resonance is sympathetic vibration: the amplification that occurs when one \
             system's frequency matches another's. It is felt by the Self and evoked by \
             Thought, yet eludes pure Logic. Resonance creates Unity, echoes through \
             Existence, aligns with Improvement, and radiates from Mastery. It is the ground \
             of shared meaning.",
        ),
        (
            "Transcendence",
            "Transcendence is the act of going beyond a given limit, state, or category. It \
             elevates the Self, goes beyond Thought, and is not bound by Logic. Transcendence \
             is a state of Unity, rises above Existence, is the aim of Improvement and the \
             pinnacle of Mastery, and induces Resonance. It is the nature of the whole to \
             exceed its parts.",
        ),
        (
            "The Nothing and Everything",
            "The Nothing and Everything is the totality and its absence considered as one: \
             the whole from which Existence emerges and into which the Self merges. It \
             contemplates Thought, contains Logic as a subset and Unity as an aspect, and is \
             the medium within which Improvement occurs. Mastery seeks to understand it, \
             Resonance harmonizes with it, and it aspires to Transcendence. It simply is.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::default_matrix;

    #[test]
    fn test_corpus_covers_every_matrix_concept() {
        let corpus = default_corpus();
        assert_eq!(corpus.len(), 10);

        // Matrix rows use the short form for the last concept; the corpus
        // entry for it keeps the long-form document title.
        let labels: Vec<&str> = corpus.iter().map(|(label, _)| *label).collect();
        for concept in default_matrix().concepts() {
            let expected = if concept == "Nothing/Everything" {
                "The Nothing and Everything"
            } else {
                concept
            };
            assert!(labels.contains(&expected), "no corpus entry for {concept}");
        }
    }

    #[test]
    fn test_corpus_entries_are_nonempty() {
        for (label, text) in default_corpus() {
            assert!(!text.trim().is_empty(), "empty corpus entry for {label}");
        }
    }
}
