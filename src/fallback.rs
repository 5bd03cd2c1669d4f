//! The AI fallback boundary.
//!
//! When no command family claims a console line, the whole line becomes a
//! free-text query. The response is an ordered NDJSON event stream: at most
//! one `source` event naming the retrieval context, then zero or more `chunk`
//! events whose concatenation is the full answer. Transport failure surfaces
//! as a single error entry; there is no retry and no timeout in this layer.

use serde::{Deserialize, Serialize};

use crate::backend::TransportError;
use crate::knowledge::default_corpus;
use crate::retrieval::{EmbeddingProvider, HashEmbedder, Retriever};

/// One retrieval hit reported ahead of the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Concept label. Older servers emit this field as `concept`.
    #[serde(alias = "concept")]
    pub label: String,
    pub similarity: f32,
}

/// Wire envelope for one stream line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FallbackEnvelope {
    Source(Vec<SourceRef>),
    Chunk(String),
}

/// The query boundary. `on_event` fires once per decoded envelope, in stream
/// order; returning `Ok` means the stream ended normally.
pub trait FallbackClient {
    fn query(
        &mut self,
        query: &str,
        on_event: &mut dyn FnMut(FallbackEnvelope),
    ) -> Result<(), TransportError>;
}

/// Incremental NDJSON decoder. Network reads split lines arbitrarily, so the
/// trailing partial line is buffered until the next push; malformed lines are
/// logged and skipped rather than killing the stream.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: String,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &str, on_event: &mut dyn FnMut(FallbackEnvelope)) {
        self.buffer.push_str(data);
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            decode_line(line.trim(), on_event);
        }
    }

    /// Flush the final unterminated line at end of stream.
    pub fn finish(&mut self, on_event: &mut dyn FnMut(FallbackEnvelope)) {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(rest.trim(), on_event);
    }
}

fn decode_line(line: &str, on_event: &mut dyn FnMut(FallbackEnvelope)) {
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<FallbackEnvelope>(line) {
        Ok(envelope) => on_event(envelope),
        Err(e) => log::warn!("skipping malformed stream line: {e} ({line})"),
    }
}

/// Fallback used when no AI server is configured.
pub struct NullFallback;

impl FallbackClient for NullFallback {
    fn query(
        &mut self,
        _query: &str,
        _on_event: &mut dyn FnMut(FallbackEnvelope),
    ) -> Result<(), TransportError> {
        Err(TransportError(
            "AI query failed. Could not connect to the backend server. Is it running?".to_string(),
        ))
    }
}

/// Self-contained fallback: retrieval over the fixed corpus, degraded
/// generation that answers with the best-matching entry's text. Keeps the
/// console usable with no server at all.
pub struct LocalFallback {
    embedder: Box<dyn EmbeddingProvider>,
    retriever: Retriever,
}

impl LocalFallback {
    pub fn new() -> anyhow::Result<Self> {
        let embedder = HashEmbedder::default();
        let retriever = Retriever::index(&embedder, &default_corpus())?;
        Ok(Self {
            embedder: Box::new(embedder),
            retriever,
        })
    }

    pub fn with_parts(
        embedder: Box<dyn EmbeddingProvider>,
        corpus: &[(&str, &str)],
    ) -> anyhow::Result<Self> {
        let retriever = Retriever::index(embedder.as_ref(), corpus)?;
        Ok(Self { embedder, retriever })
    }
}

impl FallbackClient for LocalFallback {
    fn query(
        &mut self,
        query: &str,
        on_event: &mut dyn FnMut(FallbackEnvelope),
    ) -> Result<(), TransportError> {
        let embedding = self
            .embedder
            .embed(query)
            .map_err(|e| TransportError(format!("embedding failed: {e}")))?;
        let hits = self.retriever.rank(&embedding);

        if hits.is_empty() {
            on_event(FallbackEnvelope::Chunk(
                "The knowledge base does not seem to contain the answer to that question."
                    .to_string(),
            ));
            return Ok(());
        }

        on_event(FallbackEnvelope::Source(
            hits.iter()
                .map(|hit| SourceRef {
                    label: hit.label.clone(),
                    similarity: hit.similarity,
                })
                .collect(),
        ));

        // Sentence-sized chunks, so the console exercises its streaming path.
        for sentence in hits[0].text.split_inclusive('.') {
            on_event(FallbackEnvelope::Chunk(sentence.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(events: &mut Vec<FallbackEnvelope>) -> impl FnMut(FallbackEnvelope) + '_ {
        |e| events.push(e)
    }

    #[test]
    fn test_decoder_handles_lines_split_across_pushes() {
        let mut decoder = NdjsonDecoder::new();
        let mut events = Vec::new();

        decoder.push(r#"{"type":"chunk","pay"#, &mut collect(&mut events));
        assert!(events.is_empty());
        decoder.push("load\":\"Hello\"}\n{\"type\":\"chunk\",\"payload\":\" world\"}", &mut collect(&mut events));
        assert_eq!(events.len(), 1);
        decoder.finish(&mut collect(&mut events));

        assert_eq!(
            events,
            vec![
                FallbackEnvelope::Chunk("Hello".to_string()),
                FallbackEnvelope::Chunk(" world".to_string()),
            ]
        );
    }

    #[test]
    fn test_decoder_skips_malformed_lines() {
        let mut decoder = NdjsonDecoder::new();
        let mut events = Vec::new();

        decoder.push(
            "not json at all\n{\"type\":\"chunk\",\"payload\":\"ok\"}\n",
            &mut collect(&mut events),
        );
        assert_eq!(events, vec![FallbackEnvelope::Chunk("ok".to_string())]);
    }

    #[test]
    fn test_source_envelope_accepts_concept_field_alias() {
        let envelope: FallbackEnvelope = serde_json::from_str(
            r#"{"type":"source","payload":[{"concept":"Self","similarity":0.91}]}"#,
        )
        .unwrap();
        let FallbackEnvelope::Source(sources) = envelope else {
            panic!("expected source envelope");
        };
        assert_eq!(sources[0].label, "Self");
        assert!((sources[0].similarity - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_local_fallback_emits_source_then_chunks() {
        let corpus = [("Resonance", "Resonance is sympathetic vibration. It amplifies.")];
        let mut fallback = LocalFallback::with_parts(
            Box::new(HashEmbedder::default()),
            &corpus,
        )
        .unwrap();

        let mut events = Vec::new();
        // The query repeats the corpus text exactly, so similarity is 1.0 and
        // clears the fixed threshold.
        fallback
            .query(
                "Resonance is sympathetic vibration. It amplifies.",
                &mut collect(&mut events),
            )
            .unwrap();

        assert!(matches!(events[0], FallbackEnvelope::Source(_)));
        let answer: String = events[1..]
            .iter()
            .map(|e| match e {
                FallbackEnvelope::Chunk(text) => text.as_str(),
                _ => panic!("chunk events must follow the source event"),
            })
            .collect();
        assert_eq!(answer, corpus[0].1);
    }

    #[test]
    fn test_local_fallback_off_topic_query_still_answers() {
        let corpus = [("Resonance", "Resonance is sympathetic vibration.")];
        let mut fallback =
            LocalFallback::with_parts(Box::new(HashEmbedder::default()), &corpus).unwrap();

        let mut events = Vec::new();
        fallback
            .query("completely unrelated gardening question", &mut collect(&mut events))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], FallbackEnvelope::Chunk(_)));
    }

    #[test]
    fn test_null_fallback_is_a_transport_error() {
        let mut fallback = NullFallback;
        let err = fallback.query("anything", &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("Could not connect"));
    }
}
