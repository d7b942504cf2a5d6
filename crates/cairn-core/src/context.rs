//! Context assembly for retrieval-augmented generation.
//!
//! Given records already ranked by the vector index (rank 0 = most similar)
//! and a character budget, [`assemble_context`] deterministically selects and
//! formats a subset into a single prompt-ready text block. Similarity rank
//! alone can bury document-derived content behind shorter, higher-scoring
//! snippets, so after the primary pass the assembler makes one best-effort
//! attempt to represent a document excerpt if none made it in.
//!
//! The function is total and pure: no I/O, no shared state, byte-identical
//! output for identical input.

use serde::Serialize;
use uuid::Uuid;

use crate::defaults;
use crate::models::{Record, RecordKind};

/// Tuning knobs for context assembly.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Maximum records admitted in rank order before the fallback pass.
    pub max_primary_slots: usize,
    /// Character cap applied to document-kind bodies (hard slice, not a
    /// word-boundary trim).
    pub max_excerpt_chars: usize,
    /// Global ceiling on the summed block lengths.
    pub max_total_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_primary_slots: defaults::CONTEXT_PRIMARY_SLOTS,
            max_excerpt_chars: defaults::CONTEXT_EXCERPT_CHARS,
            max_total_chars: defaults::CONTEXT_TOTAL_CHARS,
        }
    }
}

/// Output of context assembly. Request-scoped; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssembledContext {
    /// Formatted blocks joined by the delimiter line, or empty.
    pub text: String,
    /// Sum of block lengths in characters. Delimiters are not counted, so
    /// this is the value the budget was enforced against.
    pub char_count: usize,
    /// Ids of the records actually included, in emission order. Unique.
    pub included: Vec<Uuid>,
}

impl AssembledContext {
    /// True when nothing fit (or nothing was supplied).
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Exact prefix of at most `max` characters. Unicode-scalar slice; never
/// splits a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Format one record as context block `n` (1-based).
fn format_block(n: usize, record: &Record, max_excerpt_chars: usize) -> String {
    match record.kind {
        RecordKind::Text => format!("Note {}: {}\n{}", n, record.title, record.body),
        RecordKind::Bookmark => format!(
            "Note {}: {}\n{}\n{}",
            n,
            record.title,
            record.body,
            record.external_url.as_deref().unwrap_or("")
        ),
        RecordKind::Document => format!(
            "Note {}: {}\n{}",
            n,
            record.title,
            truncate_chars(&record.body, max_excerpt_chars)
        ),
    }
}

/// Assemble a bounded context from ranked records.
///
/// Two passes:
///
/// 1. **Primary**: walk `records` in rank order, admitting up to
///    `max_primary_slots` blocks. The walk stops outright the first time a
///    block would push the character count past `max_total_chars`; later
///    candidates are not considered for primary slots.
/// 2. **Document fallback**: scan the full list for the first document-kind
///    record not already included and append it if it fits. Best effort:
///    discarded silently when over budget. Rank-first scan order is a
///    documented behavior; which excerpt lands here changes downstream
///    answers.
pub fn assemble_context(records: &[Record], config: &ContextConfig) -> AssembledContext {
    let mut out = AssembledContext::default();

    for record in records {
        if out.included.len() >= config.max_primary_slots {
            break;
        }
        let block = format_block(out.included.len() + 1, record, config.max_excerpt_chars);
        let block_chars = block.chars().count();
        if out.char_count + block_chars > config.max_total_chars {
            break;
        }
        push_block(&mut out, &block, block_chars, record.id);
    }

    if out.char_count < config.max_total_chars {
        let fallback = records
            .iter()
            .find(|r| r.kind == RecordKind::Document && !out.included.contains(&r.id));
        if let Some(doc) = fallback {
            let block = format_block(out.included.len() + 1, doc, config.max_excerpt_chars);
            let block_chars = block.chars().count();
            if out.char_count + block_chars <= config.max_total_chars {
                push_block(&mut out, &block, block_chars, doc.id);
            }
        }
    }

    out
}

fn push_block(out: &mut AssembledContext, block: &str, block_chars: usize, id: Uuid) {
    if !out.text.is_empty() {
        out.text.push_str(defaults::CONTEXT_DELIMITER);
    }
    out.text.push_str(block);
    out.char_count += block_chars;
    out.included.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(kind: RecordKind, title: &str, body: &str, url: Option<&str>) -> Record {
        Record {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            kind,
            title: title.to_string(),
            body: body.to_string(),
            external_url: url.map(String::from),
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn text_note(title: &str, body: &str) -> Record {
        record(RecordKind::Text, title, body, None)
    }

    fn document(title: &str, body: &str) -> Record {
        record(RecordKind::Document, title, body, Some("/files/doc.pdf"))
    }

    #[test]
    fn test_empty_candidates_yield_empty_context() {
        let ctx = assemble_context(&[], &ContextConfig::default());
        assert!(ctx.is_empty());
        assert_eq!(ctx.text, "");
        assert_eq!(ctx.char_count, 0);
        assert!(ctx.included.is_empty());
    }

    #[test]
    fn test_char_count_never_exceeds_ceiling() {
        let records = vec![
            text_note("a", &"x".repeat(1500)),
            text_note("b", &"y".repeat(1500)),
            document("c", &"z".repeat(4000)),
        ];
        let config = ContextConfig::default();
        let ctx = assemble_context(&records, &config);
        assert!(ctx.char_count <= config.max_total_chars);
    }

    #[test]
    fn test_primary_slot_cap() {
        let records: Vec<Record> = (0..5)
            .map(|i| text_note(&format!("t{}", i), "short body"))
            .collect();
        let ctx = assemble_context(&records, &ContextConfig::default());
        // No documents anywhere, so only the primary pass contributes.
        assert_eq!(ctx.included.len(), 2);
        assert_eq!(ctx.included, vec![records[0].id, records[1].id]);
    }

    #[test]
    fn test_budget_overflow_stops_walk_entirely() {
        // The second candidate busts the budget; the third would fit but the
        // primary walk terminates rather than skipping ahead.
        let records = vec![
            text_note("a", &"x".repeat(100)),
            text_note("b", &"y".repeat(5000)),
            text_note("c", "tiny"),
        ];
        let ctx = assemble_context(&records, &ContextConfig::default());
        assert_eq!(ctx.included, vec![records[0].id]);
    }

    #[test]
    fn test_document_fallback_from_beyond_primary_prefix() {
        let records = vec![
            text_note("a", "one"),
            text_note("b", "two"),
            text_note("c", "three"),
            document("paper", &"d".repeat(2000)),
        ];
        let ctx = assemble_context(&records, &ContextConfig::default());
        // Primary: a, b. Fallback scans the full list and finds the document.
        assert_eq!(ctx.included.len(), 3);
        assert_eq!(ctx.included[2], records[3].id);
        assert!(ctx.text.contains("Note 3: paper"));
    }

    #[test]
    fn test_document_truncation_is_exact_prefix() {
        let body = "z".repeat(2000);
        let records = vec![document("C", &body)];
        let config = ContextConfig::default();
        let ctx = assemble_context(&records, &config);
        let expected = format!("Note 1: C\n{}", "z".repeat(config.max_excerpt_chars));
        assert_eq!(ctx.text, expected);
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        let s = "héllo wörld";
        let t = truncate_chars(s, 4);
        assert_eq!(t, "héll");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn test_determinism() {
        let records = vec![
            text_note("a", "alpha"),
            record(RecordKind::Bookmark, "b", "beta", Some("http://e")),
            document("c", &"z".repeat(3000)),
        ];
        let config = ContextConfig::default();
        let first = assemble_context(&records, &config);
        let second = assemble_context(&records, &config);
        assert_eq!(first.text, second.text);
        assert_eq!(first.char_count, second.char_count);
        assert_eq!(first.included, second.included);
    }

    #[test]
    fn test_mixed_kinds_scenario() {
        // text + bookmark fill the primary slots, document arrives via
        // fallback with a 1000-char excerpt.
        let records = vec![
            text_note("A", &"x".repeat(50)),
            record(RecordKind::Bookmark, "B", "y", Some("http://e")),
            document("C", &"z".repeat(2000)),
        ];
        let ctx = assemble_context(&records, &ContextConfig::default());

        assert_eq!(
            ctx.included,
            vec![records[0].id, records[1].id, records[2].id]
        );
        assert!(ctx.text.starts_with("Note 1: A\n"));
        assert!(ctx.text.contains("Note 2: B\ny\nhttp://e"));
        assert!(ctx.text.contains(&format!("Note 3: C\n{}", "z".repeat(1000))));
        assert!(ctx.char_count < 3000);
    }

    #[test]
    fn test_all_documents_scenario() {
        // Five oversized documents: two fit through the primary pass, the
        // fallback's candidate (rank 2) no longer fits the remaining budget.
        let records: Vec<Record> = (0..5)
            .map(|i| document(&format!("doc{}", i), &"q".repeat(4000)))
            .collect();
        let ctx = assemble_context(&records, &ContextConfig::default());
        assert_eq!(ctx.included, vec![records[0].id, records[1].id]);
        assert!(ctx.char_count <= 3000);
    }

    #[test]
    fn test_bookmark_with_empty_body_keeps_blank_line() {
        let records = vec![record(
            RecordKind::Bookmark,
            "saved",
            "",
            Some("http://example.org"),
        )];
        let ctx = assemble_context(&records, &ContextConfig::default());
        assert_eq!(ctx.text, "Note 1: saved\n\nhttp://example.org");
        assert_eq!(ctx.included, vec![records[0].id]);
    }

    #[test]
    fn test_fallback_discarded_when_over_budget() {
        let records = vec![
            text_note("a", &"x".repeat(2500)),
            document("big", &"z".repeat(2000)),
        ];
        let ctx = assemble_context(&records, &ContextConfig::default());
        // Primary admits the text note (~2510 chars); the 1010-char document
        // block would exceed 3000 and is silently dropped.
        assert_eq!(ctx.included, vec![records[0].id]);
        assert!(!ctx.text.contains("big"));
    }

    #[test]
    fn test_delimiters_not_counted_in_char_count() {
        let records = vec![text_note("a", "one"), text_note("b", "two")];
        let ctx = assemble_context(&records, &ContextConfig::default());
        let block_sum: usize = ctx
            .text
            .split(defaults::CONTEXT_DELIMITER)
            .map(|b| b.chars().count())
            .sum();
        assert_eq!(ctx.char_count, block_sum);
        assert_eq!(
            ctx.text.chars().count(),
            block_sum + defaults::CONTEXT_DELIMITER.chars().count()
        );
    }

    #[test]
    fn test_affordable_document_is_never_dropped() {
        // Document-kind content that fits the budget must show up, whether
        // it enters through the primary pass or the fallback.
        let records = vec![
            document("first", &"a".repeat(500)),
            text_note("b", "note"),
        ];
        let ctx = assemble_context(&records, &ContextConfig::default());
        assert!(ctx.included.contains(&records[0].id));
    }
}
