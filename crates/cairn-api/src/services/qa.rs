//! Question answering and summarization prompts.
//!
//! Prompt text and token budgets are part of the product behavior; changing
//! either changes every answer the service gives.

use tracing::{debug, warn};

use cairn_core::{
    assemble_context, defaults, AssembledContext, ContextConfig, GenerationBackend,
    GenerationOptions, Record, RecordKind, Result,
};

/// Prompt for answering a search query over assembled context.
pub fn answer_prompt(query: &str, context: &str) -> String {
    format!(
        "Answer the following question using the provided notes.\n\nQuestion: {}\n\nNotes:\n{}\n\nAnswer:",
        query, context
    )
}

/// Prompt for summarizing a single record's text.
pub fn summary_prompt(text: &str) -> String {
    format!("Summarize this in 3-4 sentences:\n{}", text)
}

/// Token budget for a summary, scaled to the source length. Documents get a
/// larger ladder since extracted text runs long.
pub fn summary_token_budget(kind: RecordKind, chars: usize) -> u32 {
    match kind {
        RecordKind::Document => match chars {
            0..=999 => 80,
            1000..=1999 => 120,
            _ => 180,
        },
        _ => match chars {
            0..=499 => 60,
            500..=1499 => 100,
            _ => 120,
        },
    }
}

/// Assemble context from ranked records and generate an answer.
///
/// Degrades gracefully: an empty context skips generation, and a generation
/// failure yields an empty answer rather than failing the search. The
/// caller still gets the ranked records either way.
pub async fn answer_for(
    generation: &dyn GenerationBackend,
    query: &str,
    records: &[Record],
) -> (String, AssembledContext) {
    let context = assemble_context(records, &ContextConfig::default());
    debug!(
        subsystem = "api",
        component = "qa",
        included_count = context.included.len(),
        context_chars = context.char_count,
        "Context assembled"
    );

    if context.is_empty() {
        return (String::new(), context);
    }

    let prompt = answer_prompt(query, &context.text);
    let answer = match generation
        .generate(&prompt, &GenerationOptions::default())
        .await
    {
        Ok(text) => text,
        Err(err) => {
            warn!(
                subsystem = "api",
                component = "qa",
                model = generation.model_name(),
                error_msg = %err,
                "Answer generation failed; returning results without an answer"
            );
            String::new()
        }
    };

    (answer, context)
}

/// Generate a summary of a record's composed text. Unlike search answers,
/// the summary is the whole response, so failures propagate.
pub async fn summarize(generation: &dyn GenerationBackend, record: &Record) -> Result<String> {
    let text = record.embedding_text();
    let char_count = text.chars().count();

    let truncated: String = text.chars().take(defaults::SUMMARY_MAX_CHARS).collect();
    let max_tokens = summary_token_budget(record.kind, char_count);

    generation
        .generate(
            &summary_prompt(&truncated),
            &GenerationOptions::with_max_tokens(max_tokens),
        )
        .await
}
