//! Context assembly and the grounded-answer prompt.

use docqa_core::types::Chunk;

/// Reply the model must give when the context lacks the answer.
pub const NOT_FOUND: &str = "Not found in the document.";

/// Joins retrieved chunks as `[Source: name] text` blocks, in retrieval order.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[Source: {}] {}", c.source, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct source names in first-seen order.
pub fn distinct_sources(chunks: &[Chunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for c in chunks {
        if !sources.iter().any(|s| s == &c.source) {
            sources.push(c.source.clone());
        }
    }
    sources
}

pub fn render_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a highly accurate document-based assistant.\n\n\
         RULES:\n\
         - Answer ONLY using the provided CONTEXT.\n\
         - Do NOT use outside knowledge.\n\
         - If answer not found, say: {NOT_FOUND}\n\n\
         CONTEXT:\n{context}\n\n\
         QUESTION:\n{question}\n\n\
         Answer:\n"
    )
}
