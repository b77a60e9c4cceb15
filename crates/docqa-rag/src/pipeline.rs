use std::sync::Arc;
use tracing::{info, warn};

use docqa_core::traits::{Embedder, Generator};
use docqa_core::Result;
use docqa_hybrid::SharedStore;

use crate::answer::{Answer, MultiAnswer, QuestionOutcome};
use crate::context::{build_context, distinct_sources};
use crate::questions::split_questions;

/// Embed, retrieve, generate, format.
pub struct AnswerPipeline {
    embedder: Arc<dyn Embedder>,
    store: SharedStore,
    generator: Box<dyn Generator>,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: SharedStore, generator: Box<dyn Generator>, top_k: usize) -> Self {
        Self { embedder, store, generator, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answers one question from the chunks hybrid search retrieves for it.
    pub fn answer(&self, question: &str) -> Result<Answer> {
        let query_vector = self.embedder.embed_one(question)?;
        let retrieved = self.store.hybrid_search(&query_vector, question, self.top_k)?;
        let context = build_context(&retrieved);
        let raw = self.generator.generate(question, &context)?;
        Ok(Answer::from_raw(question, raw, distinct_sources(&retrieved)))
    }

    /// Splits `query` into questions and answers each independently.
    ///
    /// A failing question is reported in place and does not affect the others.
    pub fn answer_multiple(&self, query: &str) -> MultiAnswer {
        let questions = split_questions(query);
        info!(count = questions.len(), "Answering questions");
        let answers = questions
            .iter()
            .map(|q| match self.answer(q) {
                Ok(answer) => QuestionOutcome::Answered(answer),
                Err(e) => {
                    warn!(question = %q, error = %e, "Question failed");
                    QuestionOutcome::Failed { question: q.clone(), error: e.to_string() }
                }
            })
            .collect();
        MultiAnswer { original_query: query.to_string(), total_questions: questions.len(), answers }
    }
}
