//! docqa-rag
//!
//! Question answering over a [`docqa_hybrid::HybridStore`]: document
//! ingestion, multi-question splitting, prompting and generator fallback.

pub mod answer;
pub mod context;
pub mod generator;
pub mod ingest;
pub mod pipeline;
pub mod questions;

pub use answer::{Answer, MultiAnswer, QuestionOutcome};
pub use generator::{FallbackGenerator, GeminiGenerator, OpenAiCompatGenerator};
pub use ingest::{BatchReport, IngestItem, IngestReport, Ingestor};
pub use pipeline::AnswerPipeline;
pub use questions::split_questions;
