//! Answer generators and the ordered fallback chain over them.

mod gemini;
mod http;
mod openai;

pub use gemini::GeminiGenerator;
pub use openai::OpenAiCompatGenerator;

pub mod parse {
    pub use super::gemini::parse_response as gemini;
    pub use super::openai::parse_response as openai;
}

use tracing::{debug, warn};

use docqa_core::config::{GeneratorKind, GeneratorSettings};
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};

/// Tries each generator in order and returns the first answer.
///
/// Each strategy is attempted at most once per call. When all fail the error
/// lists every strategy's failure.
pub struct FallbackGenerator {
    strategies: Vec<Box<dyn Generator>>,
}

impl FallbackGenerator {
    pub fn new(strategies: Vec<Box<dyn Generator>>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(Error::InvalidConfig("fallback chain needs at least one generator".into()));
        }
        Ok(Self { strategies })
    }

    /// Builds the chain described by `settings`, in order.
    pub fn from_settings(settings: &[GeneratorSettings]) -> Result<Self> {
        let strategies = settings.iter().map(build_generator).collect::<Result<Vec<_>>>()?;
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|g| g.name()).collect()
    }
}

pub fn build_generator(settings: &GeneratorSettings) -> Result<Box<dyn Generator>> {
    Ok(match settings.kind {
        GeneratorKind::Gemini => Box::new(GeminiGenerator::new(settings)?),
        GeneratorKind::Openai => Box::new(OpenAiCompatGenerator::new(settings)?),
    })
}

impl Generator for FallbackGenerator {
    fn name(&self) -> &str {
        "fallback"
    }

    fn generate(&self, question: &str, context: &str) -> Result<String> {
        let mut failures = Vec::new();
        for (i, generator) in self.strategies.iter().enumerate() {
            match generator.generate(question, context) {
                Ok(answer) => {
                    debug!(generator = generator.name(), attempt = i + 1, "Generated answer");
                    return Ok(answer);
                }
                Err(e) => {
                    warn!(generator = generator.name(), error = %e, "Generator failed, trying next");
                    failures.push(format!("{}: {}", generator.name(), e));
                }
            }
        }
        Err(Error::Generation(format!("all generators failed: {}", failures.join("; "))))
    }
}
