use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use docqa_core::config::GeneratorSettings;
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};

use super::http::{api_key_from_env, generation_err, http_client, non_empty, success_body};
use crate::context::render_prompt;

const PROVIDER: &str = "gemini";

/// Google Gemini through the `generateContent` REST endpoint.
pub struct GeminiGenerator {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key_env: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl GeminiGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            name: format!("{PROVIDER}:{}", settings.model),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key_env: settings.api_key_env.clone(),
            api_key: api_key_from_env(&settings.api_key_env),
            temperature: settings.temperature,
        })
    }
}

#[derive(Serialize)]
struct Request<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Concatenated text parts of the first candidate.
pub fn parse_response(body: &str) -> Result<String> {
    let response: Response = serde_json::from_str(body).map_err(|e| generation_err(PROVIDER, e))?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| generation_err(PROVIDER, "response has no candidates"))?;
    let text: String = candidate.content.map(|c| c.parts.into_iter().map(|p| p.text).collect()).unwrap_or_default();
    non_empty(PROVIDER, text)
}

impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, question: &str, context: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Generation(format!("{PROVIDER}: {} is not set", self.api_key_env)))?;
        let prompt = render_prompt(question, context);
        let request = Request {
            contents: vec![Content { role: "user", parts: vec![RequestPart { text: &prompt }] }],
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        };
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", key)
            .json(&request)
            .send()
            .map_err(|e| generation_err(PROVIDER, e))?;
        parse_response(&success_body(PROVIDER, response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_candidate_parts_and_trims() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  The answer"},{"text":" is 42.\n"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), "The answer is 42.");
    }

    #[test]
    fn missing_or_blank_candidates_fail() {
        assert!(matches!(parse_response(r#"{"candidates":[]}"#), Err(Error::Generation(_))));
        assert!(matches!(parse_response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#), Err(Error::Generation(_))));
        assert!(matches!(parse_response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), Err(Error::Generation(_))));
        assert!(parse_response("not json").is_err());
    }

    #[test]
    fn missing_key_is_a_generation_error() {
        let settings = GeneratorSettings { api_key_env: "DOCQA_TEST_UNSET_GEMINI_KEY".into(), ..GeneratorSettings::gemini() };
        let generator = GeminiGenerator::new(&settings).unwrap();
        let err = generator.generate("q", "c").unwrap_err();
        assert!(err.to_string().contains("DOCQA_TEST_UNSET_GEMINI_KEY"));
    }

    #[test]
    fn request_shape() {
        let request = Request {
            contents: vec![Content { role: "user", parts: vec![RequestPart { text: "hi" }] }],
            generation_config: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json.get("generationConfig").is_none());
    }
}
