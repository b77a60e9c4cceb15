use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use docqa_core::config::GeneratorSettings;
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};

use super::http::{api_key_from_env, generation_err, http_client, non_empty, success_body};
use crate::context::render_prompt;

/// Any OpenAI-compatible `chat/completions` endpoint (Groq, OpenAI, local servers).
pub struct OpenAiCompatGenerator {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key_env: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl OpenAiCompatGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            name: format!("openai:{}", settings.model),
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
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Message content of the first choice.
pub fn parse_response(body: &str) -> Result<String> {
    let response: Response = serde_json::from_str(body).map_err(|e| generation_err("openai", e))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| generation_err("openai", "response has no choices"))?;
    non_empty("openai", choice.message.content.unwrap_or_default())
}

impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, question: &str, context: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Generation(format!("{}: {} is not set", self.name, self.api_key_env)))?;
        let prompt = render_prompt(question, context);
        let request = Request {
            model: &self.model,
            messages: vec![Message { role: "user", content: &prompt }],
            temperature: self.temperature,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&request)
            .send()
            .map_err(|e| generation_err(&self.name, e))?;
        parse_response(&success_body(&self.name, response)?)
    }
}
