use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig, types::CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// System prompt for judge calls
const JUDGE_SYSTEM_PROMPT: &str = "You are a meticulous judge of question answering systems. \
    Reply in exactly the format requested, with no extra commentary.";

/// Minimal chat-completion surface the pipeline needs from a model provider
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one system+user exchange to `model` and return the assistant text
    async fn complete(&self, model: &str, system: &str, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible implementation of [`ChatCompletion`]
#[derive(Debug)]
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
}

impl OpenAiChat {
    /// Create a client for an OpenAI-compatible endpoint, reading the API key
    /// from the named environment variable
    pub fn new(api_endpoint: &str, env_var_api_key: &str) -> Result<Self> {
        let api_key = std::env::var(env_var_api_key)
            .with_context(|| format!("Environment variable {} not found", env_var_api_key))?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_endpoint);

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }

    /// Create a client from a pre-built configuration
    pub fn with_config(openai_config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(openai_config),
        }
    }

    /// Run one chat completion with explicit sampling settings
    pub async fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let system_message = async_openai::types::ChatCompletionRequestSystemMessageArgs::default()
            .content(system.to_string())
            .build()
            .context("Failed to build system message")?
            .into();

        let user_message = async_openai::types::ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .messages([system_message, user_message])
            .temperature(temperature);
        if let Some(max_tokens) = max_tokens {
            builder.max_tokens(max_tokens as u16);
        }
        let request = builder
            .build()
            .context("Failed to build chat completion request")?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;

        let content = match response.choices.first() {
            Some(choice) => match &choice.message.content {
                Some(content) => content.clone(),
                None => String::new(),
            },
            None => String::new(),
        };

        Ok(content)
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    async fn complete(&self, model: &str, system: &str, prompt: &str) -> Result<String> {
        self.generate(model, system, prompt, 0.0, None).await
    }
}

/// Judge handle used by metrics while scoring a single response.
///
/// Completions are cached per instance, so one service must never be shared
/// across responses; the scorer builds a fresh one for every response.
pub struct JudgeService {
    model: String,
    chat: Arc<dyn ChatCompletion>,
    cache: Mutex<HashMap<String, String>>,
}

impl JudgeService {
    /// Create a judge for one response over the given chat transport
    pub fn with_chat(model: impl Into<String>, chat: Arc<dyn ChatCompletion>) -> Self {
        Self {
            model: model.into(),
            chat,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Model identifier this judge queries
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the judge a free-form question, reusing a cached completion when
    /// the same prompt was already asked for this response
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        if let Some(hit) = self.cache_get(prompt) {
            debug!(model = %self.model, "judge cache hit");
            return Ok(hit);
        }

        let completion = self
            .chat
            .complete(&self.model, JUDGE_SYSTEM_PROMPT, prompt)
            .await?;

        self.cache_put(prompt, &completion);
        Ok(completion)
    }

    /// Ask for a numeric rating and parse the first number in the reply
    pub async fn ask_score(&self, prompt: &str) -> Result<f64> {
        let reply = self.ask(prompt).await?;
        parse_score(&reply).with_context(|| format!("Judge reply was not a number: {reply:?}"))
    }

    /// Ask a yes/no question and parse the reply
    pub async fn ask_binary(&self, prompt: &str) -> Result<bool> {
        let reply = self.ask(prompt).await?;
        parse_binary(&reply).with_context(|| format!("Judge reply was not yes/no: {reply:?}"))
    }

    fn cache_get(&self, prompt: &str) -> Option<String> {
        self.cache.lock().ok()?.get(prompt).cloned()
    }

    fn cache_put(&self, prompt: &str, completion: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(prompt.to_string(), completion.to_string());
        }
    }
}

/// Pull the first parseable number out of judge text, tolerating
/// surrounding prose like "Score: 4.5/5"
fn parse_score(reply: &str) -> Option<f64> {
    reply
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .filter(|token| !token.is_empty())
        .find_map(|token| token.parse::<f64>().ok())
}

/// Interpret a judge reply as a yes/no verdict
fn parse_binary(reply: &str) -> Option<bool> {
    let normalized = reply.trim().to_lowercase();
    if normalized.starts_with("yes") || normalized.starts_with("true") {
        Some(true)
    } else if normalized.starts_with("no") || normalized.starts_with("false") {
        Some(false)
    } else {
        None
    }
}
