//! Live generative provider backed by the Anthropic messages endpoint.
//!
//! The model string is pinned: baseline comparison metrics depend on
//! consistent generation behavior, so bumping it invalidates history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

use super::error::{ProviderError, ProviderResult};
use super::GenerativeProvider;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 200;

/// Generative provider speaking the Anthropic messages wire format.
pub struct ClaudeGenerativeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl ClaudeGenerativeProvider {
    /// Builds a provider from config; fails hard when no API key is set.
    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        let api_key = config.anthropic_api_key.clone().ok_or(
            ProviderError::MissingApiKey {
                provider: "anthropic",
            },
        )?;

        Ok(Self::new(api_key, DEFAULT_MODEL.to_string()))
    }

    /// Builds a provider from explicit parts.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    async fn complete(&self, prompt: &str) -> ProviderResult<String> {
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&MessagesRequest {
                model: &self.model,
                max_tokens: MAX_TOKENS,
                messages: [Message {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await?
            .error_for_status()?;

        let body: MessagesResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse {
                reason: e.to_string(),
            }
        })?;

        body.content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or(ProviderError::MalformedResponse {
                reason: "empty completion".to_string(),
            })
    }
}

impl std::fmt::Debug for ClaudeGenerativeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeGenerativeProvider")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenerativeProvider for ClaudeGenerativeProvider {
    async fn guess(&self, clue_words: &[String], count: usize) -> ProviderResult<Vec<String>> {
        let clue_xml: String = clue_words
            .iter()
            .map(|clue| format!("  <clue>{}</clue>\n", xml_escape(clue)))
            .collect();

        let prompt = format!(
            "You are playing a word-guessing game. Someone is trying to communicate a \
             target word to you using clues.\n\n<clues>\n{clue_xml}</clues>\n\n\
             Based on these clues, what do you think the target word is?\n\n\
             Rules:\n\
             - Provide exactly {count} guesses\n\
             - One word per line\n\
             - Just the word, no explanation or numbering\n\
             - Single words only (no phrases)\n\n\
             Your guesses:"
        );

        let text = self.complete(&prompt).await?;
        let words = parse_word_lines(&text, count);
        debug!(clues = clue_words.len(), guesses = words.len(), "guess complete");
        Ok(words)
    }

    async fn build_bridge(
        &self,
        anchor: &str,
        target: &str,
        count: usize,
    ) -> ProviderResult<Vec<String>> {
        let prompt = format!(
            "You are playing a word-association game. Find words that connect two \
             concepts.\n\n<anchor>{}</anchor>\n<target>{}</target>\n\n\
             Give {count} single words that are each strongly related to BOTH the \
             anchor and the target.\n\n\
             Rules:\n\
             - One word per line, best connection first\n\
             - Just the word, no explanation or numbering\n\
             - Single words only (no phrases)\n\
             - Do not repeat the anchor or target\n\n\
             Your words:",
            xml_escape(anchor),
            xml_escape(target),
        );

        let text = self.complete(&prompt).await?;
        let words = parse_word_lines(&text, count);
        debug!(anchor, target, words = words.len(), "bridge complete");
        Ok(words)
    }
}

/// Minimal XML escaping for words interpolated into prompts.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Extracts one lowercase word per response line, dropping numbering and
/// punctuation the model sometimes adds despite instructions.
fn parse_word_lines(text: &str, count: usize) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let cleaned = line
                .trim()
                .trim_start_matches(['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', '-', ')', ' ']);
            let word: String = cleaned
                .split_whitespace()
                .next()?
                .chars()
                .filter(|c| c.is_alphabetic())
                .collect();
            (!word.is_empty()).then(|| word.to_lowercase())
        })
        .take(count)
        .collect()
}
