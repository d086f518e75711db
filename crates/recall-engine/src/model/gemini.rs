//! Google Generative Language (`generateContent`) client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ModelClient;
use crate::{Error, Result};

/// Connection settings for the Gemini REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
  pub api_key:  String,
  #[serde(default = "default_model")]
  pub model:    String,
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

fn default_model() -> String { "gemini-2.0-flash-exp".to_owned() }

fn default_base_url() -> String {
  "https://generativelanguage.googleapis.com".to_owned()
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  config: GeminiConfig,
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
  contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
  parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl GeminiClient {
  pub fn new(config: GeminiConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    )
  }
}

impl ModelClient for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<String> {
    let body = GenerateRequest {
      contents: [Content { parts: [Part { text: prompt }] }],
    };

    let resp = self
      .client
      .post(self.url())
      .query(&[("key", self.config.api_key.as_str())])
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::ExternalService(format!("generateContent → {status}")));
    }

    let parsed: GenerateResponse = resp.json().await?;
    let text = parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| {
        c.parts
          .into_iter()
          .filter_map(|p| p.text)
          .collect::<String>()
      })
      .ok_or_else(|| Error::ExternalService("generateContent returned no candidates".into()))?;

    Ok(text.trim().to_owned())
  }
}
