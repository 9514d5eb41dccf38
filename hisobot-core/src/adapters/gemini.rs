//! Gemini-backed classifier and analyst
//!
//! Both ports go through the same generateContent endpoint. Transport
//! failures, non-2xx responses and unparseable payloads all surface as
//! `ClassificationUnavailable`, which the classification cascade
//! recovers from locally.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::domain::result::{Error, Result};
use crate::ports::{Analyst, LabelClassifier};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| Error::ClassificationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ClassificationUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let payload: GenerateResponse = response
            .json()
            .map_err(|e| Error::ClassificationUnavailable(e.to_string()))?;

        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::ClassificationUnavailable("empty response".to_string()))
    }
}

impl LabelClassifier for GeminiClient {
    fn classify(
        &self,
        text: &str,
        income_labels: &[String],
        expense_labels: &[String],
    ) -> Result<String> {
        let prompt = format!(
            "Определи категорию операции строго по правилам.\n\
             Категории доходов: {}.\n\
             Категории расходов: {}.\n\
             Операция: \"{}\".\n\
             Ответь одним словом: точным названием категории из списков выше, \
             без кавычек и пояснений.",
            income_labels.join(", "),
            expense_labels.join(", "),
            text,
        );
        self.generate(&prompt)
    }
}

impl Analyst for GeminiClient {
    fn answer(&self, question: &str, context: &str) -> Result<String> {
        let prompt = format!(
            "Ты финансовый аналитик семейного бюджета. Данные пользователя: {context}\n\
             Вопрос: {question}\n\
             Ответь кратко и по делу, на языке вопроса."
        );
        self.generate(&prompt)
    }
}

/// Stand-in for keyless installations: every call reports the remote
/// tier as unavailable, so only the local rules run.
pub struct OfflineClassifier;

impl LabelClassifier for OfflineClassifier {
    fn classify(&self, _text: &str, _income: &[String], _expense: &[String]) -> Result<String> {
        Err(Error::ClassificationUnavailable(
            "no API key configured".to_string(),
        ))
    }
}

impl Analyst for OfflineClassifier {
    fn answer(&self, _question: &str, _context: &str) -> Result<String> {
        Err(Error::ClassificationUnavailable(
            "no API key configured".to_string(),
        ))
    }
}
