use std::time::Duration;
use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::config::config::FeedbackConfig;
use crate::utils::utils::strip_code_fences;

/// Score, comment and suggested improvements for one evaluation criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionFeedback {
    pub score: f32,
    pub comment: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// The model's rubric verdict over a transcribed speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    #[serde(rename = "Clarity")]
    pub clarity: CriterionFeedback,
    #[serde(rename = "Arguments")]
    pub arguments: CriterionFeedback,
    #[serde(rename = "Grammar")]
    pub grammar: CriterionFeedback,
    #[serde(rename = "Delivery")]
    pub delivery: CriterionFeedback,
    #[serde(rename = "Overall")]
    pub overall: CriterionFeedback,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Client for the external language model that scores the speech.
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    pub model_name: String,
    pub timeout: i32,
}

impl FeedbackClient {
    /// new builds the client, reading the API key from `GEMINI_API_KEY`.
    pub fn new(config: FeedbackConfig) -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::msg("feedback_client - GEMINI_API_KEY is not set"))?;

        Ok(FeedbackClient {
            http_client: reqwest::Client::new(),
            endpoint: config.endpoint,
            api_key,
            model_name: config.model_name,
            timeout: config.timeout,
        })
    }

    fn build_prompt(transcription: &str) -> String {
        format!(
            r#"Evaluate the following extempore speech and return ONLY valid JSON
(no markdown, no extra text) in this format:
{{
  "Clarity":   {{ "score": <0-10>, "comment": "...", "improvements": ["...","..."] }},
  "Arguments": {{ "score": <0-10>, "comment": "...", "improvements": ["...","..."] }},
  "Grammar":   {{ "score": <0-10>, "comment": "...", "improvements": ["...","..."] }},
  "Delivery":  {{ "score": <0-10>, "comment": "...", "improvements": ["...","..."] }},
  "Overall":   {{ "score": <0-10>, "comment": "...", "improvements": ["...","..."] }}
}}
Speech:
{transcription}"#
        )
    }

    /// evaluate submits the transcript for rubric scoring and parses the
    /// model's JSON verdict. Markdown code fences in the response text are
    /// tolerated and stripped before parsing.
    ///
    /// # Arguments
    /// * `transcription` - the transcribed speech
    ///
    /// # Returns
    /// * `Result<FeedbackReport, Error>`
    pub async fn evaluate(&self, transcription: &str) -> Result<FeedbackReport, Error> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(transcription),
                }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model_name
        );
        info!(model = %self.model_name, "requesting speech feedback");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .timeout(Duration::from_secs(self.timeout as u64))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::msg(format!(
                "feedback_client - service returned {}: {}",
                status, body
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let raw_text = payload
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .ok_or_else(|| Error::msg("feedback_client - model response has no candidates"))?;

        parse_report(raw_text)
    }
}

fn parse_report(raw_text: &str) -> Result<FeedbackReport, Error> {
    let clean = strip_code_fences(raw_text);
    let report = serde_json::from_str(&clean)?;
    Ok(report)
}
