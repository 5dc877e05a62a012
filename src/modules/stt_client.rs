use std::time::Duration;
use anyhow::Error;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;
use crate::config::config::TranscriptionConfig;

#[derive(Debug, Deserialize)]
struct TranscriptionSegment {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    language: String,
    language_probability: f32,
    segments: Vec<TranscriptionSegment>,
}

/// Client for the external speech-to-text service.
#[derive(Debug, Clone)]
pub struct SttClient {
    http_client: reqwest::Client,
    endpoint: String,
    pub model_name: String,
    pub timeout: i32,
    pub beam_size: i32,
}

impl SttClient {
    pub fn new(config: TranscriptionConfig) -> Self {
        SttClient {
            http_client: reqwest::Client::new(),
            endpoint: config.endpoint,
            model_name: config.model_name,
            timeout: config.timeout,
            beam_size: config.beam_size,
        }
    }

    /// transcribe submits the recorded media and returns the transcript as
    /// a single opaque string, segments joined with single spaces.
    ///
    /// # Arguments
    /// * `media` - encoded audio/video bytes
    /// * `filename` - original file name, forwarded for container detection
    ///
    /// # Returns
    /// * `Result<String, Error>`
    pub async fn transcribe(&self, media: &[u8], filename: &str) -> Result<String, Error> {
        let form = Form::new()
            .part(
                "file",
                Part::bytes(media.to_vec()).file_name(filename.to_string()),
            )
            .text("beam_size", self.beam_size.to_string());

        let url = format!("{}/models/{}/transcribe", self.endpoint, self.model_name);
        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout as u64))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::msg(format!(
                "stt_client - service returned {}",
                response.status()
            )));
        }

        let payload: TranscriptionResponse = response.json().await?;
        info!(
            language = %payload.language,
            probability = payload.language_probability,
            "detected language"
        );

        let text = payload
            .segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(text.trim().to_string())
    }
}
