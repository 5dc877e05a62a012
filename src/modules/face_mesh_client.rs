use std::time::Duration;
use anyhow::Error;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use crate::config::config::FaceMeshConfig;
use crate::utils::coordinate::{Coordinate2D, FaceLandmarks, FaceObservation};

/// One decoded frame as handed over by the frame source: encoded raster
/// bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct FaceMeshResponse {
    landmarks: Option<Vec<Coordinate2D>>,
}

/// Client for the external face mesh inference service.
#[derive(Debug, Clone)]
pub struct FaceMeshClient {
    http_client: reqwest::Client,
    endpoint: String,
    pub model_name: String,
    pub timeout: i32,
    pub max_num_faces: i32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl FaceMeshClient {
    pub fn new(config: FaceMeshConfig) -> Self {
        FaceMeshClient {
            http_client: reqwest::Client::new(),
            endpoint: config.endpoint,
            model_name: config.model_name,
            timeout: config.timeout,
            max_num_faces: config.max_num_faces,
            refine_landmarks: config.refine_landmarks,
            min_detection_confidence: config.min_detection_confidence,
            min_tracking_confidence: config.min_tracking_confidence,
        }
    }

    /// detect submits one encoded frame to the face mesh service and maps
    /// the result to a per-frame observation. A frame with no detectable
    /// face is an explicit `NoFace` outcome, not an error.
    ///
    /// # Arguments
    /// * `frame` - &VideoFrame
    ///
    /// # Returns
    /// * `Result<FaceObservation, Error>`
    pub async fn detect(&self, frame: &VideoFrame) -> Result<FaceObservation, Error> {
        let form = Form::new()
            .part(
                "frame",
                Part::bytes(frame.data.clone()).file_name("frame.jpg"),
            )
            .text("max_num_faces", self.max_num_faces.to_string())
            .text("refine_landmarks", self.refine_landmarks.to_string())
            .text(
                "min_detection_confidence",
                self.min_detection_confidence.to_string(),
            )
            .text(
                "min_tracking_confidence",
                self.min_tracking_confidence.to_string(),
            );

        let url = format!("{}/models/{}/infer", self.endpoint, self.model_name);
        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout as u64))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::msg(format!(
                "face_mesh_client - service returned {}",
                response.status()
            )));
        }

        let payload: FaceMeshResponse = response.json().await?;
        match payload.landmarks {
            None => {
                debug!("no face detected in frame");
                Ok(FaceObservation::NoFace)
            }
            Some(points) => Ok(FaceObservation::Landmarks(FaceLandmarks::new(points)?)),
        }
    }
}
