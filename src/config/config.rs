use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceMeshConfig {
    pub endpoint: String,
    pub model_name: String,
    pub timeout: i32,
    pub max_num_faces: i32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl FaceMeshConfig {
    pub fn new() -> Self {
        FaceMeshConfig {
            endpoint: "http://localhost:8500".to_string(),
            model_name: "face_mesh".to_string(),
            timeout: 20,
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub model_name: String,
    pub timeout: i32,
    pub beam_size: i32,
}

impl TranscriptionConfig {
    pub fn new() -> Self {
        TranscriptionConfig {
            endpoint: "http://localhost:8600".to_string(),
            model_name: "base".to_string(),
            timeout: 60,
            beam_size: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub model_name: String,
    pub timeout: i32,
}

impl FeedbackConfig {
    pub fn new() -> Self {
        FeedbackConfig {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model_name: "gemini-2.0-flash".to_string(),
            timeout: 60,
        }
    }
}
