use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::helper::gesture_helper::{GestureAccumulator, GestureSummary};
use crate::modules::face_mesh_client::{FaceMeshClient, VideoFrame};
use crate::modules::feedback_client::{FeedbackClient, FeedbackReport};
use crate::modules::stt_client::SttClient;
use crate::utils::coordinate::FaceObservation;

/// Ordered frame supply for one recorded video, implemented by the
/// enclosing application's decoder. `Ok(None)` signals end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, Error>;
}

/// Combined record for one analyzed speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechAnalysis {
    pub transcription: String,
    pub feedback: FeedbackReport,
    pub gesture_metrics: GestureSummary,
    pub confidence_score: f32,
    pub nervousness_score: f32,
}

#[derive(Debug, Clone)]
pub struct SpeechEvalPipeline {
    face_mesh: FaceMeshClient,
    stt: SttClient,
    feedback: FeedbackClient,
}

impl SpeechEvalPipeline {
    /// new initializes new instance of the pipeline
    pub fn new(
        face_mesh_client: FaceMeshClient,
        stt_client: SttClient,
        feedback_client: FeedbackClient,
    ) -> Self {
        SpeechEvalPipeline {
            face_mesh: face_mesh_client,
            stt: stt_client,
            feedback: feedback_client,
        }
    }

    /// confidence_score derives a bounded 0-10 confidence index from the
    /// gesture summary. A wider smile raises it, head movement lowers it.
    ///
    /// # Arguments
    /// * `summary` - &GestureSummary
    ///
    /// # Returns
    /// * `f32`
    pub fn confidence_score(&self, summary: &GestureSummary) -> f32 {
        (summary.smile_mean * 10.0 - summary.head_pose_mean * 5.0).clamp(0.0, 10.0)
    }

    /// nervousness_score derives a bounded 0-10 nervousness index from the
    /// gesture summary: eyebrow activity, blink rate and head movement.
    ///
    /// # Arguments
    /// * `summary` - &GestureSummary
    ///
    /// # Returns
    /// * `f32`
    pub fn nervousness_score(&self, summary: &GestureSummary) -> f32 {
        let blink_norm = (summary.blink_count as f32).min(20.0) / 20.0;
        (summary.eyebrow_raise_mean * 5.0 + blink_norm * 5.0 + summary.head_pose_mean * 5.0)
            .clamp(0.0, 10.0)
    }

    /// analyze_gestures runs the gesture feature pipeline over an already
    /// extracted observation sequence. Every call starts from a fresh
    /// accumulator; partial results never leak between runs.
    ///
    /// # Arguments
    /// * `observations` - per-frame extractor outcomes in stream order
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    ///
    /// # Returns
    /// * `GestureSummary`
    pub fn analyze_gestures<I>(&self, observations: I, width: f32, height: f32) -> GestureSummary
    where
        I: IntoIterator<Item = FaceObservation>,
    {
        let mut accumulator = GestureAccumulator::new();
        for observation in observations {
            accumulator.observe(&observation, width, height);
        }
        accumulator.summarize()
    }

    /// analyze_video drives the frame source through the landmark extractor
    /// and folds each observation into the gesture accumulator.
    ///
    /// A frame source or extractor failure ends the stream early and the
    /// summary is taken over whatever was collected; the analysis itself
    /// never fails. The worst case is the all-zero summary.
    ///
    /// # Arguments
    /// * `frames` - frame supply for the recorded video
    ///
    /// # Returns
    /// * `GestureSummary`
    pub async fn analyze_video<S: FrameSource>(&self, frames: &mut S) -> GestureSummary {
        let mut accumulator = GestureAccumulator::new();

        loop {
            let frame = match frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("frame source failed, ending stream early: {e:#}");
                    break;
                }
            };

            let observation = match self.face_mesh.detect(&frame).await {
                Ok(observation) => observation,
                Err(e) => {
                    warn!("landmark extraction failed, ending stream early: {e:#}");
                    break;
                }
            };

            accumulator.observe(&observation, frame.width as f32, frame.height as f32);
        }

        info!(frames = accumulator.frames_processed(), "gesture stream complete");
        accumulator.summarize()
    }

    /// analyze transcribes the recording, collects the model's rubric
    /// feedback and runs the gesture feature pipeline, combining all three
    /// with the derived confidence and nervousness indices.
    ///
    /// A failed transcription degrades to an empty transcript; a failed
    /// feedback call is propagated.
    ///
    /// # Arguments
    /// * `media` - encoded audio/video bytes of the recording
    /// * `filename` - original file name
    /// * `frames` - frame supply for the same recording
    ///
    /// # Returns
    /// * `Result<SpeechAnalysis, Error>`
    pub async fn analyze<S: FrameSource>(
        &self,
        media: &[u8],
        filename: &str,
        frames: &mut S,
    ) -> Result<SpeechAnalysis, Error> {
        let transcription = match self.stt.transcribe(media, filename).await {
            Ok(text) => text,
            Err(e) => {
                warn!("transcription failed, continuing with empty transcript: {e:#}");
                String::new()
            }
        };

        let feedback = self.feedback.evaluate(&transcription).await?;
        let gesture_metrics = self.analyze_video(frames).await;
        let confidence_score = self.confidence_score(&gesture_metrics);
        let nervousness_score = self.nervousness_score(&gesture_metrics);

        Ok(SpeechAnalysis {
            transcription,
            feedback,
            gesture_metrics,
            confidence_score,
            nervousness_score,
        })
    }
}
