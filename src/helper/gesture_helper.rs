use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use crate::utils::coordinate::{
    Coordinate2D, FaceLandmarks, FaceObservation, BOTTOM_LIP, LEFT_EYEBROW,
    LEFT_EYE_INNER_CORNER, LEFT_EYE_OUTER_CORNER, LEFT_LOWER_EYELID, LEFT_MOUTH_CORNER,
    LEFT_UPPER_EYELID, RIGHT_EYEBROW, RIGHT_EYE_INNER_CORNER, RIGHT_EYE_OUTER_CORNER,
    RIGHT_LOWER_EYELID, RIGHT_MOUTH_CORNER, RIGHT_UPPER_EYELID, TOP_LIP,
};
use crate::utils::utils::mean;

/// Eye aspect ratio below which a frame counts as a blink frame.
pub const BLINK_EAR_THRESHOLD: f32 = 0.2;

/// Mouth heights below this model a closed/undetectable mouth state.
pub const MOUTH_HEIGHT_EPSILON: f32 = 1e-6;

/// Added to the horizontal eye extent before dividing.
pub const EAR_EPSILON: f32 = 1e-6;

/// Frame basis for the exported blink count, roughly one second of video.
pub const BLINK_NORMALIZATION_FRAMES: f32 = 30.0;

/// Geometric features of a single frame with a usable face detection.
#[derive(Debug, Clone, Copy)]
pub struct FrameMetrics {
    pub smile_ratio: f32,
    pub eyebrow_raise_ratio: f32,
    pub head_tilt: f32,
    pub blink_frame: bool,
}

/// Outcome of the per-frame geometry. `Skip` is a designed no-op branch for
/// a degenerate mouth height, not an error.
#[derive(Debug, Clone, Copy)]
pub enum FrameOutcome {
    Metrics(FrameMetrics),
    Skip,
}

fn euclidean(a: Coordinate2D, b: Coordinate2D) -> f32 {
    (Vector2::new(a.x, a.y) - Vector2::new(b.x, b.y)).norm()
}

fn eye_aspect_ratio(
    upper_lid: Coordinate2D,
    lower_lid: Coordinate2D,
    outer_corner: Coordinate2D,
    inner_corner: Coordinate2D,
) -> f32 {
    euclidean(upper_lid, lower_lid) / (euclidean(outer_corner, inner_corner) + EAR_EPSILON)
}

/// compute_frame_metrics converts one landmark set into the smile, eyebrow,
/// blink and head tilt features for a single frame.
///
/// Landmarks arrive normalized in [0,1] and are scaled into pixel space by
/// the frame dimensions before any distance is taken.
///
/// # Arguments
/// * `landmarks` - &FaceLandmarks
/// * `width` - frame width in pixels
/// * `height` - frame height in pixels
///
/// # Returns
/// * `FrameOutcome`
pub fn compute_frame_metrics(landmarks: &FaceLandmarks, width: f32, height: f32) -> FrameOutcome {
    let left_mouth = landmarks.point_scaled(LEFT_MOUTH_CORNER, width, height);
    let right_mouth = landmarks.point_scaled(RIGHT_MOUTH_CORNER, width, height);
    let top_lip = landmarks.point_scaled(TOP_LIP, width, height);
    let bottom_lip = landmarks.point_scaled(BOTTOM_LIP, width, height);

    let mouth_width = euclidean(left_mouth, right_mouth);
    let mouth_height = euclidean(top_lip, bottom_lip);
    if mouth_height < MOUTH_HEIGHT_EPSILON {
        return FrameOutcome::Skip;
    }
    let smile_ratio = mouth_width / mouth_height;

    let left_eyebrow = landmarks.point_scaled(LEFT_EYEBROW, width, height);
    let left_upper_eyelid = landmarks.point_scaled(LEFT_UPPER_EYELID, width, height);
    let right_eyebrow = landmarks.point_scaled(RIGHT_EYEBROW, width, height);
    let right_upper_eyelid = landmarks.point_scaled(RIGHT_UPPER_EYELID, width, height);

    // Mouth height doubles as a face-scale normalizer so the ratio is
    // resolution and camera-distance invariant. Signed: y grows downward.
    let left_ratio = (left_eyebrow.y - left_upper_eyelid.y) / mouth_height;
    let right_ratio = (right_eyebrow.y - right_upper_eyelid.y) / mouth_height;
    let eyebrow_raise_ratio = (left_ratio + right_ratio) / 2.0;

    let left_ear = eye_aspect_ratio(
        left_upper_eyelid,
        landmarks.point_scaled(LEFT_LOWER_EYELID, width, height),
        landmarks.point_scaled(LEFT_EYE_OUTER_CORNER, width, height),
        landmarks.point_scaled(LEFT_EYE_INNER_CORNER, width, height),
    );
    let right_ear = eye_aspect_ratio(
        right_upper_eyelid,
        landmarks.point_scaled(RIGHT_LOWER_EYELID, width, height),
        landmarks.point_scaled(RIGHT_EYE_OUTER_CORNER, width, height),
        landmarks.point_scaled(RIGHT_EYE_INNER_CORNER, width, height),
    );
    let blink_frame = left_ear < BLINK_EAR_THRESHOLD || right_ear < BLINK_EAR_THRESHOLD;

    // Vertical offset between the outer eye corners, a 2D proxy for head
    // roll rather than a calibrated angle.
    let left_eye_corner = landmarks.point_scaled(LEFT_EYE_OUTER_CORNER, width, height);
    let right_eye_corner = landmarks.point_scaled(RIGHT_EYE_OUTER_CORNER, width, height);
    let head_tilt = (left_eye_corner.y - right_eye_corner.y).abs();

    FrameOutcome::Metrics(FrameMetrics {
        smile_ratio,
        eyebrow_raise_ratio,
        head_tilt,
        blink_frame,
    })
}

/// normalize_blink_count rescales a raw blink-frame count onto a
/// ~1 second basis so clips of different lengths and frame rates compare.
pub fn normalize_blink_count(raw_count: u32, frames: u32) -> u32 {
    (raw_count as f32 / frames.max(1) as f32 * BLINK_NORMALIZATION_FRAMES).round() as u32
}

/// Fixed summary record emitted once per analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSummary {
    pub smile_mean: f32,
    pub eyebrow_raise_mean: f32,
    pub blink_count: u32,
    pub head_pose_mean: f32,
}

/// Running per-analysis state for the gesture feature stream.
///
/// Accumulators only grow. A frame with no detected face or a degenerate
/// mouth height contributes to the frame counter but not to the ratio
/// accumulators. Each analysis run must start from a fresh instance; the
/// accumulator is not reused across runs.
#[derive(Debug, Default)]
pub struct GestureAccumulator {
    smile_ratios: Vec<f32>,
    eyebrow_raise_ratios: Vec<f32>,
    head_tilts: Vec<f32>,
    blink_count: u32,
    frame_idx: u32,
}

impl GestureAccumulator {
    /// new initializes an empty accumulator for one analysis run.
    pub fn new() -> Self {
        GestureAccumulator::default()
    }

    /// observe folds one frame's observation into the running state.
    ///
    /// # Arguments
    /// * `observation` - &FaceObservation for the frame
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    pub fn observe(&mut self, observation: &FaceObservation, width: f32, height: f32) {
        self.frame_idx += 1;

        let landmarks = match observation {
            FaceObservation::Landmarks(landmarks) => landmarks,
            FaceObservation::NoFace => return,
        };

        match compute_frame_metrics(landmarks, width, height) {
            FrameOutcome::Skip => {}
            FrameOutcome::Metrics(metrics) => {
                self.smile_ratios.push(metrics.smile_ratio);
                self.eyebrow_raise_ratios.push(metrics.eyebrow_raise_ratio);
                self.head_tilts.push(metrics.head_tilt);
                if metrics.blink_frame {
                    self.blink_count += 1;
                }
            }
        }
    }

    /// frames_processed returns the number of frames folded in so far,
    /// detected or not.
    pub fn frames_processed(&self) -> u32 {
        self.frame_idx
    }

    /// summarize aggregates the accumulated stream into the fixed summary
    /// record. Means default to 0 over empty accumulators; an empty or
    /// all-degenerate stream yields the all-zero summary.
    pub fn summarize(&self) -> GestureSummary {
        GestureSummary {
            smile_mean: mean(&self.smile_ratios),
            eyebrow_raise_mean: mean(&self.eyebrow_raise_ratios),
            blink_count: normalize_blink_count(self.blink_count, self.frame_idx),
            head_pose_mean: mean(&self.head_tilts),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use super::*;
    use crate::utils::coordinate::NUM_FACE_MESH_LANDMARKS;

    const WIDTH: f32 = 100.0;
    const HEIGHT: f32 = 100.0;

    fn point(x: f32, y: f32) -> Coordinate2D {
        Coordinate2D { x, y }
    }

    /// A frontal face, eyes open, mouth 50 px wide and 25 px tall at
    /// 100x100, so smile_ratio is exactly 2.0. All coordinates are dyadic
    /// so the scaled pixel values carry no rounding error.
    fn open_face() -> FaceLandmarks {
        let mut points = vec![point(0.0, 0.0); NUM_FACE_MESH_LANDMARKS];

        points[LEFT_MOUTH_CORNER] = point(0.25, 0.5);
        points[RIGHT_MOUTH_CORNER] = point(0.75, 0.5);
        points[TOP_LIP] = point(0.5, 0.375);
        points[BOTTOM_LIP] = point(0.5, 0.625);

        points[LEFT_EYEBROW] = point(0.3125, 0.25);
        points[RIGHT_EYEBROW] = point(0.6875, 0.25);

        points[LEFT_UPPER_EYELID] = point(0.3125, 0.3125);
        points[LEFT_LOWER_EYELID] = point(0.3125, 0.375);
        points[RIGHT_UPPER_EYELID] = point(0.6875, 0.3125);
        points[RIGHT_LOWER_EYELID] = point(0.6875, 0.375);

        points[LEFT_EYE_OUTER_CORNER] = point(0.25, 0.34375);
        points[LEFT_EYE_INNER_CORNER] = point(0.375, 0.34375);
        points[RIGHT_EYE_INNER_CORNER] = point(0.625, 0.34375);
        points[RIGHT_EYE_OUTER_CORNER] = point(0.75, 0.34375);

        FaceLandmarks::new(points).unwrap()
    }

    /// Same face with eyelids nearly touching: EAR 0.125 on both sides.
    fn closed_eyes_face() -> FaceLandmarks {
        let open = open_face();
        let mut points: Vec<Coordinate2D> = (0..NUM_FACE_MESH_LANDMARKS)
            .map(|idx| open.point(idx))
            .collect();
        points[LEFT_UPPER_EYELID] = point(0.3125, 0.34375);
        points[LEFT_LOWER_EYELID] = point(0.3125, 0.359375);
        points[RIGHT_UPPER_EYELID] = point(0.6875, 0.34375);
        points[RIGHT_LOWER_EYELID] = point(0.6875, 0.359375);
        FaceLandmarks::new(points).unwrap()
    }

    /// Mouth landmarks collapsed onto a single point.
    fn degenerate_mouth_face() -> FaceLandmarks {
        let open = open_face();
        let mut points: Vec<Coordinate2D> = (0..NUM_FACE_MESH_LANDMARKS)
            .map(|idx| open.point(idx))
            .collect();
        points[TOP_LIP] = point(0.5, 0.5);
        points[BOTTOM_LIP] = point(0.5, 0.5);
        FaceLandmarks::new(points).unwrap()
    }

    #[test]
    fn test_open_face_metrics() {
        let metrics = match compute_frame_metrics(&open_face(), WIDTH, HEIGHT) {
            FrameOutcome::Metrics(metrics) => metrics,
            FrameOutcome::Skip => panic!("open face must not skip"),
        };
        assert_eq!(metrics.smile_ratio, 2.0);
        assert_eq!(metrics.eyebrow_raise_ratio, -0.25);
        assert_eq!(metrics.head_tilt, 0.0);
        assert!(!metrics.blink_frame);
    }

    #[test]
    fn test_closed_eyes_is_blink_frame() {
        let metrics = match compute_frame_metrics(&closed_eyes_face(), WIDTH, HEIGHT) {
            FrameOutcome::Metrics(metrics) => metrics,
            FrameOutcome::Skip => panic!("closed eyes must not skip"),
        };
        assert!(metrics.blink_frame);
    }

    #[test]
    fn test_degenerate_mouth_skips_frame() {
        assert!(matches!(
            compute_frame_metrics(&degenerate_mouth_face(), WIDTH, HEIGHT),
            FrameOutcome::Skip
        ));
    }

    #[test]
    fn test_head_tilt_vertical_offset() {
        let open = open_face();
        let mut points: Vec<Coordinate2D> = (0..NUM_FACE_MESH_LANDMARKS)
            .map(|idx| open.point(idx))
            .collect();
        points[LEFT_EYE_OUTER_CORNER] = point(0.25, 0.3125);
        points[RIGHT_EYE_OUTER_CORNER] = point(0.75, 0.375);
        let tilted = FaceLandmarks::new(points).unwrap();

        let metrics = match compute_frame_metrics(&tilted, WIDTH, HEIGHT) {
            FrameOutcome::Metrics(metrics) => metrics,
            FrameOutcome::Skip => panic!("tilted face must not skip"),
        };
        assert_eq!(metrics.head_tilt, 6.25);
    }

    // 30 frames, all non-degenerate, constant smile_ratio 2.0.
    #[test]
    fn test_constant_smile_stream() {
        let mut acc = GestureAccumulator::new();
        let observation = FaceObservation::Landmarks(open_face());
        for _ in 0..30 {
            acc.observe(&observation, WIDTH, HEIGHT);
        }

        let summary = acc.summarize();
        assert_eq!(summary.smile_mean, 2.0);
        assert_eq!(summary.blink_count, 0);
        assert_eq!(acc.frames_processed(), 30);
    }

    // 10 frames: 3 with no face, 7 with a degenerate mouth. Accumulators
    // stay empty; the frame counter still reaches 10.
    #[test]
    fn test_no_face_and_degenerate_stream() {
        let mut acc = GestureAccumulator::new();
        for _ in 0..3 {
            acc.observe(&FaceObservation::NoFace, WIDTH, HEIGHT);
        }
        let degenerate = FaceObservation::Landmarks(degenerate_mouth_face());
        for _ in 0..7 {
            acc.observe(&degenerate, WIDTH, HEIGHT);
        }

        assert_eq!(acc.frames_processed(), 10);
        let summary = acc.summarize();
        assert_eq!(summary.smile_mean, 0.0);
        assert_eq!(summary.eyebrow_raise_mean, 0.0);
        assert_eq!(summary.blink_count, 0);
        assert_eq!(summary.head_pose_mean, 0.0);
    }

    // 60 frames at a simulated 30fps with eyes closed on frames 10-15:
    // 6 raw blink frames normalize to round(6/60*30) = 3.
    #[test]
    fn test_blink_frames_normalized() {
        let mut acc = GestureAccumulator::new();
        let open = FaceObservation::Landmarks(open_face());
        let closed = FaceObservation::Landmarks(closed_eyes_face());
        for frame in 0..60 {
            if (10..16).contains(&frame) {
                acc.observe(&closed, WIDTH, HEIGHT);
            } else {
                acc.observe(&open, WIDTH, HEIGHT);
            }
        }

        assert_eq!(acc.summarize().blink_count, 3);
    }

    #[test]
    fn test_single_frame_summary() {
        let mut acc = GestureAccumulator::new();
        acc.observe(&FaceObservation::Landmarks(open_face()), WIDTH, HEIGHT);

        let summary = acc.summarize();
        assert_eq!(summary.smile_mean, 2.0);
        assert_eq!(acc.frames_processed(), 1);
    }

    #[test]
    fn test_empty_stream_all_zero() {
        let summary = GestureAccumulator::new().summarize();
        assert_eq!(
            summary,
            GestureSummary {
                smile_mean: 0.0,
                eyebrow_raise_mean: 0.0,
                blink_count: 0,
                head_pose_mean: 0.0,
            }
        );
    }

    #[test]
    fn test_deterministic_reruns() {
        let run = || {
            let mut acc = GestureAccumulator::new();
            let open = FaceObservation::Landmarks(open_face());
            let closed = FaceObservation::Landmarks(closed_eyes_face());
            for frame in 0..45 {
                if frame % 7 == 0 {
                    acc.observe(&closed, WIDTH, HEIGHT);
                } else if frame % 11 == 0 {
                    acc.observe(&FaceObservation::NoFace, WIDTH, HEIGHT);
                } else {
                    acc.observe(&open, WIDTH, HEIGHT);
                }
            }
            acc.summarize()
        };

        assert_eq!(run(), run());
    }

    proptest! {
        // Scaling raw blink frames and the frame count by the same factor
        // (a frame-rate change with proportional blink occurrence) leaves
        // the normalized count unchanged.
        #[test]
        fn prop_normalization_scale_invariant(
            frames in 1u32..1000,
            raw_fraction in 0.0f64..=1.0,
            factor in 1u32..=10,
        ) {
            let raw = (frames as f64 * raw_fraction) as u32;
            prop_assert_eq!(
                normalize_blink_count(raw, frames),
                normalize_blink_count(raw * factor, frames * factor)
            );
        }

        // With at most one blink frame per frame, the normalized count is
        // bounded by the normalization basis.
        #[test]
        fn prop_normalized_count_bounded(frames in 1u32..1000, raw_fraction in 0.0f64..=1.0) {
            let raw = (frames as f64 * raw_fraction) as u32;
            prop_assert!(normalize_blink_count(raw, frames) <= BLINK_NORMALIZATION_FRAMES as u32);
        }
    }
}
