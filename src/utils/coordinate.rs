use anyhow::Error;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Number of points produced by the face mesh model for one detected face.
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

// Anatomical landmark indices into the face mesh point set.
pub const LEFT_MOUTH_CORNER: usize = 61;
pub const RIGHT_MOUTH_CORNER: usize = 291;
pub const TOP_LIP: usize = 13;
pub const BOTTOM_LIP: usize = 14;
pub const LEFT_EYEBROW: usize = 105;
pub const RIGHT_EYEBROW: usize = 334;
pub const LEFT_UPPER_EYELID: usize = 159;
pub const LEFT_LOWER_EYELID: usize = 145;
pub const RIGHT_UPPER_EYELID: usize = 386;
pub const RIGHT_LOWER_EYELID: usize = 374;
pub const LEFT_EYE_OUTER_CORNER: usize = 33;
pub const LEFT_EYE_INNER_CORNER: usize = 133;
pub const RIGHT_EYE_INNER_CORNER: usize = 362;
pub const RIGHT_EYE_OUTER_CORNER: usize = 263;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate2D {
    pub x: f32,
    pub y: f32,
}

impl Coordinate2D {
    /// scaled maps a normalized [0,1] coordinate into pixel space.
    pub fn scaled(&self, width: f32, height: f32) -> Coordinate2D {
        Coordinate2D {
            x: self.x * width,
            y: self.y * height,
        }
    }
}

/// One detected face as an ordered, fixed-length point set in normalized
/// [0,1] coordinates, indexed by the face mesh anatomical scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceLandmarks {
    points: Vec<Coordinate2D>,
}

impl FaceLandmarks {
    /// new builds a landmark set from the extractor's raw point list.
    ///
    /// # Arguments
    /// * `points` - Vec<Coordinate2D> of length NUM_FACE_MESH_LANDMARKS
    ///
    /// # Returns
    /// * `Result<FaceLandmarks, Error>`
    pub fn new(points: Vec<Coordinate2D>) -> Result<Self, Error> {
        if points.len() != NUM_FACE_MESH_LANDMARKS {
            return Err(Error::msg(format!(
                "coordinate - expected {} landmarks, got {}",
                NUM_FACE_MESH_LANDMARKS,
                points.len()
            )));
        }
        Ok(FaceLandmarks { points })
    }

    /// from_ndarray builds a landmark set from a (468, 2) matrix.
    ///
    /// # Arguments
    /// * `arr` - &Array2<f32> of shape (NUM_FACE_MESH_LANDMARKS, 2)
    ///
    /// # Returns
    /// * `Result<FaceLandmarks, Error>`
    pub fn from_ndarray(arr: &Array2<f32>) -> Result<Self, Error> {
        if arr.shape() != [NUM_FACE_MESH_LANDMARKS, 2] {
            return Err(Error::msg(format!(
                "coordinate - expected shape ({}, 2), got {:?}",
                NUM_FACE_MESH_LANDMARKS,
                arr.shape()
            )));
        }
        let points = arr
            .rows()
            .into_iter()
            .map(|row| Coordinate2D { x: row[0], y: row[1] })
            .collect();
        Ok(FaceLandmarks { points })
    }

    /// point returns the normalized coordinate at an anatomical index.
    pub fn point(&self, idx: usize) -> Coordinate2D {
        self.points[idx]
    }

    /// point_scaled returns the coordinate at an anatomical index in pixel space.
    pub fn point_scaled(&self, idx: usize, width: f32, height: f32) -> Coordinate2D {
        self.points[idx].scaled(width, height)
    }
}

/// Per-frame outcome of the landmark extractor. Absence of a face is a
/// first-class outcome, not an error.
#[derive(Debug, Clone)]
pub enum FaceObservation {
    Landmarks(FaceLandmarks),
    NoFace,
}
