//! Eye regions from 68-point facial landmarks.
//!
//! Landmark detection itself is an external capability: anything that turns a
//! grayscale frame into landmark shapes can implement [`LandmarkProvider`].

use crate::error::{Error, Result};
use crate::frame::GrayImage;
use crate::types::{Point, Shape};

/// Landmark indices of the subject's left eye (iBUG 68-point scheme).
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Landmark indices of the subject's right eye (iBUG 68-point scheme).
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Six landmark points outlining one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRegion {
    pub points: [Point; 6],
}

impl EyeRegion {
    pub const fn new(points: [Point; 6]) -> Self {
        Self { points }
    }

    /// Gather the eye outline from a landmark shape.
    pub fn from_shape(shape: &Shape, indices: &[usize; 6]) -> Result<Self> {
        let mut points = [Point::zero(); 6];
        for (slot, &idx) in points.iter_mut().zip(indices.iter()) {
            *slot = *shape.points.get(idx).ok_or_else(|| {
                Error::InvalidLandmarks(format!(
                    "landmark {} missing from a {}-point shape",
                    idx,
                    shape.num_landmarks()
                ))
            })?;
        }
        Ok(Self { points })
    }
}

/// Left and right eye regions of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePair {
    pub left: EyeRegion,
    pub right: EyeRegion,
}

impl EyePair {
    pub fn from_shape(shape: &Shape) -> Result<Self> {
        Ok(Self {
            left: EyeRegion::from_shape(shape, &LEFT_EYE)?,
            right: EyeRegion::from_shape(shape, &RIGHT_EYE)?,
        })
    }
}

/// Detects faces in a frame and returns their landmark shapes.
///
/// `frame_index` is the acquisition ordinal of `image`; providers backed by
/// precomputed landmarks use it as the lookup key.
pub trait LandmarkProvider {
    fn landmarks(&mut self, frame_index: usize, image: &GrayImage) -> Result<Vec<Shape>>;
}
