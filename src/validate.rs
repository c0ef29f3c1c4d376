use crate::{
    error::Error,
    pose::{ImageDims, LandmarkKind, Skeleton},
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Which landmarks must be confidently detected before analysis proceeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Nose, shoulders and hips.
    Minimal,
    /// Minimal plus knees and ankles.
    Extended,
}

impl Default for Requirement {
    fn default() -> Self {
        Self::Minimal
    }
}

impl Requirement {
    pub fn landmarks(self) -> &'static [LandmarkKind] {
        use LandmarkKind::*;
        match self {
            Self::Minimal => &[Nose, LeftShoulder, RightShoulder, LeftHip, RightHip],
            Self::Extended => &[
                Nose,
                LeftShoulder,
                RightShoulder,
                LeftHip,
                RightHip,
                LeftKnee,
                RightKnee,
                LeftAnkle,
                RightAnkle,
            ],
        }
    }
}

/// Inclusive pixel bounds an input image must fall within.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBounds {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for ImageBounds {
    fn default() -> Self {
        Self {
            min_width: 300,
            max_width: 4000,
            min_height: 400,
            max_height: 6000,
        }
    }
}

impl ImageBounds {
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_width == 0
            || self.min_height == 0
            || self.min_width > self.max_width
            || self.min_height > self.max_height
        {
            return Err(Error::InvalidImageBounds(*self));
        }
        Ok(())
    }

    pub fn contains(&self, dims: ImageDims) -> bool {
        (self.min_width..=self.max_width).contains(&dims.width)
            && (self.min_height..=self.max_height).contains(&dims.height)
    }
}

impl fmt::Display for ImageBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..={} x {}..={}",
            self.min_width, self.max_width, self.min_height, self.max_height
        )
    }
}

pub fn validate_dimensions(dims: ImageDims, bounds: &ImageBounds) -> Result<(), Error> {
    if bounds.contains(dims) {
        Ok(())
    } else {
        Err(Error::ImageFormat {
            width: dims.width,
            height: dims.height,
            bounds: *bounds,
        })
    }
}

/// Check that every landmark required by `requirement` reaches `threshold`.
pub fn validate_landmarks(
    skeleton: &Skeleton,
    requirement: Requirement,
    threshold: f32,
) -> Result<(), Error> {
    let failing = requirement
        .landmarks()
        .iter()
        .filter(|&&kind| !skeleton.is_usable(kind, threshold))
        .map(|&kind| (kind, skeleton.get(kind).visibility()))
        .collect::<Vec<_>>();

    if failing.is_empty() {
        Ok(())
    } else {
        Err(Error::LowConfidenceDetection { failing, threshold })
    }
}
