use crate::{pose::LandmarkKind, profile::Version, validate::ImageBounds};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image dimensions {width}x{height} are outside the accepted range {bounds}")]
    ImageFormat {
        width: u32,
        height: u32,
        bounds: ImageBounds,
    },

    #[error("no subject detected in the image")]
    NoSubjectDetected,

    #[error("skeleton is missing landmarks: {0:?}")]
    IncompleteSkeleton(Vec<LandmarkKind>),

    #[error("low confidence detection: {failing:?} below visibility threshold {threshold}")]
    LowConfidenceDetection {
        failing: Vec<(LandmarkKind, f32)>,
        threshold: f32,
    },

    #[error("failed to construct NotNan from f64: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f64),

    #[error("computed a non-finite score for {0}")]
    NonFiniteScore(&'static str),

    #[error("failed to convert usize value to landmark kind: {0}")]
    ConvertUSizeToLandmarkKind(usize),

    #[error("landmark record {0} has neither a name nor an id")]
    UnnamedLandmark(usize),

    #[error("coordinates of {0:?} must be finite")]
    NonFiniteCoordinate(LandmarkKind),

    #[error("coordinates ({1}, {2}) of {0:?} are outside the normalized image frame")]
    CoordinateOutOfRange(LandmarkKind, f64, f64),

    #[error("visibility of {0:?} must lie in [0, 1], got {1}")]
    InvalidVisibility(LandmarkKind, f32),

    #[error("score weights of the {0} profile sum to {1}, expected 1.0")]
    WeightsDoNotSumToOne(Version, f64),

    #[error("unknown algorithm version: {0:?}")]
    UnknownVersion(String),

    #[error("classification breakpoints must be strictly descending within [0, 100]: {0:?}")]
    InvalidBreakpoints([f64; 4]),

    #[error("image bounds must be positive with minimums not above maximums: {0}")]
    InvalidImageBounds(ImageBounds),

    #[error("report thresholds must lie in [0, 100], got good {0} and low score {1}")]
    InvalidReportThresholds(f64, f64),

    #[error("confidence threshold must lie in (0, 1], got {0}")]
    InvalidConfidenceThreshold(f32),

    #[error("failed to read config file: {1:?}")]
    ReadConfig(#[source] std::io::Error, std::path::PathBuf),

    #[error("failed to parse config file")]
    ParseConfig(#[source] toml::de::Error),

    #[error("failed to serialize config")]
    SerializeConfig(#[source] toml::ser::Error),

    #[cfg(feature = "render")]
    #[error("failed to convert point ({0}, {1}) to pixel coordinates")]
    ConvertPointToPixel(f64, f64),

    #[cfg(feature = "render")]
    #[error("failed to copy image")]
    CopyImage(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to draw line")]
    DrawLine(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to draw circle")]
    DrawCircle(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to draw rectangle")]
    DrawRectangle(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to blend overlay")]
    BlendOverlay(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to draw text")]
    PutText(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to encode image")]
    EncodeImage(#[source] opencv::Error),

    #[cfg(feature = "render")]
    #[error("failed to read image: {1:?}")]
    ReadImage(#[source] opencv::Error, std::path::PathBuf),

    #[cfg(feature = "render")]
    #[error("image is empty or could not be decoded: {0:?}")]
    EmptyImage(std::path::PathBuf),
}

/// Coarse error categories surfaced to callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    ImageFormat,
    NoSubjectDetected,
    LowConfidenceDetection,
    Computation,
    Input,
    Configuration,
    Render,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ImageFormat { .. } => ErrorKind::ImageFormat,
            Self::NoSubjectDetected | Self::IncompleteSkeleton(_) => ErrorKind::NoSubjectDetected,
            Self::LowConfidenceDetection { .. } => ErrorKind::LowConfidenceDetection,
            Self::ConstructNotNan(..) | Self::NonFiniteScore(_) => ErrorKind::Computation,
            Self::ConvertUSizeToLandmarkKind(_)
            | Self::UnnamedLandmark(_)
            | Self::NonFiniteCoordinate(_)
            | Self::CoordinateOutOfRange(..)
            | Self::InvalidVisibility(..) => ErrorKind::Input,
            Self::WeightsDoNotSumToOne(..)
            | Self::UnknownVersion(_)
            | Self::InvalidBreakpoints(_)
            | Self::InvalidConfidenceThreshold(_)
            | Self::InvalidImageBounds(_)
            | Self::InvalidReportThresholds(..)
            | Self::ReadConfig(..)
            | Self::ParseConfig(_)
            | Self::SerializeConfig(_) => ErrorKind::Configuration,
            #[cfg(feature = "render")]
            Self::ConvertPointToPixel(..)
            | Self::CopyImage(_)
            | Self::DrawLine(_)
            | Self::DrawCircle(_)
            | Self::DrawRectangle(_)
            | Self::BlendOverlay(_)
            | Self::PutText(_)
            | Self::EncodeImage(_)
            | Self::ReadImage(..) => ErrorKind::Render,
            #[cfg(feature = "render")]
            Self::EmptyImage(_) => ErrorKind::ImageFormat,
        }
    }
}

/// Serializable form of an [`Error`], handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_report() {
        let error = Error::LowConfidenceDetection {
            failing: vec![(LandmarkKind::LeftShoulder, 0.2)],
            threshold: 0.5,
        };
        let report = ErrorReport::from(&error);
        assert_eq!(report.kind, ErrorKind::LowConfidenceDetection);
        assert!(report.message.contains("LeftShoulder"));
    }

    #[test]
    fn kinds_serialize_in_camel_case() {
        let report = ErrorReport::from(&Error::NoSubjectDetected);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "noSubjectDetected");
        assert_eq!(json["message"], "no subject detected in the image");
    }

    #[test]
    fn image_format_message_names_bounds() {
        let error = Error::ImageFormat {
            width: 100,
            height: 100,
            bounds: ImageBounds::default(),
        };
        assert_eq!(
            error.to_string(),
            "image dimensions 100x100 are outside the accepted range 300..=4000 x 400..=6000"
        );
    }
}
