//! Standing posture assessment from a single-image pose skeleton.
//!
//! The pipeline runs validation, metrics, scoring, risk identification and
//! reporting as pure stages behind [`Engine::analyze`].

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod guidance;
pub mod metrics;
pub mod pose;
pub mod profile;
pub mod render;
pub mod report;
pub mod risk;
pub mod scoring;
pub mod validate;

pub use config::Config;
pub use engine::{Analysis, Engine};
pub use error::{Error, ErrorKind, ErrorReport};
pub use pose::{Detection, ImageDims, Landmark, LandmarkKind, Skeleton};
pub use profile::Version;
