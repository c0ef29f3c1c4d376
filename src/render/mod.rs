//! Annotated-image overlay.
//!
//! [`Overlay::build`] turns an analysis into a list of drawing primitives
//! without touching pixels. The OpenCV rasterizer behind the `render` feature
//! paints them onto the source image and encodes a JPEG data URI.

#[cfg(feature = "render")]
mod raster;

#[cfg(feature = "render")]
pub use raster::{annotate, annotate_file, JPEG_QUALITY};

use crate::{
    engine::Analysis,
    geometry::{self, Point},
    pose::{constants::POSE_CONNECTIONS, LandmarkKind, NUM_LANDMARKS},
};
use base64::Engine as _;

/// Blue, green, red, as OpenCV expects.
pub type Bgr = (f64, f64, f64);

pub const KEYPOINT_COLOR: Bgr = (0.0, 255.0, 0.0);
pub const BONE_COLOR: Bgr = (255.0, 255.0, 255.0);
pub const GRAVITY_COLOR: Bgr = (255.0, 255.0, 0.0);
pub const SHOULDER_COLOR: Bgr = (255.0, 0.0, 255.0);
pub const HIP_COLOR: Bgr = (0.0, 255.0, 255.0);
pub const TEXT_COLOR: Bgr = (255.0, 255.0, 255.0);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: Bgr,
    pub thickness: i32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Marker {
    pub kind: LandmarkKind,
    pub center: Point,
    pub radius: i32,
}

/// Translucent text box in the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub top_left: (i32, i32),
    pub bottom_right: (i32, i32),
    pub alpha: f64,
    /// Baseline of the first text line.
    pub origin: (i32, i32),
    pub line_step: i32,
    pub font_scale: f64,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub markers: Vec<Marker>,
    pub bones: Vec<Segment>,
    /// Gravity line, then shoulder and hip lines.
    pub guides: Vec<Segment>,
    pub panel: Panel,
}

impl Overlay {
    pub fn build(analysis: &Analysis, threshold: f32) -> Self {
        let skeleton = &analysis.landmarks;
        let dims = analysis.dims;

        let mut points = [None; NUM_LANDMARKS];
        let markers = skeleton
            .landmarks()
            .iter()
            .filter(|landmark| landmark.visibility() >= threshold)
            .map(|landmark| {
                let center = Point::from_landmark(landmark, dims);
                points[landmark.kind().idx()] = Some(center);
                Marker {
                    kind: landmark.kind(),
                    center,
                    radius: 4,
                }
            })
            .collect::<Vec<_>>();

        let segment = |a: LandmarkKind, b: LandmarkKind, color, thickness| {
            match (points[a.idx()], points[b.idx()]) {
                (Some(from), Some(to)) => Some(Segment {
                    from,
                    to,
                    color,
                    thickness,
                }),
                _ => None,
            }
        };

        let bones = POSE_CONNECTIONS
            .iter()
            .filter_map(|&(a, b)| segment(a, b, BONE_COLOR, 2))
            .collect::<Vec<_>>();

        let height = f64::from(dims.height);
        let gravity_x = match (
            points[LandmarkKind::LeftAnkle.idx()],
            points[LandmarkKind::RightAnkle.idx()],
        ) {
            (Some(left), Some(right)) => Some(geometry::midpoint(left, right).x()),
            _ => points[LandmarkKind::Nose.idx()].map(Point::x),
        };
        let gravity = gravity_x.and_then(|x| {
            Some(Segment {
                from: Point::new(x, 0.0).ok()?,
                to: Point::new(x, height).ok()?,
                color: GRAVITY_COLOR,
                thickness: 2,
            })
        });

        let guides = gravity
            .into_iter()
            .chain(segment(
                LandmarkKind::LeftShoulder,
                LandmarkKind::RightShoulder,
                SHOULDER_COLOR,
                2,
            ))
            .chain(segment(
                LandmarkKind::LeftHip,
                LandmarkKind::RightHip,
                HIP_COLOR,
                2,
            ))
            .collect();

        let mut lines = vec![
            format!("Score Geral: {:.1}%", analysis.overall_score),
            format!("Classificacao: {}", hershey_safe(analysis.classification.label())),
        ];
        lines.extend(analysis.sub_scores.iter().filter_map(|score| {
            score
                .value
                .map(|value| format!("{}: {:.1}%", score.region.caption(), value))
        }));

        Self {
            markers,
            bones,
            guides,
            panel: Panel {
                top_left: (10, 10),
                bottom_right: (450, 200),
                alpha: 0.7,
                origin: (15, 35),
                line_step: 25,
                font_scale: 0.6,
                lines,
            },
        }
    }
}

/// The Hershey fonts only cover ASCII.
fn hershey_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'â' | 'ã' | 'à' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
