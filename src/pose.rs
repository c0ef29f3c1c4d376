use crate::error::Error;
use num_traits::FromPrimitive;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use std::{ops::RangeInclusive, path::PathBuf};

/// Canonical landmark vocabulary, in the index order the pose estimator emits.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkKind {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

pub const NUM_LANDMARKS: usize = 33;

impl LandmarkKind {
    pub const ALL: [LandmarkKind; NUM_LANDMARKS] = {
        use LandmarkKind::*;
        [
            Nose,
            LeftEyeInner,
            LeftEye,
            LeftEyeOuter,
            RightEyeInner,
            RightEye,
            RightEyeOuter,
            LeftEar,
            RightEar,
            MouthLeft,
            MouthRight,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftPinky,
            RightPinky,
            LeftIndex,
            RightIndex,
            LeftThumb,
            RightThumb,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
            LeftHeel,
            RightHeel,
            LeftFootIndex,
            RightFootIndex,
        ]
    };

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_idx(index: usize) -> Result<Self, Error> {
        Self::from_usize(index).ok_or(Error::ConvertUSizeToLandmarkKind(index))
    }
}

/// Range accepted for normalized coordinates. The estimator places occluded
/// points slightly outside the frame.
pub const COORDINATE_RANGE: RangeInclusive<f64> = -1.0..=2.0;

/// A single detected anatomical point.
///
/// `x` and `y` are normalized to `[0, 1]` relative to the image width and
/// height, `z` is the estimator's relative depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landmark {
    kind: LandmarkKind,
    x: f64,
    y: f64,
    z: f64,
    visibility: f32,
}

impl Landmark {
    pub fn new(kind: LandmarkKind, x: f64, y: f64, z: f64, visibility: f32) -> Result<Self, Error> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(Error::NonFiniteCoordinate(kind));
        }
        if !(COORDINATE_RANGE.contains(&x) && COORDINATE_RANGE.contains(&y)) {
            return Err(Error::CoordinateOutOfRange(kind, x, y));
        }
        if !(0.0..=1.0).contains(&visibility) {
            return Err(Error::InvalidVisibility(kind, visibility));
        }
        Ok(Self {
            kind,
            x,
            y,
            z,
            visibility,
        })
    }

    #[inline]
    pub fn kind(&self) -> LandmarkKind {
        self.kind
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.z
    }

    #[inline]
    pub fn visibility(&self) -> f32 {
        self.visibility
    }
}

impl Serialize for Landmark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Landmark", 6)?;
        state.serialize_field("id", &self.kind.idx())?;
        state.serialize_field("name", &self.kind)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.serialize_field("z", &self.z)?;
        state.serialize_field("visibility", &self.visibility)?;
        state.end()
    }
}

/// The complete set of landmarks for one subject in one image.
///
/// Every canonical landmark is present, stored in index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Skeleton {
    landmarks: Vec<Landmark>,
}

impl Skeleton {
    pub fn new<I>(landmarks: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Landmark>,
    {
        let mut slots: [Option<Landmark>; NUM_LANDMARKS] = [None; NUM_LANDMARKS];
        let mut seen = 0_usize;

        for landmark in landmarks {
            let slot = &mut slots[landmark.kind.idx()];
            if slot.is_some() {
                tracing::debug!(kind = ?landmark.kind, "duplicate landmark, keeping the last one");
            }
            *slot = Some(landmark);
            seen += 1;
        }

        if seen == 0 {
            return Err(Error::NoSubjectDetected);
        }

        let missing = LandmarkKind::ALL
            .iter()
            .zip(slots.iter())
            .filter_map(|(&kind, slot)| if slot.is_none() { Some(kind) } else { None })
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::IncompleteSkeleton(missing));
        }

        Ok(Self {
            landmarks: slots.iter().flatten().copied().collect(),
        })
    }

    #[inline]
    pub fn get(&self, kind: LandmarkKind) -> &Landmark {
        &self.landmarks[kind.idx()]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Whether `kind` was detected with at least `threshold` confidence.
    pub fn is_usable(&self, kind: LandmarkKind, threshold: f32) -> bool {
        self.get(kind).visibility >= threshold
    }

    /// Mean visibility over `kinds`, or zero for an empty group.
    pub fn mean_visibility(&self, kinds: &[LandmarkKind]) -> f32 {
        if kinds.is_empty() {
            return 0.0;
        }
        let total: f32 = kinds.iter().map(|&kind| self.get(kind).visibility).sum();
        total / kinds.len() as f32
    }
}

/// One landmark as handed over by the pose estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    #[serde(default)]
    pub id: Option<usize>,
    #[serde(default)]
    pub name: Option<LandmarkKind>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub visibility: f32,
}

impl LandmarkRecord {
    fn to_landmark(&self, position: usize) -> Result<Landmark, Error> {
        let kind = match (self.name, self.id) {
            (Some(name), _) => name,
            (None, Some(id)) => LandmarkKind::from_idx(id)?,
            (None, None) => return Err(Error::UnnamedLandmark(position)),
        };
        Landmark::new(kind, self.x, self.y, self.z, self.visibility)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The pose estimator's output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub width: u32,
    pub height: u32,
    /// Source image, used only for the annotated overlay.
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub landmarks: Vec<LandmarkRecord>,
}

impl Detection {
    pub fn dims(&self) -> ImageDims {
        ImageDims::new(self.width, self.height)
    }

    pub fn skeleton(&self) -> Result<Skeleton, Error> {
        let landmarks = self
            .landmarks
            .iter()
            .enumerate()
            .map(|(i, record)| record.to_landmark(i))
            .collect::<Result<Vec<_>, _>>()?;
        Skeleton::new(landmarks)
    }
}

pub mod constants {
    use crate::pose::LandmarkKind::{self, *};

    /// Skeleton bones drawn on the annotated image.
    pub const POSE_CONNECTIONS: [(LandmarkKind, LandmarkKind); 35] = [
        (Nose, LeftEyeInner),
        (LeftEyeInner, LeftEye),
        (LeftEye, LeftEyeOuter),
        (LeftEyeOuter, LeftEar),
        (Nose, RightEyeInner),
        (RightEyeInner, RightEye),
        (RightEye, RightEyeOuter),
        (RightEyeOuter, RightEar),
        (MouthLeft, MouthRight),
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftWrist, LeftPinky),
        (LeftWrist, LeftIndex),
        (LeftWrist, LeftThumb),
        (LeftPinky, LeftIndex),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightWrist, RightPinky),
        (RightWrist, RightIndex),
        (RightWrist, RightThumb),
        (RightPinky, RightIndex),
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        (LeftHip, LeftKnee),
        (RightHip, RightKnee),
        (LeftKnee, LeftAnkle),
        (RightKnee, RightAnkle),
        (LeftAnkle, LeftHeel),
        (RightAnkle, RightHeel),
        (LeftHeel, LeftFootIndex),
        (RightHeel, RightFootIndex),
        (LeftAnkle, LeftFootIndex),
        (RightAnkle, RightFootIndex),
    ];

    pub const HEAD: [LandmarkKind; 3] = [Nose, LeftEar, RightEar];
    pub const SHOULDERS: [LandmarkKind; 2] = [LeftShoulder, RightShoulder];
    pub const TORSO: [LandmarkKind; 2] = [LeftHip, RightHip];
    pub const LEGS: [LandmarkKind; 4] = [LeftKnee, RightKnee, LeftAnkle, RightAnkle];
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Landmark, LandmarkKind, Skeleton, NUM_LANDMARKS};

    /// Builds skeletons starting from an upright, bilaterally symmetric
    /// frontal pose. The subject's left side sits at larger `x`.
    #[derive(Debug, Clone)]
    pub(crate) struct SkeletonBuilder {
        points: [(f64, f64, f32); NUM_LANDMARKS],
    }

    pub(crate) fn upright() -> SkeletonBuilder {
        use LandmarkKind::*;

        // (kind, x of the subject's left side, y); right side mirrors around 0.5
        let left_side = [
            (LeftEyeInner, 0.52, 0.09),
            (LeftEye, 0.53, 0.09),
            (LeftEyeOuter, 0.54, 0.09),
            (LeftEar, 0.56, 0.10),
            (MouthLeft, 0.52, 0.13),
            (LeftShoulder, 0.62, 0.22),
            (LeftElbow, 0.65, 0.36),
            (LeftWrist, 0.66, 0.48),
            (LeftPinky, 0.66, 0.51),
            (LeftIndex, 0.66, 0.52),
            (LeftThumb, 0.65, 0.50),
            (LeftHip, 0.56, 0.52),
            (LeftKnee, 0.56, 0.70),
            (LeftAnkle, 0.56, 0.88),
            (LeftHeel, 0.56, 0.90),
            (LeftFootIndex, 0.57, 0.92),
        ];
        let right_side = [
            RightEyeInner,
            RightEye,
            RightEyeOuter,
            RightEar,
            MouthRight,
            RightShoulder,
            RightElbow,
            RightWrist,
            RightPinky,
            RightIndex,
            RightThumb,
            RightHip,
            RightKnee,
            RightAnkle,
            RightHeel,
            RightFootIndex,
        ];

        let mut points = [(0.5, 0.5, 0.99); NUM_LANDMARKS];
        points[Nose.idx()] = (0.5, 0.10, 0.99);
        for (&(left, x, y), &right) in left_side.iter().zip(right_side.iter()) {
            points[left.idx()] = (x, y, 0.99);
            points[right.idx()] = (1.0 - x, y, 0.99);
        }
        SkeletonBuilder { points }
    }

    impl SkeletonBuilder {
        pub(crate) fn at(mut self, kind: LandmarkKind, x: f64, y: f64) -> Self {
            let (_, _, visibility) = self.points[kind.idx()];
            self.points[kind.idx()] = (x, y, visibility);
            self
        }

        pub(crate) fn shift(mut self, kind: LandmarkKind, dx: f64, dy: f64) -> Self {
            let (x, y, visibility) = self.points[kind.idx()];
            self.points[kind.idx()] = (x + dx, y + dy, visibility);
            self
        }

        pub(crate) fn visibility(mut self, kind: LandmarkKind, visibility: f32) -> Self {
            self.points[kind.idx()].2 = visibility;
            self
        }

        pub(crate) fn build(self) -> Skeleton {
            Skeleton::new(
                LandmarkKind::ALL
                    .iter()
                    .zip(self.points.iter())
                    .map(|(&kind, &(x, y, visibility))| {
                        Landmark::new(kind, x, y, 0.0, visibility).unwrap()
                    }),
            )
            .unwrap()
        }
    }
}
