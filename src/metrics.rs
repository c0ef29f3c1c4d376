//! Raw posture metrics, in pixels or degrees.

use crate::{
    geometry::{self, Point},
    pose::{ImageDims, LandmarkKind, Skeleton},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    HeadForwardDistance,
    HeadVerticalDistance,
    HeadTiltAngle,
    ShoulderSlope,
    ShoulderHeightDifference,
    HipSlope,
    HipHeightDifference,
    TrunkRotationOffset,
    HeadShoulderOffset,
    ShoulderHipOffset,
    HipAnkleOffset,
    TotalVerticalDeviation,
    SpinalLateralDeviation,
    BodySymmetryDifference,
    LeftKneeAngle,
    RightKneeAngle,
}

impl MetricKind {
    pub const ALL: [MetricKind; 16] = {
        use MetricKind::*;
        [
            HeadForwardDistance,
            HeadVerticalDistance,
            HeadTiltAngle,
            ShoulderSlope,
            ShoulderHeightDifference,
            HipSlope,
            HipHeightDifference,
            TrunkRotationOffset,
            HeadShoulderOffset,
            ShoulderHipOffset,
            HipAnkleOffset,
            TotalVerticalDeviation,
            SpinalLateralDeviation,
            BodySymmetryDifference,
            LeftKneeAngle,
            RightKneeAngle,
        ]
    };

    pub fn name(self) -> &'static str {
        use MetricKind::*;
        match self {
            HeadForwardDistance => "headForwardDistance",
            HeadVerticalDistance => "headVerticalDistance",
            HeadTiltAngle => "headTiltAngle",
            ShoulderSlope => "shoulderSlope",
            ShoulderHeightDifference => "shoulderHeightDifference",
            HipSlope => "hipSlope",
            HipHeightDifference => "hipHeightDifference",
            TrunkRotationOffset => "trunkRotationOffset",
            HeadShoulderOffset => "headShoulderOffset",
            ShoulderHipOffset => "shoulderHipOffset",
            HipAnkleOffset => "hipAnkleOffset",
            TotalVerticalDeviation => "totalVerticalDeviation",
            SpinalLateralDeviation => "spinalLateralDeviation",
            BodySymmetryDifference => "bodySymmetryDifference",
            LeftKneeAngle => "leftKneeAngle",
            RightKneeAngle => "rightKneeAngle",
        }
    }

    /// Landmarks that must all be usable for this metric to be computed.
    pub fn landmarks(self) -> &'static [LandmarkKind] {
        use LandmarkKind::*;
        use MetricKind::*;
        match self {
            HeadForwardDistance | HeadVerticalDistance => {
                &[LeftEar, RightEar, LeftShoulder, RightShoulder]
            }
            HeadTiltAngle => &[LeftEar, RightEar],
            ShoulderSlope | ShoulderHeightDifference => &[LeftShoulder, RightShoulder],
            HipSlope | HipHeightDifference => &[LeftHip, RightHip],
            TrunkRotationOffset
            | ShoulderHipOffset
            | SpinalLateralDeviation
            | BodySymmetryDifference => &[LeftShoulder, RightShoulder, LeftHip, RightHip],
            HeadShoulderOffset => &[Nose, LeftShoulder, RightShoulder],
            HipAnkleOffset => &[LeftHip, RightHip, LeftAnkle, RightAnkle],
            TotalVerticalDeviation => &[
                Nose,
                LeftShoulder,
                RightShoulder,
                LeftHip,
                RightHip,
                LeftAnkle,
                RightAnkle,
            ],
            LeftKneeAngle => &[LeftHip, LeftKnee, LeftAnkle],
            RightKneeAngle => &[RightHip, RightKnee, RightAnkle],
        }
    }

    fn measure(self, frame: &Frame<'_>) -> f64 {
        use LandmarkKind::*;
        use MetricKind::*;
        match self {
            HeadForwardDistance => (frame.ears().x() - frame.shoulders().x()).abs(),
            HeadVerticalDistance => (frame.ears().y() - frame.shoulders().y()).abs(),
            HeadTiltAngle => geometry::inclination(frame.point(LeftEar), frame.point(RightEar)),
            ShoulderSlope => {
                geometry::inclination(frame.point(LeftShoulder), frame.point(RightShoulder))
            }
            ShoulderHeightDifference => frame.height_gap(LeftShoulder, RightShoulder),
            HipSlope => geometry::inclination(frame.point(LeftHip), frame.point(RightHip)),
            HipHeightDifference => frame.height_gap(LeftHip, RightHip),
            // same measurement, scored under the lateral and vertical regions
            TrunkRotationOffset | ShoulderHipOffset => {
                (frame.shoulders().x() - frame.hips().x()).abs()
            }
            HeadShoulderOffset => (frame.point(Nose).x() - frame.shoulders().x()).abs(),
            HipAnkleOffset => (frame.hips().x() - frame.ankles().x()).abs(),
            TotalVerticalDeviation => [HeadShoulderOffset, ShoulderHipOffset, HipAnkleOffset]
                .iter()
                .map(|metric| metric.measure(frame))
                .sum(),
            SpinalLateralDeviation => {
                (frame.height_gap(LeftShoulder, RightShoulder) + frame.height_gap(LeftHip, RightHip))
                    / 2.0
            }
            BodySymmetryDifference => {
                let left = geometry::distance(frame.point(LeftShoulder), frame.point(LeftHip));
                let right = geometry::distance(frame.point(RightShoulder), frame.point(RightHip));
                (left - right).abs()
            }
            LeftKneeAngle => geometry::vertex_angle(
                frame.point(LeftHip),
                frame.point(LeftKnee),
                frame.point(LeftAnkle),
            ),
            RightKneeAngle => geometry::vertex_angle(
                frame.point(RightHip),
                frame.point(RightKnee),
                frame.point(RightAnkle),
            ),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel-space view of a skeleton.
struct Frame<'a> {
    skeleton: &'a Skeleton,
    dims: ImageDims,
}

impl Frame<'_> {
    fn point(&self, kind: LandmarkKind) -> Point {
        Point::from_landmark(self.skeleton.get(kind), self.dims)
    }

    fn mid(&self, left: LandmarkKind, right: LandmarkKind) -> Point {
        geometry::midpoint(self.point(left), self.point(right))
    }

    fn height_gap(&self, left: LandmarkKind, right: LandmarkKind) -> f64 {
        (self.point(left).y() - self.point(right).y()).abs()
    }

    fn ears(&self) -> Point {
        self.mid(LandmarkKind::LeftEar, LandmarkKind::RightEar)
    }

    fn shoulders(&self) -> Point {
        self.mid(LandmarkKind::LeftShoulder, LandmarkKind::RightShoulder)
    }

    fn hips(&self) -> Point {
        self.mid(LandmarkKind::LeftHip, LandmarkKind::RightHip)
    }

    fn ankles(&self) -> Point {
        self.mid(LandmarkKind::LeftAnkle, LandmarkKind::RightAnkle)
    }
}

/// Named metric values. A metric missing from the map could not be computed
/// from usable landmarks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<MetricKind, f64>);

impl Metrics {
    /// Compute every metric whose landmarks reach `threshold`.
    pub fn compute(skeleton: &Skeleton, dims: ImageDims, threshold: f32) -> Self {
        let frame = Frame { skeleton, dims };
        let metrics = MetricKind::ALL
            .iter()
            .copied()
            .filter(|metric| {
                let usable = metric
                    .landmarks()
                    .iter()
                    .all(|&kind| skeleton.is_usable(kind, threshold));
                if !usable {
                    tracing::debug!(%metric, "omitting metric with unusable landmarks");
                }
                usable
            })
            .map(|metric| (metric, metric.measure(&frame)))
            .collect::<BTreeMap<_, _>>();
        tracing::trace!(count = metrics.len(), "computed metrics");
        Self(metrics)
    }

    #[inline]
    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn contains(&self, metric: MetricKind) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.0.iter().map(|(&metric, &value)| (metric, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
impl FromIterator<(MetricKind, f64)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (MetricKind, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::testing::upright;
    use assert_approx_eq::assert_approx_eq;
    use LandmarkKind::*;

    const DIMS: ImageDims = ImageDims {
        width: 600,
        height: 800,
    };

    fn compute(skeleton: &Skeleton) -> Metrics {
        Metrics::compute(skeleton, DIMS, 0.5)
    }

    mod symmetric_tests {
        use super::*;

        #[test]
        fn asymmetry_metrics_are_zero() {
            let metrics = compute(&upright().build());
            for metric in [
                MetricKind::ShoulderHeightDifference,
                MetricKind::HipHeightDifference,
                MetricKind::BodySymmetryDifference,
                MetricKind::ShoulderSlope,
                MetricKind::HipSlope,
                MetricKind::HeadTiltAngle,
                MetricKind::HeadForwardDistance,
                MetricKind::TotalVerticalDeviation,
                MetricKind::SpinalLateralDeviation,
            ] {
                assert_approx_eq!(metrics.get(metric).unwrap(), 0.0);
            }
        }

        #[test]
        fn straight_legs() {
            let metrics = compute(&upright().build());
            assert_approx_eq!(metrics.get(MetricKind::LeftKneeAngle).unwrap(), 180.0);
            assert_approx_eq!(metrics.get(MetricKind::RightKneeAngle).unwrap(), 180.0);
        }

        #[test]
        fn every_metric_is_present() {
            assert_eq!(compute(&upright().build()).len(), MetricKind::ALL.len());
        }

        #[test]
        fn head_sits_above_shoulders() {
            let metrics = compute(&upright().build());
            // ears at y=0.10 and shoulders at y=0.22 of 800 px
            assert_approx_eq!(metrics.get(MetricKind::HeadVerticalDistance).unwrap(), 96.0);
        }
    }

    mod head_tests {
        use super::*;

        #[test]
        fn forward_head_in_pixels() {
            let skeleton = upright()
                .shift(LeftEar, 0.1, 0.0)
                .shift(RightEar, 0.1, 0.0)
                .build();
            let metrics = compute(&skeleton);
            assert_approx_eq!(metrics.get(MetricKind::HeadForwardDistance).unwrap(), 60.0);
            assert_approx_eq!(metrics.get(MetricKind::HeadTiltAngle).unwrap(), 0.0);
        }

        #[test]
        fn tilt_is_independent_of_side() {
            let up = compute(&upright().shift(LeftEar, 0.0, 0.02).build());
            let down = compute(&upright().shift(RightEar, 0.0, 0.02).build());
            assert_approx_eq!(
                up.get(MetricKind::HeadTiltAngle).unwrap(),
                down.get(MetricKind::HeadTiltAngle).unwrap()
            );
            assert!(up.get(MetricKind::HeadTiltAngle).unwrap() > 0.0);
        }
    }

    mod trunk_tests {
        use super::*;

        #[test]
        fn dropped_shoulder() {
            let metrics = compute(&upright().shift(RightShoulder, 0.0, 0.05).build());
            assert_approx_eq!(metrics.get(MetricKind::ShoulderHeightDifference).unwrap(), 40.0);
            assert_approx_eq!(metrics.get(MetricKind::SpinalLateralDeviation).unwrap(), 20.0);
            assert!(metrics.get(MetricKind::BodySymmetryDifference).unwrap() > 0.0);
            // 40 px rise over 144 px run
            assert_approx_eq!(
                metrics.get(MetricKind::ShoulderSlope).unwrap(),
                (40.0_f64 / 144.0).atan().to_degrees()
            );
        }

        #[test]
        fn vertical_chain_sums_offsets() {
            let skeleton = upright()
                .shift(Nose, 0.02, 0.0)
                .shift(LeftHip, -0.02, 0.0)
                .shift(RightHip, -0.02, 0.0)
                .build();
            let metrics = compute(&skeleton);
            let head = metrics.get(MetricKind::HeadShoulderOffset).unwrap();
            let trunk = metrics.get(MetricKind::ShoulderHipOffset).unwrap();
            let legs = metrics.get(MetricKind::HipAnkleOffset).unwrap();
            assert_approx_eq!(head, 12.0);
            assert_approx_eq!(trunk, 12.0);
            assert_approx_eq!(legs, 12.0);
            assert_approx_eq!(metrics.get(MetricKind::TotalVerticalDeviation).unwrap(), 36.0);
        }
    }

    mod knee_tests {
        use super::*;

        #[test]
        fn bent_knee_angle() {
            // 144 px thigh and shin; 12.6 px lateral knee shift bends by about 10 degrees
            let metrics = compute(&upright().shift(LeftKnee, 0.021, 0.0).build());
            assert_approx_eq!(metrics.get(MetricKind::LeftKneeAngle).unwrap(), 170.0, 0.05);
            assert_approx_eq!(metrics.get(MetricKind::RightKneeAngle).unwrap(), 180.0);
        }
    }

    mod availability_tests {
        use super::*;

        #[test]
        fn hidden_ankle_omits_dependent_metrics() {
            let metrics = compute(&upright().visibility(LeftAnkle, 0.2).build());
            assert!(!metrics.contains(MetricKind::HipAnkleOffset));
            assert!(!metrics.contains(MetricKind::TotalVerticalDeviation));
            assert!(!metrics.contains(MetricKind::LeftKneeAngle));
            assert!(metrics.contains(MetricKind::RightKneeAngle));
            assert!(metrics.contains(MetricKind::HeadForwardDistance));
        }

        #[test]
        fn threshold_controls_usability() {
            let skeleton = upright().visibility(LeftEar, 0.6).build();
            assert!(Metrics::compute(&skeleton, DIMS, 0.5).contains(MetricKind::HeadTiltAngle));
            assert!(!Metrics::compute(&skeleton, DIMS, 0.7).contains(MetricKind::HeadTiltAngle));
        }

        #[test]
        fn serializes_with_metric_names() {
            let metrics = compute(&upright().build());
            let json = serde_json::to_value(&metrics).unwrap();
            assert_eq!(json["leftKneeAngle"].as_f64().unwrap().round(), 180.0);
        }
    }
}
