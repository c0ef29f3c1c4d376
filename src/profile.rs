//! Versioned scoring strategies.
//!
//! Each [`Version`] maps to a static [`Profile`]: the regions it scores, how
//! strongly each metric pulls a region's score down, the region weights, and
//! the ordered risk rules. Everything downstream of metric computation reads
//! only the profile, so the three generations share one pipeline.

use crate::{
    error::Error,
    metrics::{MetricKind, Metrics},
    risk::RiskKind,
    scoring::Region,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Version {
    /// Three equally weighted regions.
    Legacy,
    /// Adds pelvis and body symmetry.
    Enhanced,
    /// Frontal asymmetry and lower-limb alignment.
    Comprehensive,
}

impl Default for Version {
    fn default() -> Self {
        Self::Comprehensive
    }
}

impl Version {
    pub const ALL: [Version; 3] = [Version::Legacy, Version::Enhanced, Version::Comprehensive];

    pub fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Enhanced => "enhanced",
            Self::Comprehensive => "comprehensive",
        }
    }

    pub fn profile(self) -> &'static Profile {
        match self {
            Self::Legacy => &LEGACY,
            Self::Enhanced => &ENHANCED,
            Self::Comprehensive => &COMPREHENSIVE,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" | "v1" => Ok(Self::Legacy),
            "enhanced" => Ok(Self::Enhanced),
            "comprehensive" | "v2" => Ok(Self::Comprehensive),
            _ => Err(Error::UnknownVersion(s.to_owned())),
        }
    }
}

/// How a metric enters a deviation sum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Term {
    Identity(MetricKind),
    /// Absolute distance from a reference value, e.g. a straight knee at 180 degrees.
    DeviationFrom(MetricKind, f64),
}

impl Term {
    pub fn metric(self) -> MetricKind {
        match self {
            Self::Identity(metric) | Self::DeviationFrom(metric, _) => metric,
        }
    }

    /// `None` when the underlying metric is unavailable.
    pub fn eval(self, metrics: &Metrics) -> Option<f64> {
        let value = metrics.get(self.metric())?;
        Some(match self {
            Self::Identity(_) => value,
            Self::DeviationFrom(_, reference) => (reference - value).abs(),
        })
    }
}

/// A scored region: `clamp(100 - sum(factor * term), 0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRule {
    pub region: Region,
    pub weight: f64,
    pub terms: &'static [(f64, Term)],
}

/// Flags a risk factor when the largest of `terms` exceeds `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskRule {
    pub kind: RiskKind,
    pub terms: &'static [Term],
    pub threshold: f64,
    /// Above this the factor is `High`; without it the factor is always `Medium`.
    pub high: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    pub version: Version,
    pub regions: &'static [RegionRule],
    pub risks: &'static [RiskRule],
}

impl Profile {
    pub fn weight_sum(&self) -> f64 {
        self.regions.iter().map(|rule| rule.weight).sum()
    }

    pub fn check_weights(&self) -> Result<(), Error> {
        let sum = self.weight_sum();
        if (sum - 1.0).abs() <= WEIGHT_TOLERANCE {
            Ok(())
        } else {
            Err(Error::WeightsDoNotSumToOne(self.version, sum))
        }
    }

    pub fn rule(&self, region: Region) -> Option<&RegionRule> {
        self.regions.iter().find(|rule| rule.region == region)
    }
}

use MetricKind::*;

const FORWARD_HEAD: RiskRule = RiskRule {
    kind: RiskKind::ForwardHead,
    terms: &[Term::Identity(HeadForwardDistance)],
    threshold: 30.0,
    high: Some(50.0),
};

const SHOULDER_IMBALANCE: RiskRule = RiskRule {
    kind: RiskKind::ShoulderImbalance,
    terms: &[Term::Identity(ShoulderSlope)],
    threshold: 5.0,
    high: Some(10.0),
};

pub static LEGACY: Profile = Profile {
    version: Version::Legacy,
    regions: &[
        RegionRule {
            region: Region::Head,
            weight: 1.0 / 3.0,
            terms: &[(2.0, Term::Identity(HeadForwardDistance))],
        },
        RegionRule {
            region: Region::Shoulders,
            weight: 1.0 / 3.0,
            terms: &[(10.0, Term::Identity(ShoulderSlope))],
        },
        RegionRule {
            region: Region::Vertical,
            weight: 1.0 / 3.0,
            terms: &[
                (3.0, Term::Identity(HeadShoulderOffset)),
                (3.0, Term::Identity(ShoulderHipOffset)),
            ],
        },
    ],
    risks: &[FORWARD_HEAD, SHOULDER_IMBALANCE],
};

pub static ENHANCED: Profile = Profile {
    version: Version::Enhanced,
    regions: &[
        RegionRule {
            region: Region::Head,
            weight: 0.25,
            terms: &[(1.5, Term::Identity(HeadForwardDistance))],
        },
        RegionRule {
            region: Region::Shoulders,
            weight: 0.25,
            terms: &[
                (8.0, Term::Identity(ShoulderSlope)),
                (2.0, Term::Identity(ShoulderHeightDifference)),
            ],
        },
        RegionRule {
            region: Region::Vertical,
            weight: 0.25,
            terms: &[(2.0, Term::Identity(TotalVerticalDeviation))],
        },
        RegionRule {
            region: Region::Pelvis,
            weight: 0.15,
            terms: &[(10.0, Term::Identity(HipSlope))],
        },
        RegionRule {
            region: Region::Symmetry,
            weight: 0.10,
            terms: &[(5.0, Term::Identity(BodySymmetryDifference))],
        },
    ],
    risks: &[
        FORWARD_HEAD,
        SHOULDER_IMBALANCE,
        RiskRule {
            kind: RiskKind::PosturalMisalignment,
            terms: &[Term::Identity(TotalVerticalDeviation)],
            threshold: 25.0,
            high: Some(50.0),
        },
    ],
};

pub static COMPREHENSIVE: Profile = Profile {
    version: Version::Comprehensive,
    regions: &[
        RegionRule {
            region: Region::Head,
            weight: 0.25,
            terms: &[(1.5, Term::Identity(HeadForwardDistance))],
        },
        RegionRule {
            region: Region::Lateral,
            weight: 0.30,
            terms: &[
                (5.0, Term::Identity(HeadTiltAngle)),
                (5.0, Term::Identity(ShoulderHeightDifference)),
                (5.0, Term::Identity(HipHeightDifference)),
                (5.0, Term::Identity(TrunkRotationOffset)),
            ],
        },
        RegionRule {
            region: Region::Vertical,
            weight: 0.30,
            terms: &[(2.0, Term::Identity(TotalVerticalDeviation))],
        },
        RegionRule {
            region: Region::LowerLimb,
            weight: 0.15,
            terms: &[
                (5.0, Term::DeviationFrom(LeftKneeAngle, 180.0)),
                (5.0, Term::DeviationFrom(RightKneeAngle, 180.0)),
            ],
        },
    ],
    risks: &[
        FORWARD_HEAD,
        RiskRule {
            kind: RiskKind::HeadTilt,
            terms: &[Term::Identity(HeadTiltAngle)],
            threshold: 5.0,
            high: Some(10.0),
        },
        RiskRule {
            kind: RiskKind::ShoulderAsymmetry,
            terms: &[Term::Identity(ShoulderHeightDifference)],
            threshold: 25.0,
            high: Some(50.0),
        },
        RiskRule {
            kind: RiskKind::PelvicAsymmetry,
            terms: &[Term::Identity(HipHeightDifference)],
            threshold: 25.0,
            high: Some(50.0),
        },
        RiskRule {
            kind: RiskKind::KneeAxisDeviation,
            terms: &[
                Term::DeviationFrom(LeftKneeAngle, 180.0),
                Term::DeviationFrom(RightKneeAngle, 180.0),
            ],
            threshold: 5.0,
            high: None,
        },
    ],
};
