use crate::{
    error::Error,
    metrics::Metrics,
    profile::{Profile, RegionRule},
};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    Head,
    Shoulders,
    Vertical,
    Pelvis,
    Symmetry,
    Lateral,
    LowerLimb,
}

impl Region {
    pub fn name(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Shoulders => "shoulders",
            Self::Vertical => "vertical",
            Self::Pelvis => "pelvis",
            Self::Symmetry => "symmetry",
            Self::Lateral => "lateral",
            Self::LowerLimb => "lowerLimb",
        }
    }

    /// Short caption for the overlay panel.
    pub fn caption(self) -> &'static str {
        match self {
            Self::Head => "Cabeca",
            Self::Shoulders => "Ombros",
            Self::Vertical => "Vertical",
            Self::Pelvis => "Pelve",
            Self::Symmetry => "Simetria",
            Self::Lateral => "Lateral (Assimetria)",
            Self::LowerLimb => "Membros Inf.",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality score of one region. `value` is `None` when a metric the region
/// depends on could not be computed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScore {
    pub region: Region,
    pub value: Option<f64>,
    /// Unweighted sum of the region's deviation terms.
    pub deviation: Option<f64>,
}

impl SubScore {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

pub fn score_region(rule: &RegionRule, metrics: &Metrics) -> Result<SubScore, Error> {
    let terms = rule
        .terms
        .iter()
        .map(|&(factor, term)| term.eval(metrics).map(|value| (factor, value)))
        .collect::<Option<Vec<_>>>();

    let terms = match terms {
        Some(terms) => terms,
        None => {
            return Ok(SubScore {
                region: rule.region,
                value: None,
                deviation: None,
            })
        }
    };

    let deviation = terms.iter().map(|&(_, value)| value).sum::<f64>();
    let penalty = terms.iter().map(|&(factor, value)| factor * value).sum::<f64>();
    let value = MAX_SCORE - penalty;
    if !value.is_finite() {
        return Err(Error::NonFiniteScore(rule.region.name()));
    }

    Ok(SubScore {
        region: rule.region,
        value: Some(value.clamp(0.0, MAX_SCORE)),
        deviation: Some(deviation),
    })
}

/// Sub-scores for every region of `profile`, in profile order.
pub fn sub_scores(profile: &Profile, metrics: &Metrics) -> Result<Vec<SubScore>, Error> {
    profile
        .regions
        .iter()
        .map(|rule| score_region(rule, metrics))
        .collect()
}

/// Weighted mean of the available sub-scores, renormalizing the weights over
/// the regions that could be scored. `None` when no region is available.
pub fn overall_score(profile: &Profile, scores: &[SubScore]) -> Option<f64> {
    let (weighted, total_weight) = profile
        .regions
        .iter()
        .zip(scores.iter())
        .filter_map(|(rule, score)| score.value.map(|value| (rule.weight, value)))
        .fold((0.0, 0.0), |(weighted, total), (weight, value)| {
            (weighted + weight * value, total + weight)
        });

    if total_weight > 0.0 {
        Some((weighted / total_weight).clamp(0.0, MAX_SCORE))
    } else {
        None
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excelente",
            Self::Good => "Boa",
            Self::Fair => "Regular",
            Self::Poor => "Ruim",
            Self::Critical => "Crítica",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Excellent => "#28a745",
            Self::Good => "#4ecdc4",
            Self::Fair => "#ffc107",
            Self::Poor => "#fd7e14",
            Self::Critical => "#dc3545",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Inclusive lower bounds of the four upper classification bands.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            excellent: 85.0,
            good: 70.0,
            fair: 50.0,
            poor: 30.0,
        }
    }
}

impl Breakpoints {
    fn as_array(&self) -> [f64; 4] {
        [self.excellent, self.good, self.fair, self.poor]
    }

    pub fn validate(&self) -> Result<(), Error> {
        let bounds = self.as_array();
        let in_range = bounds.iter().all(|b| (0.0..=MAX_SCORE).contains(b));
        let descending = bounds.windows(2).all(|pair| pair[0] > pair[1]);
        if in_range && descending {
            Ok(())
        } else {
            Err(Error::InvalidBreakpoints(bounds))
        }
    }

    pub fn classify(&self, score: f64) -> Classification {
        if score >= self.excellent {
            Classification::Excellent
        } else if score >= self.good {
            Classification::Good
        } else if score >= self.fair {
            Classification::Fair
        } else if score >= self.poor {
            Classification::Poor
        } else {
            Classification::Critical
        }
    }
}
