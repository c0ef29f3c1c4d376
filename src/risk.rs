use crate::{metrics::Metrics, profile::Profile};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskKind {
    ForwardHead,
    ShoulderImbalance,
    PosturalMisalignment,
    HeadTilt,
    ShoulderAsymmetry,
    PelvicAsymmetry,
    KneeAxisDeviation,
}

impl RiskKind {
    /// The factor name shown to users and matched by narration.
    pub fn label(self) -> &'static str {
        match self {
            Self::ForwardHead => "Projeção anterior da cabeça",
            Self::ShoulderImbalance => "Desequilíbrio dos ombros",
            Self::PosturalMisalignment => "Desalinhamento postural",
            Self::HeadTilt => "Inclinação/Rotação da Cabeça",
            Self::ShoulderAsymmetry => "Assimetria dos Ombros",
            Self::PelvicAsymmetry => "Assimetria Pélvica",
            Self::KneeAxisDeviation => "Desvio de Eixo dos Joelhos",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ForwardHead => "Pode causar dores no pescoço e tensão muscular",
            Self::ShoulderImbalance => "Pode levar a dores nas costas e tensão muscular",
            Self::PosturalMisalignment => "Pode causar sobrecarga na coluna vertebral",
            Self::HeadTilt => "Desvio de alinhamento lateral da cabeça (Vista Frontal/Posterior)",
            Self::ShoulderAsymmetry => {
                "Diferença de altura entre os ombros, sugerindo desequilíbrio (Vista Frontal/Posterior)"
            }
            Self::PelvicAsymmetry => {
                "Diferença de altura entre as cristas ilíacas (Vista Frontal/Posterior)"
            }
            Self::KneeAxisDeviation => "Indícios de Genu Valgo ou Varo (Vista Frontal)",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub kind: RiskKind,
    pub factor: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    /// The measured value that tripped the rule.
    pub value: f64,
}

/// Evaluate the risk rules of `profile` in order.
///
/// The output keeps rule order, so the first element is the primary factor
/// for narration regardless of severity.
pub fn identify(profile: &Profile, metrics: &Metrics) -> Vec<RiskFactor> {
    profile
        .risks
        .iter()
        .filter_map(|rule| {
            let value = rule
                .terms
                .iter()
                .filter_map(|term| term.eval(metrics))
                .fold(None, |max: Option<f64>, value| {
                    Some(max.map_or(value, |max| max.max(value)))
                })?;
            if value <= rule.threshold {
                return None;
            }
            let severity = match rule.high {
                Some(high) if value > high => Severity::High,
                _ => Severity::Medium,
            };
            tracing::debug!(kind = ?rule.kind, value, ?severity, "risk factor");
            Some(RiskFactor {
                kind: rule.kind,
                factor: rule.kind.label(),
                severity,
                description: rule.kind.description(),
                value,
            })
        })
        .collect()
}

/// The first `High` factor, or the first factor when none is `High`.
pub fn most_urgent(factors: &[RiskFactor]) -> Option<&RiskFactor> {
    factors
        .iter()
        .find(|factor| factor.severity == Severity::High)
        .or_else(|| factors.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::MetricKind::{self, *},
        profile::{COMPREHENSIVE, ENHANCED, LEGACY},
    };

    fn metrics(values: &[(MetricKind, f64)]) -> Metrics {
        values.iter().copied().collect()
    }

    mod identify_tests {
        use super::*;

        #[test]
        fn nothing_fires_on_clean_metrics() {
            let factors = identify(
                &COMPREHENSIVE,
                &metrics(&[
                    (HeadForwardDistance, 0.0),
                    (HeadTiltAngle, 0.0),
                    (ShoulderHeightDifference, 0.0),
                    (HipHeightDifference, 0.0),
                    (LeftKneeAngle, 180.0),
                    (RightKneeAngle, 180.0),
                ]),
            );
            assert!(factors.is_empty());
        }

        #[test]
        fn threshold_is_exclusive() {
            let at = identify(&LEGACY, &metrics(&[(HeadForwardDistance, 30.0)]));
            assert!(at.is_empty());
            let above = identify(&LEGACY, &metrics(&[(HeadForwardDistance, 30.5)]));
            assert_eq!(above[0].severity, Severity::Medium);
        }

        #[test]
        fn forward_head_above_high_threshold() {
            let factors = identify(&COMPREHENSIVE, &metrics(&[(HeadForwardDistance, 60.0)]));
            assert_eq!(factors.len(), 1);
            assert_eq!(factors[0].kind, RiskKind::ForwardHead);
            assert_eq!(factors[0].factor, "Projeção anterior da cabeça");
            assert_eq!(factors[0].severity, Severity::High);
        }

        #[test]
        fn order_follows_rules_not_severity() {
            let factors = identify(
                &ENHANCED,
                &metrics(&[
                    (HeadForwardDistance, 35.0),
                    (ShoulderSlope, 7.0),
                    (TotalVerticalDeviation, 80.0),
                ]),
            );
            let kinds = factors.iter().map(|f| f.kind).collect::<Vec<_>>();
            assert_eq!(
                kinds,
                vec![
                    RiskKind::ForwardHead,
                    RiskKind::ShoulderImbalance,
                    RiskKind::PosturalMisalignment
                ]
            );
            assert_eq!(factors[2].severity, Severity::High);
            assert_eq!(most_urgent(&factors).unwrap().kind, RiskKind::PosturalMisalignment);
        }

        #[test]
        fn knee_deviation_uses_worst_side_and_stays_medium() {
            let factors = identify(
                &COMPREHENSIVE,
                &metrics(&[(LeftKneeAngle, 178.0), (RightKneeAngle, 150.0)]),
            );
            assert_eq!(factors.len(), 1);
            assert_eq!(factors[0].kind, RiskKind::KneeAxisDeviation);
            assert_eq!(factors[0].severity, Severity::Medium);
            assert!((factors[0].value - 30.0).abs() < 1e-9);
        }

        #[test]
        fn one_visible_knee_still_evaluated() {
            let factors = identify(&COMPREHENSIVE, &metrics(&[(LeftKneeAngle, 170.0)]));
            assert_eq!(factors[0].kind, RiskKind::KneeAxisDeviation);
        }

        #[test]
        fn unavailable_metrics_never_fire() {
            assert!(identify(&COMPREHENSIVE, &Metrics::default()).is_empty());
        }
    }

    mod most_urgent_tests {
        use super::*;

        #[test]
        fn falls_back_to_first() {
            let factors = identify(
                &LEGACY,
                &metrics(&[(HeadForwardDistance, 40.0), (ShoulderSlope, 6.0)]),
            );
            assert_eq!(most_urgent(&factors).unwrap().kind, RiskKind::ForwardHead);
        }

        #[test]
        fn empty_has_none() {
            assert!(most_urgent(&[]).is_none());
        }
    }

    #[test]
    fn serializes_label_as_factor() {
        let factors = identify(&LEGACY, &metrics(&[(ShoulderSlope, 12.0)]));
        let json = serde_json::to_value(&factors[0]).unwrap();
        assert_eq!(json["factor"], "Desequilíbrio dos ombros");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["kind"], "shoulderImbalance");
    }
}
