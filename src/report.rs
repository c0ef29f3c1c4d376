//! Human-readable report assembled from scores and risk factors.

use crate::{
    error::Error,
    metrics::{MetricKind, Metrics},
    risk::RiskFactor,
    scoring::{Classification, Region, SubScore},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SEEK_PROFESSIONAL: &str = "Considere consultar um fisioterapeuta para avaliação detalhada";
pub const TAKE_BREAKS: &str = "Implemente pausas regulares durante atividades prolongadas";

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Regions scoring at least this are reported as good.
    pub good_threshold: f64,
    /// Overall scores below this bracket the recommendations with general advice.
    pub low_score_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            good_threshold: 70.0,
            low_score_threshold: 50.0,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let valid = |value: f64| (0.0..=100.0).contains(&value);
        if valid(self.good_threshold) && valid(self.low_score_threshold) {
            Ok(())
        } else {
            Err(Error::InvalidReportThresholds(
                self.good_threshold,
                self.low_score_threshold,
            ))
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AreaStatus {
    #[serde(rename = "Bom")]
    Good,
    #[serde(rename = "Atenção necessária")]
    NeedsAttention,
    #[serde(rename = "Indisponível")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDetail {
    pub region: Region,
    pub area: &'static str,
    pub score: Option<f64>,
    pub status: AreaStatus,
    pub description: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub score: f64,
    pub classification: Classification,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub details: Vec<AreaDetail>,
    /// Deduplicated; only membership is meaningful, apart from the general
    /// advice that brackets a low-score list.
    pub recommendations: Vec<&'static str>,
    pub risk_factors: Vec<RiskFactor>,
    pub priority_areas: Vec<&'static str>,
}

struct AreaText {
    name: &'static str,
    good: &'static str,
    recommendations: [&'static str; 3],
}

fn area_text(region: Region) -> AreaText {
    match region {
        Region::Head => AreaText {
            name: "Alinhamento da Cabeça",
            good: "Posicionamento adequado da cabeça em relação aos ombros",
            recommendations: [
                "Pratique exercícios de fortalecimento dos músculos cervicais profundos",
                "Realize alongamentos dos músculos peitorais e suboccipitais",
                "Mantenha consciência postural durante atividades diárias",
            ],
        },
        Region::Shoulders => AreaText {
            name: "Alinhamento dos Ombros",
            good: "Ombros bem alinhados e nivelados",
            recommendations: [
                "Realize exercícios de fortalecimento unilateral",
                "Pratique alongamentos específicos para músculos encurtados",
                "Evite carregar peso sempre do mesmo lado",
            ],
        },
        Region::Vertical => AreaText {
            name: "Alinhamento Vertical",
            good: "Excelente alinhamento da linha de gravidade corporal",
            recommendations: [
                "Fortaleça os músculos do core (abdominais e lombares)",
                "Pratique exercícios de propriocepção e equilíbrio",
                "Trabalhe a consciência corporal com exercícios específicos",
            ],
        },
        Region::Pelvis => AreaText {
            name: "Alinhamento Pélvico",
            good: "Pelve bem posicionada e equilibrada",
            recommendations: [
                "Fortaleça os músculos glúteos e abdominais",
                "Alongue os flexores do quadril",
                "Pratique exercícios de mobilidade pélvica",
            ],
        },
        Region::Symmetry => AreaText {
            name: "Simetria Corporal",
            good: "Boa simetria entre os lados do corpo",
            recommendations: [
                "Realize exercícios unilaterais para corrigir desequilíbrios",
                "Pratique atividades que promovam simetria corporal",
                "Considere avaliação com fisioterapeuta",
            ],
        },
        Region::Lateral => AreaText {
            name: "Assimetria Lateral (Frontal/Posterior)",
            good: "Boa simetria e alinhamento lateral",
            recommendations: [
                "Realize exercícios de fortalecimento unilateral para corrigir desequilíbrios",
                "Pratique atividades que promovam simetria corporal",
                "Evite carregar peso sempre do mesmo lado",
            ],
        },
        Region::LowerLimb => AreaText {
            name: "Alinhamento dos Membros Inferiores",
            good: "Alinhamento adequado dos joelhos e tornozelos (Vista Frontal)",
            recommendations: [
                "Fortaleça os músculos do quadríceps e glúteos",
                "Realize exercícios de estabilização do joelho e tornozelo",
                "Considere avaliação ortopédica e/ou fisioterapêutica para análise de marcha",
            ],
        },
    }
}

fn poor_description(score: &SubScore, metrics: &Metrics) -> String {
    let metric = |kind| metrics.get(kind).unwrap_or_default();
    let deviation = score.deviation.unwrap_or_default();
    match score.region {
        Region::Head => format!(
            "Projeção anterior da cabeça detectada ({:.1}px)",
            metric(MetricKind::HeadForwardDistance)
        ),
        Region::Shoulders => format!(
            "Desequilíbrio dos ombros detectado (inclinação: {:.1}°)",
            metric(MetricKind::ShoulderSlope)
        ),
        Region::Vertical => format!("Desvio no alinhamento vertical ({:.1}px)", deviation),
        Region::Pelvis => format!(
            "Inclinação pélvica detectada ({:.1}°)",
            metric(MetricKind::HipSlope)
        ),
        Region::Symmetry => format!(
            "Assimetria corporal detectada ({:.1}px)",
            metric(MetricKind::BodySymmetryDifference)
        ),
        Region::Lateral => format!(
            "Assimetria detectada: Ombros ({:.1}px) ou Quadris ({:.1}px) desalinhados",
            metric(MetricKind::ShoulderHeightDifference),
            metric(MetricKind::HipHeightDifference)
        ),
        Region::LowerLimb => format!(
            "Desvios no eixo dos joelhos (Valgo/Varo) detectados ({:.1}°)",
            deviation
        ),
    }
}

impl Report {
    /// Build the report from per-region scores in profile order.
    pub fn generate(
        overall: f64,
        classification: Classification,
        scores: &[SubScore],
        metrics: &Metrics,
        risk_factors: Vec<RiskFactor>,
        config: &ReportConfig,
    ) -> Self {
        let mut details = Vec::with_capacity(scores.len());
        let mut recommendations = BTreeSet::new();
        let mut priority_areas = Vec::new();

        for score in scores {
            let text = area_text(score.region);
            let (status, description) = match score.value {
                None => (
                    AreaStatus::Unavailable,
                    "Pontos de referência insuficientes para avaliar esta área".to_owned(),
                ),
                Some(value) if value >= config.good_threshold => {
                    (AreaStatus::Good, text.good.to_owned())
                }
                Some(_) => {
                    recommendations.extend(text.recommendations.iter().copied());
                    priority_areas.push(text.name);
                    (AreaStatus::NeedsAttention, poor_description(score, metrics))
                }
            };
            details.push(AreaDetail {
                region: score.region,
                area: text.name,
                score: score.value,
                status,
                description,
            });
        }

        let mut recommendations = recommendations.into_iter().collect::<Vec<_>>();
        if overall < config.low_score_threshold {
            recommendations.retain(|&r| r != SEEK_PROFESSIONAL && r != TAKE_BREAKS);
            recommendations.insert(0, SEEK_PROFESSIONAL);
            recommendations.push(TAKE_BREAKS);
        }

        Self {
            summary: Summary {
                score: overall,
                classification,
                color: classification.color(),
            },
            details,
            recommendations,
            risk_factors,
            priority_areas,
        }
    }

    /// Two-line plain-text digest of the result.
    pub fn summary_text(&self) -> String {
        let verdict = match self.summary.classification {
            Classification::Excellent => {
                "Excelente postura! Continue mantendo os bons hábitos posturais."
            }
            Classification::Good => "Boa postura geral, com pequenos pontos de atenção.",
            Classification::Fair => {
                "Postura regular. Recomenda-se atenção a alguns aspectos posturais."
            }
            Classification::Poor | Classification::Critical => {
                "Postura necessita atenção. Recomenda-se acompanhamento profissional."
            }
        };
        format!(
            "Análise Postural - Classificação: {} ({:.1}%)\n\n{}",
            self.summary.classification, self.summary.score, verdict
        )
    }
}
