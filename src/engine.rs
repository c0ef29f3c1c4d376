use crate::{
    config::Config,
    error::Error,
    guidance,
    metrics::Metrics,
    pose::{constants, Detection, ImageDims, LandmarkKind, Skeleton},
    profile::{Profile, Version},
    report::Report,
    risk::{self, RiskFactor},
    scoring::{self, Classification, SubScore},
    validate,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Mean landmark visibility per body region.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ConfidenceScores {
    pub head: f32,
    pub shoulders: f32,
    pub torso: f32,
    pub legs: f32,
}

impl ConfidenceScores {
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            head: skeleton.mean_visibility(&constants::HEAD),
            shoulders: skeleton.mean_visibility(&constants::SHOULDERS),
            torso: skeleton.mean_visibility(&constants::TORSO),
            legs: skeleton.mean_visibility(&constants::LEGS),
        }
    }
}

/// Everything one analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub version: Version,
    pub landmarks: Skeleton,
    pub dims: ImageDims,
    pub metrics: Metrics,
    pub sub_scores: Vec<SubScore>,
    pub overall_score: f64,
    pub classification: Classification,
    pub risk_factors: Vec<RiskFactor>,
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
    pub confidence_scores: ConfidenceScores,
}

impl Analysis {
    pub fn summary_text(&self) -> String {
        self.report.summary_text()
    }

    pub fn narrative(&self) -> String {
        guidance::exercise_narrative(&self.risk_factors)
    }

    pub fn most_urgent(&self) -> Option<&RiskFactor> {
        risk::most_urgent(&self.risk_factors)
    }
}

/// Stateless posture analyzer. Holds only validated configuration, so one
/// instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        debug!(
            version = %config.version,
            threshold = config.confidence_threshold,
            requirement = ?config.requirement,
            "constructed engine"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self) -> &'static Profile {
        self.config.version.profile()
    }

    pub fn analyze(&self, skeleton: &Skeleton, dims: ImageDims) -> Result<Analysis, Error> {
        let config = &self.config;
        let threshold = config.confidence_threshold;
        let profile = self.profile();

        validate::validate_dimensions(dims, &config.image_bounds)?;
        validate::validate_landmarks(skeleton, config.requirement, threshold)?;

        let metrics = Metrics::compute(skeleton, dims, threshold);
        let sub_scores = scoring::sub_scores(profile, &metrics)?;
        let overall_score = scoring::overall_score(profile, &sub_scores)
            .ok_or_else(|| unscorable(profile, skeleton, threshold))?;
        let classification = config.breakpoints.classify(overall_score);
        let risk_factors = risk::identify(profile, &metrics);
        let report = Report::generate(
            overall_score,
            classification,
            &sub_scores,
            &metrics,
            risk_factors.clone(),
            &config.report,
        );

        info!(
            message = "analyzed posture",
            version = %profile.version,
            score = overall_score,
            classification = %classification,
            risk_factors = risk_factors.len(),
        );

        Ok(Analysis {
            version: profile.version,
            landmarks: skeleton.clone(),
            dims,
            metrics,
            sub_scores,
            overall_score,
            classification,
            risk_factors,
            report,
            annotated_image: None,
            confidence_scores: ConfidenceScores::new(skeleton),
        })
    }

    /// Analyze an estimator document. With the `render` feature and an image
    /// path in the document, the result carries the annotated image.
    pub fn analyze_detection(&self, detection: &Detection) -> Result<Analysis, Error> {
        let dims = detection.dims();
        validate::validate_dimensions(dims, &self.config.image_bounds)?;
        let skeleton = detection.skeleton()?;

        #[allow(unused_mut)]
        let mut analysis = self.analyze(&skeleton, dims)?;

        #[cfg(feature = "render")]
        if let Some(image) = &detection.image {
            analysis.annotated_image = Some(self.annotate(&analysis, image)?);
        }

        Ok(analysis)
    }

    #[cfg(feature = "render")]
    pub fn annotate(&self, analysis: &Analysis, image: &std::path::Path) -> Result<String, Error> {
        let overlay = crate::render::Overlay::build(analysis, self.config.confidence_threshold);
        crate::render::annotate_file(image, &overlay)
    }
}

/// No region of `profile` could be scored: name the landmarks it needed.
fn unscorable(profile: &Profile, skeleton: &Skeleton, threshold: f32) -> Error {
    let needed = profile
        .regions
        .iter()
        .flat_map(|rule| rule.terms.iter())
        .flat_map(|(_, term)| term.metric().landmarks().iter().copied())
        .collect::<BTreeSet<LandmarkKind>>();
    let failing = needed
        .into_iter()
        .filter(|&kind| !skeleton.is_usable(kind, threshold))
        .map(|kind| (kind, skeleton.get(kind).visibility()))
        .collect();
    Error::LowConfidenceDetection { failing, threshold }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::MetricKind,
        pose::{testing::upright, LandmarkKind::*},
        risk::{RiskKind, Severity},
        scoring::Region,
        validate::Requirement,
    };
    use assert_approx_eq::assert_approx_eq;

    const DIMS: ImageDims = ImageDims {
        width: 600,
        height: 800,
    };

    fn engine(version: Version) -> Engine {
        Engine::new(Config {
            version,
            ..Config::default()
        })
        .unwrap()
    }

    fn sub_score(analysis: &Analysis, region: Region) -> Option<f64> {
        analysis
            .sub_scores
            .iter()
            .find(|score| score.region == region)
            .and_then(|score| score.value)
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn upright_symmetric_is_excellent() {
            for version in Version::ALL.iter().copied() {
                let analysis = engine(version).analyze(&upright().build(), DIMS).unwrap();
                assert!(analysis.overall_score >= 85.0);
                assert_eq!(analysis.classification, Classification::Excellent);
                assert!(analysis.risk_factors.is_empty());
                assert!(analysis.report.priority_areas.is_empty());
                assert_eq!(analysis.version, version);
            }
        }

        #[test]
        fn forward_head_of_sixty_pixels() {
            let skeleton = upright()
                .shift(LeftEar, 0.1, 0.0)
                .shift(RightEar, 0.1, 0.0)
                .build();
            let analysis = engine(Version::Comprehensive)
                .analyze(&skeleton, DIMS)
                .unwrap();
            assert_approx_eq!(
                analysis.metrics.get(MetricKind::HeadForwardDistance).unwrap(),
                60.0
            );
            assert!(sub_score(&analysis, Region::Head).unwrap() < 70.0);
            let primary = &analysis.risk_factors[0];
            assert_eq!(primary.kind, RiskKind::ForwardHead);
            assert_eq!(primary.factor, "Projeção anterior da cabeça");
            assert_eq!(primary.severity, Severity::High);
            assert!(analysis.narrative().contains("retração cervical"));
        }

        #[test]
        fn low_confidence_left_shoulder_is_rejected() {
            let skeleton = upright().visibility(LeftShoulder, 0.2).build();
            match engine(Version::Comprehensive).analyze(&skeleton, DIMS) {
                Err(Error::LowConfidenceDetection { failing, .. }) => {
                    assert_eq!(failing, vec![(LeftShoulder, 0.2)]);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[test]
        fn bent_knee_lowers_lower_limb_score() {
            let engine = engine(Version::Comprehensive);
            let straight = engine.analyze(&upright().build(), DIMS).unwrap();
            let bent = engine
                .analyze(&upright().shift(LeftKnee, 0.021, 0.0).build(), DIMS)
                .unwrap();
            assert_approx_eq!(
                bent.metrics.get(MetricKind::LeftKneeAngle).unwrap(),
                170.0,
                0.05
            );
            assert!(
                sub_score(&bent, Region::LowerLimb).unwrap()
                    < sub_score(&straight, Region::LowerLimb).unwrap()
            );
            assert_eq!(bent.risk_factors[0].kind, RiskKind::KneeAxisDeviation);
        }
    }

    mod property_tests {
        use super::*;

        #[test]
        fn deterministic() {
            let skeleton = upright()
                .shift(Nose, 0.03, 0.0)
                .shift(RightShoulder, 0.0, 0.02)
                .build();
            let engine = engine(Version::Enhanced);
            assert_eq!(
                engine.analyze(&skeleton, DIMS).unwrap(),
                engine.analyze(&skeleton, DIMS).unwrap()
            );
        }

        #[test]
        fn scores_stay_in_bounds_for_extreme_poses() {
            let skeleton = upright()
                .at(Nose, 0.95, 0.9)
                .at(LeftEar, 0.0, 0.0)
                .at(RightShoulder, 0.1, 0.9)
                .at(LeftKnee, 0.0, 0.52)
                .build();
            for version in Version::ALL.iter().copied() {
                let analysis = engine(version).analyze(&skeleton, DIMS).unwrap();
                assert!((0.0..=100.0).contains(&analysis.overall_score));
                for score in &analysis.sub_scores {
                    assert!((0.0..=100.0).contains(&score.value.unwrap()));
                }
            }
        }

        #[test]
        fn engine_is_shareable() {
            fn assert_send_sync<T: Send + Sync>() {}
            assert_send_sync::<Engine>();
            assert_send_sync::<Analysis>();
        }
    }

    mod availability_tests {
        use super::*;

        #[test]
        fn hidden_ankles_renormalize() {
            let skeleton = upright()
                .visibility(LeftAnkle, 0.1)
                .visibility(RightAnkle, 0.1)
                .shift(LeftEar, 0.05, 0.0)
                .shift(RightEar, 0.05, 0.0)
                .build();
            let analysis = engine(Version::Comprehensive)
                .analyze(&skeleton, DIMS)
                .unwrap();
            assert_eq!(sub_score(&analysis, Region::Vertical), None);
            assert_eq!(sub_score(&analysis, Region::LowerLimb), None);
            // head 100 - 1.5 * 30 = 55 at .25, lateral 100 at .30
            assert_approx_eq!(analysis.overall_score, (0.25 * 55.0 + 30.0) / 0.55);
            let statuses = analysis
                .report
                .details
                .iter()
                .map(|detail| detail.status)
                .collect::<Vec<_>>();
            assert_eq!(statuses[2], crate::report::AreaStatus::Unavailable);
        }

        #[test]
        fn extended_requirement_rejects_hidden_ankles() {
            let engine = Engine::new(Config {
                requirement: Requirement::Extended,
                ..Config::default()
            })
            .unwrap();
            let skeleton = upright().visibility(RightAnkle, 0.1).build();
            assert!(matches!(
                engine.analyze(&skeleton, DIMS),
                Err(Error::LowConfidenceDetection { .. })
            ));
        }

        #[test]
        fn nothing_scorable_is_low_confidence() {
            // passes the minimal requirement, but every comprehensive region needs ears or ankles
            let skeleton = upright()
                .visibility(LeftEar, 0.1)
                .visibility(RightEar, 0.2)
                .visibility(LeftAnkle, 0.3)
                .build();
            match engine(Version::Comprehensive).analyze(&skeleton, DIMS) {
                Err(Error::LowConfidenceDetection { failing, threshold }) => {
                    assert_eq!(
                        failing,
                        vec![(LeftEar, 0.1), (RightEar, 0.2), (LeftAnkle, 0.3)]
                    );
                    assert_eq!(threshold, 0.5);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[test]
        fn unscorable_names_needed_landmarks() {
            let skeleton = upright()
                .visibility(LeftEar, 0.1)
                .visibility(LeftShoulder, 0.2)
                .build();
            match unscorable(&crate::profile::LEGACY, &skeleton, 0.5) {
                Error::LowConfidenceDetection { failing, .. } => {
                    assert_eq!(failing, vec![(LeftEar, 0.1), (LeftShoulder, 0.2)]);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    mod input_tests {
        use super::*;

        #[test]
        fn image_out_of_bounds() {
            assert!(matches!(
                engine(Version::Comprehensive).analyze(&upright().build(), ImageDims::new(200, 800)),
                Err(Error::ImageFormat { .. })
            ));
        }

        #[test]
        fn empty_detection() {
            let detection = Detection {
                width: 600,
                height: 800,
                image: None,
                landmarks: vec![],
            };
            let error = engine(Version::Comprehensive)
                .analyze_detection(&detection)
                .unwrap_err();
            assert_eq!(error.kind(), crate::error::ErrorKind::NoSubjectDetected);
        }

        #[test]
        fn invalid_config_is_rejected() {
            let config = Config {
                confidence_threshold: 1.5,
                ..Config::default()
            };
            assert!(matches!(
                Engine::new(config),
                Err(Error::InvalidConfidenceThreshold(_))
            ));
        }
    }

    #[test]
    fn serialized_analysis_uses_camel_case() {
        let analysis = engine(Version::Comprehensive)
            .analyze(&upright().build(), DIMS)
            .unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["version"], "comprehensive");
        assert_eq!(json["classification"], "Excelente");
        assert!(json["overallScore"].is_number());
        assert!(json["subScores"].is_array());
        assert!(json["confidenceScores"]["legs"].is_number());
        assert_eq!(json["landmarks"][0]["name"], "NOSE");
        assert!(json.get("annotatedImage").is_none());
        assert!(analysis.summary_text().contains("Excelente (100.0%)"));
    }
}
