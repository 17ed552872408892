//! End-to-end assessment tests through the public library API.
//!
//! These run the full learn-fire-defuzzify pipeline on small labelled data
//! and on the bundled sample dataset.

use std::path::Path;

use fuzzyskill_core::assessment::{compute_skill, render_explanation, RuleFiring, SkillRequest};
use fuzzyskill_core::config::{AssessmentConfig, MetricMembership, Shrink};
use fuzzyskill_core::defuzzify::Defuzzifier;
use fuzzyskill_core::engine::{AssessmentEngine, EngineConfig, NoopReporter};
use fuzzyskill_core::parser;

fn percent_scale() -> AssessmentConfig {
    AssessmentConfig {
        defuzzifier: Defuzzifier::Com,
        shrink: Shrink::Clip,
        min_skill: 0.0,
        max_skill: 100.0,
        ..Default::default()
    }
}

fn single_metric(test_value: f64) -> SkillRequest {
    SkillRequest {
        test_record: vec![test_value],
        training_records: vec![vec![10.0], vec![20.0], vec![80.0], vec![90.0]],
        weights: vec![1.0],
        metric_names: vec!["m".into()],
        skill_labels: vec![0.0, 0.0, 100.0, 100.0],
    }
}

#[test]
fn expert_like_record_scores_near_top() {
    let assessment = compute_skill(&percent_scale(), &single_metric(85.0)).unwrap();
    assert!(
        (assessment.score - 100.0).abs() < 5.0,
        "got {}",
        assessment.score
    );
}

#[test]
fn novice_like_record_scores_near_bottom() {
    let assessment = compute_skill(&percent_scale(), &single_metric(15.0)).unwrap();
    assert!(assessment.score.abs() < 5.0, "got {}", assessment.score);
}

#[test]
fn midpoint_record_scores_mid_scale() {
    let assessment = compute_skill(&percent_scale(), &single_metric(50.0)).unwrap();
    assert!(
        (assessment.score - 50.0).abs() < 5.0,
        "got {}",
        assessment.score
    );
}

#[test]
fn score_rises_with_metric_value() {
    for membership in [MetricMembership::Gaussian, MetricMembership::NonParametric] {
        let config = AssessmentConfig {
            metric_membership: membership,
            ..percent_scale()
        };
        let scores: Vec<f64> = [15.0, 40.0, 60.0, 85.0]
            .into_iter()
            .map(|v| compute_skill(&config, &single_metric(v)).unwrap().score)
            .collect();
        assert!(
            scores.windows(2).all(|w| w[0] <= w[1] + 1e-9),
            "{membership}: {scores:?}"
        );
    }
}

#[test]
fn explanation_orders_by_strength() {
    let firings: Vec<RuleFiring> = [("a", 0.2), ("b", 0.9), ("c", 0.5)]
        .into_iter()
        .map(|(metric, strength)| RuleFiring {
            metric: metric.into(),
            skill_class: "Expert".into(),
            strength,
        })
        .collect();
    let text = render_explanation(0.8, Some("Expert"), &firings, 3);
    let order: Vec<usize> = ["0.900", "0.500", "0.200"]
        .iter()
        .map(|s| text.find(s).unwrap())
        .collect();
    assert!(order[0] < order[1] && order[1] < order[2], "{text}");
}

#[test]
fn sample_dataset_ranks_trainees() {
    let dataset = parser::parse_dataset(Path::new("../../datasets/suturing.toml")).unwrap();
    assert!(parser::validate_dataset(&dataset).is_empty());

    let config = AssessmentConfig::default();
    let score = |id: &str| {
        let test = dataset.tests.iter().find(|t| t.id == id).unwrap();
        compute_skill(&config, &dataset.request_for(test))
            .unwrap()
            .score
    };
    let (a, b, c) = (score("trainee-a"), score("trainee-b"), score("trainee-c"));
    assert!(a > 0.5, "trainee-a: {a}");
    assert!(b < 0.5, "trainee-b: {b}");
    assert!(b < c && c < a, "{b} < {c} < {a}");
}

#[tokio::test]
async fn engine_matches_direct_assessment() {
    let dataset = parser::parse_dataset(Path::new("../../datasets/suturing.toml")).unwrap();
    let config = AssessmentConfig::default();
    let engine = AssessmentEngine::new(EngineConfig {
        parallelism: 2,
        assessment: config.clone(),
    });

    let report = engine.run(&dataset, &NoopReporter).await.unwrap();

    assert_eq!(report.results.len(), dataset.tests.len());
    for (result, test) in report.results.iter().zip(&dataset.tests) {
        assert_eq!(result.test_id, test.id);
        let direct = compute_skill(&config, &dataset.request_for(test)).unwrap();
        assert_eq!(result.score, direct.score);
        assert_eq!(result.explanation, direct.explanation);
    }
    assert_eq!(report.summary.count, 3);
    assert!(report.summary.min <= report.summary.mean && report.summary.mean <= report.summary.max);
}
