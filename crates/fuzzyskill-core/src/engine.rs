//! Batch assessment orchestrator.
//!
//! Assesses every test record of a dataset. Records are independent, so they
//! run concurrently on blocking worker threads, bounded by a semaphore.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::assessment::FuzzyAssessment;
use crate::config::AssessmentConfig;
use crate::error::AssessmentError;
use crate::model::Dataset;
use crate::report::{AssessmentReport, DatasetSummary, RecordAssessment};
use crate::statistics::ScoreSummary;
use crate::traits::AssessmentMethod;

/// Configuration for the batch engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent assessments.
    pub parallelism: usize,
    pub assessment: AssessmentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            assessment: AssessmentConfig::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_record_start(&self, test_id: &str);
    fn on_record_complete(&self, result: &RecordAssessment);
    fn on_record_error(&self, test_id: &str, error: &str);
    fn on_dataset_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_record_start(&self, _: &str) {}
    fn on_record_complete(&self, _: &RecordAssessment) {}
    fn on_record_error(&self, _: &str, _: &str) {}
    fn on_dataset_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch assessment engine.
pub struct AssessmentEngine {
    method: Arc<dyn AssessmentMethod>,
    config: EngineConfig,
}

impl AssessmentEngine {
    /// An engine running the fuzzy method with `config.assessment`.
    pub fn new(config: EngineConfig) -> Self {
        let method = Arc::new(FuzzyAssessment::new(config.assessment.clone()));
        Self { method, config }
    }

    /// Assess every test record of `dataset`.
    ///
    /// A record that fails is reported through `progress` and left out of
    /// the report; the remaining results keep dataset order.
    pub async fn run(
        &self,
        dataset: &Dataset,
        progress: &dyn ProgressReporter,
    ) -> Result<AssessmentReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, test) in dataset.tests.iter().enumerate() {
            let method = Arc::clone(&self.method);
            let semaphore = Arc::clone(&semaphore);
            let request = dataset.request_for(test);
            let test_id = test.id.clone();

            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_record_start(&test_id);
                    let started = Instant::now();
                    let assessment =
                        tokio::task::spawn_blocking(move || method.compute_skill(&request))
                            .await??;
                    Ok::<_, anyhow::Error>((assessment, started.elapsed()))
                };
                let outcome = inner.await;
                (index, test_id, outcome)
            });
        }

        let total = futures.len();
        let mut results = Vec::with_capacity(total);
        let mut failed = 0usize;

        while let Some((index, test_id, outcome)) = futures.next().await {
            match outcome {
                Ok((assessment, elapsed)) => {
                    let result = RecordAssessment {
                        test_id,
                        score: assessment.score,
                        explanation: assessment.explanation,
                        firings: assessment.firings,
                        duration_ms: elapsed.as_millis() as u64,
                    };
                    progress.on_record_complete(&result);
                    results.push((index, result));
                }
                Err(e) => {
                    let bad_data = e
                        .downcast_ref::<AssessmentError>()
                        .is_some_and(AssessmentError::is_data_error);
                    if bad_data {
                        tracing::warn!("skipping record {test_id}: {e}");
                    } else {
                        tracing::error!("assessment failed for {test_id}: {e:#}");
                    }
                    progress.on_record_error(&test_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<RecordAssessment> = results.into_iter().map(|(_, r)| r).collect();

        let elapsed = start.elapsed();
        progress.on_dataset_complete(total, results.len(), failed, elapsed);

        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();

        Ok(AssessmentReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            dataset: DatasetSummary::of(dataset),
            method: self.method.name().to_string(),
            config: self.config.assessment.clone(),
            summary: ScoreSummary::from_scores(&scores),
            results,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
