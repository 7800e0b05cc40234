//! Built-in job that carries out due scheduled publishes and archives.

use super::error_classifier::{classify, FailureClass};
use super::handler::{JobContext, JobHandler, JobReport};
use crate::error::{PublishingError, Result};
use crate::logging::log_error;
use crate::publishing::{PublishingService, ScheduledFireOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TimedPublishingJob {
    service: Arc<PublishingService>,
}

impl TimedPublishingJob {
    pub fn new(service: Arc<PublishingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobHandler for TimedPublishingJob {
    async fn execute(&self, context: JobContext) -> Result<JobReport> {
        let now = context.fired_at();
        let due = self.service.due_scheduled(now).await?;
        let mut report = JobReport::default();
        let mut first_job_error: Option<PublishingError> = None;

        debug!(job_name = %context.job_name(), due = due.len(), "Processing due scheduled languages");

        for item in &due {
            if context.shutdown_requested() {
                report.interrupted = true;
                info!(
                    job_name = %context.job_name(),
                    remaining = due.len() - report.processed,
                    "Shutdown requested, stopping timed publishing"
                );
                break;
            }
            report.processed += 1;

            match self.service.fire_scheduled(item, now).await {
                Ok(ScheduledFireOutcome::Published { .. } | ScheduledFireOutcome::Archived { .. }) => {
                    report.succeeded += 1;
                }
                Ok(ScheduledFireOutcome::ValidationFailed { .. }) => report.content_failures += 1,
                Ok(ScheduledFireOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    let context_line = format!(
                        "version_id={} language={} kind={:?}",
                        item.version_id, item.language, item.kind
                    );
                    match classify(&err) {
                        FailureClass::ScheduledContent => {
                            warn!(
                                version_id = %item.version_id,
                                root_id = %item.root_id,
                                language = %item.language,
                                error = %err,
                                "Scheduled transition not possible for this entity"
                            );
                            report.content_failures += 1;
                        }
                        FailureClass::JobProcess => {
                            log_error("timed_publishing", "fire_scheduled", &err.to_string(), Some(&context_line));
                            report.job_errors += 1;
                            first_job_error.get_or_insert(err);
                        }
                    }
                }
            }
        }

        match first_job_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}
