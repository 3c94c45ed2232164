//! Submit-then-poll primitive for remote operations with unknown completion time.
//!
//! A job is submitted once and its status checked at a fixed interval until it
//! reports a terminal state. Terminal failure is a normal outcome, not an error:
//! the caller decides whether it aborts the surrounding workflow. Errors are
//! reserved for calls that could not be made or answered.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::aws::AwsError;

/// Pause between status checks unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Lifecycle state of an asynchronous job as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus<T> {
    InProgress,
    Succeeded(T),
    Failed(String),
}

/// A status observation paired with the identifier used to check it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot<T> {
    pub request_id: String,
    pub status: JobStatus<T>,
}

/// Terminal result of a polled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<T> {
    Succeeded(T),
    Failed { reason: String },
}

#[async_trait]
pub trait AsyncJob: Send + Sync {
    type Output: Send;

    /// Name used in logs and errors, e.g. "CreateAccount".
    fn operation(&self) -> &str;

    /// Start the job. Called exactly once per poll run.
    async fn submit(&self) -> Result<JobSnapshot<Self::Output>, AwsError>;

    /// Fetch the current status of a submitted job.
    async fn status(&self, request_id: &str) -> Result<JobSnapshot<Self::Output>, AwsError>;
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Maximum number of status checks; `None` polls until a terminal state.
    pub max_attempts: Option<u32>,
    /// Consecutive retryable status-check errors tolerated before giving up.
    pub max_transient_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            max_transient_errors: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Submit `job` and wait for it to reach a terminal state.
    pub async fn run<J: AsyncJob>(&self, job: &J) -> Result<JobOutcome<J::Output>, AwsError> {
        let operation = job.operation().to_string();
        let submitted = job.submit().await?;
        let request_id = submitted.request_id;
        let mut status = submitted.status;
        let mut attempts: u32 = 0;
        let mut transient_errors: u32 = 0;

        debug!(operation = %operation, request_id = %request_id, "Job submitted");

        loop {
            match status {
                JobStatus::Succeeded(output) => {
                    info!(operation = %operation, request_id = %request_id, attempts, "Job succeeded");
                    return Ok(JobOutcome::Succeeded(output));
                }
                JobStatus::Failed(reason) => {
                    warn!(operation = %operation, request_id = %request_id, reason = %reason, "Job failed");
                    return Ok(JobOutcome::Failed { reason });
                }
                JobStatus::InProgress => {}
            }

            if self
                .config
                .max_attempts
                .is_some_and(|max_attempts| attempts >= max_attempts)
            {
                return Err(AwsError::PollingExhausted {
                    operation,
                    attempts,
                });
            }

            tokio::time::sleep(self.config.interval).await;
            attempts += 1;

            status = match job.status(&request_id).await {
                Ok(snapshot) => {
                    transient_errors = 0;
                    debug!(operation = %operation, request_id = %request_id, attempts, "Job still running");
                    snapshot.status
                }
                Err(err) if err.is_retryable() && transient_errors < self.config.max_transient_errors => {
                    transient_errors += 1;
                    warn!(
                        operation = %operation,
                        request_id = %request_id,
                        transient_errors,
                        "Status check failed, retrying: {err}"
                    );
                    JobStatus::InProgress
                }
                Err(err) => return Err(err),
            };
        }
    }
}
