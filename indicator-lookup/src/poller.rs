use std::time::Duration;

use thiserror::Error;
use tracing::{instrument, trace};

use sumologic::{JobState, MessagePage, SearchJobRequest, SumoApiError};

use crate::search_api::SearchJobApi;

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first status check; a freshly submitted job cannot
    /// be done yet.
    pub initial_delay: Duration,
    pub interval: Duration,
    /// Ceiling on status checks. `None` reproduces the unbounded loop of
    /// the reference behavior; the default caps it.
    pub max_polls: Option<u32>,
    pub page_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            interval: Duration::from_millis(1000),
            max_polls: Some(600),
            page_limit: 10,
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Api(#[from] SumoApiError),
    #[error("search job {job_id} was cancelled by the remote service")]
    JobFailed { job_id: String },
    #[error("search job {job_id} did not finish within {polls} status checks")]
    TimedOut { job_id: String, polls: u32 },
}

/// Drives one search job from submission to a terminal state and returns
/// the first page of its messages.
///
/// The job only ever advances (submitted, gathering, done) and is never
/// polled again after a terminal state; the message fetch happens exactly
/// once, after the done state has been observed. Status-call failures are
/// not retried here beyond the transport client's own policy.
#[instrument(name = "poll_search_job", skip(api, request, config), fields(query = %request.query))]
pub async fn poll_search_job<A: SearchJobApi + ?Sized>(
    api: &A,
    request: &SearchJobRequest,
    config: &PollConfig,
) -> Result<MessagePage, PollError> {
    let job = api.create_search_job(request).await?;
    trace!(job_id = %job.id, "search job submitted");

    let mut polls = 0u32;
    loop {
        let delay = if polls == 0 {
            config.initial_delay
        } else {
            config.interval
        };
        tokio::time::sleep(delay).await;

        if let Some(max) = config.max_polls {
            if polls >= max {
                return Err(PollError::TimedOut { job_id: job.id, polls });
            }
        }
        polls += 1;

        let status = api.search_job_status(&job.id).await?;
        match status.job_state() {
            JobState::Done => break,
            JobState::Cancelled => return Err(PollError::JobFailed { job_id: job.id }),
            JobState::Gathering => {
                trace!(job_id = %job.id, state = %status.state, polls, "job still gathering")
            }
        }
    }

    trace!(job_id = %job.id, polls, "job done, fetching first page");
    let page = api.search_job_messages(&job.id, 0, config.page_limit).await?;
    Ok(page)
}
