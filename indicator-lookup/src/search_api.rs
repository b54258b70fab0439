//! Trait seam over the search-job API so the poller and orchestrator can be
//! tested against a scripted implementation.

use async_trait::async_trait;

use sumologic::{JobStatus, MessagePage, SearchJob, SearchJobRequest, SumoApiError, SumoClient};

#[cfg(test)]
pub(crate) mod mock;

#[async_trait]
pub trait SearchJobApi: Send + Sync {
    /// Submit a new search job, returning its server-assigned handle.
    async fn create_search_job(
        &self,
        request: &SearchJobRequest,
    ) -> Result<SearchJob, SumoApiError>;

    /// Read the current server-reported state of a job.
    async fn search_job_status(&self, job_id: &str) -> Result<JobStatus, SumoApiError>;

    /// Fetch one page of messages for a finished job.
    async fn search_job_messages(
        &self,
        job_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, SumoApiError>;
}

#[async_trait]
impl SearchJobApi for SumoClient {
    async fn create_search_job(
        &self,
        request: &SearchJobRequest,
    ) -> Result<SearchJob, SumoApiError> {
        SumoClient::create_search_job(self, request).await
    }

    async fn search_job_status(&self, job_id: &str) -> Result<JobStatus, SumoApiError> {
        SumoClient::search_job_status(self, job_id).await
    }

    async fn search_job_messages(
        &self,
        job_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, SumoApiError> {
        SumoClient::search_job_messages(self, job_id, offset, limit).await
    }
}
