use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Literal state string the API reports once a job has finished gathering.
pub const DONE_GATHERING_RESULTS: &str = "DONE GATHERING RESULTS";
/// Literal state string for a job cancelled on the server side.
pub const CANCELLED: &str = "CANCELLED";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJobRequest {
    pub query: String,
    pub from: String,
    pub to: String,
    pub time_zone: String,
    pub by_receipt_time: bool,
}

/// Server-side handle to an asynchronous search execution.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchJob {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: String,
    #[serde(default)]
    pub message_count: u64,
}

impl JobStatus {
    pub fn job_state(&self) -> JobState {
        JobState::from_literal(&self.state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Gathering,
    Done,
    Cancelled,
}

impl JobState {
    /// NOT STARTED, GATHERING RESULTS, FORCE PAUSED and anything unknown all
    /// count as still gathering.
    pub fn from_literal(state: &str) -> Self {
        match state {
            DONE_GATHERING_RESULTS => JobState::Done,
            CANCELLED => JobState::Cancelled,
            _ => JobState::Gathering,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Cancelled)
    }
}

/// One page of messages for a completed job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub fields: Vec<MessageField>,
    #[serde(default)]
    pub messages: Vec<LogMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub map: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageField {
    pub name: String,
    pub field_type: String,
    pub key_field: bool,
}
