//! Scripted search-job API for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use sumologic::{
    JobStatus, LogMessage, MessagePage, SearchJob, SearchJobRequest, SumoApiError,
};

use super::SearchJobApi;

#[derive(Debug, Clone)]
pub enum ScriptedFailure {
    Unauthorized,
    RateLimited,
    Client(u16),
    Transport,
}

impl ScriptedFailure {
    fn to_error(&self) -> SumoApiError {
        match self {
            ScriptedFailure::Unauthorized => SumoApiError::Unauthorized,
            ScriptedFailure::RateLimited => SumoApiError::RateLimited,
            ScriptedFailure::Client(status) => SumoApiError::Client {
                status: *status,
                message: "scripted failure".to_string(),
            },
            ScriptedFailure::Transport => {
                SumoApiError::Transport("scripted transport failure".to_string())
            }
        }
    }
}

/// How a scripted job behaves once submitted.
#[derive(Debug, Clone)]
pub enum Script {
    /// Report gathering for the configured number of polls, then finish
    /// with these messages.
    Messages(Vec<LogMessage>),
    SubmitFails(ScriptedFailure),
    StatusFails(ScriptedFailure),
    FetchFails(ScriptedFailure),
    Cancelled,
    NeverDone,
}

struct JobRecord {
    script: Script,
    remaining_gathering: u32,
    done: bool,
    terminal: bool,
    fetches: u32,
}

/// Scripted [`SearchJobApi`] implementation. Behavior is selected per job
/// by matching rule needles against the submitted (bound) query, falling
/// back to a default script. Counters record call discipline so tests can
/// assert the poller never fetches early, never polls a terminal job, and
/// fetches at most once.
pub struct MockSearchApi {
    default_script: Script,
    rules: Vec<(String, Script)>,
    gathering_polls: u32,
    jobs: Mutex<HashMap<String, JobRecord>>,
    next_id: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    polls_after_terminal: AtomicUsize,
    fetches_before_done: AtomicUsize,
}

impl MockSearchApi {
    pub fn returning(messages: Vec<LogMessage>) -> Self {
        Self {
            default_script: Script::Messages(messages),
            rules: Vec::new(),
            gathering_polls: 1,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            polls_after_terminal: AtomicUsize::new(0),
            fetches_before_done: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    /// Number of gathering polls each job reports before finishing.
    pub fn with_gathering_polls(mut self, polls: u32) -> Self {
        self.gathering_polls = polls;
        self
    }

    /// Jobs whose bound query contains `needle` follow `script` instead of
    /// the default.
    pub fn with_rule(mut self, needle: impl Into<String>, script: Script) -> Self {
        self.rules.push((needle.into(), script));
        self
    }

    pub fn with_default(mut self, script: Script) -> Self {
        self.default_script = script;
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn polls_after_terminal(&self) -> usize {
        self.polls_after_terminal.load(Ordering::SeqCst)
    }

    pub fn fetches_before_done(&self) -> usize {
        self.fetches_before_done.load(Ordering::SeqCst)
    }

    pub fn max_fetches_per_job(&self) -> u32 {
        let jobs = self.jobs.lock().unwrap();
        jobs.values().map(|record| record.fetches).max().unwrap_or(0)
    }

    pub fn message(source: &str) -> LogMessage {
        Self::message_with("_source", source)
    }

    pub fn message_with(field: &str, value: &str) -> LogMessage {
        let mut map = HashMap::new();
        map.insert(field.to_string(), value.to_string());
        LogMessage { map }
    }

    fn script_for(&self, query: &str) -> Script {
        self.rules
            .iter()
            .find(|(needle, _)| query.contains(needle))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| self.default_script.clone())
    }
}

fn status(state: &str) -> JobStatus {
    JobStatus {
        state: state.to_string(),
        message_count: 0,
    }
}

#[async_trait]
impl SearchJobApi for MockSearchApi {
    async fn create_search_job(
        &self,
        request: &SearchJobRequest,
    ) -> Result<SearchJob, SumoApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let script = self.script_for(&request.query);
        if let Script::SubmitFails(failure) = &script {
            return Err(failure.to_error());
        }

        let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs.lock().unwrap().insert(
            id.clone(),
            JobRecord {
                script,
                remaining_gathering: self.gathering_polls,
                done: false,
                terminal: false,
                fetches: 0,
            },
        );
        Ok(SearchJob { id })
    }

    async fn search_job_status(&self, job_id: &str) -> Result<JobStatus, SumoApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let mut jobs = self.jobs.lock().unwrap();
        let record = jobs.get_mut(job_id).ok_or_else(|| SumoApiError::Client {
            status: 404,
            message: format!("unknown job {job_id}"),
        })?;

        if record.terminal {
            self.polls_after_terminal.fetch_add(1, Ordering::SeqCst);
        }

        match &record.script {
            Script::StatusFails(failure) => {
                record.terminal = true;
                Err(failure.to_error())
            }
            Script::Cancelled => {
                record.terminal = true;
                Ok(status("CANCELLED"))
            }
            Script::NeverDone => Ok(status("GATHERING RESULTS")),
            _ => {
                if record.remaining_gathering > 0 {
                    record.remaining_gathering -= 1;
                    Ok(status("GATHERING RESULTS"))
                } else {
                    record.done = true;
                    record.terminal = true;
                    Ok(status("DONE GATHERING RESULTS"))
                }
            }
        }
    }

    async fn search_job_messages(
        &self,
        job_id: &str,
        _offset: u32,
        limit: u32,
    ) -> Result<MessagePage, SumoApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let mut jobs = self.jobs.lock().unwrap();
        let record = jobs.get_mut(job_id).ok_or_else(|| SumoApiError::Client {
            status: 404,
            message: format!("unknown job {job_id}"),
        })?;

        record.fetches += 1;
        if !record.done {
            self.fetches_before_done.fetch_add(1, Ordering::SeqCst);
        }

        match &record.script {
            Script::FetchFails(failure) => Err(failure.to_error()),
            Script::Messages(messages) => Ok(MessagePage {
                fields: Vec::new(),
                messages: messages.iter().take(limit as usize).cloned().collect(),
            }),
            _ => Ok(MessagePage::default()),
        }
    }
}
