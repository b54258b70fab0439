use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gate::OverflowPolicy;
use crate::poller::PollConfig;
use crate::summary::DEFAULT_TAG_CAP;
use crate::template;

/// Options supplied by the host for a batch lookup: credentials, the query
/// template, time-range parameters, and tuning knobs. Missing fields
/// surface through [`LookupOptions::validate`] rather than deserialization
/// failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupOptions {
    pub access_id: String,
    pub access_key: String,
    /// API base override for non-us2 deployments.
    pub endpoint: Option<String>,
    /// Query template containing the `{{entity}}` placeholder.
    pub query: String,
    pub from: String,
    pub to: String,
    pub time_zone: String,
    pub by_receipt_time: bool,
    /// How many messages to fetch per completed job (one page, offset 0).
    pub page_limit: u32,
    pub summary_tag_cap: usize,
    pub gate: GateOptions,
    pub poll: PollOptions,
    /// Overall deadline for the whole batch; in-flight polls are cancelled
    /// on expiry.
    pub batch_timeout_ms: Option<u64>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            access_id: String::new(),
            access_key: String::new(),
            endpoint: None,
            query: String::new(),
            from: String::new(),
            to: String::new(),
            time_zone: String::new(),
            by_receipt_time: true,
            page_limit: 10,
            summary_tag_cap: DEFAULT_TAG_CAP,
            gate: GateOptions::default(),
            poll: PollOptions::default(),
            batch_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateOptions {
    pub max_concurrent: usize,
    pub min_interval_ms: u64,
    /// `None` queues excess entities; `Some(n)` rejects once `n` are
    /// already waiting for a slot.
    pub max_waiting: Option<usize>,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            min_interval_ms: 0,
            max_waiting: None,
        }
    }
}

impl GateOptions {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        match self.max_waiting {
            None => OverflowPolicy::Queue,
            Some(max_waiting) => OverflowPolicy::Reject { max_waiting },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollOptions {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_polls: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            interval_ms: 1000,
            max_polls: Some(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValidationError {
    pub field: &'static str,
    pub message: String,
}

impl LookupOptions {
    /// Returns one entry per invalid field; an empty list means the options
    /// are usable. Runs before any network call.
    pub fn validate(&self) -> Vec<OptionValidationError> {
        let mut errors = Vec::new();

        require(&mut errors, "accessId", &self.access_id, "You must provide a valid access id.");
        require(&mut errors, "accessKey", &self.access_key, "You must provide a valid access key.");
        require(&mut errors, "from", &self.from, "You must provide a date range.");
        require(&mut errors, "to", &self.to, "You must provide a date range.");
        require(&mut errors, "timeZone", &self.time_zone, "You must provide a valid timezone.");

        if self.query.trim().is_empty() {
            errors.push(OptionValidationError {
                field: "query",
                message: "You must provide a search query.".to_string(),
            });
        } else if !template::contains_placeholder(&self.query) {
            errors.push(OptionValidationError {
                field: "query",
                message: format!(
                    "The query must contain the {} placeholder.",
                    template::QUERY_PLACEHOLDER
                ),
            });
        }

        errors
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_millis(self.poll.initial_delay_ms),
            interval: Duration::from_millis(self.poll.interval_ms),
            max_polls: self.poll.max_polls,
            page_limit: self.page_limit,
        }
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

fn require(
    errors: &mut Vec<OptionValidationError>,
    field: &'static str,
    value: &str,
    message: &str,
) {
    if value.trim().is_empty() {
        errors.push(OptionValidationError {
            field,
            message: message.to_string(),
        });
    }
}
