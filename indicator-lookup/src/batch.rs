use futures::{stream, StreamExt, TryStreamExt};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{error, instrument, trace, warn};

use sumologic::{
    Credentials, MessagePage, SearchJobRequest, SearchJobUrl, SumoApiError, SumoClient,
};

use crate::entity::Entity;
use crate::gate::AdmissionGate;
use crate::options::{LookupOptions, OptionValidationError};
use crate::poller::{poll_search_job, PollConfig, PollError};
use crate::search_api::SearchJobApi;
use crate::summary::summarize;
use crate::template::bind_query;

/// A failure that invalidates the whole batch. Per-entity failures are
/// captured in the result list instead.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("invalid options: {}", format_errors(.0))]
    InvalidOptions(Vec<OptionValidationError>),
    #[error("authorization failed, check the configured access id and access key")]
    Unauthorized,
    #[error("batch lookup timed out")]
    TimedOut,
}

fn format_errors(errors: &[OptionValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct LookupResult {
    pub entity: Entity,
    pub outcome: LookupOutcome,
}

impl LookupResult {
    pub fn data(&self) -> Option<&LookupData> {
        match &self.outcome {
            LookupOutcome::Hit(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_miss(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Miss)
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match &self.outcome {
            LookupOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// Host-facing JSON shape: hits carry `data`, misses carry `data: null`,
// failures carry `data: null` plus an `error` object.
impl Serialize for LookupResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LookupResult", 3)?;
        state.serialize_field("entity", &self.entity)?;
        match &self.outcome {
            LookupOutcome::Hit(data) => state.serialize_field("data", data)?,
            LookupOutcome::Miss => state.serialize_field("data", &Option::<LookupData>::None)?,
            LookupOutcome::Failed(failure) => {
                state.serialize_field("data", &Option::<LookupData>::None)?;
                state.serialize_field("error", failure)?;
            }
        }
        state.end()
    }
}

#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Hit(LookupData),
    /// The job completed but returned no messages.
    Miss,
    Failed(LookupFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupData {
    pub summary: Vec<String>,
    pub details: MessagePage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FailureKind {
    RateLimited,
    JobFailed,
    Transport,
    Client,
    Rejected,
    TimedOut,
}

impl From<PollError> for LookupFailure {
    fn from(err: PollError) -> Self {
        let kind = match &err {
            PollError::Api(SumoApiError::RateLimited) => FailureKind::RateLimited,
            PollError::Api(SumoApiError::Client { .. }) => FailureKind::Client,
            PollError::Api(_) => FailureKind::Transport,
            PollError::JobFailed { .. } => FailureKind::JobFailed,
            PollError::TimedOut { .. } => FailureKind::TimedOut,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Fans a batch of entities out across independent search-job pipelines,
/// bounded by the admission gate, and collects one outcome per entity in
/// input order.
pub struct BatchLookup<A: SearchJobApi> {
    api: A,
    options: LookupOptions,
    gate: AdmissionGate,
    poll: PollConfig,
}

impl BatchLookup<SumoClient> {
    /// Builds a lookup backed by a real client. Fails fast on invalid
    /// options, before any network call.
    pub fn from_options(options: LookupOptions) -> Result<Self, LookupError> {
        let errors = options.validate();
        if !errors.is_empty() {
            return Err(LookupError::InvalidOptions(errors));
        }

        let credentials = Credentials::new(&options.access_id, &options.access_key);
        let client = match &options.endpoint {
            Some(endpoint) => SumoClient::with_base_url(credentials, SearchJobUrl::new(endpoint)),
            None => SumoClient::new(credentials),
        };
        Ok(Self::with_client(client, options))
    }
}

impl<A: SearchJobApi> BatchLookup<A> {
    pub fn with_client(api: A, options: LookupOptions) -> Self {
        let gate = AdmissionGate::new(
            options.gate.max_concurrent,
            options.gate.min_interval(),
            options.gate.overflow_policy(),
        );
        let poll = options.poll_config();
        Self {
            api,
            options,
            gate,
            poll,
        }
    }

    /// Looks up every entity, returning exactly one result per input entity
    /// in input order. Per-entity failures do not abort the batch;
    /// authorization failures do, since they would recur for every entity.
    #[instrument(name = "batch_lookup", skip(self, entities), fields(entities = entities.len()))]
    pub async fn lookup(&self, entities: Vec<Entity>) -> Result<Vec<LookupResult>, LookupError> {
        let errors = self.options.validate();
        if !errors.is_empty() {
            return Err(LookupError::InvalidOptions(errors));
        }

        match self.options.batch_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.run(entities))
                .await
                .map_err(|_| LookupError::TimedOut)?,
            None => self.run(entities).await,
        }
    }

    async fn run(&self, entities: Vec<Entity>) -> Result<Vec<LookupResult>, LookupError> {
        // All pipelines are started; the gate does the actual bounding so
        // the overflow policy can observe real queue pressure.
        let indexed: Vec<(usize, LookupOutcome)> =
            stream::iter(entities.iter().cloned().enumerate())
                .map(|(index, entity)| async move {
                    let outcome = self.lookup_one(&entity).await?;
                    Ok::<_, LookupError>((index, outcome))
                })
                .buffer_unordered(entities.len().max(1))
                .try_collect()
                .await?;

        // Structured join: outcomes land in their input-index slot no
        // matter in which order the pipelines completed.
        let mut slots: Vec<Option<LookupOutcome>> = entities.iter().map(|_| None).collect();
        for (index, outcome) in indexed {
            slots[index] = Some(outcome);
        }

        let results = entities
            .into_iter()
            .zip(slots)
            .map(|(entity, outcome)| LookupResult {
                entity,
                // every index is written exactly once above
                outcome: outcome.unwrap_or_else(|| {
                    LookupOutcome::Failed(LookupFailure {
                        kind: FailureKind::Transport,
                        message: "pipeline produced no outcome".to_string(),
                    })
                }),
            })
            .collect();

        trace!("batch lookup complete");
        Ok(results)
    }

    async fn lookup_one(&self, entity: &Entity) -> Result<LookupOutcome, LookupError> {
        let _permit = match self.gate.admit().await {
            Ok(permit) => permit,
            Err(err) => {
                warn!(entity = %entity.value, "entity rejected by admission gate");
                return Ok(LookupOutcome::Failed(LookupFailure {
                    kind: FailureKind::Rejected,
                    message: err.to_string(),
                }));
            }
        };

        let request = SearchJobRequest {
            query: bind_query(&self.options.query, entity),
            from: self.options.from.clone(),
            to: self.options.to.clone(),
            time_zone: self.options.time_zone.clone(),
            by_receipt_time: self.options.by_receipt_time,
        };

        match poll_search_job(&self.api, &request, &self.poll).await {
            Ok(page) if page.messages.is_empty() => {
                trace!(entity = %entity.value, "no messages found");
                Ok(LookupOutcome::Miss)
            }
            Ok(page) => {
                let summary = summarize(&page, self.options.summary_tag_cap);
                Ok(LookupOutcome::Hit(LookupData {
                    summary,
                    details: page,
                }))
            }
            Err(PollError::Api(SumoApiError::Unauthorized)) => {
                error!(entity = %entity.value, "authorization failed, aborting batch");
                Err(LookupError::Unauthorized)
            }
            Err(err) => {
                warn!(entity = %entity.value, error = %err, "lookup failed for entity");
                Ok(LookupOutcome::Failed(LookupFailure::from(err)))
            }
        }
    }
}
