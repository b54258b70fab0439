use base64::prelude::*;
use std::env;
use thiserror::Error;

/// Access id + access key pair for the Sumo Logic API.
///
/// The key is never logged; the pair is only ever rendered as a basic auth
/// header value.
#[derive(Clone)]
pub struct Credentials {
    access_id: String,
    access_key: String,
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("SUMO_ACCESS_ID must be set")]
    MissingAccessId,
    #[error("SUMO_ACCESS_KEY must be set")]
    MissingAccessKey,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            access_key: access_key.into(),
        }
    }

    /// Reads `SUMO_ACCESS_ID` and `SUMO_ACCESS_KEY` from the environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let access_id =
            env::var("SUMO_ACCESS_ID").map_err(|_| CredentialsError::MissingAccessId)?;
        let access_key =
            env::var("SUMO_ACCESS_KEY").map_err(|_| CredentialsError::MissingAccessKey)?;
        Ok(Self::new(access_id, access_key))
    }

    pub fn as_basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.access_id, self.access_key);
        format!("Basic {}", BASE64_STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}
