/// Default API base for the us2 deployment. Other deployments use a
/// different subdomain, so the base is overridable.
pub const DEFAULT_API_BASE: &str = "https://api.us2.sumologic.com/api";

#[derive(Debug, Clone)]
pub struct SearchJobUrl(String);

impl AsRef<str> for SearchJobUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Default for SearchJobUrl {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl SearchJobUrl {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    pub fn with_paging(&self, offset: u32, limit: u32) -> Self {
        if self.0.contains('?') {
            Self(format!("{}&offset={}&limit={}", self.0, offset, limit))
        } else {
            Self(format!("{}?offset={}&limit={}", self.0, offset, limit))
        }
    }
}
