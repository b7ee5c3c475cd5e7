/// Client configuration: where requests go and how they are addressed
use crate::error::{ClientError, Result};

pub const DEFAULT_API_HOST: &str = "https://www.googleapis.com";
pub const DEFAULT_BASE_PATH: &str = "/datastore/v1beta2";
pub const DEFAULT_USER_AGENT: &str = concat!("dstore-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project (dataset) identifier, templated into every request path
    pub project_id: String,

    /// Scheme and host of the API endpoint
    pub api_host: String,

    /// Path prefix preceding `/datasets/<project>/<action>`
    pub base_path: String,

    /// Namespace applied to queries that do not name one
    pub namespace: Option<String>,

    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration for a project with default endpoint settings
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_host: DEFAULT_API_HOST.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            namespace: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Point the client at a different host (e.g. a local emulator)
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request path for an action, e.g. `/datastore/v1beta2/datasets/p/lookup`
    pub fn action_path(&self, action: &str) -> String {
        format!("{}/datasets/{}/{}", self.base_path, self.project_id, action)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            return Err(ClientError::Config("project_id must not be empty".to_string()));
        }

        if self.project_id.contains('/') {
            return Err(ClientError::Config("project_id must not contain '/'".to_string()));
        }

        if !(self.api_host.starts_with("http://") || self.api_host.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "api_host must start with http:// or https://, got '{}'",
                self.api_host
            )));
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ClientError::Config("base_path must start with '/'".to_string()));
        }

        Ok(())
    }
}
