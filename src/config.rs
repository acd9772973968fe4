//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::OpenAiOptions;
use crate::constants::{DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL, UPSTREAM_TIMEOUT_SECONDS};
use crate::error::HaikuError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the OpenAI client needs, passed in once at construction.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API credential, generation fails fast without it
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sent as `OpenAI-Project` when set
    pub project: Option<String>,
    /// API root, eg `https://api.openai.com/v1`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Config against the public API with the default model.
    pub fn new(api_key: Option<String>) -> Result<Self, HaikuError> {
        let base_url = Url::parse(DEFAULT_OPENAI_BASE_URL)
            .map_err(|err| HaikuError::Configuration(format!("Invalid OpenAI base URL: {err}")))?;
        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            project: None,
            base_url,
            timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SECONDS),
        })
    }

    /// Points the client somewhere else, eg a local mock.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// True when a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full URL of the `responses` endpoint under the base URL.
    pub fn responses_url(&self) -> Result<Url, HaikuError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                HaikuError::Configuration(format!(
                    "OpenAI base URL can't take a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("responses");
        Ok(url)
    }
}

impl From<&OpenAiOptions> for OpenAiConfig {
    fn from(options: &OpenAiOptions) -> Self {
        Self {
            api_key: options
                .openai_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: options.openai_model.clone(),
            project: options.openai_project.clone(),
            base_url: options.openai_base_url.clone(),
            timeout: Duration::from_secs(options.openai_timeout),
        }
    }
}
