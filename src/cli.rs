//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;
use std::path::PathBuf;
use url::Url;

use crate::constants::{DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "HAIKUMUG_DEBUG")]
    /// Enable debug logging. Env: HAIKUMUG_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "HAIKUMUG_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: HAIKUMUG_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "HAIKUMUG_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: HAIKUMUG_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, short, default_value = "unknown", env = "HAIKUMUG_ENV")]
    /// Deployment label reported by `/api/debug-env`.
    /// Env: HAIKUMUG_ENV
    pub environment: String,

    #[command(flatten)]
    /// Upstream model settings
    pub openai: OpenAiOptions,

    #[command(flatten)]
    /// Background and font files
    pub assets: AssetOptions,
}

#[derive(Args, Debug, Clone)]
/// Options for the OpenAI Responses API
pub struct OpenAiOptions {
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// OpenAI API key. Generation fails until one is set.
    /// Env: OPENAI_API_KEY
    pub openai_api_key: Option<String>,
    #[clap(long, default_value = DEFAULT_MODEL, env = "OPENAI_MODEL")]
    /// Text model, defaults to `gpt-4o-mini`.
    /// Env: OPENAI_MODEL
    pub openai_model: String,
    #[clap(long, env = "OPENAI_PROJECT")]
    /// Project id sent as `OpenAI-Project`.
    /// Env: OPENAI_PROJECT
    pub openai_project: Option<String>,
    #[clap(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    /// API root.
    /// Env: OPENAI_BASE_URL
    pub openai_base_url: Url,
    #[clap(long, default_value = "60", env = "OPENAI_TIMEOUT")]
    /// Upstream timeout in seconds.
    /// Env: OPENAI_TIMEOUT
    pub openai_timeout: u64,
}

#[derive(Args, Debug, Clone)]
/// Files the renderer draws with
pub struct AssetOptions {
    #[clap(long, default_value = "./static/mug.png", env = "HAIKUMUG_BACKGROUND")]
    /// Mug background image (png or jpeg).
    /// Env: HAIKUMUG_BACKGROUND
    pub background_path: PathBuf,
    #[clap(long, default_value = "./static/serif.ttf", env = "HAIKUMUG_FONT")]
    /// Serif font with Japanese coverage (ttf/otf).
    /// Env: HAIKUMUG_FONT
    pub font_path: PathBuf,
}
