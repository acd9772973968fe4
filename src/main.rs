use clap::Parser;
use haikumug::config::{OpenAiConfig, setup_logging};
use haikumug::generator::HaikuGenerator;
use haikumug::openai::OpenAiClient;
use haikumug::render::{Background, MugRenderer, SerifFont};
use haikumug::web::AppState;
use tracing::{error, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = haikumug::cli::CliOptions::parse();

    let _ = setup_logging(cli.debug);

    let font = match SerifFont::from_path(&cli.assets.font_path) {
        Ok(font) => font,
        Err(err) => {
            error!("Font error: {}", err);
            return;
        }
    };

    let client = match OpenAiClient::new(OpenAiConfig::from(&cli.openai)) {
        Ok(client) => client,
        Err(err) => {
            error!("OpenAI client error: {}", err);
            return;
        }
    };
    if !client.config().has_api_key() {
        warn!("OPENAI_API_KEY is not set, haiku generation will fail until it is");
    }

    let background = Background::load(cli.assets.background_path.clone());
    let state = AppState::new(
        HaikuGenerator::new(client),
        MugRenderer::new(font),
        background,
        cli.assets.background_path,
        &cli.environment,
    );

    if let Err(err) = haikumug::web::setup_server(&cli.listen_address, cli.port, state).await {
        error!("Application error: {}", err);
    }
}
