use anyhow::{Context, Result};
use clap::Parser;
use haikumug::cli::{AssetOptions, OpenAiOptions};
use haikumug::config::{OpenAiConfig, setup_logging};
use haikumug::constants::MAX_INPUT_CHARS;
use haikumug::generator::HaikuGenerator;
use haikumug::haiku::truncate_chars;
use haikumug::openai::OpenAiClient;
use haikumug::render::{Background, MugRenderer, SerifFont};
use std::io::{self, Write};
use std::path::PathBuf;

/// Generate a haiku mug from the command line.
///
///   haiku_mug "an old pond in autumn" --out pond.png
#[derive(Parser, Debug)]
#[command(name = "haiku_mug")]
#[command(about = "Write a 5-7-5 haiku about some text and print it on a mug")]
struct Args {
    /// What the haiku should be about
    text: String,

    /// Where to write the PNG
    #[arg(long, short, default_value = "mug.png")]
    out: PathBuf,

    #[command(flatten)]
    openai: OpenAiOptions,

    #[command(flatten)]
    assets: AssetOptions,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _ = setup_logging(args.debug);

    let font = SerifFont::from_path(&args.assets.font_path)
        .with_context(|| format!("loading font {}", args.assets.font_path.display()))?;
    let background = Background::load(args.assets.background_path.clone());

    let client = OpenAiClient::new(OpenAiConfig::from(&args.openai))?;
    let generator = HaikuGenerator::new(client);

    let text = truncate_chars(&args.text, MAX_INPUT_CHARS);
    let haiku = generator.generate(text).await?;

    let image = background
        .ready()
        .await
        .with_context(|| format!("loading background {}", args.assets.background_path.display()))?;
    let png = MugRenderer::new(font).render_png(&haiku.ja, &image)?;
    tokio::fs::write(&args.out, png)
        .await
        .with_context(|| format!("writing {}", args.out.display()))?;

    let mut stderr = io::stderr().lock();
    for (ja, en) in haiku.ja.iter().zip(haiku.en.iter()) {
        writeln!(stderr, "{ja}    {en}")?;
    }
    writeln!(stderr, "Saved mug to {}", args.out.display())?;
    Ok(())
}
