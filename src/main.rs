use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subtitle_fetcher::cli::{self, Cli, Invocation};
use subtitle_fetcher::config::Config;
use subtitle_fetcher::fetcher::TranscriptFetcher;
use subtitle_fetcher::output;
use subtitle_fetcher::providers::youtube::YoutubeProvider;
use subtitle_fetcher::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::parse_invocation(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Info(err) => err.exit(),
        Invocation::Usage(_) => {
            println!("{}", cli::usage());
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    let provider = YoutubeProvider::new(&config.provider)?;
    let fetcher = TranscriptFetcher::new(provider, config.provider.fallback_languages.clone());

    let video_id = utils::normalize_video_id(&cli.video_id);
    if video_id != cli.video_id {
        tracing::debug!("Resolved video id {} from {}", video_id, cli.video_id);
    }

    let result = fetcher.fetch(&video_id).await;

    output::print_to_console(&result)?;

    if let Some(path) = &cli.output {
        match output::save_to_file(&result, path) {
            Ok(()) => tracing::info!("Subtitles saved to: {}", path.display()),
            Err(err) => tracing::error!("Could not save subtitles to {}: {:#}", path.display(), err),
        }
    }

    Ok(())
}
