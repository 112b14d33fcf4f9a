use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "get-subtitles",
    about = "Fetch YouTube subtitles and print them as JSON",
    version,
    long_about = "Fetches the subtitles of a YouTube video in its original language, falling back to a list of preferred languages, and prints the result as JSON on standard output."
)]
pub struct Cli {
    /// YouTube video id (a full video URL is also accepted)
    #[arg(value_name = "VIDEO_ID")]
    pub video_id: String,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(short, long, value_name = "FILE", env = "SUBTITLE_FETCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the JSON result to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// How argument parsing ended
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    /// `--help` or `--version`; clap prints and exits successfully
    Info(clap::Error),
    /// Wrong arguments; print usage and exit with failure
    Usage(clap::Error),
}

impl Cli {
    /// Parse arguments, separating usage errors from help/version requests
    pub fn parse_invocation<I, T>(args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Invocation::Run(cli),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                Invocation::Info(err)
            }
            Err(err) => Invocation::Usage(err),
        }
    }

    /// Log filter implied by the verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "subtitle_fetcher=debug,get_subtitles=debug"
        } else if self.quiet {
            "subtitle_fetcher=warn,get_subtitles=warn"
        } else {
            "subtitle_fetcher=info,get_subtitles=info"
        }
    }
}

/// Usage text printed when the arguments are wrong
pub fn usage() -> String {
    [
        "Usage: get-subtitles <video_id>",
        "Example: get-subtitles dQw4w9WgXcQ",
    ]
    .join("\n")
}
