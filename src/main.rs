//! Command-line entry point: prompts for a keyword and runs one job

use reel_relay::{
    BrowserlessSurface, Config, Error, JobOrchestrator, Result, YtDlpResolver, run_with_shutdown,
    telemetry,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let keyword = prompt_keyword().await?;

    let resolver = match &config.download.ytdlp_path {
        Some(path) => YtDlpResolver::new(path.clone()),
        None => YtDlpResolver::from_path().ok_or_else(|| {
            Error::NotSupported("yt-dlp not found in PATH (set REEL_RELAY_YTDLP_PATH)".into())
        })?,
    };
    let surface = BrowserlessSurface::new(&config.search)?;

    let job = JobOrchestrator::new(config, Arc::new(surface), Arc::new(resolver))?;
    let report = run_with_shutdown(&job, &keyword).await?;

    for post in report.published() {
        println!("Video uploaded. Post ID: {}", post.id);
    }
    if report.downloaded == 0 {
        println!("No videos found for {keyword:?}");
    } else if report.failed() > 0 {
        println!("{} of {} uploads failed", report.failed(), report.downloaded);
    }
    Ok(())
}

async fn prompt_keyword() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Enter the keyword to search: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    let keyword = line.trim();
    if keyword.is_empty() {
        return Err(Error::config("keyword", "keyword must not be empty"));
    }
    Ok(keyword.to_string())
}
