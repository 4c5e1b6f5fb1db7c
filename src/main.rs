//! StreamVault - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use indicatif::ProgressBar;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use streamvault::{
    cli::Args,
    config::{validate_config, Config},
    download::{DownloadSession, SessionOptions, SessionRegistry, SessionState},
    error::{exit_codes, Error, Result},
    fs::destination_path,
    output::{
        create_spinner, print_banner, print_config_summary, print_controls, print_error,
        print_info, print_session_summary, print_stream_list, print_success, print_warning,
        ProgressBarObserver,
    },
    provider::{order_streams, pick_stream, HttpStreamProvider, StreamProvider},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::NotFound(_)
                | Error::NoStreams(_)
                | Error::Api(_)
                | Error::Http(_)
                | Error::Json(_)
                | Error::UrlParse(_) => ExitCode::from(exit_codes::PROVIDER_ERROR as u8),
                Error::SourceUnavailable(_)
                | Error::DestinationUnwritable { .. }
                | Error::Transfer(_) => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if !args.quiet {
        print_banner();
    }

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        if !args.quiet {
            print_warning(&format!(
                "Configuration file not found: {}",
                args.config.display()
            ));
            print_info("Using default configuration with CLI arguments");
        }
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    let download_dir = config.download_directory();
    if !args.quiet {
        print_config_summary(
            &args.url,
            &download_dir.display().to_string(),
            &config.download.resume_policy.to_string(),
            config.download.chunk_size,
        );
    }

    // Resolve the URL into streams
    let provider = HttpStreamProvider::new(&config.network)?;
    let spinner = (!args.quiet).then(|| create_spinner("Resolving media..."));
    let resolved = provider.resolve(&args.url).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let media = resolved?;
    let streams = order_streams(media.streams);

    if args.list {
        print_stream_list(&media.title, &streams);
        return Ok(exit_codes::SUCCESS);
    }

    let stream = pick_stream(&streams, args.quality.as_deref())?.clone();
    let destination = destination_path(&download_dir, &media.title, &stream.container);
    print_info(&format!(
        "Downloading {} ({}) to {}",
        media.title,
        stream.quality_label,
        destination.display()
    ));

    let registry = SessionRegistry::from_config(&config);
    let session = DownloadSession::new(
        media.title.clone(),
        stream,
        destination,
        SessionOptions::from(&config),
    );
    registry.register(session.clone())?;

    let bar = if args.quiet {
        None
    } else {
        let observer = ProgressBarObserver::new(session.title(), session.stream().total_bytes);
        let bar = observer.bar().clone();
        session.subscribe(observer);
        print_controls();
        Some(bar)
    };

    // A failed start is recorded on the session and reported in the summary
    if let Err(e) = session.start().await {
        tracing::debug!(error = %e, "Session failed to start");
    } else {
        control_loop(&session, bar.as_ref()).await;
    }

    let snapshot = session.snapshot();
    print_session_summary(&snapshot);

    let code = match snapshot.state {
        SessionState::Completed => {
            print_success(&format!("Saved to {}", snapshot.destination.display()));
            exit_codes::SUCCESS
        }
        SessionState::Canceled => {
            print_warning("Download canceled, partial file kept on disk");
            exit_codes::ABORT
        }
        SessionState::Errored => {
            print_error(snapshot.last_error.as_deref().unwrap_or("download failed"));
            exit_codes::DOWNLOAD_ERROR
        }
        state => {
            print_warning(&format!("Download stopped while {}", state));
            exit_codes::ABORT
        }
    };

    Ok(code)
}

/// Drive a running session from stdin commands and Ctrl-C until it ends.
async fn control_loop(session: &DownloadSession, bar: Option<&ProgressBar>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            state = session.wait_terminal() => {
                tracing::debug!(state = %state, "Session finished");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                notice(bar, "Interrupted, canceling download...");
                if let Err(e) = session.cancel().await {
                    tracing::warn!(error = %e, "Cancel failed");
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => handle_command(session, bar, line.trim()).await,
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::debug!(error = %e, "Stopped reading commands");
                    stdin_open = false;
                }
            },
        }
    }
}

async fn handle_command(session: &DownloadSession, bar: Option<&ProgressBar>, command: &str) {
    let result = match command {
        "p" | "P" => {
            let pausing = session.state() == SessionState::Downloading;
            notice(bar, if pausing { "Pausing..." } else { "Resuming..." });
            session.toggle_pause().await
        }
        "c" | "C" => {
            notice(bar, "Canceling...");
            session.cancel().await
        }
        "" => Ok(()),
        other => {
            notice(bar, &format!("Unknown command '{}' (use p or c)", other));
            Ok(())
        }
    };

    if let Err(e) = result {
        notice(bar, &e.to_string());
    }
}

/// Print a line without tearing the progress bar.
fn notice(bar: Option<&ProgressBar>, message: &str) {
    match bar {
        Some(bar) => bar.println(message),
        None => print_info(message),
    }
}
