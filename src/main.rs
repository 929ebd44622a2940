use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mget_lib::cli::Args;
use mget_lib::downloader::{
    Downloader, NoProgress, PlatformRegistry, ProgressSink, TerminalProgress, YtDlpClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.version {
        println!("mget version {}", mget_lib::VERSION);
        return ExitCode::SUCCESS;
    }

    // Reject bad input before any client or proxy setup
    let request = match args.checked_request(&PlatformRegistry::default()) {
        Ok(Some(request)) => request,
        Ok(None) => {
            return match Args::command().print_help() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match YtDlpClient::new(args.client_config()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let downloader = Downloader::new(Box::new(client)).with_options(args.download_options());

    let mut progress: Box<dyn ProgressSink> = if args.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(TerminalProgress::new())
    };

    match downloader.download(&request, progress.as_mut()).await {
        Ok(outcome) => {
            println!();
            println!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
