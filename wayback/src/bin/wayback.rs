use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use wayback::{Client, Config};

/// Command-line interface to the archive.org Wayback Machine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate quiet log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Activate verbose log output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Timeout in seconds for HTTP requests
    #[arg(
        short = 'r',
        long,
        global = true,
        default_value_t = wayback::DEFAULT_REQUEST_TIMEOUT.as_secs()
    )]
    request_timeout: u64,

    /// Archive.org server base URL address
    #[arg(short, long, global = true, default_value = wayback::DEFAULT_BASE_URL)]
    base_url: String,

    /// 'Host' header to use
    #[arg(long, global = true, default_value = wayback::DEFAULT_HTTP_HOST)]
    http_host: String,

    /// 'User-Agent' header to use
    #[arg(short, long, global = true, default_value = wayback::DEFAULT_USER_AGENT)]
    user_agent: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search archive.org for snapshots of a URL and print them as JSON
    Search { url: String },

    /// Request a fresh archive.org crawl of a URL and print the location
    /// of the new snapshot
    Capture { url: String },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(&cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let client = Client::new(Config {
        base_url: cli.base_url.clone(),
        host: cli.http_host.clone(),
        user_agent: cli.user_agent.clone(),
        timeout: Duration::from_secs(cli.request_timeout),
        max_tries: wayback::DEFAULT_MAX_TRIES,
    });

    match &cli.command {
        Command::Search { url } => {
            let snapshots = client.search(url)?;
            info!("Found {} results", snapshots.len());
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }

        Command::Capture { url } => {
            let location = client.capture(url)?;
            println!("{location}");
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::ERROR
    } else if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
