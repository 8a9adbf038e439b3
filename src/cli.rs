//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Resumable, throttled HTTP downloads.
///
/// Each URL is saved into the output directory; an existing partial file is
/// continued when the server supports byte ranges. Append `#limit=N` to a URL
/// to cap it at N KB/s (`#limit=2m` for 2 MB/s).
#[derive(Parser, Debug)]
#[command(name = "rget")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download
    pub urls: Vec<String>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Directory to save files into [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Default rate limit in KB/s for URLs without a #limit directive (0 to disable)
    #[arg(short, long, value_name = "KBPS")]
    pub limit: Option<u64>,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(format!("expected \"Name: value\", got \"{raw}\""));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}
