//! `livemap` command-line front end.
//!
//! Reads a compute request from a JSON file, runs it on a background
//! worker and writes the response JSON (and optionally the raw `f32`
//! matrix) to disk or stdout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use livemap::engine::{ContactFrequencyEngine, DistanceMatrixEngine};
use livemap::trace::estimate_distance_threshold;
use livemap::transport::codec::{decode_request, encode_response};
use livemap::transport::{ComputeRequest, ComputeResponse, ComputeWorker};
use livemap::Options;

#[derive(Parser)]
#[command(name = "livemap")]
#[command(
    about = "Contact-frequency and distance matrices for 3D genome traces",
    long_about = None
)]
struct Cli {
    /// Options TOML file
    #[arg(long, global = true, value_name = "FILE")]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count segment contacts for a trace or ensemble request
    Contact {
        /// Request JSON file
        request: PathBuf,
        /// Contact threshold, clamped to the configured range; overrides
        /// the request's own value
        #[arg(long)]
        threshold: Option<f64>,
        /// Response JSON file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Also write the matrix as raw native-endian f32
        #[arg(long, value_name = "FILE")]
        raw: Option<PathBuf>,
    },
    /// Pairwise or ensemble-averaged distances for a request
    Distance {
        /// Request JSON file
        request: PathBuf,
        /// Response JSON file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Also write the matrix as raw native-endian f32
        #[arg(long, value_name = "FILE")]
        raw: Option<PathBuf>,
    },
    /// Print the contact threshold estimated from the request's first trace
    Estimate {
        /// Request JSON file
        request: PathBuf,
    },
}

fn read_request(path: &Path) -> anyhow::Result<ComputeRequest> {
    let bytes = fs::read(path)
        .with_context(|| format!("reading request {}", path.display()))?;
    decode_request(&bytes)
        .with_context(|| format!("decoding request {}", path.display()))
}

fn write_response(
    response: &ComputeResponse,
    output: Option<&Path>,
    raw: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = raw {
        fs::write(path, response.matrix_buffer.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!(
            "wrote {} cells to {}",
            response.matrix_buffer.len(),
            path.display()
        );
    }

    let json = encode_response(response)?;
    match output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&json)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();
    let cli = Cli::parse();

    let options = match &cli.options {
        Some(path) => Options::load(path)
            .with_context(|| format!("loading options {}", path.display()))?,
        None => Options::default(),
    };

    match cli.command {
        Command::Contact {
            request,
            threshold,
            output,
            raw,
        } => {
            let mut request = read_request(&request)?;
            if let Some(t) = threshold {
                request.distance_threshold =
                    Some(options.contact.clamp_threshold(t));
            }
            let worker =
                ComputeWorker::spawn(ContactFrequencyEngine::new(&options))?;
            let response = worker.compute(&request)?;
            write_response(&response, output.as_deref(), raw.as_deref())?;
        }
        Command::Distance {
            request,
            output,
            raw,
        } => {
            let request = read_request(&request)?;
            let worker =
                ComputeWorker::spawn(DistanceMatrixEngine::new(&options))?;
            let response = worker.compute(&request)?;
            write_response(&response, output.as_deref(), raw.as_deref())?;
        }
        Command::Estimate { request } => {
            let request = read_request(&request)?;
            let Some(first) = request.traces()?.first() else {
                bail!("request carries no traces");
            };
            let Some(estimate) = estimate_distance_threshold(first) else {
                bail!("first trace has no present points");
            };
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", options.contact.clamp_threshold(estimate))?;
        }
    }
    Ok(())
}
