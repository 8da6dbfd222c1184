//! Nanotrace CLI - inspect sessions and export traces or noise spectra as CSV.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nanotrace::pipeline::{process_psd, process_trace, TraceQuery};
use nanotrace::session::Session;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nanotrace")]
#[command(author, version, about = "Nanopore current trace export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise the session a recording belongs to
    Info {
        /// Any recording of the session
        #[arg(value_name = "RECORDING")]
        recording: PathBuf,
    },

    /// Export a (filtered, downsampled) current trace as time,current
    Trace {
        #[command(flatten)]
        query: QueryArgs,

        /// Output rate in Hz, applied after filtering
        #[arg(long)]
        downsample: Option<f64>,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export the Welch PSD as frequency,power,rms
    Psd {
        #[command(flatten)]
        query: QueryArgs,

        /// Segment length in seconds (rounded up to a power of two in samples)
        #[arg(long)]
        segment: Option<f64>,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Any recording of the session
    #[arg(value_name = "RECORDING")]
    recording: PathBuf,

    /// Start time in seconds
    #[arg(short, long, default_value_t = 0.0)]
    start: f64,

    /// End time in seconds
    #[arg(short, long, default_value_t = 10.0)]
    end: f64,

    /// Bessel low-pass cutoff in Hz
    #[arg(long, default_value_t = 900_000.0)]
    cutoff: f64,

    /// Filter order
    #[arg(long, default_value_t = 8)]
    order: usize,

    /// Skip the low-pass filter
    #[arg(long)]
    no_filter: bool,
}

impl QueryArgs {
    fn to_query(&self) -> TraceQuery {
        TraceQuery {
            start_time: self.start,
            end_time: self.end,
            cutoff_hz: (!self.no_filter).then_some(self.cutoff),
            filter_order: self.order,
            ..TraceQuery::default()
        }
    }
}

fn open_session(recording: &Path) -> anyhow::Result<Session> {
    Session::open(recording)
        .with_context(|| format!("opening session for {}", recording.display()))
}

fn create_csv(path: &Path, header: &str) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}")?;
    Ok(writer)
}

fn print_warnings<W: std::fmt::Display>(warnings: &[W]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { recording } => {
            let session = open_session(&recording)?;
            println!("{}", session.describe());
            for file in session.index().files() {
                println!(
                    "  {}  {}  {} samples",
                    file.timestamp(),
                    file.path().display(),
                    file.sample_count()
                );
            }
            println!(
                "{} samples at {} Hz ({:.3} s)",
                session.total_samples(),
                session.sample_rate(),
                session.duration_seconds()
            );
        }

        Commands::Trace {
            query,
            downsample,
            output,
        } => {
            let mut session = open_session(&query.recording)?;
            let request = TraceQuery {
                downsample_rate: downsample,
                ..query.to_query()
            };
            let view = process_trace(&mut session, &request)?;
            print_warnings(view.warnings());

            let mut csv = create_csv(&output, "time,current")?;
            for (t, current) in view.time_axis().iter().zip(&view.signal.samples) {
                writeln!(csv, "{t},{current}")?;
            }
            csv.flush()?;
            println!(
                "Wrote {} samples at {} Hz to {}",
                view.signal.len(),
                view.signal.sample_rate,
                output.display()
            );
        }

        Commands::Psd {
            query,
            segment,
            output,
        } => {
            let mut session = open_session(&query.recording)?;
            let request = TraceQuery {
                psd_segment_seconds: segment,
                ..query.to_query()
            };
            let report = process_psd(&mut session, &request)?;
            print_warnings(&report.warnings);

            let psd = &report.psd;
            let mut csv = create_csv(&output, "frequency,power,rms")?;
            for ((f, p), rms) in psd.frequencies.iter().zip(&psd.power).zip(&psd.cumulative_rms) {
                writeln!(csv, "{f},{p},{rms}")?;
            }
            csv.flush()?;
            println!(
                "Wrote {} bins ({} segments of {}) to {}",
                psd.frequencies.len(),
                psd.segments,
                psd.segment_length,
                output.display()
            );
            println!(
                "RMS noise to {} Hz: {:.3} pA",
                report.bandwidth_hz / 2.0,
                report.band_rms()
            );
        }
    }

    Ok(())
}
