//! glcaps
//!
//! Negotiates a context, probes the driver, compares the result against the
//! reference database and writes the report.

use anyhow::{Context, Result};
use clap::Parser;
use glcaps_core::diff::diff;
use glcaps_core::{serialize, ContextConfiguration, ReferenceDatabase, Submission};
use glcaps_render::{default_candidates, Negotiator, Prober, WgpuDriver};
use glcaps_services::settings::DEFAULT_SETTINGS_FILE;
use glcaps_services::{ConsoleConfirm, DirectorySink, FileReferenceSource, Settings, SubmitOutcome, UploadSink};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Graphics driver capability viewer
#[derive(Parser, Debug)]
#[command(name = "glcaps")]
#[command(version, about = "Probe graphics driver capabilities and compare them against a reference")]
struct Args {
    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Reference database (overrides settings)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Report file to write (defaults to <output_dir>/<device>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Submit the report to the shared repository
    #[arg(long)]
    submit: bool,

    /// Name recorded with the report (overrides settings)
    #[arg(long)]
    submitter: Option<String>,

    /// Accept a fallback context or a missing reference database without asking
    #[arg(short, long)]
    yes: bool,

    /// Print a human-readable summary
    #[arg(long)]
    summary: bool,

    /// Compare the new report against an earlier one
    #[arg(long, value_name = "REPORT")]
    diff: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.settings)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("glcaps v{}", glcaps_core::VERSION);

    let reference_path = args.reference.clone().unwrap_or_else(|| settings.reference_path.clone());
    let reference = match ReferenceDatabase::load(&mut FileReferenceSource::new(&reference_path)) {
        Ok(database) => Some(database),
        Err(e) => {
            tracing::warn!(error = %e, "Reference database unavailable");
            let skip = args.yes
                || ConsoleConfirm::stdio()
                    .ask("Reference database unavailable. Continue without classifying capabilities?")
                    .unwrap_or(false);
            if !skip {
                return Err(e).context("no reference database");
            }
            tracing::info!("Continuing without reference database, nothing will be classified");
            None
        }
    };

    let negotiator = Negotiator::new(settings.candidates.clone().unwrap_or_else(default_candidates));
    let mut driver = WgpuDriver::new();
    let handle = if args.yes {
        let mut accept = |_: &ContextConfiguration, _: &ContextConfiguration| true;
        negotiator.negotiate(&mut driver, &mut accept)?
    } else {
        negotiator.negotiate(&mut driver, &mut ConsoleConfirm::stdio())?
    };

    let set = Prober::new().probe(&handle);
    handle.release();

    let submitter = args.submitter.clone().or_else(|| settings.submitter.clone());
    let report = glcaps_core::build(&set, reference.as_ref(), Submission::now(submitter.clone()));
    let text = serialize::to_text(&report)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| settings.output_dir.join(format!("{}.json", report.key().slug())));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&output, &text).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(path = %output.display(), "Report written");

    if args.summary {
        println!("{}", serialize::summary(&report));
    }

    if let Some(path) = &args.diff {
        let before_text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let before = serialize::from_text(&before_text).with_context(|| format!("parsing {}", path.display()))?;
        let differences = diff(&before, &report);
        if differences.is_empty() {
            println!("No differences from {}", path.display());
        }
        for difference in &differences {
            println!("{difference}");
        }
    }

    if args.submit {
        let dir = settings
            .submission_dir
            .clone()
            .context("--submit needs `submission_dir` in the settings file")?;
        let mut sink = DirectorySink::new(dir);
        match sink.submit(&report.key(), &text, submitter.as_deref())? {
            SubmitOutcome::Stored(location) => println!("Submitted to {location}"),
            SubmitOutcome::AlreadyPresent => println!("A report for {} is already present", report.key()),
        }
    }

    Ok(())
}
