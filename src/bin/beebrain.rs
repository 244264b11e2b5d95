use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use beebrain::brain_errors::BrainError;
use beebrain::derail::PprPolicy;
use beebrain::goal::{BrainInput, GoalProcessor, GoalSnapshot, ProcessingConfig};
use clap::{ArgAction, Parser, ValueHint};
use serde_json::Map;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute goal snapshots from .bb goal files", long_about = None)]
struct Cli {
    /// Goal files to process
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    bbfiles: Vec<PathBuf>,

    /// Directory for the output JSON files (defaults next to each goal file)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Unix time used as the current time
    #[arg(long)]
    now: Option<f64>,

    /// Indent the output JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pretty: bool,

    /// Rate assumed on days with no data: legacy, floor-magnitude or clamp-wrong-direction
    #[arg(long, default_value = "legacy")]
    ppr_policy: PprPolicy,

    /// Smallest pessimistic daily rate
    #[arg(long, default_value_t = 2.0)]
    daily_minimum: f64,

    /// Clip isolines of do-less goals against the road
    #[arg(long, action = ArgAction::SetTrue)]
    fix_doless_isolines: bool,

    /// Processing time budget per goal in milliseconds
    #[arg(long, default_value_t = beebrain::constants::MAXTIME)]
    max_time_ms: u64,

    /// Verbose logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn current_time() -> Result<f64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before 1970")?;
    Ok(elapsed.as_secs_f64())
}

/// Load a goal file, mapping failures to the messages goal pages show.
fn load(path: &Path) -> std::result::Result<BrainInput, BrainError> {
    BrainInput::from_path(path).map_err(|e| match e {
        BrainError::GoalFileNotFound(_) => {
            BrainError::ValidationError("Could not find goal (.bb) file.".into())
        }
        _ => BrainError::ValidationError("Bad .bb file.".into()),
    })
}

fn output_path(bbfile: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    let slug = bbfile
        .file_stem()
        .with_context(|| format!("no file name in {}", bbfile.display()))?;
    let dir = match output_dir {
        Some(d) => d.to_path_buf(),
        None => bbfile.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(slug).with_extension("json"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = ProcessingConfig::builder()
        .ppr_policy(cli.ppr_policy)
        .daily_minimum(cli.daily_minimum)
        .fix_doless_isolines(cli.fix_doless_isolines)
        .max_processing_time(Duration::from_millis(cli.max_time_ms))
        .build()?;
    info!("{config}");
    let processor = GoalProcessor::new(config);
    let now = match cli.now {
        Some(t) => t,
        None => current_time()?,
    };

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let mut failures = 0usize;
    for bbfile in &cli.bbfiles {
        let snapshot = match load(bbfile) {
            Ok(input) => {
                let outcome = processor.process_detailed(&input, now);
                if outcome.exceeded(processor.config().max_processing_time) {
                    bail!(
                        "processing {} took {} ms, over the {} ms budget",
                        bbfile.display(),
                        outcome.elapsed.as_millis(),
                        processor.config().max_processing_time.as_millis()
                    );
                }
                outcome.snapshot
            }
            Err(e) => GoalSnapshot::from_error(&Map::new(), &e, now),
        };
        if !snapshot.error.is_empty() {
            error!(file = %bbfile.display(), error = %snapshot.error, "goal not processed");
            failures += 1;
        }

        let out = output_path(bbfile, cli.output_dir.as_deref())?;
        fs::write(&out, snapshot.to_json(cli.pretty)?)
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!(file = %out.display(), "snapshot written");
    }

    if failures > 0 {
        bail!("{failures} of {} goal files had errors", cli.bbfiles.len());
    }
    Ok(())
}
