//! Process one goal file and print its summary and safety zones.
//!
//! ```text
//! cargo run --example process_goal -- tests/data/pushups.bb
//! ```
use std::env;

use anyhow::{Context, Result};
use beebrain::goal::{BrainInput, GoalProcessor, ProcessingConfig};
use beebrain::time::format_date;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/data/pushups.bb".to_string());
    let input = BrainInput::from_path(&path).with_context(|| format!("reading {path}"))?;

    let config = ProcessingConfig::builder().fix_doless_isolines(true).build()?;
    println!("{config:#}");

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs_f64();
    let outcome = GoalProcessor::new(config).process_detailed(&input, now);
    println!("{}", outcome.snapshot.statsum.replace("\\n", "\n"));

    let state = match outcome.state {
        Ok(state) => state,
        Err(e) => {
            println!("goal not processed: {e}");
            return Ok(());
        }
    };
    println!("{}", state.summary.titlesum);
    println!("{}", state.summary.safeblurb);
    for p in state.points().iter().rev().take(5) {
        println!(
            "{}  {:>10.2}  {}",
            format_date(p.t),
            p.v,
            state.classify(p.t, p.v).name()
        );
    }
    println!("processed in {} ms", outcome.elapsed.as_millis());
    Ok(())
}
