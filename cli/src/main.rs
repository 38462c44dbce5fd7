//! holdsim - replay a recorded traffic scenario through the hold scheduler
//!
//! Each frame of the scenario is one tick's aircraft collection. Clearances
//! the scheduler queued on earlier ticks are delivered before the next frame
//! runs, so a frame recorded without the scheduler still sees its effects.
//! Output is one JSON object per line on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use hold_dispatch_core::{
    Aircraft, ClearanceQueue, ClearanceRequest, ClearanceState, DispatchConfig, Event, HoldAndDispatch,
    StaticAirspace, TickResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Replay a traffic scenario through the holding scheduler")]
struct Args {
    /// Scenario JSON: airspace, config and per-tick aircraft frames
    scenario: PathBuf,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    ticks: Option<usize>,

    /// Write the scheduler snapshot here after the last tick
    #[arg(long, value_name = "PATH")]
    checkpoint_out: Option<PathBuf>,

    /// Also print every scheduler event
    #[arg(long)]
    events: bool,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    airspace: StaticAirspace,
    config: DispatchConfig,
    frames: Vec<Vec<Aircraft>>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    Clearance { tick: u64, request: &'a ClearanceRequest },
    Event { event: &'a Event },
    Tick { result: &'a TickResult },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let Scenario {
        mut airspace,
        config,
        frames,
    } = serde_json::from_str(&raw).context("parsing scenario")?;

    let mut scheduler = HoldAndDispatch::new(config, &mut airspace).context("building scheduler")?;
    info!(
        stacks = scheduler.stacks().len(),
        frames = frames.len(),
        "scenario loaded"
    );

    let limit = args.ticks.unwrap_or(frames.len());
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut delivered: HashMap<String, ClearanceState> = HashMap::new();
    let mut events_printed = 0;

    for mut frame in frames.into_iter().take(limit) {
        for aircraft in &mut frame {
            if let Some(clearance) = delivered.get(&aircraft.callsign) {
                aircraft.latest_clearance = clearance.clone();
            }
        }

        let mut queue = ClearanceQueue::new();
        let result = scheduler.update(&frame, &airspace, &mut queue);

        for request in queue.requests() {
            write_line(
                &mut out,
                &OutputLine::Clearance {
                    tick: result.tick,
                    request,
                },
            )?;
        }
        if args.events {
            let events = scheduler.event_log().events();
            for event in &events[events_printed..] {
                write_line(&mut out, &OutputLine::Event { event })?;
            }
            events_printed = events.len();
        }
        write_line(&mut out, &OutputLine::Tick { result: &result })?;

        for request in queue.drain() {
            delivered.insert(request.callsign, request.clearance);
        }
    }
    out.flush()?;

    if let Some(path) = &args.checkpoint_out {
        let json = scheduler.snapshot()?.to_json()?;
        fs::write(path, json).with_context(|| format!("writing checkpoint {}", path.display()))?;
        info!(path = %path.display(), tick = scheduler.current_tick(), "checkpoint written");
    }

    Ok(())
}

fn write_line(out: &mut impl Write, line: &OutputLine) -> Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    Ok(())
}
