pub mod config;
mod db;
pub mod detection;
pub mod error;
pub mod ledger;
pub mod models;
pub mod monitors;
pub mod proctor;
pub mod replay;
pub mod sink;
pub mod tracker;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

pub use config::{PoseThresholds, ProctorConfig, SessionMode};
pub use db::Database;
pub use detection::{BrowserEvent, CameraTrack, EventDisposition, FrameSource, TrackState};
pub use ledger::{LedgerState, StrikeLedger};
pub use models::{Notification, ProctorNotice, Severity, Violation, ViolationKind, ViolationRecord};
pub use proctor::{ProctorBuilder, ProctorController, ProctorSnapshot};
pub use sink::{MemoryViolationSink, SqliteViolationSink, ViolationSink};
pub use utils::init_logging;

use replay::{run_scenario, Scenario};

const USAGE: &str = "usage: proctor-replay <scenario.json> [--db <violations.sqlite3>]";

struct ReplayArgs {
    scenario: PathBuf,
    db: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<ReplayArgs> {
    let mut scenario = None;
    let mut db = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let path = args.next().ok_or_else(|| anyhow!("--db needs a path\n{USAGE}"))?;
                db = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            other if scenario.is_none() => scenario = Some(PathBuf::from(other)),
            other => bail!("unexpected argument {other}\n{USAGE}"),
        }
    }

    Ok(ReplayArgs {
        scenario: scenario.ok_or_else(|| anyhow!("{USAGE}"))?,
        db,
    })
}

/// Entry point of the `proctor-replay` binary.
pub fn run() -> Result<()> {
    init_logging();

    let args = parse_args(std::env::args().skip(1))?;
    let config = match std::env::var_os("PROCTOR_CONFIG") {
        Some(path) => ProctorConfig::load(&PathBuf::from(path))?,
        None => ProctorConfig::default(),
    };
    let scenario = Scenario::load(&args.scenario)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let report = runtime.block_on(async move {
        let sink: Option<Arc<dyn ViolationSink>> = match args.db {
            Some(path) => Some(Arc::new(SqliteViolationSink::open(path)?)),
            None => None,
        };
        run_scenario(scenario, config, sink).await
    })?;

    let rendered =
        serde_json::to_string_pretty(&report).context("failed to serialize replay report")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_scenario_and_db() {
        let parsed = parse_args(args(&["run.json", "--db", "out/v.sqlite3"])).unwrap();
        assert_eq!(parsed.scenario, PathBuf::from("run.json"));
        assert_eq!(parsed.db, Some(PathBuf::from("out/v.sqlite3")));
    }

    #[test]
    fn rejects_missing_scenario_and_dangling_flag() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["run.json", "--db"])).is_err());
        assert!(parse_args(args(&["a.json", "b.json"])).is_err());
    }
}
