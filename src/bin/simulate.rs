use chrono::{SecondsFormat, Utc};
use clap::Parser;
use env_logger::Env;
use maze_chase_core::autopilot::next_intent;
use maze_chase_core::engine::{EngineOptions, GameEngine};
use maze_chase_core::types::{Phase, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Number of seeded autopilot sessions to play.
    #[arg(long, default_value_t = 3)]
    runs: u32,
    #[arg(long, env = "MAZE_SEED")]
    seed: Option<u32>,
    #[arg(long, env = "MAZE_TICK_MS")]
    tick_ms: Option<u64>,
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: Phase,
    score: u32,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    pellets: u32,
    #[serde(rename = "powerPellets")]
    power_pellets: u32,
    #[serde(rename = "ghostsCaptured")]
    ghosts_captured: u32,
    #[serde(rename = "ghostsRecovered")]
    ghosts_recovered: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Tracks the previous snapshot so per-tick invariants can compare against it.
#[derive(Default)]
struct InvariantChecker {
    last_score: u32,
    last_remaining: Option<usize>,
}

impl InvariantChecker {
    fn check(&mut self, snapshot: &Snapshot) -> Vec<String> {
        let mut anomalies = Vec::new();
        if snapshot.score < self.last_score {
            anomalies.push(format!(
                "score decreased: {} -> {}",
                self.last_score, snapshot.score
            ));
        }
        if let Some(last) = self.last_remaining {
            if snapshot.remaining_collectibles > last {
                anomalies.push(format!(
                    "collectibles reappeared: {last} -> {}",
                    snapshot.remaining_collectibles
                ));
            }
        }
        self.last_score = snapshot.score;
        self.last_remaining = Some(snapshot.remaining_collectibles);

        let height = snapshot.tiles.len() as i32;
        let width = snapshot
            .tiles
            .first()
            .map(|row| row.chars().count() as i32)
            .unwrap_or(0);
        let in_range = |x: i32, y: i32| x >= 0 && x < width && y >= 0 && y < height;
        if !in_range(snapshot.player.x, snapshot.player.y) {
            anomalies.push(format!(
                "player out of range: ({},{})",
                snapshot.player.x, snapshot.player.y
            ));
        }
        for ghost in &snapshot.ghosts {
            if !in_range(ghost.x, ghost.y) {
                anomalies.push(format!(
                    "{:?} ghost out of range: ({},{})",
                    ghost.role, ghost.x, ghost.y
                ));
            }
            if ghost.returning && (ghost.x, ghost.y) != (ghost.home.x, ghost.home.y) {
                anomalies.push(format!("{:?} ghost left home while returning", ghost.role));
            }
        }

        if snapshot.phase == Phase::Lost && snapshot.power_mode {
            anomalies.push("player lost during power mode".to_string());
        }
        if snapshot.phase == Phase::Won && snapshot.remaining_collectibles > 0 {
            anomalies.push(format!(
                "won with {} collectibles left",
                snapshot.remaining_collectibles
            ));
        }
        anomalies
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at = Utc::now();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at.timestamp_millis()));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "tickMs": cli.tick_ms,
                "maxTicks": cli.max_ticks,
            }),
        );
        let scenario_run = match run_scenario(&scenario, cli.tick_ms, cli.max_ticks) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "engine_init_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }
        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "durationMs": scenario_run.result.duration_ms,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!("{}", json!(scenario_run.result));
        scenario_results.push(scenario_run);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        &scenario_results,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    scenario: &Scenario,
    tick_ms: Option<u64>,
    max_ticks: u64,
) -> Result<ScenarioRunResult, String> {
    let mut engine = GameEngine::classic(EngineOptions {
        tick_ms,
        seed: Some(scenario.seed),
        ..EngineOptions::default()
    })
    .map_err(|error| error.to_string())?;
    engine.start();

    let mut checker = InvariantChecker::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut ghosts_recovered = 0;
    let mut last_tick = 0u64;

    while !engine.phase().is_terminal() {
        if let Some(dir) = next_intent(&engine) {
            engine.submit_direction_intent(dir);
        }
        engine.tick();
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in checker.check(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        ghosts_recovered += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::GhostRecovered { .. }))
            .count() as u32;

        if snapshot.tick >= max_ticks {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: summary.outcome,
            score: summary.score,
            ticks: last_tick,
            duration_ms: summary.duration_ms,
            pellets: summary.stats.pellets,
            power_pellets: summary.stats.power_pellets,
            ghosts_captured: summary.stats.ghosts_captured,
            ghosts_recovered,
            anomalies,
        },
        anomaly_records,
    })
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis() as u32);
    (0..cli.runs.max(1))
        .map(|idx| {
            let seed = seed.wrapping_add(idx);
            Scenario {
                name: format!("autopilot-{}", idx + 1),
                seed,
            }
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn outcome_key(outcome: Phase) -> String {
    match outcome {
        Phase::Ready => "ready",
        Phase::Playing => "playing",
        Phase::Won => "won",
        Phase::Lost => "lost",
    }
    .to_string()
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    runs: &[ScenarioRunResult],
) -> RunSummary {
    let scenario_count = runs.len();
    let total_score: u64 = runs.iter().map(|run| u64::from(run.result.score)).sum();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    let mut outcome_counts = BTreeMap::new();
    for run in runs {
        *outcome_counts
            .entry(outcome_key(run.result.outcome))
            .or_insert(0) += 1;
    }
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count: runs.iter().map(|run| run.anomaly_records.len()).sum(),
        average_score,
        outcome_counts,
        scenarios: runs.iter().map(|run| run.result.clone()).collect(),
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!("{}", json!(log_line));
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
