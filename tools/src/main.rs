//! kpi-runner: headless report runner for the KPI engine.
//!
//! Usage:
//!   kpi-runner --agent agent-1 --db metrics.db
//!   kpi-runner --agent agent-1 --seed-synthetic --seed 12345 --days 35
//!   kpi-runner --db metrics.db --ipc-mode
//!
//! `--seed-synthetic` writes a generated history for `--agent`, and only
//! into a store that holds no events at all. It is ignored in IPC mode.

use anyhow::Result;
use chrono::{Duration, Utc};
use kpi_core::{
    aggregator::Period,
    engine::KpiEngine,
    kpi::KpiRegistry,
    store::SqliteMetricStore,
    synthetic::{self, SyntheticProfile},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    WindowSummary {
        agent_id: String,
        #[serde(default)]
        days: Option<usize>,
    },
    DailyTrend {
        agent_id: String,
        #[serde(default)]
        days: Option<usize>,
    },
    WeeklyTrajectory {
        agent_id: String,
    },
    PeriodActivity {
        agent_id: String,
        period: String,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 35u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed_synthetic = args.iter().any(|a| a == "--seed-synthetic");
    let agent = str_arg(&args, "--agent").unwrap_or("agent-1");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir");

    let mut store = SqliteMetricStore::open(db)?;
    store.migrate()?;

    if seed_synthetic && ipc_mode {
        log::warn!("--seed-synthetic is ignored in IPC mode");
    } else if seed_synthetic {
        let start = Utc::now().date_naive() - Duration::days(days.saturating_sub(1) as i64);
        let profile = SyntheticProfile::new(start, days);
        synthetic::seed_empty_store(&mut store, &KpiRegistry::builtin(), agent, seed, &profile)?;
    }

    let engine = match data_dir {
        Some(dir) => KpiEngine::build(store, dir)?,
        None => KpiEngine::new(store, KpiRegistry::builtin(), Default::default()),
    };

    if ipc_mode {
        run_ipc_loop(&engine)?;
    } else {
        let window = parse_arg(&args, "--window", engine.config.summary_days);
        print_report(&engine, agent, window)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &KpiEngine<SqliteMetricStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::WindowSummary { agent_id, days } => {
                let n = days.unwrap_or(engine.config.summary_days);
                engine.window_summary(&agent_id, n).map(|r| serde_json::to_value(r))
            }
            IpcCommand::DailyTrend { agent_id, days } => {
                let n = days.unwrap_or(engine.config.trend_days);
                engine.daily_trend(&agent_id, n).map(|r| serde_json::to_value(r))
            }
            IpcCommand::WeeklyTrajectory { agent_id } => {
                engine.weekly_trajectory(&agent_id).map(|r| serde_json::to_value(r))
            }
            IpcCommand::PeriodActivity { agent_id, period } => {
                engine.period_activity_named(&agent_id, &period).map(|r| serde_json::to_value(r))
            }
        };

        match reply {
            Ok(value) => writeln!(stdout, "{}", value?)?,
            Err(e) => {
                log::warn!("IPC command failed: {e}");
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn print_report(engine: &KpiEngine<SqliteMetricStore>, agent: &str, window: usize) -> Result<()> {
    let summary = engine.window_summary(agent, window)?;

    println!("=== WINDOW SUMMARY ({agent}, last {window} days) ===");
    println!("  days tracked:   {}", summary.total_days_tracked);
    println!("  days with data: {}", summary.days_with_data);
    println!("  total xp:       {}", summary.totals.xp);
    println!("  total points:   {}", summary.totals.points);
    println!("  avg xp/day:     {}", summary.averages.xp_per_day);
    println!("  avg points/day: {}", summary.averages.points_per_day);
    for day in &summary.days {
        println!(
            "  {} | xp {:>3} | points {:>4} | progress {:>3}%",
            day.date, day.xp_earned, day.points_earned, day.progress_percentage
        );
        for kpi in &day.kpi_results {
            println!(
                "      {:<22} {:>10} / {:<8} {:>6.1}% {}",
                kpi.name,
                kpi.formatted_value(),
                kpi.formatted_target(),
                kpi.percentage,
                kpi.status.as_str()
            );
        }
    }

    println!();
    println!("=== DAILY TREND ===");
    for point in engine.daily_trend(agent, engine.config.trend_days)? {
        println!("  {} | {:>7} | {:>5.1}%", point.date, point.display, point.percentage);
    }

    println!();
    println!("=== WEEKLY TRAJECTORY ===");
    for bucket in engine.weekly_trajectory(agent)? {
        println!(
            "  {} | {:>5} points over {} days",
            bucket.label, bucket.points_earned, bucket.days_in_week
        );
    }

    println!();
    for period in [Period::Week, Period::Month] {
        let activity = engine.period_activity(agent, period)?;
        println!("=== THIS {} (since {}) ===", period.to_string().to_uppercase(), activity.start);
        println!("  total points: {}", activity.total_points);
        println!("{}", serde_json::to_string_pretty(&activity.kpi_metrics)?);
    }
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
