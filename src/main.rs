//! Glycoscope: Diabetes risk screening console
//!
//! Main entry point: commits one screening input against the remote
//! scoring service and prints the derived views.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycoscope::adapters::{HttpScoringClient, ServiceConfig};
use glycoscope::application::{
    analytics, HistoryLedger, HistoryMirror, InsightBoard, SessionService, SessionSnapshot,
    WhatIfService,
};
use glycoscope::domain::{
    Feature, FeatureContribution, MetricsDraft, ModelDescriptor, UsageStats, WhatIfScenario,
};
use glycoscope::ports::ScoringService;

const USAGE: &str = "\
Usage: glycoscope <pregnancies> <glucose> <blood-pressure> <bmi> <age> [options]

Options:
  --what-if <feature> <value>   probe a single-field override (feature is
                                one of Pregnancies, Glucose, BloodPressure,
                                BMI, Age)
  --history-limit <n>           history entries to mirror (default 20)
  --clear-history               wipe the remote prediction log first
  --json                        emit the report as JSON
";

struct CliArgs {
    draft: MetricsDraft,
    what_if: Option<(Feature, f64)>,
    history_limit: usize,
    clear_history: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    if args.len() < 5 {
        bail!("expected five metric values\n\n{USAGE}");
    }

    let mut values = [0.0f64; 5];
    for (i, raw) in args[..5].iter().enumerate() {
        values[i] = raw
            .parse()
            .with_context(|| format!("'{raw}' is not a number"))?;
    }
    let draft = MetricsDraft {
        pregnancies: Some(values[0]),
        glucose: Some(values[1]),
        blood_pressure: Some(values[2]),
        bmi: Some(values[3]),
        age: Some(values[4]),
    };

    let mut what_if = None;
    let mut history_limit = 20;
    let mut clear_history = false;
    let mut json = false;

    let mut rest = args[5..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--what-if" => {
                let feature_raw = rest.next().context("--what-if needs a feature name")?;
                let value_raw = rest.next().context("--what-if needs a value")?;
                let feature = Feature::parse(feature_raw)
                    .with_context(|| format!("unknown feature '{feature_raw}'"))?;
                let value = value_raw
                    .parse()
                    .with_context(|| format!("'{value_raw}' is not a number"))?;
                what_if = Some((feature, value));
            }
            "--history-limit" => {
                let raw = rest.next().context("--history-limit needs a number")?;
                history_limit = raw
                    .parse()
                    .with_context(|| format!("'{raw}' is not a valid limit"))?;
            }
            "--clear-history" => clear_history = true,
            "--json" => json = true,
            other => bail!("unknown option '{other}'\n\n{USAGE}"),
        }
    }

    Ok(CliArgs {
        draft,
        what_if,
        history_limit,
        clear_history,
        json,
    })
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Logs go to stderr by default so `--json` output on stdout stays
    // machine-readable; GLYCOSCOPE_LOG_MODE=file redirects them to a file.
    let log_mode = std::env::var("GLYCOSCOPE_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file =
            std::env::var("GLYCOSCOPE_LOG_FILE").unwrap_or_else(|_| "glycoscope.log".to_string());
        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let _guard = init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let config = ServiceConfig::from_env();
    tracing::info!("Scoring service at {}", config.base_url);

    let client = Arc::new(HttpScoringClient::new(config));
    let session = SessionService::new(client.clone());
    let ledger = Arc::new(HistoryLedger::new(client.clone()));
    HistoryLedger::attach(&ledger, &session);
    let what_if_service = WhatIfService::new(client.clone());

    if cli.clear_history {
        ledger
            .clear(cli.history_limit)
            .context("history clear failed")?;
    }

    // Commit: validate locally, score remotely, install the canonical pair.
    let snapshot = session
        .commit(&cli.draft)
        .context("screening commit failed")?;

    // Fan out the dependent views for this revision and wait for them.
    let mut board = InsightBoard::new();
    board.on_commit(&client, &snapshot);
    while board.is_refreshing() {
        board.poll(&session);
        std::thread::sleep(Duration::from_millis(25));
    }

    let scenario = match cli.what_if {
        Some((feature, value)) => Some(
            what_if_service
                .evaluate(&snapshot.input, &snapshot.result, feature, value)
                .context("what-if probe failed")?,
        ),
        None => None,
    };

    if let Err(e) = ledger.refresh_if_stale(cli.history_limit) {
        tracing::warn!("History refresh failed: {}", e);
    }
    let history = ledger.snapshot();

    // Model-level statistics are session-independent; fetch them last and
    // treat failures as a degraded report, not a fatal error.
    let model = client.model_info().ok();
    let importance = client
        .feature_importance()
        .map(analytics::rank_contributions)
        .ok();
    let stats = client.usage_stats().ok();

    if cli.json {
        let report = build_json_report(
            &snapshot,
            &board,
            scenario.as_ref(),
            &history,
            &model,
            &importance,
            &stats,
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(
            &snapshot,
            &board,
            scenario.as_ref(),
            &history,
            &model,
            &importance,
            &stats,
        );
    }

    Ok(())
}

fn print_report(
    snapshot: &SessionSnapshot,
    board: &InsightBoard,
    scenario: Option<&WhatIfScenario>,
    history: &HistoryMirror,
    model: &Option<ModelDescriptor>,
    importance: &Option<Vec<FeatureContribution>>,
    stats: &Option<UsageStats>,
) {
    println!("Screening result (revision {})", snapshot.revision);
    println!(
        "  {}: probability {:.1}%, risk score {}/100, confidence {}",
        snapshot.result.classification,
        snapshot.result.probability * 100.0,
        snapshot.result.risk_score,
        snapshot.result.confidence
    );

    if let Some(detailed) = board.detailed() {
        println!("\nTop contributing features:");
        for contribution in analytics::rank_contributions(detailed.value.contributions.clone()) {
            println!("  {:<14} {:+.3}", contribution.feature, contribution.weight);
        }
        if !detailed.value.risk_factors.is_empty() {
            println!("Risk factors:");
            for factor in &detailed.value.risk_factors {
                println!("  - {factor}");
            }
        }
    }

    if let Some(tiers) = board.risk_profile() {
        let summary = analytics::summarize_risk_tiers(&tiers.value);
        println!(
            "\nRisk map ({} high / {} medium / {} low):",
            summary.high, summary.medium, summary.low
        );
        for tier in &tiers.value {
            println!(
                "  {:<14} {:>7.1}  {:<6} (normal: {})",
                tier.feature, tier.value, tier.band, tier.normal_range
            );
        }
    }

    if let Some(groups) = board.recommendations() {
        println!("\nRecommendations:");
        for group in &groups.value {
            println!("  [{}] {}", group.priority, group.category);
            for item in &group.items {
                println!("    - {item}");
            }
        }
    }

    for error in board.stage_errors() {
        println!("\n(view unavailable: {error})");
    }

    if let Some(scenario) = scenario {
        let direction = if scenario.is_improvement() {
            "improves"
        } else {
            "worsens"
        };
        println!(
            "\nWhat-if {} = {}: probability {:.1}% -> {:.1}% ({:+.1} pts, {})",
            scenario.feature,
            scenario.override_value,
            scenario.baseline.probability * 100.0,
            scenario.modified_probability * 100.0,
            scenario.probability_delta * 100.0,
            direction
        );
    }

    println!("\nHistory ({} total predictions):", history.total);
    if history.is_empty() {
        println!("  log is empty");
    } else {
        let counts = analytics::summarize_history(&history.entries);
        println!(
            "  {} diabetic / {} non-diabetic in the mirrored window",
            counts.diabetic, counts.non_diabetic
        );
        if let Ok(average) = analytics::average_risk_score(&history.entries) {
            println!("  average risk score: {average:.1}");
        }
        for point in analytics::build_trend_series(&history.entries) {
            println!(
                "  #{:<3} {}  {:>6.2}%",
                point.index,
                point.timestamp.format("%Y-%m-%d %H:%M"),
                point.probability_percent
            );
        }
    }

    if let Some(model) = model {
        println!(
            "\nModel: {} {} (trained {}), accuracy {:.1}%, F1 {:.2}",
            model.algorithm,
            model.version,
            model.training_date,
            model.metrics.accuracy * 100.0,
            model.metrics.f1_score
        );
    }
    if let Some(importance) = importance {
        println!("Global feature importance:");
        for contribution in importance {
            println!("  {:<14} {:.3}", contribution.feature, contribution.weight);
        }
    }
    if let Some(stats) = stats {
        println!(
            "Service usage: {} API calls, {} predictions",
            stats.total_api_calls, stats.total_predictions
        );
    }
}

fn build_json_report(
    snapshot: &SessionSnapshot,
    board: &InsightBoard,
    scenario: Option<&WhatIfScenario>,
    history: &HistoryMirror,
    model: &Option<ModelDescriptor>,
    importance: &Option<Vec<FeatureContribution>>,
    stats: &Option<UsageStats>,
) -> serde_json::Value {
    let ranked = board
        .detailed()
        .map(|d| analytics::rank_contributions(d.value.contributions.clone()));
    let tier_summary = board
        .risk_profile()
        .map(|t| analytics::summarize_risk_tiers(&t.value));

    serde_json::json!({
        "revision": snapshot.revision,
        "input": snapshot.input,
        "result": snapshot.result,
        "detailed": board.detailed().map(|d| &d.value),
        "ranked_contributions": ranked,
        "risk_map": board.risk_profile().map(|t| &t.value),
        "tier_summary": tier_summary.map(|s| serde_json::json!({
            "high": s.high, "medium": s.medium, "low": s.low,
        })),
        "recommendations": board.recommendations().map(|g| &g.value),
        "what_if": scenario.map(|s| serde_json::json!({
            "feature": s.feature.name(),
            "override_value": s.override_value,
            "baseline_probability": s.baseline.probability,
            "modified_probability": s.modified_probability,
            "probability_delta": s.probability_delta,
            "improves": s.is_improvement(),
        })),
        "history": {
            "total": history.total,
            "entries": &history.entries,
            "average_risk_score": analytics::average_risk_score(&history.entries).ok(),
        },
        "model": model,
        "feature_importance": importance,
        "usage": stats,
    })
}
