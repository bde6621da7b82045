//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Persisted JSON carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use highwater_core::domain::{DailyEquitySnapshot, TradeRecord};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger, one row per fill.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "day_index",
        "id",
        "name",
        "action",
        "price",
        "shares",
        "amount",
        "commission",
        "stamp_tax",
        "transfer_fee",
        "total_fee",
        "cash_after",
        "reason",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.date.to_string(),
            &t.day_index.to_string(),
            &t.id,
            &t.name,
            &t.action.to_string(),
            &format!("{:.4}", t.price),
            &t.shares.to_string(),
            &format!("{:.2}", t.amount),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.stamp_tax),
            &format!("{:.2}", t.transfer_fee),
            &format!("{:.2}", t.total_fee),
            &format!("{:.2}", t.cash_after),
            &t.reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the daily equity curve.
pub fn export_equity_csv(equity: &[DailyEquitySnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "cash",
        "position_value",
        "total_assets",
        "open_positions",
    ])?;
    for s in equity {
        wtr.write_record([
            &s.date.to_string(),
            &format!("{:.2}", s.cash),
            &format!("{:.2}", s.position_value),
            &format!("{:.2}", s.total_assets),
            &s.open_positions.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run's artifacts.
pub fn artifact_dir_name(result: &BacktestResult) -> String {
    let short = result.run_id.get(..12).unwrap_or(&result.run_id);
    format!("run_{short}")
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `run_{id}/` under `output_dir` containing:
/// - `summary.json`: the full `BacktestResult`
/// - `trades.csv`: the trade ledger
/// - `equity.csv`: the daily equity curve
/// - `report.md`: a human-readable report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("summary.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let equity_csv = export_equity_csv(&result.equity)?;
    std::fs::write(run_dir.join("equity.csv"), &equity_csv)?;

    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    tracing::info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's summary.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let s = &result.summary;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run | {} |\n", result.run_id));
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        md.push_str(&format!("| Period | {start} to {end} |\n"));
    }
    md.push_str(&format!("| Instruments | {} |\n", result.instrument_count));
    md.push_str(&format!("| Simulated days | {} |\n", s.simulated_days));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial cash | {:.2} |\n", s.initial_cash));
    md.push_str(&format!("| Final cash | {:.2} |\n", s.final_cash));
    md.push_str(&format!(
        "| Total return | {:.2} ({:.2}%) |\n",
        s.total_return, s.return_pct
    ));
    md.push_str(&format!("| Max drawdown | {:.2}% |\n", s.max_drawdown_pct));
    md.push_str(&format!("| Sharpe | {:.3} |\n", s.sharpe));
    md.push_str(&format!(
        "| Trades | {} ({} won, {} lost, {:.1}%) |\n",
        s.completed_trades, s.wins, s.losses, s.win_rate_pct
    ));
    md.push_str(&format!("| Avg hold | {:.1} days |\n", s.avg_hold_days));
    md.push_str(&format!(
        "| Fees | {:.2} ({:.3}%) |\n",
        s.total_fees, s.fees_pct
    ));
    md.push('\n');

    if !result.closed_trades.is_empty() {
        md.push_str("## Trades\n\n");
        md.push_str("| Id | Bought | Sold | Days | Profit | Exit |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- |\n");
        for t in &result.closed_trades {
            md.push_str(&format!(
                "| {} | {} @ {:.2} | {} @ {:.2} | {} | {:.2} | {} |\n",
                t.id, t.buy_date, t.buy_price, t.sell_date, t.sell_price, t.hold_days, t.profit,
                t.exit_reason
            ));
        }
        md.push('\n');
    }

    if !result.skipped.is_empty() {
        md.push_str("## Skipped instruments\n\n");
        for (id, reason) in &result.skipped {
            md.push_str(&format!("- {id}: {reason}\n"));
        }
    }

    md
}
