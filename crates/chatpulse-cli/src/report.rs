//! Report writer: JSON export of the chat log plus a markdown summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chatpulse_sentiment::{Aggregate, Record, SealedLog, Sentiment};
use chrono::{DateTime, Local};

const DATA_FILE: &str = "chat_data.json";
const SUMMARY_FILE: &str = "report.md";
/// Width, in characters, of a 100 % bar in the distribution chart.
const BAR_WIDTH: usize = 40;

pub(crate) struct ReportPaths {
    pub data: PathBuf,
    pub summary: PathBuf,
}

/// Write `chat_data.json` and `report.md` into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written.
pub(crate) fn write_report(
    dir: &Path,
    log: &SealedLog,
    aggregate: &Aggregate,
    generated_at: DateTime<Local>,
) -> anyhow::Result<ReportPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;

    let data = dir.join(DATA_FILE);
    let json = serde_json::to_string_pretty(log.records())?;
    std::fs::write(&data, json)
        .with_context(|| format!("failed to write {}", data.display()))?;

    let summary = dir.join(SUMMARY_FILE);
    std::fs::write(&summary, render_markdown(log.records(), aggregate, generated_at))
        .with_context(|| format!("failed to write {}", summary.display()))?;

    Ok(ReportPaths { data, summary })
}

/// Render the markdown report: distribution table, bar chart, then one
/// row per record.
pub(crate) fn render_markdown(
    records: &[Record],
    aggregate: &Aggregate,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Live Chat Sentiment Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Generated**: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "**Responses**: {}", aggregate.total());
    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Sentiment Distribution");
    let _ = writeln!(out);

    if aggregate.is_empty() {
        let _ = writeln!(
            out,
            "_No responses were collected during the collection window._"
        );
        return out;
    }

    let present: Vec<(Sentiment, usize, f64)> = Sentiment::ALL
        .iter()
        .filter_map(|s| {
            let count = aggregate.count(*s);
            let share = aggregate.proportion(*s)?;
            (count > 0).then_some((*s, count, share))
        })
        .collect();

    let _ = writeln!(out, "| Sentiment | Count | Share |");
    let _ = writeln!(out, "|-----------|-------|-------|");
    for (sentiment, count, share) in &present {
        let _ = writeln!(out, "| {sentiment} | {count} | {} |", percent(*share));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "```text");
    for (sentiment, _, share) in &present {
        let _ = writeln!(
            out,
            "{:<9} {:<width$} {}",
            sentiment.as_str(),
            bar(*share),
            percent(*share),
            width = BAR_WIDTH
        );
    }
    let _ = writeln!(out, "```");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Chat Data");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Time | Content | Sentiment |");
    let _ = writeln!(out, "|------|---------|-----------|");
    for record in records {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            record.timestamp(),
            escape_cell(record.content()),
            record.sentiment()
        );
    }

    out
}

fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

fn bar(share: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (share * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
