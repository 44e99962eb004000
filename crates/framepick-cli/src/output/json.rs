//! JSON output adapter.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use framepick_core::{BatchReport, RankedResult, ResultOutput, StoredImage};
use serde::Serialize;
use tracing::debug;

use crate::commands::rank::OutputFormat;

/// The whole batch as one document.
#[derive(Serialize)]
struct ReportDocument<'a> {
    count: usize,
    top: Vec<TopEntry<'a>>,
    all: &'a [RankedResult],
    saved: &'a [StoredImage],
    generated_at: String,
}

/// A selected result plus its locator once stored.
#[derive(Serialize)]
struct TopEntry<'a> {
    #[serde(flatten)]
    result: &'a RankedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

/// One JSON Lines record: a result plus where it placed.
#[derive(Serialize)]
struct ResultLine<'a> {
    #[serde(flatten)]
    result: &'a RankedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_as: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

fn saved_at(saved: &[StoredImage], rank: usize) -> Option<&StoredImage> {
    saved.iter().find(|s| s.rank == rank)
}

/// JSON and JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(format: OutputFormat, pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), format, pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
            pretty,
        }
    }

    fn render_document(&self, report: &BatchReport, saved: &[StoredImage]) -> Result<String> {
        let doc = ReportDocument {
            count: report.count,
            top: report
                .top
                .iter()
                .zip(1..)
                .map(|(result, rank)| TopEntry {
                    result,
                    url: saved_at(saved, rank).map(|s| s.url.as_str()),
                })
                .collect(),
            all: &report.all,
            saved,
            generated_at: iso_timestamp(),
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(json)
    }

    fn render_lines(report: &BatchReport, saved: &[StoredImage]) -> Result<String> {
        let mut out = String::new();
        for (position, result) in report.all.iter().enumerate() {
            let rank = report.rank_of(position);
            let stored = rank.and_then(|r| saved_at(saved, r));
            let line = ResultLine {
                result,
                rank,
                saved_as: stored.map(|s| s.saved_as.as_str()),
                url: stored.map(|s| s.url.as_str()),
            };
            out.push_str(&serde_json::to_string(&line)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl ResultOutput for JsonOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write_report(&self, report: &BatchReport, saved: &[StoredImage]) -> Result<()> {
        let text = match self.format {
            OutputFormat::Json => {
                let mut doc = self.render_document(report, saved)?;
                doc.push('\n');
                doc
            }
            OutputFormat::Jsonl => Self::render_lines(report, saved)?,
        };
        debug!("Writing {} bytes of output", text.len());

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
