//! Text and JSON rendering of scan runs, history and candle reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

use screener_core::types::{AnnotatedCandle, HistoryEntry, ScanParams, ScanResult, ScanRun};
use screener_engine::{CandleReport, CandleSource};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════════════════\n";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────────────────\n";

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

/// Pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

fn header(s: &mut String, title: &str) {
    s.push_str(HEAVY_RULE);
    let _ = writeln!(s, "{:^75}", title);
    s.push_str(HEAVY_RULE);
}

fn params_line(params: &ScanParams) -> String {
    format!(
        "{} {} | {}({}) | {} | breakout on {} | live: {}",
        params.preset,
        params.timeframe,
        params.indicator,
        params.window,
        params.side,
        params.breakout_mode,
        if params.confirm_with_live { "yes" } else { "no" },
    )
}

fn price(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn result_row(r: &ScanResult) -> String {
    let (pattern, reference) = match r.hit {
        Some(hit) => (
            format!("{}/{}/{}", hit.touch_index, hit.side_index, hit.breakout_index),
            format!("{:.2}", hit.reference_high),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let live = match r.live_breakout {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    let status = if r.matched {
        "MATCH".to_string()
    } else if let Some(err) = &r.error {
        match &err.code {
            Some(code) => format!("{} ({})", err.kind, code),
            None => err.kind.to_string(),
        }
    } else {
        "no match".to_string()
    };

    format!(
        "  {:<18} {:<5} {:<10} {:>10} {:>10} {:>5}  {}\n",
        r.instrument.symbol,
        r.instrument.exchange.as_str(),
        pattern,
        reference,
        price(r.live_quote),
        live,
        status,
    )
}

fn results_table(s: &mut String, results: &[ScanResult]) {
    let _ = writeln!(
        s,
        "  {:<18} {:<5} {:<10} {:>10} {:>10} {:>5}  {}",
        "SYMBOL", "EXCH", "T/S/B", "REF HIGH", "LIVE", "LIVE>", "STATUS"
    );
    s.push_str(LIGHT_RULE);
    for r in results {
        s.push_str(&result_row(r));
    }
}

/// Summary of one scan pass.
pub fn scan_summary(run: &ScanRun) -> String {
    let mut s = String::new();
    header(&mut s, "SCAN RESULTS");
    let _ = writeln!(s, "  Started:   {}", format_time(run.started_at));
    let _ = writeln!(s, "  Params:    {}", params_line(&run.params));
    let _ = writeln!(
        s,
        "  Matched:   {} of {}\n",
        run.match_count(),
        run.results.len()
    );

    results_table(&mut s, &run.results);

    let failures: Vec<_> = run
        .results
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| (&r.instrument, e)))
        .collect();
    if !failures.is_empty() {
        s.push_str("\nERRORS\n");
        s.push_str(LIGHT_RULE);
        for (instrument, err) in failures {
            let _ = writeln!(s, "  {}: {}", instrument, err.message);
        }
    }

    s.push_str(HEAVY_RULE);
    s
}

/// One line per stored run, in the given order.
pub fn history_table(entries: &[HistoryEntry]) -> String {
    let mut s = String::new();
    header(&mut s, "SCAN HISTORY");

    if entries.is_empty() {
        s.push_str("  No runs recorded\n");
        s.push_str(HEAVY_RULE);
        return s;
    }

    let _ = writeln!(s, "  {:<15} {:<20} {:>7}  {}", "ID", "TIME", "MATCHED", "PARAMS");
    s.push_str(LIGHT_RULE);
    for entry in entries {
        let _ = writeln!(
            s,
            "  {:<15} {:<20} {:>7}  {}",
            entry.id,
            format_time(entry.timestamp),
            entry.results.len(),
            params_line(&entry.params)
        );
    }
    s.push_str(HEAVY_RULE);
    s
}

/// Full view of one stored run.
pub fn history_detail(entry: &HistoryEntry) -> String {
    let mut s = String::new();
    header(&mut s, &format!("RUN {}", entry.id));
    let _ = writeln!(s, "  Time:      {}", format_time(entry.timestamp));
    let _ = writeln!(s, "  Params:    {}\n", params_line(&entry.params));

    results_table(&mut s, &entry.results);

    for r in &entry.results {
        if let Some(last) = &r.last_candle {
            let _ = writeln!(
                s,
                "\n  {} last candle ({} stored)",
                r.instrument.symbol,
                r.candles.len()
            );
            s.push_str(&candle_row(last));
        }
    }

    s.push_str(HEAVY_RULE);
    s
}

fn candle_row(c: &AnnotatedCandle) -> String {
    format!(
        "  {:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10} {:>10}\n",
        format_time(c.candle.datetime()),
        c.candle.open,
        c.candle.high,
        c.candle.low,
        c.candle.close,
        c.candle.volume,
        price(c.indicator),
    )
}

/// Annotated candles of a single-symbol computation, the most recent `limit`.
pub fn candles_table(report: &CandleReport, limit: usize) -> String {
    let mut s = String::new();
    header(&mut s, &format!("{} {}", report.instrument, report.params.indicator));

    let source = match report.source {
        CandleSource::Provider => "provider",
        CandleSource::Fallback => "fallback (generated)",
    };
    let _ = writeln!(s, "  Source:    {}", source);
    if let Some(err) = &report.error {
        let _ = writeln!(s, "  Error:     {} ({})", err.message, err.kind);
    }
    let _ = writeln!(
        s,
        "  Range:     {} {} | window {} | {} candles\n",
        report.params.preset,
        report.params.timeframe,
        report.params.window,
        report.candles.len()
    );

    let _ = writeln!(
        s,
        "  {:<20} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "TIME", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME", report.params.indicator.to_string()
    );
    s.push_str(LIGHT_RULE);
    let skip = report.candles.len().saturating_sub(limit);
    for c in &report.candles[skip..] {
        s.push_str(&candle_row(c));
    }

    s.push_str(HEAVY_RULE);
    s
}

fn format_time(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&screener_core::types::market_offset())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
