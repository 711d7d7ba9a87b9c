pub mod report;

use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::api::{is_available, CompanyResult};
use crate::render::ResultStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One finished search as it is written to a report file.
#[derive(Clone, Debug, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub generated_at: String,
    pub stats: ResultStats,
    pub results: Vec<CompanyResult>,
}

impl SearchReport {
    pub fn new(query: &str, stats: ResultStats, results: Vec<CompanyResult>) -> Self {
        Self {
            query: query.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            stats,
            results,
        }
    }
}

fn text_field(value: Option<&str>) -> &str {
    match value {
        Some(v) if is_available(Some(v)) => v,
        _ => "-",
    }
}

pub fn render_text(report: &SearchReport) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("query: {}\n", report.query));
    out.push_str(&format!("generated: {}\n", report.generated_at));
    for (label, _, value) in report.stats.counters() {
        out.push_str(&format!("{label}: {value}\n"));
    }
    out.push('\n');
    for r in &report.results {
        let phones = if r.phones.is_empty() {
            text_field(r.phone.as_deref()).to_string()
        } else {
            r.phones.iter().join(", ")
        };
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            text_field(r.name.as_deref()),
            text_field(r.address.as_deref()),
            phones,
            text_field(r.website.as_deref()),
        ));
    }
    out.into_bytes()
}

pub fn render_json(report: &SearchReport) -> Vec<u8> {
    serde_json::to_vec_pretty(report).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(report: &SearchReport) -> Vec<u8> {
    report::render_html(report)
}

pub fn render(report: &SearchReport, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
        OutputFormat::Html => render_html(report),
    }
}

/// Writes the report next to `path`, in the format its extension names
/// (HTML when the extension is unknown).
pub fn write_report(path: &Path, report: &SearchReport) -> Result<OutputFormat, String> {
    let format = infer_format_from_path(&path.to_string_lossy()).unwrap_or(OutputFormat::Html);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!("failed to create report directory '{}': {e}", parent.display())
        })?;
    }
    std::fs::write(path, render(report, format))
        .map_err(|e| format!("failed to write report '{}': {e}", path.display()))?;
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SearchReport {
        let results = vec![
            CompanyResult {
                name: Some("Padaria Central".into()),
                phone: Some("(11) 3333-4444".into()),
                website: Some("N/A".into()),
                ..Default::default()
            },
            CompanyResult {
                name: Some("Café Norte".into()),
                phones: vec!["1111".into(), "2222".into()],
                ..Default::default()
            },
        ];
        let stats = ResultStats::compute(&results, 2);
        SearchReport::new("padarias", stats, results)
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(infer_format_from_path("out.JSON"), Some(OutputFormat::Json));
        assert_eq!(infer_format_from_path("r.htm"), Some(OutputFormat::Html));
        assert_eq!(infer_format_from_path("r.txt"), Some(OutputFormat::Text));
        assert_eq!(infer_format_from_path("r.csv"), None);
    }

    #[test]
    fn text_report_lists_counters_and_rows() {
        let text = String::from_utf8(render_text(&sample())).unwrap();
        assert!(text.contains("Total Companies: 2"));
        assert!(text.contains("With Phone: 1"));
        assert!(text.contains("Padaria Central\t-\t(11) 3333-4444\t-"));
        assert!(text.contains("Café Norte\t-\t1111, 2222\t-"));
    }

    #[test]
    fn json_report_keeps_results() {
        let value: serde_json::Value = serde_json::from_slice(&render_json(&sample())).unwrap();
        assert_eq!(value["query"], "padarias");
        assert_eq!(value["stats"]["total"], 2);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("latest.json");
        assert_eq!(write_report(&path, &sample()).unwrap(), OutputFormat::Json);
        assert!(path.exists());
    }
}
