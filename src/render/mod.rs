pub mod table;

use serde::Serialize;

use crate::api::CompanyResult;

pub use table::{render_results_list, render_table};

pub const PLACEHOLDER: &str = r#"<span style="color: #999;">N/A</span>"#;
pub const NOT_AVAILABLE_PLACEHOLDER: &str = r#"<span style="color: #999;">Not available</span>"#;

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResultStats {
    pub total: usize,
    pub with_phone: usize,
    pub with_website: usize,
    pub with_email: usize,
    pub with_social: usize,
}

impl ResultStats {
    /// `total` is what the server reported, which is shown as-is.
    pub fn compute(results: &[CompanyResult], total: usize) -> Self {
        let count = |pred: fn(&CompanyResult) -> bool| results.iter().filter(|r| pred(r)).count();
        Self {
            total,
            with_phone: count(CompanyResult::has_phone),
            with_website: count(CompanyResult::has_website),
            with_email: count(CompanyResult::has_email),
            with_social: count(CompanyResult::has_social_media),
        }
    }

    pub fn counters(&self) -> [(&'static str, &'static str, usize); 5] {
        [
            ("Total Companies", "#4CAF50", self.total),
            ("With Phone", "#2196F3", self.with_phone),
            ("With Website", "#FF9800", self.with_website),
            ("With Email", "#9C27B0", self.with_email),
            ("With Social Media", "#E91E63", self.with_social),
        ]
    }
}

pub fn render_stats(stats: &ResultStats) -> String {
    let mut out = String::from(
        r#"<div class="stats-grid" style="display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1rem;">"#,
    );
    out.push('\n');
    for (label, color, value) in stats.counters() {
        out.push_str(&format!(
            r#"    <div class="stat-item" style="text-align: center; padding: 1rem; background: #f8f9fa; border-radius: 10px;">
        <div class="stat-value" style="font-size: 2rem; font-weight: bold; color: {color};">{value}</div>
        <div class="stat-label" style="color: #666;">{label}</div>
    </div>
"#
        ));
    }
    out.push_str("</div>\n");
    out
}
