use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

use super::{escape_html, NOT_AVAILABLE_PLACEHOLDER, PLACEHOLDER};
use crate::api::{is_available, CompanyResult, Rating};

const MAX_EMAILS: usize = 2;
const MAX_PHONES: usize = 2;
const STAR_COUNT: i64 = 5;

const EMPTY_RESULTS: &str = r#"<div class="empty-results">
    <i class="fas fa-search"></i>
    <h3>No results found</h3>
    <p>Try adjusting your search terms.</p>
</div>
"#;

const TABLE_HEAD: &str = r#"<table class="results-table">
    <thead>
        <tr>
            <th class="col-name">Company</th>
            <th class="col-address">Address</th>
            <th class="col-contact">Contact</th>
            <th class="col-website">Website</th>
            <th class="col-rating">Rating</th>
            <th class="col-actions">Actions</th>
        </tr>
    </thead>
    <tbody>
"#;

const TABLE_TAIL: &str = "    </tbody>\n</table>\n";

/// The "no results" placeholder for an empty set, the table otherwise.
pub fn render_results_list(results: &[CompanyResult]) -> String {
    if results.is_empty() {
        return EMPTY_RESULTS.to_string();
    }
    render_table(results)
}

pub fn render_table(results: &[CompanyResult]) -> String {
    let mut out = String::from(TABLE_HEAD);
    for result in results {
        out.push_str(&render_row(result));
    }
    out.push_str(TABLE_TAIL);
    out
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    if is_available(value) {
        escape_html(value.unwrap_or_default())
    } else {
        fallback.to_string()
    }
}

fn link_or_placeholder(url: Option<&str>, class: &str, label: &str) -> String {
    match url {
        Some(url) if is_available(Some(url)) => format!(
            r#"<a href="{}" target="_blank" class="btn-small {class}">{label}</a>"#,
            escape_html(url)
        ),
        _ => PLACEHOLDER.to_string(),
    }
}

fn render_row(result: &CompanyResult) -> String {
    format!(
        r#"        <tr class="result-row">
            <td class="col-name" data-label="Company">
                <strong>{name}</strong>
            </td>
            <td class="col-address" data-label="Address">
                {address}
            </td>
            <td class="col-contact" data-label="Contact">
                <div class="contact-info">{contact}</div>
            </td>
            <td class="col-website" data-label="Website">
                {website}
            </td>
            <td class="col-rating" data-label="Rating">
                {rating}
            </td>
            <td class="col-actions" data-label="Actions">
                {maps}
            </td>
        </tr>
"#,
        name = text_or(result.name.as_deref(), "Name not available"),
        address = text_or(result.address.as_deref(), "Address not available"),
        contact = render_contact(result),
        website = link_or_placeholder(result.website.as_deref(), "btn-website", "Visit"),
        rating = render_rating(result.rating.as_ref()),
        maps = link_or_placeholder(result.google_maps_url.as_deref(), "btn-maps", "Maps"),
    )
}

/// Phones from the scraped list, or the legacy single `phone` field.
fn contact_phones(result: &CompanyResult) -> Option<String> {
    if !result.phones.is_empty() {
        return Some(result.phones.iter().take(MAX_PHONES).join(", "));
    }
    result
        .phone
        .as_deref()
        .filter(|p| is_available(Some(*p)))
        .map(str::to_string)
}

pub fn render_contact(result: &CompanyResult) -> String {
    let mut out = String::new();

    if let Some(phones) = contact_phones(result).filter(|p| is_available(Some(p.as_str()))) {
        out.push_str(&format!(
            r#"<div class="contact-item"><i class="fas fa-phone"></i> {}</div>"#,
            escape_html(&phones)
        ));
    }

    if !result.emails.is_empty() {
        let emails = result.emails.iter().take(MAX_EMAILS).join(", ");
        out.push_str(&format!(
            r#"<div class="contact-item"><i class="fas fa-envelope"></i> {}</div>"#,
            escape_html(&emails)
        ));
    }

    if !result.social_media.is_empty() {
        // The backend stores fragments such as "instagram.com/acme".
        let links: String = result
            .social_media
            .iter()
            .map(|(platform, fragment)| {
                let platform = escape_html(platform);
                format!(
                    r#"<a href="https://{}" target="_blank" title="{platform}" class="fa fa-{platform}"></a>"#,
                    escape_html(fragment)
                )
            })
            .collect();
        out.push_str(&format!(
            r#"<div class="contact-item"><i class="fas fa-share-alt"></i> <div class="social-links">{links}</div></div>"#
        ));
    }

    if out.is_empty() {
        return NOT_AVAILABLE_PLACEHOLDER.to_string();
    }
    out
}

fn float_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap())
}

/// Leading decimal number of `value`, ignoring leading whitespace and any
/// trailing text ("4.5 stars" -> 4.5, "4,7" -> 4).
pub fn parse_float_prefix(value: &str) -> Option<f64> {
    let m = float_prefix().find(value.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rounds halves up, toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn rating_value(rating: &Rating) -> Option<f64> {
    match rating {
        Rating::Number(n) if n.is_finite() => Some(*n),
        Rating::Number(_) => None,
        Rating::Text(s) => parse_float_prefix(s),
    }
}

pub fn render_rating(rating: Option<&Rating>) -> String {
    let Some(rating) = rating.filter(|r| r.is_present()) else {
        return PLACEHOLDER.to_string();
    };
    let Some(value) = rating_value(rating) else {
        return escape_html(&rating.as_text());
    };

    let filled = round_half_up(value);
    let stars: String = (0..STAR_COUNT)
        .map(|i| {
            let color = if i < filled { "#FFD700" } else { "#ddd" };
            format!(r#"<i class="fas fa-star" style="color: {color}"></i>"#)
        })
        .collect();
    format!(r#"<div class="rating">{stars}<span>{value}</span></div>"#)
}
