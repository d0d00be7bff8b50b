//! Heuristic readers for the tool's tabular text output.
//!
//! The tool has no machine-readable mode and its column widths and header
//! labels change with locale and version. Every reader therefore anchors on the
//! package identifier (a token containing a dot and a letter) and indexes
//! relative to it instead of trusting column offsets.
//!
//! A display name that itself contains a dotted, lettered token ahead of the id
//! column (`"Foo v2.x Foo.Bar 1.0"`) is taken as the identifier. That misfire is
//! known and left as is.

use crate::domain::entities::{DEFAULT_SOURCE, KNOWN_SOURCES};

/// Header labels across the locales the tool ships, compared case-insensitively.
const HEADER_TOKENS: [&str; 5] = ["Name", "Nom", "Nombre", "Id", "Version"];

/// Only the source reader drops rows on these; a display name may well contain
/// "Source".
const SOURCE_HEADER_TOKENS: [&str; 3] = ["Source", "Quelle", "Origen"];

const AVAILABLE_HEADER_TOKENS: [&str; 3] = ["Available", "Disponible", "Verfügbar"];

const NOT_INSTALLED_MARKERS: [&str; 2] = ["No installed package", "No package found"];

const NO_UPDATE_MARKERS: [&str; 4] = [
    "No applicable update",
    "No available upgrade",
    "No installed package",
    "No package found",
];

/// Status fields recovered from a `list` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingStatus {
    pub installed_version: Option<String>,
    pub source: String,
}

pub fn parse_listing(text: &str) -> ListingStatus {
    let version = parse_installed_version(text);
    ListingStatus {
        installed_version: (!version.is_empty()).then_some(version),
        source: parse_source(text),
    }
}

/// Version in the column right of the identifier, or `""`.
pub fn parse_installed_version(text: &str) -> String {
    for parts in data_rows(text, &[]) {
        for i in 0..parts.len().saturating_sub(1) {
            if !looks_like_identifier(parts[i]) {
                continue;
            }
            let version = parts[i + 1];
            if !eq_any(version, &["Version"]) && !is_source_name(version) {
                return version.to_string();
            }
        }
    }
    String::new()
}

/// Lower-cased source two columns right of the identifier, or the default channel.
pub fn parse_source(text: &str) -> String {
    for parts in data_rows(text, &SOURCE_HEADER_TOKENS) {
        for i in 0..parts.len().saturating_sub(2) {
            if !looks_like_identifier(parts[i]) {
                continue;
            }
            let source = parts[i + 2];
            if is_source_name(source) {
                return source.to_lowercase();
            }
        }
    }
    DEFAULT_SOURCE.to_string()
}

/// Available version from upgrade output (`id installed available source`), or `""`.
pub fn parse_available_version(text: &str) -> String {
    for parts in data_rows(text, &AVAILABLE_HEADER_TOKENS) {
        for i in 0..parts.len().saturating_sub(2) {
            if !looks_like_qualified_identifier(parts[i]) {
                continue;
            }
            let version = parts[i + 2];
            if !eq_any(version, &AVAILABLE_HEADER_TOKENS) && !is_source_name(version) {
                return version.to_string();
            }
        }
    }
    String::new()
}

/// Fields of interest from `show` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowDetails {
    pub name: String,
    pub version: String,
    pub publisher: String,
    pub description: String,
}

/// Reads the `Found <name> [<id>]` banner and the `Key: value` block under it.
/// Returns `None` when no banner is present.
pub fn parse_show(text: &str) -> Option<ShowDetails> {
    let mut lines = text.lines().filter_map(visible_segment);
    let banner = lines.find(|line| line.starts_with("Found "))?;
    let name = banner
        .trim_start_matches("Found ")
        .rsplit_once(" [")
        .map(|(name, _)| name)
        .unwrap_or(banner)
        .trim()
        .to_string();

    let mut details = ShowDetails {
        name,
        ..ShowDetails::default()
    };
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Version" => details.version = value,
            "Publisher" => details.publisher = value,
            "Description" => details.description = value,
            _ => {}
        }
    }
    Some(details)
}

/// Blank output or an explicit "nothing installed" message.
pub fn is_not_installed(text: &str) -> bool {
    text.trim().is_empty() || NOT_INSTALLED_MARKERS.iter().any(|m| text.contains(m))
}

pub fn has_no_update(text: &str) -> bool {
    NO_UPDATE_MARKERS.iter().any(|m| text.contains(m))
}

/// Whitespace-split rows with headers, separators and garbled lines removed.
fn data_rows<'a>(text: &'a str, extra_headers: &[&str]) -> Vec<Vec<&'a str>> {
    text.lines()
        .filter_map(visible_segment)
        .filter(|line| !line.starts_with('-'))
        .filter(|line| !line.contains('?') && !line.contains('\u{FFFD}'))
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|parts| {
            !parts
                .iter()
                .any(|p| eq_any(p, &HEADER_TOKENS) || eq_any(p, extra_headers))
        })
        .collect()
}

/// The tool redraws its spinner with carriage returns; only the text after the
/// last one is what a terminal would show.
fn visible_segment(line: &str) -> Option<&str> {
    let visible = line.rsplit('\r').next().unwrap_or(line).trim();
    (!visible.is_empty()).then_some(visible)
}

fn looks_like_identifier(token: &str) -> bool {
    token.contains('.') && token.chars().any(char::is_alphabetic)
}

/// Stricter anchor for upgrade output, where an extra version column makes a
/// lettered version string (`1.2.beta`) easy to mistake for an id.
fn looks_like_qualified_identifier(token: &str) -> bool {
    let mut segments = token.split('.');
    match (segments.next(), segments.next()) {
        (Some(vendor), Some(product)) => {
            vendor.chars().any(char::is_alphabetic) && product.chars().any(char::is_alphabetic)
        }
        _ => false,
    }
}

fn is_source_name(token: &str) -> bool {
    eq_any(token, &KNOWN_SOURCES)
}

fn eq_any(token: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| token.eq_ignore_ascii_case(c))
}
