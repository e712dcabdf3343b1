use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

// Separated forms accept -, _ and . between the groups.
static YMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(20|19|18)\d{2})[-_.](?P<m>\d{2})[-_.](?P<d>\d{2})").unwrap()
});
static YMD_COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<y>(20|19|18)\d{2})(?P<m>\d{2})(?P<d>\d{2})").unwrap());
static YM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<y>(20|19|18)\d{2})[-_.](?P<m>\d{2})").unwrap());
static YM_COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<y>(20|19|18)\d{2})(?P<m>\d{2})").unwrap());
// Bare year; covers "Photos from 2019" as well as a plain "2019" component.
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?P<y>(20|19|18)\d{2})").unwrap());

/// Infer a capture date from the folder names enclosing `path`, walking from
/// the file's parent upward. The deepest matching component wins; within a
/// component, more specific patterns beat more general ones.
pub fn infer_from_folders(path: &Path) -> Option<NaiveDateTime> {
    let mut dir = path.parent();
    while let Some(d) = dir {
        if let Some(name) = d.file_name().and_then(|n| n.to_str()) {
            if let Some(date) = date_from_component(name) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
        dir = d.parent();
    }
    None
}

/// Try to read a date from one path component. A component whose date-shaped
/// match fails calendar validation (month 13, day 45) yields nothing at all
/// rather than degrading to a coarser pattern.
fn date_from_component(name: &str) -> Option<NaiveDate> {
    if let Some((y, m, d)) = capture_ymd(&YMD_RE, name, false) {
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some((y, m, d)) = capture_ymd(&YMD_COMPACT_RE, name, true) {
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some((y, m)) = capture_ym(&YM_RE, name, false) {
        return NaiveDate::from_ymd_opt(y, m, 1);
    }
    if let Some((y, m)) = capture_ym(&YM_COMPACT_RE, name, true) {
        return NaiveDate::from_ymd_opt(y, m, 1);
    }
    for caps in YEAR_RE.captures_iter(name) {
        let whole = caps.get(0).unwrap();
        if digit_bounded(name, whole.start(), whole.end()) {
            let y: i32 = caps["y"].parse().ok()?;
            return NaiveDate::from_ymd_opt(y, 1, 1);
        }
    }
    None
}

fn capture_ymd(re: &Regex, name: &str, compact: bool) -> Option<(i32, u32, u32)> {
    for caps in re.captures_iter(name) {
        let whole = caps.get(0).unwrap();
        if compact && !digit_bounded(name, whole.start(), whole.end()) {
            continue;
        }
        let y = caps["y"].parse().ok()?;
        let m = caps["m"].parse().ok()?;
        let d = caps["d"].parse().ok()?;
        return Some((y, m, d));
    }
    None
}

fn capture_ym(re: &Regex, name: &str, compact: bool) -> Option<(i32, u32)> {
    for caps in re.captures_iter(name) {
        let whole = caps.get(0).unwrap();
        if compact && !digit_bounded(name, whole.start(), whole.end()) {
            continue;
        }
        let y = caps["y"].parse().ok()?;
        let m = caps["m"].parse().ok()?;
        return Some((y, m));
    }
    None
}

/// The regex crate has no lookaround, so compact all-digit matches check
/// their neighbours by hand to avoid matching inside longer digit runs.
fn digit_bounded(s: &str, start: usize, end: usize) -> bool {
    let before = s[..start].chars().next_back();
    let after = s[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
}
