//! Task search: term scoring and weekday filtering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Weekday};
use chrono_tz::Tz;

use wv_domain::task::Task;

const CONTENT_MATCH: u32 = 10;
const WORD_BOUNDARY_BONUS: u32 = 5;
const CATEGORY_MATCH: u32 = 5;
const LABEL_MATCH: u32 = 3;

/// Terms shorter than this (in characters) are ignored.
pub const MIN_TERM_CHARS: usize = 2;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

fn usable(term: &str) -> bool {
    term.chars().count() >= MIN_TERM_CHARS
}

/// Lower-cased whitespace-separated words of `text`, minus too-short ones.
pub fn search_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| usable(w))
        .collect()
}

/// Relevance of one task for the given terms.
pub fn score_task<S: AsRef<str>>(task: &Task, terms: &[S]) -> u32 {
    let content = task.content.to_lowercase();
    let category = task.category.to_lowercase();
    let labels: Vec<String> = task.labels.iter().map(|l| l.to_lowercase()).collect();

    let mut score = 0;
    for term in terms {
        let term = term.as_ref().to_lowercase();
        if !usable(&term) {
            continue;
        }
        if content.contains(&term) {
            score += CONTENT_MATCH;
            if content == term
                || content.starts_with(&format!("{term} "))
                || content.ends_with(&format!(" {term}"))
            {
                score += WORD_BOUNDARY_BONUS;
            }
        }
        if category.contains(&term) {
            score += CATEGORY_MATCH;
        }
        score += LABEL_MATCH * labels.iter().filter(|l| l.contains(&term)).count() as u32;
    }
    score
}

/// Tasks with a positive score, best first, at most `limit`.
///
/// Equal scores keep their input order.
pub fn score<S: AsRef<str>>(tasks: &[Task], terms: &[S], limit: usize) -> Vec<Task> {
    let mut scored: Vec<(u32, &Task)> = tasks
        .iter()
        .map(|t| (score_task(t, terms), t))
        .filter(|(s, _)| *s > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, t)| t.clone()).collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Weekday filter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A weekday named in a lower-cased query, and the query with that name
/// removed (first occurrence only, then trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayQuery {
    pub weekday: Weekday,
    pub rest: String,
}

/// Find the first weekday name (Monday first) contained in `query_lower`.
pub fn extract_weekday(query_lower: &str) -> Option<DayQuery> {
    WEEKDAYS.iter().find_map(|(name, weekday)| {
        query_lower.contains(name).then(|| DayQuery {
            weekday: *weekday,
            rest: query_lower.replacen(name, "", 1).trim().to_string(),
        })
    })
}

/// Calendar day a task starts on.
///
/// Timestamps with an offset are converted to `tz`; naive date-times and
/// plain dates are taken as already local.
pub fn start_day(start_time: &str, tz: Tz) -> Option<NaiveDate> {
    let s = start_time.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Tasks whose `startTime` falls on `weekday`. Tasks without a parseable
/// start time never match.
pub fn filter_by_weekday(tasks: &[Task], weekday: Weekday, tz: Tz) -> Vec<Task> {
    use chrono::Datelike;

    tasks
        .iter()
        .filter(|t| {
            t.start_time
                .as_deref()
                .and_then(|s| start_day(s, tz))
                .is_some_and(|d| d.weekday() == weekday)
        })
        .cloned()
        .collect()
}
