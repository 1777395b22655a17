//! Values derived from a challenge row for display: countdown, prize split,
//! timeline, requirement bullets and category tags.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use time::{format_description::FormatItem, macros::format_description, Duration, OffsetDateTime};

use super::repo_types::SkillLevel;

const DAY_MILLIS: i128 = 24 * 60 * 60 * 1000;
const DEFAULT_PRIZE_POOL: u64 = 2000;

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prize {
    pub place: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub date: String,
    pub event: String,
}

/// Whole days until the deadline, rounded up and never negative.
pub fn days_left(deadline: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<i64> {
    let remaining = (deadline? - now).whole_milliseconds();
    if remaining <= 0 {
        return Some(0);
    }
    Some(((remaining + DAY_MILLIS - 1) / DAY_MILLIS) as i64)
}

fn prize(place: &str, amount: impl Into<String>) -> Prize {
    Prize {
        place: place.to_owned(),
        amount: amount.into(),
    }
}

/// Splits the free-text reward into three places.
///
/// A reward mentioning `$` is reduced to its digits and split 60/30/10; other
/// text goes to first place whole. Missing or empty text gets the stock prizes.
pub fn reward_breakdown(reward: Option<&str>) -> Vec<Prize> {
    let Some(reward) = reward.filter(|r| !r.is_empty()) else {
        return vec![
            prize("1st Place", "$1,000"),
            prize("2nd Place", "$500"),
            prize("3rd Place", "$250"),
        ];
    };

    if reward.contains('$') {
        let digits: String = reward.chars().filter(char::is_ascii_digit).collect();
        let total = digits
            .parse::<u64>()
            .ok()
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_PRIZE_POOL) as f64;
        let share = |pct: f64| format!("${}", (total * pct).round() as u64);
        return vec![
            prize("1st Place", share(0.6)),
            prize("2nd Place", share(0.3)),
            prize("3rd Place", share(0.1)),
        ];
    }

    vec![
        prize("1st Place", reward),
        prize("2nd Place", "Recognition"),
        prize("3rd Place", "Recognition"),
    ]
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.date().to_string())
}

/// Key dates around the deadline; without one, the deadline is assumed 30 days out.
pub fn timeline(deadline: Option<OffsetDateTime>, now: OffsetDateTime) -> Vec<Milestone> {
    let deadline = deadline.unwrap_or(now + Duration::days(30));
    [
        (deadline - Duration::days(45), "Challenge Launch"),
        (deadline - Duration::days(30), "Q&A Session with Sponsor"),
        (deadline, "Submission Deadline"),
        (deadline + Duration::days(10), "Winners Announced"),
    ]
    .into_iter()
    .map(|(date, event)| Milestone {
        date: format_date(date),
        event: event.to_owned(),
    })
    .collect()
}

const DEFAULT_REQUIREMENTS: [&str; 5] = [
    "Create an intuitive UI for the application",
    "Implement required features as described",
    "Include documentation on your approach",
    "Support common formats and standards",
    "Provide test cases for your solution",
];

const FALLBACK_REQUIREMENTS: [&str; 5] = [
    "Implement all features described in overview",
    "Create clean, maintainable code with documentation",
    "Include tests for critical functionality",
    "Follow industry best practices",
    "Submit complete solution before deadline",
];

/// First five sentences of the description, or a stock list when it is too thin.
pub fn requirements(description: Option<&str>) -> Vec<String> {
    lazy_static! {
        static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").expect("sentence regex compiles");
    }

    let description = match description {
        Some(d) if d.chars().count() >= 20 => d,
        _ => return DEFAULT_REQUIREMENTS.iter().map(|s| s.to_string()).collect(),
    };

    let sentences: Vec<&str> = SENTENCE_END.split(description).collect();
    if sentences.len() >= 5 {
        return sentences
            .iter()
            .take(5)
            .map(|s| format!("{}.", s.trim()))
            .collect();
    }

    FALLBACK_REQUIREMENTS.iter().map(|s| s.to_string()).collect()
}

pub fn categories(industry: Option<&str>) -> Vec<String> {
    let Some(industry) = industry.filter(|i| !i.is_empty()) else {
        return vec!["Tech".to_owned()];
    };
    let mapped: &[&str] = match industry {
        "AI" => &["Machine Learning", "Computer Vision", "NLP"],
        "Data Science" => &["Analytics", "Big Data", "Visualization"],
        "Web Development" => &["Frontend", "Backend", "Full Stack"],
        "Mobile" => &["iOS", "Android", "Cross-Platform"],
        "Gaming" => &["Game Design", "Unity", "3D"],
        other => return vec![other.to_owned()],
    };
    mapped.iter().map(|s| s.to_string()).collect()
}

pub fn skill_level_label(level: Option<SkillLevel>) -> String {
    let Some(level) = level else {
        return "Any Level".to_owned();
    };
    let raw = level.as_str();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
