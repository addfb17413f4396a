//! Report metadata carried in the artifact's filename.
//!
//! Filenames come from different authors, so the date token is matched
//! regardless of separator and the rightmost candidate wins.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ExtractionError;
use crate::model::Site;

static REPORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^.*service level report.*xlsx?$").expect("valid report name pattern")
});

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})([./-]?)(\d{1,2})([./-]?)(\d{2,})").expect("valid date token pattern")
});

/// Site markers in priority order. `hw` must stay behind `heathwood`.
const SITE_MARKERS: [(&str, Site); 4] = [
    ("trug", Site::Truganina),
    ("heathwood", Site::Heathwood),
    ("hw", Site::Heathwood),
    ("bun", Site::Bunbury),
];

pub fn validate_name(name: &str) -> bool {
    REPORT_NAME.is_match(name)
}

pub fn extract_date(name: &str) -> Result<NaiveDate, ExtractionError> {
    let token = DATE_TOKEN
        .captures_iter(name)
        .filter(|caps| caps[2] == caps[4])
        .last()
        .ok_or_else(|| ExtractionError::MalformedDate {
            filename: name.to_string(),
            reason: "no day-month-year token found".to_string(),
        })?;

    let digits: String = token[0].chars().filter(char::is_ascii_digit).collect();
    parse_day_month_year(&digits).ok_or_else(|| ExtractionError::MalformedDate {
        filename: name.to_string(),
        reason: format!("'{}' is not a valid day-month-year date", &token[0]),
    })
}

pub fn infer_site(name: &str) -> Site {
    let lower = name.to_lowercase();
    SITE_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, site)| *site)
        .unwrap_or(Site::Other)
}

// The first split whose day and month are in range wins, two digits before
// one. A split that is in range but not a real date (31 February) is an
// error, never a reason to try the next split.
fn parse_day_month_year(digits: &str) -> Option<NaiveDate> {
    let (day, month, year) = [(2, 2), (2, 1), (1, 2), (1, 1)]
        .into_iter()
        .filter(|(day_len, month_len)| digits.len() == day_len + month_len + 4)
        .find_map(|(day_len, month_len)| {
            let day: u32 = digits[..day_len].parse().ok()?;
            let month: u32 = digits[day_len..day_len + month_len].parse().ok()?;
            let year: i32 = digits[day_len + month_len..].parse().ok()?;
            ((1..=31).contains(&day) && (1..=12).contains(&month)).then_some((day, month, year))
        })?;
    NaiveDate::from_ymd_opt(year, month, day)
}
