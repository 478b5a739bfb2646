use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use anyhow::{anyhow, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strict `YYYY-MM-DD` parsing, as stored in documents.
pub fn parse_record_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves the date expressions accepted on the command line, relative to `today`.
///
/// Records describe things that already happened, so relative forms look
/// backwards by default: `fri` is the most recent Friday (today included) and
/// `2:fri` the one before it.
pub fn parse_human_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date string"));
    }

    // 1. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "yesterday" | "yest" => return Ok(today - Duration::days(1)),
        "tomorrow" | "tom" => return Ok(today + Duration::days(1)),
        "som" => return Ok(first_of_month(today)),
        "eom" => return Ok(last_of_month(today)),
        _ => {}
    }

    // 2. Relative format (+Nd, -Nd, -Nw)
    if let Some((sign, body)) = input
        .strip_prefix('-')
        .map(|body| (-1, body))
        .or_else(|| input.strip_prefix('+').map(|body| (1, body)))
    {
        let invalid = || anyhow!("Invalid relative format: {}", input);
        let unit = body.chars().last().ok_or_else(invalid)?;
        let num_str = &body[..body.len() - unit.len_utf8()];
        let count: i64 = num_str.parse().map_err(|_| invalid())?;
        let days = match unit {
            'd' => Some(count),
            'w' => count.checked_mul(7),
            _ => return Err(anyhow!("Unknown unit in relative date: {}", unit)),
        };
        return days
            .and_then(|days| days.checked_mul(sign))
            .and_then(|days| offset_days(today, days))
            .ok_or_else(|| anyhow!("Relative date out of range: {}", input));
    }

    // 3. Plain date
    if let Some(date) = parse_record_date(input) {
        return Ok(date);
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target) = parse_weekday_str(day_str) {
            if count < 1 {
                return Err(anyhow!("Weekday count must be at least 1: {}", input));
            }
            let mut days_back = today.weekday().num_days_from_sunday() as i64
                - target.num_days_from_sunday() as i64;
            if days_back < 0 {
                days_back += 7;
            }
            return (count - 1)
                .checked_mul(7)
                .and_then(|weeks| weeks.checked_add(days_back))
                .and_then(|days| offset_days(today, -days))
                .ok_or_else(|| anyhow!("Weekday count out of range: {}", input));
        }
    }

    Err(anyhow!("Could not parse date: {}", input))
}

/// `date` moved by `days`, or `None` when that leaves chrono's date range.
fn offset_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = shift_month(date.year(), date.month(), 1);
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(date)
}

/// Moves `(year, month)` by `delta` months, carrying into the year.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() == 2 {
            if let Ok(count) = parts[0].parse::<i64>() {
                return Some((count, parts[1]));
            }
        }
    } else {
        return Some((1, input));
    }
    None
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
