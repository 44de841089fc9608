//! Text formatting shared by statements, reminders and the shell.

use chrono::{DateTime, NaiveDate, Utc};

/// Groups thousands with `,` and keeps up to two decimals, dropping a
/// trailing `.00`.
pub fn format_number(value: f64) -> String {
    let body = format!("{:.2}", value.abs());
    let (int_part, fraction) = body.split_once('.').unwrap_or((body.as_str(), "00"));
    let mut rendered = group_digits(int_part);
    if fraction != "00" {
        rendered.push('.');
        rendered.push_str(fraction);
    }
    if value < 0.0 && rendered.chars().any(|ch| ch != '0' && ch != ',' && ch != '.') {
        rendered.insert(0, '-');
    }
    rendered
}

pub fn format_amount(value: f64, currency: &str) -> String {
    format!("{} {}", format_number(value), currency)
}

pub fn format_day(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format_day(at.date_naive())
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, ',');
        }
        grouped.insert(0, ch);
    }
    grouped
}
