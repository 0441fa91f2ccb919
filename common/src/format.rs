//! Display helpers shared by presentation surfaces.

use chrono::{DateTime, Utc};

use crate::models::TimeRange;

/// Y-axis label: thousands are abbreviated (`$12.3k`), smaller values keep one decimal.
pub fn format_price_axis(value: f64) -> String {
    if value >= 1000.0 {
        format!("${:.1}k", value / 1000.0)
    } else {
        format!("${:.1}", value)
    }
}

/// X-axis label. Short ranges show the time of day, longer ones the date.
pub fn format_time_label(timestamp: DateTime<Utc>, range: TimeRange) -> String {
    let pattern = match range {
        TimeRange::OneDay => "%I:%M %p",
        TimeRange::OneWeek => "%a, %b %-d",
        TimeRange::OneMonth => "%b %-d",
        TimeRange::SixMonths | TimeRange::OneYear | TimeRange::All => "%b %-d, %y",
    };
    timestamp.format(pattern).to_string()
}

pub fn format_change_pct(pct: f64) -> String {
    format!("{:.2}%", pct)
}

/// Dollar amount with thousands separators and two decimals.
pub fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // Amounts that round to zero carry no sign
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn price_axis_abbreviates_thousands() {
        assert_eq!(format_price_axis(64_320.0), "$64.3k");
        assert_eq!(format_price_axis(1000.0), "$1.0k");
        assert_eq!(format_price_axis(0.4567), "$0.5");
        assert_eq!(format_price_axis(999.0), "$999.0");
    }

    #[test]
    fn time_label_depends_on_range() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap();
        assert_eq!(format_time_label(ts, TimeRange::OneDay), "02:30 PM");
        assert_eq!(format_time_label(ts, TimeRange::OneWeek), "Mon, Jan 6");
        assert_eq!(format_time_label(ts, TimeRange::OneMonth), "Jan 6");
        assert_eq!(format_time_label(ts, TimeRange::All), "Jan 6, 25");
    }

    #[test]
    fn change_pct_has_two_decimals() {
        assert_eq!(format_change_pct(-1.254), "-1.25%");
        assert_eq!(format_change_pct(3.0), "3.00%");
    }

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(format_usd(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.5), "$999.50");
        assert_eq!(format_usd(100_000.0), "$100,000.00");
        assert_eq!(format_usd(-1234.0), "-$1,234.00");
        assert_eq!(format_usd(0.0), "$0.00");
    }

    #[test]
    fn usd_drops_sign_when_rounded_to_zero() {
        assert_eq!(format_usd(-0.001), "$0.00");
        assert_eq!(format_usd(-0.02), "-$0.02");
    }
}
