//! Korean currency and calendar formatting helpers.

use chrono::{Datelike, Duration, NaiveDate};

const WEEKDAY_NAMES: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];
const MAN: i64 = 10_000;

/// Groups digits by thousands with `,`, keeping a leading minus sign.
pub fn group_digits(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// `1000` → `1,000원`.
pub fn format_currency(amount: i64) -> String {
    format!("{}원", group_digits(amount))
}

/// Short form used in summaries: `15000` → `1만5,000`, `20000` → `2만`.
pub fn format_currency_short(amount: i64) -> String {
    if amount >= MAN {
        let man = amount / MAN;
        let remainder = amount % MAN;
        if remainder == 0 {
            format!("{man}만")
        } else {
            format!("{man}만{}", group_digits(remainder))
        }
    } else {
        group_digits(amount)
    }
}

/// Label that fits a calendar cell: `120000` → `12만`, `15000` → `1.5만`.
pub fn format_compact(amount: i64) -> String {
    if amount >= 10 * MAN {
        format!("{}만", amount / MAN)
    } else if amount >= MAN {
        format!("{:.1}만", amount as f64 / MAN as f64)
    } else {
        group_digits(amount)
    }
}

/// Donut centre label: whole 만원 above ten thousand, full amount below.
pub fn format_man_won(amount: i64) -> String {
    if amount >= MAN {
        format!("{}만원", amount / MAN)
    } else {
        format_currency(amount)
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_next| (first_next - Duration::days(1)).day())
        .unwrap_or(31)
}

/// Weekday of the first day of the month, 0 = Sunday.
pub fn first_weekday(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

/// First and last calendar day of the month, `None` for an invalid month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((start, end))
}

pub fn weekday_name(index: u32) -> &'static str {
    WEEKDAY_NAMES[(index % 7) as usize]
}

pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `3월 5일`
pub fn day_label(date: NaiveDate) -> String {
    format!("{}월 {}일", date.month(), date.day())
}

/// `2025년 3월`
pub fn month_title(year: i32, month: u32) -> String {
    format!("{year}년 {month}월")
}

/// Moves `(year, month)` by `delta` months, wrapping across years.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands_with_won_suffix() {
        assert_eq!(format_currency(1000), "1,000원");
        assert_eq!(format_currency(0), "0원");
        assert_eq!(format_currency(999), "999원");
        assert_eq!(format_currency(1_234_567), "1,234,567원");
        assert_eq!(format_currency(-1500), "-1,500원");
    }

    #[test]
    fn short_form_splits_man_and_remainder() {
        assert_eq!(format_currency_short(15000), "1만5,000");
        assert_eq!(format_currency_short(20000), "2만");
        assert_eq!(format_currency_short(9999), "9,999");
        assert_eq!(format_currency_short(1_230_500), "123만500");
    }

    #[test]
    fn compact_labels_follow_cell_thresholds() {
        assert_eq!(format_compact(150_000), "15만");
        assert_eq!(format_compact(15_000), "1.5만");
        assert_eq!(format_compact(9_500), "9,500");
        assert_eq!(format_man_won(35_000), "3만원");
        assert_eq!(format_man_won(3_500), "3,500원");
    }

    #[test]
    fn month_geometry() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        // 2025-06-01 is a Sunday, 2025-01-01 a Wednesday.
        assert_eq!(first_weekday(2025, 6), 0);
        assert_eq!(first_weekday(2025, 1), 3);
        let (start, end) = month_range(2025, 4).unwrap();
        assert_eq!(format_date(start), "2025-04-01");
        assert_eq!(format_date(end), "2025-04-30");
        assert!(month_range(2025, 13).is_none());
    }

    #[test]
    fn shifting_months_wraps_years() {
        assert_eq!(shift_month(2025, 1, -1), (2024, 12));
        assert_eq!(shift_month(2025, 12, 1), (2026, 1));
        assert_eq!(shift_month(2025, 6, 0), (2025, 6));
    }

    #[test]
    fn korean_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(day_label(date), "3월 5일");
        assert_eq!(month_title(2025, 3), "2025년 3월");
        assert_eq!(weekday_name(weekday_index(date)), "수");
    }
}
