//! South Korean public holidays for 2024–2027.
//!
//! Lunar holidays (설날, 추석, 석가탄신일) are listed pre-resolved to solar
//! dates together with the substitute holidays granted under the 2023
//! substitute-holiday law. Years outside the table only get the fixed solar
//! holidays; lunar dates are not computed.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    pub substitute: bool,
}

const SUBSTITUTE: &str = "대체공휴일";

type Entry = (u32, u32, &'static str);

const FIXED: &[Entry] = &[
    (1, 1, "신정"),
    (3, 1, "삼일절"),
    (5, 5, "어린이날"),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (10, 3, "개천절"),
    (10, 9, "한글날"),
    (12, 25, "기독탄신일"),
];

const Y2024: &[Entry] = &[
    (1, 1, "신정"),
    (2, 9, "설날 연휴"),
    (2, 10, "설날"),
    (2, 11, "설날 연휴"),
    (2, 12, SUBSTITUTE),
    (3, 1, "삼일절"),
    (5, 5, "어린이날"),
    (5, 6, SUBSTITUTE),
    (5, 15, "석가탄신일"),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (9, 16, "추석 연휴"),
    (9, 17, "추석"),
    (9, 18, "추석 연휴"),
    (10, 3, "개천절"),
    (10, 9, "한글날"),
    (12, 25, "기독탄신일"),
];

const Y2025: &[Entry] = &[
    (1, 1, "신정"),
    (1, 28, "설날 연휴"),
    (1, 29, "설날"),
    (1, 30, "설날 연휴"),
    (3, 1, "삼일절"),
    (3, 3, SUBSTITUTE),
    (5, 5, "어린이날·석가탄신일"),
    (5, 6, SUBSTITUTE),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (10, 3, "개천절"),
    (10, 5, "추석 연휴"),
    (10, 6, "추석"),
    (10, 7, "추석 연휴"),
    (10, 8, SUBSTITUTE),
    (10, 9, "한글날"),
    (12, 25, "기독탄신일"),
];

const Y2026: &[Entry] = &[
    (1, 1, "신정"),
    (2, 16, "설날 연휴"),
    (2, 17, "설날"),
    (2, 18, "설날 연휴"),
    (3, 1, "삼일절"),
    (3, 2, SUBSTITUTE),
    (5, 5, "어린이날"),
    (5, 24, "석가탄신일"),
    (5, 25, SUBSTITUTE),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (8, 17, SUBSTITUTE),
    (9, 24, "추석 연휴"),
    (9, 25, "추석"),
    (9, 26, "추석 연휴"),
    (9, 28, SUBSTITUTE),
    (10, 3, "개천절"),
    (10, 5, SUBSTITUTE),
    (10, 9, "한글날"),
    (12, 25, "기독탄신일"),
];

const Y2027: &[Entry] = &[
    (1, 1, "신정"),
    (2, 5, "설날 연휴"),
    (2, 6, "설날"),
    (2, 7, "설날 연휴"),
    (2, 8, SUBSTITUTE),
    (3, 1, "삼일절"),
    (5, 5, "어린이날"),
    (5, 13, "석가탄신일"),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (8, 16, SUBSTITUTE),
    (9, 14, "추석 연휴"),
    (9, 15, "추석"),
    (9, 16, "추석 연휴"),
    (10, 3, "개천절"),
    (10, 4, SUBSTITUTE),
    (10, 9, "한글날"),
    (10, 11, SUBSTITUTE),
    (12, 25, "기독탄신일"),
    (12, 27, SUBSTITUTE),
];

fn table_for(year: i32) -> &'static [Entry] {
    match year {
        2024 => Y2024,
        2025 => Y2025,
        2026 => Y2026,
        2027 => Y2027,
        _ => FIXED,
    }
}

/// Every holiday of `year`, keyed by date.
pub fn holidays_for_year(year: i32) -> BTreeMap<NaiveDate, Holiday> {
    table_for(year)
        .iter()
        .filter_map(|&(month, day, name)| {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some((
                date,
                Holiday {
                    name,
                    substitute: name == SUBSTITUTE,
                },
            ))
        })
        .collect()
}

pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    table_for(date.year())
        .iter()
        .find(|&&(month, day, _)| month == date.month() && day == date.day())
        .map(|&(_, _, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn lunar_new_year_is_listed_for_known_years() {
        assert_eq!(holiday_name(date("2025-01-29")), Some("설날"));
        assert_eq!(holiday_name(date("2024-02-10")), Some("설날"));
        assert_eq!(holiday_name(date("2027-09-15")), Some("추석"));
    }

    #[test]
    fn unknown_years_fall_back_to_fixed_solar_holidays() {
        assert_eq!(holiday_name(date("2030-03-01")), Some("삼일절"));
        assert_eq!(holiday_name(date("2030-12-25")), Some("기독탄신일"));
        assert_eq!(holiday_name(date("2030-01-29")), None);
        assert_eq!(holidays_for_year(2030).len(), FIXED.len());
    }

    #[test]
    fn substitute_days_are_flagged() {
        let holidays = holidays_for_year(2026);
        let substitute = holidays.get(&date("2026-03-02")).unwrap();
        assert!(substitute.substitute);
        assert_eq!(substitute.name, "대체공휴일");
        assert!(!holidays.get(&date("2026-03-01")).unwrap().substitute);
    }

    #[test]
    fn ordinary_days_have_no_holiday() {
        assert_eq!(holiday_name(date("2025-04-15")), None);
        assert!(!holidays_for_year(2025).contains_key(&date("2025-04-15")));
    }
}
