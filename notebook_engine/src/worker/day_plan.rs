//! Turns raw calendar records into the per-day text the weekly pages print.
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::{db_types::PlannerDay, traits::CalendarDayMap};

/// Japanese label for a timetable weekday, 1 = Monday .. 7 = Sunday. Out-of-range values map to an
/// empty label rather than an error; the source data is user-maintained.
pub fn weekday_label_ja(weekday: i64) -> &'static str {
    match weekday {
        1 => "月曜",
        2 => "火曜",
        3 => "水曜",
        4 => "木曜",
        5 => "金曜",
        6 => "土曜",
        7 => "日曜",
        _ => "",
    }
}

/// Builds the printable day sequence for the given dates.
///
/// Description slot A carries the national holiday name. Slot B carries term and class-day
/// information: Sundays show only the term name, class days show
/// `{term} {weekday}授業日 (order)`, and everything else falls back to the term name. Dates with
/// no calendar record at all come out blank.
pub fn build_planner_days(
    dates: &[NaiveDate],
    day_map: &CalendarDayMap,
    term_names: &HashMap<String, String>,
) -> Vec<PlannerDay> {
    dates
        .iter()
        .map(|&date| {
            let record = day_map.get(date);
            let Some(record) = record else {
                return PlannerDay {
                    date,
                    is_holiday: false,
                    description_a: String::new(),
                    description_b: String::new(),
                };
            };
            let term_name = record
                .term_id
                .as_deref()
                .and_then(|id| term_names.get(id))
                .cloned()
                .unwrap_or_default();
            let class_day = record.day_type.as_deref() == Some("授業日");
            let description_b = if date.weekday() == Weekday::Sun {
                term_name
            } else if class_day {
                match (record.class_weekday, record.class_order) {
                    (Some(weekday), Some(order)) if weekday > 0 && order > 0 => {
                        let prefix = if term_name.is_empty() { String::new() } else { format!("{term_name} ") };
                        format!("{prefix}{}授業日 ({order})", weekday_label_ja(weekday))
                    },
                    _ => term_name,
                }
            } else {
                term_name
            };
            PlannerDay {
                date,
                is_holiday: record.is_holiday,
                description_a: record.holiday_name.clone().unwrap_or_default(),
                description_b,
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::CalendarDay;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn map_with(entries: Vec<(NaiveDate, CalendarDay)>) -> CalendarDayMap {
        CalendarDayMap::new(entries.into_iter().collect(), HashMap::new())
    }

    fn terms() -> HashMap<String, String> {
        HashMap::from([("t1".to_string(), "前期".to_string())])
    }

    #[test]
    fn class_day_gets_weekday_and_order() {
        // 2025-04-08 is a Tuesday.
        let day = CalendarDay {
            day_type: Some("授業日".to_string()),
            class_weekday: Some(2),
            class_order: Some(3),
            term_id: Some("t1".to_string()),
            ..CalendarDay::default()
        };
        let days = build_planner_days(&[date("2025-04-08")], &map_with(vec![(date("2025-04-08"), day)]), &terms());
        assert_eq!(days[0].description_b, "前期 火曜授業日 (3)");
        assert_eq!(days[0].description_a, "");
    }

    #[test]
    fn class_day_without_term_has_no_prefix() {
        let day = CalendarDay {
            day_type: Some("授業日".to_string()),
            class_weekday: Some(1),
            class_order: Some(1),
            ..CalendarDay::default()
        };
        let days = build_planner_days(&[date("2025-04-07")], &map_with(vec![(date("2025-04-07"), day)]), &terms());
        assert_eq!(days[0].description_b, "月曜授業日 (1)");
    }

    #[test]
    fn sunday_shows_only_the_term_name() {
        // 2025-04-13 is a Sunday. Even a class-day record collapses to the term name.
        let day = CalendarDay {
            day_type: Some("授業日".to_string()),
            class_weekday: Some(7),
            class_order: Some(2),
            term_id: Some("t1".to_string()),
            ..CalendarDay::default()
        };
        let days = build_planner_days(&[date("2025-04-13")], &map_with(vec![(date("2025-04-13"), day)]), &terms());
        assert_eq!(days[0].description_b, "前期");
    }

    #[test]
    fn holiday_name_lands_in_slot_a() {
        let day = CalendarDay {
            is_holiday: true,
            holiday_name: Some("昭和の日".to_string()),
            term_id: Some("t1".to_string()),
            ..CalendarDay::default()
        };
        let days = build_planner_days(&[date("2025-04-29")], &map_with(vec![(date("2025-04-29"), day)]), &terms());
        assert!(days[0].is_holiday);
        assert_eq!(days[0].description_a, "昭和の日");
        assert_eq!(days[0].description_b, "前期");
    }

    #[test]
    fn missing_record_renders_blank() {
        let days = build_planner_days(&[date("2025-05-01")], &map_with(vec![]), &terms());
        assert!(!days[0].is_holiday);
        assert_eq!(days[0].description_a, "");
        assert_eq!(days[0].description_b, "");
    }

    #[test]
    fn incomplete_class_metadata_falls_back_to_term_name() {
        let day = CalendarDay {
            day_type: Some("授業日".to_string()),
            class_weekday: Some(2),
            class_order: None,
            term_id: Some("t1".to_string()),
            ..CalendarDay::default()
        };
        let days = build_planner_days(&[date("2025-04-08")], &map_with(vec![(date("2025-04-08"), day)]), &terms());
        assert_eq!(days[0].description_b, "前期");
    }
}
