use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 教学日（周一至周六）
pub const WEEKDAYS: [&str; 6] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// 课表条目（已关联课程、教师、班级）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/timetable.ts")]
pub struct TimetableEntry {
    pub day: String,
    pub period: i32,
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub class_id: i64,
    pub semester: i32,
    pub section: String,
}

/// 首字母大写，其余小写（`monday` -> `Monday`）
pub fn capitalize_day(day: &str) -> String {
    let lower = day.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 规范化星期名，支持三字母缩写；无法识别时仅做首字母大写
pub fn normalize_day(day: &str) -> String {
    let capitalized = capitalize_day(day);
    WEEKDAYS
        .iter()
        .find(|d| {
            capitalized == **d || (capitalized.len() == 3 && d.starts_with(capitalized.as_str()))
        })
        .map(|d| d.to_string())
        .unwrap_or(capitalized)
}

/// 是否为有效教学日
pub fn is_weekday(day: &str) -> bool {
    WEEKDAYS.contains(&day)
}

/// 星期排序序号，未知星期排在最后
pub fn day_order(day: &str) -> usize {
    WEEKDAYS
        .iter()
        .position(|d| *d == day)
        .map(|p| p + 1)
        .unwrap_or(7)
}

/// 按星期、节次排序
pub fn sort_entries(entries: &mut [TimetableEntry]) {
    entries.sort_by(|a, b| {
        day_order(&a.day)
            .cmp(&day_order(&b.day))
            .then(a.period.cmp(&b.period))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: &str, period: i32) -> TimetableEntry {
        TimetableEntry {
            day: day.to_string(),
            period,
            course_id: 1,
            course_code: "CST201".into(),
            course_name: "Data Structures".into(),
            teacher_id: 2,
            teacher_name: "Anil".into(),
            class_id: 3,
            semester: 3,
            section: "A".into(),
        }
    }

    #[test]
    fn test_normalize_day() {
        assert_eq!(normalize_day("monday"), "Monday");
        assert_eq!(normalize_day("  FRIDAY "), "Friday");
        assert_eq!(normalize_day("tue"), "Tuesday");
        assert_eq!(normalize_day("sunday"), "Sunday");
        assert_eq!(normalize_day(""), "");
    }

    #[test]
    fn test_day_order_puts_unknown_last() {
        assert_eq!(day_order("Monday"), 1);
        assert_eq!(day_order("Saturday"), 6);
        assert_eq!(day_order("Sunday"), 7);
    }

    #[test]
    fn test_sort_entries_by_day_then_period() {
        let mut entries = vec![
            entry("Wednesday", 1),
            entry("Monday", 3),
            entry("Sunday", 1),
            entry("Monday", 1),
        ];
        sort_entries(&mut entries);
        let order: Vec<(String, i32)> = entries.into_iter().map(|e| (e.day, e.period)).collect();
        assert_eq!(
            order,
            vec![
                ("Monday".to_string(), 1),
                ("Monday".to_string(), 3),
                ("Wednesday".to_string(), 1),
                ("Sunday".to_string(), 1),
            ]
        );
    }
}
