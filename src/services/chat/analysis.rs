//! 聊天意图识别：由分析模型把用户问题归类为结构化字段

use serde::Deserialize;

use crate::llm::strip_code_fences;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryAnalysis {
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub assessment_type: Option<String>,
    #[serde(default)]
    pub student_usn: Option<String>,
    #[serde(default)]
    pub marks_value: Option<serde_json::Value>,
    #[serde(default)]
    pub attendance_status: Option<String>,
    #[serde(default)]
    pub date_type: Option<String>,
    #[serde(default)]
    pub specific_date: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
}

/// 对话分派的意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    RecordMarks,
    MarkAttendance,
    Timetable,
    AttendanceQuery,
    MarksQuery,
    General,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl QueryAnalysis {
    pub fn intent(&self) -> Intent {
        let query = non_empty(&self.query_type).map(str::to_lowercase);
        let request = non_empty(&self.request_type).map(str::to_lowercase);
        match (query.as_deref(), request.as_deref()) {
            (Some("marks"), Some("modify")) => Intent::RecordMarks,
            (Some("attendance"), Some("modify")) => Intent::MarkAttendance,
            (Some("timetable"), _) => Intent::Timetable,
            (Some("attendance"), Some("query")) => Intent::AttendanceQuery,
            (Some("marks"), Some("query")) => Intent::MarksQuery,
            _ => Intent::General,
        }
    }

    pub fn course(&self) -> Option<&str> {
        non_empty(&self.course_name)
    }

    pub fn usn(&self) -> Option<&str> {
        non_empty(&self.student_usn)
    }

    pub fn assessment(&self) -> Option<&str> {
        non_empty(&self.assessment_type)
    }

    pub fn day(&self) -> Option<&str> {
        non_empty(&self.day)
    }

    /// 模型可能把分数写成数字或字符串
    pub fn marks(&self) -> Option<f64> {
        match self.marks_value.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        non_empty(&self.attendance_status).is_some_and(|s| s.eq_ignore_ascii_case("present"))
    }
}

pub fn build_analysis_prompt(message: &str, user_type: &str) -> String {
    format!(
        r#"Analyze the following user query in detail:

Query: {message}
User Type: {user_type}

Determine:
1. Query type (timetable/attendance/marks/general)
2. Request type (query/modify)
3. For marks query:
   - Is a specific course/subject mentioned? Extract exact course name
   - Assessment type if mentioned
4. For marks modification:
   - Student USN
   - Marks value (numeric)
   - Course/Subject name
   - Assessment type (test/quiz/assignment/internal/etc)
5. For attendance modification:
   - Student USN
   - Status (present/absent)
   - Course name
   - Date information:
     * For "today" -> date_type: "today"
     * For "yesterday" -> date_type: "yesterday"
     * For specific dates -> specific_date in YYYY-MM-DD format
     * If no date mentioned -> date_type: "today"
6. For timetable queries:
   - Is a specific day mentioned? Extract exact day name
   - Normalize day names (e.g., "monday", "Monday", "mon" -> "Monday")
   - "show my timetable" -> day: null (show full week)

Respond in JSON format with keys:
- query_type: string
- request_type: string
- course_name: string or null (exact course name if mentioned)
- assessment_type: string or null
- student_usn: string or null
- marks_value: number or null
- attendance_status: string or null
- date_type: string or null
- specific_date: string or null
- day: string or null (capitalized day name if mentioned)"#
    )
}

/// 解析分析模型的 JSON 输出
pub fn parse_analysis(raw: &str) -> Result<QueryAnalysis, serde_json::Error> {
    serde_json::from_str(strip_code_fences(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analysis_and_intent() {
        let analysis = parse_analysis(
            r#"```json
{"query_type":"Marks","request_type":"modify","course_name":"Compiler Design",
 "assessment_type":"Series 1","student_usn":"4KT21CS001","marks_value":"42.5",
 "attendance_status":null,"date_type":null,"specific_date":null,"day":null}
```"#,
        )
        .unwrap();
        assert_eq!(analysis.intent(), Intent::RecordMarks);
        assert_eq!(analysis.marks(), Some(42.5));
        assert_eq!(analysis.course(), Some("Compiler Design"));
        assert!(!analysis.is_present());
    }

    #[test]
    fn test_missing_fields_fall_back_to_general() {
        let analysis = parse_analysis(r#"{"query_type":"weather"}"#).unwrap();
        assert_eq!(analysis.intent(), Intent::General);
        let timetable = parse_analysis(r#"{"query_type":"timetable","day":"  "}"#).unwrap();
        assert_eq!(timetable.intent(), Intent::Timetable);
        assert_eq!(timetable.day(), None);
    }

    #[test]
    fn test_unparsable_analysis() {
        assert!(parse_analysis("I think this is about marks").is_err());
    }
}
