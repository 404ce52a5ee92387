//! 结构化意图的处理：录入成绩、点名、课表、考勤与成绩查询
//!
//! 这里的失败大多以友好文本回复给用户，而不是 HTTP 错误。

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};

use super::analysis::QueryAnalysis;
use super::context::UserContext;
use crate::errors::{CampusError, Result};
use crate::models::{
    attendance::requests::AttendanceEntry,
    courses::requests::AssignmentListQuery,
    students::entities::{Student, normalize_usn},
    timetable::entities::{TimetableEntry, capitalize_day, normalize_day},
    users::entities::UserRole,
};
use crate::services::{attendance, marks};
use crate::storage::Storage;
use crate::utils::{pdf::format_marks, validate::parse_date};

fn display_date(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

fn presence(present: bool) -> &'static str {
    if present { "Present ✅" } else { "Absent ❌" }
}

/// 由 date_type / specific_date 推断点名日期，未指定时为今天
fn resolve_date(analysis: &QueryAnalysis, today: NaiveDate) -> std::result::Result<NaiveDate, ()> {
    match analysis.date_type.as_deref().map(str::to_lowercase).as_deref() {
        Some("yesterday") => return Ok(today - Duration::days(1)),
        Some("today") => return Ok(today),
        _ => {}
    }
    match analysis.specific_date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => parse_date(date).ok_or(()),
        _ => Ok(today),
    }
}

pub async fn record_marks(
    storage: &Arc<dyn Storage>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
) -> Result<String> {
    if !ctx.is_teacher() {
        return Ok("Only teachers can enter marks.".to_string());
    }
    let (Some(usn), Some(value), Some(course_name), Some(assessment)) = (
        analysis.usn(),
        analysis.marks(),
        analysis.course(),
        analysis.assessment(),
    ) else {
        return Ok(
            "Please provide student USN, marks value, course name, and assessment type."
                .to_string(),
        );
    };

    let Some(course) = storage.find_course_by_name(course_name).await? else {
        return Ok(format!("You are not assigned to teach {course_name}."));
    };

    match marks::record_marks(storage, &ctx.user, &course, usn, assessment, value).await {
        Ok(student) => Ok(format!(
            "✅ Successfully recorded {} marks for {} in {} ({})",
            format_marks(value),
            student.usn,
            course.name,
            assessment
        )),
        Err(CampusError::Authorization(msg)) | Err(CampusError::NotFound(msg)) => Ok(msg),
        Err(e) => {
            tracing::warn!("Chat marks entry failed: {}", e);
            Ok(format!("❌ Error recording marks: {}", e.message()))
        }
    }
}

pub async fn mark_attendance(
    storage: &Arc<dyn Storage>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
) -> Result<String> {
    if !ctx.is_teacher() {
        return Ok("Only teachers can mark attendance.".to_string());
    }
    let Ok(date) = resolve_date(analysis, Local::now().date_naive()) else {
        return Ok("Invalid date format. Please use YYYY-MM-DD format.".to_string());
    };
    let (Some(usn), Some(course_name)) = (analysis.usn(), analysis.course()) else {
        return Ok("Please provide student USN, date, and course information.".to_string());
    };

    // 先确认授课分配，再查学生
    let Some(course) = storage.find_course_by_name(course_name).await? else {
        return Ok(format!("You are not assigned to the course: {course_name}"));
    };
    let teacher_id = (ctx.user.role != UserRole::Admin).then_some(ctx.user.id);
    let assignments = storage
        .list_assignments(AssignmentListQuery {
            course_id: Some(course.id),
            teacher_id,
            class_id: None,
        })
        .await?;
    if assignments.is_empty() {
        return Ok(format!("You are not assigned to the course: {}", course.name));
    }

    let usn = normalize_usn(usn);
    let Some(student) = storage.get_student_by_usn(&usn).await? else {
        return Ok(format!("Student with USN {usn} not found."));
    };
    // 优先选择学生所在班级的分配
    let assignment = assignments
        .iter()
        .find(|a| a.class_id == student.class_id)
        .unwrap_or(&assignments[0]);

    let date = date.format("%Y-%m-%d").to_string();
    let present = analysis.is_present();
    let entry = AttendanceEntry {
        usn: student.usn.clone(),
        present,
    };
    match attendance::record_attendance(storage, &ctx.user, assignment.id, &date, &[entry]).await {
        Ok(_) => Ok(format!(
            "✅ Successfully marked {} as {} for {} on {}",
            student.usn,
            if present { "present" } else { "absent" },
            course.name,
            display_date(&date)
        )),
        Err(e) => {
            tracing::warn!("Chat attendance entry failed: {}", e);
            Ok(format!("❌ Error marking attendance: {}", e.message()))
        }
    }
}

pub async fn timetable(
    storage: &Arc<dyn Storage>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
) -> Result<String> {
    let day = analysis.day().map(|d| capitalize_day(&normalize_day(d)));
    let is_student = ctx.user.role == UserRole::Student;

    let lookup =
        crate::services::timetable::timetable_for(storage, &ctx.user, day.as_deref()).await;
    let entries = match lookup {
        Ok(entries) => entries,
        Err(CampusError::NotFound(msg)) => return Ok(msg),
        Err(e) => return Err(e),
    };

    if entries.is_empty() {
        return Ok(match (is_student, &day) {
            (true, Some(_)) => "No timetable found for the specified day.".to_string(),
            (true, None) => "No timetable data found.".to_string(),
            (false, Some(day)) => format!("No classes scheduled for {day}."),
            (false, None) => {
                let assigned = storage
                    .list_assignments(AssignmentListQuery {
                        course_id: None,
                        teacher_id: Some(ctx.user.id),
                        class_id: None,
                    })
                    .await?;
                if assigned.is_empty() {
                    "No courses are currently assigned to you.".to_string()
                } else {
                    "No timetable entries found for your assigned courses.".to_string()
                }
            }
        });
    }

    Ok(format_timetable(&entries, day.as_deref(), is_student))
}

fn format_timetable(entries: &[TimetableEntry], day: Option<&str>, is_student: bool) -> String {
    let mut out = match day {
        Some(day) => format!("📅 Your timetable for {day}:\n\n"),
        None => "📅 Your weekly timetable:\n\n".to_string(),
    };
    let mut current_day: Option<&str> = None;
    for entry in entries {
        if day.is_none() && current_day != Some(entry.day.as_str()) {
            if current_day.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("📌 {}:\n", entry.day));
            current_day = Some(entry.day.as_str());
        }
        if is_student {
            out.push_str(&format!(
                "⏰ Period {}: {} (Prof. {})\n",
                entry.period, entry.course_name, entry.teacher_name
            ));
        } else {
            out.push_str(&format!(
                "⏰ Period {}: {} for Section {} (Sem {})\n",
                entry.period, entry.course_name, entry.section, entry.semester
            ));
        }
    }
    out
}

/// 教职工查询需要同时给出 USN 和课程
async fn staff_target(
    storage: &Arc<dyn Storage>,
    analysis: &QueryAnalysis,
) -> Result<std::result::Result<(Student, crate::models::courses::entities::Course), String>> {
    let usn = normalize_usn(analysis.usn().unwrap_or_default());
    let course_name = analysis.course().unwrap_or_default();
    let Some(student) = storage.get_student_by_usn(&usn).await? else {
        return Ok(Err(format!("Student with USN {usn} not found.")));
    };
    let Some(course) = storage.find_course_by_name(course_name).await? else {
        return Ok(Err(format!("Course {course_name} not found.")));
    };
    Ok(Ok((student, course)))
}

async fn own_student(storage: &Arc<dyn Storage>, ctx: &UserContext) -> Result<Option<Student>> {
    storage.get_student_by_user_id(ctx.user.id).await
}

pub async fn attendance_query(
    storage: &Arc<dyn Storage>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
) -> Result<String> {
    if ctx.is_teacher() {
        if analysis.usn().is_none() || analysis.course().is_none() {
            return Ok(
                "Please specify both student USN and course name to view attendance.".to_string(),
            );
        }
        let (student, course) = match staff_target(storage, analysis).await? {
            Ok(target) => target,
            Err(reply) => return Ok(reply),
        };
        let summaries = attendance::course_summaries(storage, &student, Some(course.id)).await?;
        let details: Vec<_> = summaries.into_iter().flat_map(|s| s.details).collect();
        if details.is_empty() {
            return Ok(format!(
                "No attendance records found for {} in {}.",
                student.usn, course.name
            ));
        }
        let mut out = format!(
            "📊 Attendance record for {} in {}:\n\n",
            student.usn, course.name
        );
        for detail in details {
            out.push_str(&format!(
                "📅 {}: {}\n",
                display_date(&detail.date),
                presence(detail.present)
            ));
        }
        return Ok(out);
    }

    let Some(student) = own_student(storage, ctx).await? else {
        return Ok("Could not find your class information.".to_string());
    };

    if let Some(course_name) = analysis.course() {
        let course = storage.find_course_by_name(course_name).await?;
        let summary = match &course {
            Some(course) => attendance::course_summaries(storage, &student, Some(course.id))
                .await?
                .into_iter()
                .next()
                .filter(|s| s.total_days > 0),
            None => None,
        };
        let Some(summary) = summary else {
            return Ok(format!("No attendance records found for {course_name}."));
        };
        let mut out = format!(
            "📊 Your attendance for {}:\n\n✅ Present: {} days\n📅 Total Classes: {} days\n📈 Attendance: {:.2}%\n",
            summary.course_name, summary.present_days, summary.total_days, summary.percentage
        );
        out.push_str("\nDetailed attendance:\n");
        for detail in &summary.details {
            out.push_str(&format!(
                "📅 {}: {}\n",
                display_date(&detail.date),
                presence(detail.present)
            ));
        }
        return Ok(out);
    }

    let summaries: Vec<_> = attendance::course_summaries(storage, &student, None)
        .await?
        .into_iter()
        .filter(|s| s.total_days > 0)
        .collect();
    if summaries.is_empty() {
        return Ok("No attendance records found.".to_string());
    }
    let mut out = "📊 Your attendance summary:\n\n".to_string();
    for s in summaries {
        out.push_str(&format!(
            "📚 {}:\n  ✅ Present: {} days\n  📅 Total Classes: {} days\n  📈 Attendance: {:.2}%\n\n",
            s.course_name, s.present_days, s.total_days, s.percentage
        ));
    }
    Ok(out)
}

pub async fn marks_query(
    storage: &Arc<dyn Storage>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
) -> Result<String> {
    if ctx.is_teacher() {
        if analysis.usn().is_none() || analysis.course().is_none() {
            return Ok("Please specify both student USN and course name to view marks.".to_string());
        }
        let (student, course) = match staff_target(storage, analysis).await? {
            Ok(target) => target,
            Err(reply) => return Ok(reply),
        };
        let records = marks::student_marks(storage, &student, Some(course.id)).await?;
        if records.is_empty() {
            return Ok(format!("No marks found for {} in {}.", student.usn, course.name));
        }
        let mut out = format!("📊 Marks for {} in {}:\n\n", student.usn, course.name);
        for r in records {
            out.push_str(&format!("📝 {}: {}\n", r.assessment, format_marks(r.marks)));
        }
        return Ok(out);
    }

    let Some(student) = own_student(storage, ctx).await? else {
        return Ok("Could not find your class information.".to_string());
    };

    if let Some(course_name) = analysis.course() {
        let records = match storage.find_course_by_name(course_name).await? {
            Some(course) => marks::student_marks(storage, &student, Some(course.id)).await?,
            None => Vec::new(),
        };
        let Some(first) = records.first() else {
            return Ok(format!("No marks found for {course_name}."));
        };
        let mut out = format!("📊 Your marks for {}:\n\n", first.course_name);
        for r in &records {
            out.push_str(&format!("📝 {}: {}\n", r.assessment, format_marks(r.marks)));
        }
        return Ok(out);
    }

    let records = marks::student_marks(storage, &student, None).await?;
    if records.is_empty() {
        return Ok("No marks records found.".to_string());
    }
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for r in &records {
        grouped
            .entry(r.course_name.as_str())
            .or_default()
            .push(format!("  📝 {}: {}", r.assessment, format_marks(r.marks)));
    }
    let mut out = "📊 Your marks:\n\n".to_string();
    for (course, lines) in grouped {
        out.push_str(&format!("📚 {course}:\n"));
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(date_type: Option<&str>, specific: Option<&str>) -> QueryAnalysis {
        QueryAnalysis {
            date_type: date_type.map(str::to_string),
            specific_date: specific.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            resolve_date(&analysis(Some("yesterday"), None), today),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap())
        );
        assert_eq!(resolve_date(&analysis(None, None), today), Ok(today));
        assert_eq!(
            resolve_date(&analysis(Some("specific"), Some("2025-02-28")), today),
            Ok(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap())
        );
        assert!(resolve_date(&analysis(None, Some("28/02/2025")), today).is_err());
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2025-03-09"), "09-03-2025");
    }
}
