//! 考勤：教师按授课分配和日期点名，学生与教职工查看汇总

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{CampusError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    attendance::{
        entities::CourseAttendanceSummary,
        requests::{AttendanceEntry, AttendanceSummaryQuery, MarkAttendanceRequest},
        responses::{AttendanceSummaryResponse, MarkAttendanceResponse},
    },
    students::entities::{Student, normalize_usn},
    users::entities::{User, UserRole},
};
use crate::services::{
    error_response, students::resolve_target_student, system::DynamicConfig, unauthorized,
};
use crate::storage::Storage;
use crate::utils::validate::parse_date;

define_service!(AttendanceService);

/// 点名：须为该分配的任课教师（管理员不受限），未知 USN 跳过并返回
pub(crate) async fn record_attendance(
    storage: &Arc<dyn Storage>,
    actor: &User,
    assignment_id: i64,
    date: &str,
    entries: &[AttendanceEntry],
) -> Result<MarkAttendanceResponse> {
    let assignment = storage
        .get_assignment_by_id(assignment_id)
        .await?
        .ok_or_else(|| CampusError::not_found("Assignment not found"))?;

    if actor.role != UserRole::Admin && assignment.teacher_id != actor.id {
        return Err(CampusError::authorization(
            "You are not assigned to this course",
        ));
    }

    let mut resolved = Vec::with_capacity(entries.len());
    let mut unknown_usns = Vec::new();
    for entry in entries {
        let usn = normalize_usn(&entry.usn);
        match storage.get_student_by_usn(&usn).await? {
            Some(student) => resolved.push((student.id, entry.present)),
            None => unknown_usns.push(usn),
        }
    }

    let session_id = storage
        .record_attendance(assignment.id, assignment.course_id, date, &resolved)
        .await?;
    let marked = resolved.len();

    info!(
        "Attendance marked for assignment {} on {}: {} records, {} unknown",
        assignment.id,
        date,
        marked,
        unknown_usns.len()
    );

    Ok(MarkAttendanceResponse {
        session_id,
        course_id: assignment.course_id,
        date: date.to_string(),
        marked,
        unknown_usns,
    })
}

/// 每门已选课程的出勤汇总，按课程名排序
pub(crate) async fn course_summaries(
    storage: &Arc<dyn Storage>,
    student: &Student,
    course_id: Option<i64>,
) -> Result<Vec<CourseAttendanceSummary>> {
    let mut by_course = storage.list_student_attendance(student.id).await?;
    let courses = storage.list_student_courses(student.id).await?;

    let mut summaries: Vec<CourseAttendanceSummary> = courses
        .into_iter()
        .filter(|c| course_id.is_none_or(|id| id == c.id))
        .map(|c| {
            let details = by_course.remove(&c.id).unwrap_or_default();
            CourseAttendanceSummary::from_details(c.id, c.name, details)
        })
        .collect();
    summaries.sort_by(|a, b| a.course_name.cmp(&b.course_name));
    Ok(summaries)
}

impl AttendanceService {
    pub async fn mark_attendance(
        &self,
        request: &HttpRequest,
        req: MarkAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };

        if req.entries.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::AttendanceInvalid,
                "At least one attendance entry is required",
            )));
        }

        let date = match req.date.as_deref() {
            Some(raw) => match parse_date(raw) {
                Some(date) => date,
                None => {
                    return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                        ErrorCode::AttendanceInvalid,
                        "Invalid date format. Please use YYYY-MM-DD format.",
                    )));
                }
            },
            None => chrono::Local::now().date_naive(),
        };
        let date = date.format("%Y-%m-%d").to_string();

        let storage = self.get_storage(request);
        match record_attendance(&storage, &actor, req.assignment_id, &date, &req.entries).await {
            Ok(result) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(result, "Attendance marked successfully"))),
            Err(CampusError::NotFound(_)) => Ok(HttpResponse::NotFound().json(
                ApiResponse::error_empty(ErrorCode::AssignmentNotFound, "Assignment not found"),
            )),
            Err(CampusError::Authorization(msg)) => Ok(HttpResponse::Forbidden().json(
                ApiResponse::error_empty(ErrorCode::NotAssignedToCourse, msg),
            )),
            Err(e) => Ok(error_response(&e, "Failed to mark attendance")),
        }
    }

    pub async fn get_summary(
        &self,
        request: &HttpRequest,
        query: AttendanceSummaryQuery,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        let student = match resolve_target_student(&storage, &actor, query.usn.as_deref()).await {
            Ok(student) => student,
            Err(e) => return Ok(error_response(&e, "Failed to resolve student")),
        };

        match course_summaries(&storage, &student, query.course_id).await {
            Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                AttendanceSummaryResponse {
                    usn: student.usn,
                    student_name: student.name,
                    minimum_percentage: DynamicConfig::attendance_minimum_percentage().await,
                    courses,
                },
                "Attendance summary retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to load attendance")),
        }
    }

    /// 教师查看某学生在某课程的逐日记录
    pub async fn get_course_record(
        &self,
        request: &HttpRequest,
        course_id: i64,
        usn: &str,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let usn = normalize_usn(usn);

        let course = match storage.get_course_by_id(course_id).await {
            Ok(Some(course)) => course,
            Ok(None) => return Ok(crate::services::courses::course_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get course")),
        };
        let student = match storage.get_student_by_usn(&usn).await {
            Ok(Some(student)) => student,
            Ok(None) => return Ok(crate::services::students::student_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get student")),
        };

        match storage.list_student_attendance(student.id).await {
            Ok(mut by_course) => {
                let details = by_course.remove(&course.id).unwrap_or_default();
                let record = CourseAttendanceSummary::from_details(course.id, course.name, details);
                Ok(HttpResponse::Ok().json(ApiResponse::success(
                    AttendanceSummaryResponse {
                        usn: student.usn,
                        student_name: student.name,
                        minimum_percentage: DynamicConfig::attendance_minimum_percentage().await,
                        courses: vec![record],
                    },
                    "Attendance record retrieved successfully",
                )))
            }
            Err(e) => Ok(error_response(&e, "Failed to load attendance")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    fn entry(usn: &str, present: bool) -> AttendanceEntry {
        AttendanceEntry {
            usn: usn.to_string(),
            present,
        }
    }

    #[tokio::test]
    async fn test_marking_reports_unknown_usns_and_overwrites() {
        let campus = campus().await;

        let first = record_attendance(
            &campus.storage,
            &campus.teacher,
            campus.assignment_id,
            "2025-01-06",
            &[entry("4kt21cs001", false), entry("4KT21CS404", true)],
        )
        .await
        .unwrap();
        assert_eq!(first.marked, 1);
        assert_eq!(first.unknown_usns, vec!["4KT21CS404".to_string()]);

        // 同一天再次点名覆盖原记录
        record_attendance(
            &campus.storage,
            &campus.teacher,
            campus.assignment_id,
            "2025-01-06",
            &[entry("4KT21CS001", true)],
        )
        .await
        .unwrap();
        record_attendance(
            &campus.storage,
            &campus.teacher,
            campus.assignment_id,
            "2025-01-07",
            &[entry("4KT21CS001", false)],
        )
        .await
        .unwrap();

        let student = campus
            .storage
            .get_student_by_id(campus.student_id)
            .await
            .unwrap()
            .unwrap();
        let summaries = course_summaries(&campus.storage, &student, None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_days, 2);
        assert_eq!(summaries[0].present_days, 1);
        assert_eq!(summaries[0].percentage, 50.0);
        assert_eq!(summaries[0].details[0].date, "2025-01-07");
    }

    #[tokio::test]
    async fn test_simultaneous_marking_both_succeed() {
        let campus = campus().await;
        let entries = [entry("4KT21CS001", true)];

        let (a, b) = tokio::join!(
            record_attendance(
                &campus.storage,
                &campus.teacher,
                campus.assignment_id,
                "2025-02-03",
                &entries,
            ),
            record_attendance(
                &campus.storage,
                &campus.admin,
                campus.assignment_id,
                "2025-02-03",
                &entries,
            ),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.session_id, b.session_id);
        assert_eq!((a.marked, b.marked), (1, 1));
    }

    #[tokio::test]
    async fn test_other_teacher_cannot_mark() {
        let campus = campus().await;
        let outsider = User {
            id: campus.admin.id + 100,
            role: UserRole::Teacher,
            ..campus.teacher.clone()
        };
        let err = record_attendance(
            &campus.storage,
            &outsider,
            campus.assignment_id,
            "2025-01-06",
            &[entry("4KT21CS001", true)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CampusError::Authorization(_)));

        // 管理员不受限
        assert!(
            record_attendance(
                &campus.storage,
                &campus.admin,
                campus.assignment_id,
                "2025-01-06",
                &[entry("4KT21CS001", true)],
            )
            .await
            .is_ok()
        );
    }

    #[tokio::test]
    async fn test_summary_for_course_without_records_is_zero() {
        let campus = campus().await;
        let service = AttendanceService::with_deps(campus.storage.clone(), None);

        let resp = service
            .get_summary(
                &request_as(&campus.student_user),
                AttendanceSummaryQuery {
                    usn: None,
                    course_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["usn"], "4KT21CS001");
        assert_eq!(body["data"]["courses"][0]["total_days"], 0);
        assert_eq!(body["data"]["courses"][0]["percentage"], 0.0);
    }

    #[tokio::test]
    async fn test_mark_attendance_rejects_bad_date() {
        let campus = campus().await;
        let service = AttendanceService::with_deps(campus.storage.clone(), None);
        let resp = service
            .mark_attendance(
                &request_as(&campus.teacher),
                MarkAttendanceRequest {
                    assignment_id: campus.assignment_id,
                    date: Some("06/01/2025".to_string()),
                    entries: vec![entry("4KT21CS001", true)],
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}
