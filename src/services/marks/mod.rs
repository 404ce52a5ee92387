use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{CampusError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{entities::Course, requests::AssignmentListQuery},
    marks::{
        entities::{MarkRecord, is_valid_marks, sort_records},
        requests::{MarksQuery, RecordMarksRequest},
        responses::MarksListResponse,
    },
    students::entities::{Student, normalize_usn},
    users::entities::{User, UserRole},
};
use crate::services::{error_response, students::resolve_target_student, unauthorized};
use crate::storage::Storage;

define_service!(MarksService);

/// 教师须被分配到该课程（任一班级），管理员不受限
pub(crate) async fn ensure_teaches(
    storage: &Arc<dyn Storage>,
    actor: &User,
    course: &Course,
) -> Result<()> {
    if actor.role == UserRole::Admin {
        return Ok(());
    }
    let assignments = storage
        .list_assignments(AssignmentListQuery {
            course_id: Some(course.id),
            teacher_id: Some(actor.id),
            class_id: None,
        })
        .await?;
    if assignments.is_empty() {
        return Err(CampusError::authorization(format!(
            "You are not assigned to teach {}.",
            course.name
        )));
    }
    Ok(())
}

/// 录入成绩，按 (选课, 考核) 覆盖，学生未选课时自动选课
pub(crate) async fn record_marks(
    storage: &Arc<dyn Storage>,
    actor: &User,
    course: &Course,
    usn: &str,
    assessment: &str,
    marks: f64,
) -> Result<Student> {
    if !is_valid_marks(marks) {
        return Err(CampusError::validation(
            "Marks must be a non-negative number",
        ));
    }
    let assessment = assessment.trim();
    if assessment.is_empty() {
        return Err(CampusError::validation("Assessment name is required"));
    }

    ensure_teaches(storage, actor, course).await?;

    let usn = normalize_usn(usn);
    let student = storage
        .get_student_by_usn(&usn)
        .await?
        .ok_or_else(|| CampusError::not_found(format!("Student with USN {usn} not found.")))?;

    let enrollment_id = storage.enroll_student(student.id, course.id).await?;
    storage.upsert_mark(enrollment_id, assessment, marks).await?;

    tracing::info!(
        "Marks recorded: {} {} {} = {}",
        student.usn,
        course.code,
        assessment,
        marks
    );
    Ok(student)
}

/// 按课程名、考核名排序
pub(crate) async fn student_marks(
    storage: &Arc<dyn Storage>,
    student: &Student,
    course_id: Option<i64>,
) -> Result<Vec<MarkRecord>> {
    let mut records = storage.list_student_marks(student.id, course_id).await?;
    sort_records(&mut records);
    Ok(records)
}

impl MarksService {
    pub async fn record(
        &self,
        request: &HttpRequest,
        req: RecordMarksRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        let course = match storage.get_course_by_id(req.course_id).await {
            Ok(Some(course)) => course,
            Ok(None) => return Ok(crate::services::courses::course_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get course")),
        };

        match record_marks(&storage, &actor, &course, &req.usn, &req.assessment, req.marks).await {
            Ok(student) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                serde_json::json!({
                    "usn": student.usn,
                    "course_id": course.id,
                    "assessment": req.assessment.trim(),
                    "marks": req.marks,
                }),
                "Marks recorded successfully",
            ))),
            Err(CampusError::Validation(msg)) => Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::MarksInvalid, msg))),
            Err(CampusError::Authorization(msg)) => Ok(HttpResponse::Forbidden()
                .json(ApiResponse::error_empty(ErrorCode::NotAssignedToCourse, msg))),
            Err(CampusError::NotFound(_)) => Ok(crate::services::students::student_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to record marks")),
        }
    }

    pub async fn query(
        &self,
        request: &HttpRequest,
        query: MarksQuery,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        let student = match resolve_target_student(&storage, &actor, query.usn.as_deref()).await {
            Ok(student) => student,
            Err(e) => return Ok(error_response(&e, "Failed to resolve student")),
        };

        match student_marks(&storage, &student, query.course_id).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                MarksListResponse {
                    usn: student.usn,
                    student_name: student.name,
                    items,
                },
                "Marks retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to load marks")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    async fn compiler_design(storage: &Arc<dyn Storage>, id: i64) -> Course {
        storage.get_course_by_id(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_record_marks_upserts_per_assessment() {
        let campus = campus().await;
        let course = compiler_design(&campus.storage, campus.course_id).await;

        record_marks(&campus.storage, &campus.teacher, &course, "4kt21cs001", "Series 1", 38.0)
            .await
            .unwrap();
        record_marks(&campus.storage, &campus.teacher, &course, "4KT21CS001", "Series 1", 41.5)
            .await
            .unwrap();
        record_marks(&campus.storage, &campus.teacher, &course, "4KT21CS001", "Assignment", 9.0)
            .await
            .unwrap();

        let service = MarksService::with_deps(campus.storage.clone(), None);
        let resp = service
            .query(
                &request_as(&campus.student_user),
                MarksQuery {
                    usn: None,
                    course_id: None,
                },
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["assessment"], "Assignment");
        assert_eq!(items[1]["marks"], 41.5);
    }

    #[tokio::test]
    async fn test_record_marks_rejects_invalid_values_and_strangers() {
        let campus = campus().await;
        let course = compiler_design(&campus.storage, campus.course_id).await;

        let negative =
            record_marks(&campus.storage, &campus.teacher, &course, "4KT21CS001", "Series 1", -2.0)
                .await
                .unwrap_err();
        assert!(matches!(negative, CampusError::Validation(_)));

        let stranger = User {
            id: campus.admin.id + 100,
            ..campus.teacher.clone()
        };
        let denied =
            record_marks(&campus.storage, &stranger, &course, "4KT21CS001", "Series 1", 10.0)
                .await
                .unwrap_err();
        assert!(matches!(denied, CampusError::Authorization(_)));

        let unknown =
            record_marks(&campus.storage, &campus.admin, &course, "4KT21CS999", "Series 1", 10.0)
                .await
                .unwrap_err();
        assert!(matches!(unknown, CampusError::NotFound(_)));
    }
}
