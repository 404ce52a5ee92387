use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{CampusError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse,
    timetable::{
        entities::{TimetableEntry, normalize_day},
        requests::TimetableQuery,
        responses::TimetableResponse,
    },
    users::entities::{User, UserRole},
};
use crate::services::{error_response, unauthorized};
use crate::storage::Storage;

define_service!(TimetableService);

/// 学生看所在班级已选课程的时段，教职工看自己任教的时段
pub(crate) async fn timetable_for(
    storage: &Arc<dyn Storage>,
    user: &User,
    day: Option<&str>,
) -> Result<Vec<TimetableEntry>> {
    match user.role {
        UserRole::Student => {
            let student = storage
                .get_student_by_user_id(user.id)
                .await?
                .ok_or_else(|| CampusError::not_found("Could not find your class information."))?;
            storage.student_timetable(student.id, day).await
        }
        _ => storage.teacher_timetable(user.id, day).await,
    }
}

impl TimetableService {
    pub async fn get_timetable(
        &self,
        request: &HttpRequest,
        query: TimetableQuery,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };

        let day = query
            .day
            .as_deref()
            .map(normalize_day)
            .filter(|d| !d.is_empty());

        match timetable_for(&self.get_storage(request), &user, day.as_deref()).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                TimetableResponse { day, items },
                "Timetable retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to load timetable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_student_and_teacher_views() {
        let campus = campus().await;
        campus
            .storage
            .create_timetable_slot(campus.assignment_id, "Wednesday", 3)
            .await
            .unwrap();
        let service = TimetableService::with_deps(campus.storage.clone(), None);

        let student = service
            .get_timetable(
                &request_as(&campus.student_user),
                TimetableQuery { day: None },
            )
            .await
            .unwrap();
        let body = body_json(student).await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["day"], "Monday");
        assert_eq!(items[0]["teacher_name"], "Dr. Rao");

        let teacher = service
            .get_timetable(
                &request_as(&campus.teacher),
                TimetableQuery {
                    day: Some("wed".to_string()),
                },
            )
            .await
            .unwrap();
        let body = body_json(teacher).await;
        assert_eq!(body["data"]["day"], "Wednesday");
        assert_eq!(body["data"]["items"][0]["period"], 3);
        assert_eq!(body["data"]["items"][0]["section"], "A");
    }

    #[tokio::test]
    async fn test_student_without_record_gets_not_found() {
        let campus = campus().await;
        let service = TimetableService::with_deps(campus.storage.clone(), None);
        let resp = service
            .get_timetable(&request_as(&campus.admin), TimetableQuery { day: None })
            .await
            .unwrap();
        // 管理员按教师视图返回空课表
        assert_eq!(resp.status(), 200);

        let orphan = crate::models::users::entities::User {
            id: 9999,
            ..campus.student_user.clone()
        };
        let resp = service
            .get_timetable(&request_as(&orphan), TimetableQuery { day: None })
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
}
