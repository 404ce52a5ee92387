use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{
        entities::MAX_PERIOD, requests::CreateTimetableSlotRequest,
        responses::TimetableSlotListResponse,
    },
    timetable::entities::{is_weekday, normalize_day},
};
use crate::services::error_response;

pub async fn create_slot(
    service: &CourseService,
    request: &HttpRequest,
    assignment_id: i64,
    req: CreateTimetableSlotRequest,
) -> ActixResult<HttpResponse> {
    let day = normalize_day(&req.day);
    if !is_weekday(&day) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Day must be Monday to Saturday",
        )));
    }
    if !(1..=MAX_PERIOD).contains(&req.period) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            format!("Period must be between 1 and {MAX_PERIOD}"),
        )));
    }

    match service
        .get_storage(request)
        .create_timetable_slot(assignment_id, &day, req.period)
        .await
    {
        Ok(slot) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(slot, "Timetable slot added"))),
        Err(CampusError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::TimetableConflict,
                format!("The class already has a course on {day} period {}", req.period),
            ),
        )),
        Err(CampusError::NotFound(_)) => Ok(HttpResponse::NotFound().json(
            ApiResponse::error_empty(ErrorCode::AssignmentNotFound, "Assignment not found"),
        )),
        Err(e) => Ok(error_response(&e, "Failed to add timetable slot")),
    }
}

pub async fn list_slots(
    service: &CourseService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    match service
        .get_storage(request)
        .list_timetable_slots(assignment_id)
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TimetableSlotListResponse { items },
            "Timetable slots retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to list timetable slots")),
    }
}

pub async fn delete_slot(
    service: &CourseService,
    request: &HttpRequest,
    slot_id: i64,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).delete_timetable_slot(slot_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Timetable slot removed",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::TimetableSlotNotFound,
            "Timetable slot not found",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to remove timetable slot")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    fn slot(day: &str, period: i32) -> CreateTimetableSlotRequest {
        CreateTimetableSlotRequest {
            day: day.to_string(),
            period,
        }
    }

    #[tokio::test]
    async fn test_slot_validation_and_conflict() {
        let campus = campus().await;
        let service = CourseService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        // 夹具已占用周一第 1 节
        let clash = create_slot(&service, &req, campus.assignment_id, slot("mon", 1))
            .await
            .unwrap();
        assert_eq!(clash.status(), 409);

        let sunday = create_slot(&service, &req, campus.assignment_id, slot("sunday", 2))
            .await
            .unwrap();
        assert_eq!(sunday.status(), 400);

        let period = create_slot(&service, &req, campus.assignment_id, slot("Tuesday", 9))
            .await
            .unwrap();
        assert_eq!(period.status(), 400);

        let ok = create_slot(&service, &req, campus.assignment_id, slot("tue", 2))
            .await
            .unwrap();
        assert_eq!(ok.status(), 201);
    }
}
