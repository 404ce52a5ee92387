//! 学生名单导出

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::students::{
    entities::Student,
    requests::{StudentExportParams, StudentListQuery},
};
use crate::services::error_response;
use crate::utils::{ExportFormat, ExportTable};

const MAX_EXPORT_ROWS: usize = 10_000;

pub async fn export_students(
    service: &StudentService,
    request: &HttpRequest,
    params: StudentExportParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let mut students = Vec::new();
    let mut page = 1;
    loop {
        let query = StudentListQuery {
            page: Some(page),
            size: Some(100),
            class_id: params.class_id,
            search: params.search.clone(),
        };
        let response = match storage.list_students_with_pagination(query).await {
            Ok(response) => response,
            Err(e) => return Ok(error_response(&e, "Failed to export students")),
        };
        students.extend(response.items);
        if page >= response.pagination.total_pages || students.len() >= MAX_EXPORT_ROWS {
            break;
        }
        page += 1;
    }
    students.truncate(MAX_EXPORT_ROWS);

    student_table(&students).into_response(ExportFormat::parse(params.format.as_deref()))
}

fn student_table(students: &[Student]) -> ExportTable {
    ExportTable {
        file_stem: "students",
        headers: &["id", "usn", "name", "class_id", "linked_user_id", "created_at"],
        rows: students
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.usn.clone(),
                    s.name.clone(),
                    s.class_id.to_string(),
                    s.user_id.map(|id| id.to_string()).unwrap_or_default(),
                    s.created_at.to_rfc3339(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    #[tokio::test]
    async fn test_export_xlsx_content_type() {
        let campus = campus().await;
        let service = StudentService::with_deps(campus.storage.clone(), None);
        let params = StudentExportParams {
            format: Some("xlsx".to_string()),
            class_id: Some(campus.class_id),
            search: None,
        };

        let resp = export_students(&service, &request_as(&campus.admin), params)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("spreadsheetml"));
    }
}
