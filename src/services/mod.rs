//! 业务逻辑层
//!
//! 每个业务域一个服务结构体，路由层持有其懒加载的全局实例；
//! 依赖（存储、LLM 客户端）默认从请求的 app data 中获取，测试可直接注入。

/// 生成服务结构体及其依赖获取方法
macro_rules! define_service {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            storage: Option<std::sync::Arc<dyn crate::storage::Storage>>,
            llm: Option<std::sync::Arc<dyn crate::llm::LlmClient>>,
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self {
                    storage: None,
                    llm: None,
                }
            }

            /// 直接注入依赖
            pub fn with_deps(
                storage: std::sync::Arc<dyn crate::storage::Storage>,
                llm: Option<std::sync::Arc<dyn crate::llm::LlmClient>>,
            ) -> Self {
                Self {
                    storage: Some(storage),
                    llm,
                }
            }

            pub fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> std::sync::Arc<dyn crate::storage::Storage> {
                if let Some(storage) = &self.storage {
                    storage.clone()
                } else {
                    request
                        .app_data::<actix_web::web::Data<std::sync::Arc<dyn crate::storage::Storage>>>()
                        .expect("Storage not found in app data")
                        .get_ref()
                        .clone()
                }
            }

            pub fn get_llm(
                &self,
                request: &actix_web::HttpRequest,
            ) -> std::sync::Arc<dyn crate::llm::LlmClient> {
                if let Some(llm) = &self.llm {
                    llm.clone()
                } else {
                    request
                        .app_data::<actix_web::web::Data<std::sync::Arc<dyn crate::llm::LlmClient>>>()
                        .expect("LLM client not found in app data")
                        .get_ref()
                        .clone()
                }
            }
        }
    };
}

pub mod adaptive_tests;
pub mod attendance;
pub mod auth;
pub mod chat;
pub mod classes;
pub mod courses;
pub mod departments;
pub mod employability;
pub mod files;
pub mod marks;
pub mod materials;
pub mod question_papers;
pub mod students;
pub mod system;
pub mod timetable;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use adaptive_tests::AdaptiveTestService;
pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use chat::ChatService;
pub use classes::ClassService;
pub use courses::CourseService;
pub use departments::DepartmentService;
pub use employability::EmployabilityService;
pub use files::FileService;
pub use marks::MarksService;
pub use materials::MaterialService;
pub use question_papers::QuestionPaperService;
pub use students::StudentService;
pub use system::SystemService;
pub use timetable::TimetableService;
pub use users::UserService;

use actix_web::HttpResponse;

use crate::errors::CampusError;
use crate::models::{ApiResponse, ErrorCode};

/// 存储或 LLM 错误的默认 HTTP 映射
pub(crate) fn error_response(err: &CampusError, context: &str) -> HttpResponse {
    match err {
        CampusError::Conflict(msg) => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::Conflict, msg.clone())),
        CampusError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::NotFound, msg.clone())),
        CampusError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg.clone())),
        CampusError::Authorization(msg) => forbidden(msg),
        e if e.is_llm_error() => {
            tracing::warn!("{}: {}", context, e);
            HttpResponse::BadGateway().json(ApiResponse::error_empty(
                ErrorCode::LlmUnavailable,
                format!("{context}: {}", e.message()),
            ))
        }
        e => {
            tracing::error!("{}: {}", context, e);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("{context}: {e}"),
            ))
        }
    }
}

/// 未登录响应
pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Unauthorized access, please login",
    ))
}

pub(crate) fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(ErrorCode::Forbidden, message))
}
