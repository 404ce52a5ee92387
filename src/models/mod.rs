//! 数据模型定义
//!
//! 每个业务域分为 `entities`（业务实体）、`requests`（请求参数）与 `responses`（响应体）。

pub mod adaptive_tests;
pub mod attendance;
pub mod auth;
pub mod chat;
pub mod classes;
pub mod common;
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

use serde::Serialize;
use ts_rs::TS;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 应用启动时间，用于健康检查中的运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// - 0: 成功
/// - 1xxx: 认证与授权
/// - 2xxx: 用户
/// - 3xxx: 文件
/// - 4xxx: 教务记录（院系、班级、学生、课程、考勤、成绩）
/// - 5xxx: 生成类功能与 LLM
/// - 9xxx: 通用错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[repr(i32)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    Success = 0,

    // 认证
    Unauthorized = 1000,
    AuthFailed = 1001,
    Forbidden = 1003,
    RegisterFailed = 1004,
    RateLimitExceeded = 1029,

    // 用户
    UserNotFound = 2000,
    UserAlreadyExists = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserNameAlreadyExists = 2005,
    UserEmailAlreadyExists = 2006,
    UserCreationFailed = 2007,
    UserUpdateFailed = 2008,
    UserDeleteFailed = 2009,
    CanNotDeleteCurrentUser = 2010,
    UserInactive = 2011,

    // 文件
    FileNotFound = 3000,
    FileUploadFailed = 3001,
    FileTypeNotAllowed = 3002,
    FileSizeExceeded = 3003,
    MultifileUploadNotAllowed = 3004,
    PdfTextNotFound = 3005,

    // 教务记录
    DepartmentNotFound = 4000,
    DepartmentAlreadyExists = 4001,
    ClassNotFound = 4010,
    ClassAlreadyExists = 4011,
    StudentNotFound = 4020,
    StudentAlreadyExists = 4021,
    StudentAlreadyLinked = 4022,
    CourseNotFound = 4030,
    CourseAlreadyExists = 4031,
    AssignmentNotFound = 4040,
    AssignmentAlreadyExists = 4041,
    NotAssignedToCourse = 4042,
    TimetableConflict = 4050,
    TimetableSlotNotFound = 4051,
    EnrollmentNotFound = 4060,
    AttendanceInvalid = 4070,
    MarksInvalid = 4080,

    // 生成类功能
    LlmUnavailable = 5000,
    LlmResponseInvalid = 5001,
    GenerationFailed = 5002,
    TemplateNotFound = 5010,
    TemplateInvalid = 5011,
    QuestionPaperNotFound = 5020,
    MaterialNotFound = 5030,
    TestSessionNotFound = 5040,
    TestAlreadyCompleted = 5041,
    TestAnswerRejected = 5042,
    TestGenerationInProgress = 5043,
    EmployabilityCategoryInvalid = 5050,

    // 通用
    BadRequest = 9000,
    NotFound = 9004,
    Conflict = 9009,
    InternalServerError = 9999,
}
