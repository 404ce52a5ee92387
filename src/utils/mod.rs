pub mod export;
pub mod extractor;
pub mod file_magic;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod pdf;
pub mod sql;
pub mod validate;

pub use extractor::{
    SafeAssignmentIdI64, SafeClassIdI64, SafeCourseIdI64, SafeDepartmentIdI64, SafeFileToken,
    SafeIDI64, SafeMaterialIdI64, SafePaperIdI64, SafeSessionIdI64, SafeSettingKey,
    SafeSlotIdI64, SafeStudentIdI64, SafeTemplateIdI64,
};
pub use export::{ExportFormat, ExportTable};
pub use file_magic::{extension_of, is_pdf, validate_magic_bytes};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
