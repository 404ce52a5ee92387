//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod adaptive_test_sessions;
pub mod attendance_records;
pub mod attendance_sessions;
pub mod chat_messages;
pub mod classes;
pub mod course_assignments;
pub mod courses;
pub mod departments;
pub mod employability_results;
pub mod enrollments;
pub mod files;
pub mod marks;
pub mod question_paper_templates;
pub mod question_papers;
pub mod students;
pub mod study_materials;
pub mod system_settings;
pub mod system_settings_audit;
pub mod timetable_slots;
pub mod users;
