//! 预导入模块，方便使用

pub use super::adaptive_test_sessions::{
    ActiveModel as TestSessionActiveModel, Entity as TestSessions, Model as TestSessionModel,
};
pub use super::attendance_records::{
    ActiveModel as AttendanceRecordActiveModel, Entity as AttendanceRecords,
    Model as AttendanceRecordModel,
};
pub use super::attendance_sessions::{
    ActiveModel as AttendanceSessionActiveModel, Entity as AttendanceSessions,
    Model as AttendanceSessionModel,
};
pub use super::chat_messages::{
    ActiveModel as ChatMessageActiveModel, Entity as ChatMessages, Model as ChatMessageModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::course_assignments::{
    ActiveModel as AssignmentActiveModel, Entity as CourseAssignments, Model as AssignmentModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::departments::{
    ActiveModel as DepartmentActiveModel, Entity as Departments, Model as DepartmentModel,
};
pub use super::employability_results::{
    ActiveModel as EmployabilityResultActiveModel, Entity as EmployabilityResults,
    Model as EmployabilityResultModel,
};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
pub use super::files::{ActiveModel as FileActiveModel, Entity as Files, Model as FileModel};
pub use super::marks::{ActiveModel as MarkActiveModel, Entity as Marks, Model as MarkModel};
pub use super::question_paper_templates::{
    ActiveModel as TemplateActiveModel, Entity as QuestionPaperTemplates, Model as TemplateModel,
};
pub use super::question_papers::{
    ActiveModel as QuestionPaperActiveModel, Entity as QuestionPapers, Model as QuestionPaperModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::study_materials::{
    ActiveModel as MaterialActiveModel, Entity as StudyMaterials, Model as MaterialModel,
};
pub use super::timetable_slots::{
    ActiveModel as TimetableSlotActiveModel, Entity as TimetableSlots, Model as TimetableSlotModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
pub use super::system_settings::{
    ActiveModel as SystemSettingActiveModel, Entity as SystemSettings, Model as SystemSettingModel,
};
pub use super::system_settings_audit::{
    ActiveModel as SystemSettingAuditActiveModel, Entity as SystemSettingsAudit,
    Model as SystemSettingAuditModel,
};
