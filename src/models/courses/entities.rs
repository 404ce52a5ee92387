use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub department_id: i64,
    pub semester: i32,
    pub credits: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 授课分配：某教师在某班级讲授某课程
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseAssignment {
    pub id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 课表时段
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct TimetableSlot {
    pub id: i64,
    pub assignment_id: i64,
    pub day: String,
    pub period: i32,
}

/// 每天最多节次
pub const MAX_PERIOD: i32 = 8;
