//! 成绩存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, db_error};
use crate::entity::prelude::{Courses, Enrollments, Marks};
use crate::entity::{courses, enrollments, marks};
use crate::errors::Result;
use crate::models::marks::entities::{MarkRecord, sort_records};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 写入成绩，同一选课同一考核只保留一条
    pub async fn upsert_mark_impl(
        &self,
        enrollment_id: i64,
        assessment: &str,
        value: f64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        Marks::insert(marks::ActiveModel {
            enrollment_id: Set(enrollment_id),
            assessment: Set(assessment.to_string()),
            marks: Set(value),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([marks::Column::EnrollmentId, marks::Column::Assessment])
                .update_columns([marks::Column::Marks, marks::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(db_error("写入成绩失败"))?;

        Ok(())
    }

    /// 学生成绩，按课程名、考核名排序
    pub async fn list_student_marks_impl(
        &self,
        student_id: i64,
        course_id: Option<i64>,
    ) -> Result<Vec<MarkRecord>> {
        let mut select = Enrollments::find().filter(enrollments::Column::StudentId.eq(student_id));
        if let Some(course_id) = course_id {
            select = select.filter(enrollments::Column::CourseId.eq(course_id));
        }
        let enrollment_list = select
            .all(&self.db)
            .await
            .map_err(db_error("查询选课失败"))?;

        if enrollment_list.is_empty() {
            return Ok(Vec::new());
        }

        let enrollment_courses: HashMap<i64, i64> = enrollment_list
            .iter()
            .map(|e| (e.id, e.course_id))
            .collect();
        let course_names: HashMap<i64, String> = Courses::find()
            .filter(courses::Column::Id.is_in(enrollment_courses.values().copied()))
            .all(&self.db)
            .await
            .map_err(db_error("查询课程失败"))?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let rows = Marks::find()
            .filter(marks::Column::EnrollmentId.is_in(enrollment_courses.keys().copied()))
            .all(&self.db)
            .await
            .map_err(db_error("查询成绩失败"))?;

        let mut records: Vec<MarkRecord> = rows
            .into_iter()
            .filter_map(|m| {
                let course_id = *enrollment_courses.get(&m.enrollment_id)?;
                Some(MarkRecord {
                    id: m.id,
                    enrollment_id: m.enrollment_id,
                    course_id,
                    course_name: course_names.get(&course_id).cloned().unwrap_or_default(),
                    assessment: m.assessment,
                    marks: m.marks,
                    updated_at: chrono::DateTime::<chrono::Utc>::from_timestamp(m.updated_at, 0)
                        .unwrap_or_default(),
                })
            })
            .collect();

        sort_records(&mut records);
        Ok(records)
    }
}
