//! 课表存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, db_error};
use crate::entity::prelude::{
    AssignmentModel, Classes, CourseAssignments, Courses, Enrollments, Students, TimetableSlots,
    Users,
};
use crate::entity::{classes, course_assignments, courses, enrollments, timetable_slots, users};
use crate::errors::{CampusError, Result};
use crate::models::{
    courses::entities::TimetableSlot,
    timetable::entities::{TimetableEntry, day_order, sort_entries},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 添加课表时段，同一班级同一天同一节次只能有一门课
    pub async fn create_timetable_slot_impl(
        &self,
        assignment_id: i64,
        day: &str,
        period: i32,
    ) -> Result<TimetableSlot> {
        let assignment = CourseAssignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询授课分配失败"))?
            .ok_or_else(|| CampusError::not_found(format!("授课分配不存在: {assignment_id}")))?;

        // 同班级的所有授课分配
        let sibling_ids: Vec<i64> = CourseAssignments::find()
            .filter(course_assignments::Column::ClassId.eq(assignment.class_id))
            .all(&self.db)
            .await
            .map_err(db_error("查询授课分配失败"))?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let occupied = TimetableSlots::find()
            .filter(timetable_slots::Column::AssignmentId.is_in(sibling_ids))
            .filter(timetable_slots::Column::Day.eq(day))
            .filter(timetable_slots::Column::Period.eq(period))
            .one(&self.db)
            .await
            .map_err(db_error("查询课表失败"))?;

        if occupied.is_some() {
            return Err(CampusError::conflict(format!(
                "{day} 第 {period} 节已有课程安排"
            )));
        }

        let model = timetable_slots::ActiveModel {
            assignment_id: Set(assignment_id),
            day: Set(day.to_string()),
            period: Set(period),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建课表时段失败"))?;

        Ok(result.into())
    }

    /// 列出授课分配下的时段
    pub async fn list_timetable_slots_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<TimetableSlot>> {
        let result = TimetableSlots::find()
            .filter(timetable_slots::Column::AssignmentId.eq(assignment_id))
            .order_by_asc(timetable_slots::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询课表失败"))?;

        let mut slots: Vec<TimetableSlot> = result.into_iter().map(Into::into).collect();
        slots.sort_by(|a, b| {
            day_order(&a.day)
                .cmp(&day_order(&b.day))
                .then(a.period.cmp(&b.period))
        });
        Ok(slots)
    }

    /// 删除时段
    pub async fn delete_timetable_slot_impl(&self, slot_id: i64) -> Result<bool> {
        let result = TimetableSlots::delete_by_id(slot_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除课表时段失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生课表：所在班级中已选课程的时段
    pub async fn student_timetable_impl(
        &self,
        student_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>> {
        let Some(student) = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询学生失败"))?
        else {
            return Ok(Vec::new());
        };

        let course_ids: Vec<i64> = Enrollments::find()
            .filter(enrollments::Column::StudentId.eq(student_id))
            .all(&self.db)
            .await
            .map_err(db_error("查询选课失败"))?
            .into_iter()
            .map(|e| e.course_id)
            .collect();

        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = CourseAssignments::find()
            .filter(course_assignments::Column::ClassId.eq(student.class_id))
            .filter(course_assignments::Column::CourseId.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(db_error("查询授课分配失败"))?;

        self.build_timetable_entries(assignments, day).await
    }

    /// 教师课表
    pub async fn teacher_timetable_impl(
        &self,
        teacher_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>> {
        let assignments = CourseAssignments::find()
            .filter(course_assignments::Column::TeacherId.eq(teacher_id))
            .all(&self.db)
            .await
            .map_err(db_error("查询授课分配失败"))?;

        self.build_timetable_entries(assignments, day).await
    }

    /// 根据授课分配组装课表条目
    async fn build_timetable_entries(
        &self,
        assignments: Vec<AssignmentModel>,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>> {
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let assignment_ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();
        let mut slot_select = TimetableSlots::find()
            .filter(timetable_slots::Column::AssignmentId.is_in(assignment_ids));
        if let Some(day) = day {
            slot_select = slot_select.filter(timetable_slots::Column::Day.eq(day));
        }
        let slots = slot_select
            .all(&self.db)
            .await
            .map_err(db_error("查询课表失败"))?;

        let course_ids: Vec<i64> = assignments.iter().map(|a| a.course_id).collect();
        let class_ids: Vec<i64> = assignments.iter().map(|a| a.class_id).collect();
        let teacher_ids: Vec<i64> = assignments.iter().map(|a| a.teacher_id).collect();

        let course_map: HashMap<i64, courses::Model> = Courses::find()
            .filter(courses::Column::Id.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(db_error("查询课程失败"))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let class_map: HashMap<i64, classes::Model> = Classes::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(db_error("查询班级失败"))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let teacher_map: HashMap<i64, users::Model> = Users::find()
            .filter(users::Column::Id.is_in(teacher_ids))
            .all(&self.db)
            .await
            .map_err(db_error("查询教师失败"))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let assignment_map: HashMap<i64, &AssignmentModel> =
            assignments.iter().map(|a| (a.id, a)).collect();

        let mut entries: Vec<TimetableEntry> = slots
            .into_iter()
            .filter_map(|slot| {
                let assignment = assignment_map.get(&slot.assignment_id)?;
                let course = course_map.get(&assignment.course_id)?;
                let class = class_map.get(&assignment.class_id)?;
                let teacher_name = teacher_map
                    .get(&assignment.teacher_id)
                    .map(|t| {
                        t.display_name
                            .clone()
                            .filter(|n| !n.trim().is_empty())
                            .unwrap_or_else(|| t.username.clone())
                    })
                    .unwrap_or_default();

                Some(TimetableEntry {
                    day: slot.day,
                    period: slot.period,
                    course_id: course.id,
                    course_code: course.code.clone(),
                    course_name: course.name.clone(),
                    teacher_id: assignment.teacher_id,
                    teacher_name,
                    class_id: class.id,
                    semester: class.semester,
                    section: class.section.clone(),
                })
            })
            .collect();

        sort_entries(&mut entries);
        Ok(entries)
    }
}
