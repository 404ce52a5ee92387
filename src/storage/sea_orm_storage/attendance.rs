//! 考勤存储操作

use std::collections::BTreeMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{SeaOrmStorage, db_error};
use crate::entity::prelude::{AttendanceRecords, AttendanceSessions};
use crate::entity::{attendance_records, attendance_sessions};
use crate::errors::{CampusError, Result};
use crate::models::attendance::entities::AttendanceDetail;

/// 获取或创建场次；并发创建时冲突的一方直接读取已有行
async fn ensure_session<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i64,
    date: &str,
) -> Result<i64> {
    AttendanceSessions::insert(attendance_sessions::ActiveModel {
        assignment_id: Set(assignment_id),
        date: Set(date.to_string()),
        created_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            attendance_sessions::Column::AssignmentId,
            attendance_sessions::Column::Date,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .map_err(db_error("创建考勤场次失败"))?;

    AttendanceSessions::find()
        .filter(attendance_sessions::Column::AssignmentId.eq(assignment_id))
        .filter(attendance_sessions::Column::Date.eq(date))
        .one(conn)
        .await
        .map_err(db_error("查询考勤场次失败"))?
        .map(|session| session.id)
        .ok_or_else(|| CampusError::database_operation("考勤场次写入后未找到"))
}

/// 同一学生同一课程同一天只保留一条，重复标记覆盖出勤状态
async fn write_attendance<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i64,
    course_id: i64,
    date: &str,
    entries: &[(i64, bool)],
) -> Result<i64> {
    let session_id = ensure_session(conn, assignment_id, date).await?;
    let now = chrono::Utc::now().timestamp();
    for &(student_id, present) in entries {
        AttendanceRecords::insert(attendance_records::ActiveModel {
            session_id: Set(session_id),
            student_id: Set(student_id),
            course_id: Set(course_id),
            date: Set(date.to_string()),
            present: Set(present),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                attendance_records::Column::StudentId,
                attendance_records::Column::CourseId,
                attendance_records::Column::Date,
            ])
            .update_columns([
                attendance_records::Column::SessionId,
                attendance_records::Column::Present,
                attendance_records::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(db_error("写入考勤记录失败"))?;
    }
    Ok(session_id)
}

impl SeaOrmStorage {
    /// 一次点名在同一事务内完成，返回场次 ID
    pub async fn record_attendance_impl(
        &self,
        assignment_id: i64,
        course_id: i64,
        date: &str,
        entries: &[(i64, bool)],
    ) -> Result<i64> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        match write_attendance(&txn, assignment_id, course_id, date, entries).await {
            Ok(session_id) => {
                txn.commit().await.map_err(db_error("提交事务失败"))?;
                Ok(session_id)
            }
            Err(e) => {
                txn.rollback().await.map_err(db_error("回滚事务失败"))?;
                Err(e)
            }
        }
    }

    /// 学生考勤明细，按课程分组，日期倒序
    pub async fn list_student_attendance_impl(
        &self,
        student_id: i64,
    ) -> Result<BTreeMap<i64, Vec<AttendanceDetail>>> {
        let records = AttendanceRecords::find()
            .filter(attendance_records::Column::StudentId.eq(student_id))
            .order_by_desc(attendance_records::Column::Date)
            .all(&self.db)
            .await
            .map_err(db_error("查询考勤记录失败"))?;

        let mut grouped: BTreeMap<i64, Vec<AttendanceDetail>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.course_id)
                .or_default()
                .push(AttendanceDetail {
                    date: record.date,
                    present: record.present,
                });
        }

        Ok(grouped)
    }
}
