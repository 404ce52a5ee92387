//! 学生与选课存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::prelude::{Classes, Courses, Departments, Enrollments};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::entity::{courses, enrollments};
use crate::errors::{CampusError, Result};
use crate::models::common::page_window;
use crate::models::{
    PaginationInfo,
    courses::entities::Course,
    students::{
        entities::{Student, StudentDetail},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建学生
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            usn: Set(req.usn),
            name: Set(req.name),
            class_id: Set(req.class_id),
            user_id: Set(req.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建学生失败"))?;

        Ok(result.into())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询学生失败"))?;

        Ok(result.map(Into::into))
    }

    /// 通过 USN 获取学生
    pub async fn get_student_by_usn_impl(&self, usn: &str) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::Usn.eq(usn))
            .one(&self.db)
            .await
            .map_err(db_error("查询学生失败"))?;

        Ok(result.map(Into::into))
    }

    /// 通过关联的用户 ID 获取学生
    pub async fn get_student_by_user_id_impl(&self, user_id: i64) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_error("查询学生失败"))?;

        Ok(result.map(Into::into))
    }

    /// 获取学生详情（班级与院系）
    pub async fn get_student_detail_impl(&self, student_id: i64) -> Result<Option<StudentDetail>> {
        let Some(student) = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询学生失败"))?
        else {
            return Ok(None);
        };

        let Some(class) = Classes::find_by_id(student.class_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询班级失败"))?
        else {
            return Ok(None);
        };

        let department_name = Departments::find_by_id(class.department_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询院系失败"))?
            .map(|d| d.name)
            .unwrap_or_default();

        Ok(Some(StudentDetail {
            id: student.id,
            usn: student.usn,
            name: student.name,
            class_id: class.id,
            semester: class.semester,
            section: class.section,
            department_id: class.department_id,
            department_name,
        }))
    }

    /// 分页列出学生
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let (page, size) = page_window(query.page, query.size, 10);

        let mut select = Students::find();

        if let Some(class_id) = query.class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }

        // 搜索 USN 或姓名
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Usn.contains(&escaped))
                    .add(Column::Name.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::Usn);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询学生总数失败"))?;
        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询学生列表失败"))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新学生信息
    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if self.get_student_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }

        if let Some(class_id) = update.class_id {
            model.class_id = Set(class_id);
        }

        if let Some(user_id) = update.user_id {
            model.user_id = Set(Some(user_id));
        }

        model
            .update(&self.db)
            .await
            .map_err(db_error("更新学生失败"))?;

        self.get_student_by_id_impl(id).await
    }

    /// 删除学生
    pub async fn delete_student_impl(&self, id: i64) -> Result<bool> {
        let result = Students::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除学生失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 关联用户账号（仅当学生尚未关联时生效）
    pub async fn link_student_user_impl(&self, student_id: i64, user_id: i64) -> Result<bool> {
        let result = Students::update_many()
            .col_expr(Column::UserId, sea_orm::sea_query::Expr::value(user_id))
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(student_id))
            .filter(Column::UserId.is_null())
            .exec(&self.db)
            .await
            .map_err(db_error("关联学生账号失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 选课，已存在时返回原记录
    pub async fn enroll_student_impl(&self, student_id: i64, course_id: i64) -> Result<i64> {
        Enrollments::insert(enrollments::ActiveModel {
            student_id: Set(student_id),
            course_id: Set(course_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([enrollments::Column::StudentId, enrollments::Column::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(db_error("创建选课失败"))?;

        Enrollments::find()
            .filter(enrollments::Column::StudentId.eq(student_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
            .map_err(db_error("查询选课失败"))?
            .map(|enrollment| enrollment.id)
            .ok_or_else(|| CampusError::database_operation("选课写入后未找到"))
    }

    /// 退课（级联删除成绩）
    pub async fn unenroll_student_impl(&self, student_id: i64, course_id: i64) -> Result<bool> {
        let result = Enrollments::delete_many()
            .filter(enrollments::Column::StudentId.eq(student_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .exec(&self.db)
            .await
            .map_err(db_error("删除选课失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生已选课程，按课程名排序
    pub async fn list_student_courses_impl(&self, student_id: i64) -> Result<Vec<Course>> {
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

        let result = Courses::find()
            .filter(courses::Column::Id.is_in(course_ids))
            .order_by_asc(courses::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error("查询课程失败"))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
