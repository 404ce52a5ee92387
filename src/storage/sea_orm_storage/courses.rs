//! 课程与授课分配存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::course_assignments;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::prelude::CourseAssignments;
use crate::errors::Result;
use crate::models::common::page_window;
use crate::models::{
    PaginationInfo,
    courses::{
        entities::{Course, CourseAssignment},
        requests::{
            AssignmentListQuery, CourseListQuery, CreateAssignmentRequest, CreateCourseRequest,
            UpdateCourseRequest,
        },
        responses::CourseListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_course_impl(&self, req: CreateCourseRequest) -> Result<Course> {
        let model = ActiveModel {
            code: Set(req.code),
            name: Set(req.name),
            department_id: Set(req.department_id),
            semester: Set(req.semester),
            credits: Set(req.credits),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建课程失败"))?;

        Ok(result.into())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询课程失败"))?;

        Ok(result.map(Into::into))
    }

    /// 按名称或代码查找课程，先精确匹配（忽略大小写），再按包含关系匹配
    pub async fn find_course_by_name_impl(&self, name: &str) -> Result<Option<Course>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let all = Courses::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error("查询课程失败"))?;

        let exact = all
            .iter()
            .position(|c| c.name.to_lowercase() == needle || c.code.to_lowercase() == needle);
        let index = exact.or_else(|| {
            all.iter()
                .position(|c| c.name.to_lowercase().contains(&needle))
        });

        Ok(index.map(|i| all[i].clone().into()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = page_window(query.page, query.size, 10);

        let mut select = Courses::find();

        if let Some(department_id) = query.department_id {
            select = select.filter(Column::DepartmentId.eq(department_id));
        }

        if let Some(semester) = query.semester {
            select = select.filter(Column::Semester.eq(semester));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Code.contains(&escaped))
                    .add(Column::Name.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::Code);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询课程总数失败"))?;
        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询课程列表失败"))?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新课程
    pub async fn update_course_impl(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            ..Default::default()
        };

        if let Some(code) = update.code {
            model.code = Set(code);
        }
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(semester) = update.semester {
            model.semester = Set(semester);
        }
        if let Some(credits) = update.credits {
            model.credits = Set(credits);
        }

        model
            .update(&self.db)
            .await
            .map_err(db_error("更新课程失败"))?;

        self.get_course_by_id_impl(id).await
    }

    /// 删除课程
    pub async fn delete_course_impl(&self, id: i64) -> Result<bool> {
        let result = Courses::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除课程失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 创建授课分配
    pub async fn create_assignment_impl(
        &self,
        course_id: i64,
        req: CreateAssignmentRequest,
    ) -> Result<CourseAssignment> {
        let model = course_assignments::ActiveModel {
            course_id: Set(course_id),
            class_id: Set(req.class_id),
            teacher_id: Set(req.teacher_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建授课分配失败"))?;

        Ok(result.into())
    }

    /// 通过 ID 获取授课分配
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<CourseAssignment>> {
        let result = CourseAssignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询授课分配失败"))?;

        Ok(result.map(Into::into))
    }

    /// 列出授课分配
    pub async fn list_assignments_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<Vec<CourseAssignment>> {
        let mut select = CourseAssignments::find();

        if let Some(course_id) = query.course_id {
            select = select.filter(course_assignments::Column::CourseId.eq(course_id));
        }
        if let Some(class_id) = query.class_id {
            select = select.filter(course_assignments::Column::ClassId.eq(class_id));
        }
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(course_assignments::Column::TeacherId.eq(teacher_id));
        }

        let result = select
            .order_by_asc(course_assignments::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询授课分配列表失败"))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    /// 删除授课分配（级联删除课表时段与考勤场次）
    pub async fn delete_assignment_impl(&self, id: i64) -> Result<bool> {
        let result = CourseAssignments::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除授课分配失败"))?;

        Ok(result.rows_affected > 0)
    }
}
