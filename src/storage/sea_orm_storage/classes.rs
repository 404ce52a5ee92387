//! 班级存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::Result;
use crate::models::common::page_window;
use crate::models::{
    PaginationInfo,
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let created = ActiveModel {
            department_id: Set(req.department_id),
            semester: Set(req.semester),
            section: Set(req.section),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_error("创建班级失败"))?;

        Ok(created.into())
    }

    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询班级失败"))?;

        Ok(result.map(Into::into))
    }

    /// 按院系、学期、班号排序
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let (page, size) = page_window(query.page, query.size, 10);

        let mut select = Classes::find();
        if let Some(department_id) = query.department_id {
            select = select.filter(Column::DepartmentId.eq(department_id));
        }
        if let Some(semester) = query.semester {
            select = select.filter(Column::Semester.eq(semester));
        }

        let paginator = select
            .order_by_asc(Column::DepartmentId)
            .order_by_asc(Column::Semester)
            .order_by_asc(Column::Section)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询班级总数失败"))?;

        let classes = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询班级列表失败"))?;

        Ok(ClassListResponse {
            items: classes.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 院系不可修改，只能调整学期与班号
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        let Some(existing) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询班级失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(semester) = update.semester {
            model.semester = Set(semester);
        }
        if let Some(section) = update.section {
            model.section = Set(section);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(db_error("更新班级失败"))?;
        Ok(Some(updated.into()))
    }

    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除班级失败"))?;

        Ok(result.rows_affected > 0)
    }
}
