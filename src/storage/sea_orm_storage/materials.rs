//! 学习资料存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::study_materials::{ActiveModel, Column, Entity as StudyMaterials};
use crate::errors::Result;
use crate::models::common::page_window;
use crate::models::{
    PaginationInfo,
    materials::{
        entities::StudyMaterial, requests::MaterialListQuery, responses::MaterialListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建学习资料
    pub async fn create_material_impl(
        &self,
        title: &str,
        course_id: Option<i64>,
        file_token: &str,
        summary: &str,
        created_by: i64,
    ) -> Result<StudyMaterial> {
        let model = ActiveModel {
            title: Set(title.to_string()),
            course_id: Set(course_id),
            file_token: Set(file_token.to_string()),
            summary: Set(summary.to_string()),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建学习资料失败"))?;

        Ok(result.into())
    }

    pub async fn get_material_by_id_impl(&self, id: i64) -> Result<Option<StudyMaterial>> {
        let result = StudyMaterials::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询学习资料失败"))?;

        Ok(result.map(Into::into))
    }

    /// 分页列出学习资料
    pub async fn list_materials_with_pagination_impl(
        &self,
        query: MaterialListQuery,
    ) -> Result<MaterialListResponse> {
        let (page, size) = page_window(query.page, query.size, 10);

        let mut select = StudyMaterials::find();
        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }
        select = select.order_by_desc(Column::CreatedAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询学习资料总数失败"))?;
        let materials = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询学习资料列表失败"))?;

        Ok(MaterialListResponse {
            items: materials.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新摘要
    pub async fn update_material_summary_impl(
        &self,
        id: i64,
        summary: &str,
    ) -> Result<Option<StudyMaterial>> {
        if self.get_material_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            summary: Set(summary.to_string()),
            ..Default::default()
        };
        model
            .update(&self.db)
            .await
            .map_err(db_error("更新学习资料失败"))?;

        self.get_material_by_id_impl(id).await
    }

    pub async fn delete_material_impl(&self, id: i64) -> Result<bool> {
        let result = StudyMaterials::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除学习资料失败"))?;

        Ok(result.rows_affected > 0)
    }
}
