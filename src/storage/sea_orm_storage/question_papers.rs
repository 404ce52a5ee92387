//! 试卷模板与试卷存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::prelude::{QuestionPaperTemplates, QuestionPapers};
use crate::entity::{question_paper_templates, question_papers};
use crate::errors::Result;
use crate::models::common::page_window;
use crate::models::{
    PaginationInfo,
    question_papers::{
        entities::{DifficultyDistribution, PaperContent, PaperTemplate, QuestionPaper},
        requests::{CreateTemplateRequest, QuestionPaperListQuery},
        responses::QuestionPaperListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建模板
    pub async fn create_template_impl(
        &self,
        req: CreateTemplateRequest,
        created_by: i64,
    ) -> Result<PaperTemplate> {
        let structure = serde_json::to_string(&req.sections)?;

        let model = question_paper_templates::ActiveModel {
            name: Set(req.name),
            institution: Set(req.institution),
            course: Set(req.course),
            subject: Set(req.subject),
            total_marks: Set(req.total_marks),
            duration_minutes: Set(req.duration_minutes),
            structure: Set(structure),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建试卷模板失败"))?;

        Ok(result.into())
    }

    pub async fn get_template_by_id_impl(&self, id: i64) -> Result<Option<PaperTemplate>> {
        let result = QuestionPaperTemplates::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询试卷模板失败"))?;

        Ok(result.map(Into::into))
    }

    /// 列出用户创建的模板，最新的在前
    pub async fn list_templates_by_user_impl(&self, user_id: i64) -> Result<Vec<PaperTemplate>> {
        let result = QuestionPaperTemplates::find()
            .filter(question_paper_templates::Column::CreatedBy.eq(user_id))
            .order_by_desc(question_paper_templates::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error("查询试卷模板列表失败"))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    pub async fn delete_template_impl(&self, id: i64) -> Result<bool> {
        let result = QuestionPaperTemplates::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除试卷模板失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 保存生成的试卷
    pub async fn create_question_paper_impl(
        &self,
        template_id: i64,
        title: &str,
        content: &PaperContent,
        difficulty: &DifficultyDistribution,
        generated_by: i64,
    ) -> Result<QuestionPaper> {
        let model = question_papers::ActiveModel {
            template_id: Set(template_id),
            title: Set(title.to_string()),
            content: Set(serde_json::to_string(content)?),
            difficulty_distribution: Set(serde_json::to_string(difficulty)?),
            generated_by: Set(generated_by),
            generated_at: Set(chrono::Utc::now().timestamp()),
            is_edited: Set(false),
            last_edited_at: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("保存试卷失败"))?;

        Ok(result.into())
    }

    pub async fn get_question_paper_by_id_impl(&self, id: i64) -> Result<Option<QuestionPaper>> {
        let result = QuestionPapers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询试卷失败"))?;

        Ok(result.map(Into::into))
    }

    /// 分页列出试卷
    pub async fn list_question_papers_with_pagination_impl(
        &self,
        query: QuestionPaperListQuery,
    ) -> Result<QuestionPaperListResponse> {
        let (page, size) = page_window(query.page, query.size, 10);

        let mut select = QuestionPapers::find();
        if let Some(generated_by) = query.generated_by {
            select = select.filter(question_papers::Column::GeneratedBy.eq(generated_by));
        }
        if let Some(template_id) = query.template_id {
            select = select.filter(question_papers::Column::TemplateId.eq(template_id));
        }
        select = select.order_by_desc(question_papers::Column::GeneratedAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询试卷总数失败"))?;
        let papers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询试卷列表失败"))?;

        Ok(QuestionPaperListResponse {
            items: papers.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 保存编辑后的试卷内容
    pub async fn update_question_paper_content_impl(
        &self,
        id: i64,
        content: &PaperContent,
    ) -> Result<Option<QuestionPaper>> {
        if self.get_question_paper_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = question_papers::ActiveModel {
            id: Set(id),
            content: Set(serde_json::to_string(content)?),
            is_edited: Set(true),
            last_edited_at: Set(Some(chrono::Utc::now().timestamp())),
            ..Default::default()
        };
        model
            .update(&self.db)
            .await
            .map_err(db_error("更新试卷失败"))?;

        self.get_question_paper_by_id_impl(id).await
    }

    pub async fn delete_question_paper_impl(&self, id: i64) -> Result<bool> {
        let result = QuestionPapers::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除试卷失败"))?;

        Ok(result.rows_affected > 0)
    }
}
