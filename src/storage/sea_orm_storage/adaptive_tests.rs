//! 自适应测试会话存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::adaptive_test_sessions::{ActiveModel, Column, Entity as TestSessions};
use crate::errors::Result;
use crate::models::adaptive_tests::entities::{TestQuestion, TestSession};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建测试会话，题目一次性生成后保存
    pub async fn create_test_session_impl(
        &self,
        user_id: i64,
        questions: &[TestQuestion],
    ) -> Result<TestSession> {
        let model = ActiveModel {
            user_id: Set(user_id),
            questions: Set(serde_json::to_string(questions)?),
            answers: Set("[]".to_string()),
            current_index: Set(0),
            total_questions: Set(questions.len() as i32),
            started_at: Set(chrono::Utc::now().timestamp()),
            completed: Set(false),
            completed_at: Set(None),
            analysis: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建测试会话失败"))?;

        Ok(result.into())
    }

    pub async fn get_test_session_impl(&self, id: i64) -> Result<Option<TestSession>> {
        let result = TestSessions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询测试会话失败"))?;

        Ok(result.map(Into::into))
    }

    /// 保存作答进度；仅当库中的进度仍为 `expected_index` 时写入，否则返回 false
    pub async fn save_test_session_impl(
        &self,
        session: &TestSession,
        expected_index: i32,
    ) -> Result<bool> {
        let analysis = match &session.analysis {
            Some(analysis) => Some(serde_json::to_string(analysis)?),
            None => None,
        };

        let result = TestSessions::update_many()
            .col_expr(
                Column::Answers,
                Expr::value(serde_json::to_string(&session.answers)?),
            )
            .col_expr(Column::CurrentIndex, Expr::value(session.current_index))
            .col_expr(Column::Completed, Expr::value(session.completed))
            .col_expr(
                Column::CompletedAt,
                Expr::value(session.completed_at.map(|t| t.timestamp())),
            )
            .col_expr(Column::Analysis, Expr::value(analysis))
            .filter(Column::Id.eq(session.id))
            .filter(Column::CurrentIndex.eq(expected_index))
            .exec(&self.db)
            .await
            .map_err(db_error("更新测试会话失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_test_sessions_impl(&self, user_id: i64) -> Result<Vec<TestSession>> {
        let result = TestSessions::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::StartedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询测试会话列表失败"))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
