//! 就业能力评估结果存储操作

use std::collections::BTreeMap;

use super::{SeaOrmStorage, db_error};
use crate::entity::employability_results::{ActiveModel, Column, Entity as EmployabilityResults};
use crate::errors::Result;
use crate::models::employability::entities::{EmployabilityResult, EmployabilityStats};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_employability_result_impl(
        &self,
        user_id: i64,
        scores: &BTreeMap<String, f64>,
        overall_score: f64,
        level: i32,
    ) -> Result<EmployabilityResult> {
        let model = ActiveModel {
            user_id: Set(user_id),
            scores: Set(serde_json::to_string(scores)?),
            overall_score: Set(overall_score),
            level: Set(level),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("保存评估结果失败"))?;

        Ok(result.into())
    }

    /// 评估历史，最新的在前
    pub async fn list_employability_results_impl(
        &self,
        user_id: i64,
    ) -> Result<Vec<EmployabilityResult>> {
        let result = EmployabilityResults::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询评估历史失败"))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    pub async fn employability_stats_impl(&self, user_id: i64) -> Result<EmployabilityStats> {
        let results = self.list_employability_results_impl(user_id).await?;
        Ok(summarize_results(&results))
    }
}

/// 汇总评估历史，列表按时间倒序
fn summarize_results(results: &[EmployabilityResult]) -> EmployabilityStats {
    if results.is_empty() {
        return EmployabilityStats::default();
    }

    let scores: Vec<f64> = results.iter().map(|r| r.overall_score).collect();
    let total = scores.iter().sum::<f64>();

    EmployabilityStats {
        total_assessments: results.len() as u64,
        average_score: Some(total / scores.len() as f64),
        highest_score: scores.iter().copied().reduce(f64::max),
        lowest_score: scores.iter().copied().reduce(f64::min),
        last_assessment: results.first().map(|r| r.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: i64, score: f64, ts: i64) -> EmployabilityResult {
        EmployabilityResult {
            id,
            user_id: 1,
            scores: BTreeMap::new(),
            overall_score: score,
            level: 1,
            created_at: chrono::DateTime::from_timestamp(ts, 0).unwrap(),
        }
    }

    #[test]
    fn test_summarize_empty() {
        let stats = summarize_results(&[]);
        assert_eq!(stats.total_assessments, 0);
        assert!(stats.average_score.is_none());
    }

    #[test]
    fn test_summarize_scores() {
        let stats = summarize_results(&[result(2, 4.0, 200), result(1, 2.0, 100)]);
        assert_eq!(stats.total_assessments, 2);
        assert_eq!(stats.average_score, Some(3.0));
        assert_eq!(stats.highest_score, Some(4.0));
        assert_eq!(stats.lowest_score, Some(2.0));
        assert_eq!(stats.last_assessment.map(|t| t.timestamp()), Some(200));
    }
}
