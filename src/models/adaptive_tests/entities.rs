use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// 每次测试覆盖的能力领域，每个领域一道题
pub const COMPETENCY_DOMAINS: [&str; 10] = [
    "Problem Solving",
    "Critical Thinking",
    "Analytical Skills",
    "Technical Knowledge",
    "Communication",
    "Time Management",
    "Data Analysis",
    "Logical Reasoning",
    "Creative Thinking",
    "Decision Making",
];

pub const DIFFICULTY_LEVELS: [&str; 3] = ["Easy", "Medium", "Hard"];

pub const BLOOM_LEVELS: [&str; 6] = [
    "Remember",
    "Understand",
    "Apply",
    "Analyze",
    "Evaluate",
    "Create",
];

/// 课程目标到毕业要求的映射及权重
pub const CO_PO_MAPPING: [(&str, &str, f64); 5] = [
    ("CO1", "PO1", 0.8),
    ("CO2", "PO2", 0.7),
    ("CO3", "PO3", 0.9),
    ("CO4", "PO4", 0.6),
    ("CO5", "PO5", 0.8),
];

pub const ANSWER_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

/// 难度权重，未知难度按 0 计
pub fn difficulty_weight(difficulty: &str) -> f64 {
    match difficulty {
        "Easy" => 0.3,
        "Medium" => 0.6,
        "Hard" => 0.9,
        _ => 0.0,
    }
}

/// 第 `index` 道题对应的课程目标（CO1..CO5 循环）
pub fn course_outcome_for(index: usize) -> String {
    format!("CO{}", index % CO_PO_MAPPING.len() + 1)
}

// 测试题目（包含答案，仅服务端保存）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestQuestion {
    pub id: u32,
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub competency_domain: String,
    pub difficulty: String,
    pub bloom_level: String,
    pub course_outcome: String,
}

// 提供给考生的题目视图，不含答案与解析
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct QuestionView {
    pub id: u32,
    pub index: usize,
    pub total: usize,
    pub content: String,
    pub options: Vec<String>,
    pub competency_domain: String,
    pub difficulty: String,
    pub bloom_level: String,
}

impl QuestionView {
    pub fn from_question(question: &TestQuestion, index: usize, total: usize) -> Self {
        Self {
            id: question.id,
            index,
            total,
            content: question.content.clone(),
            options: question.options.clone(),
            competency_domain: question.competency_domain.clone(),
            difficulty: question.difficulty.clone(),
            bloom_level: question.bloom_level.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestAnswer {
    pub question_id: u32,
    pub answer: String,
    pub correct: bool,
    /// 作答耗时（秒）
    pub time_spent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct CoAttainment {
    pub co: String,
    pub po: String,
    pub mapping_level: f64,
    pub performance: f64,
    pub attainment: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct BloomStats {
    pub count: u32,
    pub correct: u32,
    pub performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct Recommendation {
    pub category: String,
    pub message: String,
}

// 测试结果分析
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct PerformanceAnalysis {
    pub total_questions: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub performance_percentage: f64,
    pub average_difficulty: f64,
    pub domain_distribution: BTreeMap<String, u32>,
    pub competency_analysis: BTreeMap<String, f64>,
    pub co_po_mapping: Vec<CoAttainment>,
    pub blooms_analysis: BTreeMap<String, BloomStats>,
    pub domain_times: BTreeMap<String, f64>,
    /// `HH:MM:SS`
    pub duration: String,
    pub recommendations: Vec<Recommendation>,
}

// 测试会话
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestSession {
    pub id: i64,
    pub user_id: i64,
    pub questions: Vec<TestQuestion>,
    pub answers: Vec<TestAnswer>,
    pub current_index: i32,
    pub total_questions: i32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub analysis: Option<PerformanceAnalysis>,
}

// 会话摘要（历史列表使用）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestSessionSummary {
    pub id: i64,
    pub total_questions: i32,
    pub questions_answered: i32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub performance_percentage: Option<f64>,
}

impl From<&TestSession> for TestSessionSummary {
    fn from(session: &TestSession) -> Self {
        Self {
            id: session.id,
            total_questions: session.total_questions,
            questions_answered: session.answers.len() as i32,
            started_at: session.started_at,
            completed: session.completed,
            completed_at: session.completed_at,
            performance_percentage: session
                .analysis
                .as_ref()
                .map(|a| a.performance_percentage),
        }
    }
}

/// 格式化为 `HH:MM:SS`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_weight() {
        assert_eq!(difficulty_weight("Easy"), 0.3);
        assert_eq!(difficulty_weight("Hard"), 0.9);
        assert_eq!(difficulty_weight("unknown"), 0.0);
    }

    #[test]
    fn test_course_outcome_cycles() {
        assert_eq!(course_outcome_for(0), "CO1");
        assert_eq!(course_outcome_for(4), "CO5");
        assert_eq!(course_outcome_for(5), "CO1");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_duration(-5), "00:00:00");
    }
}
