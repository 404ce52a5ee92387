use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// 评估类别及其说明
pub const CATEGORIES: [(&str, &str); 10] = [
    (
        "Web Development",
        "Questions about frontend and backend web technologies, frameworks, and best practices",
    ),
    (
        "Database",
        "Questions about database design, SQL, NoSQL, and data management",
    ),
    (
        "System Design",
        "Questions about system architecture, scalability, and design patterns",
    ),
    (
        "Security",
        "Questions about cybersecurity, authentication, and data protection",
    ),
    (
        "DevOps",
        "Questions about deployment, CI/CD, and infrastructure management",
    ),
    (
        "Communication",
        "Questions about technical communication, documentation, and team collaboration",
    ),
    (
        "Leadership",
        "Questions about technical leadership, project management, and team building",
    ),
    (
        "Teamwork",
        "Questions about collaborative development, code reviews, and pair programming",
    ),
    (
        "Job Readiness",
        "Questions about interview preparation, portfolio building, and career development",
    ),
    (
        "Problem Solving",
        "Questions about debugging, optimization, and analytical thinking",
    ),
];

pub fn category_description(name: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(category, _)| *category == name)
        .map(|(_, description)| *description)
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct CategoryInfo {
    pub name: String,
    pub description: String,
}

// 单选题，`correct` 为正确选项下标 (0-3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct EmployabilityQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
}

// 就业能力等级
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct LevelInfo {
    pub level: i32,
    pub title: String,
    pub description: String,
}

// 评估结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct EmployabilityResult {
    pub id: i64,
    pub user_id: i64,
    pub scores: BTreeMap<String, f64>,
    pub overall_score: f64,
    pub level: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct EmployabilityStats {
    pub total_assessments: u64,
    pub average_score: Option<f64>,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
    pub last_assessment: Option<chrono::DateTime<chrono::Utc>>,
}
