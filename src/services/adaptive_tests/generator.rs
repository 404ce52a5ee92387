//! 测试题生成：每个能力领域一道题，随机难度与认知层次

use std::sync::Arc;

use dashmap::DashSet;
use once_cell::sync::Lazy;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::llm::{ChatOptions, LlmClient, strip_code_fences};
use crate::models::adaptive_tests::entities::{
    ANSWER_LETTERS, BLOOM_LEVELS, COMPETENCY_DOMAINS, DIFFICULTY_LEVELS, TestQuestion,
    course_outcome_for,
};

/// 单题最多尝试次数
pub const MAX_ATTEMPTS: usize = 3;

static GENERATING: Lazy<DashSet<i64>> = Lazy::new(DashSet::new);

/// 同一用户同时只允许一次生成，守卫释放时解除占用
pub struct GenerationGuard {
    user_id: i64,
}

impl GenerationGuard {
    pub fn acquire(user_id: i64) -> Option<Self> {
        GENERATING.insert(user_id).then_some(Self { user_id })
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        GENERATING.remove(&self.user_id);
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    content: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
}

pub struct QuestionSpec {
    pub domain: &'static str,
    pub difficulty: &'static str,
    pub bloom_level: &'static str,
}

/// 为每个领域随机选择难度和认知层次
pub fn plan_questions() -> Vec<QuestionSpec> {
    let mut rng = rand::rng();
    COMPETENCY_DOMAINS
        .iter()
        .map(|domain| QuestionSpec {
            domain,
            difficulty: DIFFICULTY_LEVELS[rng.random_range(0..DIFFICULTY_LEVELS.len())],
            bloom_level: BLOOM_LEVELS[rng.random_range(0..BLOOM_LEVELS.len())],
        })
        .collect()
}

pub fn build_question_prompt(spec: &QuestionSpec) -> String {
    format!(
        r#"You are an expert question generator for an adaptive testing system. Generate a multiple-choice question with the following specifications:

Competency Domain: {domain}
Difficulty Level: {difficulty}
Bloom's Taxonomy Level: {bloom}

Requirements:
1. The question should be clear, concise, and test the specified competency domain
2. Provide exactly 4 options (A, B, C, D)
3. Include one correct answer
4. The question should be challenging but fair for the specified difficulty level
5. The question should align with the specified Bloom's Taxonomy level
6. The options should be plausible and well-distributed
7. The explanation should be clear and educational

Format your response as a valid JSON object with the following structure:
{{
    "content": "The question text",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_answer": "A",
    "explanation": "Brief explanation of why the answer is correct",
    "competency_domain": "{domain}",
    "difficulty": "{difficulty}",
    "bloom_level": "{bloom}"
}}

Return ONLY the JSON object, no additional text."#,
        domain = spec.domain,
        difficulty = spec.difficulty,
        bloom = spec.bloom_level,
    )
}

/// 校验模型输出，不合格返回 `None`
pub fn parse_question(raw: &str, spec: &QuestionSpec, index: usize) -> Option<TestQuestion> {
    let generated: GeneratedQuestion = serde_json::from_str(strip_code_fences(raw)).ok()?;
    let answer = generated.correct_answer.trim().to_uppercase();
    if generated.content.trim().is_empty()
        || generated.options.len() != ANSWER_LETTERS.len()
        || !ANSWER_LETTERS.contains(&answer.as_str())
    {
        return None;
    }
    Some(TestQuestion {
        id: index as u32 + 1,
        content: generated.content.trim().to_string(),
        options: generated.options,
        correct_answer: answer,
        explanation: generated.explanation,
        competency_domain: spec.domain.to_string(),
        difficulty: spec.difficulty.to_string(),
        bloom_level: spec.bloom_level.to_string(),
        course_outcome: course_outcome_for(index),
    })
}

/// 逐题生成；模型不可用时立即返回错误，输出不合格的题目重试后跳过
pub async fn generate_questions(llm: &Arc<dyn LlmClient>) -> Result<Vec<TestQuestion>> {
    let model = &AppConfig::get().llm.generation_model;
    let options = ChatOptions::from_config();
    let mut questions = Vec::with_capacity(COMPETENCY_DOMAINS.len());

    for (index, spec) in plan_questions().iter().enumerate() {
        let prompt = build_question_prompt(spec);
        let mut generated = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let raw = llm.generate(model, &prompt, true, &options).await?;
            if let Some(question) = parse_question(&raw, spec, index) {
                generated = Some(question);
                break;
            }
            warn!(
                "Invalid question for {} (attempt {}/{})",
                spec.domain, attempt, MAX_ATTEMPTS
            );
        }
        match generated {
            Some(question) => questions.push(question),
            None => warn!("Giving up on question {} ({})", index + 1, spec.domain),
        }
    }

    info!("Generated {} adaptive test questions", questions.len());
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> QuestionSpec {
        QuestionSpec {
            domain: "Logical Reasoning",
            difficulty: "Hard",
            bloom_level: "Analyze",
        }
    }

    #[test]
    fn test_parse_question_accepts_fenced_json() {
        let raw = "```json\n{\"content\":\"Which comes next: 2, 4, 8?\",\"options\":[\"10\",\"12\",\"16\",\"18\"],\"correct_answer\":\"c\",\"explanation\":\"Doubling\"}\n```";
        let question = parse_question(raw, &spec(), 7).unwrap();
        assert_eq!(question.id, 8);
        assert_eq!(question.correct_answer, "C");
        assert_eq!(question.course_outcome, "CO3");
        assert_eq!(question.difficulty, "Hard");
    }

    #[test]
    fn test_parse_question_rejects_invalid_output() {
        let three_options = r#"{"content":"Q","options":["a","b","c"],"correct_answer":"A","explanation":""}"#;
        assert!(parse_question(three_options, &spec(), 0).is_none());
        let bad_answer = r#"{"content":"Q","options":["a","b","c","d"],"correct_answer":"E","explanation":""}"#;
        assert!(parse_question(bad_answer, &spec(), 0).is_none());
        let missing = r#"{"content":"Q","options":["a","b","c","d"]}"#;
        assert!(parse_question(missing, &spec(), 0).is_none());
    }

    #[test]
    fn test_plan_covers_each_domain_once() {
        let plan = plan_questions();
        assert_eq!(plan.len(), 10);
        assert_eq!(plan[0].domain, "Problem Solving");
        assert!(plan.iter().all(|s| DIFFICULTY_LEVELS.contains(&s.difficulty)));
        assert!(plan.iter().all(|s| BLOOM_LEVELS.contains(&s.bloom_level)));
    }

    #[test]
    fn test_generation_guard_is_exclusive_per_user() {
        let guard = GenerationGuard::acquire(4242).unwrap();
        assert!(GenerationGuard::acquire(4242).is_none());
        assert!(GenerationGuard::acquire(4243).is_some());
        drop(guard);
        assert!(GenerationGuard::acquire(4242).is_some());
    }
}
