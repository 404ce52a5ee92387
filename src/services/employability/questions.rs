//! 类别题目：优先由模型生成，失败时使用内置题库

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{ChatOptions, LlmClient};
use crate::models::employability::entities::EmployabilityQuestion;

pub const QUESTIONS_PER_CATEGORY: usize = 5;

pub fn build_prompt(category: &str, description: &str) -> String {
    format!(
        r#"You are an expert technical interviewer. Generate {QUESTIONS_PER_CATEGORY} multiple-choice questions about {category} for a technical skills assessment.
Each question should test practical knowledge and real-world scenarios.
Format the response as a JSON array with the following structure:
[
    {{
        "question": "Question text",
        "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
        "correct": 0
    }}
]
"correct" is the index of the correct option (0-3).
Make the questions challenging but fair, and ensure they test practical knowledge.
Category description: {description}

Important guidelines:
1. Questions should be specific and technical
2. Options should be clear and distinct
3. Include at least one option that tests common misconceptions
4. Focus on practical scenarios rather than theoretical concepts
5. Ensure the correct answer is unambiguous"#
    )
}

/// 取第一个 `[` 到最后一个 `]` 之间的内容解析，丢弃不合格的题目
pub fn parse_questions(text: &str) -> Vec<EmployabilityQuestion> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    let parsed: Vec<EmployabilityQuestion> = match serde_json::from_str(&text[start..=end]) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Unparsable employability questions: {}", e);
            return Vec::new();
        }
    };
    parsed
        .into_iter()
        .filter(|q| !q.question.trim().is_empty() && q.options.len() == 4 && q.correct < 4)
        .collect()
}

pub async fn questions_for(
    llm: &Arc<dyn LlmClient>,
    category: &str,
    description: &str,
) -> Vec<EmployabilityQuestion> {
    let prompt = build_prompt(category, description);
    match llm
        .generate(
            &AppConfig::get().llm.generation_model,
            &prompt,
            false,
            &ChatOptions::from_config(),
        )
        .await
    {
        Ok(text) => {
            let questions = parse_questions(&text);
            if !questions.is_empty() {
                return questions;
            }
            tracing::warn!("No usable questions generated for {}, using defaults", category);
        }
        Err(e) => tracing::warn!("Error generating questions for {}: {}", category, e),
    }
    default_questions(category)
}

fn question(text: &str, options: [&str; 4], correct: usize) -> EmployabilityQuestion {
    EmployabilityQuestion {
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct,
    }
}

/// 内置题库
pub fn default_questions(category: &str) -> Vec<EmployabilityQuestion> {
    match category {
        "Web Development" => vec![
            question(
                "Which HTTP status code should an API return when a requested resource does not exist?",
                ["200", "301", "404", "500"],
                2,
            ),
            question(
                "What is the main purpose of CORS headers?",
                [
                    "Compress responses",
                    "Allow controlled cross-origin requests from browsers",
                    "Encrypt cookies",
                    "Cache static files",
                ],
                1,
            ),
        ],
        "Database" => vec![
            question(
                "Which SQL clause filters rows after aggregation?",
                ["WHERE", "GROUP BY", "HAVING", "ORDER BY"],
                2,
            ),
            question(
                "What does an index primarily improve?",
                ["Write throughput", "Read lookup speed", "Disk usage", "Backup time"],
                1,
            ),
        ],
        "System Design" => vec![
            question(
                "Which component spreads incoming traffic across several servers?",
                ["Load balancer", "Message queue", "CDN origin", "DNS resolver cache"],
                0,
            ),
            question(
                "What is a common way to reduce repeated expensive database reads?",
                ["Add more columns", "Introduce a cache", "Disable indexes", "Use larger pages"],
                1,
            ),
        ],
        "Security" => vec![
            question(
                "How should user passwords be stored?",
                [
                    "Plain text",
                    "Base64 encoded",
                    "Hashed with a slow salted algorithm",
                    "Encrypted with a shared key in code",
                ],
                2,
            ),
            question(
                "Which practice prevents SQL injection?",
                [
                    "Parameterized queries",
                    "String concatenation",
                    "Client-side validation only",
                    "Longer table names",
                ],
                0,
            ),
        ],
        "DevOps" => vec![
            question(
                "What does a CI pipeline typically run on every push?",
                ["Manual QA", "Automated build and tests", "Production migrations", "Log rotation"],
                1,
            ),
            question(
                "What is the benefit of containerizing an application?",
                [
                    "Consistent runtime environment",
                    "Automatic bug fixes",
                    "No need for configuration",
                    "Unlimited scaling for free",
                ],
                0,
            ),
        ],
        "Communication" => vec![
            question(
                "What makes a bug report most useful?",
                [
                    "Strong wording",
                    "Steps to reproduce and expected behaviour",
                    "Only a screenshot",
                    "Tagging everyone",
                ],
                1,
            ),
            question(
                "When explaining a design to non-technical stakeholders you should",
                [
                    "Use as much jargon as possible",
                    "Focus on impact and trade-offs",
                    "Skip the risks",
                    "Share only code",
                ],
                1,
            ),
        ],
        "Leadership" => vec![
            question(
                "A teammate keeps missing deadlines. The best first step is to",
                [
                    "Report them immediately",
                    "Talk privately to understand blockers",
                    "Reassign all their work",
                    "Ignore it",
                ],
                1,
            ),
            question(
                "What helps a team prioritise work effectively?",
                [
                    "Clear goals and a shared backlog",
                    "Starting everything at once",
                    "Avoiding planning",
                    "Letting the loudest person decide",
                ],
                0,
            ),
        ],
        "Teamwork" => vec![
            question(
                "What is the main goal of a code review?",
                [
                    "Find someone to blame",
                    "Improve code quality and share knowledge",
                    "Delay merges",
                    "Enforce personal style",
                ],
                1,
            ),
            question(
                "During pair programming the navigator should",
                [
                    "Check email",
                    "Review and guide while the driver types",
                    "Take over the keyboard constantly",
                    "Work on another task",
                ],
                1,
            ),
        ],
        "Job Readiness" => vec![
            question(
                "What should a strong project portfolio highlight?",
                [
                    "Only course names",
                    "Problems solved and your contribution",
                    "Number of lines written",
                    "Tools installed",
                ],
                1,
            ),
            question(
                "A good answer to a behavioural interview question follows",
                ["The STAR structure", "A memorised script", "One word", "A long digression"],
                0,
            ),
        ],
        "Problem Solving" => vec![
            question(
                "What is the first step when debugging an unexpected failure?",
                [
                    "Rewrite the module",
                    "Reproduce the problem reliably",
                    "Upgrade every dependency",
                    "Add random sleeps",
                ],
                1,
            ),
            question(
                "Binary search on a sorted array of n elements runs in",
                ["O(1)", "O(log n)", "O(n)", "O(n log n)"],
                1,
            ),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employability::entities::CATEGORIES;

    #[test]
    fn test_parse_questions_extracts_json_array() {
        let text = r#"Here are your questions:
[
  {"question": "What is 2+2?", "options": ["3", "4", "5", "6"], "correct": 1},
  {"question": "Broken", "options": ["a", "b"], "correct": 0},
  {"question": "Out of range", "options": ["a", "b", "c", "d"], "correct": 7}
]
Good luck!"#;
        let questions = parse_questions(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct, 1);
    }

    #[test]
    fn test_parse_questions_without_array() {
        assert!(parse_questions("no json here").is_empty());
        assert!(parse_questions("] backwards [").is_empty());
    }

    #[test]
    fn test_every_category_has_defaults() {
        for (category, _) in CATEGORIES {
            let defaults = default_questions(category);
            assert!(!defaults.is_empty(), "{category}");
            assert!(defaults.iter().all(|q| q.options.len() == 4 && q.correct < 4));
        }
    }
}
