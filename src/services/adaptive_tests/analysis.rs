//! 测试结果分析与学习建议

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{ChatOptions, LlmClient};
use crate::models::adaptive_tests::entities::{
    BLOOM_LEVELS, BloomStats, CO_PO_MAPPING, CoAttainment, PerformanceAnalysis, Recommendation,
    TestSession, difficulty_weight, format_duration,
};

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// 统计作答结果，不含学习建议
pub fn analyze(
    session: &TestSession,
    finished_at: chrono::DateTime<chrono::Utc>,
) -> PerformanceAnalysis {
    let total = session.questions.len() as u32;
    let is_correct = |question_id: u32| {
        session
            .answers
            .iter()
            .any(|a| a.question_id == question_id && a.correct)
    };

    let correct_answers = session.answers.iter().filter(|a| a.correct).count() as u32;
    let accuracy = ratio(correct_answers, total);

    let weights: Vec<f64> = session
        .questions
        .iter()
        .map(|q| difficulty_weight(&q.difficulty))
        .filter(|w| *w > 0.0)
        .collect();
    let average_difficulty = if weights.is_empty() {
        0.0
    } else {
        weights.iter().sum::<f64>() / weights.len() as f64
    };

    let mut domain_distribution: BTreeMap<String, u32> = BTreeMap::new();
    let mut domain_correct: BTreeMap<String, u32> = BTreeMap::new();
    let mut domain_times: BTreeMap<String, f64> = BTreeMap::new();
    let mut blooms_analysis: BTreeMap<String, BloomStats> = BLOOM_LEVELS
        .iter()
        .map(|level| (level.to_string(), BloomStats::default()))
        .collect();
    let mut co_correct: BTreeMap<&str, u32> = BTreeMap::new();

    for question in &session.questions {
        let domain = question.competency_domain.clone();
        *domain_distribution.entry(domain.clone()).or_default() += 1;
        let correct = is_correct(question.id);
        let spent: f64 = session
            .answers
            .iter()
            .filter(|a| a.question_id == question.id)
            .map(|a| a.time_spent)
            .sum();
        *domain_times.entry(domain.clone()).or_default() += spent;

        let bloom = blooms_analysis.entry(question.bloom_level.clone()).or_default();
        bloom.count += 1;
        if correct {
            bloom.correct += 1;
            *domain_correct.entry(domain).or_default() += 1;
            *co_correct.entry(question.course_outcome.as_str()).or_default() += 1;
        }
    }

    for stats in blooms_analysis.values_mut() {
        stats.performance = ratio(stats.correct, stats.count);
    }

    let competency_analysis = domain_distribution
        .iter()
        .map(|(domain, count)| {
            let correct = domain_correct.get(domain).copied().unwrap_or(0);
            (domain.clone(), ratio(correct, *count) * 100.0)
        })
        .collect();

    let co_po_mapping = CO_PO_MAPPING
        .iter()
        .map(|(co, po, weight)| {
            let performance = ratio(co_correct.get(co).copied().unwrap_or(0), total);
            CoAttainment {
                co: co.to_string(),
                po: po.to_string(),
                mapping_level: *weight,
                performance,
                attainment: weight * performance,
            }
        })
        .collect();

    PerformanceAnalysis {
        total_questions: total,
        questions_answered: session.answers.len() as u32,
        correct_answers,
        accuracy,
        performance_percentage: accuracy * 100.0,
        average_difficulty,
        domain_distribution,
        competency_analysis,
        co_po_mapping,
        blooms_analysis,
        domain_times,
        duration: format_duration((finished_at - session.started_at).num_seconds()),
        recommendations: Vec::new(),
    }
}

pub fn recommendation_prompt(analysis: &PerformanceAnalysis) -> String {
    let competencies = analysis
        .competency_analysis
        .iter()
        .map(|(domain, pct)| format!("{domain}: {pct:.0}%"))
        .collect::<Vec<_>>()
        .join(", ");
    let blooms = analysis
        .blooms_analysis
        .iter()
        .filter(|(_, s)| s.count > 0)
        .map(|(level, s)| format!("{level}: {}/{}", s.correct, s.count))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Based on the following performance analysis, provide detailed learning recommendations:\n\n\
         Overall Performance: {:.2}%\n\
         Average Difficulty: {:.2}%\n\n\
         Competency Analysis:\n{competencies}\n\n\
         Bloom's Analysis:\n{blooms}\n\n\
         Format your response as a list of recommendations, each with a category and message.\n\
         Write each category on its own line ending with a colon, followed by its message.\n\
         Categories should include: Overall Performance, Learning Strategy, Skill Development, and Next Steps.\n\
         Provide specific, actionable advice for improvement.",
        analysis.accuracy * 100.0,
        analysis.average_difficulty * 100.0,
    )
}

fn fallback_recommendations(accuracy: f64) -> Vec<Recommendation> {
    vec![
        Recommendation {
            category: "Overall Performance".to_string(),
            message: format!(
                "Your overall performance is {:.2}%. Focus on areas where your score is below 70%.",
                accuracy * 100.0
            ),
        },
        Recommendation {
            category: "Learning Strategy".to_string(),
            message: "Review the topics where you scored lowest and practice with additional questions."
                .to_string(),
        },
    ]
}

/// 以冒号结尾的行开始一个新类别，其后各行拼接为该类别的建议
pub fn parse_recommendations(text: &str, accuracy: f64) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let mut category: Option<String> = None;
    let mut message: Vec<&str> = Vec::new();

    let mut flush = |category: &Option<String>, message: &mut Vec<&str>| {
        if let Some(category) = category {
            if !message.is_empty() {
                recommendations.push(Recommendation {
                    category: category.clone(),
                    message: message.join(" "),
                });
            }
        }
        message.clear();
    };

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let heading = line.trim_matches(|c| c == '*' || c == '#' || c == ' ');
        if let Some(name) = heading.strip_suffix(':') {
            flush(&category, &mut message);
            category = Some(name.trim().to_string());
        } else {
            message.push(line);
        }
    }
    flush(&category, &mut message);

    if recommendations.is_empty() {
        fallback_recommendations(accuracy)
    } else {
        recommendations
    }
}

/// 模型不可用时给出通用建议
pub async fn recommend(
    llm: &Arc<dyn LlmClient>,
    analysis: &PerformanceAnalysis,
) -> Vec<Recommendation> {
    let prompt = recommendation_prompt(analysis);
    match llm
        .generate(
            &AppConfig::get().llm.chat_model,
            &prompt,
            false,
            &ChatOptions::from_config(),
        )
        .await
    {
        Ok(text) => parse_recommendations(&text, analysis.accuracy),
        Err(e) => {
            tracing::warn!("Error generating recommendations: {}", e);
            vec![Recommendation {
                category: "General Advice".to_string(),
                message: "Continue practicing and focus on areas where you feel less confident."
                    .to_string(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::adaptive_tests::entities::{TestAnswer, TestQuestion, course_outcome_for};
    use chrono::{Duration, Utc};

    fn question(id: u32, domain: &str, difficulty: &str, bloom: &str) -> TestQuestion {
        TestQuestion {
            id,
            content: format!("Q{id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "A".to_string(),
            explanation: String::new(),
            competency_domain: domain.to_string(),
            difficulty: difficulty.to_string(),
            bloom_level: bloom.to_string(),
            course_outcome: course_outcome_for(id as usize - 1),
        }
    }

    fn answer(question_id: u32, correct: bool, time_spent: f64) -> TestAnswer {
        TestAnswer {
            question_id,
            answer: if correct { "A" } else { "B" }.to_string(),
            correct,
            time_spent,
        }
    }

    #[test]
    fn test_analyze_session() {
        let started = Utc::now();
        let session = TestSession {
            id: 1,
            user_id: 1,
            questions: vec![
                question(1, "Communication", "Easy", "Remember"),
                question(2, "Communication", "Hard", "Apply"),
                question(3, "Data Analysis", "Medium", "Apply"),
                question(4, "Decision Making", "Hard", "Create"),
            ],
            answers: vec![answer(1, true, 10.0), answer(2, false, 20.5), answer(3, true, 5.0)],
            current_index: 3,
            total_questions: 4,
            started_at: started,
            completed: false,
            completed_at: None,
            analysis: None,
        };
        let analysis = analyze(&session, started + Duration::seconds(3725));

        assert_eq!(analysis.correct_answers, 2);
        assert_eq!(analysis.questions_answered, 3);
        assert_eq!(analysis.accuracy, 0.5);
        assert_eq!(analysis.performance_percentage, 50.0);
        assert!((analysis.average_difficulty - 0.675).abs() < 1e-9);
        assert_eq!(analysis.domain_distribution["Communication"], 2);
        assert_eq!(analysis.competency_analysis["Communication"], 50.0);
        assert_eq!(analysis.competency_analysis["Decision Making"], 0.0);
        assert_eq!(analysis.domain_times["Communication"], 30.5);
        assert_eq!(analysis.domain_times["Decision Making"], 0.0);
        assert_eq!(analysis.blooms_analysis["Apply"].count, 2);
        assert_eq!(analysis.blooms_analysis["Apply"].performance, 0.5);
        assert_eq!(analysis.blooms_analysis["Evaluate"].count, 0);
        assert_eq!(analysis.duration, "01:02:05");

        let co1 = &analysis.co_po_mapping[0];
        assert_eq!((co1.co.as_str(), co1.po.as_str()), ("CO1", "PO1"));
        assert_eq!(co1.performance, 0.25);
        assert!((co1.attainment - 0.2).abs() < 1e-9);
        assert_eq!(analysis.co_po_mapping[1].performance, 0.0);
    }

    #[test]
    fn test_parse_recommendations() {
        let text = "**Overall Performance:**\nGood start.\nKeep going.\n\nNext Steps:\nPractice daily.\nOrphan:\n";
        let recs = parse_recommendations(text, 0.5);
        assert_eq!(
            recs,
            vec![
                Recommendation {
                    category: "Overall Performance".to_string(),
                    message: "Good start. Keep going.".to_string()
                },
                Recommendation {
                    category: "Next Steps".to_string(),
                    message: "Practice daily.".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_recommendations_fallback() {
        let recs = parse_recommendations("Just keep studying.", 0.456);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].category, "Overall Performance");
        assert_eq!(
            recs[0].message,
            "Your overall performance is 45.60%. Focus on areas where your score is below 70%."
        );
        assert_eq!(recs[1].category, "Learning Strategy");
    }
}
