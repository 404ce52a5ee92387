//! 评分、等级与改进建议

use std::collections::BTreeMap;

use crate::models::employability::{
    entities::{CATEGORIES, LevelInfo},
    requests::AnswerItem,
};

/// 满分
pub const MAX_SCORE: f64 = 5.0;

/// (等级, 下限, 上限, 名称, 说明)，区间两端均包含，取第一个命中的
const LEVELS: [(i32, f64, f64, &str, &str); 3] = [
    (
        1,
        0.0,
        2.5,
        "Entry Level",
        "Needs significant improvement in technical and professional skills",
    ),
    (
        2,
        2.5,
        3.5,
        "Internship Ready",
        "Suitable for internship positions with potential for growth",
    ),
    (
        3,
        3.5,
        5.0,
        "Job Ready",
        "Ready for professional roles with strong technical and soft skills",
    ),
];

fn level_info(entry: &(i32, f64, f64, &str, &str)) -> LevelInfo {
    LevelInfo {
        level: entry.0,
        title: entry.3.to_string(),
        description: entry.4.to_string(),
    }
}

pub fn category_score(answers: &[AnswerItem]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    let correct = answers.iter().filter(|a| a.selected == a.correct).count();
    correct as f64 / answers.len() as f64 * MAX_SCORE
}

/// 对全部类别评分，未作答的类别记 0 分
pub fn score_categories(answers: &BTreeMap<String, Vec<AnswerItem>>) -> BTreeMap<String, f64> {
    CATEGORIES
        .iter()
        .map(|(category, _)| {
            let items = answers.get(*category).map(Vec::as_slice).unwrap_or_default();
            (category.to_string(), category_score(items))
        })
        .collect()
}

pub fn overall_score(scores: &BTreeMap<String, f64>) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}

/// 超出所有区间时按最低等级处理
pub fn level_for(score: f64) -> LevelInfo {
    let entry = LEVELS
        .iter()
        .find(|(_, min, max, _, _)| *min <= score && score <= *max)
        .unwrap_or(&LEVELS[0]);
    level_info(entry)
}

pub fn suggestions(scores: &BTreeMap<String, f64>, level: &LevelInfo) -> Vec<String> {
    let mut suggestions = vec![
        match level.level {
            1 => "Focus on building fundamental technical skills and professional competencies.",
            2 => "Work on strengthening your technical skills and gaining practical experience through internships.",
            _ => "Continue to enhance your skills and maintain professional development.",
        }
        .to_string(),
    ];
    for (category, score) in scores {
        if *score < 3.0 {
            suggestions.push(format!(
                "Consider improving your knowledge in {category}. Current score: {score:.1}/5"
            ));
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(usize, usize)]) -> Vec<AnswerItem> {
        pairs
            .iter()
            .map(|&(selected, correct)| AnswerItem { selected, correct })
            .collect()
    }

    #[test]
    fn test_category_score() {
        assert_eq!(category_score(&items(&[(0, 0), (1, 2), (3, 3), (2, 2)])), 3.75);
        assert_eq!(category_score(&[]), 0.0);
    }

    #[test]
    fn test_levels_use_first_inclusive_range() {
        assert_eq!(level_for(0.0).level, 1);
        assert_eq!(level_for(2.5).level, 1);
        assert_eq!(level_for(2.6).level, 2);
        assert_eq!(level_for(3.5).level, 2);
        assert_eq!(level_for(4.2).title, "Job Ready");
        assert_eq!(level_for(7.0).level, 1);
    }

    #[test]
    fn test_scores_and_suggestions() {
        let mut answers = BTreeMap::new();
        answers.insert("Database".to_string(), items(&[(1, 1), (0, 0)]));
        answers.insert("Security".to_string(), items(&[(1, 0), (0, 0)]));
        let scores = score_categories(&answers);
        assert_eq!(scores.len(), 10);
        assert_eq!(scores["Database"], 5.0);
        assert_eq!(scores["Security"], 2.5);
        assert_eq!(overall_score(&scores), 0.75);

        let level = level_for(overall_score(&scores));
        let suggestions = suggestions(&scores, &level);
        assert_eq!(
            suggestions[0],
            "Focus on building fundamental technical skills and professional competencies."
        );
        assert!(suggestions.contains(
            &"Consider improving your knowledge in Security. Current score: 2.5/5".to_string()
        ));
        assert!(!suggestions.iter().any(|s| s.contains("Database")));
        assert_eq!(suggestions.len(), 10);
    }
}
