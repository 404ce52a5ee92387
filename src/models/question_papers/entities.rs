use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use ts_rs::TS;

// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    ShortAnswer,
    LongAnswer,
    MultipleChoice,
}

impl SectionType {
    /// 提示词中使用的标题形式，例如 `Short Answer`
    pub fn title(&self) -> &'static str {
        match self {
            SectionType::ShortAnswer => "Short Answer",
            SectionType::LongAnswer => "Long Answer",
            SectionType::MultipleChoice => "Multiple Choice",
        }
    }
}

// 试卷模板中的一个部分
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct TemplateSection {
    pub name: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub num_questions: u32,
    pub marks_per_question: f64,
}

impl TemplateSection {
    pub fn total_marks(&self) -> f64 {
        self.num_questions as f64 * self.marks_per_question
    }
}

// 试卷模板
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct PaperTemplate {
    pub id: i64,
    pub name: String,
    pub institution: String,
    pub course: String,
    pub subject: String,
    pub total_marks: i32,
    pub duration_minutes: i32,
    pub sections: Vec<TemplateSection>,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PaperTemplate {
    pub fn section(&self, name: &str) -> Option<&TemplateSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

// 难度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{s}")
    }
}

// 难度分布（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct DifficultyDistribution {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for DifficultyDistribution {
    fn default() -> Self {
        Self {
            easy: 30,
            medium: 40,
            hard: 30,
        }
    }
}

impl DifficultyDistribution {
    pub fn is_valid(&self) -> bool {
        self.easy + self.medium + self.hard == 100
    }
}

// 生成的单道题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct GeneratedQuestion {
    pub text: String,
    pub difficulty: Difficulty,
    pub marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

// 试卷的一个部分，保留模型输出的顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct PaperSection {
    pub name: String,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct PaperContent {
    pub sections: Vec<PaperSection>,
}

// 单道题目的编辑内容
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct QuestionEdit {
    pub text: Option<String>,
    pub marks: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub options: Option<Vec<String>>,
}

impl PaperContent {
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// 应用编辑，返回实际修改的题目数量。未知部分和越界下标被忽略。
    pub fn apply_edits(&mut self, edits: &HashMap<String, BTreeMap<usize, QuestionEdit>>) -> usize {
        let mut applied = 0;
        for section in &mut self.sections {
            let Some(section_edits) = edits.get(&section.name) else {
                continue;
            };
            for (index, edit) in section_edits {
                let Some(question) = section.questions.get_mut(*index) else {
                    continue;
                };
                if let Some(text) = &edit.text {
                    question.text = text.trim().to_string();
                }
                if let Some(marks) = edit.marks {
                    question.marks = marks;
                }
                if let Some(difficulty) = edit.difficulty {
                    question.difficulty = difficulty;
                }
                if let Some(options) = &edit.options {
                    question.options = Some(options.clone());
                }
                applied += 1;
            }
        }
        applied
    }
}

// 生成的试卷
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct QuestionPaper {
    pub id: i64,
    pub template_id: i64,
    pub title: String,
    pub content: PaperContent,
    pub difficulty_distribution: DifficultyDistribution,
    pub generated_by: i64,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub is_edited: bool,
    pub last_edited_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> PaperContent {
        PaperContent {
            sections: vec![PaperSection {
                name: "Part A".to_string(),
                questions: vec![GeneratedQuestion {
                    text: "Define entropy.".to_string(),
                    difficulty: Difficulty::Easy,
                    marks: 3.0,
                    options: None,
                }],
            }],
        }
    }

    #[test]
    fn test_default_distribution_is_valid() {
        let d = DifficultyDistribution::default();
        assert_eq!((d.easy, d.medium, d.hard), (30, 40, 30));
        assert!(d.is_valid());
        assert!(
            !DifficultyDistribution {
                easy: 50,
                medium: 50,
                hard: 10
            }
            .is_valid()
        );
    }

    #[test]
    fn test_section_type_serde() {
        let t: SectionType = serde_json::from_str("\"multiple_choice\"").unwrap();
        assert_eq!(t, SectionType::MultipleChoice);
        assert_eq!(SectionType::LongAnswer.title(), "Long Answer");
    }

    #[test]
    fn test_apply_edits_ignores_out_of_range() {
        let mut content = sample_content();
        let mut part_a = BTreeMap::new();
        part_a.insert(
            0,
            QuestionEdit {
                text: Some(" Define enthalpy. ".to_string()),
                marks: Some(4.0),
                ..Default::default()
            },
        );
        part_a.insert(7, QuestionEdit::default());
        let mut edits = HashMap::new();
        edits.insert("Part A".to_string(), part_a);
        edits.insert("Part Z".to_string(), BTreeMap::new());

        assert_eq!(content.apply_edits(&edits), 1);
        let q = &content.sections[0].questions[0];
        assert_eq!(q.text, "Define enthalpy.");
        assert_eq!(q.marks, 4.0);
        assert_eq!(q.difficulty, Difficulty::Easy);
    }
}
