//! 试卷生成的纯文本部分：往年题提取、提示词构造、模型输出解析

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::materials::entities::truncate_chars;
use crate::models::question_papers::entities::{
    Difficulty, DifficultyDistribution, GeneratedQuestion, PaperContent, PaperSection,
    PaperTemplate, SectionType,
};

/// 提示词中最多列出的往年题数量
pub const MAX_PROMPT_PAST_QUESTIONS: usize = 15;
/// 用户提示词中大纲文本的截断长度
pub const SYLLABUS_PROMPT_LIMIT: usize = 4000;
const PAST_QUESTION_LIMIT: usize = 500;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Q\s*\d+\.?|Question\s*\d*:?|Part\s*[A-Z]\s*\(.*?\):?").unwrap()
});
// 题目正文在下一个题号处结束
static QUESTION_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Q\s*\d+|Question\s*\d+|Part\s*[A-Z]\s*\(").unwrap());
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.*?)\*\*").unwrap());
static MARKS_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\s*Marks\]").unwrap());
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());
static LEADING_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*?\]\s*").unwrap());
static OPTION_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)([a-z]\))").unwrap());

fn clean_past_question(raw: &str) -> String {
    let without_tags = BRACKETED.replace_all(raw, "");
    let collapsed = without_tags.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, PAST_QUESTION_LIMIT).to_string()
}

/// 从往年试卷文本中切出题目
pub fn extract_past_questions(text: &str) -> Vec<String> {
    let mut questions = Vec::new();
    let mut pos = 0;
    while let Some(marker) = QUESTION_MARKER.find_at(text, pos) {
        let body_start = marker.end();
        let body_end = QUESTION_BOUNDARY
            .find_at(text, body_start)
            .map(|m| m.start())
            .unwrap_or(text.len());
        let question = clean_past_question(&text[body_start..body_end]);
        if !question.is_empty() {
            questions.push(question);
        }
        pos = body_end.max(marker.end());
    }
    questions
}

/// 系统提示词：结构、格式、质量要求、难度比例与需要避开的往年题
pub fn build_system_prompt(
    template: &PaperTemplate,
    difficulty: &DifficultyDistribution,
    past_questions: &[String],
) -> String {
    let structure = template
        .sections
        .iter()
        .map(|s| {
            format!(
                "**{} ({}):**\n- Number of questions: {}\n- Marks per question: {}\n- Total marks: {}",
                s.name,
                s.section_type.title(),
                s.num_questions,
                s.marks_per_question,
                s.total_marks()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = format!(
        "You are an AI specialized in generating academic question papers.\n\
Follow these guidelines strictly:\n\n\
**Paper Structure:**\n{structure}\n\n\
**Formatting Rules:**\n\
1. Start each section with the section name in bold, e.g. **Part A**\n\
2. List questions with bullet points (-)\n\
3. For sub-questions use a) and b)\n\
4. Explicitly include marks allocation in brackets [X Marks]\n\
5. Keep questions concise but unambiguous\n\
6. Label each question with its difficulty level [Easy/Medium/Hard]\n\n\
**Quality Requirements:**\n\
1. Questions must be unambiguous and academically rigorous\n\
2. Cover all major topics from the source material\n\
3. Include appropriate technical terms\n\
4. Follow the specified difficulty distribution\n\n\
**Difficulty Distribution:**\n\
- Easy Questions: {}%\n\
- Medium Questions: {}%\n\
- Hard Questions: {}%\n",
        difficulty.easy, difficulty.medium, difficulty.hard
    );

    if !past_questions.is_empty() {
        let samples = past_questions
            .iter()
            .take(MAX_PROMPT_PAST_QUESTIONS)
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!(
            "\n**Avoidance Requirements:**\n\
Do not create questions similar to these past questions:\n{samples}\n\n\
**Additional Guidelines:**\n\
1. Ensure new questions are distinct in both content and phrasing\n\
2. Cover similar concepts but with different approaches\n\
3. Vary question types and formats\n"
        ));
    }
    prompt
}

pub fn build_user_prompt(syllabus: &str) -> String {
    format!(
        "Generate a comprehensive question paper from: {}",
        truncate_chars(syllabus, SYLLABUS_PROMPT_LIMIT)
    )
}

fn is_question_line(line: &str) -> bool {
    line.starts_with("- ")
        || line.starts_with("a)")
        || line.starts_with("b)")
        || line.starts_with(|c: char| c.is_ascii_digit())
}

fn take_difficulty(line: &mut String) -> Difficulty {
    for (tag, difficulty) in [
        ("[Easy]", Difficulty::Easy),
        ("[Medium]", Difficulty::Medium),
        ("[Hard]", Difficulty::Hard),
    ] {
        if line.contains(tag) {
            *line = line.replace(tag, "").trim().to_string();
            return difficulty;
        }
    }
    Difficulty::Medium
}

fn take_marks(line: &mut String) -> Option<f64> {
    let marks = MARKS_TAG
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())?;
    let cleaned = MARKS_TAG.replace_all(line, "").trim().to_string();
    *line = cleaned;
    Some(marks)
}

fn clean_question_text(line: &str) -> String {
    let line = line.strip_prefix("- ").unwrap_or(line);
    let line = LEADING_NUMBER.replace(line, "");
    LEADING_TAG.replace(&line, "").trim().to_string()
}

/// 选择题在第一个 `a)` 处拆分题干与选项，选项保留字母标号
fn split_choices(text: &str) -> (String, Vec<String>) {
    let labels: Vec<usize> = OPTION_LABEL
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.start()))
        .collect();
    let Some(first_a) = labels.iter().position(|&idx| text[idx..].starts_with("a)")) else {
        return (text.trim().to_string(), Vec::new());
    };

    let stem = text[..labels[first_a]].trim().to_string();
    let starts = &labels[first_a..];
    let options = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim().to_string()
        })
        .filter(|o| o.len() > 2)
        .collect();
    (stem, options)
}

fn section_slot<'a>(sections: &'a mut Vec<PaperSection>, name: &str) -> &'a mut PaperSection {
    let index = match sections.iter().position(|s| s.name == name) {
        Some(index) => index,
        None => {
            sections.push(PaperSection {
                name: name.to_string(),
                questions: Vec::new(),
            });
            sections.len() - 1
        }
    };
    &mut sections[index]
}

/// 将加粗标题匹配到模板小节名，允许附带 `(类型)` 或冒号
fn match_section_name(template: &PaperTemplate, header: &str) -> String {
    let header = header.trim().trim_end_matches(':').trim();
    template
        .sections
        .iter()
        .find(|s| {
            header == s.name
                || header
                    .strip_prefix(s.name.as_str())
                    .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('('))
        })
        .map(|s| s.name.clone())
        .unwrap_or_else(|| header.to_string())
}

/// 解析模型输出为按小节组织的题目
pub fn parse_generated_paper(text: &str, template: &PaperTemplate) -> PaperContent {
    let mut sections: Vec<PaperSection> = Vec::new();
    let mut current: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if let Some(caps) = SECTION_HEADER.captures(line) {
            let name = match_section_name(template, &caps[1]);
            section_slot(&mut sections, &name);
            current = Some(name);
            continue;
        }
        let Some(section_name) = current.as_deref() else {
            continue;
        };
        if line.is_empty() {
            continue;
        }

        let template_section = template.section(section_name);
        let section = section_slot(&mut sections, section_name);

        if !is_question_line(line) {
            if let Some(last) = section.questions.last_mut() {
                last.text.push(' ');
                last.text.push_str(line);
            }
            continue;
        }

        let mut line = line.to_string();
        let difficulty = take_difficulty(&mut line);
        let marks = take_marks(&mut line)
            .or_else(|| template_section.map(|s| s.marks_per_question))
            .unwrap_or(0.0);
        let cleaned = clean_question_text(&line);

        let question = if template_section
            .is_some_and(|s| s.section_type == SectionType::MultipleChoice)
        {
            let (stem, options) = split_choices(&cleaned);
            GeneratedQuestion {
                text: stem,
                difficulty,
                marks,
                options: Some(options),
            }
        } else {
            GeneratedQuestion {
                text: cleaned,
                difficulty,
                marks,
                options: None,
            }
        };
        section.questions.push(question);
    }

    PaperContent { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question_papers::entities::TemplateSection;

    fn template() -> PaperTemplate {
        PaperTemplate {
            id: 1,
            name: "Series".to_string(),
            institution: "KTU".to_string(),
            course: "B.Tech CSE".to_string(),
            subject: "Compiler Design".to_string(),
            total_marks: 30,
            duration_minutes: 90,
            sections: vec![
                TemplateSection {
                    name: "Part A".to_string(),
                    section_type: SectionType::ShortAnswer,
                    num_questions: 2,
                    marks_per_question: 3.0,
                },
                TemplateSection {
                    name: "Part B".to_string(),
                    section_type: SectionType::MultipleChoice,
                    num_questions: 2,
                    marks_per_question: 1.0,
                },
            ],
            created_by: 1,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_extract_past_questions() {
        let text = "Q1. Define a token [3 Marks] Q2 Explain   LR parsing. \
                    Part B (Answer any one): Construct an LALR table.";
        let questions = extract_past_questions(text);
        assert_eq!(
            questions,
            vec![
                "Define a token".to_string(),
                "Explain LR parsing.".to_string(),
                "Construct an LALR table.".to_string(),
            ]
        );
    }

    #[test]
    fn test_past_questions_are_truncated() {
        let long = format!("Q1 {}", "x".repeat(800));
        let questions = extract_past_questions(&long);
        assert_eq!(questions[0].chars().count(), 500);
        assert!(extract_past_questions("no markers here").is_empty());
    }

    #[test]
    fn test_system_prompt_lists_sections_and_past_questions() {
        let past: Vec<String> = (1..=20).map(|i| format!("old question {i}")).collect();
        let prompt = build_system_prompt(&template(), &DifficultyDistribution::default(), &past);
        assert!(prompt.contains("**Part A (Short Answer):**"));
        assert!(prompt.contains("- Total marks: 6"));
        assert!(prompt.contains("- Easy Questions: 30%"));
        assert!(prompt.contains("- old question 15"));
        assert!(!prompt.contains("- old question 16"));

        let plain = build_system_prompt(&template(), &DifficultyDistribution::default(), &[]);
        assert!(!plain.contains("Avoidance Requirements"));
    }

    #[test]
    fn test_user_prompt_truncates_syllabus() {
        let prompt = build_user_prompt(&"s".repeat(5000));
        assert_eq!(
            prompt.len(),
            "Generate a comprehensive question paper from: ".len() + 4000
        );
    }

    #[test]
    fn test_parse_generated_paper() {
        let output = "Here is your paper.\n\
            **Part A**\n\
            - [Easy] Define a lexeme. [2 Marks]\n\
            explain with an example.\n\
            2. [Hard] Compare SLR and LALR parsers.\n\
            **Part B (Multiple Choice):**\n\
            - [Medium] Which phase builds the parse tree? a) Lexer b) Parser c) Linker d) Loader\n\
            **Appendix**\n\
            - Unlisted question";
        let content = parse_generated_paper(output, &template());

        assert_eq!(content.sections.len(), 3);
        let part_a = &content.sections[0];
        assert_eq!(part_a.name, "Part A");
        assert_eq!(part_a.questions.len(), 2);
        assert_eq!(part_a.questions[0].text, "Define a lexeme. explain with an example.");
        assert_eq!(part_a.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(part_a.questions[0].marks, 2.0);
        assert_eq!(part_a.questions[1].text, "Compare SLR and LALR parsers.");
        assert_eq!(part_a.questions[1].marks, 3.0);

        let part_b = &content.sections[1];
        assert_eq!(part_b.name, "Part B");
        let mcq = &part_b.questions[0];
        assert_eq!(mcq.text, "Which phase builds the parse tree?");
        assert_eq!(mcq.difficulty, Difficulty::Medium);
        assert_eq!(mcq.marks, 1.0);
        assert_eq!(
            mcq.options.as_deref().unwrap(),
            ["a) Lexer", "b) Parser", "c) Linker", "d) Loader"]
        );

        let appendix = &content.sections[2];
        assert_eq!(appendix.questions[0].marks, 0.0);
    }
}
