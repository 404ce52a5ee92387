//! PDF 文本提取与试卷渲染（lopdf）

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::warn;

use crate::errors::Result;
use crate::models::question_papers::entities::{PaperTemplate, QuestionPaper};

/// 提取全部页面文本：每页压缩空白，页与页之间以空格连接
///
/// 单页解析失败时跳过该页，文档本身无法解析时返回错误。
pub fn extract_text(data: &[u8]) -> Result<String> {
    let doc = Document::load_mem(data)?;
    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => {
                let collapsed = collapse_whitespace(&text);
                if !collapsed.is_empty() {
                    pages.push(collapsed);
                }
            }
            Err(e) => warn!("PDF 第 {} 页文本提取失败: {}", page_number, e),
        }
    }
    Ok(pages.join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 分值显示：整数不带小数
pub fn format_marks(marks: f64) -> String {
    if marks.fract() == 0.0 {
        format!("{}", marks as i64)
    } else {
        format!("{marks}")
    }
}

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const BODY_SIZE: i64 = 11;
const LINE_HEIGHT: i64 = 15;
const WRAP_COLUMNS: usize = 92;

/// 一行排版指令
struct Line {
    text: String,
    size: i64,
    indent: i64,
    gap_before: i64,
}

impl Line {
    fn body(text: impl Into<String>, indent: i64) -> Self {
        Self {
            text: text.into(),
            size: BODY_SIZE,
            indent,
            gap_before: 0,
        }
    }
}

/// 按试卷内容排版出的行
fn paper_lines(template: &PaperTemplate, paper: &QuestionPaper) -> Vec<Line> {
    let mut lines = vec![
        Line {
            text: paper.title.clone(),
            size: 16,
            indent: 0,
            gap_before: 0,
        },
        Line::body(format!("Course: {}", template.course), 0),
        Line::body(
            format!("Date: {}", paper.generated_at.format("%Y-%m-%d")),
            0,
        ),
        Line::body(
            format!(
                "Duration: {} minutes  Total Marks: {}",
                template.duration_minutes, template.total_marks
            ),
            0,
        ),
    ];

    for section in &paper.content.sections {
        lines.push(Line {
            text: section.name.clone(),
            size: 13,
            indent: 0,
            gap_before: 12,
        });
        for question in &section.questions {
            let text = format!(
                "\u{2022} {} [{} Marks]",
                question.text,
                format_marks(question.marks)
            );
            for (i, chunk) in wrap(&text, WRAP_COLUMNS).into_iter().enumerate() {
                lines.push(Line::body(chunk, if i == 0 { 0 } else { 10 }));
            }
            for option in question.options.iter().flatten() {
                for chunk in wrap(option, WRAP_COLUMNS - 6) {
                    lines.push(Line::body(chunk, 24));
                }
            }
        }
    }
    lines
}

/// 按词折行
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Helvetica 使用 WinAnsi 编码，无法表示的字符替换为 `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// 渲染试卷 PDF
pub fn render_question_paper(template: &PaperTemplate, paper: &QuestionPaper) -> Result<Vec<u8>> {
    render_lines(&paper_lines(template, paper))
}

fn render_lines(lines: &[Line]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    // 分页
    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops: Vec<Operation> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        let needed = line.gap_before + line.size.max(LINE_HEIGHT);
        if y - needed < MARGIN && !ops.is_empty() {
            pages.push(std::mem::take(&mut ops));
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= needed;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), line.size.into()]));
        ops.push(Operation::new(
            "Td",
            vec![(MARGIN + line.indent).into(), y.into()],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&line.text))],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    pages.push(ops);

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// 测试用：逐行写入文本的 PDF
#[cfg(test)]
pub(crate) fn text_pdf(lines: &[&str]) -> Vec<u8> {
    let lines: Vec<Line> = lines.iter().map(|l| Line::body(*l, 0)).collect();
    render_lines(&lines).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question_papers::entities::{
        Difficulty, DifficultyDistribution, GeneratedQuestion, PaperContent, PaperSection,
        SectionType, TemplateSection,
    };

    fn sample() -> (PaperTemplate, QuestionPaper) {
        let now = chrono::Utc::now();
        let template = PaperTemplate {
            id: 1,
            name: "Series".to_string(),
            institution: "KTU".to_string(),
            course: "B.Tech CSE".to_string(),
            subject: "Compiler Design".to_string(),
            total_marks: 20,
            duration_minutes: 60,
            sections: vec![TemplateSection {
                name: "Part A".to_string(),
                section_type: SectionType::MultipleChoice,
                num_questions: 2,
                marks_per_question: 2.0,
            }],
            created_by: 1,
            created_at: now,
        };
        let paper = QuestionPaper {
            id: 1,
            template_id: 1,
            title: "Compiler Design - 2025-03-01".to_string(),
            content: PaperContent {
                sections: vec![PaperSection {
                    name: "Part A".to_string(),
                    questions: vec![GeneratedQuestion {
                        text: "Which phase builds the parse tree?".to_string(),
                        difficulty: Difficulty::Easy,
                        marks: 2.0,
                        options: Some(vec!["a) Lexer".to_string(), "b) Parser".to_string()]),
                    }],
                }],
            },
            difficulty_distribution: DifficultyDistribution::default(),
            generated_by: 1,
            generated_at: now,
            is_edited: false,
            last_edited_at: None,
        };
        (template, paper)
    }

    #[test]
    fn test_render_then_extract() {
        let (template, paper) = sample();
        let bytes = render_question_paper(&template, &paper).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("Compiler Design - 2025-03-01"));
        assert!(text.contains("Duration: 60 minutes"));
        assert!(text.contains("[2 Marks]"));
    }

    #[test]
    fn test_extract_rejects_non_pdf() {
        assert!(extract_text(b"plain text, not a pdf").is_err());
    }

    #[test]
    fn test_wrap_respects_columns() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn test_format_marks() {
        assert_eq!(format_marks(5.0), "5");
        assert_eq!(format_marks(2.5), "2.5");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Module 1\n\n  Lexical\tanalysis "), "Module 1 Lexical analysis");
    }
}
