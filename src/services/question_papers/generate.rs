use actix_multipart::{Field, Multipart};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;

use super::{QuestionPaperService, generator, template_not_found};
use crate::config::AppConfig;
use crate::errors::CampusError;
use crate::llm::{ChatMessage, ChatOptions, LlmClient};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    question_papers::{
        entities::{PaperTemplate, QuestionPaper},
        requests::{CreateTemplateRequest, GenerateOptions},
    },
    users::entities::User,
};
use crate::services::{error_response, system::DynamicConfig, unauthorized};
use crate::storage::Storage;
use crate::utils::{extension_of, is_pdf, pdf::extract_text};

/// 每类上传文件的数量上限
pub const MAX_FILES_PER_FIELD: usize = 5;

fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

/// 读取一个 PDF 字段，超出大小或不是 PDF 时拒绝
async fn read_pdf_field(
    field: &mut Field,
    max_size: usize,
) -> Result<Option<Vec<u8>>, HttpResponse> {
    let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_string();
    // 浏览器对空的文件输入也会提交一个无文件名的字段
    if file_name.is_empty() {
        return Ok(None);
    }
    if extension_of(&file_name).as_deref() != Some(".pdf") {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only PDF files are allowed",
        ));
    }

    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| bad_request(ErrorCode::FileUploadFailed, e.to_string()))?;
        data.extend_from_slice(&chunk);
        if data.len() > max_size {
            return Err(bad_request(
                ErrorCode::FileSizeExceeded,
                "File size exceeds the limit",
            ));
        }
    }
    if !is_pdf(&data) {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only PDF files are allowed",
        ));
    }
    Ok(Some(data))
}

async fn read_text_field(field: &mut Field) -> Result<String, HttpResponse> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| bad_request(ErrorCode::BadRequest, e.to_string()))?;
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data)
        .map_err(|_| bad_request(ErrorCode::BadRequest, "Form field is not valid UTF-8"))
}

fn parse_percentage(name: &str, value: &str) -> Result<u32, HttpResponse> {
    value.trim().parse::<u32>().map_err(|_| {
        bad_request(
            ErrorCode::BadRequest,
            format!("Invalid {name} percentage"),
        )
    })
}

/// 表单中的文件与选项
#[derive(Default)]
struct GenerateForm {
    syllabus: Vec<Vec<u8>>,
    past_papers: Vec<Vec<u8>>,
    options: GenerateOptions,
}

async fn read_form(mut payload: Multipart) -> Result<GenerateForm, HttpResponse> {
    let max_size = DynamicConfig::upload_max_size().await;
    let mut form = GenerateForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| bad_request(ErrorCode::BadRequest, e.to_string()))?
    {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "syllabus" | "past_papers" => {
                let Some(data) = read_pdf_field(&mut field, max_size).await? else {
                    continue;
                };
                let target = if name == "syllabus" {
                    &mut form.syllabus
                } else {
                    &mut form.past_papers
                };
                if target.len() >= MAX_FILES_PER_FIELD {
                    return Err(bad_request(
                        ErrorCode::BadRequest,
                        format!("At most {MAX_FILES_PER_FIELD} {name} files can be uploaded"),
                    ));
                }
                target.push(data);
            }
            "template_id" => {
                let value = read_text_field(&mut field).await?;
                if !value.trim().is_empty() {
                    let id = value.trim().parse::<i64>().map_err(|_| {
                        bad_request(ErrorCode::TemplateInvalid, "Invalid template id")
                    })?;
                    form.options.template_id = Some(id);
                }
            }
            "template" => {
                let value = read_text_field(&mut field).await?;
                let template: CreateTemplateRequest = serde_json::from_str(&value).map_err(|e| {
                    bad_request(ErrorCode::TemplateInvalid, format!("Invalid template: {e}"))
                })?;
                form.options.template = Some(template);
            }
            "easy" => {
                form.options.difficulty.easy =
                    parse_percentage("easy", &read_text_field(&mut field).await?)?
            }
            "medium" => {
                form.options.difficulty.medium =
                    parse_percentage("medium", &read_text_field(&mut field).await?)?
            }
            "hard" => {
                form.options.difficulty.hard =
                    parse_percentage("hard", &read_text_field(&mut field).await?)?
            }
            _ => {}
        }
    }
    Ok(form)
}

/// 逐个提取 PDF 文本，单个文件失败时视为无文本
async fn extract_all(files: Vec<Vec<u8>>) -> Vec<String> {
    let mut texts = Vec::with_capacity(files.len());
    for bytes in files {
        match web::block(move || extract_text(&bytes)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => texts.push(text),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("PDF extraction error: {}", e),
            Err(e) => tracing::warn!("PDF extraction task failed: {}", e),
        }
    }
    texts
}

/// 解析出本次使用的模板：已有模板须属于当前教师；内联模板校验后暂不落库
async fn resolve_template(
    storage: &Arc<dyn Storage>,
    actor: &User,
    options: &GenerateOptions,
) -> Result<(PaperTemplate, bool), HttpResponse> {
    if let Some(template_id) = options.template_id {
        return match storage.get_template_by_id(template_id).await {
            Ok(Some(template)) if template.created_by == actor.id => Ok((template, false)),
            Ok(_) => Err(template_not_found()),
            Err(e) => Err(error_response(&e, "Failed to load template")),
        };
    }

    let Some(req) = &options.template else {
        return Err(bad_request(
            ErrorCode::TemplateInvalid,
            "Please create or select a template first",
        ));
    };
    req.validate()
        .map_err(|msg| bad_request(ErrorCode::TemplateInvalid, msg))?;

    Ok((
        PaperTemplate {
            id: 0,
            name: req.name.trim().to_string(),
            institution: req.institution.clone(),
            course: req.course.clone(),
            subject: req.subject.trim().to_string(),
            total_marks: req.total_marks,
            duration_minutes: req.duration_minutes,
            sections: req.sections.clone(),
            created_by: actor.id,
            created_at: chrono::Utc::now(),
        },
        true,
    ))
}

/// 由大纲与往年试卷生成一份试卷并保存
pub(crate) async fn generate_paper(
    storage: &Arc<dyn Storage>,
    llm: &Arc<dyn LlmClient>,
    actor: &User,
    syllabus: Vec<Vec<u8>>,
    past_papers: Vec<Vec<u8>>,
    options: GenerateOptions,
) -> Result<QuestionPaper, HttpResponse> {
    if syllabus.is_empty() {
        return Err(bad_request(
            ErrorCode::BadRequest,
            "Please upload at least one syllabus PDF",
        ));
    }
    if syllabus.len() > MAX_FILES_PER_FIELD || past_papers.len() > MAX_FILES_PER_FIELD {
        return Err(bad_request(
            ErrorCode::BadRequest,
            format!("At most {MAX_FILES_PER_FIELD} files can be uploaded per field"),
        ));
    }
    if !options.difficulty.is_valid() {
        return Err(bad_request(
            ErrorCode::BadRequest,
            "Difficulty percentages must add up to 100",
        ));
    }

    let (template, is_new) = resolve_template(storage, actor, &options).await?;

    let syllabus_text = extract_all(syllabus).await.join("\n\n");
    if syllabus_text.trim().is_empty() {
        return Err(HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
            ErrorCode::PdfTextNotFound,
            "No extractable text found in PDFs",
        )));
    }

    let max_past = DynamicConfig::max_past_questions().await;
    let past_questions: Vec<String> = extract_all(past_papers)
        .await
        .iter()
        .flat_map(|text| generator::extract_past_questions(text))
        .take(max_past)
        .collect();

    let messages = [
        ChatMessage::system(generator::build_system_prompt(
            &template,
            &options.difficulty,
            &past_questions,
        )),
        ChatMessage::user(generator::build_user_prompt(&syllabus_text)),
    ];
    let answer = llm
        .chat(
            &AppConfig::get().llm.generation_model,
            &messages,
            &ChatOptions::from_config(),
        )
        .await
        .map_err(|e| error_response(&e, "Error generating questions"))?;

    let content = generator::parse_generated_paper(&answer, &template);
    if content.question_count() == 0 {
        tracing::warn!("Generated paper contained no questions");
        return Err(HttpResponse::BadGateway().json(ApiResponse::error_empty(
            ErrorCode::GenerationFailed,
            "The model response contained no questions",
        )));
    }

    let template_id = if is_new {
        let Some(req) = options.template else {
            return Err(template_not_found());
        };
        match storage.create_template(req, actor.id).await {
            Ok(saved) => saved.id,
            Err(e) => return Err(error_response(&e, "Failed to save template")),
        }
    } else {
        template.id
    };

    let title = format!(
        "{} - {}",
        template.subject,
        chrono::Local::now().format("%Y-%m-%d")
    );
    storage
        .create_question_paper(template_id, &title, &content, &options.difficulty, actor.id)
        .await
        .map_err(|e| match e {
            CampusError::NotFound(_) => template_not_found(),
            e => error_response(&e, "Error saving question paper"),
        })
}

pub async fn handle_generate(
    service: &QuestionPaperService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let Some(actor) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };
    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(resp) => return Ok(resp),
    };

    let storage = service.get_storage(request);
    let llm = service.get_llm(request);
    let generated = generate_paper(
        &storage,
        &llm,
        &actor,
        form.syllabus,
        form.past_papers,
        form.options,
    )
    .await;
    match generated {
        Ok(paper) => {
            tracing::info!(
                "Question paper {} generated by user {} ({} questions)",
                paper.id,
                actor.id,
                paper.content.question_count()
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                paper,
                "Question paper generated",
            )))
        }
        Err(resp) => Ok(resp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLlm;
    use crate::models::question_papers::entities::{SectionType, TemplateSection};
    use crate::services::testing::campus;
    use crate::utils::pdf::text_pdf;

    const ANSWER: &str = "**Part A**\n- [Easy] Define a lexeme. [2 Marks]\n- [Hard] Explain bootstrapping.";

    fn inline_template() -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: "Series 1".to_string(),
            institution: "KTU".to_string(),
            course: "B.Tech CSE".to_string(),
            subject: "Compiler Design".to_string(),
            total_marks: 10,
            duration_minutes: 60,
            sections: vec![TemplateSection {
                name: "Part A".to_string(),
                section_type: SectionType::ShortAnswer,
                num_questions: 2,
                marks_per_question: 3.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_generate_saves_inline_template_and_paper() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(ANSWER));
        let llm: Arc<dyn LlmClient> = scripted.clone();

        let paper = generate_paper(
            &campus.storage,
            &llm,
            &campus.teacher,
            vec![text_pdf(&["Module 1 Lexical analysis and tokens"])],
            vec![text_pdf(&["Q1. What is a DFA? Q2. Define an NFA."])],
            GenerateOptions {
                template: Some(inline_template()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(paper.title.starts_with("Compiler Design - "));
        assert_eq!(paper.content.question_count(), 2);
        assert_eq!(paper.content.sections[0].questions[1].marks, 3.0);

        let templates = campus.storage.list_templates_by_user(campus.teacher.id).await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, paper.template_id);

        let prompt = scripted.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("- What is a DFA?"));
        assert!(prompt.contains("Module 1 Lexical analysis and tokens"));
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_distribution_and_foreign_template() {
        let campus = campus().await;
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm::always(ANSWER));
        let syllabus = || vec![text_pdf(&["Module 1"])];

        let mut options = GenerateOptions {
            template: Some(inline_template()),
            ..Default::default()
        };
        options.difficulty.hard = 50;
        let resp = generate_paper(
            &campus.storage,
            &llm,
            &campus.teacher,
            syllabus(),
            vec![],
            options,
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), 400);

        let admins = campus
            .storage
            .create_template(inline_template(), campus.admin.id)
            .await
            .unwrap();
        let resp = generate_paper(
            &campus.storage,
            &llm,
            &campus.teacher,
            syllabus(),
            vec![],
            GenerateOptions {
                template_id: Some(admins.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_generate_requires_syllabus_text() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(ANSWER));
        let llm: Arc<dyn LlmClient> = scripted.clone();
        let resp = generate_paper(
            &campus.storage,
            &llm,
            &campus.teacher,
            vec![text_pdf(&[])],
            vec![],
            GenerateOptions {
                template: Some(inline_template()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), 422);
        assert_eq!(scripted.call_count(), 0);
    }
}
