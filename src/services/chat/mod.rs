//! 学术助手对话：意图识别后分派到结构化操作，其余交给通用对话模型

mod analysis;
mod context;
mod intents;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use futures_util::StreamExt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::llm::{self, ChatOptions, LlmClient};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    chat::{
        entities::{ChatMessage, ChatRole},
        requests::{ChatRequest, ChatStreamQuery},
        responses::{ChatHistoryResponse, ChatReply},
    },
};
use crate::services::{error_response, system::DynamicConfig, unauthorized};
use crate::storage::Storage;

use analysis::{Intent, QueryAnalysis, build_analysis_prompt, parse_analysis};
use context::{UserContext, load_context};

const HISTORY_PAGE: u64 = 100;
const PROMPT_HISTORY_LINES: usize = 5;

define_service!(
    /// 聊天服务
    ChatService
);

/// 通用对话的历史摘要，只保留最近几行
fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "No previous conversation.".to_string();
    }
    let lines: Vec<String> = history
        .iter()
        .map(|m| match m.role {
            ChatRole::User => format!("User: {}", m.content),
            ChatRole::Assistant => format!("Assistant: {}", m.content),
        })
        .collect();
    if lines.len() > PROMPT_HISTORY_LINES {
        let mut kept = vec!["... (earlier conversation omitted)".to_string()];
        kept.extend_from_slice(&lines[lines.len() - PROMPT_HISTORY_LINES..]);
        kept.join("\n")
    } else {
        lines.join("\n")
    }
}

fn general_system_prompt(ctx: &UserContext, history: &[ChatMessage]) -> String {
    let mut prompt = format!(
        "You are an AI Academic Assistant for a university system.\nCurrent User: {} ({})\nDepartment: {}\n",
        ctx.name,
        ctx.role_title(),
        ctx.department.as_deref().unwrap_or("N/A")
    );
    if let Some(student) = &ctx.student {
        prompt.push_str(&format!(
            "Semester: {}, Section: {}\n",
            student.semester, student.section
        ));
    }
    prompt.push_str(&format!(
        "\nPrevious conversation:\n{}\n\n\
         Provide responses based only on actual information available.\n\
         Do not generate fictional data.\n\
         Keep responses concise and relevant to academic queries.\n\
         Use emojis appropriately to enhance readability.",
        format_history(history)
    ));
    prompt
}

fn stream_system_prompt(ctx: &UserContext) -> String {
    format!(
        "You are an AI Academic Assistant for {}.\n\
         For academic queries, provide accurate information.\n\
         For general questions, be helpful and informative.\n\
         Format responses clearly with appropriate emojis.",
        ctx.describe()
    )
}

/// 按意图生成回复
async fn respond(
    storage: &Arc<dyn Storage>,
    llm: &Arc<dyn LlmClient>,
    ctx: &UserContext,
    analysis: &QueryAnalysis,
    message: &str,
    history: &[ChatMessage],
) -> Result<String> {
    match analysis.intent() {
        Intent::RecordMarks => intents::record_marks(storage, ctx, analysis).await,
        Intent::MarkAttendance => intents::mark_attendance(storage, ctx, analysis).await,
        Intent::Timetable => intents::timetable(storage, ctx, analysis).await,
        Intent::AttendanceQuery => intents::attendance_query(storage, ctx, analysis).await,
        Intent::MarksQuery => intents::marks_query(storage, ctx, analysis).await,
        Intent::General => {
            let messages = [
                llm::ChatMessage::system(general_system_prompt(ctx, history)),
                llm::ChatMessage::user(message),
            ];
            llm.chat(
                &AppConfig::get().llm.chat_model,
                &messages,
                &ChatOptions::from_config(),
            )
            .await
        }
    }
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

impl ChatService {
    pub async fn send_message(
        &self,
        request: &HttpRequest,
        body: ChatRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let message = body.message.trim();
        if message.is_empty() {
            return Ok(bad_request("No message provided"));
        }

        let storage = self.get_storage(request);
        let llm = self.get_llm(request);

        let ctx = match load_context(&storage, &user).await {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return Ok(bad_request("Could not retrieve user information")),
            Err(e) => return Ok(error_response(&e, "Failed to load user context")),
        };

        if let Err(e) = storage
            .create_chat_message(user.id, ChatRole::User, message)
            .await
        {
            return Ok(error_response(&e, "Failed to store chat message"));
        }

        let window = DynamicConfig::chat_history_window().await as u64;
        let mut history = match storage.list_recent_chat_messages(user.id, window).await {
            Ok(history) => history,
            Err(e) => return Ok(error_response(&e, "Failed to load chat history")),
        };
        // 最后一条是刚写入的本轮消息
        history.pop();

        let prompt = build_analysis_prompt(message, ctx.role_title());
        let raw = match llm
            .generate(
                &AppConfig::get().llm.analysis_model,
                &prompt,
                true,
                &ChatOptions::from_config(),
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => return Ok(error_response(&e, "Error analyzing query")),
        };
        let analysis = match parse_analysis(&raw) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Unparsable query analysis: {}", e);
                return Ok(HttpResponse::BadGateway().json(ApiResponse::error_empty(
                    ErrorCode::LlmResponseInvalid,
                    "Failed to parse AI response",
                )));
            }
        };
        tracing::debug!("Chat intent for user {}: {:?}", user.id, analysis.intent());

        let reply = match respond(&storage, &llm, &ctx, &analysis, message, &history).await {
            Ok(reply) => reply,
            Err(e) => return Ok(error_response(&e, "Error processing message")),
        };

        if let Err(e) = storage
            .create_chat_message(user.id, ChatRole::Assistant, &reply)
            .await
        {
            return Ok(error_response(&e, "Failed to store chat reply"));
        }

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            ChatReply { response: reply },
            "Message processed",
        )))
    }

    /// 以 SSE 逐段返回通用对话回复，不做意图识别
    pub async fn stream(
        &self,
        request: &HttpRequest,
        query: ChatStreamQuery,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let message = query.message.unwrap_or_default();
        let message = message.trim();
        if message.is_empty() {
            return Ok(HttpResponse::Ok()
                .content_type("text/event-stream")
                .body("data: No message provided\n\n"));
        }

        let storage = self.get_storage(request);
        let llm = self.get_llm(request);

        let ctx = match load_context(&storage, &user).await {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return Ok(bad_request("Could not retrieve user information")),
            Err(e) => return Ok(error_response(&e, "Failed to load user context")),
        };

        let messages = vec![
            llm::ChatMessage::system(stream_system_prompt(&ctx)),
            llm::ChatMessage::user(message),
        ];
        let chunks = match llm
            .chat_stream(
                &AppConfig::get().llm.chat_model,
                messages,
                &ChatOptions::from_config(),
            )
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => return Ok(error_response(&e, "Error generating response")),
        };

        let events = chunks.map(|chunk| {
            let line = match chunk {
                Ok(text) => format!("data: {text}\n\n"),
                Err(e) => {
                    tracing::warn!("Chat stream interrupted: {}", e);
                    format!("data: Error: {}\n\n", e.message())
                }
            };
            Ok::<_, actix_web::Error>(web::Bytes::from(line))
        });

        Ok(HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header(("Cache-Control", "no-cache"))
            .streaming(events))
    }

    pub async fn get_history(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.list_recent_chat_messages(user.id, HISTORY_PAGE).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                ChatHistoryResponse { items },
                "Chat history retrieved",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to load chat history")),
        }
    }

    pub async fn clear_history(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.clear_chat_history(user.id).await {
            Ok(removed) => {
                tracing::info!("Cleared {} chat messages for user {}", removed, user.id);
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Chat history cleared")))
            }
            Err(e) => Ok(error_response(&e, "Failed to clear chat history")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLlm;
    use crate::services::testing::{body_json, campus, request_as};

    fn service(storage: Arc<dyn Storage>, scripted: &Arc<ScriptedLlm>) -> ChatService {
        let llm: Arc<dyn LlmClient> = scripted.clone();
        ChatService::with_deps(storage, Some(llm))
    }

    async fn send(
        service: &ChatService,
        user: &crate::models::users::entities::User,
        text: &str,
    ) -> serde_json::Value {
        let resp = service
            .send_message(
                &request_as(user),
                ChatRequest {
                    message: text.to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        body_json(resp).await
    }

    #[tokio::test]
    async fn test_teacher_records_marks_then_student_reads_them() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"query_type":"marks","request_type":"modify","course_name":"compiler design",
                "assessment_type":"Series 1","student_usn":"4kt21cs001","marks_value":42}"#
                .to_string()),
            Ok(r#"{"query_type":"marks","request_type":"query","course_name":null}"#.to_string()),
        ]));
        let service = service(campus.storage.clone(), &scripted);

        let body = send(&service, &campus.teacher, "Give 4KT21CS001 42 in CD series 1").await;
        assert_eq!(
            body["data"]["response"],
            "✅ Successfully recorded 42 marks for 4KT21CS001 in Compiler Design (Series 1)"
        );

        let body = send(&service, &campus.student_user, "show my marks").await;
        let reply = body["data"]["response"].as_str().unwrap();
        assert!(reply.starts_with("📊 Your marks:\n\n📚 Compiler Design:\n"));
        assert!(reply.contains("  📝 Series 1: 42"));

        let history = campus
            .storage
            .list_recent_chat_messages(campus.teacher.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_students_cannot_modify_records() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(
            r#"{"query_type":"attendance","request_type":"modify","student_usn":"4KT21CS001",
                "course_name":"Compiler Design","attendance_status":"present","date_type":"today"}"#,
        ));
        let service = service(campus.storage.clone(), &scripted);
        let body = send(&service, &campus.student_user, "mark me present").await;
        assert_eq!(body["data"]["response"], "Only teachers can mark attendance.");
    }

    #[tokio::test]
    async fn test_teacher_marks_attendance_for_yesterday() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"query_type":"attendance","request_type":"modify","student_usn":"4KT21CS001",
                "course_name":"CS501","attendance_status":"absent","date_type":"yesterday"}"#
                .to_string()),
            Ok(r#"{"query_type":"attendance","request_type":"query","student_usn":"4KT21CS001",
                "course_name":"Compiler Design"}"#
                .to_string()),
        ]));
        let service = service(campus.storage.clone(), &scripted);

        let yesterday = (chrono::Local::now().date_naive() - chrono::Duration::days(1))
            .format("%d-%m-%Y")
            .to_string();
        let body = send(
            &service,
            &campus.teacher,
            "4KT21CS001 was absent yesterday in CS501",
        )
        .await;
        assert_eq!(
            body["data"]["response"],
            format!("✅ Successfully marked 4KT21CS001 as absent for Compiler Design on {yesterday}")
        );

        let body = send(
            &service,
            &campus.teacher,
            "attendance of 4KT21CS001 in compiler design",
        )
        .await;
        let reply = body["data"]["response"].as_str().unwrap();
        assert!(reply.starts_with("📊 Attendance record for 4KT21CS001 in Compiler Design:\n\n"));
        assert!(reply.contains(&format!("📅 {yesterday}: Absent ❌")));
    }

    #[tokio::test]
    async fn test_attendance_checks_assignment_before_student() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"query_type":"attendance","request_type":"modify","student_usn":"4KT21CS999",
                "course_name":"Thermodynamics","attendance_status":"present"}"#
                .to_string()),
            Ok(r#"{"query_type":"attendance","request_type":"modify","student_usn":"4KT21CS999",
                "course_name":"Compiler Design","attendance_status":"present"}"#
                .to_string()),
        ]));
        let service = service(campus.storage.clone(), &scripted);

        let body = send(&service, &campus.teacher, "4KT21CS999 present in thermodynamics").await;
        assert_eq!(body["data"]["response"], "You are not assigned to the course: Thermodynamics");
        let body = send(&service, &campus.teacher, "4KT21CS999 present in compiler design").await;
        assert_eq!(body["data"]["response"], "Student with USN 4KT21CS999 not found.");
    }

    #[tokio::test]
    async fn test_timetable_intent_formats_by_role() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(
            r#"{"query_type":"timetable","request_type":"query","day":"monday"}"#,
        ));
        let service = service(campus.storage.clone(), &scripted);

        let body = send(&service, &campus.student_user, "what do I have on monday").await;
        assert_eq!(
            body["data"]["response"],
            "📅 Your timetable for Monday:\n\n⏰ Period 1: Compiler Design (Prof. Dr. Rao)\n"
        );
        let body = send(&service, &campus.teacher, "my classes on monday").await;
        assert_eq!(
            body["data"]["response"],
            "📅 Your timetable for Monday:\n\n⏰ Period 1: Compiler Design for Section A (Sem 5)\n"
        );
    }

    #[tokio::test]
    async fn test_general_chat_includes_context_and_history() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"query_type":"general","request_type":"query"}"#.to_string()),
            Ok("Hello Asha 👋".to_string()),
            Ok(r#"{"query_type":"general","request_type":"query"}"#.to_string()),
            Ok("Sure.".to_string()),
        ]));
        let service = service(campus.storage.clone(), &scripted);

        let body = send(&service, &campus.student_user, "hi").await;
        assert_eq!(body["data"]["response"], "Hello Asha 👋");
        send(&service, &campus.student_user, "explain parsing").await;

        let prompts = scripted.prompts.lock().unwrap();
        let first_chat = &prompts[1];
        assert!(first_chat.contains("Current User: Asha (Student)"));
        assert!(first_chat.contains("Semester: 5, Section: A"));
        assert!(first_chat.contains("No previous conversation."));
        let second_chat = &prompts[3];
        assert!(second_chat.contains("User: hi\nAssistant: Hello Asha 👋"));
        assert!(!second_chat.contains("User: explain parsing"));
    }

    #[tokio::test]
    async fn test_unparsable_analysis_and_empty_message() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always("not json"));
        let service = service(campus.storage.clone(), &scripted);

        let resp = service
            .send_message(
                &request_as(&campus.teacher),
                ChatRequest {
                    message: "hello".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);

        let resp = service
            .send_message(
                &request_as(&campus.teacher),
                ChatRequest {
                    message: "   ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_stream_and_history_management() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always("Hello there friend"));
        let service = service(campus.storage.clone(), &scripted);

        let resp = service
            .stream(
                &request_as(&campus.student_user),
                ChatStreamQuery {
                    message: Some("hi".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text, "data: Hello \n\ndata: there \n\ndata: friend\n\n");
        assert!(scripted.prompts.lock().unwrap()[0].contains("Student Asha (USN: 4KT21CS001)"));

        let resp = service
            .stream(&request_as(&campus.student_user), ChatStreamQuery { message: None })
            .await
            .unwrap();
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"data: No message provided\n\n");

        campus
            .storage
            .create_chat_message(campus.student_user.id, ChatRole::User, "old")
            .await
            .unwrap();
        let req = request_as(&campus.student_user);
        let body = body_json(service.get_history(&req).await.unwrap()).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
        service.clear_history(&req).await.unwrap();
        let body = body_json(service.get_history(&req).await.unwrap()).await;
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_format_history_keeps_last_lines() {
        let message = |i: i64| ChatMessage {
            id: i,
            user_id: 1,
            role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
            content: format!("m{i}"),
            created_at: chrono::Utc::now(),
        };
        let history: Vec<_> = (0..7).map(message).collect();
        let formatted = format_history(&history);
        assert!(formatted.starts_with("... (earlier conversation omitted)\nUser: m2"));
        assert!(formatted.ends_with("User: m6"));
        assert_eq!(format_history(&[]), "No previous conversation.");
    }
}
