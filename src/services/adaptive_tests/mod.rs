//! 自适应能力测试：生成、逐题作答、结束分析

mod analysis;
mod generator;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use std::sync::Arc;

use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    adaptive_tests::{
        entities::{ANSWER_LETTERS, COMPETENCY_DOMAINS, QuestionView, TestAnswer, TestSession},
        requests::SubmitAnswerRequest,
        responses::{
            AnswerResultResponse, CurrentQuestionResponse, TestCreatedResponse,
            TestSessionListResponse,
        },
    },
    users::entities::User,
};
use crate::services::{error_response, unauthorized};
use crate::storage::Storage;

use generator::{GenerationGuard, generate_questions};

define_service!(
    /// 自适应测试服务
    AdaptiveTestService
);

fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::TestSessionNotFound,
        "Test session not found",
    ))
}

/// 只允许访问自己的会话
async fn load_own_session(
    storage: &Arc<dyn Storage>,
    user: &User,
    session_id: i64,
) -> Result<TestSession, HttpResponse> {
    match storage.get_test_session(session_id).await {
        Ok(Some(session)) if session.user_id == user.id => Ok(session),
        Ok(_) => Err(session_not_found()),
        Err(e) => Err(error_response(&e, "Failed to load test session")),
    }
}

fn answer_rejected() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::TestAnswerRejected,
        "Question already answered or not the current question",
    ))
}

fn mark_completed(session: &mut TestSession) {
    if !session.completed {
        session.completed = true;
        session.completed_at = Some(Utc::now());
    }
}

impl AdaptiveTestService {
    pub async fn create_test(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let Some(_guard) = GenerationGuard::acquire(user.id) else {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TestGenerationInProgress,
                "A test is already being generated for you",
            )));
        };

        let storage = self.get_storage(request);
        let llm = self.get_llm(request);

        let questions = match generate_questions(&llm).await {
            Ok(questions) => questions,
            Err(e) => return Ok(error_response(&e, "Failed to generate questions")),
        };
        if questions.len() < COMPETENCY_DOMAINS.len() {
            return Ok(HttpResponse::BadGateway().json(ApiResponse::error_empty(
                ErrorCode::GenerationFailed,
                "Questions not generated",
            )));
        }

        let session = match storage.create_test_session(user.id, &questions).await {
            Ok(session) => session,
            Err(e) => return Ok(error_response(&e, "Failed to create test session")),
        };
        tracing::info!("Adaptive test {} created for user {}", session.id, user.id);

        let total = session.questions.len();
        Ok(HttpResponse::Created().json(ApiResponse::success(
            TestCreatedResponse {
                id: session.id,
                total_questions: session.total_questions,
                question: session
                    .questions
                    .first()
                    .map(|q| QuestionView::from_question(q, 0, total)),
            },
            "Test created",
        )))
    }

    pub async fn current_question(
        &self,
        request: &HttpRequest,
        session_id: i64,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        let mut session = match load_own_session(&storage, &user, session_id).await {
            Ok(session) => session,
            Err(resp) => return Ok(resp),
        };

        let completed = CurrentQuestionResponse {
            completed: true,
            question: None,
        };
        if session.completed {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(completed, "Exam completed")));
        }

        let index = session.current_index.max(0) as usize;
        let Some(question) = session.questions.get(index) else {
            // 已答完全部题目
            mark_completed(&mut session);
            if let Err(e) = storage
                .save_test_session(&session, session.current_index)
                .await
            {
                return Ok(error_response(&e, "Failed to save test session"));
            }
            return Ok(HttpResponse::Ok().json(ApiResponse::success(completed, "Exam completed")));
        };

        let view = QuestionView::from_question(question, index, session.questions.len());
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            CurrentQuestionResponse {
                completed: false,
                question: Some(view),
            },
            "Current question",
        )))
    }

    pub async fn submit_answer(
        &self,
        request: &HttpRequest,
        session_id: i64,
        body: SubmitAnswerRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let answer = body.answer.trim().to_uppercase();
        if !ANSWER_LETTERS.contains(&answer.as_str()) {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Answer must be one of A, B, C or D",
            )));
        }

        let storage = self.get_storage(request);
        let mut session = match load_own_session(&storage, &user, session_id).await {
            Ok(session) => session,
            Err(resp) => return Ok(resp),
        };
        if session.completed {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TestAlreadyCompleted,
                "Exam completed",
            )));
        }

        let index = session.current_index.max(0) as usize;
        let Some(question) = session.questions.get(index).cloned() else {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TestAlreadyCompleted,
                "Exam completed",
            )));
        };
        if question.id != body.question_id {
            return Ok(answer_rejected());
        }

        let correct = answer == question.correct_answer;
        session.answers.push(TestAnswer {
            question_id: question.id,
            answer,
            correct,
            time_spent: body.time_spent.max(0.0),
        });
        let expected_index = session.current_index;
        session.current_index += 1;
        match storage.save_test_session(&session, expected_index).await {
            Ok(true) => {}
            // 同一题的并发提交只有一个生效
            Ok(false) => return Ok(answer_rejected()),
            Err(e) => return Ok(error_response(&e, "Failed to save answer")),
        }

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AnswerResultResponse {
                question_id: question.id,
                correct,
                explanation: question.explanation,
                answered: session.answers.len(),
                total: session.questions.len(),
            },
            "Answer recorded",
        )))
    }

    /// 结束测试并生成分析；重复调用返回已有结果
    pub async fn finish_test(
        &self,
        request: &HttpRequest,
        session_id: i64,
    ) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        let mut session = match load_own_session(&storage, &user, session_id).await {
            Ok(session) => session,
            Err(resp) => return Ok(resp),
        };
        if let Some(analysis) = session.analysis.take() {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(analysis, "Test analysis")));
        }

        mark_completed(&mut session);
        let finished_at = session.completed_at.unwrap_or_else(Utc::now);
        let mut result = analysis::analyze(&session, finished_at);
        result.recommendations = analysis::recommend(&self.get_llm(request), &result).await;

        session.analysis = Some(result.clone());
        match storage
            .save_test_session(&session, session.current_index)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::TestAnswerRejected,
                    "An answer was recorded while finishing, please retry",
                )));
            }
            Err(e) => return Ok(error_response(&e, "Failed to save test analysis")),
        }
        tracing::info!(
            "Adaptive test {} finished: {:.2}%",
            session.id,
            result.performance_percentage
        );
        Ok(HttpResponse::Ok().json(ApiResponse::success(result, "Test analysis")))
    }

    pub async fn list_tests(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.list_test_sessions(user.id).await {
            Ok(sessions) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                TestSessionListResponse {
                    items: sessions.iter().map(Into::into).collect(),
                },
                "Test history retrieved",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list tests")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, mock::ScriptedLlm};
    use crate::models::adaptive_tests::entities::TestQuestion;
    use crate::services::testing::{body_json, campus, request_as};

    const QUESTION: &str = r#"{"content":"Pick the prime","options":["4","6","7","9"],"correct_answer":"C","explanation":"7 is prime"}"#;

    fn service(storage: Arc<dyn Storage>, scripted: &Arc<ScriptedLlm>) -> AdaptiveTestService {
        let llm: Arc<dyn LlmClient> = scripted.clone();
        AdaptiveTestService::with_deps(storage, Some(llm))
    }

    fn answer(question_id: u32, answer: &str) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            question_id,
            answer: answer.to_string(),
            time_spent: 12.0,
        }
    }

    #[tokio::test]
    async fn test_full_test_flow() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(QUESTION));
        let service = service(campus.storage.clone(), &scripted);
        let req = request_as(&campus.student_user);

        let resp = service.create_test(&req).await.unwrap();
        assert_eq!(resp.status(), 201);
        let body = body_json(resp).await;
        let id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["total_questions"], 10);
        assert_eq!(body["data"]["question"]["competency_domain"], "Problem Solving");
        assert!(body["data"]["question"].get("correct_answer").is_none());

        let resp = service.submit_answer(&req, id, answer(1, "c")).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["correct"], true);

        // 重复作答
        let resp = service.submit_answer(&req, id, answer(1, "A")).await.unwrap();
        assert_eq!(resp.status(), 409);
        // 跳题
        let resp = service.submit_answer(&req, id, answer(5, "A")).await.unwrap();
        assert_eq!(resp.status(), 409);

        for qid in 2..=10 {
            let resp = service.submit_answer(&req, id, answer(qid, "A")).await.unwrap();
            assert_eq!(resp.status(), 200);
        }

        let body = body_json(service.current_question(&req, id).await.unwrap()).await;
        assert_eq!(body["data"]["completed"], true);
        assert_eq!(body["message"], "Exam completed");

        let body = body_json(service.finish_test(&req, id).await.unwrap()).await;
        assert_eq!(body["data"]["correct_answers"], 1);
        assert_eq!(body["data"]["performance_percentage"], 10.0);
        assert_eq!(body["data"]["co_po_mapping"][0]["performance"], 0.1);
        // 建议由模型给出，回复无类别时使用默认建议
        assert_eq!(body["data"]["recommendations"][0]["category"], "Overall Performance");

        let body = body_json(service.list_tests(&req).await.unwrap()).await;
        assert_eq!(body["data"]["items"][0]["completed"], true);
        assert_eq!(body["data"]["items"][0]["questions_answered"], 10);
    }

    #[tokio::test]
    async fn test_simultaneous_answers_to_same_question() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(QUESTION));
        let service = service(campus.storage.clone(), &scripted);
        let req = request_as(&campus.student_user);

        let body = body_json(service.create_test(&req).await.unwrap()).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (a, b) = tokio::join!(
            service.submit_answer(&req, id, answer(1, "C")),
            service.submit_answer(&req, id, answer(1, "A")),
        );
        let mut statuses = [a.unwrap().status().as_u16(), b.unwrap().status().as_u16()];
        statuses.sort_unstable();
        assert_eq!(statuses, [200, 409]);

        let session = campus.storage.get_test_session(id).await.unwrap().unwrap();
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.current_index, 1);
    }

    #[tokio::test]
    async fn test_invalid_output_is_retried_then_rejected() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::always(r#"{"content":"incomplete"}"#));
        let service = service(campus.storage.clone(), &scripted);

        let resp = service
            .create_test(&request_as(&campus.teacher))
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Questions not generated");
        assert_eq!(scripted.call_count(), 10 * generator::MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_llm_unavailable_and_foreign_sessions() {
        let campus = campus().await;
        let scripted = Arc::new(ScriptedLlm::unavailable());
        let service = service(campus.storage.clone(), &scripted);

        let resp = service.create_test(&request_as(&campus.admin)).await.unwrap();
        assert_eq!(resp.status(), 502);

        let questions: Vec<TestQuestion> = Vec::new();
        let session = campus
            .storage
            .create_test_session(campus.student_user.id, &questions)
            .await
            .unwrap();
        let resp = service
            .current_question(&request_as(&campus.teacher), session.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        // 无题目的会话直接结束，模型不可用时给出通用建议
        let body = body_json(
            service
                .finish_test(&request_as(&campus.student_user), session.id)
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["accuracy"], 0.0);
        assert_eq!(body["data"]["recommendations"][0]["category"], "General Advice");
    }
}
