//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod adaptive_tests;
mod attendance;
mod chat;
mod classes;
mod courses;
mod departments;
mod employability;
mod files;
mod marks;
mod materials;
mod question_papers;
mod students;
mod system_settings;
mod timetable;
mod users;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::errors::{CampusError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| CampusError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 内存数据库（测试用），单连接保证所有查询共享同一个库
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt)
            .await
            .map_err(|e| CampusError::database_connection(format!("内存数据库连接失败: {e}")))?;
        Migrator::up(&db, None)
            .await
            .map_err(|e| CampusError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| CampusError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| CampusError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| CampusError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(CampusError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 将数据库错误转换为业务错误，唯一约束冲突单独识别
pub(crate) fn db_error(context: &'static str) -> impl Fn(DbErr) -> CampusError {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            CampusError::conflict(format!("{context}: {detail}"))
        }
        _ => CampusError::database_operation(format!("{context}: {e}")),
    }
}

// Storage trait 实现
use crate::models::{
    adaptive_tests::entities::{TestQuestion, TestSession},
    attendance::entities::AttendanceDetail,
    chat::entities::{ChatMessage, ChatRole},
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    courses::{
        entities::{Course, CourseAssignment, TimetableSlot},
        requests::{
            AssignmentListQuery, CourseListQuery, CreateAssignmentRequest, CreateCourseRequest,
            UpdateCourseRequest,
        },
        responses::CourseListResponse,
    },
    departments::{
        entities::Department,
        requests::{CreateDepartmentRequest, UpdateDepartmentRequest},
    },
    employability::entities::{EmployabilityResult, EmployabilityStats},
    files::entities::File,
    marks::entities::MarkRecord,
    materials::{
        entities::StudyMaterial, requests::MaterialListQuery, responses::MaterialListResponse,
    },
    question_papers::{
        entities::{DifficultyDistribution, PaperContent, PaperTemplate, QuestionPaper},
        requests::{CreateTemplateRequest, QuestionPaperListQuery},
        responses::QuestionPaperListResponse,
    },
    students::{
        entities::{Student, StudentDetail},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    system::{
        entities::{SettingDefault, SystemSetting},
        requests::SettingAuditQuery,
        responses::SettingAuditListResponse,
    },
    timetable::entities::TimetableEntry,
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户管理模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 院系管理模块
    async fn create_department(&self, req: CreateDepartmentRequest) -> Result<Department> {
        self.create_department_impl(req).await
    }

    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>> {
        self.get_department_by_id_impl(id).await
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        self.list_departments_impl().await
    }

    async fn update_department(
        &self,
        id: i64,
        update: UpdateDepartmentRequest,
    ) -> Result<Option<Department>> {
        self.update_department_impl(id, update).await
    }

    async fn delete_department(&self, id: i64) -> Result<bool> {
        self.delete_department_impl(id).await
    }

    // 班级管理模块
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(query).await
    }

    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    async fn delete_class(&self, class_id: i64) -> Result<bool> {
        self.delete_class_impl(class_id).await
    }

    // 学生管理模块
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(req).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_usn(&self, usn: &str) -> Result<Option<Student>> {
        self.get_student_by_usn_impl(usn).await
    }

    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>> {
        self.get_student_by_user_id_impl(user_id).await
    }

    async fn get_student_detail(&self, student_id: i64) -> Result<Option<StudentDetail>> {
        self.get_student_detail_impl(student_id).await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(id, update).await
    }

    async fn delete_student(&self, id: i64) -> Result<bool> {
        self.delete_student_impl(id).await
    }

    async fn link_student_user(&self, student_id: i64, user_id: i64) -> Result<bool> {
        self.link_student_user_impl(student_id, user_id).await
    }

    // 选课模块
    async fn enroll_student(&self, student_id: i64, course_id: i64) -> Result<i64> {
        self.enroll_student_impl(student_id, course_id).await
    }

    async fn unenroll_student(&self, student_id: i64, course_id: i64) -> Result<bool> {
        self.unenroll_student_impl(student_id, course_id).await
    }

    async fn list_student_courses(&self, student_id: i64) -> Result<Vec<Course>> {
        self.list_student_courses_impl(student_id).await
    }

    // 课程管理模块
    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course> {
        self.create_course_impl(req).await
    }

    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(id).await
    }

    async fn find_course_by_name(&self, name: &str) -> Result<Option<Course>> {
        self.find_course_by_name_impl(name).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(&self, id: i64, update: UpdateCourseRequest) -> Result<Option<Course>> {
        self.update_course_impl(id, update).await
    }

    async fn delete_course(&self, id: i64) -> Result<bool> {
        self.delete_course_impl(id).await
    }

    // 授课分配模块
    async fn create_assignment(
        &self,
        course_id: i64,
        req: CreateAssignmentRequest,
    ) -> Result<CourseAssignment> {
        self.create_assignment_impl(course_id, req).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<CourseAssignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn list_assignments(&self, query: AssignmentListQuery) -> Result<Vec<CourseAssignment>> {
        self.list_assignments_impl(query).await
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_impl(id).await
    }

    // 课表模块
    async fn create_timetable_slot(
        &self,
        assignment_id: i64,
        day: &str,
        period: i32,
    ) -> Result<TimetableSlot> {
        self.create_timetable_slot_impl(assignment_id, day, period).await
    }

    async fn list_timetable_slots(&self, assignment_id: i64) -> Result<Vec<TimetableSlot>> {
        self.list_timetable_slots_impl(assignment_id).await
    }

    async fn delete_timetable_slot(&self, slot_id: i64) -> Result<bool> {
        self.delete_timetable_slot_impl(slot_id).await
    }

    async fn student_timetable(
        &self,
        student_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>> {
        self.student_timetable_impl(student_id, day).await
    }

    async fn teacher_timetable(
        &self,
        teacher_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>> {
        self.teacher_timetable_impl(teacher_id, day).await
    }

    // 考勤模块
    async fn record_attendance(
        &self,
        assignment_id: i64,
        course_id: i64,
        date: &str,
        entries: &[(i64, bool)],
    ) -> Result<i64> {
        self.record_attendance_impl(assignment_id, course_id, date, entries)
            .await
    }

    async fn list_student_attendance(
        &self,
        student_id: i64,
    ) -> Result<BTreeMap<i64, Vec<AttendanceDetail>>> {
        self.list_student_attendance_impl(student_id).await
    }

    // 成绩模块
    async fn upsert_mark(&self, enrollment_id: i64, assessment: &str, marks: f64) -> Result<()> {
        self.upsert_mark_impl(enrollment_id, assessment, marks).await
    }

    async fn list_student_marks(
        &self,
        student_id: i64,
        course_id: Option<i64>,
    ) -> Result<Vec<MarkRecord>> {
        self.list_student_marks_impl(student_id, course_id).await
    }

    // 文件管理模块
    async fn upload_file(
        &self,
        file_token: &str,
        file_name: &str,
        file_size: &i64,
        file_type: &str,
        user_id: i64,
    ) -> Result<File> {
        self.upload_file_impl(file_token, file_name, file_size, file_type, user_id).await
    }

    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>> {
        self.get_file_by_token_impl(token).await
    }

    // 学习资料模块
    async fn create_material(
        &self,
        title: &str,
        course_id: Option<i64>,
        file_token: &str,
        summary: &str,
        created_by: i64,
    ) -> Result<StudyMaterial> {
        self.create_material_impl(title, course_id, file_token, summary, created_by).await
    }

    async fn get_material_by_id(&self, id: i64) -> Result<Option<StudyMaterial>> {
        self.get_material_by_id_impl(id).await
    }

    async fn list_materials_with_pagination(
        &self,
        query: MaterialListQuery,
    ) -> Result<MaterialListResponse> {
        self.list_materials_with_pagination_impl(query).await
    }

    async fn update_material_summary(
        &self,
        id: i64,
        summary: &str,
    ) -> Result<Option<StudyMaterial>> {
        self.update_material_summary_impl(id, summary).await
    }

    async fn delete_material(&self, id: i64) -> Result<bool> {
        self.delete_material_impl(id).await
    }

    // 试卷模板模块
    async fn create_template(
        &self,
        req: CreateTemplateRequest,
        created_by: i64,
    ) -> Result<PaperTemplate> {
        self.create_template_impl(req, created_by).await
    }

    async fn get_template_by_id(&self, id: i64) -> Result<Option<PaperTemplate>> {
        self.get_template_by_id_impl(id).await
    }

    async fn list_templates_by_user(&self, user_id: i64) -> Result<Vec<PaperTemplate>> {
        self.list_templates_by_user_impl(user_id).await
    }

    async fn delete_template(&self, id: i64) -> Result<bool> {
        self.delete_template_impl(id).await
    }

    // 试卷模块
    async fn create_question_paper(
        &self,
        template_id: i64,
        title: &str,
        content: &PaperContent,
        difficulty: &DifficultyDistribution,
        generated_by: i64,
    ) -> Result<QuestionPaper> {
        self.create_question_paper_impl(template_id, title, content, difficulty, generated_by).await
    }

    async fn get_question_paper_by_id(&self, id: i64) -> Result<Option<QuestionPaper>> {
        self.get_question_paper_by_id_impl(id).await
    }

    async fn list_question_papers_with_pagination(
        &self,
        query: QuestionPaperListQuery,
    ) -> Result<QuestionPaperListResponse> {
        self.list_question_papers_with_pagination_impl(query).await
    }

    async fn update_question_paper_content(
        &self,
        id: i64,
        content: &PaperContent,
    ) -> Result<Option<QuestionPaper>> {
        self.update_question_paper_content_impl(id, content).await
    }

    async fn delete_question_paper(&self, id: i64) -> Result<bool> {
        self.delete_question_paper_impl(id).await
    }

    // 聊天记录模块
    async fn create_chat_message(
        &self,
        user_id: i64,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage> {
        self.create_chat_message_impl(user_id, role, content).await
    }

    async fn list_recent_chat_messages(
        &self,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<ChatMessage>> {
        self.list_recent_chat_messages_impl(user_id, limit).await
    }

    async fn clear_chat_history(&self, user_id: i64) -> Result<u64> {
        self.clear_chat_history_impl(user_id).await
    }

    // 自适应测试模块
    async fn create_test_session(
        &self,
        user_id: i64,
        questions: &[TestQuestion],
    ) -> Result<TestSession> {
        self.create_test_session_impl(user_id, questions).await
    }

    async fn get_test_session(&self, id: i64) -> Result<Option<TestSession>> {
        self.get_test_session_impl(id).await
    }

    async fn save_test_session(&self, session: &TestSession, expected_index: i32) -> Result<bool> {
        self.save_test_session_impl(session, expected_index).await
    }

    async fn list_test_sessions(&self, user_id: i64) -> Result<Vec<TestSession>> {
        self.list_test_sessions_impl(user_id).await
    }

    // 就业能力评估模块
    async fn create_employability_result(
        &self,
        user_id: i64,
        scores: &BTreeMap<String, f64>,
        overall_score: f64,
        level: i32,
    ) -> Result<EmployabilityResult> {
        self.create_employability_result_impl(user_id, scores, overall_score, level).await
    }

    async fn list_employability_results(&self, user_id: i64) -> Result<Vec<EmployabilityResult>> {
        self.list_employability_results_impl(user_id).await
    }

    async fn employability_stats(&self, user_id: i64) -> Result<EmployabilityStats> {
        self.employability_stats_impl(user_id).await
    }

    // 系统设置模块
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>> {
        self.list_all_settings_impl().await
    }

    async fn get_setting_by_key(&self, key: &str) -> Result<Option<SystemSetting>> {
        self.get_setting_by_key_impl(key).await
    }

    async fn insert_missing_settings(&self, defaults: &[SettingDefault]) -> Result<usize> {
        self.insert_missing_settings_impl(defaults).await
    }

    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        self.update_setting_impl(key, value, user_id, ip_address).await
    }

    async fn batch_update_settings(
        &self,
        updates: Vec<(String, String)>,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<Vec<SystemSetting>> {
        self.batch_update_settings_impl(updates, user_id, ip_address).await
    }

    async fn list_setting_audits(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        self.list_setting_audits_impl(query).await
    }
}
