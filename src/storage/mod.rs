use std::collections::BTreeMap;
use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 院系管理方法
    async fn create_department(&self, req: CreateDepartmentRequest) -> Result<Department>;
    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>>;
    async fn list_departments(&self) -> Result<Vec<Department>>;
    async fn update_department(
        &self,
        id: i64,
        update: UpdateDepartmentRequest,
    ) -> Result<Option<Department>>;
    async fn delete_department(&self, id: i64) -> Result<bool>;

    /// 班级管理方法
    // 创建班级
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    // 通过ID获取班级信息
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 列出班级
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;
    // 更新班级信息
    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>>;
    // 删除班级
    async fn delete_class(&self, class_id: i64) -> Result<bool>;

    /// 学生管理方法
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_usn(&self, usn: &str) -> Result<Option<Student>>;
    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>>;
    // 学生及其班级、院系信息
    async fn get_student_detail(&self, student_id: i64) -> Result<Option<StudentDetail>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    async fn delete_student(&self, id: i64) -> Result<bool>;
    // 将学生记录关联到用户账号
    async fn link_student_user(&self, student_id: i64, user_id: i64) -> Result<bool>;

    /// 选课方法
    // 选课（已选时返回已有记录ID）
    async fn enroll_student(&self, student_id: i64, course_id: i64) -> Result<i64>;
    async fn unenroll_student(&self, student_id: i64, course_id: i64) -> Result<bool>;
    // 学生所选课程，按课程名排序
    async fn list_student_courses(&self, student_id: i64) -> Result<Vec<Course>>;

    /// 课程管理方法
    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course>;
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    // 按名称或代码查找课程（不区分大小写）
    async fn find_course_by_name(&self, name: &str) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(&self, id: i64, update: UpdateCourseRequest)
    -> Result<Option<Course>>;
    async fn delete_course(&self, id: i64) -> Result<bool>;

    /// 授课分配方法
    async fn create_assignment(
        &self,
        course_id: i64,
        req: CreateAssignmentRequest,
    ) -> Result<CourseAssignment>;
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<CourseAssignment>>;
    async fn list_assignments(&self, query: AssignmentListQuery) -> Result<Vec<CourseAssignment>>;
    async fn delete_assignment(&self, id: i64) -> Result<bool>;

    /// 课表方法
    // 添加时段，同一班级同一时段已有课程时返回冲突错误
    async fn create_timetable_slot(
        &self,
        assignment_id: i64,
        day: &str,
        period: i32,
    ) -> Result<TimetableSlot>;
    async fn list_timetable_slots(&self, assignment_id: i64) -> Result<Vec<TimetableSlot>>;
    async fn delete_timetable_slot(&self, slot_id: i64) -> Result<bool>;
    // 学生课表：所在班级中已选课程的时段
    async fn student_timetable(
        &self,
        student_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>>;
    // 教师课表
    async fn teacher_timetable(
        &self,
        teacher_id: i64,
        day: Option<&str>,
    ) -> Result<Vec<TimetableEntry>>;

    /// 考勤方法
    // 获取或创建当天场次并按 (学生, 课程, 日期) 写入或覆盖考勤，全部成功或全部回滚
    async fn record_attendance(
        &self,
        assignment_id: i64,
        course_id: i64,
        date: &str,
        entries: &[(i64, bool)],
    ) -> Result<i64>;
    // 学生的考勤明细，按课程分组
    async fn list_student_attendance(
        &self,
        student_id: i64,
    ) -> Result<BTreeMap<i64, Vec<AttendanceDetail>>>;

    /// 成绩方法
    // 按 (选课, 考核) 写入或覆盖成绩
    async fn upsert_mark(&self, enrollment_id: i64, assessment: &str, marks: f64) -> Result<()>;
    async fn list_student_marks(
        &self,
        student_id: i64,
        course_id: Option<i64>,
    ) -> Result<Vec<MarkRecord>>;

    /// 文件管理方法
    // 上传文件
    async fn upload_file(
        &self,
        file_token: &str,
        file_name: &str,
        file_size: &i64,
        file_type: &str,
        user_id: i64,
    ) -> Result<File>;
    // 通过唯一 token 获取文件信息
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>>;

    /// 学习资料方法
    async fn create_material(
        &self,
        title: &str,
        course_id: Option<i64>,
        file_token: &str,
        summary: &str,
        created_by: i64,
    ) -> Result<StudyMaterial>;
    async fn get_material_by_id(&self, id: i64) -> Result<Option<StudyMaterial>>;
    async fn list_materials_with_pagination(
        &self,
        query: MaterialListQuery,
    ) -> Result<MaterialListResponse>;
    async fn update_material_summary(
        &self,
        id: i64,
        summary: &str,
    ) -> Result<Option<StudyMaterial>>;
    async fn delete_material(&self, id: i64) -> Result<bool>;

    /// 试卷模板方法
    async fn create_template(
        &self,
        req: CreateTemplateRequest,
        created_by: i64,
    ) -> Result<PaperTemplate>;
    async fn get_template_by_id(&self, id: i64) -> Result<Option<PaperTemplate>>;
    async fn list_templates_by_user(&self, user_id: i64) -> Result<Vec<PaperTemplate>>;
    async fn delete_template(&self, id: i64) -> Result<bool>;

    /// 试卷方法
    async fn create_question_paper(
        &self,
        template_id: i64,
        title: &str,
        content: &PaperContent,
        difficulty: &DifficultyDistribution,
        generated_by: i64,
    ) -> Result<QuestionPaper>;
    async fn get_question_paper_by_id(&self, id: i64) -> Result<Option<QuestionPaper>>;
    async fn list_question_papers_with_pagination(
        &self,
        query: QuestionPaperListQuery,
    ) -> Result<QuestionPaperListResponse>;
    // 保存编辑后的内容并标记为已编辑
    async fn update_question_paper_content(
        &self,
        id: i64,
        content: &PaperContent,
    ) -> Result<Option<QuestionPaper>>;
    async fn delete_question_paper(&self, id: i64) -> Result<bool>;

    /// 聊天记录方法
    async fn create_chat_message(
        &self,
        user_id: i64,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage>;
    // 最近 limit 条记录，按时间正序
    async fn list_recent_chat_messages(&self, user_id: i64, limit: u64)
    -> Result<Vec<ChatMessage>>;
    async fn clear_chat_history(&self, user_id: i64) -> Result<u64>;

    /// 自适应测试方法
    async fn create_test_session(
        &self,
        user_id: i64,
        questions: &[TestQuestion],
    ) -> Result<TestSession>;
    async fn get_test_session(&self, id: i64) -> Result<Option<TestSession>>;
    // 保存作答进度、完成状态与分析结果；进度已被其他请求推进时返回 false
    async fn save_test_session(&self, session: &TestSession, expected_index: i32)
    -> Result<bool>;
    async fn list_test_sessions(&self, user_id: i64) -> Result<Vec<TestSession>>;

    /// 就业能力评估方法
    async fn create_employability_result(
        &self,
        user_id: i64,
        scores: &BTreeMap<String, f64>,
        overall_score: f64,
        level: i32,
    ) -> Result<EmployabilityResult>;
    async fn list_employability_results(&self, user_id: i64) -> Result<Vec<EmployabilityResult>>;
    async fn employability_stats(&self, user_id: i64) -> Result<EmployabilityStats>;

    /// 系统设置方法
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>>;
    async fn get_setting_by_key(&self, key: &str) -> Result<Option<SystemSetting>>;
    /// 补齐缺失的配置项，返回新插入的条数
    async fn insert_missing_settings(&self, defaults: &[SettingDefault]) -> Result<usize>;
    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting>;
    async fn batch_update_settings(
        &self,
        updates: Vec<(String, String)>,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<Vec<SystemSetting>>;
    async fn list_setting_audits(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
