pub mod auth;
pub mod users;
pub mod departments;
pub mod classes;
pub mod students;
pub mod courses;
pub mod timetable;
pub mod attendance;
pub mod marks;
pub mod files;
pub mod materials;
pub mod question_papers;
pub mod chat;
pub mod adaptive_tests;
pub mod employability;
pub mod system;

pub use adaptive_tests::configure_adaptive_test_routes;
pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use chat::configure_chat_routes;
pub use classes::configure_classes_routes;
pub use courses::configure_course_routes;
pub use departments::configure_department_routes;
pub use employability::configure_employability_routes;
pub use files::configure_file_routes;
pub use marks::configure_marks_routes;
pub use materials::configure_material_routes;
pub use question_papers::configure_question_paper_routes;
pub use students::configure_student_routes;
pub use system::configure_system_routes;
pub use timetable::configure_timetable_routes;
pub use users::configure_user_routes;

/// 注册全部 API 路由
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_department_routes)
        .configure(configure_classes_routes)
        .configure(configure_student_routes)
        .configure(configure_course_routes)
        .configure(configure_timetable_routes)
        .configure(configure_attendance_routes)
        .configure(configure_marks_routes)
        .configure(configure_file_routes)
        .configure(configure_material_routes)
        .configure(configure_question_paper_routes)
        .configure(configure_chat_routes)
        .configure(configure_adaptive_test_routes)
        .configure(configure_employability_routes)
        .configure(configure_system_routes);
}
