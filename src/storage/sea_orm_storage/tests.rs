use super::SeaOrmStorage;
use crate::errors::CampusError;
use crate::models::{
    chat::entities::ChatRole,
    classes::requests::CreateClassRequest,
    courses::requests::{CreateAssignmentRequest, CreateCourseRequest},
    departments::requests::CreateDepartmentRequest,
    question_papers::entities::{DifficultyDistribution, PaperContent},
    students::requests::CreateStudentRequest,
    system::entities::{SettingDefault, SettingValueType},
    users::{entities::UserRole, requests::CreateUserRequest},
};

struct Fixture {
    storage: SeaOrmStorage,
    teacher_id: i64,
    class_id: i64,
    course_id: i64,
    student_id: i64,
}

async fn fixture() -> Fixture {
    let storage = SeaOrmStorage::new_in_memory().await.unwrap();

    let dept = storage
        .create_department_impl(CreateDepartmentRequest {
            code: "CSE".to_string(),
            name: "Computer Science".to_string(),
        })
        .await
        .unwrap();

    let class = storage
        .create_class_impl(CreateClassRequest {
            department_id: dept.id,
            semester: 5,
            section: "A".to_string(),
        })
        .await
        .unwrap();

    let teacher = storage
        .create_user_impl(CreateUserRequest {
            username: "teacher1".to_string(),
            email: "teacher1@example.com".to_string(),
            password: "hash".to_string(),
            role: UserRole::Teacher,
            display_name: Some("Dr. Rao".to_string()),
            avatar_url: None,
            department_id: Some(dept.id),
        })
        .await
        .unwrap();

    let course = storage
        .create_course_impl(CreateCourseRequest {
            code: "CS501".to_string(),
            name: "Compiler Design".to_string(),
            department_id: dept.id,
            semester: 5,
            credits: 4,
        })
        .await
        .unwrap();

    let student = storage
        .create_student_impl(CreateStudentRequest {
            usn: "4KT21CS001".to_string(),
            name: "Asha".to_string(),
            class_id: class.id,
            user_id: None,
        })
        .await
        .unwrap();

    Fixture {
        storage,
        teacher_id: teacher.id,
        class_id: class.id,
        course_id: course.id,
        student_id: student.id,
    }
}

#[tokio::test]
async fn test_duplicate_usn_is_conflict() {
    let f = fixture().await;
    let err = f
        .storage
        .create_student_impl(CreateStudentRequest {
            usn: "4KT21CS001".to_string(),
            name: "Other".to_string(),
            class_id: f.class_id,
            user_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::Conflict(_)));
}

#[tokio::test]
async fn test_link_student_user_only_once() {
    let f = fixture().await;
    assert!(
        f.storage
            .link_student_user_impl(f.student_id, f.teacher_id)
            .await
            .unwrap()
    );
    assert!(
        !f.storage
            .link_student_user_impl(f.student_id, f.teacher_id + 1)
            .await
            .unwrap()
    );
    let student = f
        .storage
        .get_student_by_id_impl(f.student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.user_id, Some(f.teacher_id));
}

#[tokio::test]
async fn test_timetable_slot_conflict_and_student_view() {
    let f = fixture().await;
    let assignment = f
        .storage
        .create_assignment_impl(
            f.course_id,
            CreateAssignmentRequest {
                class_id: f.class_id,
                teacher_id: f.teacher_id,
            },
        )
        .await
        .unwrap();

    f.storage
        .create_timetable_slot_impl(assignment.id, "Monday", 1)
        .await
        .unwrap();
    let err = f
        .storage
        .create_timetable_slot_impl(assignment.id, "Monday", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::Conflict(_)));

    // 未选课时学生课表为空
    let empty = f
        .storage
        .student_timetable_impl(f.student_id, None)
        .await
        .unwrap();
    assert!(empty.is_empty());

    f.storage
        .enroll_student_impl(f.student_id, f.course_id)
        .await
        .unwrap();
    let entries = f
        .storage
        .student_timetable_impl(f.student_id, Some("Monday"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].teacher_name, "Dr. Rao");
    assert_eq!(entries[0].course_code, "CS501");
}

#[tokio::test]
async fn test_enroll_is_idempotent() {
    let f = fixture().await;
    let first = f
        .storage
        .enroll_student_impl(f.student_id, f.course_id)
        .await
        .unwrap();
    let second = f
        .storage
        .enroll_student_impl(f.student_id, f.course_id)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(
        f.storage
            .list_student_courses_impl(f.student_id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_attendance_upsert_keeps_one_row_per_day() {
    let f = fixture().await;
    let assignment = f
        .storage
        .create_assignment_impl(
            f.course_id,
            CreateAssignmentRequest {
                class_id: f.class_id,
                teacher_id: f.teacher_id,
            },
        )
        .await
        .unwrap();
    let mut sessions = Vec::new();
    for present in [false, true] {
        let session = f
            .storage
            .record_attendance_impl(
                assignment.id,
                f.course_id,
                "2025-03-01",
                &[(f.student_id, present)],
            )
            .await
            .unwrap();
        sessions.push(session);
    }
    assert_eq!(sessions[0], sessions[1]);

    let grouped = f
        .storage
        .list_student_attendance_impl(f.student_id)
        .await
        .unwrap();
    let details = &grouped[&f.course_id];
    assert_eq!(details.len(), 1);
    assert!(details[0].present);
}

#[tokio::test]
async fn test_concurrent_attendance_shares_one_session() {
    let f = fixture().await;
    let assignment = f
        .storage
        .create_assignment_impl(
            f.course_id,
            CreateAssignmentRequest {
                class_id: f.class_id,
                teacher_id: f.teacher_id,
            },
        )
        .await
        .unwrap();
    let entries = [(f.student_id, true)];

    let (a, b) = tokio::join!(
        f.storage
            .record_attendance_impl(assignment.id, f.course_id, "2025-02-03", &entries),
        f.storage
            .record_attendance_impl(assignment.id, f.course_id, "2025-02-03", &entries),
    );
    assert_eq!(a.unwrap(), b.unwrap());

    let grouped = f
        .storage
        .list_student_attendance_impl(f.student_id)
        .await
        .unwrap();
    assert_eq!(grouped[&f.course_id].len(), 1);
}

#[tokio::test]
async fn test_failed_attendance_batch_rolls_back() {
    let f = fixture().await;
    let assignment = f
        .storage
        .create_assignment_impl(
            f.course_id,
            CreateAssignmentRequest {
                class_id: f.class_id,
                teacher_id: f.teacher_id,
            },
        )
        .await
        .unwrap();

    // 第二条指向不存在的学生，外键约束使整批失败
    let result = f
        .storage
        .record_attendance_impl(
            assignment.id,
            f.course_id,
            "2025-03-02",
            &[(f.student_id, true), (f.student_id + 1000, true)],
        )
        .await;
    assert!(result.is_err());

    let grouped = f
        .storage
        .list_student_attendance_impl(f.student_id)
        .await
        .unwrap();
    assert!(grouped.is_empty());
}

#[tokio::test]
async fn test_concurrent_enrollment_returns_same_row() {
    let f = fixture().await;
    let (a, b) = tokio::join!(
        f.storage.enroll_student_impl(f.student_id, f.course_id),
        f.storage.enroll_student_impl(f.student_id, f.course_id),
    );
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_marks_upsert_overwrites() {
    let f = fixture().await;
    let enrollment = f
        .storage
        .enroll_student_impl(f.student_id, f.course_id)
        .await
        .unwrap();
    f.storage
        .upsert_mark_impl(enrollment, "Internal 1", 18.0)
        .await
        .unwrap();
    f.storage
        .upsert_mark_impl(enrollment, "Internal 1", 22.5)
        .await
        .unwrap();

    let marks = f
        .storage
        .list_student_marks_impl(f.student_id, None)
        .await
        .unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].marks, 22.5);
    assert_eq!(marks[0].course_name, "Compiler Design");
}

#[tokio::test]
async fn test_course_lookup_by_name_is_case_insensitive() {
    let f = fixture().await;
    let exact = f
        .storage
        .find_course_by_name_impl("compiler design")
        .await
        .unwrap();
    assert_eq!(exact.map(|c| c.id), Some(f.course_id));

    let partial = f.storage.find_course_by_name_impl("compiler").await.unwrap();
    assert_eq!(partial.map(|c| c.id), Some(f.course_id));

    assert!(
        f.storage
            .find_course_by_name_impl("Thermodynamics")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_chat_history_window_is_chronological() {
    let f = fixture().await;
    for i in 0..4 {
        let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
        f.storage
            .create_chat_message_impl(f.teacher_id, role, &format!("m{i}"))
            .await
            .unwrap();
    }

    let recent = f
        .storage
        .list_recent_chat_messages_impl(f.teacher_id, 2)
        .await
        .unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m2", "m3"]);

    assert_eq!(
        f.storage.clear_chat_history_impl(f.teacher_id).await.unwrap(),
        4
    );
}

#[tokio::test]
async fn test_question_paper_edit_marks_edited() {
    let f = fixture().await;
    let template = f
        .storage
        .create_template_impl(
            serde_json::from_value(serde_json::json!({
                "name": "Midterm",
                "institution": "KTU",
                "course": "B.Tech",
                "subject": "Compiler Design",
                "total_marks": 50,
                "duration_minutes": 90,
                "sections": [
                    {"name": "Part A", "type": "short_answer", "num_questions": 2, "marks_per_question": 5.0}
                ]
            }))
            .unwrap(),
            f.teacher_id,
        )
        .await
        .unwrap();
    assert_eq!(template.sections.len(), 1);

    let paper = f
        .storage
        .create_question_paper_impl(
            template.id,
            "Midterm - Compiler Design",
            &PaperContent::default(),
            &DifficultyDistribution::default(),
            f.teacher_id,
        )
        .await
        .unwrap();
    assert!(!paper.is_edited);

    let edited = f
        .storage
        .update_question_paper_content_impl(paper.id, &PaperContent::default())
        .await
        .unwrap()
        .unwrap();
    assert!(edited.is_edited);
    assert!(edited.last_edited_at.is_some());

    assert!(
        f.storage
            .update_question_paper_content_impl(paper.id + 100, &PaperContent::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_build_database_url() {
    assert_eq!(
        SeaOrmStorage::build_database_url("campus.db").unwrap(),
        "sqlite://campus.db?mode=rwc"
    );
    assert!(SeaOrmStorage::build_database_url("postgres://db/campus").is_ok());
    assert!(SeaOrmStorage::build_database_url("ftp://nowhere").is_err());
}

fn setting(key: &'static str, value: &str) -> SettingDefault {
    SettingDefault {
        key,
        value: value.to_string(),
        value_type: SettingValueType::Integer,
        description: "test",
    }
}

#[tokio::test]
async fn test_missing_settings_are_inserted_once() {
    let f = fixture().await;
    let defaults = vec![
        setting("chat.history_window", "10"),
        setting("question_paper.max_past_questions", "15"),
    ];

    assert_eq!(f.storage.insert_missing_settings_impl(&defaults).await.unwrap(), 2);
    f.storage
        .update_setting_impl("chat.history_window", "25", f.teacher_id, None)
        .await
        .unwrap();

    // 已存在的配置项不会被默认值覆盖
    assert_eq!(f.storage.insert_missing_settings_impl(&defaults).await.unwrap(), 0);
    let window = f
        .storage
        .get_setting_by_key_impl("chat.history_window")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(window.value, "25");
    assert_eq!(window.updated_by, Some(f.teacher_id));
}

#[tokio::test]
async fn test_batch_update_rolls_back_on_unknown_key() {
    let f = fixture().await;
    f.storage
        .insert_missing_settings_impl(&[setting("chat.history_window", "10")])
        .await
        .unwrap();

    let result = f
        .storage
        .batch_update_settings_impl(
            vec![
                ("chat.history_window".to_string(), "30".to_string()),
                ("no.such_key".to_string(), "1".to_string()),
            ],
            f.teacher_id,
            Some("127.0.0.1".to_string()),
        )
        .await;
    assert!(matches!(result, Err(CampusError::NotFound(_))));

    let window = f
        .storage
        .get_setting_by_key_impl("chat.history_window")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(window.value, "10");

    let audits = f
        .storage
        .list_setting_audits_impl(Default::default())
        .await
        .unwrap();
    assert_eq!(audits.pagination.total, 0);
}
