use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 学习资料表 ====================
        manager
            .create_table(
                Table::create()
                    .table(StudyMaterials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudyMaterials::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudyMaterials::Title).string().not_null())
                    .col(ColumnDef::new(StudyMaterials::CourseId).big_integer().null())
                    .col(
                        ColumnDef::new(StudyMaterials::FileToken)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudyMaterials::Summary).text().not_null())
                    .col(
                        ColumnDef::new(StudyMaterials::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyMaterials::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyMaterials::Table, StudyMaterials::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyMaterials::Table, StudyMaterials::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 试卷模板表 ====================
        manager
            .create_table(
                Table::create()
                    .table(QuestionPaperTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Name)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Institution)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Course)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Subject)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::TotalMarks)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::Structure)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPaperTemplates::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                QuestionPaperTemplates::Table,
                                QuestionPaperTemplates::CreatedBy,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 试卷表 ====================
        manager
            .create_table(
                Table::create()
                    .table(QuestionPapers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionPapers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionPapers::TemplateId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionPapers::Title).string().not_null())
                    .col(ColumnDef::new(QuestionPapers::Content).text().not_null())
                    .col(
                        ColumnDef::new(QuestionPapers::DifficultyDistribution)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPapers::GeneratedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPapers::GeneratedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionPapers::IsEdited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(QuestionPapers::LastEditedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuestionPapers::Table, QuestionPapers::TemplateId)
                            .to(QuestionPaperTemplates::Table, QuestionPaperTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuestionPapers::Table, QuestionPapers::GeneratedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 聊天消息表 ====================
        manager
            .create_table(
                Table::create()
                    .table(ChatMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatMessages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatMessages::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ChatMessages::Role).string().not_null())
                    .col(ColumnDef::new(ChatMessages::Content).text().not_null())
                    .col(
                        ColumnDef::new(ChatMessages::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ChatMessages::Table, ChatMessages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chat_messages_user_id")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::UserId)
                    .to_owned(),
            )
            .await?;

        // ==================== 自适应测评表 ====================
        manager
            .create_table(
                Table::create()
                    .table(AdaptiveTestSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::Questions)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::Answers)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::CurrentIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::TotalQuestions)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::StartedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AdaptiveTestSessions::CompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(AdaptiveTestSessions::Analysis).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AdaptiveTestSessions::Table, AdaptiveTestSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 就业能力评估结果表 ====================
        manager
            .create_table(
                Table::create()
                    .table(EmployabilityResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmployabilityResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmployabilityResults::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployabilityResults::Scores)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployabilityResults::OverallScore)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployabilityResults::Level)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployabilityResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EmployabilityResults::Table, EmployabilityResults::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmployabilityResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdaptiveTestSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestionPapers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestionPaperTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudyMaterials::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum StudyMaterials {
    #[sea_orm(iden = "study_materials")]
    Table,
    Id,
    Title,
    CourseId,
    FileToken,
    Summary,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QuestionPaperTemplates {
    #[sea_orm(iden = "question_paper_templates")]
    Table,
    Id,
    Name,
    Institution,
    Course,
    Subject,
    TotalMarks,
    DurationMinutes,
    Structure,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QuestionPapers {
    #[sea_orm(iden = "question_papers")]
    Table,
    Id,
    TemplateId,
    Title,
    Content,
    DifficultyDistribution,
    GeneratedBy,
    GeneratedAt,
    IsEdited,
    LastEditedAt,
}

#[derive(DeriveIden)]
enum ChatMessages {
    #[sea_orm(iden = "chat_messages")]
    Table,
    Id,
    UserId,
    Role,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdaptiveTestSessions {
    #[sea_orm(iden = "adaptive_test_sessions")]
    Table,
    Id,
    UserId,
    Questions,
    Answers,
    CurrentIndex,
    TotalQuestions,
    StartedAt,
    Completed,
    CompletedAt,
    Analysis,
}

#[derive(DeriveIden)]
enum EmployabilityResults {
    #[sea_orm(iden = "employability_results")]
    Table,
    Id,
    UserId,
    Scores,
    OverallScore,
    Level,
    CreatedAt,
}
