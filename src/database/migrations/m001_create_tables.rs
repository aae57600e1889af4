use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().default(""))
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuthTokens::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(AuthTokens::UserId).integer().not_null().unique_key())
                    .col(ColumnDef::new(AuthTokens::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_tokens_user_id")
                            .from(AuthTokens::Table, AuthTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Datasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Datasets::Name).string().not_null())
                    .col(ColumnDef::new(Datasets::OriginalFilename).string().not_null())
                    .col(ColumnDef::new(Datasets::UploadedBy).integer().not_null())
                    .col(ColumnDef::new(Datasets::UploadedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Datasets::FilePath).string())
                    .col(ColumnDef::new(Datasets::TotalCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Datasets::AvgFlowrate).double())
                    .col(ColumnDef::new(Datasets::AvgPressure).double())
                    .col(ColumnDef::new(Datasets::AvgTemperature).double())
                    .col(ColumnDef::new(Datasets::TypeDistribution).text().not_null().default("{}"))
                    .col(ColumnDef::new(Datasets::PreviewRows).text().not_null().default("[]"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datasets_uploaded_by")
                            .from(Datasets::Table, Datasets::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipment::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Equipment::Name).string().not_null())
                    .col(ColumnDef::new(Equipment::Type).string().not_null())
                    .col(ColumnDef::new(Equipment::Flowrate).double())
                    .col(ColumnDef::new(Equipment::Pressure).double())
                    .col(ColumnDef::new(Equipment::Temperature).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_equipment_dataset_id")
                            .from(Equipment::Table, Equipment::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_datasets_uploaded_at")
                    .table(Datasets::Table)
                    .col(Datasets::UploadedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_equipment_dataset_id")
                    .table(Equipment::Table)
                    .col(Equipment::DatasetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Datasets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Key,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Datasets {
    Table,
    Id,
    Name,
    OriginalFilename,
    UploadedBy,
    UploadedAt,
    FilePath,
    TotalCount,
    AvgFlowrate,
    AvgPressure,
    AvgTemperature,
    TypeDistribution,
    PreviewRows,
}

#[derive(DeriveIden)]
enum Equipment {
    Table,
    Id,
    DatasetId,
    Name,
    Type,
    Flowrate,
    Pressure,
    Temperature,
}
