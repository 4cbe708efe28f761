use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("sccm_migrations")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("name").string().not_null())
                    .col(ColumnDef::new("description").string().null())
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("status").string().not_null())
                    .col(
                        ColumnDef::new("total_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("matched_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("partial_match_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("unmatched_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("migrated_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("failed_apps")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("last_migration_at")
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("sccm_applications")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("migration_id").integer().not_null())
                    .col(ColumnDef::new("sccm_ci_id").string().null())
                    .col(ColumnDef::new("name").string().not_null())
                    .col(ColumnDef::new("manufacturer").string().null())
                    .col(ColumnDef::new("version").string().null())
                    .col(ColumnDef::new("technology").string().null())
                    .col(
                        ColumnDef::new("is_deployed")
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new("deployment_count")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new("match_status").string().not_null())
                    .col(ColumnDef::new("match_confidence").double().null())
                    .col(ColumnDef::new("matched_package_id").string().null())
                    .col(ColumnDef::new("matched_package_name").string().null())
                    .col(ColumnDef::new("match_candidates").json().null())
                    .col(ColumnDef::new("detection_rules").json().null())
                    .col(ColumnDef::new("install_command").text().null())
                    .col(ColumnDef::new("uninstall_command").text().null())
                    .col(ColumnDef::new("install_behavior").string().null())
                    .col(ColumnDef::new("preserve_detection").boolean().null())
                    .col(ColumnDef::new("preserve_install_commands").boolean().null())
                    .col(ColumnDef::new("use_winget_defaults").boolean().null())
                    .col(ColumnDef::new("migration_status").string().not_null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sccm_applications-migration_id")
                            .from("sccm_applications", "migration_id")
                            .to("sccm_migrations", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("cart_items")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("migration_id").integer().null())
                    .col(ColumnDef::new("application_id").integer().null())
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("winget_id").string().not_null())
                    .col(ColumnDef::new("display_name").string().not_null())
                    .col(ColumnDef::new("version").string().null())
                    .col(ColumnDef::new("payload").json().not_null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cart_items-migration_id")
                            .from("cart_items", "migration_id")
                            .to("sccm_migrations", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("update_checks")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("winget_id").string().not_null())
                    .col(ColumnDef::new("current_version").string().null())
                    .col(ColumnDef::new("latest_version").string().not_null())
                    .col(
                        ColumnDef::new("detected_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("update_policies")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("winget_id").string().not_null())
                    .col(ColumnDef::new("policy_type").string().not_null())
                    .col(
                        ColumnDef::new("is_enabled")
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new("deployment_config").json().not_null())
                    .col(
                        ColumnDef::new("consecutive_failures")
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new("last_auto_update_at")
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new("upload_history_id").integer().null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("upload_histories")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("winget_id").string().not_null())
                    .col(ColumnDef::new("display_name").string().null())
                    .col(ColumnDef::new("version").string().null())
                    .col(ColumnDef::new("status").string().not_null())
                    .col(ColumnDef::new("deployment_config").json().null())
                    .col(ColumnDef::new("packaging_job_id").integer().null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("packaging_jobs")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("user_id").string().not_null())
                    .col(ColumnDef::new("tenant_id").string().not_null())
                    .col(ColumnDef::new("winget_id").string().not_null())
                    .col(ColumnDef::new("display_name").string().not_null())
                    .col(ColumnDef::new("publisher").string().null())
                    .col(ColumnDef::new("version").string().not_null())
                    .col(ColumnDef::new("status").string().not_null())
                    .col(ColumnDef::new("update_check_id").integer().null())
                    .col(ColumnDef::new("job_inputs").json().not_null())
                    .col(ColumnDef::new("run_id").string().null())
                    .col(ColumnDef::new("run_url").string().null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("packaging_jobs").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("upload_histories").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("update_policies").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("update_checks").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("cart_items").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("sccm_applications").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("sccm_migrations").to_owned())
            .await?;

        Ok(())
    }
}
