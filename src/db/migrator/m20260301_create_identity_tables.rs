use sea_orm_migration::prelude::*;

use crate::domain::{AUTHORITY_NAME_MAX_LEN, USERNAME_MAX_LEN};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[allow(clippy::cast_possible_truncation)]
const USERNAME_LEN: u32 = USERNAME_MAX_LEN as u32;

#[allow(clippy::cast_possible_truncation)]
const AUTHORITY_LEN: u32 = AUTHORITY_NAME_MAX_LEN as u32;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string_len(USERNAME_LEN)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(Accounts::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::AccountNonExpired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::AccountNonLocked)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::CredentialsNonExpired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::Attributes).text().null())
                    .col(ColumnDef::new(Accounts::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Authorities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Authorities::Name)
                            .string_len(AUTHORITY_LEN)
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // Accounts <-> Authorities join table
        manager
            .create_table(
                Table::create()
                    .table(AccountAuthorities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountAuthorities::Username)
                            .string_len(USERNAME_LEN)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountAuthorities::AuthorityName)
                            .string_len(AUTHORITY_LEN)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_account_authorities")
                            .col(AccountAuthorities::Username)
                            .col(AccountAuthorities::AuthorityName),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_authorities_username")
                            .from(AccountAuthorities::Table, AccountAuthorities::Username)
                            .to(Accounts::Table, Accounts::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_authorities_authority_name")
                            .from(AccountAuthorities::Table, AccountAuthorities::AuthorityName)
                            .to(Authorities::Table, Authorities::Name)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_authorities_authority_name")
                    .table(AccountAuthorities::Table)
                    .col(AccountAuthorities::AuthorityName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountAuthorities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Authorities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Username,
    PasswordHash,
    Enabled,
    AccountNonExpired,
    AccountNonLocked,
    CredentialsNonExpired,
    Attributes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Authorities {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum AccountAuthorities {
    Table,
    Username,
    AuthorityName,
}
