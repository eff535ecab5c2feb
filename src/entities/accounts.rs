use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    pub enabled: bool,

    pub account_non_expired: bool,

    pub account_non_locked: bool,

    pub credentials_non_expired: bool,

    /// JSON object of extension attributes
    pub attributes: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_authorities::Entity")]
    AccountAuthorities,
}

impl Related<super::account_authorities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountAuthorities.def()
    }
}

impl Related<super::authorities::Entity> for Entity {
    fn to() -> RelationDef {
        super::account_authorities::Relation::Authority.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::account_authorities::Relation::Account.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
