use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authorities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
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

impl ActiveModelBehavior for ActiveModel {}
