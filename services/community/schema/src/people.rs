use sea_orm::entity::prelude::*;

/// Directory record imported from the events platform.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "people")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Guest id on the events platform.
    #[sea_orm(unique)]
    pub api_id: String,
    /// Always stored lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub job_title: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::users::Entity")]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
