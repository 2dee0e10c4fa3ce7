use sea_orm::entity::prelude::*;

/// Provider details for profiles with the electrician role; shares the profile id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "electricians")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub specialties: Vec<String>,
    pub experience_years: i32,
    pub rating: f64,
    pub review_count: i32,
    pub certifications: Vec<String>,
    pub service_areas: Vec<String>,
    pub base_rate: i64,
    pub onsite_rate: i64,
    pub availability: Vec<String>,
    pub shop_address: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::Id",
        to = "super::profiles::Column::Id"
    )]
    Profile,
    #[sea_orm(has_many = "super::services::Entity")]
    Services,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
