use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub electrician_id: Uuid,
    pub base_price: i64,
    pub onsite_price: i64,
    pub duration: String,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::electricians::Entity",
        from = "Column::ElectricianId",
        to = "super::electricians::Column::Id"
    )]
    Electrician,
}

impl Related<super::electricians::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Electrician.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
