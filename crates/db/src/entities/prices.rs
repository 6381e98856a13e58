//! `SeaORM` Entity for prices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    /// `<list_id>__<sku>`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: Uuid,
    pub list_id: Uuid,
    pub sku: String,
    pub cost: Option<Decimal>,
    pub price: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::price_lists::Entity",
        from = "Column::ListId",
        to = "super::price_lists::Column::Id"
    )]
    PriceLists,
}

impl Related<super::price_lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceLists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
