//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    /// Priced lines as a JSON array.
    pub lines: Json,
    pub payment_term: String,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub status: String,
    pub notes: String,
    pub quote_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_movements::Entity")]
    CashMovements,
    #[sea_orm(has_many = "super::current_account_movements::Entity")]
    CurrentAccountMovements,
}

impl Related<super::cash_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashMovements.def()
    }
}

impl Related<super::current_account_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrentAccountMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
