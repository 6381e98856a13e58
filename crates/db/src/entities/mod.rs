//! `SeaORM` entities, one table per document collection.
//!
//! Every table carries `tenant_id`; the store filters on it in every query.

// `DeriveEntityModel` generates public items that cannot carry docs.
#![allow(missing_docs)]

pub mod cash_movements;
pub mod current_account_movements;
pub mod customers;
pub mod invoices;
pub mod leads;
pub mod price_lists;
pub mod prices;
pub mod products;
pub mod quotes;
pub mod receipts;
