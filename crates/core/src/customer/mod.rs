//! Customers, customer imports and the sales lead pipeline.

pub mod error;
pub mod import;
pub mod service;
pub mod types;

pub use error::CustomerError;
pub use import::{CustomerImport, CustomerImporter, CustomerRow, FlagCell};
pub use service::CustomerService;
pub use types::{
    Customer, CustomerFields, CustomerQuery, Lead, LeadStage, NewLead, UpsertOutcome,
    VatCondition,
};
