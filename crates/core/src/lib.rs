//! Core business logic for Arqon.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here, together
//! with the [`store::DocumentStore`] seam and an in-memory implementation.
//!
//! # Modules
//!
//! - `pricing` - Numeric parsing, bonification chains, rounding and price derivation
//! - `ledger` - Invoice, payment and cash postings; current-account balances
//! - `quote` - Quote workflow and conversion into invoices
//! - `catalog` - Products, price lists and bulk imports
//! - `customer` - Customers, customer imports and sales leads
//! - `store` - Atomic document store abstraction

pub mod catalog;
pub mod customer;
pub mod ledger;
pub mod pricing;
pub mod quote;
pub mod store;
