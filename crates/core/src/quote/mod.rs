//! Quotes: a priced offer that can be sent, approved or rejected, and
//! converted once into an invoice.

pub mod error;
pub mod service;
pub mod types;
pub mod workflow;

pub use error::QuoteError;
pub use service::QuoteService;
pub use types::{ConvertRequest, ConvertedQuote, Quote, QuoteDraft, QuoteStatus};
pub use workflow::QuoteWorkflow;
