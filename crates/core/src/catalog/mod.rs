//! Product catalog, price lists and bulk imports.

pub mod error;
pub mod import;
pub mod service;
pub mod types;

pub use error::{CatalogError, ImportError, SkippedRow};
pub use import::{
    CatalogImporter, ImportReport, PriceListHeader, PriceListImport, PriceListOptions, PriceRow,
    ProductImport, ProductRow,
};
pub use service::CatalogService;
pub use types::{
    BASE_LIST_CODE, DEFAULT_VAT_PERCENT, NewProduct, PriceEntry, PriceList, Product,
    ProductDetails, price_list_id_for_code, product_id_for_sku,
};
