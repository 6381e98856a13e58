//! Bulk customer import.
//!
//! Rows match existing customers by document number, then by email. Matched
//! rows update the customer when `upsert` is set; unmatched rows create one.
//! Writes go out in chunks of `customer_chunk_size` rows, each chunk one
//! atomic commit. Re-running an import after a partial failure finds the
//! customers the committed chunks created and updates them instead.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arqon_shared::ImportConfig;
use arqon_shared::types::{CustomerId, TenantId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::types::{Customer, CustomerFields, VatCondition};
use crate::catalog::error::{ImportError, SkippedRow};
use crate::catalog::import::{ImportReport, RowWrites, commit_chunks};
use crate::ledger::retry::RetryPolicy;
use crate::pricing::SourceAmount;
use crate::store::{DocumentStore, Write};

/// A yes/no cell: a JSON boolean or text such as `"si"` or `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagCell {
    /// A JSON boolean.
    Bool(bool),
    /// Free text.
    Text(String),
}

impl FlagCell {
    /// The flag's value, or `None` for text that is neither yes nor no.
    #[must_use]
    pub fn resolve(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(text) => match text.trim().to_lowercase().as_str() {
                "true" | "1" | "si" | "sí" | "yes" | "activo" | "habilitado" => Some(true),
                "false" | "0" | "no" | "inactivo" | "deshabilitado" => Some(false),
                _ => None,
            },
        }
    }
}

/// One customer row. The discount may be a number or raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerRow {
    /// Tax or identity document number.
    pub doc_number: Option<String>,
    /// Legal name. Required for rows that create a customer.
    pub name: Option<String>,
    /// Trade name.
    pub trade_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Province.
    pub province: Option<String>,
    /// VAT condition by fiscal name.
    pub vat_condition: Option<String>,
    /// Standing discount in percent.
    pub bonif_percent: Option<SourceAmount>,
    /// Free text notes.
    pub notes: Option<String>,
    /// Active flag.
    pub active: Option<FlagCell>,
}

/// Customer import request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerImport {
    /// Update customers that already exist instead of skipping them.
    #[serde(default)]
    pub upsert: bool,
    /// Active flag of created customers whose row has none.
    #[serde(default = "default_active")]
    pub default_active: bool,
    /// Rows to import.
    #[serde(default)]
    pub items: Vec<CustomerRow>,
}

impl Default for CustomerImport {
    fn default() -> Self {
        Self {
            upsert: false,
            default_active: true,
            items: Vec::new(),
        }
    }
}

const fn default_active() -> bool {
    true
}

/// Runs customer imports against a [`DocumentStore`].
#[derive(Clone)]
pub struct CustomerImporter {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl CustomerImporter {
    /// Creates an importer. A zero chunk size is treated as one.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy, config: &ImportConfig) -> Self {
        Self {
            store,
            retry,
            chunk_size: config.customer_chunk_size.max(1),
        }
    }

    /// Imports customer rows.
    ///
    /// Rows with an invalid email, discount or VAT condition are skipped and
    /// reported, as are rows that would create a customer without a name. A
    /// row matching a customer (in the store or earlier in the request)
    /// updates it when `upsert` is set and is skipped otherwise.
    ///
    /// # Errors
    ///
    /// Returns `NoValidRows`, a `Store` error from the initial lookup, or
    /// `ChunkFailed` with the progress made so far.
    #[instrument(skip_all, fields(tenant_id = %tenant, rows = request.items.len(), upsert = request.upsert))]
    pub async fn import_customers(
        &self,
        tenant: TenantId,
        request: &CustomerImport,
    ) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport {
            total: request.items.len(),
            ..ImportReport::default()
        };

        let mut accepted = Vec::new();
        for (index, row) in request.items.iter().enumerate() {
            match normalize_customer_row(row) {
                Ok(fields) => accepted.push((index, fields)),
                Err(reason) => report.skipped.push(SkippedRow::new(index, reason)),
            }
        }
        if accepted.is_empty() {
            return Err(ImportError::NoValidRows {
                skipped: report.skipped,
            });
        }

        let doc_numbers = distinct(accepted.iter().filter_map(|(_, f)| f.doc_number.as_ref()));
        let emails = distinct(accepted.iter().filter_map(|(_, f)| f.email.as_ref()));
        let mut keys = CustomerKeys::default();
        for customer in self.store.find_customers(tenant, &doc_numbers, &emails).await? {
            keys.remember(
                customer.doc_number.as_deref(),
                customer.email.as_deref(),
                customer.id,
            );
        }

        let now = Utc::now();
        let mut rows = Vec::with_capacity(accepted.len());
        for (index, fields) in accepted {
            match keys.lookup(&fields) {
                Some(customer_id) if request.upsert => {
                    keys.remember(
                        fields.doc_number.as_deref(),
                        fields.email.as_deref(),
                        customer_id,
                    );
                    report.updated += 1;
                    rows.push(RowWrites {
                        writes: vec![Write::UpdateCustomer {
                            customer_id,
                            fields,
                        }],
                    });
                }
                Some(_) => report
                    .skipped
                    .push(SkippedRow::new(index, "customer already exists")),
                None => match Customer::create(tenant, fields, request.default_active, now) {
                    Ok(customer) => {
                        keys.remember(
                            customer.doc_number.as_deref(),
                            customer.email.as_deref(),
                            customer.id,
                        );
                        report.inserted += 1;
                        rows.push(RowWrites {
                            writes: vec![Write::InsertCustomer(customer)],
                        });
                    }
                    Err(err) => report.skipped.push(SkippedRow::new(index, err.to_string())),
                },
            }
        }
        report.skipped.sort_by_key(|row| row.index);

        commit_chunks(
            self.store.as_ref(),
            self.retry,
            tenant,
            self.chunk_size,
            rows,
            &mut report,
        )
        .await?;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped.len(),
            "customer import finished"
        );
        Ok(report)
    }
}

/// Upsert keys seen so far. The first customer to claim a key keeps it.
#[derive(Default)]
struct CustomerKeys {
    by_doc: HashMap<String, CustomerId>,
    by_email: HashMap<String, CustomerId>,
}

impl CustomerKeys {
    fn remember(&mut self, doc_number: Option<&str>, email: Option<&str>, id: CustomerId) {
        if let Some(doc) = doc_number {
            self.by_doc.entry(doc.to_string()).or_insert(id);
        }
        if let Some(email) = email {
            self.by_email.entry(email.to_string()).or_insert(id);
        }
    }

    fn lookup(&self, fields: &CustomerFields) -> Option<CustomerId> {
        fields
            .doc_number
            .as_ref()
            .and_then(|doc| self.by_doc.get(doc))
            .or_else(|| fields.email.as_ref().and_then(|email| self.by_email.get(email)))
            .copied()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_customer_row(row: &CustomerRow) -> Result<CustomerFields, String> {
    let vat_condition = row
        .vat_condition
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::parse::<VatCondition>)
        .transpose()?;
    let bonif_percent = row
        .bonif_percent
        .as_ref()
        .map(|cell| cell.resolve().map_err(|e| format!("bonif_percent: {e}")))
        .transpose()?;

    CustomerFields {
        doc_number: row.doc_number.clone(),
        name: row.name.clone(),
        trade_name: row.trade_name.clone(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        address: row.address.clone(),
        city: row.city.clone(),
        province: row.province.clone(),
        vat_condition,
        bonif_percent,
        notes: row.notes.clone(),
        active: row.active.as_ref().and_then(FlagCell::resolve),
    }
    .normalize()
    .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::types::CustomerQuery;
    use crate::store::{InMemoryStore, StoreError};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn importer(store: &Arc<InMemoryStore>, customer_chunk_size: usize) -> CustomerImporter {
        CustomerImporter::new(
            store.clone(),
            RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::ZERO,
                max_backoff: Duration::ZERO,
            },
            &ImportConfig {
                customer_chunk_size,
                ..ImportConfig::default()
            },
        )
    }

    fn row(doc: Option<&str>, name: Option<&str>, email: Option<&str>) -> CustomerRow {
        CustomerRow {
            doc_number: doc.map(str::to_string),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            ..CustomerRow::default()
        }
    }

    async fn all(store: &InMemoryStore, tenant: TenantId) -> Vec<Customer> {
        let query = CustomerQuery {
            limit: 100,
            ..CustomerQuery::default()
        };
        store.list_customers(tenant, &query).await.unwrap()
    }

    #[tokio::test]
    async fn test_import_creates_and_skips_bad_rows() {
        let store = Arc::new(InMemoryStore::new());
        let tenant = TenantId::new();
        let request = CustomerImport {
            items: vec![
                CustomerRow {
                    bonif_percent: Some(SourceAmount::from("7,5")),
                    vat_condition: Some("RI".into()),
                    active: Some(FlagCell::Text("no".into())),
                    ..row(Some("30-1"), Some("ACME"), None)
                },
                row(Some("30-2"), None, None),
                row(None, Some("Bad mail"), Some("nope")),
                CustomerRow {
                    vat_condition: Some("IVA".into()),
                    ..row(None, Some("Bad VAT"), None)
                },
                row(None, Some("Obras del Sur"), Some("obras@sur.com")),
            ],
            ..CustomerImport::default()
        };

        let report = importer(&store, 400).import_customers(tenant, &request).await.unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.inserted, 2);
        let skipped: Vec<usize> = report.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2, 3]);

        let customers = all(&store, tenant).await;
        let acme = customers.iter().find(|c| c.name == "ACME").unwrap();
        assert_eq!(acme.bonif_percent, dec!(7.5));
        assert_eq!(acme.vat_condition, Some(VatCondition::RegisteredPayer));
        assert!(!acme.active);
        let obras = customers.iter().find(|c| c.name == "Obras del Sur").unwrap();
        assert!(obras.active);
    }

    #[tokio::test]
    async fn test_upsert_updates_by_document_then_email() {
        let store = Arc::new(InMemoryStore::new());
        let tenant = TenantId::new();
        let seed = CustomerImport {
            items: vec![
                row(Some("30-1"), Some("ACME"), None),
                row(None, Some("Obras del Sur"), Some("obras@sur.com")),
            ],
            ..CustomerImport::default()
        };
        importer(&store, 400).import_customers(tenant, &seed).await.unwrap();

        let request = CustomerImport {
            upsert: true,
            items: vec![
                CustomerRow {
                    city: Some("Rosario".into()),
                    ..row(Some("30-1"), None, None)
                },
                row(Some("30-9"), None, Some("obras@sur.com")),
            ],
            ..CustomerImport::default()
        };
        let report = importer(&store, 400).import_customers(tenant, &request).await.unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.inserted, 0);
        let customers = all(&store, tenant).await;
        assert_eq!(customers.len(), 2);
        let acme = customers.iter().find(|c| c.name == "ACME").unwrap();
        assert_eq!(acme.city.as_deref(), Some("Rosario"));
        let obras = customers.iter().find(|c| c.name == "Obras del Sur").unwrap();
        assert_eq!(obras.doc_number.as_deref(), Some("30-9"));
    }

    #[tokio::test]
    async fn test_existing_customer_skipped_without_upsert() {
        let store = Arc::new(InMemoryStore::new());
        let tenant = TenantId::new();
        let request = CustomerImport {
            items: vec![
                row(Some("30-1"), Some("ACME"), None),
                row(Some("30-1"), Some("ACME again"), None),
            ],
            ..CustomerImport::default()
        };

        let report = importer(&store, 400).import_customers(tenant, &request).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, vec![SkippedRow::new(1, "customer already exists")]);
        assert_eq!(all(&store, tenant).await.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_key_in_one_request_updates_the_new_customer() {
        let store = Arc::new(InMemoryStore::new());
        let tenant = TenantId::new();
        let request = CustomerImport {
            upsert: true,
            items: vec![
                row(Some("30-1"), Some("ACME"), None),
                CustomerRow {
                    phone: Some("341-555".into()),
                    ..row(Some("30-1"), None, None)
                },
            ],
            ..CustomerImport::default()
        };

        // Chunk size 1: the insert and the update land in different commits.
        let report = importer(&store, 1).import_customers(tenant, &request).await.unwrap();

        assert_eq!((report.inserted, report.updated), (1, 1));
        assert_eq!(report.chunks_committed, 2);
        let customers = all(&store, tenant).await;
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].phone.as_deref(), Some("341-555"));
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_earlier_chunks_and_rerun_converges() {
        let store = Arc::new(InMemoryStore::new());
        let tenant = TenantId::new();
        let request = CustomerImport {
            upsert: true,
            items: (0..5)
                .map(|i| row(Some(&format!("30-{i}")), Some(&format!("Customer {i}")), None))
                .collect(),
            ..CustomerImport::default()
        };
        store.fail_commit_at(1, 1).await;

        let err = importer(&store, 2)
            .import_customers(tenant, &request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::ChunkFailed {
                chunk: 1,
                chunks_committed: 1,
                rows_committed: 2,
                source: StoreError::Backend(_),
            }
        ));
        assert_eq!(all(&store, tenant).await.len(), 2);

        let report = importer(&store, 2).import_customers(tenant, &request).await.unwrap();
        assert_eq!((report.inserted, report.updated), (3, 2));
        assert_eq!(all(&store, tenant).await.len(), 5);
    }

    #[tokio::test]
    async fn test_all_invalid_rows_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        let request = CustomerImport {
            items: vec![row(None, Some("X"), Some("bad"))],
            ..CustomerImport::default()
        };
        let err = importer(&store, 400)
            .import_customers(TenantId::new(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::NoValidRows { skipped } if skipped.len() == 1));
        assert_eq!(store.document_count().await, 0);
    }

    #[test]
    fn test_flag_cells() {
        assert_eq!(FlagCell::Bool(false).resolve(), Some(false));
        assert_eq!(FlagCell::Text(" Sí ".into()).resolve(), Some(true));
        assert_eq!(FlagCell::Text("deshabilitado".into()).resolve(), Some(false));
        assert_eq!(FlagCell::Text("maybe".into()).resolve(), None);
    }
}
