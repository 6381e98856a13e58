//! Customer service: customer CRUD with upsert, and the lead pipeline.

use std::sync::Arc;

use arqon_shared::types::{CustomerId, LeadId, TenantId};
use chrono::Utc;
use tracing::{info, instrument};

use super::error::CustomerError;
use super::types::{
    Customer, CustomerFields, CustomerQuery, Lead, LeadStage, NewLead, UpsertOutcome,
    upsert_target,
};
use crate::store::{DocumentStore, Write, WriteBatch};

/// Manages customers and leads through a [`DocumentStore`].
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn DocumentStore>,
}

impl CustomerService {
    /// Creates a customer service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a customer. Active unless `fields` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns `MissingName`, `InvalidEmail`, `BonificationOutOfRange` or a
    /// store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant))]
    pub async fn create_customer(
        &self,
        tenant: TenantId,
        fields: CustomerFields,
    ) -> Result<Customer, CustomerError> {
        let customer = Customer::create(tenant, fields.normalize()?, true, Utc::now())?;
        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::InsertCustomer(customer.clone()));
        self.store.commit(batch).await?;

        info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Updates the customer matching `fields` by document number, or by
    /// email when no document number matches, and creates one otherwise.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `MissingName` when creating without a
    /// name, or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant))]
    pub async fn upsert_customer(
        &self,
        tenant: TenantId,
        fields: CustomerFields,
    ) -> Result<(Customer, UpsertOutcome), CustomerError> {
        let fields = fields.normalize()?;
        let doc_numbers: Vec<String> = fields.doc_number.iter().cloned().collect();
        let emails: Vec<String> = fields.email.iter().cloned().collect();
        let target = if doc_numbers.is_empty() && emails.is_empty() {
            None
        } else {
            let candidates = self.store.find_customers(tenant, &doc_numbers, &emails).await?;
            upsert_target(&candidates, fields.doc_number.as_deref(), fields.email.as_deref())
        };

        match target {
            Some(id) => {
                let customer = self.apply_update(tenant, id, fields).await?;
                Ok((customer, UpsertOutcome::Updated))
            }
            None => {
                let customer = Customer::create(tenant, fields, true, Utc::now())?;
                let mut batch = WriteBatch::new(tenant);
                batch.push(Write::InsertCustomer(customer.clone()));
                self.store.commit(batch).await?;
                info!(customer_id = %customer.id, "customer created by upsert");
                Ok((customer, UpsertOutcome::Created))
            }
        }
    }

    /// Overwrites the fields `fields` sets on a customer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant, customer_id = %id))]
    pub async fn update_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
        fields: CustomerFields,
    ) -> Result<Customer, CustomerError> {
        let fields = fields.normalize()?;
        self.get_customer(tenant, id).await?;
        self.apply_update(tenant, id, fields).await
    }

    async fn apply_update(
        &self,
        tenant: TenantId,
        id: CustomerId,
        fields: CustomerFields,
    ) -> Result<Customer, CustomerError> {
        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::UpdateCustomer {
            customer_id: id,
            fields,
        });
        self.store.commit(batch).await?;

        let customer = self.get_customer(tenant, id).await?;
        info!(customer_id = %id, "customer updated");
        Ok(customer)
    }

    /// Gets a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist for the tenant.
    pub async fn get_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
    ) -> Result<Customer, CustomerError> {
        self.store
            .get_customer(tenant, id)
            .await?
            .ok_or(CustomerError::NotFound(id))
    }

    /// Lists customers matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn list_customers(
        &self,
        tenant: TenantId,
        query: &CustomerQuery,
    ) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.store.list_customers(tenant, query).await?)
    }

    /// Creates a lead in the `New` stage.
    ///
    /// # Errors
    ///
    /// Returns `MissingName`, `InvalidEmail` or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant))]
    pub async fn create_lead(&self, tenant: TenantId, input: NewLead) -> Result<Lead, CustomerError> {
        let lead = Lead::create(tenant, input, Utc::now())?;
        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::InsertLead(lead.clone()));
        self.store.commit(batch).await?;

        info!(lead_id = %lead.id, "lead created");
        Ok(lead)
    }

    /// Gets a lead by ID.
    ///
    /// # Errors
    ///
    /// Returns `LeadNotFound` if the lead does not exist for the tenant.
    pub async fn get_lead(&self, tenant: TenantId, id: LeadId) -> Result<Lead, CustomerError> {
        self.store
            .get_lead(tenant, id)
            .await?
            .ok_or(CustomerError::LeadNotFound(id))
    }

    /// Lists leads, newest first, optionally only those in `stage`.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn list_leads(
        &self,
        tenant: TenantId,
        stage: Option<LeadStage>,
        limit: u64,
    ) -> Result<Vec<Lead>, CustomerError> {
        Ok(self.store.list_leads(tenant, stage, limit).await?)
    }

    /// Moves a lead to `stage`. Any stage may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `LeadNotFound` or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant, lead_id = %id, stage = %stage))]
    pub async fn move_lead(
        &self,
        tenant: TenantId,
        id: LeadId,
        stage: LeadStage,
    ) -> Result<Lead, CustomerError> {
        let from = self.get_lead(tenant, id).await?.stage;
        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::SetLeadStage { lead_id: id, stage });
        self.store.commit(batch).await?;

        let lead = self.get_lead(tenant, id).await?;
        info!(%from, "lead moved");
        Ok(lead)
    }
}
