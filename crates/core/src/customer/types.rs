//! Customer and lead documents.

use arqon_shared::types::{CustomerId, LeadId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::CustomerError;

/// VAT condition of a customer, serialized with its fiscal abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VatCondition {
    /// Registered VAT payer.
    #[serde(rename = "RI")]
    RegisteredPayer,
    /// Simplified regime taxpayer.
    #[serde(rename = "Monotributo")]
    SimplifiedRegime,
    /// Final consumer.
    #[serde(rename = "CF")]
    FinalConsumer,
    /// Exempt.
    #[serde(rename = "Exento")]
    Exempt,
    /// Not responsible for VAT.
    #[serde(rename = "No Responsable")]
    NotResponsible,
}

impl VatCondition {
    /// Every condition, with its fiscal name.
    const NAMES: [(Self, &'static str); 5] = [
        (Self::RegisteredPayer, "RI"),
        (Self::SimplifiedRegime, "Monotributo"),
        (Self::FinalConsumer, "CF"),
        (Self::Exempt, "Exento"),
        (Self::NotResponsible, "No Responsable"),
    ];
}

impl std::str::FromStr for VatCondition {
    type Err = String;

    /// Parses a fiscal name, ignoring case and surrounding spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(condition, _)| *condition)
            .ok_or_else(|| format!("unknown VAT condition '{s}'"))
    }
}

/// A customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID.
    pub id: CustomerId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Tax or identity document number. First upsert key.
    pub doc_number: Option<String>,
    /// Legal name.
    pub name: String,
    /// Trade name.
    pub trade_name: Option<String>,
    /// Contact email. Upsert key when there is no document number.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Province.
    pub province: Option<String>,
    /// VAT condition.
    pub vat_condition: Option<VatCondition>,
    /// Standing discount in percent, applied when selling.
    pub bonif_percent: Decimal,
    /// Free text notes.
    pub notes: Option<String>,
    /// Whether the customer is in use.
    pub active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a customer from normalized fields. Missing flags take their
    /// defaults: no discount, and `default_active`.
    ///
    /// # Errors
    ///
    /// Returns `MissingName` if `fields` has no name.
    pub fn create(
        tenant_id: TenantId,
        fields: CustomerFields,
        default_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, CustomerError> {
        let name = fields.name.ok_or(CustomerError::MissingName)?;
        Ok(Self {
            id: CustomerId::new(),
            tenant_id,
            doc_number: fields.doc_number,
            name,
            trade_name: fields.trade_name,
            email: fields.email,
            phone: fields.phone,
            address: fields.address,
            city: fields.city,
            province: fields.province,
            vat_condition: fields.vat_condition,
            bonif_percent: fields.bonif_percent.unwrap_or_default(),
            notes: fields.notes,
            active: fields.active.unwrap_or(default_active),
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrites every field that `fields` sets and keeps the rest.
    pub fn apply(&mut self, fields: CustomerFields, now: DateTime<Utc>) {
        merge(&mut self.doc_number, fields.doc_number);
        if let Some(name) = fields.name {
            self.name = name;
        }
        merge(&mut self.trade_name, fields.trade_name);
        merge(&mut self.email, fields.email);
        merge(&mut self.phone, fields.phone);
        merge(&mut self.address, fields.address);
        merge(&mut self.city, fields.city);
        merge(&mut self.province, fields.province);
        merge(&mut self.vat_condition, fields.vat_condition);
        if let Some(bonif) = fields.bonif_percent {
            self.bonif_percent = bonif;
        }
        merge(&mut self.notes, fields.notes);
        if let Some(active) = fields.active {
            self.active = active;
        }
        self.updated_at = now;
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Customer fields for a create, an update or an upsert. Unset fields are
/// left alone on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerFields {
    /// Tax or identity document number.
    pub doc_number: Option<String>,
    /// Legal name. Required to create.
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
    /// VAT condition.
    pub vat_condition: Option<VatCondition>,
    /// Standing discount in percent, 0..=100.
    pub bonif_percent: Option<Decimal>,
    /// Free text notes.
    pub notes: Option<String>,
    /// Whether the customer is in use.
    pub active: Option<bool>,
}

impl CustomerFields {
    /// Trims every text field, dropping blank ones, then validates the email
    /// and the discount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` or `BonificationOutOfRange`.
    pub fn normalize(self) -> Result<Self, CustomerError> {
        let fields = Self {
            doc_number: trimmed(self.doc_number),
            name: trimmed(self.name),
            trade_name: trimmed(self.trade_name),
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            address: trimmed(self.address),
            city: trimmed(self.city),
            province: trimmed(self.province),
            notes: trimmed(self.notes),
            ..self
        };
        if let Some(email) = fields.email.as_ref().filter(|e| !e.validate_email()) {
            return Err(CustomerError::InvalidEmail(email.clone()));
        }
        if let Some(bonif) = fields
            .bonif_percent
            .filter(|b| *b < Decimal::ZERO || *b > Decimal::ONE_HUNDRED)
        {
            return Err(CustomerError::BonificationOutOfRange(bonif));
        }
        Ok(fields)
    }
}

pub(crate) fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Filter for customer listings. Every set criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    /// Case-insensitive text matched against name, trade name, email and
    /// document number.
    pub search: Option<String>,
    /// Exact document number.
    pub doc_number: Option<String>,
    /// Exact email.
    pub email: Option<String>,
    /// Active flag.
    pub active: Option<bool>,
    /// Largest number of customers returned.
    pub limit: u64,
}

impl CustomerQuery {
    /// Returns true if `customer` passes every criterion. The limit is not
    /// considered.
    #[must_use]
    pub fn matches(&self, customer: &Customer) -> bool {
        let search = self.search.as_deref().map(str::to_lowercase);
        let text_match = search.as_deref().is_none_or(|needle| {
            [
                Some(customer.name.as_str()),
                customer.trade_name.as_deref(),
                customer.email.as_deref(),
                customer.doc_number.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
        });
        text_match
            && self
                .doc_number
                .as_ref()
                .is_none_or(|doc| customer.doc_number.as_ref() == Some(doc))
            && self
                .email
                .as_ref()
                .is_none_or(|email| customer.email.as_ref() == Some(email))
            && self.active.is_none_or(|active| customer.active == active)
    }
}

/// Whether an upsert created a customer or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No customer matched; a new one was created.
    Created,
    /// A customer matched by document number or email and was updated.
    Updated,
}

/// Picks the customer an upsert targets: a document number match first, an
/// email match otherwise.
pub(crate) fn upsert_target<'a>(
    candidates: impl IntoIterator<Item = &'a Customer>,
    doc_number: Option<&str>,
    email: Option<&str>,
) -> Option<CustomerId> {
    let mut by_email = None;
    for customer in candidates {
        if doc_number.is_some() && customer.doc_number.as_deref() == doc_number {
            return Some(customer.id);
        }
        if by_email.is_none() && email.is_some() && customer.email.as_deref() == email {
            by_email = Some(customer.id);
        }
    }
    by_email
}

/// Pipeline stage of a sales lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStage {
    /// Just entered.
    New,
    /// First contact made.
    Contacted,
    /// A proposal was sent.
    Proposal,
    /// Became a sale.
    Won,
    /// Dropped out.
    Lost,
}

impl LeadStage {
    /// Every stage in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Contacted,
        Self::Proposal,
        Self::Won,
        Self::Lost,
    ];

    /// Stored and wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Proposal => "proposal",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospective customer moving through the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Lead ID.
    pub id: LeadId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Contact name.
    pub name: String,
    /// Company.
    pub company: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Free text notes.
    pub notes: Option<String>,
    /// Current stage.
    pub stage: LeadStage,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Builds a lead in the `New` stage.
    ///
    /// # Errors
    ///
    /// Returns `MissingName` or `InvalidEmail`.
    pub fn create(
        tenant_id: TenantId,
        input: NewLead,
        now: DateTime<Utc>,
    ) -> Result<Self, CustomerError> {
        let name = trimmed(Some(input.name)).ok_or(CustomerError::MissingName)?;
        let email = trimmed(input.email);
        if let Some(email) = email.as_ref().filter(|e| !e.validate_email()) {
            return Err(CustomerError::InvalidEmail(email.clone()));
        }
        Ok(Self {
            id: LeadId::new(),
            tenant_id,
            name,
            company: trimmed(input.company),
            email,
            phone: trimmed(input.phone),
            notes: trimmed(input.notes),
            stage: LeadStage::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for creating a lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    /// Contact name, required.
    pub name: String,
    /// Company.
    #[serde(default)]
    pub company: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Free text notes.
    #[serde(default)]
    pub notes: Option<String>,
}
