//! Customers and the lead pipeline.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS leads, customers CASCADE;")
            .await?;
        Ok(())
    }
}

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    doc_number VARCHAR(50),
    name VARCHAR(255) NOT NULL,
    trade_name VARCHAR(255),
    email VARCHAR(255),
    phone VARCHAR(50),
    address VARCHAR(255),
    city VARCHAR(100),
    province VARCHAR(100),
    vat_condition VARCHAR(20)
        CHECK (vat_condition IN ('RI', 'Monotributo', 'CF', 'Exento', 'No Responsable')),
    bonif_percent NUMERIC(7, 4) NOT NULL DEFAULT 0
        CHECK (bonif_percent >= 0 AND bonif_percent <= 100),
    notes TEXT,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Upsert keys; not unique, the first customer to claim a key wins
CREATE INDEX idx_customers_tenant_doc ON customers(tenant_id, doc_number) WHERE doc_number IS NOT NULL;
CREATE INDEX idx_customers_tenant_email ON customers(tenant_id, email) WHERE email IS NOT NULL;
CREATE INDEX idx_customers_tenant_created ON customers(tenant_id, created_at DESC, id DESC);

CREATE TABLE leads (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    company VARCHAR(255),
    email VARCHAR(255),
    phone VARCHAR(50),
    notes TEXT,
    stage VARCHAR(20) NOT NULL DEFAULT 'new'
        CHECK (stage IN ('new', 'contacted', 'proposal', 'won', 'lost')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_leads_tenant_stage ON leads(tenant_id, stage, created_at DESC);
";
