//! Document collections: catalog, ledger movements and quotes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS prices, price_lists, quotes, cash_movements, \
             current_account_movements, receipts, invoices, products CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const DOCUMENTS_SQL: &str = r"
-- ============================================================================
-- CATALOG
-- ============================================================================
CREATE TABLE products (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    sku VARCHAR(100),
    name VARCHAR(255) NOT NULL,
    price NUMERIC(19, 4) NOT NULL CHECK (price >= 0),
    cost NUMERIC(19, 4) CHECK (cost >= 0),
    vat_percent NUMERIC(7, 4) NOT NULL DEFAULT 21,
    stock NUMERIC(19, 4) NOT NULL DEFAULT 0,
    unit VARCHAR(50),
    category VARCHAR(100),
    notes TEXT NOT NULL DEFAULT '',
    pricing JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- SKU lookup for imports; SKU products have IDs derived from the SKU
CREATE UNIQUE INDEX idx_products_tenant_sku ON products(tenant_id, sku) WHERE sku IS NOT NULL;
CREATE INDEX idx_products_tenant_name ON products(tenant_id, name);

CREATE TABLE price_lists (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    valid_from DATE,
    active BOOLEAN NOT NULL DEFAULT true,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_price_lists_code UNIQUE (tenant_id, code)
);

CREATE TABLE prices (
    id VARCHAR(200) PRIMARY KEY,
    tenant_id UUID NOT NULL,
    list_id UUID NOT NULL REFERENCES price_lists(id) ON DELETE CASCADE,
    sku VARCHAR(100) NOT NULL,
    cost NUMERIC(19, 4),
    price NUMERIC(19, 4) NOT NULL CHECK (price >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_prices_list_sku ON prices(tenant_id, list_id, sku);

-- ============================================================================
-- LEDGER
-- ============================================================================
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    customer_id UUID NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    lines JSONB NOT NULL,
    payment_term VARCHAR(20) NOT NULL,
    subtotal NUMERIC(19, 4) NOT NULL,
    total NUMERIC(19, 4) NOT NULL CHECK (total > 0),
    status VARCHAR(20) NOT NULL DEFAULT 'closed',
    notes TEXT NOT NULL DEFAULT '',
    quote_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_invoices_tenant_created ON invoices(tenant_id, created_at DESC, id DESC);
-- A quote converts into at most one invoice
CREATE UNIQUE INDEX idx_invoices_quote ON invoices(quote_id) WHERE quote_id IS NOT NULL;

CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    customer_id UUID NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    method VARCHAR(50) NOT NULL,
    description TEXT NOT NULL,
    invoice_id UUID
);

CREATE TABLE cash_movements (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    direction VARCHAR(10) NOT NULL CHECK (direction IN ('income', 'expense')),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    method VARCHAR(50) NOT NULL,
    origin VARCHAR(10) NOT NULL CHECK (origin IN ('invoice', 'receipt', 'manual')),
    invoice_id UUID,
    receipt_id UUID,
    description TEXT NOT NULL DEFAULT ''
);

CREATE INDEX idx_cash_tenant_created ON cash_movements(tenant_id, created_at DESC, id DESC);

CREATE TABLE current_account_movements (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    customer_id UUID NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    direction VARCHAR(10) NOT NULL CHECK (direction IN ('debit', 'credit')),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    invoice_id UUID,
    receipt_id UUID,
    description TEXT NOT NULL DEFAULT ''
);

CREATE INDEX idx_ca_tenant_customer ON current_account_movements(tenant_id, customer_id, created_at, id);

-- ============================================================================
-- QUOTES
-- ============================================================================
CREATE TABLE quotes (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    customer_id UUID NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    lines JSONB NOT NULL,
    total NUMERIC(19, 4) NOT NULL,
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('draft', 'sent', 'approved', 'rejected', 'invoiced')),
    invoice_id UUID REFERENCES invoices(id),
    notes TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_quotes_tenant_created ON quotes(tenant_id, created_at DESC, id DESC);
";
