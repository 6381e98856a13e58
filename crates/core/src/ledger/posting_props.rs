//! Property-based tests for posting plans.

use arqon_shared::types::money::round_money;
use arqon_shared::types::{CustomerId, TenantId};
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::posting::{compute_total, plan_invoice, plan_payment};
use super::types::{InvoiceDraft, LineInput, PaymentRequest, PaymentTerm};
use crate::store::Write;

/// Quantities from 0.01 to 1,000.00.
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Prices from 0.01 to 100,000.00.
fn unit_price() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Bonifications from 0 to 99 percent.
fn bonif() -> impl Strategy<Value = Decimal> {
    (0i64..100i64).prop_map(Decimal::from)
}

fn line() -> impl Strategy<Value = LineInput> {
    (quantity(), unit_price(), bonif()).prop_map(|(quantity, unit_price, bonif_percent)| LineInput {
        product_id: None,
        description: "item".into(),
        quantity,
        unit_price,
        bonif_percent,
    })
}

fn term() -> impl Strategy<Value = PaymentTerm> {
    prop_oneof![Just(PaymentTerm::Cash), Just(PaymentTerm::OpenAccount)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The total is the rounded sum of unrounded line amounts.
    #[test]
    fn prop_total_is_rounded_sum(lines in prop::collection::vec(line(), 1..8)) {
        let expected = round_money(
            lines
                .iter()
                .map(|l| l.quantity * l.unit_price * (Decimal::ONE - l.bonif_percent / Decimal::ONE_HUNDRED))
                .sum::<Decimal>(),
        );
        prop_assume!(expected > Decimal::ZERO);
        prop_assert_eq!(compute_total(&lines).unwrap(), expected);
    }

    /// An invoice plans exactly one movement, matching its payment term,
    /// for the invoice total.
    #[test]
    fn prop_exactly_one_movement_per_invoice(
        lines in prop::collection::vec(line(), 1..8),
        payment_term in term(),
    ) {
        let draft = InvoiceDraft {
            customer_id: CustomerId::new(),
            customer_name: "ACME".into(),
            lines,
            payment_term,
            decrement_stock: false,
            notes: String::new(),
        };
        let Ok(plan) = plan_invoice(TenantId::new(), &draft, None, Utc::now()) else {
            return Ok(());
        };

        let cash: Vec<_> = plan.batch.writes().iter().filter_map(|w| match w {
            Write::InsertCashMovement(m) => Some(m.amount),
            _ => None,
        }).collect();
        let debits: Vec<_> = plan.batch.writes().iter().filter_map(|w| match w {
            Write::InsertCurrentAccountMovement(m) => Some(m.amount),
            _ => None,
        }).collect();

        match payment_term {
            PaymentTerm::Cash => {
                prop_assert_eq!(cash, vec![plan.invoice.total]);
                prop_assert!(debits.is_empty());
            }
            PaymentTerm::OpenAccount => {
                prop_assert_eq!(debits, vec![plan.invoice.total]);
                prop_assert!(cash.is_empty());
            }
        }
    }

    /// A payment always plans three writes referencing one receipt.
    #[test]
    fn prop_payment_is_three_writes(amount in unit_price()) {
        let request = PaymentRequest {
            customer_id: CustomerId::new(),
            customer_name: "ACME".into(),
            amount,
            method: "cash".into(),
            description: None,
            invoice_id: None,
        };
        let plan = plan_payment(TenantId::new(), &request, Utc::now()).unwrap();
        let receipt_id = Some(plan.receipt.id);

        prop_assert_eq!(plan.batch.len(), 3);
        for write in plan.batch.writes() {
            let linked = match write {
                Write::InsertReceipt(r) => Some(r.id) == receipt_id,
                Write::InsertCurrentAccountMovement(m) => m.receipt_id == receipt_id && m.amount == amount,
                Write::InsertCashMovement(m) => m.receipt_id == receipt_id && m.amount == amount,
                _ => false,
            };
            prop_assert!(linked);
        }
    }
}
