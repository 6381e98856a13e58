use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = InvoiceId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_display_and_parse() {
    let id = ReceiptId::new();
    let parsed = ReceiptId::from_str(&id.to_string()).unwrap();
    assert_eq!(parsed, id);
    assert!(ReceiptId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_natural_key_is_stable_per_tenant() {
    let tenant = TenantId::new();
    let other = TenantId::new();

    let a = ProductId::from_natural_key(tenant, "DET-5L");
    let b = ProductId::from_natural_key(tenant, "DET-5L");
    let c = ProductId::from_natural_key(other, "DET-5L");
    let d = ProductId::from_natural_key(tenant, "DET-1L");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

#[test]
fn test_serde_is_transparent() {
    let uuid = Uuid::new_v4();
    let id = CustomerId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
