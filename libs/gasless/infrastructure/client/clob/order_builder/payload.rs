//! API payload builders for order submission

use super::types::SignedOrder;
use crate::domain::OrderType;

/// One entry of `POST /orders`: `{"order": {...}, "owner": "...", "orderType": "..."}`
pub fn build_order_payload(
    signed_order: &SignedOrder,
    owner: &str,
    order_type: OrderType,
) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("order".to_string(), signed_order.to_api_json());
    map.insert("owner".to_string(), serde_json::Value::String(owner.to_string()));
    map.insert("orderType".to_string(), serde_json::Value::String(order_type.as_str().to_string()));
    serde_json::Value::Object(map)
}

/// Build the JSON array for placing multiple orders
pub fn build_batch_order_payload(
    signed_orders: &[(SignedOrder, OrderType)],
    owner: &str,
) -> serde_json::Value {
    serde_json::Value::Array(
        signed_orders
            .iter()
            .map(|(order, order_type)| build_order_payload(order, owner, *order_type))
            .collect(),
    )
}
