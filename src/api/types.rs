// Write request decoding
// Turns a POST body into a validated ListUpdate

use serde_json::{Map, Value};

use super::response::Rejection;
use crate::store::{coerce_list, ListUpdate, FREE_FIELD, ORDER_FIELD};

const KEY_FIELD: &str = "key";

/// Parse and authorize a write request body
///
/// Checks run in order: JSON object, shared key, list coercion. Nothing is
/// written unless all three pass.
pub fn decode_update(body: &[u8], vip_key: &str) -> Result<ListUpdate, Rejection> {
    let mut fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(Rejection::BadRequest),
    };

    if !key_matches(&fields, vip_key) {
        return Err(Rejection::Forbidden);
    }

    Ok(ListUpdate {
        free: take_list(&mut fields, FREE_FIELD)?,
        order: take_list(&mut fields, ORDER_FIELD)?,
    })
}

fn key_matches(fields: &Map<String, Value>, vip_key: &str) -> bool {
    matches!(fields.get(KEY_FIELD), Some(Value::String(k)) if k == vip_key)
}

fn take_list(fields: &mut Map<String, Value>, name: &str) -> Result<Option<Vec<Value>>, Rejection> {
    fields
        .remove(name)
        .map(|value| coerce_list(value).ok_or(Rejection::BadRequest))
        .transpose()
}
