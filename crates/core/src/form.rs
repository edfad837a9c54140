//! In-progress wizard form values.
//!
//! Values are stored flat, keyed by dotted field path (`location.city`),
//! exactly as the change handlers address them. The payload module is the
//! only place that turns them back into a nested shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------

/// Selected service (category) identifiers, step 1.
pub const FIELD_SERVICES: &str = "services";

/// Free-text problem description, step 2.
pub const FIELD_DESCRIPTION: &str = "description";

/// Device brand, step 2 (optional).
pub const FIELD_DEVICE_BRAND: &str = "device.brand";

/// Device model, step 2 (optional).
pub const FIELD_DEVICE_MODEL: &str = "device.model";

/// Warranty status of the device, step 2.
pub const FIELD_WARRANTY_STATUS: &str = "device.warranty_status";

/// Urgency level, step 2.
pub const FIELD_URGENCY: &str = "urgency";

/// Selected country id, step 3.
pub const FIELD_COUNTRY: &str = "location.country";

/// Selected state id, step 3.
pub const FIELD_STATE: &str = "location.state";

/// Selected city id, step 3.
pub const FIELD_CITY: &str = "location.city";

/// Street address, step 3.
pub const FIELD_ADDRESS: &str = "location.address";

/// District or neighbourhood, step 3 (optional).
pub const FIELD_DISTRICT: &str = "location.district";

/// Postal code, step 3 (optional).
pub const FIELD_POSTAL_CODE: &str = "location.postal_code";

/// Preferred visit date (`YYYY-MM-DD`), step 3.
pub const FIELD_PREFERRED_DATE: &str = "preferred_date";

/// Preferred visit time slot, step 3 (optional).
pub const FIELD_PREFERRED_TIME: &str = "preferred_time";

/// Service preference (home service, shop visit, pickup), step 3.
pub const FIELD_SERVICE_PREFERENCE: &str = "service_preference";

/// Lower budget bound, step 4 (optional).
pub const FIELD_BUDGET_MIN: &str = "budget.min";

/// Upper budget bound, step 4 (optional).
pub const FIELD_BUDGET_MAX: &str = "budget.max";

// ---------------------------------------------------------------------------
// FormValues
// ---------------------------------------------------------------------------

/// Field path to value mapping for one wizard instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(Map<String, Value>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`, replacing any previous value.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    /// The trimmed string at `path`, if it is a non-empty string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.0
            .get(path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.0.remove(path)
    }

    /// Whether `path` holds something a required rule would accept.
    pub fn is_present(&self, path: &str) -> bool {
        !is_blank(self.0.get(path))
    }

    /// Add `item` to the string list at `path`, or remove it if already there.
    ///
    /// Returns `true` when the item is selected after the call.
    pub fn toggle_in_list(&mut self, path: &str, item: &str) -> bool {
        let mut list: Vec<Value> = self
            .0
            .get(path)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let selected = match list.iter().position(|v| v.as_str() == Some(item)) {
            Some(idx) => {
                list.remove(idx);
                false
            }
            None => {
                list.push(Value::String(item.to_string()));
                true
            }
        };

        self.0.insert(path.to_string(), Value::Array(list));
        selected
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FormValues {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Absent, null, whitespace-only strings and empty arrays count as blank.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_str_trims_and_skips_empty() {
        let mut values = FormValues::new();
        values.set(FIELD_DESCRIPTION, "  cracked screen  ");
        values.set(FIELD_URGENCY, "   ");
        assert_eq!(values.get_str(FIELD_DESCRIPTION), Some("cracked screen"));
        assert_eq!(values.get_str(FIELD_URGENCY), None);
        assert_eq!(values.get_str(FIELD_CITY), None);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!(""))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(["svc-1"]))));
        assert!(!is_blank(Some(&json!(false))));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut values = FormValues::new();
        assert!(values.toggle_in_list(FIELD_SERVICES, "screen"));
        assert!(values.toggle_in_list(FIELD_SERVICES, "battery"));
        assert_eq!(values.get(FIELD_SERVICES), Some(&json!(["screen", "battery"])));

        assert!(!values.toggle_in_list(FIELD_SERVICES, "screen"));
        assert_eq!(values.get(FIELD_SERVICES), Some(&json!(["battery"])));
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut values = FormValues::new();
        values.set(FIELD_CITY, "lhr");
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, json!({ "location.city": "lhr" }));
    }
}
