use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One upstream feed item with unknown key names.
pub type RawRecord = Map<String, Value>;

// ---------------------------------------------------------------------------
// Canonical vehicle
// ---------------------------------------------------------------------------

/// Normalized output shape. Every key is always serialized; missing
/// upstream values come out as `null`, `""` or `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: Value,
    #[serde(rename = "type")]
    pub vehicle_type: Value,
    pub version: Value,
    pub brand: Value,
    pub model: Value,
    pub model_year: Value,
    pub manufacture_year: Value,
    pub mileage: Value,
    pub color: Value,
    pub fuel: Value,
    pub transmission: Value,
    pub engine: Value,
    pub doors: Value,
    pub category: Value,
    /// Litres; explicit upstream value or inferred from the model name.
    pub displacement: Value,
    pub price: f64,
    pub options: String,
    pub photos: Vec<Value>,
}

impl VehicleRecord {
    /// Best-effort identifier for diagnostics.
    pub fn label(&self) -> String {
        value_label(&self.id)
    }
}

/// Render a JSON value for log lines: strings unquoted, null as `?`.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::Null => "?".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON type name used in diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

/// The single JSON document persisted per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub vehicles: Vec<VehicleRecord>,
    pub generated_at: String,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateDocument {
    pub fn new(vehicles: Vec<VehicleRecord>, generated_at: DateTime<Utc>) -> Self {
        Self {
            total_count: vehicles.len(),
            vehicles,
            generated_at: format_timestamp(generated_at),
            error: None,
        }
    }

    /// Document for a run that failed before collecting anything.
    pub fn failed(error: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            vehicles: Vec::new(),
            generated_at: format_timestamp(generated_at),
            total_count: 0,
            error: Some(error.into()),
        }
    }

    /// Pretty-printed JSON with non-ASCII text kept literal.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
