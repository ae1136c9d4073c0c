//! Field reconciliation: one upstream record in, one [`VehicleRecord`] out.
//!
//! Each target field has an ordered alias list. The first alias whose value
//! is present and non-null wins, even when a later alias also carries a
//! value. Only `price`, `options`, `photos`, `displacement` and `category`
//! get any coercion; every other field is copied verbatim.
//!
//! `displacement` is always a JSON number or `null`.

use serde_json::Value;

use crate::error::FeedError;
use crate::inference::{CATEGORY, DISPLACEMENT};
use crate::model::{json_type_name, value_label, RawRecord, VehicleRecord};

// ---------------------------------------------------------------------------
// Alias lists (order is significant)
// ---------------------------------------------------------------------------

pub const ID: &[&str] = &["id", "codigo", "codigo_lk", "codigoveiculo", "veiculo_id", "ref"];
pub const TYPE: &[&str] = &["tipo", "type", "tipo_veiculo", "vehicle_type"];
pub const VERSION: &[&str] = &["versao", "version", "trim", "modelo_versao"];
pub const BRAND: &[&str] = &["marca", "brand", "fabricante", "montadora", "make"];
pub const MODEL: &[&str] = &["modelo", "model", "modelo_nome"];
pub const MODEL_YEAR: &[&str] = &["ano_modelo", "anomodelo", "ano", "model_year", "year"];
pub const MANUFACTURE_YEAR: &[&str] =
    &["ano_fabricacao", "anofabricacao", "ano_fab", "manufacture_year"];
pub const MILEAGE: &[&str] = &["km", "quilometragem", "kilometragem", "mileage", "odometro"];
pub const COLOR: &[&str] = &["cor", "color", "cor_externa"];
pub const FUEL: &[&str] = &["combustivel", "fuel", "tipo_combustivel"];
pub const TRANSMISSION: &[&str] = &["cambio", "transmissao", "transmission"];
pub const ENGINE: &[&str] = &["motor", "engine", "motorizacao"];
pub const DOORS: &[&str] = &["portas", "numeroportas", "numero_portas", "doors"];
pub const CATEGORY_KEYS: &[&str] = &["categoria", "category", "carroceria", "body_type"];
pub const DISPLACEMENT_KEYS: &[&str] =
    &["cilindrada", "cilindradas", "displacement", "engine_displacement"];
pub const PRICE: &[&str] = &["preco", "valor", "price", "valor_venda", "preco_venda"];
pub const OPTIONS: &[&str] = &["opcionais", "options", "acessorios", "itens"];
pub const PHOTOS: &[&str] = &["fotos", "photos", "imagens", "images"];

const ALL_FIELDS: &[&[&str]] = &[
    ID, TYPE, VERSION, BRAND, MODEL, MODEL_YEAR, MANUFACTURE_YEAR, MILEAGE, COLOR, FUEL,
    TRANSMISSION, ENGINE, DOORS, CATEGORY_KEYS, DISPLACEMENT_KEYS, PRICE, OPTIONS, PHOTOS,
];

/// True when `key` is an alias of any canonical field.
pub fn is_known_key(key: &str) -> bool {
    ALL_FIELDS.iter().any(|aliases| aliases.contains(&key))
}

/// First alias with a present, non-null value.
pub fn resolve<'a>(record: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| !value.is_null())
}

fn resolve_owned(record: &RawRecord, aliases: &[&str]) -> Value {
    resolve(record, aliases).cloned().unwrap_or(Value::Null)
}

/// Best-effort identifier of a raw record, for diagnostics.
pub fn record_label(record: &RawRecord) -> String {
    resolve(record, ID).map(value_label).unwrap_or_else(|| "?".to_string())
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Reconcile an arbitrary JSON value. Fails only when it is not an object.
pub fn reconcile(record: &Value) -> Result<VehicleRecord, FeedError> {
    match record {
        Value::Object(map) => Ok(reconcile_record(map)),
        other => Err(FeedError::Record {
            id: "?".to_string(),
            message: format!("expected an object, found {}", json_type_name(other)),
        }),
    }
}

/// Map one raw record into the canonical shape. Never fails.
pub fn reconcile_record(record: &RawRecord) -> VehicleRecord {
    let model = resolve_owned(record, MODEL);

    let displacement = resolve(record, DISPLACEMENT_KEYS)
        .and_then(coerce_displacement)
        .or_else(|| DISPLACEMENT.infer(model_text(&model).as_deref()).map(Value::from))
        .unwrap_or(Value::Null);

    let category = match resolve(record, CATEGORY_KEYS) {
        Some(explicit) => explicit.clone(),
        None => CATEGORY
            .infer(model_text(&model).as_deref())
            .map(Value::from)
            .unwrap_or(Value::Null),
    };

    VehicleRecord {
        id: resolve_owned(record, ID),
        vehicle_type: resolve_owned(record, TYPE),
        version: resolve_owned(record, VERSION),
        brand: resolve_owned(record, BRAND),
        model,
        model_year: resolve_owned(record, MODEL_YEAR),
        manufacture_year: resolve_owned(record, MANUFACTURE_YEAR),
        mileage: resolve_owned(record, MILEAGE),
        color: resolve_owned(record, COLOR),
        fuel: resolve_owned(record, FUEL),
        transmission: resolve_owned(record, TRANSMISSION),
        engine: resolve_owned(record, ENGINE),
        doors: resolve_owned(record, DOORS),
        category,
        displacement,
        price: coerce_price(resolve(record, PRICE)),
        options: display_options(resolve(record, OPTIONS)),
        photos: photo_list(resolve(record, PHOTOS)),
    }
}

fn model_text(model: &Value) -> Option<String> {
    match model {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Numeric text
// ---------------------------------------------------------------------------

/// Explicit displacement as a number. Text that does not parse yields
/// `None` so the caller can fall back to inference.
fn coerce_displacement(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(_) => Some(raw.clone()),
        Value::String(s) => parse_decimal_text(s).map(Value::from),
        _ => None,
    }
}

fn coerce_price(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_price_text(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse a locale-formatted price such as `"R$ 12.345,67"` or `"12,345.67"`.
///
/// Everything except digits, `.` and `,` is discarded. When both separators
/// occur, the last one is the decimal mark. A separator that repeats is a
/// thousands separator. A lone separator is a thousands separator when it
/// sits between a 1-3 digit group without a leading zero and exactly three
/// digits (`"R$ 45.990"`), and a decimal mark otherwise (`"1234,5"`).
pub fn parse_price_text(text: &str) -> Option<f64> {
    parse_numeric(text, true)
}

/// Like [`parse_price_text`], but a lone separator is always a decimal mark
/// (`"1.600"` is 1.6).
pub fn parse_decimal_text(text: &str) -> Option<f64> {
    parse_numeric(text, false)
}

fn parse_numeric(text: &str, grouped_thousands: bool) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let lone = |pos: usize, sep: char| {
        let single = cleaned.matches(sep).count() == 1;
        let grouping = grouped_thousands && is_thousands_group(&cleaned, pos);
        (single && !grouping).then_some(pos)
    };
    let decimal_mark = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(dot), None) => lone(dot, '.'),
        (None, Some(comma)) => lone(comma, ','),
        (None, None) => None,
    };

    let canonical: String = cleaned
        .char_indices()
        .filter_map(|(i, c)| {
            if c.is_ascii_digit() {
                Some(c)
            } else if Some(i) == decimal_mark {
                Some('.')
            } else {
                None
            }
        })
        .collect();

    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_thousands_group(cleaned: &str, sep: usize) -> bool {
    let (head, tail) = (&cleaned[..sep], &cleaned[sep + 1..]);
    (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && tail.len() == 3
        && tail.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// List-shaped fields
// ---------------------------------------------------------------------------

/// XML list wrappers (`<fotos><foto>..</foto></fotos>`) decode to a
/// single-entry object; look through it to the wrapped value.
fn unwrap_list_wrapper(value: &Value) -> &Value {
    match value {
        Value::Object(map) if map.len() == 1 => map.values().next().unwrap_or(value),
        other => other,
    }
}

fn display_options(raw: Option<&Value>) -> String {
    match raw.map(unwrap_list_wrapper) {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => scalar_text(other),
    }
}

fn photo_list(raw: Option<&Value>) -> Vec<Value> {
    match raw.map(unwrap_list_wrapper) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> VehicleRecord {
        reconcile(&value).unwrap()
    }

    #[test]
    fn price_brazilian_format() {
        assert_eq!(rec(json!({"valor": "R$ 12.345,67"})).price, 12345.67);
    }

    #[test]
    fn price_unparsable_or_missing_is_zero() {
        assert_eq!(rec(json!({"valor": "abc"})).price, 0.0);
        assert_eq!(rec(json!({})).price, 0.0);
        assert_eq!(rec(json!({"preco": null})).price, 0.0);
        assert_eq!(rec(json!({"preco": [1, 2]})).price, 0.0);
        assert_eq!(rec(json!({"preco": "."})).price, 0.0);
    }

    #[test]
    fn price_numeric_passes_through() {
        assert_eq!(rec(json!({"preco": 45990})).price, 45990.0);
        assert_eq!(rec(json!({"price": 1234.5})).price, 1234.5);
    }

    #[test]
    fn price_separator_resolution() {
        assert_eq!(parse_price_text("12,345.67"), Some(12345.67));
        assert_eq!(parse_price_text("1.234.567,89"), Some(1234567.89));
        assert_eq!(parse_price_text("1234,5"), Some(1234.5));
        assert_eq!(parse_price_text("1,234,567"), Some(1234567.0));
        assert_eq!(parse_price_text("1.234.567"), Some(1234567.0));
        assert_eq!(parse_price_text("R$ 89.900,00 à vista"), Some(89900.0));
        assert_eq!(parse_price_text("sob consulta"), None);
    }

    #[test]
    fn price_alias_precedence() {
        // "preco" precedes "valor"
        assert_eq!(rec(json!({"valor": "10", "preco": "20"})).price, 20.0);
        // a null earlier alias falls through
        assert_eq!(rec(json!({"preco": null, "valor": "30"})).price, 30.0);
    }

    #[test]
    fn photos_normalization() {
        assert_eq!(rec(json!({"fotos": "http://x/1.jpg"})).photos, vec![json!("http://x/1.jpg")]);
        assert!(rec(json!({"fotos": null})).photos.is_empty());
        assert!(rec(json!({})).photos.is_empty());
        assert_eq!(
            rec(json!({"fotos": ["http://x/1.jpg", "http://x/2.jpg"]})).photos,
            vec![json!("http://x/1.jpg"), json!("http://x/2.jpg")]
        );
    }

    #[test]
    fn photos_from_xml_wrapper() {
        let r = rec(json!({"fotos": {"foto": ["http://x/1.jpg", "http://x/2.jpg"]}}));
        assert_eq!(r.photos.len(), 2);
        let single = rec(json!({"fotos": {"foto": "http://x/1.jpg"}}));
        assert_eq!(single.photos, vec![json!("http://x/1.jpg")]);
    }

    #[test]
    fn options_joined_or_stringified() {
        assert_eq!(
            rec(json!({"opcionais": ["Ar", null, "Direção", 4]})).options,
            "Ar, Direção, 4"
        );
        assert_eq!(rec(json!({"opcionais": "Ar, Vidros"})).options, "Ar, Vidros");
        assert_eq!(rec(json!({"opcionais": 3})).options, "3");
        assert_eq!(rec(json!({})).options, "");
        assert_eq!(
            rec(json!({"opcionais": {"opcional": ["Ar", "Alarme"]}})).options,
            "Ar, Alarme"
        );
    }

    #[test]
    fn id_alias_precedence() {
        assert_eq!(rec(json!({"id": "A", "codigo": "B"})).id, json!("A"));
        assert_eq!(rec(json!({"codigo": "B", "codigo_lk": "C"})).id, json!("B"));
        assert_eq!(rec(json!({"id": null, "codigo_lk": "C"})).id, json!("C"));
    }

    #[test]
    fn plain_fields_are_verbatim() {
        let r = rec(json!({
            "marca": "VW", "modelo": "Gol", "ano_modelo": 2020, "km": "45000",
            "cor": "Branco", "combustivel": "Flex", "cambio": "Manual", "portas": 4,
            "versao": "1.0 MPI", "tipo": "carro", "ano_fabricacao": "2019",
            "motor": "1.0"
        }));
        assert_eq!(r.brand, json!("VW"));
        assert_eq!(r.model, json!("Gol"));
        assert_eq!(r.model_year, json!(2020));
        assert_eq!(r.mileage, json!("45000"));
        assert_eq!(r.doors, json!(4));
        assert_eq!(r.version, json!("1.0 MPI"));
        assert_eq!(r.vehicle_type, json!("carro"));
        assert_eq!(r.manufacture_year, json!("2019"));
        assert_eq!(r.engine, json!("1.0"));
        assert_eq!(r.transmission, json!("Manual"));
    }

    #[test]
    fn price_lone_separator_before_three_digits_is_thousands() {
        assert_eq!(rec(json!({"valor": "R$ 45.990"})).price, 45990.0);
        assert_eq!(parse_price_text("12,500"), Some(12500.0));
        assert_eq!(parse_price_text("0.500"), Some(0.5));
        assert_eq!(parse_price_text("1234.567"), Some(1234.567));
        assert_eq!(parse_price_text("45.99"), Some(45.99));
    }

    #[test]
    fn displacement_explicit_wins_over_inference() {
        let r = rec(json!({"modelo": "Onix LT", "cilindrada": "1.4"}));
        assert_eq!(r.displacement, json!(1.4));
        assert!(r.displacement.is_number());

        let comma = rec(json!({"cilindradas": "1,6"}));
        assert_eq!(comma.displacement, json!(1.6));

        let numeric = rec(json!({"displacement": 2}));
        assert_eq!(numeric.displacement, json!(2));
    }

    #[test]
    fn displacement_text_is_never_grouped() {
        assert_eq!(rec(json!({"cilindrada": "1.600"})).displacement, json!(1.6));
    }

    #[test]
    fn unparsable_displacement_falls_back() {
        let inferred = rec(json!({"modelo": "Onix LT", "cilindrada": "n/d"}));
        assert_eq!(inferred.displacement, json!(1.0));

        let unknown = rec(json!({"modelo": "Modelo Raro", "cilindrada": "flex"}));
        assert!(unknown.displacement.is_null());

        let odd = rec(json!({"cilindrada": [1, 4]}));
        assert!(odd.displacement.is_null());
    }

    #[test]
    fn displacement_and_category_inferred_from_model() {
        let r = rec(json!({"modelo": "COMPASS LONGITUDE 2.0"}));
        assert_eq!(r.displacement, json!(2.0));
        assert_eq!(r.category, json!("SUV"));

        let unknown = rec(json!({"modelo": "Modelo Raro"}));
        assert!(unknown.displacement.is_null());
        assert!(unknown.category.is_null());
    }

    #[test]
    fn explicit_category_is_kept() {
        let r = rec(json!({"modelo": "Hilux", "categoria": "Utilitário"}));
        assert_eq!(r.category, json!("Utilitário"));
    }

    #[test]
    fn empty_record_has_all_defaults() {
        let r = rec(json!({}));
        assert!(r.id.is_null());
        assert!(r.model.is_null());
        assert!(r.displacement.is_null());
        assert_eq!(r.price, 0.0);
        assert_eq!(r.options, "");
        assert!(r.photos.is_empty());
    }

    #[test]
    fn non_object_is_a_record_error() {
        let err = reconcile(&json!("not a record")).unwrap_err();
        assert_eq!(err.kind(), "record");
        assert!(err.to_string().contains("found string"));
    }

    #[test]
    fn known_keys() {
        assert!(is_known_key("codigo_lk"));
        assert!(is_known_key("fotos"));
        assert!(!is_known_key("veiculos"));
        assert!(!is_known_key("estoque"));
    }

    #[test]
    fn label_uses_id_aliases() {
        let map = json!({"codigo": 77});
        assert_eq!(record_label(map.as_object().unwrap()), "77");
        assert_eq!(record_label(&RawRecord::new()), "?");
    }
}
