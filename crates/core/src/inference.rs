//! Attribute inference from free-text model names.
//!
//! Feeds frequently omit engine displacement and body category. Both are
//! recovered from the model name by substring lookup against an ordered
//! table: the first entry whose normalized key occurs inside the normalized
//! model name wins. Table order is part of the contract, so more specific
//! keys (`hb20s`, `sw4`) are declared before the keys they contain.
//!
//! Matching is plain substring containment. A short key like `ka` also
//! matches any longer name containing those letters; that is a known
//! limitation of the heuristic and is kept as-is.

use once_cell::sync::Lazy;

use crate::normalize::normalize;

/// Ordered association list from normalized model substring to a value.
#[derive(Debug, Clone)]
pub struct InferenceTable<V> {
    entries: Vec<(String, V)>,
}

impl<V: Clone> InferenceTable<V> {
    /// Build a table from literal entries in declaration order.
    ///
    /// A literal key repeated later replaces the earlier value but keeps the
    /// earlier position. Keys that normalize to nothing are dropped, since an
    /// empty key would match every model.
    pub fn from_entries<K, I>(literal: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut raw: Vec<(String, V)> = Vec::new();
        for (key, value) in literal {
            let key = key.as_ref();
            match raw.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value,
                None => raw.push((key.to_string(), value)),
            }
        }

        let entries = raw
            .into_iter()
            .map(|(k, v)| (normalize(Some(&k)), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        Self { entries }
    }

    /// Value of the first entry whose key is a substring of the normalized
    /// model name. `None` for missing/empty input or when nothing matches.
    pub fn infer(&self, model: Option<&str>) -> Option<V> {
        let needle = normalize(model);
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| needle.contains(key.as_str()))
            .map(|(_, value)| value.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized keys in lookup order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

// ---------------------------------------------------------------------------
// Displacement (litres)
// ---------------------------------------------------------------------------

const DISPLACEMENT_ENTRIES: &[(&str, f64)] = &[
    ("mobi", 1.0),
    ("kwid", 1.0),
    ("onix plus", 1.0),
    ("onix", 1.0),
    ("hb20s", 1.0),
    ("hb20", 1.0),
    ("polo", 1.0),
    ("virtus", 1.0),
    ("t-cross", 1.0),
    ("nivus", 1.0),
    ("gol", 1.0),
    ("voyage", 1.6),
    ("argo", 1.3),
    ("cronos", 1.3),
    ("strada", 1.3),
    ("pulse", 1.3),
    ("sandero", 1.6),
    ("logan", 1.6),
    ("duster", 1.6),
    ("kicks", 1.6),
    ("versa", 1.6),
    ("creta", 1.6),
    ("saveiro", 1.6),
    ("tracker", 1.2),
    ("hr-v", 1.5),
    ("city", 1.5),
    ("fit", 1.5),
    ("yaris", 1.5),
    ("renegade", 1.8),
    ("toro", 1.8),
    ("compass", 2.0),
    ("civic", 2.0),
    ("corolla cross", 2.0),
    ("corolla", 2.0),
    ("jetta", 1.4),
    ("taos", 1.4),
    ("tiguan", 1.4),
    ("sw4", 2.8),
    ("hilux", 2.8),
    ("s10", 2.8),
    ("trailblazer", 2.8),
    ("ranger", 3.2),
    ("amarok", 3.0),
    ("frontier", 2.3),
    ("l200", 2.4),
];

/// Engine displacement in litres, keyed by model substring.
pub static DISPLACEMENT: Lazy<InferenceTable<f64>> =
    Lazy::new(|| InferenceTable::from_entries(DISPLACEMENT_ENTRIES.iter().copied()));

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

const CATEGORY_ENTRIES: &[(&str, &str)] = &[
    ("sw4", "SUV"),
    ("hilux", "Picape"),
    ("s10", "Picape"),
    ("ranger", "Picape"),
    ("amarok", "Picape"),
    ("frontier", "Picape"),
    ("l200", "Picape"),
    ("toro", "Picape"),
    ("strada", "Picape"),
    ("saveiro", "Picape"),
    ("montana", "Picape"),
    ("oroch", "Picape"),
    ("corolla cross", "SUV"),
    ("compass", "SUV"),
    ("renegade", "SUV"),
    ("creta", "SUV"),
    ("hr-v", "SUV"),
    ("t-cross", "SUV"),
    ("nivus", "SUV"),
    ("taos", "SUV"),
    ("tiguan", "SUV"),
    ("kicks", "SUV"),
    ("tracker", "SUV"),
    ("trailblazer", "SUV"),
    ("duster", "SUV"),
    ("pulse", "SUV"),
    ("ecosport", "SUV"),
    ("onix plus", "Sedan"),
    ("hb20s", "Sedan"),
    ("ka sedan", "Sedan"),
    ("civic", "Sedan"),
    ("corolla", "Sedan"),
    ("cronos", "Sedan"),
    ("virtus", "Sedan"),
    ("versa", "Sedan"),
    ("voyage", "Sedan"),
    ("logan", "Sedan"),
    ("jetta", "Sedan"),
    ("city", "Sedan"),
    ("yaris sedan", "Sedan"),
    ("onix", "Hatch"),
    ("hb20", "Hatch"),
    ("polo", "Hatch"),
    ("gol", "Hatch"),
    ("argo", "Hatch"),
    ("mobi", "Hatch"),
    ("kwid", "Hatch"),
    ("sandero", "Hatch"),
    ("fit", "Hatch"),
    ("yaris", "Hatch"),
    ("ka", "Hatch"),
];

/// Body category keyed by model substring.
pub static CATEGORY: Lazy<InferenceTable<&'static str>> =
    Lazy::new(|| InferenceTable::from_entries(CATEGORY_ENTRIES.iter().copied()));
