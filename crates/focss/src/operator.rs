//! Extract/transform/apply diffing against a [`StyleSurface`].
//!
//! Operators speak in *internal keys*: camel-case property names such as
//! `maxWidth`. The surface speaks dash-case (`max-width`). The two are a
//! bijection, memoized by a [`PropertyKeyCache`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use focss_core::StyleSurface;
use focss_core::logging::targets;
use parking_lot::Mutex;
use regex::{Captures, Regex};

/// Internal key to value; `None` means "unset".
pub type PropertyMap = BTreeMap<String, Option<String>>;

static DASH_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([a-z])").expect("dash pattern is valid"));
static UPPER_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("upper-case pattern is valid"));

/// Convert a dash-case property name to its camel-case key.
///
/// A leading dash (vendor prefix) becomes a leading capital:
/// `-webkit-transition` is `WebkitTransition`.
pub fn dash_to_camel(property: &str) -> String {
    DASH_LETTER
        .replace_all(property, |caps: &Captures<'_>| caps[1].to_ascii_uppercase())
        .into_owned()
}

/// Convert a camel-case key back to its dash-case property name.
pub fn camel_to_dash(key: &str) -> String {
    UPPER_LETTER
        .replace_all(key, |caps: &Captures<'_>| format!("-{}", caps[0].to_ascii_lowercase()))
        .into_owned()
}

/// Memoized conversions between property names and internal keys.
///
/// Lookups are pure: a cached result always equals a fresh conversion.
#[derive(Debug, Default)]
pub struct PropertyKeyCache {
    to_internal: Mutex<HashMap<String, String>>,
    to_property: Mutex<HashMap<String, String>>,
}

impl PropertyKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The internal key for a dash-case property name.
    pub fn internal_key(&self, property: &str) -> String {
        memoize(&self.to_internal, property, dash_to_camel)
    }

    /// The dash-case property name for an internal key.
    pub fn property_name(&self, key: &str) -> String {
        memoize(&self.to_property, key, camel_to_dash)
    }

    /// Number of memoized property names.
    pub fn len(&self) -> usize {
        self.to_internal.lock().len()
    }

    /// Check if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn memoize(memo: &Mutex<HashMap<String, String>>, input: &str, convert: fn(&str) -> String) -> String {
    let mut memo = memo.lock();
    if let Some(hit) = memo.get(input) {
        return hit.clone();
    }
    let converted = convert(input);
    memo.insert(input.to_string(), converted.clone());
    converted
}

/// Reads and diff-writes a style surface.
pub trait StyleOperator: Send {
    /// All declared, non-empty properties in surface order, keyed by internal key.
    fn extract(&self, surface: &dyn StyleSurface) -> Vec<(String, String)>;

    /// Fold extracted pairs into a map. Later duplicates win.
    fn transform(&self, pairs: Vec<(String, String)>) -> PropertyMap {
        pairs.into_iter().map(|(key, value)| (key, Some(value))).collect()
    }

    /// Write `incoming` and clear what `previous` set that `incoming` lacks.
    ///
    /// `None` values write the unset sentinel. No other property is read or
    /// written, and values are forwarded as-is.
    fn apply(&self, surface: &mut dyn StyleSurface, incoming: &PropertyMap, previous: &PropertyMap);

    /// The internal key for a dash-case property name.
    fn internal_key(&self, property: &str) -> String;
}

/// The default operator, writing element inline styles.
#[derive(Debug, Clone)]
pub struct InlineStyleOperator {
    keys: Arc<PropertyKeyCache>,
}

impl InlineStyleOperator {
    /// Create an operator backed by `keys`.
    pub fn new(keys: Arc<PropertyKeyCache>) -> Self {
        Self { keys }
    }

    /// The key cache in use.
    pub fn keys(&self) -> &Arc<PropertyKeyCache> {
        &self.keys
    }
}

impl Default for InlineStyleOperator {
    fn default() -> Self {
        Self::new(Arc::new(PropertyKeyCache::new()))
    }
}

impl StyleOperator for InlineStyleOperator {
    fn extract(&self, surface: &dyn StyleSurface) -> Vec<(String, String)> {
        (0..surface.len())
            .filter_map(|index| surface.item(index))
            .filter_map(|property| {
                let value = surface.get_property_value(property);
                (!value.is_empty()).then(|| (self.keys.internal_key(property), value.to_string()))
            })
            .collect()
    }

    fn apply(&self, surface: &mut dyn StyleSurface, incoming: &PropertyMap, previous: &PropertyMap) {
        for (key, value) in incoming {
            let property = self.keys.property_name(key);
            let value = value.as_deref().unwrap_or("");
            tracing::trace!(target: targets::OPERATOR, %property, %value, "set property");
            surface.set_property(&property, value);
        }

        for key in previous.keys().filter(|key| !incoming.contains_key(*key)) {
            let property = self.keys.property_name(key);
            tracing::trace!(target: targets::OPERATOR, %property, "clear property");
            surface.set_property(&property, "");
        }
    }

    fn internal_key(&self, property: &str) -> String {
        self.keys.internal_key(property)
    }
}
