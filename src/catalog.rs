//! Category catalog and label mapping.
//!
//! The catalog is the fixed, ordered taxonomy captures are classified into.
//! Order defines stable indexing and is never changed after start-up.
//!
//! `LabelMapper` turns an arbitrary classifier label into a catalog entry
//! with a deterministic string hash. The mapping is a placeholder for a
//! trained label-to-breed model: it carries no accuracy guarantee and its
//! distribution must not be "improved", because captures recorded by other
//! runs rely on the exact same arithmetic.

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Built-in catalog of cattle breeds, in canonical order.
pub const CATTLE_BREEDS: [&str; 41] = [
    "Alambadi",
    "Amritmahal",
    "Ayrshire",
    "Banni",
    "Bargur",
    "Bhadawari",
    "Brown_Swiss",
    "Dangi",
    "Deoni",
    "Gir",
    "Guernsey",
    "Hallikar",
    "Hariana",
    "Holstein_Friesian",
    "Jaffrabadi",
    "Jersey",
    "Kangayam",
    "Kankrej",
    "Kasargod",
    "Kenkatha",
    "Kherigarh",
    "Khillari",
    "Krishna_Valley",
    "Malnad_gidda",
    "Mehsana",
    "Murrah",
    "Nagori",
    "Nagpuri",
    "Nili_Ravi",
    "Nimari",
    "Ongole",
    "Pulikulam",
    "Rathi",
    "Red_Dane",
    "Red_Sindhi",
    "Sahiwal",
    "Surti",
    "Tharparkar",
    "Toda",
    "Umblachery",
    "Vechur",
];

/// One entry of the catalog. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(Arc<str>);

impl Category {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, duplicate-free list of categories.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<Category>,
}

impl Catalog {
    /// Build a catalog from names. Names must be non-empty and unique.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(anyhow!("catalog entries must be non-empty"));
            }
            if !seen.insert(name.to_string()) {
                return Err(anyhow!("duplicate catalog entry '{}'", name));
            }
            entries.push(Category::new(name));
        }
        if entries.is_empty() {
            return Err(anyhow!("catalog must contain at least one category"));
        }
        Ok(Self { entries })
    }

    /// The built-in cattle breed catalog.
    pub fn cattle_breeds() -> Self {
        Self {
            entries: CATTLE_BREEDS.iter().map(|name| Category::new(*name)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry; used as the fixed default for empty labels.
    pub fn first(&self) -> &Category {
        &self.entries[0]
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.entries.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::cattle_breeds()
    }
}

/// Java-style string hash over UTF-16 code units with 32-bit signed wraparound.
///
/// `h = h * 31 + unit`, truncated to `i32` after every step.
pub fn label_hash(label: &str) -> i32 {
    label
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Deterministic label -> category mapping.
#[derive(Clone, Debug, Default)]
pub struct LabelMapper {
    catalog: Catalog,
}

impl LabelMapper {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Map a classifier label onto the catalog. Absent or empty labels map to
    /// the first catalog entry.
    pub fn map(&self, label: Option<&str>) -> Category {
        let label = match label {
            Some(label) if !label.is_empty() => label,
            _ => return self.catalog.first().clone(),
        };
        let index = self.index_for(label);
        self.catalog.entries[index].clone()
    }

    /// Catalog index for a non-empty label: `|hash| mod N`.
    pub fn index_for(&self, label: &str) -> usize {
        // unsigned_abs keeps i32::MIN at 2^31 instead of overflowing.
        let magnitude = label_hash(label).unsigned_abs() as usize;
        magnitude % self.catalog.len()
    }
}
