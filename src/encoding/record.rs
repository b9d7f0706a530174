//! Promotion record and dataset

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

/// A single promotion entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub id: String,
    #[serde(with = "price")]
    pub price: f64,
    /// Opaque date token, kept exactly as it appeared in the source
    #[serde(rename = "ExpirationDate")]
    pub expiration: String,
}

impl Record {
    pub fn new(id: impl Into<String>, price: f64, expiration: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            price,
            expiration: expiration.into(),
        }
    }
}

/// JSON has no NaN or infinity, so non-finite prices travel as strings
mod price {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if price.is_finite() {
            serializer.serialize_f64(*price)
        } else {
            serializer.collect_str(price)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(price) => Ok(price),
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

/// All records of one load, keyed by id, in encounter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: IndexMap<String, Record>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` unless its id is already present.
    ///
    /// Returns `false` and leaves the existing record untouched when the id
    /// was seen before.
    pub fn insert_first(&mut self, record: Record) -> bool {
        match self.records.entry(record.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in the order they were first encountered
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for record in iter {
            dataset.insert_first(record);
        }
        dataset
    }
}
