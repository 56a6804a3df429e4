use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FEATURE_TYPE: &str = "Feature";
const FEATURE_COLLECTION_TYPE: &str = "FeatureCollection";

fn feature_type() -> String {
    FEATURE_TYPE.to_string()
}

fn feature_collection_type() -> String {
    FEATURE_COLLECTION_TYPE.to_string()
}

/// A GeoJSON Feature as returned by Kartverket.
///
/// Only `properties` is interpreted; geometry and any other members are
/// carried through untouched so cached features round-trip exactly. A
/// missing or null `geometry` / `properties` is written back as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub geometry: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Value) -> Self {
        Self {
            kind: feature_type(),
            geometry,
            properties: None,
            extra: Map::new(),
        }
    }

    /// Properties map, created if the feature had none.
    pub fn properties_mut(&mut self) -> &mut Map<String, Value> {
        self.properties.get_or_insert_with(Map::new)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// Stamp owner information onto this feature, overwriting any existing
    /// `eier` / `matrikkelnummer` properties.
    pub fn merge_owner(&mut self, eier: Option<&str>, matrikkelnummer: &str) {
        let props = self.properties_mut();
        props.insert(
            "eier".to_string(),
            eier.map(Value::from).unwrap_or(Value::Null),
        );
        props.insert(
            "matrikkelnummer".to_string(),
            Value::from(matrikkelnummer),
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
