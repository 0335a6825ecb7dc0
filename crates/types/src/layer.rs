//! Container image layer record

use serde::{Deserialize, Deserializer, Serialize};

/// One container image layer as stored on the ledger.
///
/// The `id` doubles as the ledger key. `parent_id` is empty for a root layer.
/// `vulnerability_ids` only ever grows, in discovery order, without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vulnerability_ids: Vec<String>,
}

impl Layer {
    /// Create a layer with no vulnerabilities recorded yet.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            vulnerability_ids: Vec::new(),
        }
    }

    /// Create a layer without a parent.
    pub fn root(id: impl Into<String>) -> Self {
        Self::new(id, String::new())
    }

    /// Attach vulnerability ids, builder style.
    pub fn with_vulnerabilities<I, V>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.vulnerability_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }

    /// The parent id, or `None` for a root layer.
    pub fn parent(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            Some(&self.parent_id)
        }
    }

    pub fn has_vulnerability(&self, vulnerability_id: &str) -> bool {
        self.vulnerability_ids.iter().any(|v| v == vulnerability_id)
    }
}

// Scan tooling submits `null` for a root layer's parent; treat it as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let layer = Layer::new("sha256:b", "sha256:a").with_vulnerabilities(["CVE-2021-1"]);
        let json = serde_json::to_value(&layer).unwrap();

        assert_eq!(json["id"], "sha256:b");
        assert_eq!(json["parentId"], "sha256:a");
        assert_eq!(json["vulnerabilityIds"][0], "CVE-2021-1");
    }

    #[test]
    fn test_missing_and_null_fields_decode_as_empty() {
        let missing: Layer = serde_json::from_str(r#"{"id":"L1"}"#).unwrap();
        assert_eq!(missing, Layer::root("L1"));

        let nulls: Layer =
            serde_json::from_str(r#"{"id":"L1","parentId":null,"vulnerabilityIds":null}"#)
                .unwrap();
        assert!(nulls.is_root());
        assert!(nulls.vulnerability_ids.is_empty());
    }

    #[test]
    fn test_parent_accessor() {
        assert_eq!(Layer::root("L1").parent(), None);
        assert_eq!(Layer::new("L2", "L1").parent(), Some("L1"));
    }

    #[test]
    fn test_has_vulnerability() {
        let layer = Layer::root("L1").with_vulnerabilities(["CVE-1", "CVE-2"]);
        assert!(layer.has_vulnerability("CVE-2"));
        assert!(!layer.has_vulnerability("CVE-3"));
    }

    fn arbitrary_layer() -> impl Strategy<Value = Layer> {
        (
            "[a-z0-9:]{1,24}",
            prop_oneof![Just(String::new()), "[a-z0-9:]{1,24}"],
            prop::collection::vec("CVE-[0-9]{4}-[0-9]{1,5}", 0..6),
        )
            .prop_map(|(id, parent_id, vulnerability_ids)| Layer {
                id,
                parent_id,
                vulnerability_ids,
            })
    }

    proptest! {
        #[test]
        fn layer_json_round_trips(layer in arbitrary_layer()) {
            let encoded = serde_json::to_string(&layer).unwrap();
            let decoded: Layer = serde_json::from_str(&encoded).unwrap();
            prop_assert_eq!(decoded, layer);
        }
    }
}
