//! Layer record encoding

use layer_ledger_types::Layer;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Layer codec error: {0}")]
pub struct CodecError(String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Converts layers to and from the string form kept in the state store.
pub trait LayerCodec {
    fn encode(&self, layer: &Layer) -> Result<String, CodecError>;
    fn decode(&self, raw: &str) -> Result<Layer, CodecError>;
}

/// JSON with `id`, `parentId` and `vulnerabilityIds` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLayerCodec;

impl LayerCodec for JsonLayerCodec {
    fn encode(&self, layer: &Layer) -> Result<String, CodecError> {
        Ok(serde_json::to_string(layer)?)
    }

    fn decode(&self, raw: &str) -> Result<Layer, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_root_layer() {
        let codec = JsonLayerCodec;
        let layer = Layer::root("sha256:base");
        let encoded = codec.encode(&layer).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), layer);
    }

    #[test]
    fn test_encodes_expected_shape() {
        let layer = Layer::new("L2", "L1").with_vulnerabilities(["CVE-1"]);
        let encoded = JsonLayerCodec.encode(&layer).unwrap();
        assert_eq!(
            encoded,
            r#"{"id":"L2","parentId":"L1","vulnerabilityIds":["CVE-1"]}"#
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(JsonLayerCodec.decode("not json").is_err());
        assert!(JsonLayerCodec.decode("").is_err());
        assert!(JsonLayerCodec.decode(r#"{"parentId":"L1"}"#).is_err());
    }
}
