//! String-argument transaction entry point.
//!
//! Ledger hosts invoke contracts by function name with every argument as a
//! string and expect a string back. [`LayerContract`] parses such a call into
//! a [`LayerTransaction`], runs it on the [`LayerRegistry`], and returns the
//! JSON of the result.

use crate::codec::{JsonLayerCodec, LayerCodec};
use crate::errors::*;
use crate::registry::LayerRegistry;
use layer_ledger_storage::StateStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Descriptive metadata published with the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub license: &'static str,
}

impl ContractInfo {
    pub const fn current() -> Self {
        Self {
            name: "layer-registry-contract",
            title: "layer registry contract",
            description: "Stores container image layers, their lineage and the vulnerabilities found in them",
            version: env!("CARGO_PKG_VERSION"),
            license: "Apache-2.0",
        }
    }
}

/// A parsed contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerTransaction {
    QueryLayer {
        layer_id: String,
    },
    QueryLayerWithParents {
        layer_id: String,
    },
    AddLayer {
        layer_id: String,
        parent_layer_id: String,
        payload: String,
    },
    AddVulnerabilityToLayer {
        layer_id: String,
        vulnerability_id: String,
    },
    QueryPagedLayers {
        page_id: String,
        page_size: usize,
    },
}

impl LayerTransaction {
    /// Function names accepted by [`LayerTransaction::parse`].
    pub const FUNCTIONS: [&'static str; 5] = [
        "queryLayer",
        "queryLayerWithParents",
        "addLayer",
        "addVulnerabilityToLayer",
        "queryPagedLayers",
    ];

    pub fn parse(function: &str, args: &[String]) -> Result<Self> {
        let tx = match function {
            "queryLayer" => {
                let [layer_id] = expect_args(function, args)?;
                Self::QueryLayer { layer_id }
            }
            "queryLayerWithParents" => {
                let [layer_id] = expect_args(function, args)?;
                Self::QueryLayerWithParents { layer_id }
            }
            "addLayer" => {
                let [layer_id, parent_layer_id, payload] = expect_args(function, args)?;
                Self::AddLayer {
                    layer_id,
                    parent_layer_id,
                    payload,
                }
            }
            "addVulnerabilityToLayer" => {
                let [layer_id, vulnerability_id] = expect_args(function, args)?;
                Self::AddVulnerabilityToLayer {
                    layer_id,
                    vulnerability_id,
                }
            }
            "queryPagedLayers" => {
                let [page_id, page_size] = expect_args(function, args)?;
                Self::QueryPagedLayers {
                    page_id,
                    page_size: parse_page_size(&page_size)?,
                }
            }
            other => {
                return Err(RegistryError::UnknownTransaction {
                    name: other.to_string(),
                })
            }
        };
        Ok(tx)
    }

    pub fn function(&self) -> &'static str {
        match self {
            Self::QueryLayer { .. } => "queryLayer",
            Self::QueryLayerWithParents { .. } => "queryLayerWithParents",
            Self::AddLayer { .. } => "addLayer",
            Self::AddVulnerabilityToLayer { .. } => "addVulnerabilityToLayer",
            Self::QueryPagedLayers { .. } => "queryPagedLayers",
        }
    }

    /// Whether the transaction may write to the ledger.
    pub fn is_submit(&self) -> bool {
        matches!(
            self,
            Self::AddLayer { .. } | Self::AddVulnerabilityToLayer { .. }
        )
    }
}

fn expect_args<const N: usize>(function: &str, args: &[String]) -> Result<[String; N]> {
    <[String; N]>::try_from(args.to_vec()).map_err(|got| {
        RegistryError::InvalidArgument(format!(
            "{function} expects {N} argument(s), got {}",
            got.len()
        ))
    })
}

fn parse_page_size(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| RegistryError::InvalidArgument(format!("malformed page size: {raw:?}")))
}

/// Error envelope handed back to whatever transport invoked the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFailure {
    pub code: String,
    pub message: String,
}

impl From<&RegistryError> for TransactionFailure {
    fn from(err: &RegistryError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Registry exposed through string-argument calls
pub struct LayerContract<S: StateStore, C: LayerCodec = JsonLayerCodec> {
    registry: LayerRegistry<S, C>,
}

impl<S: StateStore, C: LayerCodec> LayerContract<S, C> {
    pub fn new(registry: LayerRegistry<S, C>) -> Self {
        Self { registry }
    }

    pub fn info(&self) -> ContractInfo {
        ContractInfo::current()
    }

    pub fn registry(&self) -> &LayerRegistry<S, C> {
        &self.registry
    }

    /// Parse and execute one call, returning the JSON-encoded result.
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<String> {
        let tx = LayerTransaction::parse(function, args)?;
        self.execute(&tx)
    }

    pub fn execute(&self, tx: &LayerTransaction) -> Result<String> {
        debug!(function = tx.function(), submit = tx.is_submit(), "Executing transaction");
        match tx {
            LayerTransaction::QueryLayer { layer_id } => {
                to_json(&self.registry.query_layer(layer_id)?)
            }
            LayerTransaction::QueryLayerWithParents { layer_id } => {
                to_json(&self.registry.query_layer_with_parents(layer_id)?)
            }
            LayerTransaction::AddLayer {
                layer_id,
                parent_layer_id,
                payload,
            } => to_json(&self.registry.add_layer(layer_id, parent_layer_id, payload)?),
            LayerTransaction::AddVulnerabilityToLayer {
                layer_id,
                vulnerability_id,
            } => to_json(
                &self
                    .registry
                    .add_vulnerability_to_layer(layer_id, vulnerability_id)?,
            ),
            LayerTransaction::QueryPagedLayers { page_id, page_size } => {
                to_json(&self.registry.query_paged_layers(page_id, *page_size)?)
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| RegistryError::Encoding(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parses_every_function() {
        let cases = [
            ("queryLayer", args(&["L1"])),
            ("queryLayerWithParents", args(&["L1"])),
            ("addLayer", args(&["L1", "", "{}"])),
            ("addVulnerabilityToLayer", args(&["L1", "CVE-1"])),
            ("queryPagedLayers", args(&["", "10"])),
        ];
        for (function, call_args) in &cases {
            let tx = LayerTransaction::parse(function, call_args).unwrap();
            assert_eq!(tx.function(), *function);
        }
        assert_eq!(cases.len(), LayerTransaction::FUNCTIONS.len());
    }

    #[test]
    fn test_wrong_arity_is_invalid_argument() {
        let err = LayerTransaction::parse("addLayer", &args(&["L1"])).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(err.to_string().contains("expects 3 argument(s), got 1"));
    }

    #[test]
    fn test_malformed_page_size() {
        for bad in ["ten", "-1", "", "1.5"] {
            let err = LayerTransaction::parse("queryPagedLayers", &args(&["", bad])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "page size {bad:?}");
        }
    }

    #[test]
    fn test_unknown_function() {
        let err = LayerTransaction::parse("deleteLayer", &args(&["L1"])).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_TRANSACTION");
    }

    #[test]
    fn test_submit_classification() {
        let add = LayerTransaction::parse("addLayer", &args(&["L1", "", "{}"])).unwrap();
        let query = LayerTransaction::parse("queryLayer", &args(&["L1"])).unwrap();
        assert!(add.is_submit());
        assert!(!query.is_submit());
    }

    #[test]
    fn test_failure_envelope() {
        let err = RegistryError::LayerAlreadyExists {
            layer_id: "L1".into(),
        };
        let failure = TransactionFailure::from(&err);
        assert_eq!(failure.code, "LAYER_ALREADY_EXISTS");
        assert_eq!(failure.message, "Layer with id: L1 already exists");
    }

    #[test]
    fn test_unserializable_result_is_internal() {
        use std::collections::BTreeMap;

        let value = BTreeMap::from([((1u8, 2u8), "layer")]);
        let err = to_json(&value).unwrap_err();
        assert_eq!(err.code(), "ENCODING_FAILURE");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_contract_info() {
        let info = ContractInfo::current();
        assert_eq!(info.name, "layer-registry-contract");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }
}
