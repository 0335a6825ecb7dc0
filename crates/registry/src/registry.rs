//! Layer registry implementation
//!
//! Each handler is one ledger transaction: zero or more reads, invariant
//! checks, then at most one write. A failed check returns before the write.

use crate::codec::{JsonLayerCodec, LayerCodec};
use crate::errors::*;
use crate::pagination::{assemble_page, lookahead};
use layer_ledger_storage::StateStore;
use layer_ledger_types::{Layer, Page};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Chain walks longer than this are rejected by default.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 4096;

/// Tunables for the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of layers returned by a lineage walk.
    pub max_chain_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

/// Layer Registry
///
/// Generic over the ledger state and the record codec so tests can run the
/// same handlers over [`layer_ledger_storage::MemoryStateStore`].
#[derive(Debug, Clone)]
pub struct LayerRegistry<S: StateStore, C: LayerCodec = JsonLayerCodec> {
    store: S,
    codec: C,
    config: RegistryConfig,
}

impl<S: StateStore> LayerRegistry<S> {
    /// Create a registry over `store` with JSON records
    pub fn new(store: S) -> Self {
        Self::with_codec(store, JsonLayerCodec)
    }
}

impl<S: StateStore, C: LayerCodec> LayerRegistry<S, C> {
    pub fn with_codec(store: S, codec: C) -> Self {
        Self {
            store,
            codec,
            config: RegistryConfig::default(),
        }
    }

    /// Replace the tunables. A `max_chain_depth` of 0 is rejected since no
    /// walk could return even the queried layer.
    pub fn with_config(mut self, config: RegistryConfig) -> Result<Self> {
        if config.max_chain_depth == 0 {
            return Err(RegistryError::InvalidArgument(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        self.config = config;
        Ok(self)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Fetch the layer stored under `layer_id`.
    pub fn query_layer(&self, layer_id: &str) -> Result<Layer> {
        debug!(layer_id, "Querying layer");
        self.get_existing_layer(layer_id)
    }

    /// Fetch `layer_id` and every ancestor, ordered from the layer up to its root.
    pub fn query_layer_with_parents(&self, layer_id: &str) -> Result<Vec<Layer>> {
        debug!(layer_id, "Querying layer lineage");

        let mut layer = self.get_existing_layer(layer_id)?;
        // Track store keys; a payload's embedded id may differ from its key.
        let mut visited = HashSet::from([layer_id.to_string()]);
        let mut chain = Vec::new();

        loop {
            let parent_id = layer.parent().map(str::to_string);
            chain.push(layer);

            let Some(parent_id) = parent_id else {
                return Ok(chain);
            };

            if chain.len() >= self.config.max_chain_depth {
                warn!(layer_id, max_depth = self.config.max_chain_depth, "Lineage too deep");
                return Err(RegistryError::LineageTooDeep {
                    layer_id: layer_id.to_string(),
                    max_depth: self.config.max_chain_depth,
                });
            }
            if !visited.insert(parent_id.clone()) {
                warn!(layer_id, parent_id = %parent_id, "Lineage cycle detected");
                return Err(RegistryError::LineageCycle {
                    layer_id: layer_id.to_string(),
                });
            }

            layer = self.get_existing_layer(&parent_id)?;
        }
    }

    /// Create a layer from its submitted payload.
    ///
    /// The payload is stored byte for byte; it is not re-encoded and its
    /// embedded id is not compared with `layer_id`. An empty
    /// `parent_layer_id` creates a root layer.
    pub fn add_layer(&self, layer_id: &str, parent_layer_id: &str, payload: &str) -> Result<Layer> {
        if self.store.get_state(layer_id)?.is_some() {
            warn!(layer_id, "Layer already exists");
            return Err(RegistryError::LayerAlreadyExists {
                layer_id: layer_id.to_string(),
            });
        }

        if !parent_layer_id.is_empty() && self.store.get_state(parent_layer_id)?.is_none() {
            warn!(layer_id, parent_layer_id, "Parent layer does not exist");
            return Err(RegistryError::not_found(parent_layer_id));
        }

        let layer = self.codec.decode(payload).map_err(|err| {
            warn!(layer_id, error = %err, "Rejected layer payload");
            RegistryError::from(err)
        })?;

        self.store.put_state(layer_id, payload)?;
        info!(layer_id, parent_layer_id, "Added layer");

        Ok(layer)
    }

    /// Append `vulnerability_id` to the layer's findings.
    pub fn add_vulnerability_to_layer(&self, layer_id: &str, vulnerability_id: &str) -> Result<Layer> {
        let mut layer = self.get_existing_layer(layer_id)?;

        if layer.has_vulnerability(vulnerability_id) {
            warn!(layer_id, vulnerability_id, "Vulnerability already added");
            return Err(RegistryError::VulnerabilityAlreadyAdded {
                layer_id: layer_id.to_string(),
                vulnerability_id: vulnerability_id.to_string(),
            });
        }

        layer.vulnerability_ids.push(vulnerability_id.to_string());
        let encoded = self
            .codec
            .encode(&layer)
            .map_err(|err| RegistryError::Encoding(err.to_string()))?;
        self.store.put_state(layer_id, &encoded)?;
        info!(
            layer_id,
            vulnerability_id,
            total = layer.vulnerability_ids.len(),
            "Added vulnerability to layer"
        );

        Ok(layer)
    }

    /// Read one page of layers over the whole key range.
    ///
    /// An empty `page_id` starts from the first key; otherwise pass the
    /// `page_id` of the previous page.
    pub fn query_paged_layers(&self, page_id: &str, page_size: usize) -> Result<Page> {
        let requested = lookahead(page_size)?;
        let scan = self
            .store
            .get_state_by_range_with_pagination("", "", requested, page_id)?;

        let scanned = scan
            .records
            .iter()
            .map(|record| {
                self.codec.decode(&record.value).map_err(|err| {
                    warn!(key = %record.key, error = %err, "Undecodable layer record");
                    RegistryError::from(err)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let page = assemble_page(scanned, page_size, scan.bookmark);
        debug!(
            page_id,
            returned = page.page_size,
            has_more = page.has_more(),
            "Queried layer page"
        );
        Ok(page)
    }

    fn get_existing_layer(&self, layer_id: &str) -> Result<Layer> {
        match self.store.get_state(layer_id)? {
            Some(raw) => Ok(self.codec.decode(&raw)?),
            None => {
                warn!(layer_id, "Layer does not exist");
                Err(RegistryError::not_found(layer_id))
            }
        }
    }
}
