//! Layer Registry
//!
//! Transaction handlers that track container image layers on a ledger: layer
//! creation with parent linkage, lineage walks up to the root layer,
//! vulnerability attachment, and bookmark pagination over every stored layer.
//!
//! The registry keeps no state of its own. Every invariant (unique ids,
//! parent exists before child, no repeated vulnerability) is enforced by
//! reading the injected [`StateStore`] before the single write each
//! transaction is allowed.

pub mod codec;
pub mod contract;
pub mod errors;
pub mod pagination;
pub mod registry;

pub use codec::{CodecError, JsonLayerCodec, LayerCodec};
pub use contract::{ContractInfo, LayerContract, LayerTransaction, TransactionFailure};
pub use errors::*;
pub use layer_ledger_storage::{MemoryStateStore, SledStateStore, StateStore, DEFAULT_TREE};
pub use layer_ledger_types::{Layer, Page};
pub use registry::{LayerRegistry, RegistryConfig};
