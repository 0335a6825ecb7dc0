//! Records kept on the layer ledger.
//!
//! A [`Layer`] is one container image layer keyed by its id, pointing at the
//! layer it was built on and carrying the vulnerability ids found in it. A
//! [`Page`] is the transient view returned by a paginated scan of the ledger.

pub mod layer;
pub mod page;

pub use layer::*;
pub use page::*;
