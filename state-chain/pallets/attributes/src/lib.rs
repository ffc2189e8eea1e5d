//! The governance attribute store (Component E, §4.E): a path-addressed
//! key/value table that holds pool fees, oracle liveness parameters, loan
//! scheme knobs, feature gates, and the chain's internal `live/*` economy
//! counters, all under a single versioned path grammar.

pub mod error;
pub mod path;
pub mod store;
pub mod value;

pub use error::AttributesError;
pub use path::{parse_path, AttributeKey};
pub use store::{AttributeEffect, AttributeStore, PoolFeeSide};
pub use value::{AttributeValue, ScriptSetDelta};

#[cfg(test)]
mod tests;
