//! Follow-location resolution.
//!
//! Resolves a "follow this symbol" query against the cross-reference index:
//! locate the occurrence under the query location, then walk its outgoing
//! target relations to the most useful destination (normally a definition).

mod follow;
mod target;

pub use follow::resolve;
pub use target::best_target;
