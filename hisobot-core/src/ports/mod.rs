//! Port definitions (trait seams)
//!
//! Narrow interfaces to the external collaborators: the sheet-backed
//! store, the remote label classifier, and the outbound messenger.
//! All ports are synchronous; the engine processes one unit of work
//! per inbound message.

mod classifier;
mod messenger;
mod store;

pub use classifier::{Analyst, LabelClassifier};
pub use messenger::Messenger;
pub use store::LedgerStore;
