//! Tool persistence and approval staging.
//!
//! Two components live here: the durable [`ToolStore`] (one JSON record per
//! tool name) and the in-memory [`ApprovalQueue`] holding definitions that
//! await a human decision. Neither coordinates with the other; the kernel
//! sequences them.

#![warn(missing_docs, clippy::pedantic)]

mod approval;
mod error;
mod store;

pub use approval::ApprovalQueue;
pub use error::{RegistryError, RegistryResult};
pub use store::ToolStore;
