//! Replica coordination for cfjson documents.
//!
//! Turns the document engine of `cfjson-crdt` into a set of cooperating
//! replicas:
//!
//! - **Delivery**: holds remote operations back until causally ready
//! - **Replica**: applies local edits and remote operations to one document
//! - **Transport**: the broadcast contract, plus an in-process implementation
//! - **Driver**: async tasks that connect a replica to a transport
//!
//! # Example
//!
//! ```
//! use cfjson_crdt::Cursor;
//! use cfjson_sync::{Replica, ReplicaConfig};
//! use serde_json::json;
//!
//! let mut alice = Replica::new(ReplicaConfig::default());
//! let mut bob = Replica::new(ReplicaConfig::default());
//!
//! let op = alice
//!     .assign_json(Cursor::root().key("todos"), &json!(["milk"]))
//!     .unwrap();
//! bob.receive(op).unwrap();
//!
//! assert_eq!(bob.to_json(), json!({ "todos": ["milk"] }));
//! ```

mod config;
mod delivery;
mod driver;
mod error;
mod replica;
pub mod transport;

pub use config::ReplicaConfig;
pub use delivery::CausalBuffer;
pub use driver::SyncedReplica;
pub use error::{SyncError, SyncResult};
pub use replica::{DeliveryReport, Replica};
pub use transport::memory::MemoryBroadcast;
pub use transport::{Broadcast, OperationStream};
