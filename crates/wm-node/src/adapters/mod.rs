//! Concrete driven-port implementations wiring every crate in this
//! workspace to one running process.

pub mod local_tree;
pub mod manual_queue;
pub mod metadata;
pub mod roster;
pub mod store;
pub mod transport;

pub use local_tree::HashTreeLocalTree;
pub use manual_queue::InMemoryManualQueue;
pub use metadata::InMemoryMetadataSink;
pub use roster::Roster;
pub use store::InMemoryRecordStore;
pub use transport::ReqwestMeshTransport;
