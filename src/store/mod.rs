pub mod actor;
pub mod client;
pub mod errors;
pub mod messages;
pub mod records;
pub mod storage;


pub use actor::StoreActor;
pub use client::StoreClient;
pub use errors::StoreError;
pub use records::*;
