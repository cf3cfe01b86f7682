//! Key-value storage behind one trait.
//!
//! Opaque byte blobs plus a pub/sub side-channel. Zero knowledge of chores,
//! users, or any domain concept; consumers bring their own keys and codecs.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{ByteStream, Store};
