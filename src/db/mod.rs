pub mod connection;
pub mod entry_cache;
pub mod migrations;

pub use connection::open_cache_database;
pub use entry_cache::EntryCache;
