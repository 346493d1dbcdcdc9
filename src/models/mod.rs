pub mod entry;
pub mod remote;

pub use entry::{generate_local_id, is_local_id, CreateEntryDto, Entry, UtilityType};
pub use remote::{from_remote, to_remote, RemoteEntryRecord};
