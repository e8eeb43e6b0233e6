pub mod files;
pub mod snapshot;
pub mod storage;

pub use files::{
    atomic_write, config_file, ensure_data_dir, init_local_data_dir, log_file,
    read_file, reminders_file,
};
pub use snapshot::{decode_snapshot, encode_snapshot, STORAGE_KEY};
pub use storage::{FileStorage, Storage};

#[cfg(test)]
pub use storage::MemoryStorage;
