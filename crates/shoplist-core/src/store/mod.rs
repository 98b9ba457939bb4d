pub mod item_store;
pub mod merge;
pub mod persistence;

pub use item_store::ItemStore;
pub use merge::{apply_remote_update, merge_into_store, merge_item};
pub use persistence::{
    load_state, JsonFileStorage, LocalStorage, MemoryStorage, PersistedState, StorageError,
};
