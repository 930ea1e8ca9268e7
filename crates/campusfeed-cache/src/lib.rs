// SQLite-backed local state
// Holds the little bits of per-machine state that must survive restarts

pub mod cache;

pub use cache::StateCache;
pub use rusqlite::Error as CacheError;
