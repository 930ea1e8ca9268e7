// Notification engine - turns three campus collections into one feed
pub mod center;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod refresh;
pub mod sources;
pub mod state;

pub use center::NotificationCenter;
pub use config::Config;
pub use error::Error;
pub use filter::TypeFilter;
pub use models::{Notification, NotificationDetail, NotificationKind, RawRecord};
pub use refresh::{FeedRefresher, RefreshHandle, RefreshOutcome, RefreshPhase};
pub use sources::{BaasSource, NotificationSource};
pub use state::{MemoryBackend, NotificationState, StateBackend};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
