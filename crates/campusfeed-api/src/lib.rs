// Client for the hosted campus backend plus the raw rows it hands back
pub mod client;
pub mod records;

// Re-export common types
pub use client::{ApiError, CampusClient, TableNames};
pub use records::{ComplaintRecord, FoundItemRecord, LostItemRecord, RecordKey};
