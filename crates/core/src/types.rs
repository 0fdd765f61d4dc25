/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Unique identifier assigned to each generation job.
pub type JobId = uuid::Uuid;
