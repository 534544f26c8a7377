/// Database models
///
/// - `user`: user accounts and refresh-token storage
/// - `note`: notes, the lifecycle state machine, and tag normalization

pub mod note;
pub mod user;
