/// Records written to the round log.
pub mod models;
/// Append-only round log.
pub mod round_log;
pub mod songs;
/// Errors shared by the on-disk collaborators.
pub mod storage;
