//! Process exit codes for `tripvault`.
//! Scripts branch on these, so they are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const VALIDATION_FAILED: i32 = 1; // Archive rejected by the restore checks
pub const CONFIG_ERROR: i32 = 2; // Unreadable input, bad flags, archive over limits
