//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error: integrity findings, rejected moves, bad snapshot
pub const DATAERR: i32 = 65;

/// Cannot open input: unknown category, comment or user
pub const NOINPUT: i32 = 66;

/// Input/output error
pub const IOERR: i32 = 74;

/// Permission denied: role or approval check failed
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;
