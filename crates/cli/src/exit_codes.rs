//! CLI Exit Code Registry
//!
//! Single source of truth for `carfeed` exit codes. Scripts and schedulers
//! rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, including runs where some sources failed         |
//! | 1    | General error (output could not be printed)               |
//! | 2    | Usage error (bad arguments)                               |
//! | 60   | No feed sources configured (a failed document is written) |
//! | 61   | Settings file missing or invalid                          |
//!
//! Individual source failures never change the exit code; they are
//! reported on stderr and leave the other sources' vehicles in place.

/// Success - document written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown flags.
pub const EXIT_USAGE: u8 = 2;

/// No sources from flags, settings file or environment.
pub const EXIT_NO_SOURCES: u8 = 60;

/// Settings file cannot be read or parsed.
pub const EXIT_SETTINGS: u8 = 61;
