//! Domain layer for the Mii mining job service clients.
//!
//! Everything here is free of network I/O: identifiers and statuses,
//! response envelope interpretation, submission checks, the job
//! identity resolver, the client lifecycle transition table, the view
//! presenter, and the operator console table rendering. The async
//! drivers live in `miimine-client`.

pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod jobs_table;
pub mod lifecycle;
pub mod presenter;
pub mod submission;
pub mod types;
pub mod workers;
