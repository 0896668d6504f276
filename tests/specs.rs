//! Black-box behavioral specifications for the `scanctl`/`scanctld` CLI.
//!
//! Each module runs the compiled binaries against an isolated state
//! directory (`SCANCTL_STATE_DIR`) so tests never share a daemon socket.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli/basics.rs"]
mod cli_basics;

#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;

#[path = "specs/job/crud.rs"]
mod job_crud;

#[path = "specs/subscriber/admin.rs"]
mod subscriber_admin;
