//! Narrow interfaces to the outside world: processes, the foreground
//! window, client workspaces and the daemon executable.

pub mod launcher;
pub mod process;
pub mod sampler;
pub mod workspace;
