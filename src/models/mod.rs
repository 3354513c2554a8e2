pub mod client;
pub mod report;
pub mod session;
pub mod session_state;
