pub mod audit;
pub mod cleanup;
pub mod daemon;
pub mod lifecycle;
pub mod state_store;
