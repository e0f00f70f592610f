/// Shared utilities
pub mod polling;
