pub mod deposit_file;
pub mod rate_store;
