pub mod config;
pub mod data_store;
pub mod loader;

pub use data_store::{DataStore, DataValue};
pub use loader::LoadError;
