//! Base runtime for configuration logic units.
//!
//! A [`logic::Base`] identifies the host, carries the dry-run flag and loads
//! every file of a data directory into a [`model::DataStore`]; logic units
//! implementing [`logic::Logic`] read that store and issue commands.

pub mod logic;
pub mod model;
