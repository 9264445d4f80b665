pub mod base;
pub mod builtin;
pub mod registry;

pub use base::{Base, BaseOptions};
pub use registry::LogicRegistry;

use anyhow::Result;
use serde_json::Value as JsonValue;

/// A unit of configuration logic driven by a [`Base`].
///
/// Neither hook has a default body; each implementation decides what setup
/// and what work it needs.
pub trait Logic {
    fn name(&self) -> &str;

    /// One-time setup, called before the first `run`.
    fn init(&mut self, base: &Base) -> Result<()>;

    /// Do the work and return a JSON report.
    fn run(&mut self, base: &Base) -> Result<JsonValue>;
}
