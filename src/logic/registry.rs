use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use serde_json::Value as JsonValue;

use crate::logic::{Base, Logic};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicStatus {
    Registered,
    Initialized,
    Error(String),
}

struct Entry {
    logic: Box<dyn Logic>,
    status: LogicStatus,
    initialized: bool,
}

#[derive(Default)]
pub struct LogicRegistry {
    entries: HashMap<String, Entry>,
}

impl LogicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, logic: Box<dyn Logic>) -> Result<()> {
        let name = logic.name().to_string();
        if self.entries.contains_key(&name) {
            bail!("logic already registered: {name}");
        }

        self.entries.insert(
            name,
            Entry {
                logic,
                status: LogicStatus::Registered,
                initialized: false,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, name: &str) -> Option<&LogicStatus> {
        self.entries.get(name).map(|entry| &entry.status)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn summary(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return vec!["logic: none registered".to_string()];
        }

        let mut rows: Vec<String> = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let status = match &entry.status {
                    LogicStatus::Registered => "registered".to_string(),
                    LogicStatus::Initialized => "initialized".to_string(),
                    LogicStatus::Error(err) => format!("error: {err}"),
                };
                format!("logic {name} [{status}]")
            })
            .collect();

        rows.sort();
        rows
    }

    /// Run `name`, initializing it first if it has not been yet.
    ///
    /// `init` runs until it succeeds once; a failed `run` does not repeat it.
    pub fn execute(&mut self, name: &str, base: &Base) -> Result<JsonValue> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| anyhow!("logic not found: {name}"))?;

        if !entry.initialized {
            if let Err(err) = entry.logic.init(base) {
                tracing::error!("logic {name} failed to initialize: {err:#}");
                entry.status = LogicStatus::Error(format!("{err:#}"));
                return Err(err.context(format!("initializing logic {name}")));
            }
            entry.initialized = true;
            entry.status = LogicStatus::Initialized;
        }

        tracing::info!(dry_run = base.dry_run(), "starting logic: {name}");
        match entry.logic.run(base) {
            Ok(report) => {
                entry.status = LogicStatus::Initialized;
                Ok(report)
            }
            Err(err) => {
                tracing::error!("logic {name} failed: {err:#}");
                entry.status = LogicStatus::Error(format!("{err:#}"));
                Err(err.context(format!("running logic {name}")))
            }
        }
    }
}
