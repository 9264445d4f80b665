use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::logic::{Base, Logic, LogicRegistry};

const DEFAULT_SHELL: &str = "/bin/bash";

/// Registry preloaded with every built-in logic.
pub fn registry() -> Result<LogicRegistry> {
    let mut registry = LogicRegistry::new();
    registry.register(Box::new(DumpLogic))?;
    registry.register(Box::new(UsersLogic::default()))?;
    Ok(registry)
}

/// Reports host identity and the loaded data store.
#[derive(Debug, Default)]
pub struct DumpLogic;

impl Logic for DumpLogic {
    fn name(&self) -> &str {
        "dump"
    }

    fn init(&mut self, _base: &Base) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, base: &Base) -> Result<JsonValue> {
        Ok(json!({
            "hostname": base.hostname(),
            "dry_run": base.dry_run(),
            "data": base.data().to_json(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub shell: Option<String>,
}

/// One entry of the `users` report: the user plus every command issued for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOutcome {
    #[serde(flatten)]
    pub user: UserSpec,
    pub commands: Vec<String>,
}

/// Creates the accounts listed in `users.json`.
#[derive(Debug, Default)]
pub struct UsersLogic {
    users: Vec<UserSpec>,
}

impl UsersLogic {
    fn new_user_cmd(user: &UserSpec) -> String {
        match user.groups.first() {
            Some(primary) => format!("useradd -g {primary} {}", user.name),
            None => format!("useradd {}", user.name),
        }
    }

    fn secondary_groups_cmd(user: &UserSpec) -> Option<String> {
        if user.groups.len() < 2 {
            return None;
        }
        Some(format!(
            "usermod -a -G {} {}",
            user.groups[1..].join(","),
            user.name
        ))
    }
}

impl Logic for UsersLogic {
    fn name(&self) -> &str {
        "users"
    }

    fn init(&mut self, base: &Base) -> Result<()> {
        let Some((path, value)) = base
            .data()
            .find_by_stem("users")
            .find_map(|(path, value)| value.as_json().map(|json| (path, json)))
        else {
            tracing::info!("no users.json in {}", base.data_dir().display());
            self.users.clear();
            return Ok(());
        };

        let users: Vec<UserSpec> = serde_json::from_value(value.clone())
            .with_context(|| format!("{} must be a list of users", path.display()))?;

        for user in &users {
            check_identifier(&user.name)?;
            for group in &user.groups {
                check_identifier(group)?;
            }
        }

        self.users = users;
        Ok(())
    }

    fn run(&mut self, base: &Base) -> Result<JsonValue> {
        let mut success = Vec::new();
        let mut failure = Vec::new();

        for user in &self.users {
            let mut planned = vec![Self::new_user_cmd(user)];
            planned.extend(Self::secondary_groups_cmd(user));

            let mut issued = Vec::with_capacity(planned.len());
            let mut ok = true;
            for command in planned {
                let code = base.exec_or_print(&command)?;
                issued.push(command);
                if code != 0 {
                    ok = false;
                    break;
                }
            }

            let mut record = user.clone();
            record.shell.get_or_insert_with(|| DEFAULT_SHELL.to_string());
            let outcome = UserOutcome {
                user: record,
                commands: issued,
            };
            if ok {
                success.push(outcome);
            } else {
                failure.push(outcome);
            }
        }

        Ok(json!({ "success": success, "failure": failure }))
    }
}

/// Names end up in shell commands, so only plain account characters pass.
fn check_identifier(value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && !value.starts_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        bail!("invalid user or group name: {value:?}");
    }
    Ok(())
}
