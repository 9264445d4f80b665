use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::model::loader::{self, LoadError};
use crate::model::DataStore;

/// Construction settings for [`Base`].
#[derive(Debug, Clone)]
pub struct BaseOptions {
    pub data_dir: PathBuf,
    pub dry_run: bool,
    /// Falls back to the OS hostname when unset.
    pub hostname: Option<String>,
}

impl BaseOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dry_run: true,
            hostname: None,
        }
    }
}

/// Shared state handed to every logic unit: host identity, the dry-run flag,
/// and everything found in the data directory.
#[derive(Debug, Clone)]
pub struct Base {
    hostname: String,
    dry_run: bool,
    data_dir: PathBuf,
    data: DataStore,
}

impl Base {
    pub fn new(options: BaseOptions) -> Result<Self, LoadError> {
        let hostname = options.hostname.unwrap_or_else(local_hostname);
        let data = loader::load(&options.data_dir)?;

        tracing::info!(
            hostname = %hostname,
            dry_run = options.dry_run,
            "base ready with {} data entries",
            data.len()
        );

        Ok(Self {
            hostname,
            dry_run: options.dry_run,
            data_dir: options.data_dir,
            data,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Re-scan the data directory. The previous store is kept if loading fails.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.data = loader::load(&self.data_dir)?;
        Ok(())
    }

    /// Print `command` to stderr in dry-run mode, otherwise run it through
    /// `sh -c` with its output captured into the log.
    ///
    /// Stdout is left alone so callers can keep it for a JSON report.
    /// Returns the exit code: `0` for a dry run, `-1` when the process was
    /// terminated by a signal.
    pub fn exec_or_print(&self, command: &str) -> Result<i32> {
        if self.dry_run {
            tracing::info!(dry_run = true, "would execute: {command}");
            eprintln!("{command}");
            return Ok(0);
        }

        tracing::info!("executing: {command}");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .with_context(|| format!("spawning `{command}`"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            tracing::info!("`{command}` stdout: {}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            tracing::warn!("`{command}` stderr: {}", stderr.trim_end());
        }

        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            tracing::warn!("`{command}` exited with {code}");
        }
        Ok(code)
    }
}

fn local_hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        tracing::warn!("hostname lookup returned nothing, using localhost");
        return "localhost".to_string();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn defaults_to_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let base = Base::new(BaseOptions::new(dir.path().join("data"))).unwrap();

        assert!(base.dry_run());
        assert!(base.data().is_empty());
        assert!(!base.hostname().is_empty());
    }

    #[test]
    fn explicit_hostname_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = BaseOptions::new(dir.path());
        options.hostname = Some("web-01".into());

        let base = Base::new(options).unwrap();
        assert_eq!(base.hostname(), "web-01");
    }

    #[test]
    fn construction_loads_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"x": 1}"#).unwrap();

        let base = Base::new(BaseOptions::new(dir.path())).unwrap();
        let key = fs::canonicalize(dir.path()).unwrap().join("a.json");
        assert_eq!(base.data().json(key), Some(&json!({"x": 1})));
    }

    #[test]
    fn construction_fails_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "not valid json").unwrap();

        assert!(matches!(
            Base::new(BaseOptions::new(dir.path())),
            Err(LoadError::Json { .. })
        ));
    }

    #[test]
    fn reload_picks_up_new_files_and_keeps_old_store_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = Base::new(BaseOptions::new(dir.path())).unwrap();
        assert!(base.data().is_empty());

        fs::write(dir.path().join("motd"), "hi").unwrap();
        base.reload().unwrap();
        assert_eq!(base.data().len(), 1);

        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert!(base.reload().is_err());
        assert_eq!(base.data().len(), 1);
    }

    #[test]
    fn dry_run_does_not_execute() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("touched");
        let base = Base::new(BaseOptions::new(dir.path().join("data"))).unwrap();

        let code = base
            .exec_or_print(&format!("touch {}", marker.display()))
            .unwrap();
        assert_eq!(code, 0);
        assert!(!marker.exists());
    }

    #[test]
    fn live_mode_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = Base::new(BaseOptions::new(dir.path().join("data"))).unwrap();
        base.set_dry_run(false);

        assert_eq!(base.exec_or_print("true").unwrap(), 0);
        assert_eq!(base.exec_or_print("exit 3").unwrap(), 3);
    }

    #[test]
    fn live_mode_captures_child_output() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("touched");
        let mut base = Base::new(BaseOptions::new(dir.path().join("data"))).unwrap();
        base.set_dry_run(false);

        let code = base
            .exec_or_print(&format!("echo noise; touch {}", marker.display()))
            .unwrap();
        assert_eq!(code, 0);
        assert!(marker.exists());
    }
}
