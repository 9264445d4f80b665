use std::fs;
use std::path::Path;

use logicbase::logic::{Base, BaseOptions, builtin};
use logicbase::model::{DataValue, LoadError};
use serde_json::json;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn logic_root_with_mixed_data_dir() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    fs::create_dir(&data).unwrap();
    write(&data, "README.md", "how to edit these files");
    write(&data, "users.json", r#"[{"name": "didip", "groups": ["wheel", "docker"]}]"#);
    write(&data, "motd.txt", "welcome\n");

    let mut options = BaseOptions::new(&data);
    options.hostname = Some("web-01".into());
    let base = Base::new(options).unwrap();

    let abs = fs::canonicalize(&data).unwrap();
    assert_eq!(base.data().len(), 2);
    assert_eq!(
        base.data().get(abs.join("motd.txt")),
        Some(&DataValue::Text("welcome\n".into()))
    );
    assert!(base.data().get(abs.join("README.md")).is_none());

    let mut registry = builtin::registry().unwrap();
    let report = registry.execute("users", &base).unwrap();
    assert_eq!(
        report,
        json!({
            "success": [{
                "name": "didip",
                "groups": ["wheel", "docker"],
                "shell": "/bin/bash",
                "commands": ["useradd -g wheel didip", "usermod -a -G docker didip"]
            }],
            "failure": []
        })
    );

    let dump = registry.execute("dump", &base).unwrap();
    assert_eq!(dump["hostname"], "web-01");
    assert_eq!(dump["data"].as_object().unwrap().len(), 2);
}

#[test]
fn broken_json_discards_everything() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "a.json", "{}");
    write(root.path(), "b.json", "not valid json");
    write(root.path(), "c.txt", "never reached");

    match Base::new(BaseOptions::new(root.path())) {
        Err(LoadError::Json { path, .. }) => assert!(path.ends_with("b.json")),
        other => panic!("expected JSON error, got {other:?}"),
    }
}
