use std::process::Command;

const TEMPLATE: &str = r#"<environment>
    <parameter name="env"><key>Environment</key><value></value></parameter>
    <parameter name="os"><key>Operating System</key><value></value></parameter>
    <parameter name="browser"><key>Browser</key><value></value></parameter>
</environment>
"#;

fn harness_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_frontend-harness"))
}

#[test]
fn set_env_patches_the_environment_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("environment.xml");
    std::fs::write(&file, TEMPLATE).unwrap();

    let status = harness_bin()
        .args(["set-env", "qa", "chrome"])
        .arg(&file)
        .status()
        .unwrap();
    assert!(status.success());

    let patched = std::fs::read_to_string(&file).unwrap();
    assert!(patched.contains("<key>Environment</key><value>qa</value>"));
    assert!(patched.contains("<key>Browser</key><value>chrome</value>"));
    assert!(patched.contains(&format!("<value>{} ", std::env::consts::OS)));
}

#[test]
fn set_env_fails_for_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = harness_bin()
        .args(["set-env", "qa", "chrome"])
        .arg(dir.path().join("missing.xml"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.xml"));
}

#[test]
fn set_env_requires_all_arguments() {
    let output = harness_bin().args(["set-env", "qa"]).output().unwrap();
    assert!(!output.status.success());
}
