// tests/cli_once.rs

use std::error::Error;
use std::path::PathBuf;

use pipewatch::cli::CliArgs;
use pipewatch::run;

type TestResult = Result<(), Box<dyn Error>>;

const CONFIG: &str = r#"
[config]
throttle_window = "30ms"

[watch]
ignore = ["dist", "Pipewatch.toml"]

[[rule]]
name = "styles"
globs = ["*.css"]
additional_files = ["vars.less"]
pipeline = [
  { kind = "concat", output = "bundle.css", separator = "\n" },
  { kind = "write", dest = "dist" },
]
"#;

fn project() -> Result<tempfile::TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("Pipewatch.toml"), CONFIG)?;
    std::fs::write(dir.path().join("a.css"), "a {}")?;
    std::fs::write(dir.path().join("b.css"), "b {}")?;
    std::fs::write(dir.path().join("vars.less"), "@x: 1;")?;
    Ok(dir)
}

fn args(dir: &tempfile::TempDir, once: &[&str], dry_run: bool) -> CliArgs {
    CliArgs {
        config: dir.path().join("Pipewatch.toml").to_string_lossy().into_owned(),
        root: None,
        once: once.iter().map(PathBuf::from).collect(),
        log_level: None,
        dry_run,
    }
}

#[tokio::test]
async fn test_once_with_a_direct_match_builds_that_file() -> TestResult {
    let dir = project()?;
    run(args(&dir, &["a.css"], false)).await?;

    let bundle = std::fs::read_to_string(dir.path().join("dist/bundle.css"))?;
    assert_eq!(bundle, "a {}");
    Ok(())
}

#[tokio::test]
async fn test_once_with_an_additional_file_builds_everything() -> TestResult {
    let dir = project()?;
    run(args(&dir, &["vars.less"], false)).await?;

    let bundle = std::fs::read_to_string(dir.path().join("dist/bundle.css"))?;
    assert_eq!(bundle, "a {}\nb {}");
    Ok(())
}

#[tokio::test]
async fn test_dry_run_touches_nothing() -> TestResult {
    let dir = project()?;
    run(args(&dir, &[], true)).await?;
    assert!(!dir.path().join("dist").exists());
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("Pipewatch.toml"), "[[rule]]\nname = \"x\"\nglobs = [\"[\"]\n")?;
    let err = run(args(&dir, &["a.css"], false)).await.unwrap_err();
    assert!(err.to_string().contains("Invalid glob"));
    Ok(())
}
