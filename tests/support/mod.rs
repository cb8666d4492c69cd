#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use app_catalog::{TimestampError, TimestampResolver, TimestampSource};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const COMMIT_DATE: &str = "2023-05-06T07:08:09 +0000";

pub fn build_catalog_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_build-catalog"))
}

pub fn build_releases_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_build-releases"))
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn instant(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// Complete, valid metadata for one app.
pub fn app_json(name: &str, category: &str) -> Value {
    json!({
        "name": name,
        "category": category,
        "description": format!("{name} description"),
        "version": "1.0.0",
        "commit": "0123abcd",
        "owner": "octo",
        "repo": "apps",
        "path": format!("apps/{name}")
    })
}

/// Write `value` to `<root>/apps/<dir>/metadata.json` and return the
/// repo-relative path of the file.
pub fn write_metadata(root: &Path, dir: &str, value: &Value) -> PathBuf {
    let relative = Path::new("apps").join(dir).join("metadata.json");
    let absolute = root.join(&relative);
    fs::create_dir_all(absolute.parent().unwrap()).unwrap();
    fs::write(&absolute, serde_json::to_string_pretty(value).unwrap()).unwrap();
    relative
}

pub fn write_categories(root: &Path, value: &Value) {
    let path = root.join("config/categories.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    let data = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("reading {}: {err}", path.display()));
    serde_json::from_str(&data).unwrap_or_else(|err| panic!("parsing {}: {err}", path.display()))
}

/// Timestamp source answering from a fixed table of repo-relative paths.
pub struct TableSource(pub HashMap<PathBuf, DateTime<Utc>>);

impl TimestampSource for TableSource {
    fn resolve(&self, path: &Path) -> Result<DateTime<Utc>, TimestampError> {
        self.0
            .get(path)
            .copied()
            .ok_or_else(|| TimestampError::unavailable(path))
    }
}

pub fn table_resolver(
    entries: &[(&Path, DateTime<Utc>)],
    fallback: DateTime<Utc>,
) -> TimestampResolver {
    let table = entries
        .iter()
        .map(|(path, ts)| (path.to_path_buf(), *ts))
        .collect();
    TimestampResolver::new(vec![Box::new(TableSource(table))], fallback)
}

pub fn git_available() -> bool {
    app_catalog::runtime::find_on_path("git").is_some()
}

pub fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=Catalog Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(repo)
        .env("GIT_AUTHOR_DATE", COMMIT_DATE)
        .env("GIT_COMMITTER_DATE", COMMIT_DATE)
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed");
}
