use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const COMMITTER: &str = "fake_user";
pub const COMMITTER_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with one commit on `main` holding `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_light_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three\n".to_string(),
    ));

    run_light_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    light_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_light_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("git-light").expect("Failed to find git-light binary");
    cmd.envs(vec![("NO_PAGER", "1"), ("NO_COLOR", "1")]);
    cmd.env_remove("GIT_LIGHT_COMMITTER");
    cmd.env_remove("GIT_LIGHT_COMMITTER_DATE");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn light_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_light_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("GIT_LIGHT_COMMITTER", COMMITTER),
        ("GIT_LIGHT_COMMITTER_DATE", COMMITTER_DATE), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

/// Commit and return the new commit hash parsed from the output
pub fn light_commit_oid(dir: &Path, message: &str) -> String {
    let output = light_commit(dir, message).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone())
        .expect("Commit output is not UTF-8");

    // [main (root-commit) <oid>] message
    stdout
        .split(']')
        .next()
        .and_then(|header| header.split_whitespace().last())
        .expect("Commit output has no hash")
        .to_string()
}

/// Stage everything and commit it
pub fn add_and_commit(dir: &Path, message: &str) -> String {
    run_light_command(dir, &["add", "*"]).assert().success();
    light_commit_oid(dir, message)
}
