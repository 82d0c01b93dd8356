//! End-to-end tests for the `fm` binary

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

const PROBLEM: &str = r#"
name: depots
agents:
  - name: depot0
    actions:
      - name: lift
        parameters: [hoist, crate, place]
  - name: truck0
    actions:
      - name: drive
        parameters: [from, to]
objects: [hoist0, crate0, pallet0, distributor0]
kind: [FLAT_TYPING]
"#;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path();

        fs::write(root.join("problem.yml"), PROBLEM).unwrap();
        fs::write(root.join("FMAP.jar"), "").unwrap();

        let pddl = root.join("pddl");
        fs::create_dir(&pddl).unwrap();
        for agent in ["depot0", "truck0"] {
            fs::write(pddl.join(format!("{}_domain.pddl", agent)), "(define (domain depots))\n").unwrap();
            fs::write(pddl.join(format!("{}_problem.pddl", agent)), "(define (problem p1))\n").unwrap();
        }

        Self { temp }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write a fake java and a config pointing at it
    fn with_solver(self, script: &str) -> Self {
        let java = self.path().join("java");
        fs::write(&java, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755)).unwrap();

        let config = format!(
            "solver:\n  java: {}\n  jar: {}\n  timeout-ms: 30000\n",
            java.display(),
            self.path().join("FMAP.jar").display()
        );
        fs::write(self.config(), config).unwrap();
        self
    }

    fn config(&self) -> PathBuf {
        self.path().join("fmap.yml")
    }

    fn fm(&self) -> Command {
        let mut cmd = Command::cargo_bin("fm").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env_remove("FMAP_JAR");
        cmd
    }
}

#[test]
#[serial]
fn test_credits() {
    let ws = Workspace::new();
    ws.fm()
        .arg("credits")
        .assert()
        .success()
        .stdout(predicate::str::contains("FMAP"))
        .stdout(predicate::str::contains("GPL"));
}

#[test]
#[serial]
fn test_command_prints_fmap_invocation() {
    let ws = Workspace::new().with_solver("exit 0");
    ws.fm()
        .args(["-c", "fmap.yml", "command", "problem.yml", "-s", "astar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depot0_type"))
        .stdout(predicate::str::contains("truck0_type"))
        .stdout(predicate::str::contains("-s astar"));
}

#[test]
#[serial]
fn test_supports_accepts_classical_problem() {
    let ws = Workspace::new();
    ws.fm()
        .args(["supports", "problem.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is supported"));
}

#[test]
#[serial]
fn test_supports_rejects_temporal_problem() {
    let ws = Workspace::new();
    fs::write(
        ws.path().join("temporal.yml"),
        PROBLEM.replace("[FLAT_TYPING]", "[FLAT_TYPING, CONTINUOUS_TIME]"),
    )
    .unwrap();

    ws.fm()
        .args(["supports", "temporal.yml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("CONTINUOUS_TIME"));
}

#[test]
#[serial]
fn test_solve_json() {
    let ws = Workspace::new().with_solver(
        "printf '0: (lift hoist0 crate0 pallet0)\\n1: (drive distributor0 pallet0)\\n' > plan.txt\nexit 0",
    );

    ws.fm()
        .args(["-c", "fmap.yml", "solve", "problem.yml", "-p", "pddl", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SOLVED_SATISFICING"))
        .stdout(predicate::str::contains("\"engine_name\": \"FMAP\""))
        .stdout(predicate::str::contains("truck0"));
}

#[test]
#[serial]
fn test_solve_unsolvable_exits_nonzero() {
    let ws = Workspace::new().with_solver("echo 'no solution'\nexit 0");

    ws.fm()
        .args(["-c", "fmap.yml", "solve", "problem.yml", "-p", "pddl"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("UNSOLVABLE_PROVEN"));
}

#[test]
#[serial]
fn test_solve_without_jar_fails_fast() {
    let ws = Workspace::new().with_solver("exit 0");
    fs::remove_file(ws.path().join("FMAP.jar")).unwrap();

    ws.fm()
        .args(["-c", "fmap.yml", "solve", "problem.yml", "-p", "pddl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FMAP jar not found"));
}

#[test]
#[serial]
fn test_solve_rejects_unsupported_problem() {
    let ws = Workspace::new().with_solver("exit 0");
    fs::write(
        ws.path().join("htn.yml"),
        PROBLEM.replace("[FLAT_TYPING]", "[HIERARCHICAL]"),
    )
    .unwrap();

    ws.fm()
        .args(["-c", "fmap.yml", "solve", "htn.yml", "-p", "pddl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HIERARCHICAL"));
}

#[test]
#[serial]
fn test_command_flags_override_config_defaults() {
    let ws = Workspace::new().with_solver("exit 0");
    let mut config = fs::read_to_string(ws.config()).unwrap();
    config.push_str("  search-algorithm: astar\n  heuristic: \"2\"\n");
    fs::write(ws.config(), config).unwrap();

    ws.fm()
        .args(["-c", "fmap.yml", "command", "problem.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-s astar -h 2"));

    ws.fm()
        .args(["-c", "fmap.yml", "command", "problem.yml", "-s", "dfs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-s dfs -h 2"))
        .stdout(predicate::str::contains("astar").not());
}
