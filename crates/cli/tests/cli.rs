use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const BASE: &str = r#"
default_region = "eu-west-1"

[accounts]
dev = "111111111111"
"#;

struct TestEnv {
    tmp: TempDir,
    config: PathBuf,
}

impl TestEnv {
    fn new(repositories: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = tmp.path().join("synth.toml");
        fs::write(&config, format!("{BASE}\n{repositories}")).expect("write config");
        Self { tmp, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("synth");
        cmd.env_remove("RUST_LOG")
            .env_remove("SYNTH_CONFIG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let out = self
            .cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).expect("utf8 stdout")
    }

    fn failure(&self, args: &[&str]) -> (String, String) {
        let output = self.cmd().args(args).assert().failure().get_output().clone();
        (
            String::from_utf8(output.stdout).expect("utf8 stdout"),
            String::from_utf8(output.stderr).expect("utf8 stderr"),
        )
    }
}

const TWO_REPOS: &str = r#"
[[trusted_repositories]]
owner = "A"
name = "R1"
branches = ["main", "dev"]

[[trusted_repositories]]
owner = "B"
name = "R2"
branches = ["feat"]
"#;

#[test]
fn subjects_are_printed_in_declaration_order() {
    let env = TestEnv::new(TWO_REPOS);

    let out = env.stdout(&["subjects"]);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "repo:A/R1:ref:refs/heads/main",
            "repo:A/R1:ref:refs/heads/dev",
            "repo:B/R2:ref:refs/heads/feat",
        ]
    );
}

#[test]
fn subjects_json_is_an_array() {
    let env = TestEnv::new(TWO_REPOS);

    let v: Value = serde_json::from_str(&env.stdout(&["subjects", "--json"])).expect("json");

    assert_eq!(v.as_array().map(Vec::len), Some(3));
}

#[test]
fn repository_without_branches_fails_without_output() {
    let env = TestEnv::new(
        r#"
[[trusted_repositories]]
owner = "B"
name = "R2"
branches = ["main"]

[[trusted_repositories]]
owner = "A"
name = "R1"
branches = []
"#,
    );

    let (stdout, stderr) = env.failure(&["subjects"]);

    assert!(stdout.is_empty(), "unexpected output: {stdout}");
    assert!(stderr.contains("each repository needs at least one branch"));
    assert!(stderr.contains("A/R1"));
}

#[test]
fn missing_repositories_fail_every_command() {
    let env = TestEnv::new("");

    for args in [&["subjects"][..], &["policy"][..], &["manifest"][..]] {
        let (stdout, stderr) = env.failure(args);
        assert!(stdout.is_empty());
        assert!(
            stderr.contains("at least one repository is required"),
            "stderr for {args:?}: {stderr}"
        );
    }
}

#[test]
fn policy_document_conditions_on_subject_claim() {
    let env = TestEnv::new(TWO_REPOS);

    let v: Value = serde_json::from_str(&env.stdout(&["policy"])).expect("json");

    let statement = &v["Statement"][0];
    assert_eq!(statement["Action"], "sts:AssumeRoleWithWebIdentity");
    assert_eq!(
        statement["Principal"]["Federated"],
        "arn:aws:iam::111111111111:oidc-provider/token.actions.githubusercontent.com"
    );
    assert_eq!(
        statement["Condition"]["StringLike"]["token.actions.githubusercontent.com:sub"][2],
        "repo:B/R2:ref:refs/heads/feat"
    );
}

#[test]
fn deterministic_manifest_is_byte_identical() {
    let env = TestEnv::new(TWO_REPOS);

    let first = env.stdout(&["manifest", "--deterministic"]);
    let second = env.stdout(&["manifest", "--deterministic"]);

    assert_eq!(first, second);
    let v: Value = serde_json::from_str(&first).expect("json");
    assert!(v.get("metadata").is_none());
    let ids: Vec<&str> = v["artifacts"]
        .as_array()
        .expect("artifacts")
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["pipeline", "dev/my-api"]);
}

#[test]
fn manifest_out_writes_file_with_metadata() {
    let env = TestEnv::new(TWO_REPOS);
    let out = env.tmp.path().join("manifest.json");

    let stdout = env.stdout(&["manifest", "--out", out.to_str().expect("utf8 path")]);

    assert!(stdout.is_empty());
    let v: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read manifest"))
        .expect("json");
    assert!(v["metadata"]["run_id"].is_string());
    assert_eq!(
        v["artifacts"][0]["template"]["Resources"]["ArtifactBucket"]["Properties"]["BucketName"],
        "111111111111-artifact-bucket"
    );
}

#[test]
fn missing_config_is_reported() {
    let env = TestEnv::new(TWO_REPOS);
    fs::remove_file(&env.config).expect("remove config");

    let (_, stderr) = env.failure(&["subjects"]);

    assert!(stderr.contains("config not found"));
}

#[test]
fn verbose_run_logs_each_emitted_subject() {
    let env = TestEnv::new(TWO_REPOS);

    let output = env
        .cmd()
        .args(["--log-format", "json", "-v", "subjects"])
        .assert()
        .success()
        .get_output()
        .clone();

    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let emitted = stderr
        .lines()
        .filter(|l| l.contains("Emitted subject matcher"))
        .count();
    assert_eq!(emitted, 3);
}

#[test]
fn rejected_input_is_logged_and_reported_once() {
    let env = TestEnv::new("");

    let (_, stderr) = env.failure(&["subjects"]);

    assert!(stderr.contains("Rejected trust policy input"), "stderr: {stderr}");
    assert_eq!(stderr.matches("error: ").count(), 1, "stderr: {stderr}");
}
