#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const FULL_ENV: &str = "\
ACCOUNT_ID=123456789012
MONGODB_URI_PROD=mongodb://prod
MONGODB_URI_DEV=mongodb://dev
GOOGLE_CLIENT=client
GOOGLE_SECRET=secret
SESSION_SECRET=session
HOSTED_ZONE_ID=Z0123
CERTIFICATE_ARN=arn:aws:acm:us-east-1:123456789012:certificate/abc
";

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("almanac-infra").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("almanac-infra").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("almanac-infra"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("almanac-infra").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_list_default_stage() {
    let project = TestProject::new();
    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev-us-east-1-Backend"))
        .stdout(predicate::str::contains("dev-us-east-1-Website"))
        .stdout(predicate::str::contains("aws://unknown-account/us-east-1"));
}

#[test]
fn test_list_reads_env_file() {
    let project = TestProject::new();
    project.write_env(FULL_ENV);
    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("aws://123456789012/us-east-1"));
}

#[test]
fn test_list_pull_request_preview() {
    let project = TestProject::new();
    project
        .command()
        .args(["list", "--pr", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pr-42-us-east-1-Backend"))
        .stdout(predicate::str::contains("Website").not());
}

#[test]
fn test_pull_request_from_environment() {
    let project = TestProject::new();
    project
        .command()
        .env("PULL_REQUEST_ID", "7")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("pr-7-us-east-1-Backend"));
}

#[test]
fn test_validate_reports_unresolved_but_succeeds() {
    let project = TestProject::new();
    project
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("unresolved: ACCOUNT_ID"))
        .stdout(predicate::str::contains("HOSTED_ZONE_ID"));
}

#[test]
fn test_validate_complete_configuration() {
    let project = TestProject::new();
    project.write_env(FULL_ENV);
    project
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("All stacks are complete"))
        .stdout(predicate::str::contains("[full-access]"))
        .stdout(predicate::str::contains(
            "route: antalmanac-backend-a-record-dev -> antalmanac-api-gateway-dev",
        ));
}

#[test]
fn test_invalid_website_domain_policy_fails() {
    let project = TestProject::new();
    project
        .command()
        .env("ALMANAC_WEBSITE_DOMAIN", "nowhere")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALMANAC_WEBSITE_DOMAIN"));
}

#[test]
fn test_synth_writes_assembly() {
    let project = TestProject::new();
    project.write_env(FULL_ENV);
    let out = project.path().join("out");

    project
        .command()
        .arg("synth")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 stack(s)"));

    assert!(out.join("manifest.json").exists());
    assert!(out.join("dev-us-east-1-Backend.template.json").exists());
    assert!(out.join("dev-us-east-1-Website.template.json").exists());

    let template: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.join("dev-us-east-1-Backend.template.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        template["Resources"]["antalmanac-api-gateway-dev"]["Properties"]["DomainName"]["DomainName"],
        "dev.api.antalmanac.com"
    );
}

#[test]
fn test_synth_default_out_dir_under_root() {
    let project = TestProject::new();
    project.command().arg("synth").assert().success();
    assert!(project.path().join("cdk.out").join("manifest.json").exists());
}

#[test]
fn test_synth_stdout_yaml() {
    let project = TestProject::new();
    project
        .command()
        .args(["synth", "--stdout", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AWSTemplateFormatVersion"))
        .stdout(predicate::str::contains("---"));
    assert!(!project.path().join("cdk.out").exists());
}

#[test]
fn test_synth_rejects_unknown_format() {
    let project = TestProject::new();
    project
        .command()
        .args(["synth", "--format", "toml"])
        .assert()
        .failure();
}
