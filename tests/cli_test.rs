use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_reset_prints_default_balance() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("chargegate"));
    cmd.arg("reset");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#"{"balance":100}"#));

    Ok(())
}

#[test]
fn test_cli_charge_on_empty_store_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("chargegate"));
    cmd.arg("charge").arg("--account").arg("someone/balance");

    cmd.assert().success().stdout(predicate::str::contains(
        r#"{"remainingBalance":0,"isAuthorized":false,"charges":0}"#,
    ));

    Ok(())
}

#[test]
fn test_cli_requires_subcommand() {
    let mut cmd = Command::new(cargo_bin!("chargegate"));

    cmd.assert().failure();
}
