use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn tb_help_works() {
    Command::cargo_bin("tb")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Kanban task board"));
}

#[test]
fn subcommand_help_works() {
    let subcommands: [&[&str]; 9] = [
        &["init"],
        &["stats"],
        &["warnings"],
        &["task"],
        &["task", "add"],
        &["task", "deadline"],
        &["dev"],
        &["dev", "add"],
        &["dev", "rm"],
    ];

    for cmd in subcommands {
        Command::cargo_bin("tb")
            .expect("binary")
            .args(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn missing_subcommand_fails() {
    Command::cargo_bin("tb")
        .expect("binary")
        .assert()
        .failure();
}
