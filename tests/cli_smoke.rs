mod support;

use predicates::str::contains;

#[test]
fn kanban_help_works() {
    support::kanban_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task board"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "add", "edit", "move", "rm", "show", "list", "stats", "export", "clear", "shell",
    ];

    for cmd in subcommands {
        support::kanban_cmd()
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    support::kanban_cmd().arg("archive").assert().code(2);
}
