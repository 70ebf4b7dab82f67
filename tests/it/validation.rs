use dflags::{BoolFlag, Cmd, Error, HelpRequest, IntFlag, RegisterOptions, StrFlag};
use expect_test::expect;
use regex::Regex;

use crate::{args, check_err};

#[test]
fn requires_unmet() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("user").optional(true).register(&mut cmd).unwrap();
    StrFlag::new("pass").optional(true).requires(["user"]).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--pass x")),
        expect!["Invalid args: 'pass' requires 'user', but 'user' was not set"],
    );
    cmd.parse(args("--user u --pass x")).unwrap();
}

#[test]
fn excludes_violated_in_both_directions() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("json").optional(true).excludes(["yaml"]).register(&mut cmd).unwrap();
    StrFlag::new("yaml").optional(true).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--json a --yaml b")),
        expect!["Invalid args: 'json' excludes 'yaml', but 'yaml' was set"],
    );

    // The excluding flag need not be the one registered first.
    let mut cmd = Cmd::new("t");
    StrFlag::new("yaml").optional(true).register(&mut cmd).unwrap();
    StrFlag::new("json").optional(true).excludes(["yaml"]).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--yaml b --json a")),
        expect!["Invalid args: 'json' excludes 'yaml', but 'yaml' was set"],
    );
}

#[test]
fn false_bool_is_not_relationally_set() {
    let mut cmd = Cmd::new("t");
    BoolFlag::new("force").excludes(["target"]).register(&mut cmd).unwrap();
    StrFlag::new("target").optional(true).register(&mut cmd).unwrap();
    cmd.parse(args("--force=false --target x")).unwrap();
    check_err(
        cmd.parse(args("--force --target x")),
        expect!["Invalid args: 'force' excludes 'target', but 'target' was set"],
    );
}

#[test]
fn false_bool_never_triggers_its_requires() {
    let mut cmd = Cmd::new("t");
    BoolFlag::new("push").requires(["remote"]).register(&mut cmd).unwrap();
    StrFlag::new("remote").optional(true).register(&mut cmd).unwrap();
    // push stays false; remote alone is fine.
    cmd.parse(args("--remote origin")).unwrap();
    check_err(
        cmd.parse(args("--push")),
        expect!["Invalid args: 'push' requires 'remote', but 'remote' was not set"],
    );
}

#[test]
fn defaulted_flag_satisfies_requires() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("user").default("admin").register(&mut cmd).unwrap();
    StrFlag::new("pass").optional(true).requires(["user"]).register(&mut cmd).unwrap();
    cmd.parse(args("--pass x")).unwrap();
}

#[test]
fn missing_required_in_registration_order() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("src").register(&mut cmd).unwrap();
    StrFlag::new("dest").register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("")),
        expect!["Missing required arguments: [src, dest]"],
    );
}

#[test]
fn excluded_required_flag_is_exempt() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("target").register(&mut cmd).unwrap();
    BoolFlag::new("all").excludes(["target"]).register(&mut cmd).unwrap();
    cmd.parse(args("--all")).unwrap();
}

#[test]
fn bypass_validation_skips_checks() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("target").register(&mut cmd).unwrap();
    BoolFlag::new("version")
        .register_with(&mut cmd, RegisterOptions::new().bypass_validation(true))
        .unwrap();

    check_err(cmd.parse(args("")), expect!["Missing required arguments: [target]"]);
    cmd.parse(args("--version")).unwrap();
}

#[test]
fn auto_help_on_no_args() {
    let mut cmd = Cmd::new("t").auto_help_on_no_args(true);
    StrFlag::new("target").register(&mut cmd).unwrap();
    let err = cmd.parse(args("")).unwrap_err();
    assert!(matches!(
        err,
        Error::HelpRequested(HelpRequest { long: false, auto: true })
    ));
}

#[test]
fn help_beats_validation() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("target").register(&mut cmd).unwrap();
    let err = cmd.parse(args("--help")).unwrap_err();
    assert!(matches!(
        err,
        Error::HelpRequested(HelpRequest { long: true, auto: false })
    ));
    let err = cmd.parse(args("-h")).unwrap_err();
    assert!(matches!(
        err,
        Error::HelpRequested(HelpRequest { long: false, auto: false })
    ));
}

#[test]
fn enum_constraint() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("color").enum_values(["red", "green"]).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--color blue")),
        expect!["Invalid 'color' value: blue (valid values: red, green)"],
    );
    cmd.parse(args("--color green")).unwrap();
}

#[test]
fn regex_constraint() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("word")
        .regex(Regex::new("^[a-z]+$").unwrap())
        .register(&mut cmd)
        .unwrap();
    check_err(
        cmd.parse(args("--word ABC")),
        expect!["Invalid 'word' value: ABC (must match regex: ^[a-z]+$)"],
    );
}

#[test]
fn numeric_bounds() {
    let mut cmd = Cmd::new("t");
    IntFlag::new("n").min(0, true).max(10, true).flag_only(true).register(&mut cmd).unwrap();
    check_err(cmd.parse(args("--n 11")), expect!["'n' value 11 is > maximum 10"]);
    check_err(cmd.parse(args("--n -1")), expect!["'n' value -1 is < minimum 0"]);
    cmd.parse(args("--n 10")).unwrap();
}

#[test]
fn exclusive_bound_messages() {
    let mut cmd = Cmd::new("t");
    IntFlag::new("n").min(0, false).flag_only(true).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--n 0")),
        expect!["'n' value 0 is <= minimum (exclusive) 0"],
    );
}
