use dflags::{BoolFlag, Cmd, Directive, Io, ParseOptions, StrFlag, StrListFlag};

use crate::args;

#[test]
fn directive_bits_combine() {
    assert_eq!(Directive::DEFAULT.bits(), 0);
    assert_eq!((Directive::NO_SPACE | Directive::NO_FILE_COMP).bits(), 6);
}

#[test]
fn subcommand_candidates() {
    let mut cmd = Cmd::new("tool");
    cmd.register_cmd(Cmd::new("start")).unwrap();
    cmd.register_cmd(Cmd::new("status")).unwrap();
    cmd.register_cmd(Cmd::new("stop")).unwrap();

    let (candidates, directive) = cmd.complete(args("sta"));
    assert_eq!(candidates, ["start", "status"]);
    assert_eq!(directive, Directive::NO_FILE_COMP);
}

#[test]
fn long_flag_name_candidates() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("alpha").register(&mut cmd).unwrap();
    StrFlag::new("beta").register(&mut cmd).unwrap();

    let (candidates, directive) = cmd.complete(args("--a"));
    assert_eq!(candidates, ["--alpha"]);
    assert_eq!(directive, Directive::NO_FILE_COMP);
}

#[test]
fn used_scalar_flag_not_reoffered() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("alpha").register(&mut cmd).unwrap();
    let (candidates, _) = cmd.complete(vec!["--alpha", "x", "--a"]);
    assert_eq!(candidates, Vec::<String>::new());
}

#[test]
fn used_list_flag_stays_offerable() {
    let mut cmd = Cmd::new("tool");
    StrListFlag::new("tag").register(&mut cmd).unwrap();
    let (candidates, _) = cmd.complete(vec!["--tag", "x", "--t"]);
    assert_eq!(candidates, ["--tag"]);
}

#[test]
fn enum_value_completion() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("color").enum_values(["red", "green"]).register(&mut cmd).unwrap();

    let (candidates, directive) = cmd.complete(vec!["--color", "g"]);
    assert_eq!(candidates, ["green"]);
    assert_eq!(directive, Directive::NO_FILE_COMP);
}

#[test]
fn inline_value_completion_keeps_prefix() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("color").enum_values(["red", "green"]).register(&mut cmd).unwrap();

    let (candidates, _) = cmd.complete(vec!["--color=g"]);
    assert_eq!(candidates, ["--color=green"]);
}

#[test]
fn custom_completer() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("host")
        .completer(|prefix| (vec![format!("{prefix}1")], Directive::NO_SPACE))
        .register(&mut cmd)
        .unwrap();

    let (candidates, directive) = cmd.complete(vec!["--host", "db"]);
    assert_eq!(candidates, ["db1"]);
    assert_eq!(directive, Directive::NO_SPACE);
}

#[test]
fn completion_descends_into_subcommands() {
    let mut root = Cmd::new("tool");
    let mut run = Cmd::new("run");
    StrFlag::new("target").enum_values(["web", "worker"]).register(&mut run).unwrap();
    root.register_cmd(run).unwrap();

    let (candidates, _) = root.complete(vec!["run", "w"]);
    assert_eq!(candidates, ["web", "worker"]);
}

#[test]
fn flags_skipped_while_walking() {
    let mut root = Cmd::new("tool");
    BoolFlag::new("verbose").short('v').register(&mut root).unwrap();
    root.register_cmd(Cmd::new("run")).unwrap();

    // The bool flag does not hide the subcommand position.
    let (candidates, _) = root.complete(vec!["-v", "ru"]);
    assert_eq!(candidates, ["run"]);
}

#[test]
fn positional_without_source_falls_back_to_files() {
    let mut cmd = Cmd::new("tool");
    StrFlag::new("path").register(&mut cmd).unwrap();
    let (candidates, directive) = cmd.complete(args(""));
    assert_eq!(candidates, Vec::<String>::new());
    assert_eq!(directive, Directive::DEFAULT);
}

#[test]
fn wire_protocol() {
    let mut cmd = Cmd::new("tool");
    cmd.register_cmd(Cmd::new("start")).unwrap();
    cmd.register_cmd(Cmd::new("status")).unwrap();
    cmd.register_cmd(Cmd::new("stop")).unwrap();

    let mut stdout: Vec<u8> = Vec::new();
    let mut stderr: Vec<u8> = Vec::new();
    let mut code = None;
    let mut exit = |c| code = Some(c);
    let mut io = Io { stdout: &mut stdout, stderr: &mut stderr, exit: &mut exit };
    cmd.parse_or_exit_with(vec!["__complete", "sta"], ParseOptions::new(), &mut io);

    assert_eq!(String::from_utf8(stdout).unwrap(), "start\nstatus\n:4\n");
    assert_eq!(code, Some(0));
}

#[test]
fn reserved_token_is_first_of_invocation_only() {
    let mut root = Cmd::new("tool");
    let mut run = Cmd::new("run");
    let target = StrFlag::new("target").register(&mut run).unwrap();
    root.register_cmd(run).unwrap();

    root.parse(vec!["run", "__complete"]).unwrap();
    assert_eq!(target.get(), "__complete");
}

#[test]
fn completion_can_be_disabled() {
    let mut cmd = Cmd::new("tool").completion_enabled(false);
    let first = StrFlag::new("first").register(&mut cmd).unwrap();
    let second = StrFlag::new("second").optional(true).register(&mut cmd).unwrap();
    cmd.parse(vec!["__complete", "sta"]).unwrap();
    assert_eq!(first.get(), "__complete");
    assert_eq!(second.get(), "sta");
}
