use dflags::{BoolFlag, Cmd, IntFlag, RegisterOptions, StrFlag, StrListFlag};

fn config_err<T>(res: dflags::Result<T>) -> String {
    match res {
        Ok(_) => panic!("expected a config error"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn duplicate_name() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("out").register(&mut cmd).unwrap();
    let err = config_err(StrFlag::new("out").register(&mut cmd));
    assert_eq!(err, "flag \"out\" already defined");
}

#[test]
fn duplicate_short() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("out").short('o').register(&mut cmd).unwrap();
    let err = config_err(StrFlag::new("other").short('o').register(&mut cmd));
    assert_eq!(err, "short flag \"o\" already defined");
}

#[test]
fn empty_name() {
    let mut cmd = Cmd::new("t");
    let err = config_err(StrFlag::new("").register(&mut cmd));
    assert_eq!(err, "flag name cannot be empty");
}

#[test]
fn positional_only_and_flag_only_conflict() {
    let mut cmd = Cmd::new("t");
    let err = config_err(
        StrFlag::new("x").positional_only(true).flag_only(true).register(&mut cmd),
    );
    assert_eq!(
        err,
        "flag \"x\" cannot be both positional-only and flag-only (mutually exclusive)"
    );
}

#[test]
fn default_outside_bounds() {
    let mut cmd = Cmd::new("t");
    let err = config_err(IntFlag::new("n").default(20).max(10, true).register(&mut cmd));
    assert_eq!(err, "invalid default value for flag \"n\": value 20 is > maximum 10");
}

#[test]
fn default_outside_enum() {
    let mut cmd = Cmd::new("t");
    let err = config_err(
        StrFlag::new("color")
            .enum_values(["red", "green"])
            .default("blue")
            .register(&mut cmd),
    );
    assert_eq!(
        err,
        "invalid default value for flag \"color\": value \"blue\" not in allowed enum values [red, green]"
    );
}

#[test]
fn positional_only_after_variadic() {
    let mut cmd = Cmd::new("t");
    StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    let err = config_err(StrFlag::new("dest").positional_only(true).register(&mut cmd));
    assert_eq!(
        err,
        "cannot register positional-only flag \"dest\" after variadic positional flag \
         \"files\" (positional-only flags cannot be set after variadic flags)"
    );
}

#[test]
fn duplicate_subcommand() {
    let mut cmd = Cmd::new("t");
    cmd.register_cmd(Cmd::new("run")).unwrap();
    let err = config_err(cmd.register_cmd(Cmd::new("run")));
    assert_eq!(err, "command \"run\" already defined");
}

#[test]
fn dangling_constraint_reference() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("a").requires(["ghost"]).optional(true).register(&mut cmd).unwrap();
    let err = cmd.parse(crate::args("")).unwrap_err();
    assert_eq!(err.to_string(), "Undefined flag 'ghost'");
}

#[test]
fn global_flags_are_forced_optional() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("level")
        .register_with(&mut cmd, RegisterOptions::new().global(true))
        .unwrap();
    // Would be required as a local flag; globals never are.
    cmd.parse(crate::args("")).unwrap();
}

#[test]
fn global_flags_never_bind_positionally() {
    let mut cmd = Cmd::new("t");
    let level = StrFlag::new("level")
        .register_with(&mut cmd, RegisterOptions::new().global(true))
        .unwrap();
    let name = StrFlag::new("name").register(&mut cmd).unwrap();
    cmd.parse(crate::args("hello")).unwrap();
    assert_eq!(name.get(), "hello");
    assert_eq!(level.get(), "");
}

#[test]
fn bool_flags_cannot_be_required() {
    let mut cmd = Cmd::new("t");
    BoolFlag::new("force").register(&mut cmd).unwrap();
    cmd.parse(crate::args("")).unwrap();
}
