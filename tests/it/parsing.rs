use dflags::{
    BoolFlag, Cmd, Error, IntFlag, IntListFlag, ParseOptions, RegisterOptions, StrFlag,
    StrListFlag,
};
use expect_test::expect;

use crate::{args, check_err};

#[test]
fn dual_nature_binding() {
    let mut cmd = Cmd::new("greet");
    let name = StrFlag::new("name").register(&mut cmd).unwrap();
    cmd.parse(args("world")).unwrap();
    assert_eq!(name.get(), "world");

    let mut cmd = Cmd::new("greet");
    let name = StrFlag::new("name").register(&mut cmd).unwrap();
    cmd.parse(args("--name world")).unwrap();
    assert_eq!(name.get(), "world");
}

#[test]
fn inline_values() {
    let mut cmd = Cmd::new("t");
    let name = StrFlag::new("name").register(&mut cmd).unwrap();
    let loud = BoolFlag::new("loud").register(&mut cmd).unwrap();
    cmd.parse(args("--name=world --loud=false")).unwrap();
    assert_eq!(name.get(), "world");
    assert!(!loud.get());
}

#[test]
fn bool_inline_rejects_garbage() {
    let mut cmd = Cmd::new("t");
    BoolFlag::new("loud").register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("--loud=nah")),
        expect!["invalid value for flag --loud: nah"],
    );
}

#[test]
fn short_cluster() {
    let mut cmd = Cmd::new("t");
    let all = BoolFlag::new("all").short('a').register(&mut cmd).unwrap();
    let out = StrFlag::new("out").short('b').flag_only(true).register(&mut cmd).unwrap();
    cmd.parse(args("-ab target")).unwrap();
    assert!(all.get());
    assert_eq!(out.get(), "target");
}

#[test]
fn non_bool_must_be_last_in_cluster() {
    let mut cmd = Cmd::new("t");
    BoolFlag::new("all").short('a').register(&mut cmd).unwrap();
    StrFlag::new("out").short('b').flag_only(true).register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("-ba")),
        expect!["non-bool flag -b must be last in cluster"],
    );
}

#[test]
fn repetition_counting() {
    let mut cmd = Cmd::new("t");
    let verbose = IntFlag::new("verbose").short('v').default(0).register(&mut cmd).unwrap();
    cmd.parse(args("-vvv")).unwrap();
    assert_eq!(verbose.get(), 3);

    // An inline value beats the count.
    cmd.parse(args("-vv=7")).unwrap();
    assert_eq!(verbose.get(), 7);
}

#[test]
fn negative_numbers_are_positional_values() {
    let mut cmd = Cmd::new("t");
    let delta = IntFlag::new("delta").register(&mut cmd).unwrap();
    cmd.parse(args("-5")).unwrap();
    assert_eq!(delta.get(), -5);
}

#[test]
fn leading_digit_binds_positionally_even_when_malformed() {
    let mut cmd = Cmd::new("t");
    let nums = IntListFlag::new("nums").separator(",").register(&mut cmd).unwrap();
    cmd.parse(args("-2,3")).unwrap();
    assert_eq!(nums.get(), vec![-2, 3]);

    let mut cmd = Cmd::new("t");
    let raw = StrFlag::new("raw").register(&mut cmd).unwrap();
    cmd.parse(args("-2x")).unwrap();
    assert_eq!(raw.get(), "-2x");
}

#[test]
fn digit_short_disables_reclassification() {
    let mut cmd = Cmd::new("t");
    let two = IntFlag::new("two").short('2').flag_only(true).register(&mut cmd).unwrap();
    cmd.parse(args("-2 9")).unwrap();
    assert_eq!(two.get(), 9);
}

#[test]
fn separator_splits_values() {
    let mut cmd = Cmd::new("t");
    let tags = StrListFlag::new("tags").separator(",").register(&mut cmd).unwrap();
    cmd.parse(args("--tags a,b,c")).unwrap();
    assert_eq!(tags.get(), vec!["a", "b", "c"]);
}

#[test]
fn variadic_consumes_a_run() {
    let mut cmd = Cmd::new("t");
    let files = StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    let verbose = BoolFlag::new("verbose").short('v').register(&mut cmd).unwrap();
    cmd.parse(args("a b -v")).unwrap();
    assert_eq!(files.get(), vec!["a", "b"]);
    assert!(verbose.get());
}

#[test]
fn flag_token_closes_variadic() {
    let mut cmd = Cmd::new("t");
    StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    BoolFlag::new("verbose").short('v').register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("a -v b")),
        expect!["Too many positional arguments. Unused: [b]"],
    );
}

#[test]
fn dash_dash_keeps_variadic_open() {
    let mut cmd = Cmd::new("t");
    let files = StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    cmd.parse(args("a -- -x b")).unwrap();
    assert_eq!(files.get(), vec!["a", "-x", "b"]);
}

#[test]
fn named_list_reopens_after_flag() {
    let mut cmd = Cmd::new("t");
    let files = StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    let verbose = BoolFlag::new("verbose").short('v').register(&mut cmd).unwrap();
    cmd.parse(args("a -v --files b c")).unwrap();
    assert_eq!(files.get(), vec!["a", "b", "c"]);
    assert!(verbose.get());
}

#[test]
fn list_default_replaced_wholesale() {
    let mut cmd = Cmd::new("t");
    let nums = IntListFlag::new("nums").default([1, 2]).register(&mut cmd).unwrap();
    cmd.parse(args("")).unwrap();
    assert_eq!(nums.get(), vec![1, 2]);
    // Defaults do not count as explicitly configured.
    assert!(!cmd.configured("nums"));

    cmd.parse(args("--nums 5")).unwrap();
    assert_eq!(nums.get(), vec![5]);
}

#[test]
fn permissive_mode_collects_unknown() {
    let mut cmd = Cmd::new("t");
    let name = StrFlag::new("name").register(&mut cmd).unwrap();
    cmd.parse_with(args("--bogus hello extra"), ParseOptions::new().ignore_unknown(true))
        .unwrap();
    assert_eq!(name.get(), "hello");
    assert_eq!(cmd.unknown_args(), ["--bogus", "extra"]);
}

#[test]
fn permissive_mode_still_rejects_bad_values() {
    let mut cmd = Cmd::new("t");
    IntFlag::new("n").flag_only(true).register(&mut cmd).unwrap();
    check_err(
        cmd.parse_with(args("--n lol"), ParseOptions::new().ignore_unknown(true)),
        expect!["invalid integer value for n: lol"],
    );
}

#[test]
fn missing_value() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("name").register(&mut cmd).unwrap();
    check_err(cmd.parse(args("--name")), expect!["flag --name requires a value"]);
}

#[test]
fn unknown_flag_messages() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("name").optional(true).register(&mut cmd).unwrap();
    check_err(cmd.parse(args("--nope")), expect!["unknown flag: --nope"]);
    check_err(cmd.parse(args("-z")), expect!["unknown shorthand flag: 'z' in -z"]);
}

#[test]
fn too_many_positional() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("name").register(&mut cmd).unwrap();
    check_err(
        cmd.parse(args("x y")),
        expect!["Too many positional arguments. Unused: [y]"],
    );
}

#[test]
fn variadic_absorbs_unknown_flags_when_asked() {
    let mut cmd = Cmd::new("t");
    let files = StrListFlag::new("files").variadic(true).register(&mut cmd).unwrap();
    let verbose = BoolFlag::new("verbose").short('v').register(&mut cmd).unwrap();
    cmd.parse_with(
        args("--files a -x -v"),
        ParseOptions::new().variadic_unknown_flags(true),
    )
    .unwrap();
    assert_eq!(files.get(), vec!["a", "-x"]);
    assert!(verbose.get());
}

#[test]
fn subcommand_descent_and_global_write() {
    let mut root = Cmd::new("tool");
    let level = IntFlag::new("level")
        .register_with(&mut root, RegisterOptions::new().global(true))
        .unwrap();
    let mut run = Cmd::new("run");
    let target = StrFlag::new("target").register(&mut run).unwrap();
    let used = root.register_cmd(run).unwrap();

    root.parse(args("run web --level 3")).unwrap();
    assert!(used.get());
    assert_eq!(target.get(), "web");
    assert_eq!(level.get(), 3);
    assert!(root.configured("level"));
}

#[test]
fn global_configured_before_descent_is_carried() {
    let mut root = Cmd::new("tool");
    let level = IntFlag::new("level")
        .register_with(&mut root, RegisterOptions::new().global(true))
        .unwrap();
    root.register_cmd(Cmd::new("run")).unwrap();

    root.parse(args("--level 2 run")).unwrap();
    assert_eq!(level.get(), 2);
    assert!(root.configured("level"));
}

#[test]
fn name_shadow_keeps_short_route_to_global() {
    let mut root = Cmd::new("tool");
    let global = StrFlag::new("output")
        .short('o')
        .register_with(&mut root, RegisterOptions::new().global(true))
        .unwrap();
    let local = StrFlag::new("output").optional(true).register(&mut root).unwrap();

    root.parse(args("-o shared --output mine")).unwrap();
    assert_eq!(global.get(), "shared");
    assert_eq!(local.get(), "mine");
}

#[test]
fn full_shadow_removes_global_from_parent_scope() {
    let mut root = Cmd::new("tool");
    let global = StrFlag::new("output")
        .short('o')
        .register_with(&mut root, RegisterOptions::new().global(true))
        .unwrap();
    let local = StrFlag::new("output").short('o').optional(true).register(&mut root).unwrap();
    root.register_cmd(Cmd::new("run")).unwrap();

    // Both spellings now reach the local flag at the parent.
    root.parse(args("-o here")).unwrap();
    assert_eq!(local.get(), "here");
    assert_eq!(global.get(), "");

    // The subcommand still sees the original global.
    root.parse(args("run --output there")).unwrap();
    assert_eq!(global.get(), "there");
}

#[test]
fn short_shadow_keeps_name_route_to_global() {
    let mut root = Cmd::new("tool");
    let global = BoolFlag::new("verbose")
        .short('v')
        .register_with(&mut root, RegisterOptions::new().global(true))
        .unwrap();
    let local = BoolFlag::new("vivid").short('v').register(&mut root).unwrap();

    root.parse(args("-v --verbose")).unwrap();
    assert!(local.get());
    assert!(global.get());
}

#[test]
fn error_kinds_expose_exit_codes() {
    let mut cmd = Cmd::new("t");
    StrFlag::new("name").register(&mut cmd).unwrap();
    let err = cmd.parse(args("--help")).unwrap_err();
    assert!(matches!(err, Error::HelpRequested(_)));
    assert!(err.is_sentinel());
    assert_eq!(err.exit_code(), 0);

    let err = cmd.parse(args("--nope")).unwrap_err();
    assert!(!err.is_sentinel());
    assert_eq!(err.exit_code(), 1);
}
