//! Single-quote escaping round-trips through a real bash.

use std::process::Command;

use rj_remote::{bash_c, escape_single_quotes};

/// Wrap `escape(s)` in single quotes, hand it to bash, read it back.
fn round_trip(s: &str) -> String {
    let cmd = format!("printf '%s' '{}'", escape_single_quotes(s));
    let output = Command::new("bash").arg("-c").arg(&cmd).output().unwrap();
    assert!(output.status.success(), "bash rejected: {cmd}");
    String::from_utf8(output.stdout).unwrap()
}

#[yare::parameterized(
    plain          = { "hello world" },
    apostrophe     = { "it's" },
    many_quotes    = { "'''" },
    double_quotes  = { r#"say "hi" there"# },
    dollar         = { "$HOME ${PATH} $(whoami)" },
    backticks      = { "`date`" },
    backslashes    = { r"a\b\\c\n" },
    mixed          = { r#"python -c "print('hi')" && echo 'done'"# },
    glob_and_tilde = { "~/logs/*.log" },
    semicolons     = { "a; b | c & d" },
    newline_free_unicode = { "héllo wörld 日本語" },
    leading_dash   = { "-n not an option" },
    empty          = { "" },
)]
fn escape_round_trips_through_bash(input: &str) {
    assert_eq!(round_trip(input), input);
}

#[test]
fn bash_c_wrapping_preserves_arbitrary_payloads() {
    let payload = r#"printf '%s' "it's a 'test' of $quotes""#;
    let output = Command::new("bash")
        .arg("-c")
        .arg(bash_c(payload))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "it's a 'test' of "
    );
}

#[test]
fn double_wrapping_unwraps_one_level_per_shell() {
    // tmux launches `bash -c '<wrapper>'`; the wrapper itself contains
    // `bash -c '<user command>'`. Each shell unwraps one level.
    let inner = bash_c("printf '%s' \"nested 'quotes' survive\"");
    let outer = bash_c(&inner);
    let output = Command::new("bash").arg("-c").arg(&outer).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "nested 'quotes' survive"
    );
}

#[test]
fn unquoted_tilde_expands_quoted_tilde_does_not() {
    // The path-quoting invariant: probe commands interpolate tilde
    // paths unquoted precisely because of this difference.
    let unquoted = Command::new("bash")
        .arg("-c")
        .arg("echo ~")
        .output()
        .unwrap();
    let quoted = Command::new("bash")
        .arg("-c")
        .arg("echo '~'")
        .output()
        .unwrap();
    let home = String::from_utf8(unquoted.stdout).unwrap();
    assert!(home.trim().starts_with('/'), "expected a path, got {home}");
    assert_eq!(String::from_utf8(quoted.stdout).unwrap().trim(), "~");
}
