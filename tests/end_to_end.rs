//! Runs whole scripts through the compiled binary and checks their stdout, mirroring the
//! concrete scenarios worked through by hand while designing the interpreter.

use std::io::Write;
use std::path::Path;
use std::process::Command;

fn exe_path() -> &'static str {
    if cfg!(windows) {
        "target/debug/cellforth.exe"
    } else {
        "target/debug/cellforth"
    }
}

/// Write `script` to a temp file and run it through the `cellforth <file>` form of the CLI,
/// returning its stdout.
fn run_script(script: &str) -> String {
    assert!(
        Path::new(exe_path()).exists(),
        "interpreter binary not found: {}",
        exe_path()
    );

    let mut path = std::env::temp_dir();
    path.push(format!("cellforth-test-{}.f", std::process::id()));

    {
        let mut file = std::fs::File::create(&path).expect("failed to create temp script");
        file.write_all(script.as_bytes()).expect("failed to write temp script");
    }

    let output = Command::new(exe_path())
        .arg(&path)
        .output()
        .expect("failed to run cellforth binary");

    let _ = std::fs::remove_file(&path);

    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn prints_sum_of_two_numbers() {
    assert_eq!(run_script("1 2 + . cr"), "3 \n");
}

#[test]
fn defines_and_calls_a_squaring_word() {
    assert_eq!(run_script(": sq dup * ; 5 sq ."), "25 ");
}

#[test]
fn do_loop_counts_from_one_to_ten() {
    assert_eq!(
        run_script(": count 11 1 do i . loop cr ; count"),
        "1 2 3 4 5 6 7 8 9 10 \n"
    );
}

#[test]
fn if_then_negates_when_the_value_is_below_zero() {
    assert_eq!(run_script(": abs dup 0 < if -1 * then ; -7 abs . 3 abs ."), "7 3 ");
}

#[test]
fn recurse_computes_factorial() {
    assert_eq!(
        run_script(": fact dup 1 > if dup 1- recurse * then ; 5 fact ."),
        "120 "
    );
}

#[test]
fn create_allot_store_and_fetch_round_trip_through_memory() {
    assert_eq!(
        run_script("create x 1 allot : store x ! ; : load x @ . ; 42 store load"),
        "42 "
    );
}

#[test]
fn quoted_literal_prints_verbatim_in_interpret_mode() {
    assert_eq!(run_script(r#"." hello world""#), "hello world");
}

#[test]
fn unknown_token_is_reported_without_aborting_the_rest_of_the_script() {
    let output = run_script("1 bogus 2 . cr");
    assert!(output.contains("BOGUS ?"));
    assert!(output.contains("2 \n"));
}

#[test]
fn redefining_a_builtin_is_rejected_and_the_original_keeps_working() {
    let output = run_script(": + 99 ; 1 2 + .");
    assert!(output.contains("cannot redefine +"));
    assert!(output.contains("3 "));
}

#[test]
fn printdebug_disassembles_a_user_word() {
    let output = run_script(": sq dup * ; PRINTDEBUG sq");
    assert!(output.contains("SQ:"));
    assert!(output.contains("dup"));
    assert!(output.contains("*"));
}
