mod common;

use anyhow::Result;
use jam::{jit::RunOutcome, CompileError};
use serial_test::serial;

use common::run_entry;

fn returns(src: &str) -> Result<i64> {
    match run_entry(src, "main")? {
        RunOutcome::Returned(value) => Ok(value),
        RunOutcome::Completed => anyhow::bail!("main returned nothing"),
    }
}

#[test]
#[serial]
fn plain_return_values() -> Result<()> {
    assert_eq!(returns("fn main() -> u32 { return 42; }")?, 42);
    assert_eq!(returns("fn main() -> i32 { return -5; }")?, -5);
    assert_eq!(returns("fn main() -> u16 { return 65535; }")?, 65535);
    assert_eq!(returns("fn main() -> bool { return 3 > 2; }")?, 1);
    Ok(())
}

#[test]
#[serial]
fn width_quirks_are_observable() -> Result<()> {
    // 255 is an 8-bit -1 bit pattern
    assert_eq!(returns("fn main() -> i8 { return 255; }")?, -1);
    assert_eq!(returns("fn main() -> u8 { var a: u8 = 250; return a + 10; }")?, 4);
    Ok(())
}

#[test]
#[serial]
fn for_loop_reaches_the_expected_index() -> Result<()> {
    let src = "fn main() -> u8 { for i in 0:5 { if i == 4 { return i; } } return 0; }";
    assert_eq!(returns(src)?, 4);
    Ok(())
}

#[test]
#[serial]
fn empty_and_inverted_ranges_skip_the_body() -> Result<()> {
    assert_eq!(returns("fn main() -> u8 { for i in 5:5 { return 1; } return 7; }")?, 7);
    assert_eq!(returns("fn main() -> u8 { for i in 9:3 { return 1; } return 7; }")?, 7);
    // 200 is an 8-bit -56, so the signed test fails at once
    assert_eq!(returns("fn main() -> u8 { for i in 0:200 { return 1; } return 3; }")?, 3);
    Ok(())
}

#[test]
#[serial]
fn wide_range_end_is_truncated_to_the_counter_width() -> Result<()> {
    // 300 truncates to 44 in the 8-bit counter, so the loop still reaches 5
    let src = "fn main() -> u8 { for i in 0:300 { if i == 5 { return 1; } } return 0; }";
    assert_eq!(returns(src)?, 1);
    Ok(())
}

#[test]
#[serial]
fn nested_loops_with_continue() -> Result<()> {
    let src = "fn main() -> u8 {
        for i in 0:3 {
            for j in 0:3 {
                if j == 1 { continue; }
                if j == 2 { return i + j; }
            }
        }
        return 0;
    }";
    assert_eq!(returns(src)?, 2);
    Ok(())
}

#[test]
#[serial]
fn while_with_break() -> Result<()> {
    assert_eq!(returns("fn main() -> u8 { while true { break; } return 5; }")?, 5);
    Ok(())
}

#[test]
#[serial]
fn else_if_chain_picks_one_branch() -> Result<()> {
    let src = "fn pick(n: u8) -> u8 {
            if n == 1 { return 10; } else if n == 2 { return 20; } else { return 30; }
        }
        fn main() -> u8 { return pick(2) + pick(7); }";
    assert_eq!(returns(src)?, 50);
    Ok(())
}

#[test]
#[serial]
fn recursion_counts_up() -> Result<()> {
    let src = "fn up(n: u8) -> u8 { if n == 10 { return n; } return up(n + 1); }
               fn main() -> u8 { return up(0); }";
    assert_eq!(returns(src)?, 10);
    Ok(())
}

#[test]
#[serial]
fn void_entry_completes() -> Result<()> {
    assert_eq!(run_entry("fn main() { return; }", "main")?, RunOutcome::Completed);
    assert_eq!(RunOutcome::Completed.report("main"), "main completed");
    assert_eq!(RunOutcome::Returned(3).report("start"), "start returned 3");
    Ok(())
}

#[test]
#[serial]
fn custom_entry_name() -> Result<()> {
    let outcome = run_entry("fn start() -> u32 { return 9; }", "start")?;
    assert_eq!(outcome, RunOutcome::Returned(9));
    Ok(())
}

#[test]
#[serial]
fn entry_must_take_no_parameters() {
    let err = run_entry("fn main(a: u8) -> u8 { return a; }", "main").unwrap_err();
    let err = err.downcast::<CompileError>().expect("compile error");
    assert!(matches!(err, CompileError::ArityMismatch { expected: 0, found: 1, .. }), "{err}");
}

#[test]
#[serial]
fn missing_entry_is_reported() {
    let err = run_entry("fn other() { }", "main").unwrap_err();
    let err = err.downcast::<CompileError>().expect("compile error");
    assert!(matches!(err, CompileError::UnknownFunction(ref n) if n == "main"), "{err}");
}
