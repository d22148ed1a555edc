use std::process::Command;

/// Run a demo binary with info logging and return what it printed to stderr.
fn run_demo(exe: &str) -> String {
    let output = Command::new(exe)
        .env("ALLOC_DEMO_LOG", "info")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    assert!(output.status.success(), "{exe} failed:\n{stderr}");
    stderr
}

#[test]
fn arena_demo_fills_one_page() {
    let stderr = run_demo(env!("CARGO_BIN_EXE_arena"));
    assert!(stderr.contains("ran out of space in the arena after 512 i64s"));
    assert!(stderr.contains("arena capacity 512 (requested 10), used 512"));
}

#[test]
fn fixed_buffer_demo_refuses_eleventh_value() {
    let stderr = run_demo(env!("CARGO_BIN_EXE_fixed_buffer"));
    assert!(stderr.contains("buffer contents: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]"));
    assert!(stderr.contains("out of space as expected"));
}

#[test]
fn slab_demo_keeps_odd_values() {
    let stderr = run_demo(env!("CARGO_BIN_EXE_slab"));
    assert!(stderr.contains("600 objects live in 3 caches"));
    assert!(stderr.contains("300 objects live in"));
    assert!(stderr.contains("couldn't allocate a contiguous buffer"));
}
