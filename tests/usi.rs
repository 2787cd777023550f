use std::io::Write;
use std::process::{Command, Stdio};

fn run_engine(input: &str) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_kogoma"))
        .args(["--seed", "3"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start binary");

    let stdin = child.stdin.as_mut().expect("Failed to open stdin");
    stdin.write_all(input.as_bytes()).expect("Failed to write to stdin");
    stdin.flush().expect("Failed to flush stdin");

    let output = child.wait_with_output().expect("Failed to read output");
    assert!(output.status.success());

    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_handshake() {
    let stdout = run_engine("usi\nisready\nquit\n");

    assert!(stdout.starts_with("id name kogoma"));
    assert!(stdout.contains("usiok"));
    assert!(stdout.contains("readyok"));
}

#[test]
fn test_go_answers_with_a_move() {
    let stdout = run_engine("usi\nposition startpos moves 1e1d\ngo depth 2\nquit\n");

    let bestmove = stdout
        .lines()
        .find(|line| line.starts_with("bestmove "))
        .expect("no bestmove line");

    assert_ne!(bestmove, "bestmove resign");
}

#[test]
fn test_mated_engine_resigns() {
    let stdout = run_engine("position sfen r3k/5/1g3/2s2/K4 b - 1\ngo\n");

    assert!(stdout.lines().any(|line| line == "bestmove resign"));
}

#[test]
fn test_perft_and_end_of_input() {
    // no quit, the engine stops when stdin closes
    let stdout = run_engine("go perft 1\n");

    assert!(stdout.contains("Nodes searched: 14"));
}

#[test]
fn test_rejected_position_keeps_the_engine_alive() {
    let stdout = run_engine(
        "position sfen 4k/5/2p2/5/K1R2 b 2P 1\ngo depth 1\nposition sfen 4k/5/5/5/K4 b 99999999999P 1\ngo depth 1\nquit\n",
    );

    assert!(stdout.contains("info string more than two Pawn pieces in play"));
    assert!(stdout.contains("info string invalid hand"));
    assert_eq!(stdout.lines().filter(|line| line.starts_with("bestmove ")).count(), 2);
}

#[test]
fn test_handshake_keeps_the_position() {
    let stdout = run_engine("position startpos moves 1e1d\nusi\nisready\nd\nquit\n");

    assert!(stdout.contains("usiok"));
    assert!(stdout.lines().any(|line| line == "White to move"));
}
