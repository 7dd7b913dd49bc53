//! Integration tests for the decode/export workflow sequencer

#![cfg(unix)]

mod common;

use common::write_script;
use crossbeam_channel::bounded;
use cxgui::workflow::{plan, run_plan, WorkflowEvent, WorkflowRequest, WorkflowRunner, WorkflowState};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

/// A decode stand-in that writes `<base>.tbc` into the working directory
const DECODE_OK: &str = "touch \"$2.tbc\"";

/// An export stand-in that writes its second argument
const EXPORT_OK: &str = "touch \"$2\"";

fn request(dir: &Path, decode_body: &str, export_body: &str) -> WorkflowRequest {
    std::fs::write(dir.join("tape1.u8"), b"rf samples").expect("write input");
    WorkflowRequest {
        decode_exe: write_script(dir, "decode.sh", decode_body),
        export_exe: write_script(dir, "export.sh", export_body),
        input_file: dir.join("tape1.u8"),
        output_base: "tape1".to_string(),
        working_dir: dir.to_path_buf(),
    }
}

fn run(request: &WorkflowRequest) -> (WorkflowState, Vec<WorkflowEvent>) {
    let plan = plan(request).expect("valid request");
    let (tx, rx) = bounded(4096);
    let stop = AtomicBool::new(false);
    let state = run_plan(&plan, &tx, &stop);
    (state, rx.try_iter().collect())
}

#[test]
fn both_stages_succeed_and_artifact_exists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, events) = run(&request(dir.path(), DECODE_OK, EXPORT_OK));

    assert_eq!(state, WorkflowState::Done);
    assert!(dir.path().join("tape1.tbc").exists());
    assert!(dir.path().join("tape1.tbcexported.mkv").exists());

    let started: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StageStarted { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["decode", "export"]);
}

#[test]
fn decode_failure_skips_export_entirely() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The export stand-in leaves a marker so an accidental start is visible.
    let (state, events) = run(&request(dir.path(), "exit 1", "touch export-ran; touch \"$2\""));

    assert_eq!(state, WorkflowState::Failed);
    assert!(!dir.path().join("export-ran").exists());
    assert!(!events
        .iter()
        .any(|e| matches!(e, WorkflowEvent::StageStarted { stage: "export" })));

    match events.last() {
        Some(WorkflowEvent::Finished { state, detail }) => {
            assert_eq!(*state, WorkflowState::Failed);
            assert!(detail.contains("decode"));
        }
        other => panic!("expected Finished event, got {:?}", other),
    }
}

#[test]
fn export_zero_exit_without_artifact_is_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Export exits 0 but writes nothing; the filesystem check is authoritative.
    let (state, events) = run(&request(dir.path(), DECODE_OK, "exit 0"));

    assert_eq!(state, WorkflowState::Failed);
    match events.last() {
        Some(WorkflowEvent::Finished { detail, .. }) => {
            assert!(detail.contains("was not created"));
        }
        other => panic!("expected Finished event, got {:?}", other),
    }
}

#[test]
fn export_nonzero_exit_is_failure_even_with_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _) = run(&request(dir.path(), DECODE_OK, "touch \"$2\"; exit 2"));
    assert_eq!(state, WorkflowState::Failed);
}

#[test]
fn stage_output_lines_are_forwarded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, events) = run(&request(
        dir.path(),
        "echo 'decoding field 1'; touch \"$2.tbc\"",
        EXPORT_OK,
    ));

    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::Line { stage: "decode", line } if line.contains("decoding field 1")
    )));
}

#[test]
fn shutdown_kills_the_running_stage_before_returning() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The decode stand-in records its pid, then becomes the long-running
    // process itself.
    let request = request(dir.path(), "echo $$ > decode.pid\nexec sleep 30", EXPORT_OK);
    let plan = plan(&request).expect("valid request");
    let runner = WorkflowRunner::spawn(plan);

    let pid_file = dir.path().join("decode.pid");
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut pid: Option<i32> = None;
    while pid.is_none() && Instant::now() < deadline {
        pid = std::fs::read_to_string(&pid_file)
            .ok()
            .and_then(|s| s.trim().parse().ok());
        if pid.is_none() {
            std::thread::sleep(Duration::from_millis(25));
        }
    }
    let pid = pid.expect("decode stand-in wrote its pid");

    runner.shutdown();

    // Once shutdown returns, nothing may still hold the device or outputs.
    let alive = unsafe { libc::kill(pid, 0) } == 0;
    assert!(!alive, "stage process survived shutdown");
}

#[test]
fn stop_terminates_the_running_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    // exec so the termination signal reaches the long-running process itself.
    let request = request(dir.path(), "exec sleep 30", EXPORT_OK);
    let plan = plan(&request).expect("valid request");

    let runner = WorkflowRunner::spawn(plan);
    std::thread::sleep(Duration::from_millis(300));
    runner.stop();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut final_state = None;
    while Instant::now() < deadline && final_state.is_none() {
        for event in runner.drain() {
            if let WorkflowEvent::Finished { state, .. } = event {
                final_state = Some(state);
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert_eq!(final_state, Some(WorkflowState::Failed));
}
