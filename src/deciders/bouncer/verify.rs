//! Independent replay and check of a Bouncer certificate (spec.md §3, tape-
//! descriptor equivalence; spec.md §8, verifier soundness).
//!
//! Generic over `nPartitions`/`nRuns`: this function makes no assumption
//! that the certificate came from [`super::detect`]'s single-partition
//! search, only that it is shaped like spec.md §6's `Certificate`. It
//! replays the machine from step 0 and, at every checkpoint the
//! certificate names, checks the live tape against the certificate's tape
//! descriptor and re-runs the recorded step counts, rather than trusting
//! any of the decider's internal reasoning.

use std::sync::Arc;

use crate::tm::simulator::{Simulator, StepResult};
use crate::tm::transition::TransitionTable;

use super::{check_tape, Certificate, MIN_RUNS};

/// Replays from scratch: confirms the tape at `initialSteps` matches the
/// certificate's initial descriptor, then for every run, replays the
/// repeater transition and wall transition and confirms the tape matches
/// `td0` before and `td1` after, with that partition's repeater count
/// incremented by exactly one.
pub fn verify(spec: &TransitionTable, info: &[u8]) -> anyhow::Result<()> {
    let cert = Certificate::decode(info)?;
    anyhow::ensure!(
        cert.initial_steps < cert.final_steps,
        "steps not increasing"
    );

    let margin = 64;
    let half_width = cert
        .final_leftmost
        .unsigned_abs()
        .max(cert.final_rightmost.unsigned_abs()) as i32
        + margin;
    let mut sim = Simulator::new(Arc::new(spec.clone()), half_width);
    sim.initialise(0);

    while sim.step_count < cert.initial_steps {
        match sim.step().0 {
            StepResult::Ok => {}
            StepResult::Halt => anyhow::bail!("machine halted before initialSteps"),
            StepResult::OutOfBounds => anyhow::bail!("tape bound exceeded before initialSteps"),
        }
    }

    let mut counts = cert.repeater_count.clone();
    anyhow::ensure!(
        sim.state == cert.initial_tape.state,
        "state mismatch at initialSteps"
    );
    anyhow::ensure!(
        sim.tape.leftmost == cert.initial_leftmost,
        "leftmost mismatch at initialSteps"
    );
    anyhow::ensure!(
        sim.tape.rightmost == cert.initial_rightmost,
        "rightmost mismatch at initialSteps"
    );
    check_tape(&cert.initial_tape, &counts)?;
    anyhow::ensure!(
        sim.head == cert.initial_tape.head_abs(sim.tape.leftmost),
        "head mismatch at initialSteps"
    );
    anyhow::ensure!(
        sim.tape.visited_slice() == cert.initial_tape.unfold(&counts).as_slice(),
        "tape at initialSteps does not match the certificate's initial descriptor"
    );

    for run in &cert.runs {
        let partition = run.partition as usize;
        anyhow::ensure!(
            partition < counts.len(),
            "run references unknown partition {partition}"
        );

        check_tape(&run.td0, &counts)?;
        anyhow::ensure!(
            sim.state == run.td0.state && sim.head == run.td0.head_abs(sim.tape.leftmost),
            "state/head mismatch before a run"
        );
        anyhow::ensure!(
            sim.tape.visited_slice() == run.td0.unfold(&counts).as_slice(),
            "tape does not match td0 before a run"
        );
        anyhow::ensure!(
            sim.state == run.repeater.initial.state && sim.head == run.repeater.initial.head,
            "repeater transition's initial segment does not match the live machine"
        );
        anyhow::ensure!(
            sim.tape.visited_slice() == run.repeater.initial.tape.as_slice(),
            "repeater transition's initial segment tape does not match"
        );

        let target = sim.step_count + run.repeater.n_steps;
        while sim.step_count < target {
            match sim.step().0 {
                StepResult::Ok => {}
                StepResult::Halt => anyhow::bail!("machine halted during a repeater transition"),
                StepResult::OutOfBounds => {
                    anyhow::bail!("tape bound exceeded during a repeater transition")
                }
            }
        }
        anyhow::ensure!(
            sim.state == run.repeater.final_seg.state && sim.head == run.repeater.final_seg.head,
            "repeater transition's final segment does not match the live machine"
        );
        anyhow::ensure!(
            sim.tape.visited_slice() == run.repeater.final_seg.tape.as_slice(),
            "repeater transition's final segment tape does not match"
        );

        anyhow::ensure!(
            sim.state == run.wall.initial.state && sim.head == run.wall.initial.head,
            "wall transition's initial segment does not match the live machine"
        );
        let target = sim.step_count + run.wall.n_steps;
        while sim.step_count < target {
            match sim.step().0 {
                StepResult::Ok => {}
                StepResult::Halt => anyhow::bail!("machine halted during a wall transition"),
                StepResult::OutOfBounds => {
                    anyhow::bail!("tape bound exceeded during a wall transition")
                }
            }
        }
        anyhow::ensure!(
            sim.state == run.wall.final_seg.state && sim.head == run.wall.final_seg.head,
            "wall transition's final segment does not match the live machine"
        );

        counts[partition] += 1;
        check_tape(&run.td1, &counts)?;
        anyhow::ensure!(
            sim.state == run.td1.state && sim.head == run.td1.head_abs(sim.tape.leftmost),
            "state/head mismatch after a run"
        );
        anyhow::ensure!(
            sim.tape.visited_slice() == run.td1.unfold(&counts).as_slice(),
            "tape does not match td1 after a run"
        );
    }

    anyhow::ensure!(
        sim.step_count == cert.final_steps,
        "final step count does not match the certificate"
    );
    anyhow::ensure!(
        sim.tape.leftmost == cert.final_leftmost,
        "final leftmost does not match the certificate"
    );
    anyhow::ensure!(
        sim.tape.rightmost == cert.final_rightmost,
        "final rightmost does not match the certificate"
    );
    for &count in &counts {
        anyhow::ensure!(count >= MIN_RUNS, "final repeater count below the required minimum");
    }

    Ok(())
}
