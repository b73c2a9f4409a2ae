//! Translated cycler: like the Cycler, but the match is allowed with a
//! non-zero head shift `k` (spec.md §4.5).
//!
//! Ported from `TranslatedCyclers/TranslatedCyclers.cpp` (record chains per
//! direction, candidate triples in arithmetic progression) and
//! `TranslatedCycler.cpp` (the replay/verification of a candidate). Record
//! chains reuse [`crate::tm::records::RecordChain`].

use std::sync::Arc;

use crate::cert::codec::{Cursor, Writer};
use crate::cert::tags::DeciderTag;
use crate::tm::records::RecordChain;
use crate::tm::simulator::{Simulator, StepResult};
use crate::tm::tape::tapes_equal_shifted;
use crate::tm::transition::TransitionTable;

use super::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordDirection {
    Right,
    Left,
}

impl RecordDirection {
    fn tag(self) -> DeciderTag {
        match self {
            RecordDirection::Right => DeciderTag::TranslatedCyclerRight,
            RecordDirection::Left => DeciderTag::TranslatedCyclerLeft,
        }
    }
}

pub fn decide(
    sim: &mut Simulator,
    step_limit: u32,
    record_capacity: usize,
) -> Verdict {
    let n_states = sim.spec().n_states() as usize;
    let mut right_records = RecordChain::new(n_states, record_capacity);
    let mut left_records = RecordChain::new(n_states, record_capacity);

    while sim.step_count < step_limit {
        let (result, broken) = sim.step();
        match result {
            StepResult::Ok => {}
            StepResult::Halt => crate::error::contract_violation(
                crate::error::Pass::Decider,
                sim.index,
                "unexpected HALT in TranslatedCycler",
            ),
            StepResult::OutOfBounds => break,
        }
        if broken == 1 {
            if right_records.is_full() {
                return Verdict::Undecided;
            }
            right_records.push(sim.step_count, sim.head, sim.state);
        } else if broken == -1 {
            if left_records.is_full() {
                return Verdict::Undecided;
            }
            left_records.push(sim.step_count, sim.head, sim.state);
        }
    }

    let spec = sim.spec();
    let half_width = sim.tape.half_width();

    for (direction, chain) in [
        (RecordDirection::Right, &right_records),
        (RecordDirection::Left, &left_records),
    ] {
        for state in 1..=n_states as u8 {
            let records: Vec<_> = chain.chain(state).collect(); // newest-first
            for window in records.windows(3) {
                // window = [r3 (newest), r2, r1 (oldest)]
                let (r3, r2, r1) = (window[0], window[1], window[2]);
                let k = r2.head - r1.head;
                let k2 = r3.head - r2.head;
                let step_diff1 = r2.step - r1.step;
                let step_diff2 = r3.step - r2.step;
                if k == 0 || k != k2 || step_diff1 != step_diff2 {
                    continue;
                }
                if let Some(info) = try_certify(spec, half_width, r1.step, r2.step, k, state) {
                    return Verdict::NonHalting {
                        tag: direction.tag(),
                        info,
                    };
                }
            }
        }
    }

    Verdict::Undecided
}

fn try_certify(
    spec: &TransitionTable,
    half_width: i32,
    init_step: u32,
    final_step: u32,
    k: i32,
    expected_state: u8,
) -> Option<Vec<u8>> {
    let wider = half_width + k.unsigned_abs() as i32 + 16;
    let mut clone = Simulator::new(Arc::new(spec.clone()), wider);
    clone.initialise(0);
    while clone.step_count < init_step {
        match clone.step().0 {
            StepResult::Ok => {}
            _ => return None,
        }
    }
    if clone.state != expected_state {
        return None;
    }
    let init_head = clone.head;
    let init_leftmost = clone.tape.leftmost;
    let init_rightmost = clone.tape.rightmost;
    let before_tape = clone.tape.clone();

    while clone.step_count < final_step {
        match clone.step().0 {
            StepResult::Ok => {}
            _ => return None,
        }
    }
    if clone.state != expected_state {
        return None;
    }
    if clone.head != init_head + k {
        return None;
    }

    let (matches, match_len) = tapes_equal_shifted(&before_tape, k, &clone.tape);
    if !matches {
        return None;
    }

    let mut w = Writer::new();
    w.i32(init_leftmost)
        .i32(init_rightmost)
        .u8(expected_state)
        .i32(init_head)
        .i32(init_head + k)
        .u32(init_step)
        .u32(final_step)
        .u32(match_len);
    Some(w.into_bytes())
}

struct Certificate {
    leftmost: i32,
    rightmost: i32,
    state: u8,
    init_head: i32,
    final_head: i32,
    init_step: u32,
    final_step: u32,
    match_len: u32,
}

fn decode_certificate(info: &[u8]) -> anyhow::Result<Certificate> {
    let mut c = Cursor::new(info);
    let cert = Certificate {
        leftmost: c.i32()?,
        rightmost: c.i32()?,
        state: c.u8()?,
        init_head: c.i32()?,
        final_head: c.i32()?,
        init_step: c.u32()?,
        final_step: c.u32()?,
        match_len: c.u32()?,
    };
    c.expect_exhausted()?;
    Ok(cert)
}

/// Replays from scratch: captures the tape at `init_step`, runs to
/// `final_step`, and confirms the configurations match shifted by
/// `final_head - init_head` over their full visited range (spec.md §3's
/// shifted-match definition; cells beyond either snapshot read as 0 —
/// spec.md §8 boundary: "the saved tape snapshot can be shorter than the
/// match length").
pub fn verify(spec: &TransitionTable, info: &[u8]) -> anyhow::Result<()> {
    let cert = decode_certificate(info)?;
    anyhow::ensure!(cert.init_step < cert.final_step, "steps not increasing");
    let k = cert.final_head - cert.init_head;
    anyhow::ensure!(k != 0, "translated cycler requires a nonzero shift");

    let half_width = cert
        .rightmost
        .unsigned_abs()
        .max(cert.leftmost.unsigned_abs())
        .max(cert.final_head.unsigned_abs()) as i32
        + 64;
    let mut sim = Simulator::new(Arc::new(spec.clone()), half_width);
    sim.initialise(0);

    while sim.step_count < cert.init_step {
        match sim.step().0 {
            StepResult::Ok => {}
            StepResult::Halt => anyhow::bail!("machine halted before init_step"),
            StepResult::OutOfBounds => anyhow::bail!("tape bound exceeded before init_step"),
        }
    }
    anyhow::ensure!(sim.state == cert.state, "state mismatch at init_step");
    anyhow::ensure!(sim.head == cert.init_head, "head mismatch at init_step");
    anyhow::ensure!(sim.tape.leftmost == cert.leftmost, "leftmost mismatch at init_step");
    anyhow::ensure!(sim.tape.rightmost == cert.rightmost, "rightmost mismatch at init_step");
    let before = sim.tape.clone();

    while sim.step_count < cert.final_step {
        match sim.step().0 {
            StepResult::Ok => {}
            StepResult::Halt => anyhow::bail!("machine halted before final_step"),
            StepResult::OutOfBounds => anyhow::bail!("tape bound exceeded before final_step"),
        }
    }
    anyhow::ensure!(sim.state == cert.state, "state mismatch at final_step");
    anyhow::ensure!(sim.head == cert.final_head, "head mismatch at final_step");

    let (matches, match_len) = tapes_equal_shifted(&before, k, &sim.tape);
    anyhow::ensure!(matches, "shifted tape configurations do not match");
    anyhow::ensure!(match_len == cert.match_len, "match length does not match certificate");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    // A->B->A..., sweeping right forever and always writing 0 (the tape's
    // background value). The head advances by 2 every A->A round, and since
    // every written symbol equals the unvisited background, the shifted
    // configurations compare equal for any shift: a genuine (if degenerate)
    // translated cycler, hand-traced to confirm the first candidate triple
    // appears at steps 2, 4, 6 with k=2.
    const RIGHT_SWEEP: &str = "0RB0RB_0RA0RA";

    #[test]
    fn detects_a_translated_cycler() {
        let spec = machine(RIGHT_SWEEP);
        let mut sim = Simulator::new(Arc::new(spec.clone()), 4096);
        sim.initialise(0);
        let verdict = decide(&mut sim, 2000, 5000);
        match verdict {
            Verdict::NonHalting { tag, info } => {
                assert_eq!(tag, DeciderTag::TranslatedCyclerRight);
                verify(&spec, &info).expect("certificate must verify");
            }
            Verdict::Undecided => panic!("expected a translated cycler"),
        }
    }

    #[test]
    fn verifier_rejects_bit_flipped_certificate() {
        let spec = machine(RIGHT_SWEEP);
        let mut sim = Simulator::new(Arc::new(spec.clone()), 4096);
        sim.initialise(0);
        if let Verdict::NonHalting { info, .. } = decide(&mut sim, 2000, 5000) {
            let mut corrupted = info.clone();
            corrupted[8] ^= 0xFF; // flip the claimed state byte
            assert!(verify(&spec, &corrupted).is_err());
        } else {
            panic!("expected a translated cycler");
        }
    }

    #[test]
    fn verifier_rejects_mismatched_machine() {
        let spec = machine(RIGHT_SWEEP);
        let other = machine("1RB1LB_1LA1RZ");
        let mut sim = Simulator::new(Arc::new(spec.clone()), 4096);
        sim.initialise(0);
        if let Verdict::NonHalting { info, .. } = decide(&mut sim, 2000, 5000) {
            assert!(verify(&other, &info).is_err());
        } else {
            panic!("expected a translated cycler");
        }
    }
}
