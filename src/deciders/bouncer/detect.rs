//! Bouncer detection: find a constant-stride, constant-period run of the
//! tape-head records (same triple-scan as [`super::super::translated_cycler`])
//! and, across [`super::MIN_RUNS`] consecutive cycles, confirm the newly
//! exposed tape region is the same repeated block each time, with the rest
//! of the tape (the wall) untouched. See the module doc for the scope of
//! what this search does and does not find.

use std::sync::Arc;

use crate::cert::tags::DeciderTag;
use crate::tm::records::RecordChain;
use crate::tm::simulator::{Simulator, StepResult};
use crate::tm::transition::{Direction, TransitionTable};

use super::super::Verdict;
use super::{Certificate, RunDescriptor, Segment, TapeDescriptor, Transition, MIN_RUNS};

pub fn decide(sim: &mut Simulator, step_limit: u32, record_capacity: usize) -> Verdict {
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
                "unexpected HALT in Bouncer",
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
    let window_len = MIN_RUNS as usize + 1;

    for (direction, chain) in [
        (Direction::Right, &right_records),
        (Direction::Left, &left_records),
    ] {
        for state in 1..=n_states as u8 {
            let records: Vec<_> = chain.chain(state).collect(); // newest-first
            if records.len() < window_len {
                continue;
            }
            for window in records.windows(window_len) {
                let k = window[0].head - window[1].head;
                if k == 0 {
                    continue;
                }
                let cycle_steps = window[0].step - window[1].step;
                let consistent = window.windows(2).all(|w| {
                    w[0].head - w[1].head == k && w[0].step - w[1].step == cycle_steps
                });
                if !consistent {
                    continue;
                }
                let oldest = *window.last().unwrap();
                if let Some(info) =
                    try_certify(spec, half_width, direction, oldest.step, cycle_steps, k)
                {
                    return Verdict::NonHalting {
                        tag: DeciderTag::Bouncer,
                        info,
                    };
                }
            }
        }
    }

    Verdict::Undecided
}

/// Replays the machine from scratch, confirming [`MIN_RUNS`] consecutive
/// cycles each grow the same wall by one copy of the same repeater, and
/// packages each cycle as an individually checkable [`RunDescriptor`] in
/// the general (one-partition) certificate format.
fn try_certify(
    spec: &TransitionTable,
    half_width: i32,
    direction: Direction,
    init_step: u32,
    cycle_steps: u32,
    k: i32,
) -> Option<Vec<u8>> {
    let abs_k = k.unsigned_abs() as i32;
    if abs_k == 0 {
        return None;
    }
    let wider = half_width + abs_k * (MIN_RUNS as i32 + 2) + 16;
    let mut clone = Simulator::new(Arc::new(spec.clone()), wider);
    clone.initialise(0);
    while clone.step_count < init_step {
        if clone.step().0 != StepResult::Ok {
            return None;
        }
    }
    let init_state = clone.state;
    let init_head = clone.head;
    let init_leftmost = clone.tape.leftmost;
    let init_rightmost = clone.tape.rightmost;
    let wall_content = clone.tape.slice(init_leftmost, init_rightmost).to_vec();

    // Zone layout, left to right: for a rightward bouncer, the static wall
    // then the growing repeater; for a leftward bouncer, the reverse.
    let walls = || -> Vec<Vec<u8>> {
        match direction {
            Direction::Right => vec![wall_content.clone(), Vec::new()],
            Direction::Left => vec![Vec::new(), wall_content.clone()],
        }
    };

    let mut runs = Vec::with_capacity(MIN_RUNS as usize);
    let mut repeater: Option<Vec<u8>> = None;
    let mut cur_step = init_step;

    for cycle_index in 1..=MIN_RUNS as i32 {
        let before_seg = Segment {
            state: clone.state,
            head: clone.head,
            tape: clone.tape.visited_slice().to_vec(),
        };
        let td0 = TapeDescriptor {
            state: before_seg.state,
            tape_head_wall: 0,
            tape_head_offset: before_seg.head - clone.tape.leftmost,
            walls: walls(),
            repeaters: vec![repeater.clone().unwrap_or_else(|| vec![0u8; abs_k as usize])],
        };

        let target_step = cur_step + cycle_steps;
        while clone.step_count < target_step {
            if clone.step().0 != StepResult::Ok {
                return None;
            }
        }
        cur_step = target_step;
        if clone.state != init_state {
            return None;
        }
        let expected_head = init_head + k * cycle_index;
        if clone.head != expected_head {
            return None;
        }

        let (lo, hi) = match direction {
            Direction::Right => (
                init_rightmost + 1 + (cycle_index - 1) * abs_k,
                init_rightmost + cycle_index * abs_k,
            ),
            Direction::Left => (
                init_leftmost - cycle_index * abs_k,
                init_leftmost - 1 - (cycle_index - 1) * abs_k,
            ),
        };
        if !clone.tape.in_bounds(lo) || !clone.tape.in_bounds(hi) {
            return None;
        }
        let this_copy = clone.tape.slice(lo, hi).to_vec();
        match &repeater {
            None => repeater = Some(this_copy),
            Some(r) if *r == this_copy => {}
            Some(_) => return None, // doesn't tile: not a genuine repeater
        }
        if clone.tape.slice(init_leftmost, init_rightmost) != wall_content.as_slice() {
            return None; // wall was touched again: not a simple wall/repeater split
        }

        let after_seg = Segment {
            state: clone.state,
            head: clone.head,
            tape: clone.tape.visited_slice().to_vec(),
        };
        let td1 = TapeDescriptor {
            state: after_seg.state,
            tape_head_wall: 0,
            tape_head_offset: after_seg.head - clone.tape.leftmost,
            walls: walls(),
            repeaters: vec![repeater.clone().unwrap()],
        };

        runs.push(RunDescriptor {
            partition: 0,
            repeater: Transition {
                n_steps: cycle_steps,
                initial: before_seg,
                final_seg: after_seg.clone(),
            },
            td0,
            wall: Transition {
                n_steps: 0,
                initial: after_seg.clone(),
                final_seg: after_seg,
            },
            td1,
        });
    }

    let repeater = repeater?;
    let initial_tape = TapeDescriptor {
        state: init_state,
        tape_head_wall: 0,
        tape_head_offset: init_head - init_leftmost,
        walls: walls(),
        repeaters: vec![vec![0u8; repeater.len()]],
    };

    let cert = Certificate {
        bouncer_type: 1,
        initial_steps: init_step,
        initial_leftmost: init_leftmost,
        initial_rightmost: init_rightmost,
        final_steps: cur_step,
        final_leftmost: clone.tape.leftmost,
        final_rightmost: clone.tape.rightmost,
        repeater_count: vec![0],
        initial_tape,
        runs,
    };
    Some(cert.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deciders::Verdict;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    #[test]
    fn detects_a_unilateral_bouncer() {
        // Same degenerate "writes only the background value" construction
        // used for the translated-cycler test: every write equals the
        // unvisited default, so the growing region trivially tiles with
        // itself no matter how it's split.
        let spec = machine("0RB0RB_0RA0RA");
        let mut sim = Simulator::new(Arc::new(spec.clone()), 8192);
        sim.initialise(0);
        let verdict = decide(&mut sim, 4000, 5000);
        match verdict {
            Verdict::NonHalting { tag, info } => {
                assert_eq!(tag, DeciderTag::Bouncer);
                super::super::verify::verify(&spec, &info).expect("certificate must verify");
            }
            Verdict::Undecided => panic!("expected a bouncer"),
        }
    }

    #[test]
    fn certificate_names_three_explicit_runs() {
        let spec = machine("0RB0RB_0RA0RA");
        let mut sim = Simulator::new(Arc::new(spec.clone()), 8192);
        sim.initialise(0);
        match decide(&mut sim, 4000, 5000) {
            Verdict::NonHalting { info, .. } => {
                let cert = Certificate::decode(&info).unwrap();
                assert_eq!(cert.n_partitions(), 1);
                assert_eq!(cert.runs.len(), MIN_RUNS as usize);
                assert!(cert.runs.iter().all(|r| r.partition == 0));
            }
            Verdict::Undecided => panic!("expected a bouncer"),
        }
    }
}
