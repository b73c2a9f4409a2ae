//! The TM simulator (spec.md §4.1).
//!
//! Ported from `bbchallenge.h`'s `TuringMachine::Step`: read the cell under
//! the head, apply the transition, update `Leftmost`/`Rightmost`, detect
//! halt. `RecordBroken` is the extra bit this spec adds over the original
//! (which tracked records in each decider separately): a single step reports
//! whether it just broke a left or right record, so callers like the Cycler
//! and Bouncer engines don't need to duplicate the bookkeeping.

use std::sync::Arc;

use crate::tm::tape::Tape;
use crate::tm::transition::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Ok,
    Halt,
    OutOfBounds,
}

/// `-1` = broke the left record, `+1` = broke the right record, `0` = neither.
pub type RecordBroken = i8;

/// A single running machine: transition table (shared, read-only) + tape +
/// scalar state. Cheap to clone (one Vec copy for the tape), matching
/// spec.md's ownership rule that "each worker exclusively owns its tape, its
/// clone machine".
#[derive(Debug, Clone)]
pub struct Simulator {
    spec: Arc<TransitionTable>,
    pub index: u32,
    pub tape: Tape,
    pub head: i32,
    pub state: u8,
    pub step_count: u32,
}

impl Simulator {
    pub fn new(spec: Arc<TransitionTable>, half_width: i32) -> Self {
        Self {
            spec,
            index: 0,
            tape: Tape::new(half_width),
            head: 0,
            state: 1,
            step_count: 0,
        }
    }

    pub fn spec(&self) -> &TransitionTable {
        &self.spec
    }

    /// Resets to state 1, head 0, all-zero tape and sets the machine index
    /// under analysis. Fails deterministically if the tape's half-width
    /// differs between the two tables (it never should within one worker).
    pub fn initialise(&mut self, index: u32) {
        self.index = index;
        self.tape.reset();
        self.head = 0;
        self.state = 1;
        self.step_count = 0;
    }

    pub fn reset(&mut self) {
        let index = self.index;
        self.initialise(index);
    }

    pub fn step(&mut self) -> (StepResult, RecordBroken) {
        if !self.tape.in_bounds(self.head) {
            return (StepResult::OutOfBounds, 0);
        }
        let symbol = self.tape.read(self.head);
        let transition = self.spec.transition(self.state as u32, symbol);
        self.tape.write(self.head, transition.write);

        let mut record_broken: RecordBroken = 0;
        let prev_leftmost = self.tape.leftmost;
        let prev_rightmost = self.tape.rightmost;

        match transition.dir {
            Some(crate::tm::transition::Direction::Left) => self.head -= 1,
            Some(crate::tm::transition::Direction::Right) | None => self.head += 1,
        }

        if !self.tape.in_bounds(self.head) {
            self.step_count += 1;
            return (StepResult::OutOfBounds, 0);
        }

        if self.head < prev_leftmost {
            record_broken = -1;
        } else if self.head > prev_rightmost {
            record_broken = 1;
        }

        self.state = transition.next;
        self.step_count += 1;

        if transition.is_halt() {
            (StepResult::Halt, record_broken)
        } else {
            (StepResult::Ok, record_broken)
        }
    }

    /// Value-copy assignment ("clone"): copies the entire tape window and
    /// scalar fields from `other`. Panics (contract violation upstream,
    /// never expected to trigger) if the tape shapes mismatch.
    pub fn assign_from(&mut self, other: &Simulator) {
        assert_eq!(
            self.tape.half_width(),
            other.tape.half_width(),
            "tape shape mismatch in Simulator::assign_from"
        );
        self.index = other.index;
        self.tape = other.tape.clone();
        self.head = other.head;
        self.state = other.state;
        self.step_count = other.step_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tm::transition::TransitionTable;

    fn spec(text: &str) -> Arc<TransitionTable> {
        Arc::new(TransitionTable::from_standard_tm_text(text).unwrap())
    }

    #[test]
    fn halts_after_expected_steps() {
        // BB(2) champion: halts after 6 steps.
        let spec = spec("1RB1LB_1LA1RZ");
        let mut sim = Simulator::new(spec, 32);
        sim.initialise(0);
        let mut steps = 0;
        loop {
            let (res, _) = sim.step();
            steps += 1;
            match res {
                StepResult::Halt => break,
                StepResult::Ok => continue,
                StepResult::OutOfBounds => panic!("unexpected out of bounds"),
            }
        }
        assert_eq!(steps, 6);
    }

    #[test]
    fn out_of_bounds_when_tape_too_small() {
        let spec = spec("1RB1LB_1LA1RZ");
        let mut sim = Simulator::new(spec, 1);
        sim.initialise(0);
        let mut saw_oob = false;
        for _ in 0..20 {
            let (res, _) = sim.step();
            if res == StepResult::OutOfBounds {
                saw_oob = true;
                break;
            }
            if res == StepResult::Halt {
                break;
            }
        }
        assert!(saw_oob);
    }

    #[test]
    fn record_broken_matches_bound_growth() {
        let spec = spec("1RB1LB_1LA1RZ");
        let mut sim = Simulator::new(spec, 32);
        sim.initialise(0);
        loop {
            let prev_left = sim.tape.leftmost;
            let prev_right = sim.tape.rightmost;
            let (res, broken) = sim.step();
            if broken == 1 {
                assert!(sim.tape.rightmost > prev_right);
            } else if broken == -1 {
                assert!(sim.tape.leftmost < prev_left);
            } else {
                assert!(sim.tape.rightmost <= prev_right && sim.tape.leftmost >= prev_left);
            }
            if res != StepResult::Ok {
                break;
            }
        }
    }

    #[test]
    fn assign_from_copies_full_state() {
        let spec = spec("1RB1LB_1LA1RZ");
        let mut a = Simulator::new(spec.clone(), 32);
        a.initialise(5);
        a.step();
        a.step();
        let mut b = Simulator::new(spec, 32);
        b.initialise(0);
        b.assign_from(&a);
        assert_eq!(b.index, 5);
        assert_eq!(b.head, a.head);
        assert_eq!(b.state, a.state);
        assert_eq!(b.step_count, a.step_count);
    }
}
