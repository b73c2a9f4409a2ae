//! FAR search: recursive backtracking over canonical DFA transition tables,
//! escalating the DFA state count (spec.md §4.7; spec.md §8 boundary "DFA
//! states 1..9").

use crate::cert::codec::Writer;
use crate::cert::tags::DeciderTag;
use crate::tm::transition::{Direction, TransitionTable};

use super::super::Verdict;
use super::{apply_right_rule, close_acceptance, close_left_rules, flat, q0_unreachable, seed, MAX_DFA_STATES};

/// Canonical search order: `DFA[0][0]` is fixed at 0 (the symmetry-breaking
/// rule); every other `(i, w)` pair is tried left-then-right, `i` ascending.
fn free_positions(d_states: u32) -> Vec<(u32, u8)> {
    let mut out = Vec::with_capacity((2 * d_states - 1) as usize);
    for i in 0..d_states {
        for w in 0..2u8 {
            if !(i == 0 && w == 0) {
                out.push((i, w));
            }
        }
    }
    out
}

struct Search<'a> {
    spec: &'a TransitionTable,
    direction: Direction,
    d_states: u32,
    positions: Vec<(u32, u8)>,
    dfa: Vec<u8>,
    filled: Vec<(u32, u8)>,
}

impl<'a> Search<'a> {
    fn recurse(&mut self, depth: usize, max_so_far: u32) -> bool {
        if depth == self.positions.len() {
            return true;
        }
        let (i, w) = self.positions[depth];
        let limit = (max_so_far + 1).min(self.d_states - 1);
        for d in 0..=limit {
            self.dfa[flat(i, w)] = d as u8;
            self.filled.push((i, w));
            let (mut r0, mut r1, mut a) = seed(self.spec, self.d_states);
            // Replay every filled position from scratch: the matrices only
            // ever grow, and re-deriving them is far simpler (and just as
            // fast at D ≤ 9) than threading a mutable snapshot stack through
            // the backtracking search.
            for &(pi, pw) in &self.filled {
                apply_right_rule(self.spec, self.direction, &self.dfa, pi, pw, &mut r0, &mut r1);
            }
            close_left_rules(self.spec, self.direction, &self.dfa, &self.filled, &mut r0, &mut r1);
            close_acceptance(&r0, &mut a);
            if q0_unreachable(&r0, &a) {
                let new_max = max_so_far.max(d);
                if self.recurse(depth + 1, new_max) {
                    return true;
                }
            }
            self.filled.pop();
        }
        false
    }
}

fn try_d_states(spec: &TransitionTable, direction: Direction, d_states: u32) -> Option<Vec<u8>> {
    let mut search = Search {
        spec,
        direction,
        d_states,
        positions: free_positions(d_states),
        dfa: vec![0; (2 * d_states) as usize],
        filled: vec![(0, 0)],
    };
    if search.recurse(0, 0) {
        Some(search.dfa)
    } else {
        None
    }
}

pub fn decide(spec: &TransitionTable, max_d_states: u32) -> Verdict {
    let max_d_states = max_d_states.min(MAX_DFA_STATES);
    for d_states in 1..=max_d_states {
        for direction in [Direction::Right, Direction::Left] {
            if let Some(dfa) = try_d_states(spec, direction, d_states) {
                let info = encode_certificate(direction, d_states, &dfa);
                return Verdict::NonHalting {
                    tag: DeciderTag::FarDfaOnly,
                    info,
                };
            }
        }
    }
    Verdict::Undecided
}

fn encode_certificate(direction: Direction, d_states: u32, dfa: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.u8(match direction {
        Direction::Right => 0,
        Direction::Left => 1,
    })
    .u8(d_states as u8)
    .raw(dfa);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    #[test]
    fn proves_a_machine_that_never_writes_a_one() {
        // A loops on reading 0 (writes 0, stays put in effect via self
        // transition), never reaching the halt transition on a 1 it can
        // never write: a 1-state DFA (the trivial automaton) already
        // witnesses non-halting, since every reachable NFA configuration
        // avoids HALT.
        let spec = machine("0RA1RZ");
        match decide(&spec, 2) {
            Verdict::NonHalting { tag, info } => {
                assert_eq!(tag, DeciderTag::FarDfaOnly);
                super::super::verify::verify(&spec, &info).expect("certificate must verify");
            }
            Verdict::Undecided => panic!("expected FAR to decide this machine"),
        }
    }

    #[test]
    fn undecided_when_halt_is_reachable_at_small_d() {
        let spec = machine("1RB1LB_1LA1RZ");
        assert!(matches!(decide(&spec, 2), Verdict::Undecided));
    }
}
