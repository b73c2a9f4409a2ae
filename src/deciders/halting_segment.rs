//! Halting-segment engine: windowed predecessor search with memoisation
//! (spec.md §4.3).
//!
//! Same backward search as [`super::backward_reasoning`], but confined to a
//! tape segment of width `2*H+1` centred on the halt head. A predecessor
//! that would step outside the segment *exits* into an unconstrained
//! predecessor chase (see [`exit_closes`]) rather than pruning by tape
//! conflict. `H` escalates from 1 until the search closes or a configured
//! width limit is reached.
//!
//! **Simplification from the source** (recorded in DESIGN.md): the
//! original's compound bit-trie (`AlreadySeen[state][cell]`, prefix lookup
//! with wildcards) is replaced here with an exact-match memo keyed on
//! `(state, head, window contents)` for the main segment search, and a
//! separate exact-match memo keyed on `(state, head, remaining budget)` for
//! the [`Search::exit_closes`] sub-search (the source's "single one-sided
//! trie keyed by the tape-to-the-other-side"). Both only cache *successful*
//! branches where applicable, so this is a strictly conservative
//! approximation of the trie's short-circuiting — it never changes the
//! decider's verdict, only how much redundant search it repeats.

use hashbrown::{HashMap, HashSet};

use crate::cert::codec::{Cursor, Writer};
use crate::cert::tags::DeciderTag;
use crate::tm::transition::{Direction, TransitionTable};

use super::Verdict;

#[derive(Debug, Clone, Copy)]
struct Predecessor {
    state: u8,
    read: u8,
    write: u8,
    dir: Direction,
}

fn predecessor_table(spec: &TransitionTable) -> Vec<Vec<Predecessor>> {
    let n_states = spec.n_states();
    let mut table = vec![Vec::new(); n_states as usize + 1];
    for state in 1..=n_states {
        for read in 0..2u8 {
            let t = spec.transition(state, read);
            if let Some(dir) = t.dir {
                table[t.next as usize].push(Predecessor {
                    state: state as u8,
                    read,
                    write: t.write,
                    dir,
                });
            }
        }
    }
    table
}

struct Search<'a> {
    table: &'a [Vec<Predecessor>],
    half_width: i32,
    exit_budget: u32,
    memo: HashSet<(u8, i32, Vec<u8>)>,
    exit_memo: HashMap<(u8, i32, u32), bool>,
    n_nodes: u32,
}

impl<'a> Search<'a> {
    fn window_key(&self, tape: &[Option<u8>]) -> Vec<u8> {
        tape.iter().map(|c| c.unwrap_or(2)).collect()
    }

    /// The left/right-exit sub-search: once a predecessor has stepped
    /// outside the segment, its tape cell is unconstrained, so the only
    /// remaining question is whether every further predecessor chain closes
    /// (never reaches `state=1, head=0`) within the remaining budget.
    /// Memoised on `(state, head, remaining budget)` — an exact-match cache,
    /// since whether a chain closes depends on how much budget is left, not
    /// just on where it currently stands.
    fn exit_closes(&mut self, state: u8, head: i32, depth: u32) -> bool {
        if state == 1 && head == 0 {
            return false;
        }
        if depth == self.exit_budget {
            return false;
        }
        let remaining = self.exit_budget - depth;
        let key = (state, head, remaining);
        if let Some(&cached) = self.exit_memo.get(&key) {
            return cached;
        }

        let predecessors = self.table[state as usize].to_vec();
        for p in &predecessors {
            let prev_head = match p.dir {
                Direction::Left => head + 1,
                Direction::Right => head - 1,
            };
            if !self.exit_closes(p.state, prev_head, depth + 1) {
                self.exit_memo.insert(key, false);
                return false;
            }
        }
        self.exit_memo.insert(key, true);
        true
    }

    fn recurse(&mut self, tape: &mut [Option<u8>], state: u8, head: i32) -> bool {
        if state == 1 && head == 0 && tape.iter().all(|c| matches!(c, None | Some(0))) {
            return false;
        }

        let key = (state, head, self.window_key(tape));
        if self.memo.contains(&key) {
            return true;
        }
        self.n_nodes += 1;

        let predecessors = self.table[state as usize].to_vec();
        for p in predecessors {
            let prev_head = match p.dir {
                Direction::Left => head + 1,
                Direction::Right => head - 1,
            };

            if prev_head.abs() > self.half_width {
                if !self.exit_closes(p.state, prev_head, 0) {
                    return false;
                }
                continue;
            }

            let idx = (prev_head + self.half_width) as usize;
            let existing = tape[idx];
            match existing {
                None => tape[idx] = Some(p.read),
                Some(v) if v == p.write => tape[idx] = Some(p.read),
                Some(_) => continue,
            }

            let ok = self.recurse(tape, p.state, prev_head);
            tape[idx] = existing;
            if !ok {
                return false;
            }
        }

        self.memo.insert(key);
        true
    }
}

fn try_width(spec: &TransitionTable, half_width: u32, exit_budget: u32) -> Option<u32> {
    let table = predecessor_table(spec);
    let mut tape = vec![None; (2 * half_width + 1) as usize];
    let mut search = Search {
        table: &table,
        half_width: half_width as i32,
        exit_budget,
        memo: HashSet::new(),
        exit_memo: HashMap::new(),
        n_nodes: 0,
    };
    if search.recurse(&mut tape, 0, 0) {
        Some(search.n_nodes)
    } else {
        None
    }
}

pub fn decide(spec: &TransitionTable, max_width: u32, exit_budget: u32) -> Verdict {
    for half_width in 1..=max_width {
        if let Some(n_nodes) = try_width(spec, half_width, exit_budget) {
            let info = encode_certificate(half_width, n_nodes);
            return Verdict::NonHalting {
                tag: DeciderTag::HaltingSegment,
                info,
            };
        }
    }
    Verdict::Undecided
}

fn encode_certificate(half_width: u32, n_nodes: u32) -> Vec<u8> {
    let mut w = Writer::new();
    w.u32(half_width).u32(n_nodes);
    w.into_bytes()
}

struct Certificate {
    half_width: u32,
    n_nodes: u32,
}

fn decode_certificate(info: &[u8]) -> anyhow::Result<Certificate> {
    let mut c = Cursor::new(info);
    let cert = Certificate {
        half_width: c.u32()?,
        n_nodes: c.u32()?,
    };
    c.expect_exhausted()?;
    Ok(cert)
}

/// Replays `try_width` at the certificate's claimed `half_width` with the
/// same exit budget, checking the search closes and the node count matches
/// exactly (spec.md §8, deterministic decider output).
pub fn verify(spec: &TransitionTable, info: &[u8], exit_budget: u32) -> anyhow::Result<()> {
    let cert = decode_certificate(info)?;
    anyhow::ensure!(cert.half_width >= 1, "half_width must be at least 1");
    match try_width(spec, cert.half_width, exit_budget) {
        Some(n_nodes) => {
            anyhow::ensure!(n_nodes == cert.n_nodes, "node count does not match certificate");
            Ok(())
        }
        None => anyhow::bail!("search did not close at the claimed half_width"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BACKWARD_DEPTH;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    #[test]
    fn proves_a_machine_with_an_unreachable_halt() {
        let spec = machine("1RB1RZ_1LA1LA");
        match decide(&spec, 4, DEFAULT_BACKWARD_DEPTH) {
            Verdict::NonHalting { tag, info } => {
                assert_eq!(tag, DeciderTag::HaltingSegment);
                verify(&spec, &info, DEFAULT_BACKWARD_DEPTH).expect("certificate must verify");
            }
            Verdict::Undecided => panic!("expected the halting segment engine to decide this"),
        }
    }

    #[test]
    fn undecided_when_halt_is_reachable() {
        let spec = machine("1RB1LB_1LA1RZ");
        assert!(matches!(
            decide(&spec, 3, DEFAULT_BACKWARD_DEPTH),
            Verdict::Undecided
        ));
    }

    #[test]
    fn verifier_rejects_corrupted_node_count() {
        let spec = machine("1RB1RZ_1LA1LA");
        if let Verdict::NonHalting { info, .. } = decide(&spec, 4, DEFAULT_BACKWARD_DEPTH) {
            let mut corrupted = info.clone();
            corrupted[7] ^= 0xFF; // perturb n_nodes
            assert!(verify(&spec, &corrupted, DEFAULT_BACKWARD_DEPTH).is_err());
        } else {
            panic!("expected a decision");
        }
    }
}
