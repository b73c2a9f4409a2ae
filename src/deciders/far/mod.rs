//! Finite-automata reduction (spec.md §4.7).
//!
//! Ported from `FAR/FAR_Decider.cpp` (`RunDecider`/`ExtendNFA`), but
//! re-expressed as plain recursive backtracking over canonical DFA
//! transition tables instead of the original's iterative traversal over a
//! pointer-aliased `(t, m)` pair: both enumerate the same canonical-order DFA
//! space (`DFA[0][0] = 0` fixed, each new state's first appearance bounded
//! by `maxSoFar + 1`) and apply the same seed/right-rule/left-closure/
//! acceptance-fixpoint construction from spec.md §4.7 steps 1-5; see
//! [`detect`] for the search and [`verify`] for the non-backtracking
//! reconstruction used to check a certificate.
//!
//! **Scope note** (recorded in DESIGN.md): only the `FAR_DFA_ONLY` tag is
//! produced — the certificate stores `(direction, dfa)` and the verifier
//! reconstructs the NFA itself, rather than additionally persisting and
//! bit-for-bit cross-checking the NFA matrices (`FAR_DFA_NFA`). The
//! reconstruction is identical either way; the dropped feature is a
//! belt-and-suspenders redundancy check, not a distinct algorithm.

pub mod bitops;
pub mod detect;
pub mod verify;

use bitops::{mat_vec, vec_mat, Matrix, Vector};

use crate::tm::transition::{Direction, TransitionTable};

pub const MAX_DFA_STATES: u32 = 9;

pub fn nfa_states(n_states: u32, d_states: u32) -> u32 {
    n_states * d_states + 1
}

pub fn halt_state(n_states: u32, d_states: u32) -> u32 {
    n_states * d_states
}

pub(super) fn flat(i: u32, w: u8) -> usize {
    (2 * i + w as u32) as usize
}

/// Seeds `R[0]`, `R[1]`, and the acceptance vector: HALT is absorbing under
/// both symbols, and every `(state, symbol)` whose TM transition halts can
/// reach HALT from its own NFA state, for every DFA state `i` (spec.md
/// §4.7, step 1).
pub fn seed(spec: &TransitionTable, d_states: u32) -> (Matrix, Matrix, Vector) {
    let n_states = spec.n_states();
    let nfa = nfa_states(n_states, d_states);
    let halt = halt_state(n_states, d_states);
    let mut r0 = Matrix::new(nfa, nfa);
    let mut r1 = Matrix::new(nfa, nfa);
    r0.row_mut(halt).set(halt);
    r1.row_mut(halt).set(halt);

    for f in 0..n_states {
        for r in 0..2u8 {
            let t = spec.transition(f + 1, r);
            if t.is_halt() {
                for i in 0..d_states {
                    let row = n_states * i + f;
                    let m = if r == 0 { &mut r0 } else { &mut r1 };
                    m.row_mut(row).set(halt);
                }
            }
        }
    }
    let mut a = Vector::new(nfa);
    a.set(halt);
    (r0, r1, a)
}

/// Right rules (spec.md §4.7, step 2): for the DFA transition `DFA[i][w] =
/// d`, every machine transition `(f, r)` that moves in `direction` and
/// writes `w` reaches `(d, next-1)`.
pub fn apply_right_rule(
    spec: &TransitionTable,
    direction: Direction,
    dfa: &[u8],
    i: u32,
    w: u8,
    r0: &mut Matrix,
    r1: &mut Matrix,
) {
    let n_states = spec.n_states();
    let d = dfa[flat(i, w)] as u32;
    for f in 0..n_states {
        for r in 0..2u8 {
            let t = spec.transition(f + 1, r);
            if let Some(dir) = t.dir {
                if !t.is_halt() && dir == direction && t.write == w {
                    let target = n_states * d + (t.next as u32 - 1);
                    let row = n_states * i + f;
                    let m = if r == 0 { &mut *r0 } else { &mut *r1 };
                    m.row_mut(row).set(target);
                }
            }
        }
    }
}

/// Left rules, run to a fixed point (spec.md §4.7, step 3): every machine
/// transition moving opposite `direction` propagates backward through every
/// already-placed DFA transition `(i, w) = d` in `filled`.
pub fn close_left_rules(
    spec: &TransitionTable,
    direction: Direction,
    dfa: &[u8],
    filled: &[(u32, u8)],
    r0: &mut Matrix,
    r1: &mut Matrix,
) {
    let n_states = spec.n_states();
    loop {
        let mut changed = false;
        for f in 0..n_states {
            for r in 0..2u8 {
                let t = spec.transition(f + 1, r);
                let dir = match t.dir {
                    Some(d) if !t.is_halt() && d != direction => d,
                    _ => continue,
                };
                let _ = dir;
                let tgt = t.next as u32 - 1;
                let w = t.write;
                for &(i, b) in filled {
                    let d = dfa[flat(i, b)] as u32;
                    let src_row = if b == 0 {
                        r0.row(n_states * i + tgt)
                    } else {
                        r1.row(n_states * i + tgt)
                    };
                    let rw: &Matrix = if w == 0 { &*r0 } else { &*r1 };
                    let v = vec_mat(src_row, rw);
                    let dest_row_idx = n_states * d + f;
                    let dest = if r == 0 {
                        r0.row_mut(dest_row_idx)
                    } else {
                        r1.row_mut(dest_row_idx)
                    };
                    if !dest.is_superset(&v) {
                        dest.union_with(&v);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Acceptance fixed point (spec.md §4.7, step 4): `a := R[0]·a` until stable.
pub fn close_acceptance(r0: &Matrix, a: &mut Vector) {
    loop {
        let next = mat_vec(r0, a);
        if next.bits() == a.bits() {
            break;
        }
        *a = next;
    }
}

/// Success criterion (spec.md §4.7, step 5): the initial NFA state (machine
/// state A, DFA state 0) cannot reach an accepting vector under `R[0]`.
pub fn q0_unreachable(r0: &Matrix, a: &Vector) -> bool {
    !r0.row(0).intersects(a)
}

/// Rebuilds `(R[0], R[1], a)` from a complete DFA table in one pass (used by
/// the verifier, which has no need for the decider's incremental
/// backtracking).
pub fn reconstruct(
    spec: &TransitionTable,
    direction: Direction,
    d_states: u32,
    dfa: &[u8],
) -> (Matrix, Matrix, Vector) {
    let (mut r0, mut r1, mut a) = seed(spec, d_states);
    for i in 0..d_states {
        for w in 0..2u8 {
            apply_right_rule(spec, direction, dfa, i, w, &mut r0, &mut r1);
        }
    }
    let all_positions: Vec<(u32, u8)> = (0..d_states).flat_map(|i| (0..2u8).map(move |w| (i, w))).collect();
    close_left_rules(spec, direction, dfa, &all_positions, &mut r0, &mut r1);
    close_acceptance(&r0, &mut a);
    (r0, r1, a)
}
