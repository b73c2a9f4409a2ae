//! Theorem-17-style certificate check (spec.md §4.7, "Verifier"):
//! reconstructs the NFA from the stored DFA and re-checks the closure and
//! success invariants from scratch, independent of the decider's search.

use crate::cert::codec::Cursor;
use crate::tm::transition::{Direction, TransitionTable};

use super::{halt_state, mat_vec, nfa_states, q0_unreachable, reconstruct, MAX_DFA_STATES};

struct Certificate {
    direction: Direction,
    d_states: u32,
    dfa: Vec<u8>,
}

fn decode_certificate(info: &[u8]) -> anyhow::Result<Certificate> {
    let mut c = Cursor::new(info);
    let direction = match c.u8()? {
        0 => Direction::Right,
        1 => Direction::Left,
        other => anyhow::bail!("invalid direction byte {other}"),
    };
    let d_states = c.u8()? as u32;
    anyhow::ensure!(
        (1..=MAX_DFA_STATES).contains(&d_states),
        "d_states {d_states} out of range"
    );
    let dfa = c.raw(2 * d_states as usize)?.to_vec();
    c.expect_exhausted()?;
    anyhow::ensure!(dfa[0] == 0, "DFA[0][0] must be 0 (canonical symmetry breaking)");
    anyhow::ensure!(dfa.iter().all(|&d| (d as u32) < d_states), "DFA transition target out of range");
    Ok(Certificate { direction, d_states, dfa })
}

pub fn verify(spec: &TransitionTable, info: &[u8]) -> anyhow::Result<()> {
    let cert = decode_certificate(info)?;
    let n_states = spec.n_states();
    let nfa = nfa_states(n_states, cert.d_states);
    let halt = halt_state(n_states, cert.d_states);

    let (r0, r1, a) = reconstruct(spec, cert.direction, cert.d_states, &cert.dfa);
    anyhow::ensure!(r0.n_rows() == nfa && r0.n_cols() == nfa, "R[0] has the wrong shape");
    anyhow::ensure!(r1.n_rows() == nfa && r1.n_cols() == nfa, "R[1] has the wrong shape");

    // (5') HALT is absorbing under both symbols.
    anyhow::ensure!(r0.row(halt).get(halt), "HALT must be absorbing under symbol 0");
    anyhow::ensure!(r1.row(halt).get(halt), "HALT must be absorbing under symbol 1");

    // (4) HALT is part of the accepting set.
    anyhow::ensure!(a.get(halt), "accepting vector must contain HALT");

    // (2) the accepting vector is a fixed point of R[0].
    let a_next = mat_vec(&r0, &a);
    anyhow::ensure!(a_next.bits() == a.bits(), "accepting vector is not a fixed point of R[0]");

    // (7') every halting (f, r) transition reaches HALT from every DFA state.
    for f in 0..n_states {
        for r in 0..2u8 {
            let t = spec.transition(f + 1, r);
            if t.is_halt() {
                for i in 0..cert.d_states {
                    let row = n_states * i + f;
                    let m = if r == 0 { &r0 } else { &r1 };
                    anyhow::ensure!(
                        m.row(row).get(halt),
                        "halting transition ({f}, {r}) does not reach HALT from DFA state {i}"
                    );
                }
            }
        }
    }

    // (3)/(5): the initial NFA state cannot reach an accepting configuration.
    anyhow::ensure!(
        q0_unreachable(&r0, &a),
        "initial NFA state can reach an accepting vector: certificate does not witness non-halting"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deciders::far::detect;
    use crate::deciders::Verdict;

    fn machine(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text(text).unwrap()
    }

    #[test]
    fn rejects_a_corrupted_dfa_entry() {
        let spec = machine("0RA1RZ");
        if let Verdict::NonHalting { info, .. } = detect::decide(&spec, 2) {
            let mut corrupted = info.clone();
            let last = corrupted.len() - 1;
            corrupted[last] = 0xFF; // a DFA target far outside any valid D
            assert!(verify(&spec, &corrupted).is_err());
        } else {
            panic!("expected FAR to decide this machine");
        }
    }

    #[test]
    fn rejects_mismatched_machine() {
        let spec = machine("0RA1RZ");
        let other = machine("1RB1LB_1LA1RZ");
        if let Verdict::NonHalting { info, .. } = detect::decide(&spec, 2) {
            assert!(verify(&other, &info).is_err());
        } else {
            panic!("expected FAR to decide this machine");
        }
    }
}
