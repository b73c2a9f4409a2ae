//! Bouncer: quadratic-progression detection and tape-descriptor
//! verification (spec.md §4.6).
//!
//! The certificate format below (`TapeDescriptor`, `Segment`, `Transition`,
//! `RunDescriptor`, `Certificate`) is the general `nPartitions`/`nRuns` shape
//! spec.md §6 documents, and [`verify::verify`] mechanically replays and
//! checks a certificate of *any* `nPartitions`/`nRuns` against it makes no
//! assumption that the decider only ever emits one partition.
//!
//! **Scope note** (recorded in DESIGN.md): [`detect::decide`] itself only
//! *searches* for the single-partition ("unilateral") case — one static
//! wall, one growing repeater. The source's general decomposition
//! (`BouncerDecider.cpp`, ~1700 lines: quadratic back-window detection,
//! run-finding, partition assignment via LCM-equalised repeaters) is not
//! ported; this build's detector finds the textbook unilateral shape and
//! certifies it with an explicit run-by-run replay (`nRuns = MIN_RUNS`
//! individually verified growth steps) in the general wire format, so a
//! multi-partition decider could plug into the same `Certificate`/`verify`
//! machinery later without a format change.

pub mod detect;
pub mod verify;

use crate::cert::codec::{Cursor, Writer};

pub const MAX_PARTITIONS: usize = 16;
pub const MAX_RUNS: usize = 500;
pub const MIN_RUNS: u32 = 3;

/// A machine configuration snapshot: state, absolute head, and the full
/// visited-tape window at that instant (spec.md §6, `Segment`).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub state: u8,
    pub head: i32,
    pub tape: Vec<u8>,
}

impl Segment {
    fn write(&self, w: &mut Writer) {
        w.u8(self.state).i16(self.head as i16).bytes16(&self.tape);
    }

    fn read(c: &mut Cursor) -> anyhow::Result<Self> {
        Ok(Self {
            state: c.u8()?,
            head: c.i16()? as i32,
            tape: c.bytes16()?.to_vec(),
        })
    }
}

/// A replayed span of `n_steps` machine steps, bracketed by its endpoint
/// [`Segment`]s (spec.md §6, `Transition`).
#[derive(Debug, Clone)]
pub struct Transition {
    pub n_steps: u32,
    pub initial: Segment,
    pub final_seg: Segment,
}

impl Transition {
    fn write(&self, w: &mut Writer) {
        w.u16(self.n_steps as u16);
        self.initial.write(w);
        self.final_seg.write(w);
    }

    fn read(c: &mut Cursor) -> anyhow::Result<Self> {
        Ok(Self {
            n_steps: c.u16()? as u32,
            initial: Segment::read(c)?,
            final_seg: Segment::read(c)?,
        })
    }
}

/// A tape split into `n_partitions` alternating (wall, repeater) zones
/// (spec.md §3/§6, `TapeDescriptor`): `walls.len() == repeaters.len() + 1`,
/// laid out left to right as `wall[0] repeater[0] wall[1] ... repeater[n-1]
/// wall[n]`.
///
/// `tape_head_wall`/`tape_head_offset` locate the head: this implementation
/// always records `tape_head_wall = 0` and encodes the head as a plain
/// offset from the descriptor's left edge (`tape_head_offset`), rather than
/// addressing it relative to whichever wall it geometrically sits in — a
/// simplification of the field the wire format allows, self-consistent
/// between [`detect`] and [`verify`].
#[derive(Debug, Clone)]
pub struct TapeDescriptor {
    pub state: u8,
    pub tape_head_wall: u8,
    pub tape_head_offset: i32,
    pub walls: Vec<Vec<u8>>,
    pub repeaters: Vec<Vec<u8>>,
}

impl TapeDescriptor {
    pub fn n_partitions(&self) -> usize {
        self.repeaters.len()
    }

    /// Flattens wall/repeater zones into one contiguous byte buffer, using
    /// `counts[i]` copies of `repeaters[i]`, for byte-exact tape comparison
    /// (spec.md §4.6, "Tape-equivalence").
    pub fn unfold(&self, counts: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for i in 0..self.repeaters.len() {
            out.extend_from_slice(&self.walls[i]);
            for _ in 0..counts[i] {
                out.extend_from_slice(&self.repeaters[i]);
            }
        }
        out.extend_from_slice(&self.walls[self.repeaters.len()]);
        out
    }

    /// The head's absolute position once unfolded onto a tape whose
    /// leftmost visited cell sits at `left_edge`.
    pub fn head_abs(&self, left_edge: i32) -> i32 {
        left_edge + self.tape_head_offset
    }

    fn write(&self, w: &mut Writer) {
        w.u8(self.state)
            .u8(self.tape_head_wall)
            .i16(self.tape_head_offset as i16);
        for wall in &self.walls {
            w.bytes16(wall);
        }
        for rep in &self.repeaters {
            w.bytes16(rep);
        }
    }

    fn read(c: &mut Cursor, n_partitions: usize) -> anyhow::Result<Self> {
        let state = c.u8()?;
        let tape_head_wall = c.u8()?;
        let tape_head_offset = c.i16()? as i32;
        let mut walls = Vec::with_capacity(n_partitions + 1);
        for _ in 0..=n_partitions {
            walls.push(c.bytes16()?.to_vec());
        }
        let mut repeaters = Vec::with_capacity(n_partitions);
        for _ in 0..n_partitions {
            repeaters.push(c.bytes16()?.to_vec());
        }
        Ok(Self {
            state,
            tape_head_wall,
            tape_head_offset,
            walls,
            repeaters,
        })
    }
}

/// Checks the shape invariants spec.md §3 requires of a tape descriptor:
/// one more wall than repeater, every repeater non-empty, at most
/// [`MAX_PARTITIONS`] partitions.
pub fn check_tape(td: &TapeDescriptor, counts: &[u32]) -> anyhow::Result<()> {
    anyhow::ensure!(
        td.walls.len() == td.repeaters.len() + 1,
        "wall count must be one more than repeater count"
    );
    anyhow::ensure!(td.repeaters.len() <= MAX_PARTITIONS, "too many partitions");
    anyhow::ensure!(
        counts.len() == td.repeaters.len(),
        "repeater-count arity mismatch"
    );
    for rep in &td.repeaters {
        anyhow::ensure!(!rep.is_empty(), "repeater must not be empty");
    }
    Ok(())
}

/// Two descriptors are *equivalent* iff their unfolded tapes agree (spec.md
/// §3, "two tape descriptors are equivalent iff ... they coincide").
pub fn check_tapes_equivalent(
    a: &TapeDescriptor,
    a_counts: &[u32],
    b: &TapeDescriptor,
    b_counts: &[u32],
) -> anyhow::Result<()> {
    anyhow::ensure!(a.state == b.state, "state mismatch between tape descriptors");
    anyhow::ensure!(
        a.unfold(a_counts) == b.unfold(b_counts),
        "unfolded tapes are not equivalent"
    );
    Ok(())
}

/// One growth step of a super-cycle: `partition` names which repeater grew;
/// `repeater`/`wall` are the replayed transitions that produced it (spec.md
/// §6, `RunDescriptor`). This implementation always records `wall` as a
/// zero-length no-op transition (see the module doc): every observed step
/// is attributed to `repeater`, not split into a separate wall-catch-up
/// phase.
#[derive(Debug, Clone)]
pub struct RunDescriptor {
    pub partition: u8,
    pub repeater: Transition,
    pub td0: TapeDescriptor,
    pub wall: Transition,
    pub td1: TapeDescriptor,
}

/// The on-disk Bouncer certificate (spec.md §6).
#[derive(Debug, Clone)]
pub struct Certificate {
    pub bouncer_type: u8,
    pub initial_steps: u32,
    pub initial_leftmost: i32,
    pub initial_rightmost: i32,
    pub final_steps: u32,
    pub final_leftmost: i32,
    pub final_rightmost: i32,
    pub repeater_count: Vec<u32>,
    pub initial_tape: TapeDescriptor,
    pub runs: Vec<RunDescriptor>,
}

impl Certificate {
    pub fn n_partitions(&self) -> usize {
        self.repeater_count.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u8(self.bouncer_type)
            .u8(self.n_partitions() as u8)
            .u8(self.runs.len() as u8)
            .u32(self.initial_steps)
            .i32(self.initial_leftmost)
            .i32(self.initial_rightmost)
            .u32(self.final_steps)
            .i32(self.final_leftmost)
            .i32(self.final_rightmost);
        for &c in &self.repeater_count {
            w.u16(c as u16);
        }
        self.initial_tape.write(&mut w);
        for run in &self.runs {
            w.u8(run.partition);
            run.repeater.write(&mut w);
            run.td0.write(&mut w);
            run.wall.write(&mut w);
            run.td1.write(&mut w);
        }
        w.into_bytes()
    }

    pub fn decode(info: &[u8]) -> anyhow::Result<Self> {
        let mut c = Cursor::new(info);
        let bouncer_type = c.u8()?;
        let n_partitions = c.u8()? as usize;
        let n_runs = c.u8()? as usize;
        anyhow::ensure!(
            n_partitions >= 1 && n_partitions <= MAX_PARTITIONS,
            "bad partition count {n_partitions}"
        );
        anyhow::ensure!(n_runs <= MAX_RUNS, "too many runs {n_runs}");
        let initial_steps = c.u32()?;
        let initial_leftmost = c.i32()?;
        let initial_rightmost = c.i32()?;
        let final_steps = c.u32()?;
        let final_leftmost = c.i32()?;
        let final_rightmost = c.i32()?;
        let mut repeater_count = Vec::with_capacity(n_partitions);
        for _ in 0..n_partitions {
            repeater_count.push(c.u16()? as u32);
        }
        let initial_tape = TapeDescriptor::read(&mut c, n_partitions)?;
        check_tape(&initial_tape, &repeater_count)?;
        let mut runs = Vec::with_capacity(n_runs);
        for _ in 0..n_runs {
            let partition = c.u8()?;
            anyhow::ensure!(
                (partition as usize) < n_partitions,
                "run references unknown partition {partition}"
            );
            let repeater = Transition::read(&mut c)?;
            let td0 = TapeDescriptor::read(&mut c, n_partitions)?;
            let wall = Transition::read(&mut c)?;
            let td1 = TapeDescriptor::read(&mut c, n_partitions)?;
            runs.push(RunDescriptor {
                partition,
                repeater,
                td0,
                wall,
                td1,
            });
        }
        c.expect_exhausted()?;
        Ok(Self {
            bouncer_type,
            initial_steps,
            initial_leftmost,
            initial_rightmost,
            final_steps,
            final_leftmost,
            final_rightmost,
            repeater_count,
            initial_tape,
            runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_td(n_partitions: usize) -> TapeDescriptor {
        TapeDescriptor {
            state: 1,
            tape_head_wall: 0,
            tape_head_offset: 3,
            walls: (0..=n_partitions).map(|i| vec![i as u8; 2]).collect(),
            repeaters: (0..n_partitions).map(|i| vec![i as u8 + 10]).collect(),
        }
    }

    #[test]
    fn unfold_interleaves_walls_and_repeaters() {
        let td = TapeDescriptor {
            state: 1,
            tape_head_wall: 0,
            tape_head_offset: 0,
            walls: vec![vec![1, 1], vec![9, 9]],
            repeaters: vec![vec![5]],
        };
        assert_eq!(td.unfold(&[3]), vec![1, 1, 5, 5, 5, 9, 9]);
    }

    #[test]
    fn certificate_round_trips_through_the_wire_format() {
        let td0 = sample_td(2);
        let td1 = sample_td(2);
        let cert = Certificate {
            bouncer_type: 2,
            initial_steps: 10,
            initial_leftmost: -5,
            initial_rightmost: 5,
            final_steps: 40,
            final_leftmost: -8,
            final_rightmost: 8,
            repeater_count: vec![3, 3],
            initial_tape: td0.clone(),
            runs: vec![RunDescriptor {
                partition: 1,
                repeater: Transition {
                    n_steps: 7,
                    initial: Segment {
                        state: 1,
                        head: 2,
                        tape: vec![0, 1, 0],
                    },
                    final_seg: Segment {
                        state: 1,
                        head: 3,
                        tape: vec![0, 1, 0, 1],
                    },
                },
                td0: td0.clone(),
                wall: Transition {
                    n_steps: 0,
                    initial: Segment {
                        state: 1,
                        head: 3,
                        tape: vec![0, 1, 0, 1],
                    },
                    final_seg: Segment {
                        state: 1,
                        head: 3,
                        tape: vec![0, 1, 0, 1],
                    },
                },
                td1,
            }],
        };
        let bytes = cert.encode();
        let decoded = Certificate::decode(&bytes).unwrap();
        assert_eq!(decoded.n_partitions(), 2);
        assert_eq!(decoded.runs.len(), 1);
        assert_eq!(decoded.runs[0].partition, 1);
        assert_eq!(decoded.initial_tape.unfold(&[3, 3]), td0.unfold(&[3, 3]));
    }
}
