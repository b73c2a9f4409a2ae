//! Deciders and verifiers (spec.md §4). Each decider module exposes a
//! `decide` function returning a [`Verdict`] and a `verify` function that
//! mechanically rechecks a certificate's `info` bytes against the machine.
//!
//! Ported from the teacher's `Decider` trait (`decider.rs`) but narrowed: a
//! decider here genuinely only ever produces "non-halting, here's a
//! certificate" or "undecided" (spec.md §7 class 1), never a halt verdict —
//! this catalogue has already been pre-filtered to non-halting-within-budget
//! machines (spec.md §4.2 rationale), so an actual `Halt` StepResult from a
//! candidate machine is a class-2 contract violation, not an ordinary
//! outcome.

pub mod backward_reasoning;
pub mod bouncer;
pub mod cycler;
pub mod far;
pub mod halting_segment;
pub mod translated_cycler;

use crate::cert::tags::DeciderTag;

/// Outcome of running one decider against one machine.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// Non-halting proved; `info` is the tag-specific certificate payload
    /// (spec.md §6), ready to append to the dvf.
    NonHalting { tag: DeciderTag, info: Vec<u8> },
    /// Could not prove non-halting within the configured limits.
    Undecided,
}

impl Verdict {
    pub fn is_decided(&self) -> bool {
        matches!(self, Verdict::NonHalting { .. })
    }
}
