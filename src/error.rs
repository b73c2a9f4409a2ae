//! Contract violations: invariant failures inside a decider or verifier that
//! indicate a bug or a corrupt certificate (spec.md class-2 errors).
//!
//! Unlike an ordinary Rust panic these are never caught or unwound — they
//! print a fixed diagnostic and terminate the process, mirroring the
//! `TM_ERROR()`/`VERIFY_ERROR()` macros of the original implementation
//! (Design Notes: "route them through a single contract violation sink").

use std::panic::Location;

/// Which pass (decider or verifier) raised the violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Decider,
    Verifier,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pass::Decider => write!(f, "decider"),
            Pass::Verifier => write!(f, "verifier"),
        }
    }
}

/// Prints `(file, line, machine_index, pass)` and exits the process with
/// status 1. Call this only for conditions that can never happen on
/// well-formed input from a sound decider; everything else is an ordinary
/// `Undecided` return value.
#[track_caller]
pub fn contract_violation(pass: Pass, machine_index: u32, message: &str) -> ! {
    let loc = Location::caller();
    eprintln!(
        "contract violation: {} at {}:{} (machine #{}) - {message}",
        pass,
        loc.file(),
        loc.line(),
        machine_index,
    );
    std::process::exit(1);
}

/// Fatal I/O or argument error (spec.md class-3): file missing, write
/// failure, unknown flag, wrong machine-spec length, nThreads=0.
#[track_caller]
pub fn fatal_io(message: impl std::fmt::Display) -> ! {
    let loc = Location::caller();
    eprintln!("fatal error at {}:{}: {message}", loc.file(), loc.line());
    std::process::exit(1);
}
