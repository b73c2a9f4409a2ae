//! Bouncer decider/verifier CLI (spec.md §4.6, §6).

use std::sync::Arc;

use bb_deciders::cli::{self, CommonArgs, RawArgs};
use bb_deciders::config::{DEFAULT_RECORD_CAPACITY, DEFAULT_SPACE_LIMIT, DEFAULT_STEP_LIMIT};
use bb_deciders::deciders::bouncer::detect::decide;
use bb_deciders::deciders::bouncer::verify::verify;
use bb_deciders::deciders::Verdict;
use bb_deciders::error::fatal_io;
use bb_deciders::tm::simulator::Simulator;
use bb_deciders::tm::transition::TransitionTable;

fn run_one(spec: &TransitionTable, step_limit: u32, record_capacity: usize) -> Verdict {
    let mut sim = Simulator::new(Arc::new(spec.clone()), DEFAULT_SPACE_LIMIT);
    sim.initialise(0);
    decide(&mut sim, step_limit, record_capacity)
}

fn main() {
    let mut args = RawArgs::from_env();
    let common = CommonArgs::parse(&mut args).unwrap_or_else(|e| fatal_io(e));
    let step_limit = args
        .u32('T')
        .unwrap_or_else(|e| fatal_io(e))
        .unwrap_or(DEFAULT_STEP_LIMIT);
    let record_capacity = args
        .u32('S')
        .unwrap_or_else(|e| fatal_io(e))
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_RECORD_CAPACITY);
    args.expect_consumed().unwrap_or_else(|e| fatal_io(e));

    let params = common.into_params();

    if let Some(spec) = cli::resolve_single_machine(&params).unwrap_or_else(|e| fatal_io(e)) {
        match run_one(&spec, step_limit, record_capacity) {
            Verdict::NonHalting { info, .. } => {
                verify(&spec, &info).unwrap_or_else(|e| fatal_io(e));
                println!("non-halting (verified), {} info bytes", info.len());
            }
            Verdict::Undecided => println!("undecided"),
        }
        return;
    }

    let db = cli::open_database(&params).unwrap_or_else(|e| fatal_io(e));
    let indices = cli::read_index_list(&params).unwrap_or_else(|e| fatal_io(e));
    let summary = bb_deciders::pipeline::run(&params, &db, indices, move || {
        move |_index, spec: &TransitionTable| run_one(spec, step_limit, record_capacity)
    })
    .unwrap_or_else(|e| fatal_io(e));

    eprintln!(
        "{} decided, {} undecided out of {}",
        summary.n_decided, summary.n_undecided, summary.n_total
    );
}
