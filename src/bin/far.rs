//! Finite-automata-reduction decider/verifier CLI (spec.md §4.7, §6).

use bb_deciders::cli::{self, CommonArgs, RawArgs};
use bb_deciders::deciders::far::detect::decide;
use bb_deciders::deciders::far::verify::verify;
use bb_deciders::deciders::far::MAX_DFA_STATES;
use bb_deciders::deciders::Verdict;
use bb_deciders::error::fatal_io;

fn main() {
    let mut args = RawArgs::from_env();
    let common = CommonArgs::parse(&mut args).unwrap_or_else(|e| fatal_io(e));
    let max_d_states = args
        .u32('A')
        .unwrap_or_else(|e| fatal_io(e))
        .unwrap_or(MAX_DFA_STATES);
    args.expect_consumed().unwrap_or_else(|e| fatal_io(e));

    let params = common.into_params();

    if let Some(spec) = cli::resolve_single_machine(&params).unwrap_or_else(|e| fatal_io(e)) {
        match decide(&spec, max_d_states) {
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
        move |_index, spec: &bb_deciders::tm::transition::TransitionTable| {
            decide(spec, max_d_states)
        }
    })
    .unwrap_or_else(|e| fatal_io(e));

    eprintln!(
        "{} decided, {} undecided out of {}",
        summary.n_decided, summary.n_undecided, summary.n_total
    );
}
