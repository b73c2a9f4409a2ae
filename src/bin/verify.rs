//! Generic verifier CLI: rechecks every certificate in a dvf against the
//! seed database, dispatching by decider tag (spec.md §6, §7 "Verifier
//! soundness").

use bb_deciders::cert::dvf::read_dvf;
use bb_deciders::cert::tags::DeciderTag;
use bb_deciders::cli::{CommonArgs, RawArgs};
use bb_deciders::config::DEFAULT_BACKWARD_DEPTH;
use bb_deciders::deciders::{backward_reasoning, bouncer, cycler, far, halting_segment, translated_cycler};
use bb_deciders::error::fatal_io;
use bb_deciders::seed::SeedDatabase;

fn verify_one(tag: DeciderTag, spec: &bb_deciders::tm::transition::TransitionTable, info: &[u8], exit_budget: u32) -> anyhow::Result<()> {
    match tag {
        DeciderTag::Cycler => cycler::verify(spec, info),
        DeciderTag::TranslatedCyclerRight | DeciderTag::TranslatedCyclerLeft => {
            translated_cycler::verify(spec, info)
        }
        DeciderTag::BackwardReasoning => backward_reasoning::verify(spec, info),
        DeciderTag::HaltingSegment => halting_segment::verify(spec, info, exit_budget),
        DeciderTag::Bouncer => bouncer::verify::verify(spec, info),
        DeciderTag::FarDfaOnly | DeciderTag::FarDfaNfa => far::verify::verify(spec, info),
    }
}

fn main() {
    let mut args = RawArgs::from_env();
    let common = CommonArgs::parse(&mut args).unwrap_or_else(|e| fatal_io(e));
    let exit_budget = args
        .u32('S')
        .unwrap_or_else(|e| fatal_io(e))
        .unwrap_or(DEFAULT_BACKWARD_DEPTH);
    let fail_fast = args.flag('F');
    let _checkpoint_prefix = args.string('B');
    args.expect_consumed().unwrap_or_else(|e| fatal_io(e));

    let params = common.into_params();
    let db = SeedDatabase::open(
        params
            .database_path
            .as_deref()
            .unwrap_or_else(|| fatal_io("-D<database> is required for the verify tool")),
        params.n_states,
        false,
    )
    .unwrap_or_else(|e| fatal_io(e));

    let entries = read_dvf(&params.verification_path).unwrap_or_else(|e| fatal_io(e));

    let mut n_ok = 0u64;
    let mut n_failed = 0u64;
    for entry in &entries {
        let spec = match db.read_machine(entry.seed_index) {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!("machine #{}: failed to read: {e}", entry.seed_index);
                n_failed += 1;
                if fail_fast {
                    break;
                }
                continue;
            }
        };
        match verify_one(entry.tag, &spec, &entry.info, exit_budget) {
            Ok(()) => n_ok += 1,
            Err(e) => {
                eprintln!("machine #{}: certificate rejected: {e}", entry.seed_index);
                n_failed += 1;
                if fail_fast {
                    break;
                }
            }
        }
    }

    eprintln!("{n_ok} verified, {n_failed} rejected out of {}", entries.len());
    if n_failed > 0 {
        std::process::exit(1);
    }
}
