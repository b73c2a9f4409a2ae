//! Fan-out/fan-in driver (spec.md §5).
//!
//! Ported from the teacher's worker-pool pattern (`std::thread` + join
//! handles, one contiguous chunk per thread) but simplified: each decider
//! binary supplies a per-thread worker closure instead of a generic
//! `Decider` trait object, since the six engines don't share a call
//! signature (some need a `Simulator`, others just a `&TransitionTable`).
//! Chunks are read machine-by-machine rather than via [`SeedDatabase::read_chunk`]'s
//! bulk read, since `-I<input>` can hand the driver a non-contiguous index
//! list (spec.md §6); ordering is still preserved (spec.md §5: "driver
//! writes chunks to the verification file in worker-assignment order").

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::cert::dvf::{DvfEntry, DvfWriter};
use crate::cert::umf::UmfWriter;
use crate::config::Params;
use crate::deciders::Verdict;
use crate::reporter::Reporter;
use crate::seed::SeedDatabase;
use crate::tm::transition::TransitionTable;

#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub n_total: u64,
    pub n_decided: u64,
    pub n_undecided: u64,
}

struct ChunkOutcome {
    chunk_index: usize,
    decided: Vec<DvfEntry>,
    undecided: Vec<u32>,
}

/// Runs one decider over every machine named by `indices` (or, if `None`,
/// `0..machine_limit.unwrap_or(n_machines)`), splitting the work into
/// `params.chunk_size`-sized chunks handed out to whichever of
/// `params.n_threads` worker threads asks next. `make_worker` is called
/// once per thread and builds a `FnMut` that owns that thread's reusable
/// per-machine arena (a `Simulator`, record chains, ...) so it is not
/// reallocated machine-to-machine within a chunk (spec.md §5 "Memory").
pub fn run<W, F>(
    params: &Params,
    seed_db: &SeedDatabase,
    indices: Option<Vec<u32>>,
    make_worker: F,
) -> anyhow::Result<Summary>
where
    W: FnMut(u32, &TransitionTable) -> Verdict + Send,
    F: Fn() -> W + Send + Sync,
{
    let all_indices: Vec<u32> = match indices {
        Some(v) => v,
        None => {
            let n = seed_db.n_machines();
            let limit = params.machine_limit.unwrap_or(n).min(n);
            (0..limit as u32).collect()
        }
    };
    let n_total = all_indices.len() as u64;

    let chunk_size = params.chunk_size.max(1);
    let chunks: Vec<&[u32]> = all_indices.chunks(chunk_size).collect();
    let n_chunks = chunks.len();
    let n_threads = params.n_threads.max(1).min(n_chunks.max(1));

    let next_chunk = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<anyhow::Result<ChunkOutcome>>();

    thread::scope(|scope| {
        for _ in 0..n_threads {
            let tx = tx.clone();
            let mut worker = make_worker();
            let next_chunk = &next_chunk;
            let chunks = &chunks;
            scope.spawn(move || loop {
                let idx = next_chunk.fetch_add(1, Ordering::SeqCst);
                if idx >= chunks.len() {
                    break;
                }
                let outcome = process_chunk(idx, chunks[idx], seed_db, &mut worker);
                if tx.send(outcome).is_err() {
                    break;
                }
            });
        }
        drop(tx);
    });

    let mut outcomes: Vec<Option<ChunkOutcome>> = (0..n_chunks).map(|_| None).collect();
    for result in rx {
        let outcome = result?;
        let idx = outcome.chunk_index;
        outcomes[idx] = Some(outcome);
    }

    let mut dvf = DvfWriter::create(&params.verification_path)?;
    let mut umf = UmfWriter::create(&params.undecided_path)?;
    let mut n_decided = 0u64;
    let mut n_undecided = 0u64;
    let mut reporter = Reporter::new(params.trace_output);

    for (done, outcome) in outcomes.into_iter().enumerate() {
        let outcome = outcome.ok_or_else(|| anyhow::anyhow!("chunk {done} never completed"))?;
        for entry in &outcome.decided {
            dvf.write_entry(entry)?;
        }
        for index in &outcome.undecided {
            umf.write_index(*index)?;
        }
        n_decided += outcome.decided.len() as u64;
        n_undecided += outcome.undecided.len() as u64;
        reporter.progress(
            ((done + 1) * chunk_size) as u64,
            n_total,
            n_decided,
        );
    }

    dvf.finish()?;
    umf.finish()?;
    reporter.finish(n_decided, n_undecided);

    Ok(Summary {
        n_total,
        n_decided,
        n_undecided,
    })
}

fn process_chunk<W>(
    chunk_index: usize,
    chunk: &[u32],
    seed_db: &SeedDatabase,
    worker: &mut W,
) -> anyhow::Result<ChunkOutcome>
where
    W: FnMut(u32, &TransitionTable) -> Verdict,
{
    let mut decided = Vec::new();
    let mut undecided = Vec::new();
    for &index in chunk {
        let table = seed_db.read_machine(index)?;
        match worker(index, &table) {
            Verdict::NonHalting { tag, info } => decided.push(DvfEntry {
                seed_index: index,
                tag,
                info,
            }),
            Verdict::Undecided => undecided.push(index),
        }
    }
    Ok(ChunkOutcome {
        chunk_index,
        decided,
        undecided,
    })
}
