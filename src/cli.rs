//! Shared CLI argument parsing (spec.md §6, "CLI").
//!
//! Every tool accepts the same `-X<value>` prefix (single token, no `=`, no
//! whitespace between flag and value — ported from `Params.h`'s one-pass
//! token scan) plus a handful of decider-specific extras. Unknown flags are
//! a class-3 fatal error (spec.md §7), so parsing happens in two steps:
//! [`RawArgs::parse`] collects every `-<letter><value>` token into a map,
//! [`CommonArgs::parse`] consumes the shared letters, and each binary then
//! consumes its own extra letters before calling [`RawArgs::expect_consumed`].

use std::collections::HashMap;

use crate::cert::umf::read_umf;
use crate::config::{Params, DEFAULT_CHUNK_SIZE};
use crate::error::fatal_io;
use crate::seed::SeedDatabase;
use crate::tm::transition::TransitionTable;

/// Every `-<letter><value>` token from argv, unparsed.
pub struct RawArgs {
    flags: HashMap<char, String>,
    consumed: Vec<char>,
}

impl RawArgs {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args).unwrap_or_else(|e| fatal_io(e))
    }

    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut flags = HashMap::new();
        for arg in args {
            anyhow::ensure!(
                arg.len() >= 2 && arg.starts_with('-'),
                "malformed argument '{arg}', expected -<letter><value>"
            );
            let letter = arg[1..2].chars().next().unwrap();
            anyhow::ensure!(letter.is_ascii_alphabetic(), "unknown flag letter in '{arg}'");
            let value = arg[2..].to_string();
            anyhow::ensure!(
                flags.insert(letter, value).is_none(),
                "flag -{letter} repeated"
            );
        }
        Ok(Self {
            flags,
            consumed: Vec::new(),
        })
    }

    fn take(&mut self, letter: char) -> Option<String> {
        self.consumed.push(letter);
        self.flags.get(&letter).cloned()
    }

    pub fn string(&mut self, letter: char) -> Option<String> {
        self.take(letter)
    }

    pub fn flag(&mut self, letter: char) -> bool {
        self.consumed.push(letter);
        self.flags.contains_key(&letter)
    }

    pub fn u32(&mut self, letter: char) -> anyhow::Result<Option<u32>> {
        match self.take(letter) {
            None => Ok(None),
            Some(s) => Ok(Some(
                s.parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("-{letter}{s} is not a valid integer"))?,
            )),
        }
    }

    pub fn u64(&mut self, letter: char) -> anyhow::Result<Option<u64>> {
        match self.take(letter) {
            None => Ok(None),
            Some(s) => Ok(Some(
                s.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("-{letter}{s} is not a valid integer"))?,
            )),
        }
    }

    /// Fails unless every flag seen on the command line has been consumed by
    /// `string`/`flag`/`u32`/`u64` (spec.md §7: "unknown flags are fatal").
    pub fn expect_consumed(&self) -> anyhow::Result<()> {
        for letter in self.flags.keys() {
            anyhow::ensure!(
                self.consumed.contains(letter),
                "unrecognized flag -{letter} for this tool"
            );
        }
        Ok(())
    }
}

/// The argument prefix shared by every decider/verifier binary (spec.md §6).
pub struct CommonArgs {
    pub n_states: u32,
    pub database_path: Option<String>,
    pub verification_path: String,
    pub input_path: Option<String>,
    pub undecided_path: String,
    pub test_machine: Option<u32>,
    pub machine_spec: Option<String>,
    pub machine_limit: Option<u64>,
    pub n_threads: Option<usize>,
    pub trace_output: bool,
}

impl CommonArgs {
    pub fn parse(args: &mut RawArgs) -> anyhow::Result<Self> {
        let n_states = args
            .u32('N')?
            .ok_or_else(|| anyhow::anyhow!("-N<states> is required"))?;
        let database_path = args.string('D');
        let verification_path = args.string('V').unwrap_or_else(|| "out.dvf".to_string());
        let input_path = args.string('I');
        let undecided_path = args.string('U').unwrap_or_else(|| "out.umf".to_string());
        let test_machine = args.u32('X')?;
        let machine_spec = args.string('M');
        let machine_limit = args.u64('L')?;
        let n_threads = args.u32('H')?.map(|n| n as usize);
        let trace_output = args.flag('O');

        if let Some(n) = n_threads {
            anyhow::ensure!(n > 0, "-H0: thread count must be at least 1");
        }
        if let Some(ref spec) = machine_spec {
            let expected = 7 * n_states as usize - 1;
            anyhow::ensure!(
                spec.len() == expected || spec.split('_').count() as u32 == n_states,
                "-M<spec> length does not match -N{n_states}"
            );
        }

        Ok(Self {
            n_states,
            database_path,
            verification_path,
            input_path,
            undecided_path,
            test_machine,
            machine_spec,
            machine_limit,
            n_threads,
            trace_output,
        })
    }

    /// Builds the common half of a [`Params`] value; the binary still needs
    /// to add its own decider-specific knobs before use.
    pub fn into_params(self) -> Params {
        let mut builder = Params::builder(self.n_states);
        if let Some(db) = &self.database_path {
            builder = builder.database_path(db.clone());
        }
        builder = builder.verification_path(self.verification_path.clone());
        builder = builder.undecided_path(self.undecided_path.clone());
        builder = builder.chunk_size(DEFAULT_CHUNK_SIZE);
        if let Some(n) = self.n_threads {
            builder = builder.n_threads(n);
        }
        if let Some(limit) = self.machine_limit {
            builder = builder.machine_limit(limit);
        }
        builder = builder.trace_output(self.trace_output);
        let mut params = builder.build();
        params.input_path = self.input_path.clone();
        params.test_machine = self.test_machine;
        params.machine_spec = self.machine_spec.clone();
        params
    }
}

/// Opens the seed database named by `params` (spec.md §6 `-D<database>`),
/// interpreting it as the 5-state original's header+30-byte-record layout
/// when `n_states == 5`, generic fixed-width otherwise.
pub fn open_database(params: &Params) -> anyhow::Result<SeedDatabase> {
    let path = params
        .database_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("-D<database> is required unless -M<spec> is given"))?;
    SeedDatabase::open(path, params.n_states, false)
}

/// Reads an explicit index list from `-I<input>` (an umf file); `None` if
/// no `-I` was given, meaning "every machine in the database".
pub fn read_index_list(params: &Params) -> anyhow::Result<Option<Vec<u32>>> {
    match &params.input_path {
        Some(path) => Ok(Some(read_umf(path)?)),
        None => Ok(None),
    }
}

/// A single ad-hoc machine, resolved from `-M<spec>` (no database needed)
/// or `-X<index>` against the `-D<database>` (spec.md §6). `None` if
/// neither was given, meaning "run the full batch pipeline instead".
pub fn resolve_single_machine(params: &Params) -> anyhow::Result<Option<TransitionTable>> {
    if let Some(spec) = &params.machine_spec {
        return Ok(Some(TransitionTable::from_standard_tm_text(spec)?));
    }
    if let Some(index) = params.test_machine {
        let db = open_database(params)?;
        return Ok(Some(db.read_machine(index)?));
    }
    Ok(None)
}
