//! Run configuration.
//!
//! Ported from the teacher's `Config` (builder pattern, immutable value) and
//! `toml.rs` (`ConfigToml`, read-once side channel for paths) but scoped down
//! to what this spec's CLI surface (spec.md §6) actually needs: a `Params`
//! value built once by the CLI layer and passed by reference to workers
//! (Design Notes: "replace [global argument parsing] with a `Params` value
//! constructed once by the driver").

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Number of states a machine of this catalogue can have.
pub const MIN_STATES: u32 = 2;
pub const MAX_STATES: u32 = 6;

/// Step-count type: big enough for the step budgets used across deciders.
pub type StepCount = u32;

/// Default per-machine step budget for deciders with a time limit.
pub const DEFAULT_STEP_LIMIT: StepCount = 10_000;
/// Default tape half-width (space limit) for the TM simulator.
pub const DEFAULT_SPACE_LIMIT: i32 = 12_289;
/// Default predecessor-search depth for backward reasoning.
pub const DEFAULT_BACKWARD_DEPTH: u32 = 20;
/// Default starting half-width for the halting-segment engine.
pub const DEFAULT_SEGMENT_WIDTH: u32 = 1;
/// Default machine chunk size handed to each worker thread.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Default per-state record-chain capacity for the cycler/translated-cycler/
/// bouncer engines (spec.md §5 "run/record arrays (O(T))").
pub const DEFAULT_RECORD_CAPACITY: usize = 4096;

/// Small side-channel config file, analogous to the teacher's `ConfigToml`:
/// values that are inconvenient to repeat on every CLI invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./data/".to_string()
}

impl FileConfig {
    const FILE_NAME: &'static str = "bb_deciders.toml";

    /// Reads `bb_deciders.toml` from the current directory, creating a
    /// default one if it does not exist yet. Mirrors
    /// `ConfigToml::read_toml` in spirit (read-or-create-default), but
    /// never panics: I/O failure just falls back to defaults.
    pub fn read_or_default() -> Self {
        let path = Path::new(Self::FILE_NAME);
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => toml::from_str(&content).unwrap_or_default(),
                Err(_) => Self::default(),
            }
        } else {
            let config = Self::default();
            if let Ok(text) = toml::to_string_pretty(&config) {
                let _ = fs::write(path, text);
            }
            config
        }
    }
}

/// Parameters shared by every decider/verifier CLI tool (spec.md §6's common
/// argument prefix), plus the per-decider extras. Built once by `cli::parse`
/// and passed by reference into `pipeline::run`.
#[derive(Debug, Clone)]
pub struct Params {
    pub n_states: u32,
    pub database_path: Option<String>,
    pub verification_path: String,
    pub input_path: Option<String>,
    pub undecided_path: String,
    pub test_machine: Option<u32>,
    pub machine_spec: Option<String>,
    pub machine_limit: Option<u64>,
    pub n_threads: usize,
    pub trace_output: bool,
    pub chunk_size: usize,
}

impl Params {
    pub fn builder(n_states: u32) -> ParamsBuilder {
        ParamsBuilder::new(n_states)
    }
}

pub struct ParamsBuilder {
    params: Params,
}

impl ParamsBuilder {
    fn new(n_states: u32) -> Self {
        Self {
            params: Params {
                n_states,
                database_path: None,
                verification_path: "out.dvf".to_string(),
                input_path: None,
                undecided_path: "out.umf".to_string(),
                test_machine: None,
                machine_spec: None,
                machine_limit: None,
                n_threads: num_cpus::get().max(1),
                trace_output: false,
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
        }
    }

    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.params.database_path = Some(path.into());
        self
    }

    pub fn verification_path(mut self, path: impl Into<String>) -> Self {
        self.params.verification_path = path.into();
        self
    }

    pub fn undecided_path(mut self, path: impl Into<String>) -> Self {
        self.params.undecided_path = path.into();
        self
    }

    pub fn n_threads(mut self, n: usize) -> Self {
        self.params.n_threads = n;
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.params.chunk_size = n;
        self
    }

    pub fn machine_limit(mut self, n: u64) -> Self {
        self.params.machine_limit = Some(n);
        self
    }

    pub fn trace_output(mut self, v: bool) -> Self {
        self.params.trace_output = v;
        self
    }

    pub fn build(self) -> Params {
        self.params
    }
}
