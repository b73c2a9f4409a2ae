//! Seed-database reader: random-access fetch of a machine's transition spec
//! (spec.md §3 "Seed reader", §6 "Seed-database file").
//!
//! Ported from the original's `TuringMachineReader` (`bbchallenge.h`): the
//! original 5-state seed database has a
//! `[nTimeLimited u32][nSpaceLimited u32][nMachines u32]` header followed by
//! 30-byte records; other machine sizes use fixed-width `6N`-byte binary
//! records with no header. Reads use absolute offsets (`pread`-equivalent)
//! so concurrent readers never disturb each other's file position (spec.md
//! §5 "Shared resources").

use std::fs::File;
use std::io::Read;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

use crate::tm::transition::TransitionTable;

/// Header of the original 5-state seed database
/// (`all_5_states_undecided_machines_with_global_header`).
#[derive(Debug, Clone, Copy)]
pub struct OriginalHeader {
    pub n_time_limited: u32,
    pub n_space_limited: u32,
    pub n_machines: u32,
}

const ORIGINAL_HEADER_BYTES: usize = 12;
const ORIGINAL_RECORD_BYTES: usize = 30;
const ORIGINAL_STATES: u32 = 5;

/// Random-access seed-database reader. Read-only for the lifetime of the
/// driver; workers share `&SeedDatabase` across threads.
pub struct SeedDatabase {
    file: File,
    n_states: u32,
    header: Option<OriginalHeader>,
    record_bytes: usize,
    /// Byte offset of record 0 (after any header).
    base_offset: u64,
}

impl SeedDatabase {
    /// Opens a seed database for machines with `n_states` states. If
    /// `n_states == 5`, tries to read the original header first; pass
    /// `force_headerless` to skip that and treat the file as a plain
    /// fixed-width record stream regardless of state count.
    pub fn open(path: &str, n_states: u32, force_headerless: bool) -> anyhow::Result<Self> {
        let mut file = File::open(path)?;
        let record_bytes = 6 * n_states as usize;

        if n_states == ORIGINAL_STATES && !force_headerless {
            let mut header_bytes = [0u8; ORIGINAL_HEADER_BYTES];
            if file.read_exact(&mut header_bytes).is_ok() {
                let n_time_limited = u32::from_be_bytes(header_bytes[0..4].try_into().unwrap());
                let n_space_limited = u32::from_be_bytes(header_bytes[4..8].try_into().unwrap());
                let n_machines = u32::from_be_bytes(header_bytes[8..12].try_into().unwrap());
                if n_machines == n_time_limited + n_space_limited {
                    return Ok(Self {
                        file,
                        n_states,
                        header: Some(OriginalHeader {
                            n_time_limited,
                            n_space_limited,
                            n_machines,
                        }),
                        record_bytes: ORIGINAL_RECORD_BYTES,
                        base_offset: ORIGINAL_HEADER_BYTES as u64,
                    });
                }
            }
        }

        Ok(Self {
            file,
            n_states,
            header: None,
            record_bytes,
            base_offset: 0,
        })
    }

    pub fn header(&self) -> Option<OriginalHeader> {
        self.header
    }

    pub fn n_machines(&self) -> u64 {
        match self.header {
            Some(h) => h.n_machines as u64,
            None => {
                let len = self.file.metadata().map(|m| m.len()).unwrap_or(0);
                (len - self.base_offset) / self.record_bytes as u64
            }
        }
    }

    fn offset_of(&self, index: u32) -> u64 {
        self.base_offset + self.record_bytes as u64 * index as u64
    }

    /// Fetches a single machine's transition table by index.
    #[cfg(unix)]
    pub fn read_machine(&self, index: u32) -> anyhow::Result<TransitionTable> {
        anyhow::ensure!(
            (index as u64) < self.n_machines(),
            "invalid machine index {index}"
        );
        let mut buf = vec![0u8; self.record_bytes];
        self.file.read_exact_at(&mut buf, self.offset_of(index))?;
        TransitionTable::from_packed_bytes(self.n_states, &buf)
    }

    #[cfg(not(unix))]
    pub fn read_machine(&self, index: u32) -> anyhow::Result<TransitionTable> {
        use std::io::{Seek, SeekFrom};
        anyhow::ensure!(
            (index as u64) < self.n_machines(),
            "invalid machine index {index}"
        );
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(self.offset_of(index)))?;
        let mut buf = vec![0u8; self.record_bytes];
        file.read_exact(&mut buf)?;
        TransitionTable::from_packed_bytes(self.n_states, &buf)
    }

    /// Fetches a contiguous run of `count` machines starting at `start`, in
    /// one read, for a worker's chunk.
    #[cfg(unix)]
    pub fn read_chunk(&self, start: u32, count: u32) -> anyhow::Result<Vec<TransitionTable>> {
        anyhow::ensure!(
            (start as u64 + count as u64) <= self.n_machines(),
            "chunk [{start}, {})  exceeds database size",
            start as u64 + count as u64
        );
        let mut buf = vec![0u8; self.record_bytes * count as usize];
        self.file.read_exact_at(&mut buf, self.offset_of(start))?;
        buf.chunks_exact(self.record_bytes)
            .map(|chunk| TransitionTable::from_packed_bytes(self.n_states, chunk))
            .collect()
    }

    #[cfg(not(unix))]
    pub fn read_chunk(&self, start: u32, count: u32) -> anyhow::Result<Vec<TransitionTable>> {
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count {
            out.push(self.read_machine(start + i)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_headerless_db(path: &std::path::Path, n_states: u32, machines: &[&str]) {
        let mut file = File::create(path).unwrap();
        for m in machines {
            let table = TransitionTable::from_standard_tm_text(m).unwrap();
            file.write_all(&table.to_packed_bytes()).unwrap();
        }
    }

    #[test]
    fn reads_headerless_generic_database() {
        let dir = std::env::temp_dir().join(format!("bb_seed_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("seed_generic.bin");
        write_headerless_db(&path, 2, &["1RB1LB_1LA1RZ", "1RB0LB_1LA1RZ"]);

        let db = SeedDatabase::open(path.to_str().unwrap(), 2, true).unwrap();
        assert_eq!(db.n_machines(), 2);
        let m0 = db.read_machine(0).unwrap();
        assert_eq!(m0.to_standard_tm_text(), "1RB1LB_1LA1RZ");
        let chunk = db.read_chunk(0, 2).unwrap();
        assert_eq!(chunk.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reads_original_header_for_5_state_db() {
        let dir = std::env::temp_dir().join(format!("bb_seed_test2_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("seed_5state.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(&1u32.to_be_bytes()).unwrap();
        file.write_all(&0u32.to_be_bytes()).unwrap();
        file.write_all(&1u32.to_be_bytes()).unwrap();
        let table =
            TransitionTable::from_standard_tm_text("1RB1LC_1RC1RB_1RD0LE_1LA1LD_1RZ0LA").unwrap();
        file.write_all(&table.to_packed_bytes()).unwrap();

        let db = SeedDatabase::open(path.to_str().unwrap(), 5, false).unwrap();
        let header = db.header().unwrap();
        assert_eq!(header.n_machines, 1);
        assert_eq!(db.n_machines(), 1);
        let m0 = db.read_machine(0).unwrap();
        assert_eq!(m0.n_states(), 5);
        let _ = std::fs::remove_file(&path);
    }
}
