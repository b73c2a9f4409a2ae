//! Decided-verification file (dvf): spec.md §6.
//!
//! `[nDecided u32]` then `nDecided` entries of
//! `[seed_index u32][decider_tag u32][info_length u32][info[info_length]]`.
//! Written by the driver thread only (spec.md §5 "Shared resources");
//! entries are appended in input-index order within a chunk, and chunks are
//! written in worker-assignment order, so the file ends up index-ordered
//! overall.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};

use crate::cert::tags::DeciderTag;

#[derive(Debug, Clone)]
pub struct DvfEntry {
    pub seed_index: u32,
    pub tag: DeciderTag,
    pub info: Vec<u8>,
}

/// Streaming dvf writer. A zero placeholder header is written up front and
/// patched with the true count on [`DvfWriter::finish`], matching the
/// original's "write dummy header, seek back and rewrite" approach
/// (`Cyclers.cpp`).
pub struct DvfWriter {
    file: BufWriter<File>,
    n_decided: u32,
}

impl DvfWriter {
    pub fn create(path: &str) -> io::Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&0u32.to_be_bytes())?;
        Ok(Self {
            file,
            n_decided: 0,
        })
    }

    pub fn write_entry(&mut self, entry: &DvfEntry) -> io::Result<()> {
        self.file.write_all(&entry.seed_index.to_be_bytes())?;
        self.file.write_all(&entry.tag.as_u32().to_be_bytes())?;
        self.file.write_all(&(entry.info.len() as u32).to_be_bytes())?;
        self.file.write_all(&entry.info)?;
        self.n_decided += 1;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<u32> {
        self.file.flush()?;
        let mut file = self.file.into_inner()?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&self.n_decided.to_be_bytes())?;
        file.flush()?;
        Ok(self.n_decided)
    }
}

/// Reads a full dvf into memory. Verifiers replay each entry independently,
/// so batch loading is simplest; the file is produced in one run and never
/// appended to afterwards.
pub fn read_dvf(path: &str) -> anyhow::Result<Vec<DvfEntry>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut header = [0u8; 4];
    file.read_exact(&mut header)?;
    let n_decided = u32::from_be_bytes(header);

    let mut entries = Vec::with_capacity(n_decided as usize);
    for _ in 0..n_decided {
        let mut head = [0u8; 12];
        file.read_exact(&mut head)?;
        let seed_index = u32::from_be_bytes(head[0..4].try_into().unwrap());
        let tag_raw = u32::from_be_bytes(head[4..8].try_into().unwrap());
        let info_length = u32::from_be_bytes(head[8..12].try_into().unwrap()) as usize;
        let tag = DeciderTag::from_u32(tag_raw)
            .ok_or_else(|| anyhow::anyhow!("unknown decider tag {tag_raw}"))?;
        let mut info = vec![0u8; info_length];
        file.read_exact(&mut info)?;
        entries.push(DvfEntry {
            seed_index,
            tag,
            info,
        });
    }
    Ok(entries)
}
