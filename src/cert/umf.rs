//! Undecided-machines file (umf): spec.md §6.
//!
//! A sequence of `seed_index u32` in input order. The original 5-state
//! seed-database variant prefixes `[nTimeLimited][nSpaceLimited]`; the
//! generic variant has no header. We always write the generic (headerless)
//! form here and let the CLI layer prepend the original header when the
//! `-N5` original seed database is in use, since that header duplicates
//! information already recorded in the dvf/seed database rather than being
//! intrinsic to "list of undecided indices".

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

pub struct UmfWriter {
    file: BufWriter<File>,
    count: u64,
}

impl UmfWriter {
    pub fn create(path: &str) -> io::Result<Self> {
        Ok(Self {
            file: BufWriter::new(File::create(path)?),
            count: 0,
        })
    }

    /// Prepends the original 5-state header
    /// (`[nTimeLimited u32][nSpaceLimited u32]`) before any indices are
    /// written.
    pub fn write_original_header(&mut self, n_time_limited: u32, n_space_limited: u32) -> io::Result<()> {
        self.file.write_all(&n_time_limited.to_be_bytes())?;
        self.file.write_all(&n_space_limited.to_be_bytes())
    }

    pub fn write_index(&mut self, seed_index: u32) -> io::Result<()> {
        self.file.write_all(&seed_index.to_be_bytes())?;
        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<u64> {
        self.file.flush()?;
        Ok(self.count)
    }
}

pub fn read_umf(path: &str) -> io::Result<Vec<u32>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut indices = Vec::new();
    let mut buf = [0u8; 4];
    loop {
        match file.read_exact(&mut buf) {
            Ok(()) => indices.push(u32::from_be_bytes(buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_indices_in_order() {
        let path = std::env::temp_dir().join(format!("bb_umf_test_{}.umf", std::process::id()));
        let path_str = path.to_str().unwrap();

        let mut w = UmfWriter::create(path_str).unwrap();
        for i in [3u32, 7, 100, 4294967295] {
            w.write_index(i).unwrap();
        }
        assert_eq!(w.finish().unwrap(), 4);

        let indices = read_umf(path_str).unwrap();
        assert_eq!(indices, vec![3, 7, 100, 4294967295]);

        let _ = std::fs::remove_file(&path);
    }
}
