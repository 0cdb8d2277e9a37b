//! Binary model file.
//!
//! ```text
//! header   num_single:u32  order:u32  dual:u8
//! sizes    order × u32                      entries per table, unigrams first
//! blocks   for n in 1..=order, size[n] records of
//!            n × width × u16                symbol fields (ch[, syllable])
//!            count:u32
//! ```
//!
//! All integers are little-endian. There is no magic or version: the
//! reader must already know which symbol mode it expects.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use memmap2::Mmap;
use serde::Serialize;

use super::{NGramCounts, NGramTable};
use crate::symbol::{NGramKey, Symbol, SymbolMode, MAX_ORDER};

const HEADER_SIZE: usize = 4 + 4 + 1;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header")]
    InvalidHeader,

    #[error("unsupported n-gram order: {0}")]
    UnsupportedOrder(u32),

    #[error("model file is {} but {} was expected", mode_name(.file_dual), mode_name(.expected_dual))]
    ModelModeMismatch { file_dual: bool, expected_dual: bool },

    #[error("truncated model file: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("{0} trailing bytes after the last table")]
    TrailingBytes(u64),

    #[error("duplicate entry in order-{0} table")]
    DuplicateEntry(usize),
}

fn mode_name(dual: &bool) -> &'static str {
    SymbolMode::from_dual(*dual).name()
}

/// Fixed-size prefix of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelHeader {
    pub num_single: u32,
    pub order: usize,
    pub mode: SymbolMode,
}

impl ModelHeader {
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::InvalidHeader);
        }
        let num_single = read_u32(data, 0);
        let raw_order = read_u32(data, 4);
        let mode = match data[8] {
            0 => SymbolMode::Single,
            1 => SymbolMode::Dual,
            _ => return Err(CodecError::InvalidHeader),
        };
        let order = raw_order as usize;
        if !(1..=MAX_ORDER).contains(&order) {
            return Err(CodecError::UnsupportedOrder(raw_order));
        }
        Ok(Self {
            num_single,
            order,
            mode,
        })
    }
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn record_len(n: usize, mode: SymbolMode) -> u64 {
    (n * mode.width() * 2 + 4) as u64
}

impl NGramCounts {
    /// Parse a model file, refusing one written under a different symbol mode.
    pub fn from_bytes(data: &[u8], expected: SymbolMode) -> Result<Self, CodecError> {
        let header = ModelHeader::parse(data)?;
        if header.mode != expected {
            return Err(CodecError::ModelModeMismatch {
                file_dual: header.mode.is_dual(),
                expected_dual: expected.is_dual(),
            });
        }
        let order = header.order;
        let mode = header.mode;

        let sizes_end = HEADER_SIZE + order * 4;
        if data.len() < sizes_end {
            return Err(CodecError::Truncated {
                expected: sizes_end as u64,
                actual: data.len() as u64,
            });
        }
        let sizes: Vec<usize> = (0..order)
            .map(|k| read_u32(data, HEADER_SIZE + k * 4) as usize)
            .collect();

        let expected_len = sizes
            .iter()
            .enumerate()
            .fold(sizes_end as u64, |acc, (k, &size)| {
                acc + size as u64 * record_len(k + 1, mode)
            });
        let actual_len = data.len() as u64;
        if actual_len < expected_len {
            return Err(CodecError::Truncated {
                expected: expected_len,
                actual: actual_len,
            });
        }
        if actual_len > expected_len {
            return Err(CodecError::TrailingBytes(actual_len - expected_len));
        }

        let mut pos = sizes_end;
        let mut tables = Vec::with_capacity(order);
        let mut window = Vec::with_capacity(order);
        for (k, &size) in sizes.iter().enumerate() {
            let n = k + 1;
            let mut table = NGramTable::with_capacity(size);
            for _ in 0..size {
                window.clear();
                for _ in 0..n {
                    let ch = read_u16(data, pos);
                    pos += 2;
                    let syllable = match mode {
                        SymbolMode::Single => 0,
                        SymbolMode::Dual => {
                            let s = read_u16(data, pos);
                            pos += 2;
                            s
                        }
                    };
                    window.push(Symbol::new(ch, syllable));
                }
                let count = read_u32(data, pos);
                pos += 4;
                if table
                    .insert(NGramKey::from_symbols(&window), count)
                    .is_some()
                {
                    return Err(CodecError::DuplicateEntry(n));
                }
            }
            tables.push(table);
        }

        Ok(Self::from_parts(order, mode, header.num_single, tables))
    }

    /// Serialize to the binary layout.
    ///
    /// Records within a block are sorted by key, so equal tables always
    /// produce identical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mode = self.mode;
        let body: u64 = self
            .tables
            .iter()
            .enumerate()
            .map(|(k, t)| t.len() as u64 * record_len(k + 1, mode))
            .sum();
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.order * 4 + body as usize);

        buf.extend_from_slice(&self.num_single.to_le_bytes());
        buf.extend_from_slice(&(self.order as u32).to_le_bytes());
        buf.push(u8::from(mode.is_dual()));
        for table in &self.tables {
            buf.extend_from_slice(&(table.len() as u32).to_le_bytes());
        }

        for (k, table) in self.tables.iter().enumerate() {
            let mut entries: Vec<(&NGramKey, &u32)> = table.iter().collect();
            entries.sort_unstable_by_key(|&(key, _)| *key);
            for (key, count) in entries {
                for symbol in key.symbols(k + 1) {
                    buf.extend_from_slice(&symbol.ch.to_le_bytes());
                    if mode.is_dual() {
                        buf.extend_from_slice(&symbol.syllable.to_le_bytes());
                    }
                }
                buf.extend_from_slice(&count.to_le_bytes());
            }
        }
        buf
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), CodecError> {
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, self.to_bytes())?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a model file through a read-only memory map.
    pub fn open(path: &Path, expected: SymbolMode) -> Result<Self, CodecError> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(CodecError::InvalidHeader);
        }
        // SAFETY: the mapping is read-only and dropped before this function
        // returns; every table is copied into owned memory while parsing.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap, expected)
    }
}

/// Read only the header of a model file.
pub fn read_header(path: &Path) -> Result<ModelHeader, CodecError> {
    use std::io::Read;
    let mut buf = [0u8; HEADER_SIZE];
    File::open(path)?
        .read_exact(&mut buf)
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::InvalidHeader,
            _ => CodecError::Io(e),
        })?;
    ModelHeader::parse(&buf)
}
