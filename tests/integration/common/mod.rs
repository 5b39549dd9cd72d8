//! Builders for synthetic `.DS_Store` files.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const ARENA_BASE: usize = 4;

/// Assembles an allocator arena: block 0 is the allocator info block, the
/// rest are handed out by [`StoreBuilder::block`].
pub struct StoreBuilder {
    blocks: Vec<Option<Vec<u8>>>,
    free: Vec<(u8, u32)>,
    directory: Vec<(String, u32)>,
    corrupt_backup: bool,
    prologue: u32,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            blocks: vec![None],
            free: Vec::new(),
            directory: Vec::new(),
            corrupt_backup: false,
            prologue: 1,
        }
    }

    /// Adds a block and returns its number.
    pub fn block(&mut self, bytes: Vec<u8>) -> u32 {
        self.blocks.push(Some(bytes));
        self.blocks.len() as u32 - 1
    }

    /// Registers a free block of size `2^class` at arena `offset`.
    pub fn free(&mut self, class: u8, offset: u32) -> &mut Self {
        self.free.push((class, offset));
        self
    }

    /// Adds a directory entry; `build` adds `DSDB` unless one is already present.
    pub fn directory(&mut self, name: &str, block: u32) -> &mut Self {
        self.directory.push((name.to_string(), block));
        self
    }

    pub fn corrupt_backup(&mut self) -> &mut Self {
        self.corrupt_backup = true;
        self
    }

    pub fn prologue(&mut self, value: u32) -> &mut Self {
        self.prologue = value;
        self
    }

    /// Lays out every block and writes the header and info block.
    pub fn build(&self, dsdb: Option<u32>) -> Vec<u8> {
        let mut directory = self.directory.clone();
        if let Some(meta) = dsdb {
            directory.push(("DSDB".to_string(), meta));
        }

        let count = self.blocks.len();
        let padded = count.div_ceil(256).max(1) * 256;
        let free_entries = self.free.len();
        let dir_len: usize = directory.iter().map(|(n, _)| 1 + n.len() + 4).sum();
        let info_len = 8 + padded * 4 + 4 + dir_len + 32 * 4 + free_entries * 4;

        // Arena offsets: header at 0, then blocks in order, info block last.
        let mut arena = vec![0u8; 32];
        let mut addrs = vec![0u32; count];
        for (number, block) in self.blocks.iter().enumerate().skip(1) {
            if let Some(bytes) = block {
                addrs[number] = place(&mut arena, bytes.len(), bytes);
            }
        }
        let info_offset = next_offset(&arena);
        let info_log2 = log2_for(info_len);
        addrs[0] = info_offset | u32::from(info_log2);

        let mut info = Vec::with_capacity(info_len);
        info.extend_from_slice(&(count as u32).to_be_bytes());
        info.extend_from_slice(&0u32.to_be_bytes());
        for i in 0..padded {
            info.extend_from_slice(&addrs.get(i).copied().unwrap_or(0).to_be_bytes());
        }
        info.extend_from_slice(&(directory.len() as u32).to_be_bytes());
        for (name, block) in &directory {
            info.push(name.len() as u8);
            info.extend_from_slice(name.as_bytes());
            info.extend_from_slice(&block.to_be_bytes());
        }
        for class in 0..32u8 {
            let offsets: Vec<u32> = self
                .free
                .iter()
                .filter(|(c, _)| *c == class)
                .map(|(_, o)| *o)
                .collect();
            info.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
            for offset in offsets {
                info.extend_from_slice(&offset.to_be_bytes());
            }
        }
        place(&mut arena, info.len(), &info);

        let info_size = 1u32 << info_log2;
        arena[0..4].copy_from_slice(b"Bud1");
        arena[4..8].copy_from_slice(&info_offset.to_be_bytes());
        arena[8..12].copy_from_slice(&info_size.to_be_bytes());
        let backup = if self.corrupt_backup {
            info_offset + 32
        } else {
            info_offset
        };
        arena[12..16].copy_from_slice(&backup.to_be_bytes());

        let mut file = self.prologue.to_be_bytes().to_vec();
        file.extend_from_slice(&arena);
        file
    }
}

fn log2_for(len: usize) -> u8 {
    len.max(32).next_power_of_two().trailing_zeros() as u8
}

fn next_offset(arena: &[u8]) -> u32 {
    (arena.len() as u32 + 31) & !31
}

/// Appends `bytes` padded to a power-of-two block and returns its address.
fn place(arena: &mut Vec<u8>, len: usize, bytes: &[u8]) -> u32 {
    let offset = next_offset(arena);
    let log2 = log2_for(len);
    arena.resize(offset as usize, 0);
    arena.extend_from_slice(bytes);
    arena.resize(offset as usize + (1usize << log2), 0);
    offset | u32::from(log2)
}

pub fn utf16(text: &str) -> (Vec<u8>, u32) {
    let units: Vec<u16> = text.encode_utf16().collect();
    let bytes = units.iter().flat_map(|u| u.to_be_bytes()).collect();
    (bytes, units.len() as u32)
}

/// Encodes a record with an already encoded payload.
pub fn record(filename: &str, record_type: &[u8; 4], data_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let (name, units) = utf16(filename);
    let mut out = units.to_be_bytes().to_vec();
    out.extend_from_slice(&name);
    out.extend_from_slice(record_type);
    out.extend_from_slice(data_type);
    out.extend_from_slice(payload);
    out
}

pub fn bool_record(filename: &str, record_type: &[u8; 4], value: bool) -> Vec<u8> {
    record(filename, record_type, b"bool", &[u8::from(value)])
}

pub fn long_record(filename: &str, record_type: &[u8; 4], value: u32) -> Vec<u8> {
    record(filename, record_type, b"long", &value.to_be_bytes())
}

pub fn blob_record(filename: &str, record_type: &[u8; 4], blob: &[u8]) -> Vec<u8> {
    let mut payload = (blob.len() as u32).to_be_bytes().to_vec();
    payload.extend_from_slice(blob);
    record(filename, record_type, b"blob", &payload)
}

pub fn ustr_record(filename: &str, record_type: &[u8; 4], text: &str) -> Vec<u8> {
    let (raw, units) = utf16(text);
    let mut payload = units.to_be_bytes().to_vec();
    payload.extend_from_slice(&raw);
    record(filename, record_type, b"ustr", &payload)
}

pub fn leaf(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = 0u32.to_be_bytes().to_vec();
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    for r in records {
        out.extend_from_slice(r);
    }
    out
}

pub fn internal(trailing: u32, pairs: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = trailing.to_be_bytes().to_vec();
    out.extend_from_slice(&(pairs.len() as u32).to_be_bytes());
    for (child, r) in pairs {
        out.extend_from_slice(&child.to_be_bytes());
        out.extend_from_slice(r);
    }
    out
}

pub fn tree_meta(root: u32, levels: u32, records: u32, nodes: u32) -> Vec<u8> {
    [root, levels, records, nodes, 4096]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect()
}

/// Single-leaf store holding the given records.
pub fn single_leaf_store(records: &[Vec<u8>]) -> Vec<u8> {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(records));
    let meta = builder.block(tree_meta(root, 0, records.len() as u32, 1));
    builder.build(Some(meta))
}

pub enum PlistObject {
    Str(&'static str),
    Data(Vec<u8>),
    Bool(bool),
}

/// Encodes a flat `bplist00` dictionary with one-byte refs.
pub fn bplist_dict(entries: &[(&'static str, PlistObject)]) -> Vec<u8> {
    let n = entries.len();
    let mut objects: Vec<Vec<u8>> = Vec::new();
    let mut dict = vec![0xd0 | n as u8];
    dict.extend((1..=n).map(|i| i as u8));
    dict.extend((n + 1..=2 * n).map(|i| i as u8));
    objects.push(dict);
    for (key, _) in entries {
        objects.push(encode_object(&PlistObject::Str(*key)));
    }
    for (_, value) in entries {
        objects.push(encode_object(value));
    }

    let mut out = b"bplist00".to_vec();
    let mut offsets = Vec::new();
    for obj in &objects {
        offsets.push(out.len() as u16);
        out.extend_from_slice(obj);
    }
    let table_offset = out.len() as u64;
    for off in offsets {
        out.extend_from_slice(&off.to_be_bytes());
    }
    out.extend_from_slice(&[0; 6]);
    out.push(2);
    out.push(1);
    out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&table_offset.to_be_bytes());
    out
}

fn encode_object(obj: &PlistObject) -> Vec<u8> {
    match obj {
        PlistObject::Bool(b) => vec![if *b { 0x09 } else { 0x08 }],
        PlistObject::Str(s) => with_length(0x50, s.as_bytes()),
        PlistObject::Data(d) => with_length(0x40, d),
    }
}

fn with_length(kind: u8, body: &[u8]) -> Vec<u8> {
    let mut out = if body.len() < 15 {
        vec![kind | body.len() as u8]
    } else {
        let mut v = vec![kind | 0x0f, 0x11];
        v.extend_from_slice(&(body.len() as u16).to_be_bytes());
        v
    };
    out.extend_from_slice(body);
    out
}

/// Minimal alias record pointing at `file_name` on `volume`.
pub fn alias_bytes(volume: &str, file_name: &str) -> Vec<u8> {
    fn padded(text: &str, field: usize) -> Vec<u8> {
        let mut out = vec![text.len() as u8];
        out.extend_from_slice(text.as_bytes());
        out.resize(field, 0);
        out
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&padded(volume, 28));
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(b"H+");
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&2u32.to_be_bytes());
    out.extend_from_slice(&padded(file_name, 64));
    out.extend_from_slice(&[0; 16]);
    out.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&[0; 10]);

    let (name, units) = utf16(file_name);
    let mut item = (units as u16).to_be_bytes().to_vec();
    item.extend_from_slice(&name);
    out.extend_from_slice(&14u16.to_be_bytes());
    out.extend_from_slice(&(item.len() as u16).to_be_bytes());
    out.extend_from_slice(&item);
    out.extend_from_slice(&[0xff, 0xff, 0, 0]);

    let size = out.len() as u16;
    out[4..6].copy_from_slice(&size.to_be_bytes());
    out
}

/// Writes `bytes` as `.DS_Store` inside a fresh temporary directory.
pub fn write_store(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(".DS_Store");
    std::fs::write(&path, bytes).expect("write store");
    (dir, path)
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("read store")
}
