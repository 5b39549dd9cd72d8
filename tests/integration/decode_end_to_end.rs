#![allow(missing_docs)]

mod common;

use common::*;
use dsstore::{
    alias::AliasItemTag,
    plist::PlistValue,
    storage::freespace::{check_consistency, FreeRange},
    BinaryPlistDecoder, DecodeOptions, DsStore, DsStoreError, FourCC, RecordValue,
};

#[test]
fn minimal_store_decodes_single_bool_record() {
    let bytes = single_leaf_store(&[bool_record("x", b"ICVO", true)]);
    let store = DsStore::decode(&bytes).expect("decode");

    assert_eq!(store.prologue, 1);
    assert_eq!(store.header.info_block_offset, store.header.info_block_offset_backup);
    let records: Vec<_> = store.records().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "x");
    assert_eq!(records[0].record_type, FourCC::new(b"ICVO"));
    assert_eq!(records[0].value, RecordValue::Bool(true));
    store.btree.verify_counts().expect("counts match");
    assert!(store.free_ranges.is_empty());
}

#[test]
fn mixed_payload_shapes_decode_in_order() {
    let bytes = single_leaf_store(&[
        ustr_record(".", b"cmmt", "folder note"),
        long_record(".", b"vSrn", 1),
        blob_record("a.txt", b"Iloc", &[0, 0, 0, 10, 0, 0, 0, 20, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0]),
        record("a.txt", b"modD", b"dutc", &0u64.to_be_bytes()),
        record("a.txt", b"vstl", b"type", b"icnv"),
    ]);
    let store = DsStore::decode(&bytes).expect("decode");
    let values: Vec<_> = store.records().map(|r| &r.value).collect();

    assert_eq!(values[0], &RecordValue::Text("folder note".to_string()));
    assert_eq!(values[1], &RecordValue::Long(1));
    assert_eq!(values[2].as_bytes().map(<[u8]>::len), Some(16));
    match values[3] {
        RecordValue::Date(ts) => {
            let dt = ts.to_datetime().expect("in range");
            assert_eq!(dt.year(), 1904);
            assert_eq!(dt.unix_timestamp(), -2_082_844_800);
        }
        other => panic!("expected date, got {other:?}"),
    }
    assert_eq!(values[4], &RecordValue::Type(FourCC::new(b"icnv")));
}

#[test]
fn background_alias_is_resolved_from_icvp() {
    let alias = alias_bytes("Macintosh HD", "bg.png");
    let plist = bplist_dict(&[
        ("backgroundImageAlias", PlistObject::Data(alias)),
        ("backgroundType", PlistObject::Str("picture")),
        ("showIconPreview", PlistObject::Bool(true)),
    ]);
    let bytes = single_leaf_store(&[blob_record(".", b"icvp", &plist)]);
    let store = DsStore::decode(&bytes).expect("decode");

    let record = store.records().next().expect("one record");
    let dict = record.value.as_plist().and_then(PlistValue::as_dictionary).expect("dict");
    assert_eq!(dict.get("backgroundType").and_then(PlistValue::as_str), Some("picture"));
    assert_eq!(dict.get("showIconPreview").and_then(PlistValue::as_bool), Some(true));

    let alias = store.background_alias().expect("alias parses").expect("alias present");
    assert_eq!(alias.volume_name, "Macintosh HD");
    assert_eq!(alias.target_name(), "bg.png");
    assert!(alias.item(AliasItemTag::FileNameUtf16).is_some());
}

#[test]
fn raw_plist_option_keeps_blob() {
    let plist = bplist_dict(&[("ShowStatusBar", PlistObject::Bool(false))]);
    let bytes = single_leaf_store(&[blob_record(".", b"bwsp", &plist)]);
    let options = DecodeOptions::default().decode_embedded_plists(false);
    let store = DsStore::decode_with(&bytes, &options, &BinaryPlistDecoder).expect("decode");
    let record = store.records().next().expect("record");
    assert_eq!(record.value, RecordValue::Blob(plist));
}

#[test]
fn free_list_is_coalesced() {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[bool_record("x", b"dscl", false)]));
    let meta = builder.block(tree_meta(root, 0, 1, 1));
    builder.free(5, 0x1000).free(5, 0x1020).free(6, 0x1040).free(10, 0x2000);
    let store = DsStore::decode(&builder.build(Some(meta))).expect("decode");

    assert_eq!(
        store.free_ranges,
        vec![
            FreeRange { start: 0x1000, end: 0x1080 },
            FreeRange { start: 0x2000, end: 0x2400 },
        ]
    );
    assert_eq!(store.total_free(), 0x80 + 0x400);
    check_consistency(&store.free_ranges).expect("no overlaps");
}

#[test]
fn mismatched_backup_offset_is_rejected() {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[]));
    let meta = builder.block(tree_meta(root, 0, 0, 1));
    builder.corrupt_backup();
    assert!(matches!(
        DsStore::decode(&builder.build(Some(meta))),
        Err(DsStoreError::InvalidHeader(_))
    ));
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = single_leaf_store(&[]);
    bytes[ARENA_BASE..ARENA_BASE + 4].copy_from_slice(b"Bud2");
    assert!(matches!(
        DsStore::decode(&bytes),
        Err(DsStoreError::InvalidHeader(_))
    ));
}

#[test]
fn missing_dsdb_entry_is_reported() {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[]));
    let meta = builder.block(tree_meta(root, 0, 0, 1));
    builder.directory("OTHR", meta);
    match DsStore::decode(&builder.build(None)) {
        Err(DsStoreError::MissingDirectoryEntry(name)) => assert_eq!(name, "DSDB"),
        other => panic!("expected missing entry, got {other:?}"),
    }
}

#[test]
fn unknown_record_type_fails_decode() {
    let bytes = single_leaf_store(&[bool_record("x", b"zzzz", true)]);
    assert!(matches!(
        DsStore::decode(&bytes),
        Err(DsStoreError::UnknownRecordType(code)) if code == FourCC::new(b"zzzz")
    ));
}

#[test]
fn unexpected_prologue_is_tolerated() {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[bool_record("x", b"ICVO", false)]));
    let meta = builder.block(tree_meta(root, 0, 1, 1));
    builder.prologue(7);
    let store = DsStore::decode(&builder.build(Some(meta))).expect("decode");
    assert_eq!(store.prologue, 7);
}

#[test]
fn truncated_file_is_out_of_bounds() {
    let bytes = single_leaf_store(&[bool_record("x", b"ICVO", true)]);
    for len in [0, 3, 20] {
        assert!(DsStore::decode(&bytes[..len]).is_err(), "length {len}");
    }
    let store = DsStore::decode(&bytes).expect("decode");
    let info_start = ARENA_BASE + store.header.info_block_offset as usize;
    assert!(matches!(
        DsStore::decode(&bytes[..info_start + 100]),
        Err(DsStoreError::OutOfBounds { .. })
    ));
}

#[test]
fn open_reads_from_disk() {
    let bytes = single_leaf_store(&[bool_record("x", b"ICVO", true)]);
    let (_dir, path) = write_store(&bytes);
    let store = DsStore::open(&path).expect("open");
    assert_eq!(store.records().count(), 1);
    assert_eq!(read(&path), bytes);

    let missing = path.with_file_name("absent");
    assert!(matches!(DsStore::open(missing), Err(DsStoreError::Io(_))));
}

#[test]
fn output_serializes_to_json() {
    let bytes = single_leaf_store(&[
        bool_record("x", b"ICVO", true),
        blob_record("x", b"Iloc", &[1, 2, 3]),
    ]);
    let store = DsStore::decode(&bytes).expect("decode");
    let json = serde_json::to_value(&store).expect("json");
    assert_eq!(json["btree"]["meta"]["num_records"], 2);
    let records = &json["btree"]["root"]["records"];
    assert_eq!(records[0]["record_type"], "ICVO");
    assert_eq!(records[0]["value"]["type"], "bool");
    assert_eq!(records[1]["value"]["value"], "010203");
}
