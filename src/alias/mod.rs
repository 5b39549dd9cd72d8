#![forbid(unsafe_code)]

//! Classic Mac OS alias records.
//!
//! Finder stores the folder background picture as an alias record, either
//! in a `pict` record or under `backgroundImageAlias` in `icvp`. The record
//! is a fixed 150-byte prefix, a list of tagged items closed by tag
//! `0xFFFF`, and optional trailing data up to the declared size.

use serde::Serialize;

use crate::primitives::bytes::buf::Cursor;
use crate::storage::record::MacTimestamp;
use crate::types::{DsStoreError, FourCC, Result};

/// Bytes reserved for the volume name, length byte included.
pub const VOLUME_NAME_FIELD: usize = 28;
/// Bytes reserved for the file name, length byte included.
pub const FILE_NAME_FIELD: usize = 64;
/// Tag closing the item list.
pub const END_OF_LIST: u16 = 0xffff;

/// Whether the alias targets a file or a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    /// Plain file.
    File,
    /// Folder.
    Directory,
    /// Value outside the documented pair.
    Other(u16),
}

impl AliasKind {
    /// Maps the stored `u16`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::File,
            1 => Self::Directory,
            other => Self::Other(other),
        }
    }
}

/// Kind of volume the target lived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeType {
    /// Fixed hard disk.
    FixedHd,
    /// Network volume.
    NetworkDisk,
    /// 400K floppy.
    Floppy400K,
    /// 800K floppy.
    Floppy800K,
    /// 1.4M floppy.
    Floppy1_4M,
    /// Other ejectable media.
    OtherEjectableMedia,
    /// Value outside the documented set.
    Other(u16),
}

impl VolumeType {
    /// Maps the stored `u16`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::FixedHd,
            1 => Self::NetworkDisk,
            2 => Self::Floppy400K,
            3 => Self::Floppy800K,
            4 => Self::Floppy1_4M,
            5 => Self::OtherEjectableMedia,
            other => Self::Other(other),
        }
    }
}

/// Tag of an extra item following the fixed fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasItemTag {
    /// Name of the parent directory.
    DirectoryName,
    /// Chain of directory ids.
    DirectoryIds,
    /// Absolute path in colon notation.
    AbsolutePath,
    /// AppleShare zone.
    AppleShareZoneName,
    /// AppleShare server.
    AppleShareServerName,
    /// AppleShare user.
    AppleShareUserName,
    /// Driver name.
    DriverName,
    /// Revised AppleShare info.
    RevisedAppleShareInfo,
    /// AppleRemoteAccess dial-up info.
    AppleRemoteAccessDialupInfo,
    /// Target file name as UTF-16.
    FileNameUtf16,
    /// Volume name as UTF-16.
    VolumeNameUtf16,
    /// Path relative to the volume root.
    VolumeRelativePath,
    /// Volume mount point, NUL-terminated UTF-8.
    VolumeMountPointUtf8,
    /// Any other tag.
    Other(u16),
}

impl AliasItemTag {
    /// Maps the stored `u16`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::DirectoryName,
            1 => Self::DirectoryIds,
            2 => Self::AbsolutePath,
            3 => Self::AppleShareZoneName,
            4 => Self::AppleShareServerName,
            5 => Self::AppleShareUserName,
            6 => Self::DriverName,
            9 => Self::RevisedAppleShareInfo,
            10 => Self::AppleRemoteAccessDialupInfo,
            14 => Self::FileNameUtf16,
            15 => Self::VolumeNameUtf16,
            18 => Self::VolumeRelativePath,
            19 => Self::VolumeMountPointUtf8,
            other => Self::Other(other),
        }
    }
}

/// One tagged item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasItem {
    /// Item tag.
    pub tag: AliasItemTag,
    /// Raw tag value.
    pub raw_tag: u16,
    /// Item bytes without the even-length padding.
    #[serde(serialize_with = "crate::types::serialize_hex")]
    pub data: Vec<u8>,
    /// Decoded text for the UTF-16 name items.
    pub text: Option<String>,
}

impl AliasItem {
    fn decode_text(tag: AliasItemTag, data: &[u8]) -> Option<String> {
        match tag {
            AliasItemTag::FileNameUtf16 | AliasItemTag::VolumeNameUtf16 => {
                let mut cur = Cursor::new(data);
                let chars = cur.read_u16().ok()? as usize;
                cur.read_utf16(chars, "alias item").ok()
            }
            _ => None,
        }
    }
}

/// A parsed alias record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasRecord {
    /// Application-defined type, 0 for the Alias Manager.
    pub user_type: u32,
    /// Declared record size in bytes.
    pub alias_size: u16,
    /// Record format version, 2 in practice.
    pub version: u16,
    /// File or folder.
    pub kind: AliasKind,
    /// Volume name from the fixed fields.
    pub volume_name: String,
    /// Volume creation date.
    pub volume_date: MacTimestamp,
    /// Filesystem signature such as `H+`.
    pub volume_signature: u16,
    /// Kind of volume.
    pub volume_type: VolumeType,
    /// Parent directory id.
    pub parent_dir_id: u32,
    /// Target name from the fixed fields.
    pub file_name: String,
    /// Target file id.
    pub file_number: u32,
    /// Target creation date.
    pub file_date: MacTimestamp,
    /// Classic file type.
    pub file_type: FourCC,
    /// Classic creator code.
    pub file_creator: FourCC,
    /// Levels from the alias up to the common ancestor.
    pub nlvl_from: u16,
    /// Levels from the common ancestor down to the target.
    pub nlvl_to: u16,
    /// Volume attribute flags.
    pub volume_flags: u32,
    /// Volume filesystem id.
    pub volume_fs_id: u16,
    /// Tagged items in stored order, the end marker excluded.
    pub items: Vec<AliasItem>,
    /// Bytes between the end marker and `alias_size`.
    #[serde(serialize_with = "crate::types::serialize_hex")]
    pub trailing: Vec<u8>,
}

impl AliasRecord {
    /// Parses an alias record from `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let user_type = cur.read_u32()?;
        let alias_size = cur.read_u16()?;
        let version = cur.read_u16()?;
        let kind = AliasKind::from_u16(cur.read_u16()?);
        let volume_name = read_padded(&mut cur, VOLUME_NAME_FIELD, "volume name overflows its field")?;
        let volume_date = seconds(cur.read_u32()?);
        let volume_signature = cur.read_u16()?;
        let volume_type = VolumeType::from_u16(cur.read_u16()?);
        let parent_dir_id = cur.read_u32()?;
        let file_name = read_padded(&mut cur, FILE_NAME_FIELD, "file name overflows its field")?;
        let file_number = cur.read_u32()?;
        let file_date = seconds(cur.read_u32()?);
        let file_type = cur.read_fourcc()?;
        let file_creator = cur.read_fourcc()?;
        let nlvl_from = cur.read_u16()?;
        let nlvl_to = cur.read_u16()?;
        let volume_flags = cur.read_u32()?;
        let volume_fs_id = cur.read_u16()?;
        cur.skip(10)?;

        let mut items = Vec::new();
        loop {
            let raw_tag = cur.read_u16()?;
            let len = cur.read_u16()? as usize;
            let padded = cur.take(len + len % 2)?;
            if raw_tag == END_OF_LIST {
                break;
            }
            let tag = AliasItemTag::from_u16(raw_tag);
            let data = padded[..len].to_vec();
            let text = AliasItem::decode_text(tag, &data);
            items.push(AliasItem {
                tag,
                raw_tag,
                data,
                text,
            });
        }

        let trailing_len = (alias_size as usize).saturating_sub(cur.off);
        let trailing = cur.take(trailing_len)?.to_vec();

        Ok(Self {
            user_type,
            alias_size,
            version,
            kind,
            volume_name,
            volume_date,
            volume_signature,
            volume_type,
            parent_dir_id,
            file_name,
            file_number,
            file_date,
            file_type,
            file_creator,
            nlvl_from,
            nlvl_to,
            volume_flags,
            volume_fs_id,
            items,
            trailing,
        })
    }

    /// First item carrying `tag`.
    pub fn item(&self, tag: AliasItemTag) -> Option<&AliasItem> {
        self.items.iter().find(|item| item.tag == tag)
    }

    /// Best available target name: the UTF-16 item, else the fixed field.
    pub fn target_name(&self) -> &str {
        self.item(AliasItemTag::FileNameUtf16)
            .and_then(|item| item.text.as_deref())
            .unwrap_or(&self.file_name)
    }

    /// Best available volume name.
    pub fn target_volume(&self) -> &str {
        self.item(AliasItemTag::VolumeNameUtf16)
            .and_then(|item| item.text.as_deref())
            .unwrap_or(&self.volume_name)
    }
}

fn seconds(value: u32) -> MacTimestamp {
    MacTimestamp(u64::from(value) << 16)
}

/// Reads a length-prefixed string occupying exactly `field` bytes.
fn read_padded(cur: &mut Cursor<'_>, field: usize, overflow: &'static str) -> Result<String> {
    let len = cur.read_u8()? as usize;
    if len > field - 1 {
        return Err(DsStoreError::InvalidAlias(overflow));
    }
    let raw = cur.take(field - 1)?;
    Ok(String::from_utf8_lossy(&raw[..len]).into_owned())
}
