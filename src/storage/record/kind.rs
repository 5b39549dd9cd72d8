//! Static mapping from record-type tags to payload shapes.

use serde::Serialize;

use crate::types::FourCC;

/// Wire encoding of a record payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// `long`: 4-byte big-endian integer.
    Long,
    /// `shor`: 4 bytes, upper two conventionally zero.
    Short,
    /// `bool`: one byte.
    Bool,
    /// `blob`: 4-byte length then raw bytes.
    Blob,
    /// `type`: four-character code.
    Type,
    /// `ustr`: 4-byte character count then UTF-16BE.
    Text,
    /// `comp`: 8-byte big-endian integer.
    Comp,
    /// `dutc`: 8-byte count of 1/65536 s ticks since 1904.
    Date,
    /// `blob` whose bytes are a binary property list.
    PropertyList,
}

impl ValueShape {
    /// Data-type code a well-formed record of this shape carries.
    pub fn data_type(self) -> FourCC {
        match self {
            ValueShape::Long => FourCC::new(b"long"),
            ValueShape::Short => FourCC::new(b"shor"),
            ValueShape::Bool => FourCC::new(b"bool"),
            ValueShape::Blob | ValueShape::PropertyList => FourCC::new(b"blob"),
            ValueShape::Type => FourCC::new(b"type"),
            ValueShape::Text => FourCC::new(b"ustr"),
            ValueShape::Comp => FourCC::new(b"comp"),
            ValueShape::Date => FourCC::new(b"dutc"),
        }
    }
}

macro_rules! record_kinds {
    ($($variant:ident => $code:literal, $shape:ident;)+) => {
        /// Every record type this decoder understands.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        pub enum RecordKind {
            $(
                #[doc = concat!("Record type `", stringify!($code), "`.")]
                $variant,
            )+
        }

        impl RecordKind {
            /// All known kinds in table order.
            pub const ALL: &'static [RecordKind] = &[$(RecordKind::$variant),+];

            /// Maps a record-type tag to its kind.
            pub fn from_code(code: FourCC) -> Option<Self> {
                match code.as_bytes() {
                    $($code => Some(RecordKind::$variant),)+
                    _ => None,
                }
            }

            /// Record-type tag of this kind.
            pub fn code(self) -> FourCC {
                match self {
                    $(RecordKind::$variant => FourCC::new($code),)+
                }
            }

            /// Payload shape decoded for this kind.
            pub fn shape(self) -> ValueShape {
                match self {
                    $(RecordKind::$variant => ValueShape::$shape,)+
                }
            }
        }
    };
}

record_kinds! {
    Background => b"BKGD", Blob;
    IconViewOptionsFlag => b"ICVO", Bool;
    IconLocation => b"Iloc", Blob;
    ListViewOptionsFlag => b"LSVO", Bool;
    BrowserWindowSettings => b"bwsp", PropertyList;
    Comment => b"cmmt", Text;
    DesktopIconLocation => b"dilc", Blob;
    Disclosed => b"dscl", Bool;
    Extension => b"extn", Text;
    FinderWindowInfo => b"fwi0", Blob;
    SidebarWidth => b"fwsw", Long;
    WindowHeight => b"fwvh", Short;
    Group => b"GRP0", Text;
    IconView => b"icnv", Type;
    IconGridOptions => b"icgo", Blob;
    IconScrollPosition => b"icsp", Blob;
    IconViewOptions => b"icvo", Blob;
    IconViewSettings => b"icvp", PropertyList;
    IconTextSize => b"icvt", Short;
    Info => b"info", Blob;
    LogicalSize => b"logS", Comp;
    LogicalSizeV2 => b"lg1S", Comp;
    ListScrollPosition => b"lssp", Blob;
    ListViewOptions => b"lsvo", Blob;
    ListTextSize => b"lsvt", Short;
    ListViewSettings => b"lsvp", PropertyList;
    ListViewSettingsColumns => b"lsvP", PropertyList;
    ModificationDate => b"modD", Date;
    ModificationDateAlt => b"moDD", Date;
    SandboxBookmark => b"pBB0", Blob;
    Bookmark => b"pBBk", Blob;
    PhysicalSize => b"phyS", Comp;
    PhysicalSizeV2 => b"ph1S", Comp;
    BackgroundPicture => b"pict", Blob;
    ViewVersion => b"vSrn", Long;
    ViewStyle => b"vstl", Type;
}
