use little_exif::exif_tag::ExifTag;

/// Character-code prefix for a UserComment stored as UCS-2/UTF-16.
const UNICODE_PREFIX: &[u8; 8] = b"UNICODE\0";

/// EXIF block a tag is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// IFD0, the primary image block.
    Primary,
    /// The Exif sub-IFD holding capture details.
    CaptureDetail,
}

/// The tags that can be set from the `[EXIF]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
    Artist,
    Copyright,
    Make,
    Model,
    Software,
    DateTimeOriginal,
    UserComment,
    LensMake,
    LensModel,
}

impl TagName {
    pub const ALL: [TagName; 9] = [
        TagName::Artist,
        TagName::Copyright,
        TagName::Make,
        TagName::Model,
        TagName::Software,
        TagName::DateTimeOriginal,
        TagName::UserComment,
        TagName::LensMake,
        TagName::LensModel,
    ];

    /// Match a config key, ignoring case.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "artist" => Some(Self::Artist),
            "copyright" => Some(Self::Copyright),
            "make" => Some(Self::Make),
            "model" => Some(Self::Model),
            "software" => Some(Self::Software),
            "datetimeoriginal" => Some(Self::DateTimeOriginal),
            "usercomment" => Some(Self::UserComment),
            "lensmake" => Some(Self::LensMake),
            "lensmodel" => Some(Self::LensModel),
            _ => None,
        }
    }

    /// The lowercase key used in config files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Copyright => "copyright",
            Self::Make => "make",
            Self::Model => "model",
            Self::Software => "software",
            Self::DateTimeOriginal => "datetimeoriginal",
            Self::UserComment => "usercomment",
            Self::LensMake => "lensmake",
            Self::LensModel => "lensmodel",
        }
    }

    /// The EXIF tag name, as shown by exiftool and friends.
    pub fn exif_name(&self) -> &'static str {
        match self {
            Self::Artist => "Artist",
            Self::Copyright => "Copyright",
            Self::Make => "Make",
            Self::Model => "Model",
            Self::Software => "Software",
            Self::DateTimeOriginal => "DateTimeOriginal",
            Self::UserComment => "UserComment",
            Self::LensMake => "LensMake",
            Self::LensModel => "LensModel",
        }
    }

    /// Numeric TIFF tag id.
    pub fn tag_id(&self) -> u16 {
        match self {
            Self::Artist => 0x013B,
            Self::Copyright => 0x8298,
            Self::Make => 0x010F,
            Self::Model => 0x0110,
            Self::Software => 0x0131,
            Self::DateTimeOriginal => 0x9003,
            Self::UserComment => 0x9286,
            Self::LensMake => 0xA433,
            Self::LensModel => 0xA434,
        }
    }

    pub fn block(&self) -> Block {
        match self {
            Self::Artist | Self::Copyright | Self::Make | Self::Model | Self::Software => {
                Block::Primary
            }
            Self::DateTimeOriginal | Self::UserComment | Self::LensMake | Self::LensModel => {
                Block::CaptureDetail
            }
        }
    }

    /// Build the little_exif tag carrying `value`.
    pub fn to_exif_tag(&self, value: &str) -> ExifTag {
        let text = value.to_string();
        match self {
            Self::Artist => ExifTag::Artist(text),
            Self::Copyright => ExifTag::Copyright(text),
            Self::Make => ExifTag::Make(text),
            Self::Model => ExifTag::Model(text),
            Self::Software => ExifTag::Software(text),
            Self::DateTimeOriginal => ExifTag::DateTimeOriginal(text),
            Self::UserComment => ExifTag::UserComment(encode_user_comment(value)),
            Self::LensMake => ExifTag::LensMake(text),
            Self::LensModel => ExifTag::LensModel(text),
        }
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.exif_name())
    }
}

/// One `key = value` line from the `[EXIF]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub key: String,
    pub value: String,
}

impl TagEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn tag(&self) -> Option<TagName> {
        TagName::parse(&self.key)
    }
}

/// Encode a UserComment value: `UNICODE\0` followed by UTF-16BE text.
pub fn encode_user_comment(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(UNICODE_PREFIX.len() + value.len() * 2);
    bytes.extend_from_slice(UNICODE_PREFIX);
    bytes.extend(value.encode_utf16().flat_map(|c| c.to_be_bytes()));
    bytes
}

/// Build the GUI's automatic UserComment from the camera and lens model.
///
/// Returns `None` when both are empty so an existing comment is left alone.
pub fn compose_user_comment(camera_model: &str, lens_model: &str) -> Option<String> {
    let mut parts = Vec::new();
    if !camera_model.trim().is_empty() {
        parts.push(format!("{} Camera", camera_model.trim()));
    }
    if !lens_model.trim().is_empty() {
        parts.push(format!("{} Lens", lens_model.trim()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}
