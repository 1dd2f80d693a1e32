//! Direct IFD editing of an EXIF TIFF block.
//!
//! Used when little_exif cannot parse an existing block (vendor IFDs, odd
//! MakerNotes) and for TIFF files. The original bytes are kept as they are;
//! rewritten IFD0 and Exif sub-IFD tables are appended at the end and the
//! pointers are moved to them, so every offset in the original stays valid.

use anyhow::{Context, Result, bail};

use super::tags::{Block, TagName, encode_user_comment};

const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const FORMAT_ASCII: u16 = 2;
const FORMAT_LONG: u16 = 4;
const FORMAT_UNDEFINED: u16 = 7;
const ENTRY_LEN: usize = 12;

type RawEntry = [u8; ENTRY_LEN];

#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Read the byte order from a TIFF header and check the magic number.
    fn detect(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            bail!("TIFF data too short");
        }
        let order = match &data[0..2] {
            b"II" => Self::Little,
            b"MM" => Self::Big,
            _ => bail!("Invalid TIFF byte order"),
        };
        if order.u16(data, 2)? != 42 {
            bail!("Invalid TIFF magic number");
        }
        Ok(order)
    }

    fn u16(self, data: &[u8], offset: usize) -> Result<u16> {
        let bytes: [u8; 2] = data
            .get(offset..offset + 2)
            .and_then(|s| s.try_into().ok())
            .context("TIFF read out of bounds")?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32(self, data: &[u8], offset: usize) -> Result<u32> {
        let bytes: [u8; 4] = data
            .get(offset..offset + 4)
            .and_then(|s| s.try_into().ok())
            .context("TIFF read out of bounds")?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }

    fn put_u16(self, val: u16) -> [u8; 2] {
        match self {
            Self::Little => val.to_le_bytes(),
            Self::Big => val.to_be_bytes(),
        }
    }

    fn put_u32(self, val: u32) -> [u8; 4] {
        match self {
            Self::Little => val.to_le_bytes(),
            Self::Big => val.to_be_bytes(),
        }
    }

    fn entry_tag(self, entry: &RawEntry) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes([entry[0], entry[1]]),
            Self::Big => u16::from_be_bytes([entry[0], entry[1]]),
        }
    }
}

/// One directory: its raw 12-byte entries and the next-IFD offset.
struct Ifd {
    entries: Vec<RawEntry>,
    next: u32,
}

impl Ifd {
    fn read(data: &[u8], order: ByteOrder, offset: usize) -> Result<Self> {
        let count = order.u16(data, offset)? as usize;
        let start = offset + 2;
        let end = start + count * ENTRY_LEN;
        let next = order
            .u32(data, end)
            .context("IFD extends beyond the EXIF data")?;

        let entries = (0..count)
            .map(|i| {
                let mut entry = [0u8; ENTRY_LEN];
                let at = start + i * ENTRY_LEN;
                entry.copy_from_slice(&data[at..at + ENTRY_LEN]);
                entry
            })
            .collect();

        Ok(Self { entries, next })
    }

    fn find(&self, order: ByteOrder, tag: u16) -> Option<&RawEntry> {
        self.entries.iter().find(|e| order.entry_tag(e) == tag)
    }
}

/// Byte order, IFD0 and the Exif sub-IFD of a TIFF block.
struct Layout {
    order: ByteOrder,
    ifd0: Ifd,
    exif_ifd: Option<Ifd>,
}

impl Layout {
    fn read(data: &[u8]) -> Result<Self> {
        let order = ByteOrder::detect(data)?;
        let ifd0_offset = order.u32(data, 4)? as usize;
        let ifd0 = Ifd::read(data, order, ifd0_offset).context("Failed to read IFD0")?;

        let exif_ifd = match ifd0.find(order, TAG_EXIF_IFD_POINTER) {
            Some(entry) => {
                let offset = order.u32(entry, 8)? as usize;
                Some(Ifd::read(data, order, offset).context("Failed to read the Exif sub-IFD")?)
            }
            None => None,
        };

        Ok(Self {
            order,
            ifd0,
            exif_ifd,
        })
    }
}

/// A new entry, before its value is placed.
struct NewEntry {
    tag: u16,
    format: u16,
    count: u32,
    data: Vec<u8>,
}

impl NewEntry {
    fn for_tag(tag: TagName, value: &str) -> Self {
        let (format, data) = match tag {
            TagName::UserComment => (FORMAT_UNDEFINED, encode_user_comment(value)),
            _ => {
                let mut data = value.as_bytes().to_vec();
                data.push(0);
                (FORMAT_ASCII, data)
            }
        };
        Self {
            tag: tag.tag_id(),
            format,
            count: data.len() as u32,
            data,
        }
    }

    fn long(order: ByteOrder, tag: u16, value: u32) -> Self {
        Self {
            tag,
            format: FORMAT_LONG,
            count: 1,
            data: order.put_u32(value).to_vec(),
        }
    }
}

/// Check that `data` is a readable TIFF block: valid header, IFD0 and
/// (when present) Exif sub-IFD.
pub(super) fn check_structure(data: &[u8]) -> Result<()> {
    Layout::read(data).map(|_| ())
}

/// Set `tags` in the TIFF block `original`, keeping every other entry.
///
/// Primary tags go to IFD0 and capture-detail tags to the Exif sub-IFD,
/// which is created if missing. Existing entries with the same tag id are
/// replaced.
pub(super) fn inject_tags(original: &[u8], tags: &[(TagName, &str)]) -> Result<Vec<u8>> {
    let layout = Layout::read(original)?;
    let order = layout.order;
    let mut out = original.to_vec();

    let mut ifd0_new: Vec<NewEntry> = Vec::new();
    let mut capture: Vec<NewEntry> = Vec::new();
    for (tag, value) in tags {
        let entry = NewEntry::for_tag(*tag, value);
        match tag.block() {
            Block::Primary => ifd0_new.push(entry),
            Block::CaptureDetail => capture.push(entry),
        }
    }

    if !capture.is_empty() {
        let (entries, next) = match layout.exif_ifd {
            Some(ifd) => (ifd.entries, ifd.next),
            None => (Vec::new(), 0),
        };
        let offset = append_ifd(&mut out, order, entries, capture, next)?;
        ifd0_new.push(NewEntry::long(order, TAG_EXIF_IFD_POINTER, offset));
    }

    if ifd0_new.is_empty() {
        return Ok(out);
    }

    let ifd0_offset = append_ifd(
        &mut out,
        order,
        layout.ifd0.entries,
        ifd0_new,
        layout.ifd0.next,
    )?;
    out[4..8].copy_from_slice(&order.put_u32(ifd0_offset));

    Ok(out)
}

/// Append the values of `new`, then an IFD table merging `existing` and
/// `new` in ascending tag order. Returns the table's offset.
fn append_ifd(
    out: &mut Vec<u8>,
    order: ByteOrder,
    existing: Vec<RawEntry>,
    new: Vec<NewEntry>,
    next: u32,
) -> Result<u32> {
    let mut entries: Vec<RawEntry> = existing
        .into_iter()
        .filter(|e| !new.iter().any(|n| n.tag == order.entry_tag(e)))
        .collect();

    for entry in &new {
        let mut raw = [0u8; ENTRY_LEN];
        raw[0..2].copy_from_slice(&order.put_u16(entry.tag));
        raw[2..4].copy_from_slice(&order.put_u16(entry.format));
        raw[4..8].copy_from_slice(&order.put_u32(entry.count));
        if entry.data.len() <= 4 {
            raw[8..8 + entry.data.len()].copy_from_slice(&entry.data);
        } else {
            pad_to_word(out);
            raw[8..12].copy_from_slice(&order.put_u32(current_offset(out)?));
            out.extend_from_slice(&entry.data);
        }
        entries.push(raw);
    }
    entries.sort_by_key(|e| order.entry_tag(e));

    pad_to_word(out);
    let offset = current_offset(out)?;
    let count = u16::try_from(entries.len()).context("Too many IFD entries")?;
    out.extend_from_slice(&order.put_u16(count));
    for entry in &entries {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(&order.put_u32(next));

    Ok(offset)
}

// TIFF offsets must be even.
fn pad_to_word(out: &mut Vec<u8>) {
    if out.len() % 2 != 0 {
        out.push(0);
    }
}

fn current_offset(out: &[u8]) -> Result<u32> {
    u32::try_from(out.len()).context("EXIF data too large")
}

/// Raw value bytes of `tag` in `data`.
#[cfg(test)]
pub(crate) fn read_tag_value(data: &[u8], tag: TagName) -> Result<Option<Vec<u8>>> {
    read_value(data, tag.block(), tag.tag_id())
}

#[cfg(test)]
fn read_value(data: &[u8], block: Block, tag: u16) -> Result<Option<Vec<u8>>> {
    let layout = Layout::read(data)?;
    let order = layout.order;
    let ifd = match block {
        Block::Primary => Some(&layout.ifd0),
        Block::CaptureDetail => layout.exif_ifd.as_ref(),
    };
    let Some(entry) = ifd.and_then(|ifd| ifd.find(order, tag)) else {
        return Ok(None);
    };

    let unit = match order.u16(entry, 2)? {
        3 => 2,
        4 | 9 => 4,
        5 | 10 | 12 => 8,
        _ => 1,
    };
    let len = order.u32(entry, 4)? as usize * unit;
    if len <= 4 {
        return Ok(Some(entry[8..8 + len].to_vec()));
    }
    let offset = order.u32(entry, 8)? as usize;
    let value = data
        .get(offset..offset + len)
        .context("Value out of bounds")?;
    Ok(Some(value.to_vec()))
}

/// ASCII value of `tag` in `data`, without the trailing NUL.
#[cfg(test)]
pub(crate) fn read_ascii(data: &[u8], tag: TagName) -> Option<String> {
    let value = read_tag_value(data, tag).ok()??;
    let text = String::from_utf8_lossy(&value);
    Some(text.trim_end_matches('\0').to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TAG_MAKER_NOTE: u16 = 0x927C;
    const TAG_VENDOR_PRIVATE: u16 = 0xC5A0;
    pub(crate) const VENDOR_BLOB: &[u8] = b"VENDOR-MAKERNOTE\x01\x02\x03\xFF\x00\x7F";

    fn ascii(tag: TagName, value: &str) -> NewEntry {
        NewEntry::for_tag(tag, value)
    }

    fn undefined(tag: u16, data: &[u8]) -> NewEntry {
        NewEntry {
            tag,
            format: FORMAT_UNDEFINED,
            count: data.len() as u32,
            data: data.to_vec(),
        }
    }

    fn header(order: ByteOrder) -> Vec<u8> {
        let mut out = match order {
            ByteOrder::Little => b"II".to_vec(),
            ByteOrder::Big => b"MM".to_vec(),
        };
        out.extend_from_slice(&order.put_u16(42));
        out.extend_from_slice(&order.put_u32(0));
        out
    }

    /// A camera-style block: Make, Model and a private vendor tag in IFD0,
    /// a MakerNote in the Exif sub-IFD.
    pub(crate) fn vendor_tiff(big_endian: bool) -> Vec<u8> {
        let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };
        let mut out = header(order);

        let exif_offset = append_ifd(
            &mut out,
            order,
            Vec::new(),
            vec![undefined(TAG_MAKER_NOTE, VENDOR_BLOB)],
            0,
        )
        .unwrap();
        let ifd0_offset = append_ifd(
            &mut out,
            order,
            Vec::new(),
            vec![
                ascii(TagName::Make, "OldMake"),
                ascii(TagName::Model, "Cam"),
                undefined(TAG_VENDOR_PRIVATE, b"\x00\x01\x02\x03\x04\x05"),
                NewEntry::long(order, TAG_EXIF_IFD_POINTER, exif_offset),
            ],
            0,
        )
        .unwrap();
        out[4..8].copy_from_slice(&order.put_u32(ifd0_offset));
        out
    }

    /// An IFD0-only block with a Model tag.
    fn plain_tiff() -> Vec<u8> {
        let order = ByteOrder::Little;
        let mut out = header(order);
        let ifd0 = append_ifd(&mut out, order, Vec::new(), vec![ascii(TagName::Model, "X100")], 0)
            .unwrap();
        out[4..8].copy_from_slice(&order.put_u32(ifd0));
        out
    }

    fn tags_in_order(data: &[u8], block: Block) -> Vec<u16> {
        let layout = Layout::read(data).unwrap();
        let ifd = match block {
            Block::Primary => &layout.ifd0,
            Block::CaptureDetail => layout.exif_ifd.as_ref().unwrap(),
        };
        ifd.entries.iter().map(|e| layout.order.entry_tag(e)).collect()
    }

    // ── check_structure ──────────────────────────────────────────────

    #[test]
    fn structure_accepts_valid_blocks() {
        assert!(check_structure(&vendor_tiff(false)).is_ok());
        assert!(check_structure(&vendor_tiff(true)).is_ok());
    }

    #[test]
    fn structure_rejects_corrupt_blocks() {
        assert!(check_structure(b"XX\0*\0\0\0\x08").is_err());
        assert!(check_structure(b"II*\0").is_err());
        assert!(check_structure(b"II\x2b\0\x08\0\0\0\0\0\0\0").is_err());
        // IFD0 claims 200 entries that are not there.
        assert!(check_structure(b"II*\0\x08\0\0\0\xC8\0\0\0").is_err());
        // IFD0 offset past the end.
        assert!(check_structure(b"II*\0\xFF\0\0\0").is_err());
    }

    // ── inject_tags ──────────────────────────────────────────────────

    #[test]
    fn inject_replaces_adds_and_keeps_vendor_data() {
        for big_endian in [false, true] {
            let original = vendor_tiff(big_endian);
            let out = inject_tags(
                &original,
                &[
                    (TagName::Make, "NewMake"),
                    (TagName::Artist, "Jane"),
                    (TagName::LensModel, "50mm F1.8"),
                    (TagName::UserComment, "hi"),
                ],
            )
            .unwrap();

            assert!(out.starts_with(&original[..4]));
            assert_eq!(read_ascii(&out, TagName::Make).as_deref(), Some("NewMake"));
            assert_eq!(read_ascii(&out, TagName::Model).as_deref(), Some("Cam"));
            assert_eq!(read_ascii(&out, TagName::Artist).as_deref(), Some("Jane"));
            assert_eq!(read_ascii(&out, TagName::LensModel).as_deref(), Some("50mm F1.8"));
            assert_eq!(
                read_tag_value(&out, TagName::UserComment).unwrap(),
                Some(encode_user_comment("hi"))
            );
            assert_eq!(
                read_value(&out, Block::CaptureDetail, TAG_MAKER_NOTE).unwrap(),
                Some(VENDOR_BLOB.to_vec())
            );
            assert_eq!(
                read_value(&out, Block::Primary, TAG_VENDOR_PRIVATE).unwrap(),
                Some(b"\x00\x01\x02\x03\x04\x05".to_vec())
            );
        }
    }

    #[test]
    fn inject_creates_exif_sub_ifd() {
        let out = inject_tags(&plain_tiff(), &[(TagName::DateTimeOriginal, "2024:05:01 10:00:00")])
            .unwrap();
        assert_eq!(
            read_ascii(&out, TagName::DateTimeOriginal).as_deref(),
            Some("2024:05:01 10:00:00")
        );
        assert_eq!(read_ascii(&out, TagName::Model).as_deref(), Some("X100"));
    }

    #[test]
    fn inject_keeps_entries_sorted() {
        let out = inject_tags(
            &vendor_tiff(false),
            &[(TagName::Copyright, "(c) Jane"), (TagName::Artist, "Jane")],
        )
        .unwrap();
        let tags = tags_in_order(&out, Block::Primary);
        let mut sorted = tags.clone();
        sorted.sort_unstable();
        assert_eq!(tags, sorted);
        assert_eq!(tags.len(), 6);
    }

    #[test]
    fn inject_short_value_is_inline() {
        let out = inject_tags(&plain_tiff(), &[(TagName::Make, "ab")]).unwrap();
        assert_eq!(read_ascii(&out, TagName::Make).as_deref(), Some("ab"));
    }

    #[test]
    fn inject_nothing_leaves_bytes() {
        let original = vendor_tiff(true);
        assert_eq!(inject_tags(&original, &[]).unwrap(), original);
    }

    #[test]
    fn inject_rejects_corrupt_block() {
        assert!(inject_tags(b"XX\0*\0\0\0\x08", &[(TagName::Make, "x")]).is_err());
    }
}
