//! Sealed segment file format (.fidx)
//!
//! Immutable, mmap-able segments holding a field-major term dictionary,
//! delta-encoded posting lists and per-document stored fields.
//!
//! ## File Format
//!
//! ```text
//! HEADER (56 bytes):
//!   magic "FIDX"            4B
//!   version                 u32 LE
//!   segment_id              u64 LE
//!   max_doc                 u32 LE
//!   term_count              u32 LE
//!   term_offsets_offset     u64 LE    → byte offset to term offset table
//!   postings_offset         u64 LE    → byte offset to postings section
//!   stored_offset           u64 LE    → byte offset to stored-field section
//!   body_crc                u32 LE    → CRC32 of everything after the header
//!   reserved                u32 LE
//!
//! TERM DICTIONARY (sorted by (field, text)):
//!   per term:
//!     field_len             u16 LE
//!     field_bytes           [u8; field_len]
//!     text_len              u16 LE
//!     text_bytes            [u8; text_len]
//!     df                    u32 LE
//!     posting_offset        u32 LE    → relative to postings section start
//!     posting_byte_len      u32 LE
//!
//! TERM OFFSET TABLE (term_count × 4 bytes):
//!   per term: offset        u32 LE    → byte offset of term entry in dict
//!
//! POSTINGS SECTION:
//!   per term: num_docs u32 LE, then delta-encoded doc ids (varint)
//!
//! STORED SECTION:
//!   doc offset table        max_doc × u32 LE → relative to first record
//!   per doc record:
//!     num_fields            varint
//!     per field: name_len varint, name, num_values varint,
//!                per value: value_len varint, value bytes
//! ```

use std::cmp::Ordering;
use std::io::{self, Write};
use std::path::Path;

use crate::reader::{IndexReader, PostingCursor, TermCursor, TermRef};

/// Magic bytes for .fidx files
pub(crate) const FIDX_MAGIC: &[u8; 4] = b"FIDX";
/// Current format version
pub(crate) const FIDX_VERSION: u32 = 1;
/// Header size in bytes
pub(crate) const HEADER_SIZE: usize = 56;
/// Longest field name or term text the dictionary can hold.
pub const MAX_TERM_BYTES: usize = u16::MAX as usize;

// ============================================================================
// Varint (LEB128) Codec
// ============================================================================

/// Encode a u32 as a variable-length integer (LEB128).
pub(crate) fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint from a byte slice, returning (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
        if shift >= 35 {
            return None; // overflow
        }
    }
    None // truncated
}

// ============================================================================
// Bounds-checked readers
// ============================================================================

pub(crate) fn corrupt(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn slice_at(bytes: &[u8], start: usize, len: usize) -> io::Result<&[u8]> {
    start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| corrupt(format!("read of {} bytes at {} is out of bounds", len, start)))
}

fn u16_at(bytes: &[u8], pos: usize) -> io::Result<u16> {
    let s = slice_at(bytes, pos, 2)?;
    Ok(u16::from_le_bytes([s[0], s[1]]))
}

fn u32_at(bytes: &[u8], pos: usize) -> io::Result<u32> {
    let s = slice_at(bytes, pos, 4)?;
    Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

fn u64_at(bytes: &[u8], pos: usize) -> io::Result<u64> {
    let s = slice_at(bytes, pos, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(s);
    Ok(u64::from_le_bytes(buf))
}

fn str_at(bytes: &[u8], pos: usize, len: usize) -> io::Result<&str> {
    std::str::from_utf8(slice_at(bytes, pos, len)?)
        .map_err(|e| corrupt(format!("invalid UTF-8 at {}: {}", pos, e)))
}

/// Sequential varint reader over a record.
struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn varint(&mut self) -> io::Result<u32> {
        let rest = self
            .data
            .get(self.pos..)
            .ok_or_else(|| corrupt("stored record out of bounds"))?;
        let (value, n) = decode_varint(rest).ok_or_else(|| corrupt("bad varint in stored record"))?;
        self.pos += n;
        Ok(value)
    }

    fn bytes(&mut self) -> io::Result<&'a [u8]> {
        let len = self.varint()? as usize;
        let s = slice_at(self.data, self.pos, len)?;
        self.pos += len;
        Ok(s)
    }

    fn string(&mut self) -> io::Result<&'a str> {
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|e| corrupt(format!("invalid UTF-8 in stored value: {}", e)))
    }
}

// ============================================================================
// SegmentData
// ============================================================================

/// Underlying storage for a sealed segment.
enum SegmentData {
    /// In-memory owned data (before flush)
    Owned(Vec<u8>),
    /// Memory-mapped file data
    Mmap(memmap2::Mmap),
}

impl SegmentData {
    fn as_bytes(&self) -> &[u8] {
        match self {
            SegmentData::Owned(v) => v,
            SegmentData::Mmap(m) => m,
        }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// One term dictionary entry, borrowed from segment bytes.
#[derive(Debug, Clone, Copy)]
struct DictEntry<'a> {
    field: &'a str,
    text: &'a str,
    df: u32,
    posting_offset: u32,
    posting_len: u32,
}

/// An immutable, searchable segment.
///
/// Backed by either owned memory or an mmap'd file; safe to share between
/// threads, every read is a bounds-checked slice of the immutable bytes.
pub struct Segment {
    data: SegmentData,
    segment_id: u64,
    max_doc: u32,
    term_count: u32,
    term_offsets_offset: u64,
    postings_offset: u64,
    stored_offset: u64,
}

impl Segment {
    /// Create a segment from raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> io::Result<Self> {
        Self::validate_and_create(SegmentData::Owned(data))
    }

    /// Load a segment from an mmap'd file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        // SAFETY: segment files are written once via temp + rename and never
        // modified in place afterwards.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        let segment = Self::from_mmap(mmap)?;
        tracing::debug!(
            target: "fieldex::index",
            segment_id = segment.segment_id,
            max_doc = segment.max_doc,
            terms = segment.term_count,
            path = %path.display(),
            "Opened segment"
        );
        Ok(segment)
    }

    /// Create a segment over an existing mapping.
    pub fn from_mmap(mmap: memmap2::Mmap) -> io::Result<Self> {
        Self::validate_and_create(SegmentData::Mmap(mmap))
    }

    fn validate_and_create(data: SegmentData) -> io::Result<Self> {
        let bytes = data.as_bytes();
        if bytes.len() < HEADER_SIZE {
            return Err(corrupt("segment too small"));
        }
        if &bytes[0..4] != FIDX_MAGIC {
            return Err(corrupt("bad FIDX magic"));
        }
        let version = u32_at(bytes, 4)?;
        if version != FIDX_VERSION {
            return Err(corrupt(format!("unsupported FIDX version {}", version)));
        }
        let segment_id = u64_at(bytes, 8)?;
        let max_doc = u32_at(bytes, 16)?;
        let term_count = u32_at(bytes, 20)?;
        let term_offsets_offset = u64_at(bytes, 24)?;
        let postings_offset = u64_at(bytes, 32)?;
        let stored_offset = u64_at(bytes, 40)?;
        let body_crc = u32_at(bytes, 48)?;

        let len = bytes.len() as u64;
        let expected_postings = term_offsets_offset + term_count as u64 * 4;
        if term_offsets_offset < HEADER_SIZE as u64
            || postings_offset != expected_postings
            || stored_offset < postings_offset
            || stored_offset + max_doc as u64 * 4 > len
        {
            return Err(corrupt("inconsistent FIDX section offsets"));
        }
        if crc32fast::hash(&bytes[HEADER_SIZE..]) != body_crc {
            return Err(corrupt("FIDX checksum mismatch"));
        }

        Ok(Segment {
            data,
            segment_id,
            max_doc,
            term_count,
            term_offsets_offset,
            postings_offset,
            stored_offset,
        })
    }

    /// Segment ID
    pub fn segment_id(&self) -> u64 {
        self.segment_id
    }

    /// Number of distinct (field, text) terms
    pub fn term_count(&self) -> u32 {
        self.term_count
    }

    /// Size of the segment in bytes
    pub fn byte_len(&self) -> usize {
        self.data.as_bytes().len()
    }

    /// Write this segment's data to a file (atomic temp+rename).
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp_path = path.with_extension("fidx.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(self.data.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        tracing::debug!(
            target: "fieldex::index",
            segment_id = self.segment_id,
            bytes = self.byte_len(),
            path = %path.display(),
            "Flushed segment"
        );
        Ok(())
    }

    // ========================================================================
    // Term Dictionary Access
    // ========================================================================

    fn dict_entry(&self, index: usize) -> io::Result<DictEntry<'_>> {
        let bytes = self.data.as_bytes();
        let offset_pos = self.term_offsets_offset as usize + index * 4;
        let mut pos = HEADER_SIZE + u32_at(bytes, offset_pos)? as usize;

        let field_len = u16_at(bytes, pos)? as usize;
        let field = str_at(bytes, pos + 2, field_len)?;
        pos += 2 + field_len;

        let text_len = u16_at(bytes, pos)? as usize;
        let text = str_at(bytes, pos + 2, text_len)?;
        pos += 2 + text_len;

        Ok(DictEntry {
            field,
            text,
            df: u32_at(bytes, pos)?,
            posting_offset: u32_at(bytes, pos + 4)?,
            posting_len: u32_at(bytes, pos + 8)?,
        })
    }

    /// Index of the first term ≥ (field, text).
    fn lower_bound(&self, field: &str, text: &str) -> io::Result<usize> {
        let mut lo = 0usize;
        let mut hi = self.term_count as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.dict_entry(mid)?;
            match (entry.field, entry.text).cmp(&(field, text)) {
                Ordering::Less => lo = mid + 1,
                Ordering::Equal | Ordering::Greater => hi = mid,
            }
        }
        Ok(lo)
    }

    fn postings_for(&self, entry: &DictEntry<'_>) -> io::Result<SegmentPostings<'_>> {
        let bytes = self.data.as_bytes();
        let start = self.postings_offset as usize + entry.posting_offset as usize;
        let data = slice_at(bytes, start, entry.posting_len as usize)?;
        let num_docs = u32_at(data, 0)?;
        if num_docs != entry.df {
            return Err(corrupt(format!(
                "posting count {} does not match doc freq {} for term {}:{}",
                num_docs, entry.df, entry.field, entry.text
            )));
        }
        Ok(SegmentPostings {
            data,
            pos: 4,
            remaining: num_docs,
            prev_doc: None,
            max_doc: self.max_doc,
        })
    }

    fn stored_record(&self, doc: u32) -> io::Result<RecordReader<'_>> {
        if doc >= self.max_doc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document {} out of range (max_doc {})", doc, self.max_doc),
            ));
        }
        let bytes = self.data.as_bytes();
        let table = self.stored_offset as usize;
        let records = table + self.max_doc as usize * 4;
        let offset = u32_at(bytes, table + doc as usize * 4)? as usize;
        let data = bytes
            .get(records + offset..)
            .ok_or_else(|| corrupt(format!("stored record of document {} out of bounds", doc)))?;
        Ok(RecordReader { data, pos: 0 })
    }
}

impl IndexReader for Segment {
    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn terms_from(&self, field: &str, text: &str) -> io::Result<Box<dyn TermCursor + '_>> {
        let index = self.lower_bound(field, text)?;
        Ok(Box::new(SegmentTermCursor::at(self, index)?))
    }

    /// Decodes only the requested field; other fields of the record are
    /// skipped without allocating.
    fn stored_values(&self, doc: u32, field: &str) -> io::Result<Vec<String>> {
        let mut record = self.stored_record(doc)?;
        let num_fields = record.varint()?;
        for _ in 0..num_fields {
            let name = record.bytes()?;
            let num_values = record.varint()?;
            if name == field.as_bytes() {
                let mut values = Vec::with_capacity(num_values as usize);
                for _ in 0..num_values {
                    values.push(record.string()?.to_owned());
                }
                return Ok(values);
            }
            for _ in 0..num_values {
                record.bytes()?;
            }
        }
        Ok(Vec::new())
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("segment_id", &self.segment_id)
            .field("max_doc", &self.max_doc)
            .field("term_count", &self.term_count)
            .finish()
    }
}

// ============================================================================
// Cursors
// ============================================================================

/// Term cursor over a segment's dictionary.
struct SegmentTermCursor<'a> {
    segment: &'a Segment,
    next_index: usize,
    current: Option<DictEntry<'a>>,
}

impl<'a> SegmentTermCursor<'a> {
    fn at(segment: &'a Segment, index: usize) -> io::Result<Self> {
        let mut cursor = SegmentTermCursor {
            segment,
            next_index: index,
            current: None,
        };
        cursor.load_next()?;
        Ok(cursor)
    }

    fn load_next(&mut self) -> io::Result<()> {
        if self.next_index < self.segment.term_count as usize {
            self.current = Some(self.segment.dict_entry(self.next_index)?);
            self.next_index += 1;
        } else {
            self.current = None;
        }
        Ok(())
    }
}

impl<'a> TermCursor for SegmentTermCursor<'a> {
    fn term(&self) -> Option<TermRef<'_>> {
        self.current.as_ref().map(|e| TermRef {
            field: e.field,
            text: e.text,
        })
    }

    fn doc_freq(&self) -> u32 {
        self.current.as_ref().map_or(0, |e| e.df)
    }

    fn advance(&mut self) -> io::Result<()> {
        self.load_next()
    }

    fn postings(&self) -> io::Result<Box<dyn PostingCursor + '_>> {
        match &self.current {
            Some(entry) => Ok(Box::new(self.segment.postings_for(entry)?)),
            None => Ok(Box::new(SegmentPostings::empty())),
        }
    }
}

/// Zero-allocation posting list traversal.
struct SegmentPostings<'a> {
    data: &'a [u8],
    pos: usize,
    remaining: u32,
    prev_doc: Option<u32>,
    max_doc: u32,
}

impl SegmentPostings<'static> {
    fn empty() -> Self {
        SegmentPostings {
            data: &[],
            pos: 0,
            remaining: 0,
            prev_doc: None,
            max_doc: 0,
        }
    }
}

impl<'a> PostingCursor for SegmentPostings<'a> {
    #[inline]
    fn next_doc(&mut self) -> io::Result<Option<u32>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let rest = self
            .data
            .get(self.pos..)
            .ok_or_else(|| corrupt("posting list out of bounds"))?;
        let (delta, n) = decode_varint(rest).ok_or_else(|| corrupt("bad varint in posting list"))?;
        self.pos += n;
        let doc = match self.prev_doc {
            None => delta,
            Some(prev) if delta > 0 => prev
                .checked_add(delta)
                .ok_or_else(|| corrupt("posting doc id overflow"))?,
            Some(_) => return Err(corrupt("posting list is not strictly ascending")),
        };
        if doc >= self.max_doc {
            return Err(corrupt(format!(
                "posting doc id {} beyond max_doc {}",
                doc, self.max_doc
            )));
        }
        self.prev_doc = Some(doc);
        Ok(Some(doc))
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Section offsets are u32; a section reaching 4 GiB cannot be encoded.
fn offset_u32(len: usize, what: &str) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} of {} bytes exceeds the segment format limit", what, len),
        )
    })
}

/// Encode a segment.
///
/// `terms` must be sorted by (field, text) with strictly ascending doc ids per
/// term, and every field and text at most [`MAX_TERM_BYTES`] long; `stored`
/// holds one encoded stored-field record per document.
///
/// # Errors
///
/// Returns `InvalidInput` if the term dictionary, the postings or the stored
/// records outgrow their u32 offsets.
pub(crate) fn build_segment(
    segment_id: u64,
    terms: impl ExactSizeIterator<Item = ((String, String), Vec<u32>)>,
    stored: &[Vec<u8>],
) -> io::Result<Segment> {
    let term_count = offset_u32(terms.len(), "term count")?;
    let max_doc = offset_u32(stored.len(), "document count")?;

    let mut dict_buf: Vec<u8> = Vec::new();
    let mut postings_buf: Vec<u8> = Vec::new();
    let mut term_offsets: Vec<u32> = Vec::with_capacity(terms.len());

    for ((field, text), docs) in terms {
        debug_assert!(field.len() <= MAX_TERM_BYTES && text.len() <= MAX_TERM_BYTES);
        term_offsets.push(offset_u32(dict_buf.len(), "term dictionary")?);

        let posting_offset = offset_u32(postings_buf.len(), "postings")?;
        encode_posting_list(&docs, &mut postings_buf);
        let posting_byte_len = offset_u32(postings_buf.len(), "postings")? - posting_offset;

        dict_buf.extend_from_slice(&(field.len() as u16).to_le_bytes());
        dict_buf.extend_from_slice(field.as_bytes());
        dict_buf.extend_from_slice(&(text.len() as u16).to_le_bytes());
        dict_buf.extend_from_slice(text.as_bytes());
        dict_buf.extend_from_slice(&(docs.len() as u32).to_le_bytes());
        dict_buf.extend_from_slice(&posting_offset.to_le_bytes());
        dict_buf.extend_from_slice(&posting_byte_len.to_le_bytes());
    }

    let term_offsets_offset = (HEADER_SIZE + dict_buf.len()) as u64;
    let postings_offset = term_offsets_offset + term_offsets.len() as u64 * 4;
    let stored_offset = postings_offset + postings_buf.len() as u64;

    let records_len: usize = stored.iter().map(Vec::len).sum();
    offset_u32(records_len, "stored records")?;
    let total_size = stored_offset as usize + stored.len() * 4 + records_len;
    let mut buf = Vec::with_capacity(total_size);

    // Header, CRC patched in below
    buf.extend_from_slice(FIDX_MAGIC);
    buf.extend_from_slice(&FIDX_VERSION.to_le_bytes());
    buf.extend_from_slice(&segment_id.to_le_bytes());
    buf.extend_from_slice(&max_doc.to_le_bytes());
    buf.extend_from_slice(&term_count.to_le_bytes());
    buf.extend_from_slice(&term_offsets_offset.to_le_bytes());
    buf.extend_from_slice(&postings_offset.to_le_bytes());
    buf.extend_from_slice(&stored_offset.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    debug_assert_eq!(buf.len(), HEADER_SIZE);

    buf.extend_from_slice(&dict_buf);
    for offset in &term_offsets {
        buf.extend_from_slice(&offset.to_le_bytes());
    }
    buf.extend_from_slice(&postings_buf);

    let mut record_offset = 0usize;
    for record in stored {
        buf.extend_from_slice(&offset_u32(record_offset, "stored records")?.to_le_bytes());
        record_offset += record.len();
    }
    for record in stored {
        buf.extend_from_slice(record);
    }
    debug_assert_eq!(buf.len(), total_size);

    let crc = crc32fast::hash(&buf[HEADER_SIZE..]);
    buf[48..52].copy_from_slice(&crc.to_le_bytes());

    Ok(Segment {
        data: SegmentData::Owned(buf),
        segment_id,
        max_doc,
        term_count,
        term_offsets_offset,
        postings_offset,
        stored_offset,
    })
}

/// Encode a posting list: count, then delta-encoded doc ids.
fn encode_posting_list(docs: &[u32], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(docs.len() as u32).to_le_bytes());
    let mut prev_doc: u32 = 0;
    for &doc in docs {
        encode_varint(doc - prev_doc, buf);
        prev_doc = doc;
    }
}

// ============================================================================
// Tests
// ============================================================================
