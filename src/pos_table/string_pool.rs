use std::mem;

use super::LookupTableError;

/// A sorted, append-only sequence of byte strings, indexed by a 16-bit
/// ordinal, as produced by the data pipeline's serialized-string-array
/// convention: a `u32` count, followed by that many `u32` cumulative
/// end-offsets, followed by the concatenated UTF-8 byte runs.
///
/// `StringPool` is a non-owning view: it borrows `bytes` for its whole
/// lifetime and never copies the underlying runs.
pub struct StringPool<'a> {
    bytes: &'a [u8],
    offsets: &'a [u8],
    data: &'a [u8],
    len: usize,
}

const HEADER_SIZE: usize = mem::size_of::<u32>();
const OFFSET_SIZE: usize = mem::size_of::<u32>();

impl<'a> StringPool<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, LookupTableError> {
        if bytes.len() < HEADER_SIZE {
            return Err(LookupTableError::malformed("string pool header truncated"));
        }
        let count = u32::from_le_bytes(bytes[0..HEADER_SIZE].try_into().unwrap()) as usize;

        let offsets_start = HEADER_SIZE;
        let offsets_end = offsets_start
            .checked_add(count * OFFSET_SIZE)
            .ok_or_else(|| LookupTableError::malformed("string pool offset table overflows"))?;
        if bytes.len() < offsets_end {
            return Err(LookupTableError::malformed("string pool offset table truncated"));
        }
        let offsets = &bytes[offsets_start..offsets_end];
        let data = &bytes[offsets_end..];

        let mut prev = 0u32;
        for i in 0..count {
            let end = read_offset(offsets, i);
            if end < prev {
                return Err(LookupTableError::malformed("string pool offsets are not ascending"));
            }
            prev = end;
        }
        if count > 0 {
            let last = read_offset(offsets, count - 1) as usize;
            if last > data.len() {
                return Err(LookupTableError::malformed("string pool data shorter than offsets claim"));
            }
        }

        Ok(StringPool {
            bytes,
            offsets,
            data,
            len: count,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolves `ordinal` to its UTF-8 string, or `None` if out of range or
    /// the backing bytes are not valid UTF-8.
    pub fn get(&self, ordinal: u16) -> Option<&'a str> {
        let index = ordinal as usize;
        if index >= self.len {
            return None;
        }
        let start = if index == 0 { 0 } else { read_offset(self.offsets, index - 1) as usize };
        let end = read_offset(self.offsets, index) as usize;
        self.data.get(start..end).and_then(|s| std::str::from_utf8(s).ok())
    }

    /// Total backing byte length this pool was parsed from, for diagnostics.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

fn read_offset(offsets: &[u8], index: usize) -> u32 {
    let start = index * OFFSET_SIZE;
    u32::from_le_bytes(offsets[start..start + OFFSET_SIZE].try_into().unwrap())
}
