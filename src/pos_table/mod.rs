//! Zero-copy reader over the user dictionary's packed POS/token data.
//!
//! A [`LookupTable`] is built once from two borrowed byte views supplied by
//! an external data manager and never mutated afterward; it holds no owned
//! copies of the token or string-pool bytes, only indices into them.

mod string_pool;
mod token;

use std::collections::HashMap;

use thiserror::Error;

use string_pool::StringPool;
use token::TokenArray;
pub use token::{TokenIter, TokenRecord, RECORD_SIZE};

/// Errors surfaced by [`LookupTable`]; these propagate to the caller rather
/// than being absorbed, since (unlike the renderer supervisor) there is no
/// local recovery available for malformed dictionary data or an unknown POS.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupTableError {
    #[error("malformed user dictionary data: {0}")]
    MalformedData(String),
    #[error("unknown part of speech: `{0}`")]
    UnknownPos(String),
}

impl LookupTableError {
    fn malformed(reason: impl Into<String>) -> Self {
        LookupTableError::MalformedData(reason.into())
    }
}

bitflags::bitflags! {
    /// Bit flags attached to a [`UserToken`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TokenAttributes: u16 {
        const SHORTCUT = 1;
        const ISOLATED_WORD = 2;
        const SUGGESTION_ONLY = 4;
        const NON_JA_LOCALE = 8;
    }
}

/// A reified user dictionary entry produced by [`LookupTable::get_tokens`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken {
    pub key: String,
    pub value: String,
    pub id: u16,
    pub attributes: TokenAttributes,
    pub comment: String,
}

struct PosEntry {
    name: Box<str>,
    pos_index: u16,
}

/// Immutable, thread-safe-to-read view over a user dictionary's packed
/// token array and string pool.
///
/// The backing byte slices must outlive the `LookupTable`; this type holds
/// only non-owning views into them.
pub struct LookupTable<'a> {
    tokens: TokenArray<'a>,
    strings: StringPool<'a>,
    /// Distinct `pos_index` values in first-encounter order, resolved to
    /// their human-readable names.
    pos_list: Vec<PosEntry>,
    /// Index into `pos_list` for quick name lookups.
    pos_by_name: HashMap<Box<str>, usize>,
    default_pos_index: usize,
}

impl<'a> LookupTable<'a> {
    /// Builds a table over `token_bytes` (an `8 * M`-byte packed record
    /// array, sorted ascending by `pos_index`) and `string_pool_bytes` (the
    /// serialized string array backing POS names, keys and values).
    pub fn new(token_bytes: &'a [u8], string_pool_bytes: &'a [u8]) -> Result<Self, LookupTableError> {
        let strings = StringPool::parse(string_pool_bytes)?;
        let tokens = TokenArray::parse(token_bytes)?;

        let mut pos_list: Vec<PosEntry> = Vec::new();
        let mut pos_by_name: HashMap<Box<str>, usize> = HashMap::new();
        let mut seen_pos_index: HashMap<u16, usize> = HashMap::new();

        for record in tokens.iter() {
            for ordinal in [record.pos_index, record.value_suffix_index, record.key_suffix_index] {
                if strings.get(ordinal).is_none() {
                    return Err(LookupTableError::malformed(format!(
                        "ordinal {ordinal} is out of range for a string pool of length {}",
                        strings.len()
                    )));
                }
            }

            if let std::collections::hash_map::Entry::Vacant(slot) = seen_pos_index.entry(record.pos_index) {
                let name = strings
                    .get(record.pos_index)
                    .expect("validated above")
                    .to_owned()
                    .into_boxed_str();
                slot.insert(pos_list.len());
                pos_by_name.insert(name.clone(), pos_list.len());
                pos_list.push(PosEntry {
                    name,
                    pos_index: record.pos_index,
                });
            }
        }

        let default_marker = strings.get(0);
        let default_pos_index = default_marker
            .and_then(|marker| pos_by_name.get(marker).copied())
            .unwrap_or(0);

        Ok(LookupTable {
            tokens,
            strings,
            pos_list,
            pos_by_name,
            default_pos_index,
        })
    }

    /// Ordered, deduplicated list of POS names in first-encounter order.
    pub fn pos_list(&self) -> impl ExactSizeIterator<Item = &str> {
        self.pos_list.iter().map(|e| &*e.name)
    }

    /// `0 <= default_pos_index() < pos_list().len()` whenever the table is
    /// non-empty; the preselected POS surfaced to the UI.
    pub fn default_pos_index(&self) -> usize {
        self.default_pos_index
    }

    pub fn is_valid_pos(&self, name: &str) -> bool {
        self.pos_by_name.contains_key(name)
    }

    pub fn pos_id(&self, name: &str) -> Result<u16, LookupTableError> {
        self.pos_by_name
            .get(name)
            .map(|&idx| self.pos_list[idx].pos_index)
            .ok_or_else(|| LookupTableError::UnknownPos(name.to_owned()))
    }

    /// Returns every user token whose underlying record has the given POS,
    /// with `key`/`value` suffix-joined onto the caller's prefixes and the
    /// locale attribute rule applied.
    pub fn get_tokens(&self, key: &str, value: &str, pos_name: &str, locale: &str) -> Result<Vec<UserToken>, LookupTableError> {
        let pos_index = self.pos_id(pos_name)?;
        let non_ja = !locale.is_empty() && !starts_with_ja(locale);

        let range = self.tokens.range_for_pos(pos_index);
        let mut out = Vec::with_capacity(range.len());
        for i in range {
            let record = self.tokens.get(i).expect("range is within bounds");
            let key_suffix = self.strings.get(record.key_suffix_index).expect("validated at construction");
            let value_suffix = self.strings.get(record.value_suffix_index).expect("validated at construction");

            let mut attributes = TokenAttributes::empty();
            if non_ja {
                attributes |= TokenAttributes::NON_JA_LOCALE;
            }

            out.push(UserToken {
                key: format!("{key}{key_suffix}"),
                value: format!("{value}{value_suffix}"),
                id: record.conjugation_id,
                attributes,
                comment: String::new(),
            });
        }
        Ok(out)
    }
}

/// Case-insensitive ASCII check for whether `locale` begins with `"ja"`.
fn starts_with_ja(locale: &str) -> bool {
    let bytes = locale.as_bytes();
    bytes.len() >= 2 && bytes[0].to_ascii_lowercase() == b'j' && bytes[1].to_ascii_lowercase() == b'a'
}
