//! Binary trie dictionaries
//!
//! Word lists (`<lang>_words.txt`) are compiled into a compact trie the
//! keyboard service can walk without parsing. Every node is 10 bytes:
//!
//! | bytes | field |
//! |---|---|
//! | 0..2 | character, UTF-16 code unit, big-endian |
//! | 2 | frequency, 0 for non-terminal nodes |
//! | 3..6 | first child offset, u24 big-endian |
//! | 6..9 | next sibling offset, u24 big-endian |
//! | 9 | padding |
//!
//! Nodes are laid out breadth-first with the root (`^`) at offset 0, so an
//! offset of 0 means "none". Siblings are ordered by character.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of one encoded node
pub const NODE_SIZE: usize = 10;

/// Largest offset a u24 can address
pub const MAX_OFFSET: usize = 0xFF_FFFF;

/// Words read from one list at most
pub const MAX_WORDS: usize = 50_000;

/// Suffix of word list files
pub const WORD_LIST_SUFFIX: &str = "_words.txt";

const ROOT_CHAR: char = '^';

/// Dictionary errors
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Word list or output could not be accessed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// No word list for the language
    #[error("Missing word list: {0}")]
    MissingWordList(PathBuf),

    /// The trie does not fit in 24-bit offsets
    #[error("Trie exceeds the 16MB offset limit")]
    TooLarge,

    /// A compiled file is not a valid trie
    #[error("Malformed dictionary: {0}")]
    Malformed(String),
}

/// Result type for dictionary operations
pub type Result<T> = std::result::Result<T, DictionaryError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DictionaryError + '_ {
    move |source| DictionaryError::Io { path: path.to_path_buf(), source }
}

/// Parse a word list into word frequencies
///
/// Blank lines and `#` comments are skipped. The word is the first token
/// (tokens split on whitespace or commas); an optional decimal second token
/// is its frequency, otherwise `1000 + index`. Frequencies are clamped to
/// a byte. Later duplicates overwrite earlier ones.
pub fn parse_words(text: &str, max_words: usize) -> HashMap<String, u8> {
    let mut words = HashMap::new();
    let mut count = 0usize;

    for line in text.lines() {
        if count >= max_words {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty());
        let Some(word) = tokens.next() else {
            continue;
        };
        let freq = tokens
            .next()
            .filter(|t| t.bytes().all(|b| b.is_ascii_digit()))
            .map(|t| t.parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(1000 + count as u64);

        words.insert(word.to_string(), freq.min(u64::from(u8::MAX)) as u8);
        count += 1;
    }

    words
}

struct TrieNode {
    ch: char,
    freq: u8,
    children: BTreeMap<char, usize>,
}

impl TrieNode {
    fn new(ch: char) -> Self {
        Self { ch, freq: 0, children: BTreeMap::new() }
    }
}

/// Build the trie and encode it breadth-first
pub fn build_trie(words: &HashMap<String, u8>) -> Result<Vec<u8>> {
    let mut arena = vec![TrieNode::new(ROOT_CHAR)];

    for (word, &freq) in words {
        if word.chars().any(|c| c.len_utf16() > 1) {
            tracing::warn!(word = %word, "skipping word outside the basic multilingual plane");
            continue;
        }
        let mut node = 0;
        for ch in word.chars() {
            node = match arena[node].children.get(&ch) {
                Some(&child) => child,
                None => {
                    arena.push(TrieNode::new(ch));
                    let child = arena.len() - 1;
                    arena[node].children.insert(ch, child);
                    child
                }
            };
        }
        arena[node].freq = freq;
    }

    // Assign offsets in breadth-first order
    let mut order = Vec::with_capacity(arena.len());
    let mut offsets = vec![0usize; arena.len()];
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let offset = order.len() * NODE_SIZE;
        if offset > MAX_OFFSET {
            return Err(DictionaryError::TooLarge);
        }
        offsets[index] = offset;
        order.push(index);
        queue.extend(arena[index].children.values().copied());
    }

    let mut next_sibling = vec![0usize; arena.len()];
    for node in &arena {
        let children: Vec<usize> = node.children.values().copied().collect();
        for pair in children.windows(2) {
            next_sibling[pair[0]] = offsets[pair[1]];
        }
    }

    let mut out = Vec::with_capacity(order.len() * NODE_SIZE);
    for &index in &order {
        let node = &arena[index];
        let first_child = node.children.values().next().map_or(0, |&c| offsets[c]);

        let mut buf = [0u16; 1];
        node.ch.encode_utf16(&mut buf);
        out.extend_from_slice(&buf[0].to_be_bytes());
        out.push(node.freq);
        push_u24(&mut out, first_child)?;
        push_u24(&mut out, next_sibling[index])?;
        out.push(0);
    }

    Ok(out)
}

fn push_u24(out: &mut Vec<u8>, value: usize) -> Result<()> {
    if value > MAX_OFFSET {
        return Err(DictionaryError::TooLarge);
    }
    out.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
    Ok(())
}

/// Languages with a word list in `assets`, sorted
pub fn discover_languages(assets: &Path) -> Result<Vec<String>> {
    let mut langs: Vec<String> = fs::read_dir(assets)
        .map_err(io_error(assets))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            name.strip_suffix(WORD_LIST_SUFFIX).map(str::to_string)
        })
        .collect();
    langs.sort();
    langs.dedup();
    Ok(langs)
}

/// Compile `<assets>/<lang>_words.txt` into `<out>/<lang>.bin`
pub fn compile_language(lang: &str, assets: &Path, out: &Path) -> Result<PathBuf> {
    let words_path = assets.join(format!("{lang}{WORD_LIST_SUFFIX}"));
    if !words_path.exists() {
        return Err(DictionaryError::MissingWordList(words_path));
    }

    let text = fs::read_to_string(&words_path).map_err(io_error(&words_path))?;
    let words = parse_words(&text, MAX_WORDS);
    let bytes = build_trie(&words)?;

    fs::create_dir_all(out).map_err(io_error(out))?;
    let out_file = out.join(format!("{lang}.bin"));
    fs::write(&out_file, &bytes).map_err(io_error(&out_file))?;

    tracing::info!(
        lang,
        words = words.len(),
        nodes = bytes.len() / NODE_SIZE,
        path = %out_file.display(),
        "compiled dictionary"
    );
    Ok(out_file)
}

/// A compiled dictionary loaded for lookups
#[derive(Debug, Clone)]
pub struct BinaryDictionary {
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    unit: u16,
    freq: u8,
    first_child: usize,
    next_sibling: usize,
}

fn read_u24(bytes: &[u8]) -> usize {
    (usize::from(bytes[0]) << 16) | (usize::from(bytes[1]) << 8) | usize::from(bytes[2])
}

impl BinaryDictionary {
    /// Wrap compiled bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % NODE_SIZE != 0 {
            return Err(DictionaryError::Malformed(format!(
                "length {} is not a positive multiple of {NODE_SIZE}",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Load a compiled `.bin` file
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_bytes(fs::read(path).map_err(io_error(path))?)
    }

    /// Number of trie nodes, root included
    pub fn node_count(&self) -> usize {
        self.bytes.len() / NODE_SIZE
    }

    fn node(&self, offset: usize) -> Option<Node> {
        if offset % NODE_SIZE != 0 {
            return None;
        }
        let raw = self.bytes.get(offset..offset + NODE_SIZE)?;
        Some(Node {
            unit: u16::from_be_bytes([raw[0], raw[1]]),
            freq: raw[2],
            first_child: read_u24(&raw[3..6]),
            next_sibling: read_u24(&raw[6..9]),
        })
    }

    /// Frequency of `word`, or `None` if it is not in the dictionary
    pub fn frequency(&self, word: &str) -> Option<u8> {
        if word.is_empty() {
            return None;
        }
        let mut node = self.node(0)?;

        for ch in word.chars() {
            let mut buf = [0u16; 2];
            let units = ch.encode_utf16(&mut buf);
            if units.len() != 1 {
                return None;
            }
            let target = units[0];

            let mut offset = node.first_child;
            node = loop {
                if offset == 0 {
                    return None;
                }
                let child = self.node(offset)?;
                if child.unit == target {
                    break child;
                }
                if child.unit > target {
                    return None;
                }
                offset = child.next_sibling;
            };
        }

        (node.freq > 0).then_some(node.freq)
    }

    /// Whether `word` is in the dictionary
    pub fn contains(&self, word: &str) -> bool {
        self.frequency(word).is_some()
    }
}
