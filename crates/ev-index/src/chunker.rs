//! Sentence-packed, overlapping text chunks measured in whitespace tokens.

use ev_config::IndexingConfig;
use serde::{Deserialize, Serialize};

/// Chunk size and overlap, in whitespace-separated tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from(&IndexingConfig::default())
    }
}

impl From<&IndexingConfig> for ChunkConfig {
    fn from(config: &IndexingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

impl ChunkConfig {
    /// Clamp to a usable shape: size ≥ 1 and overlap < size.
    #[must_use]
    pub fn normalized(self) -> Self {
        let chunk_size = self.chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: self.chunk_overlap.min(chunk_size - 1),
        }
    }
}

/// One chunk of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Zero-based position within the document.
    pub index: usize,
    /// Byte offset of the chunk's first token in the document text.
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    ends_sentence: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(token(text, s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(token(text, s, text.len()));
    }
    tokens
}

fn token(text: &str, start: usize, end: usize) -> Token {
    let word = text[start..end].trim_end_matches(['"', '\'', ')', ']', '”', '’']);
    Token {
        start,
        end,
        ends_sentence: word.ends_with(['.', '!', '?']),
    }
}

/// Split `text` into chunks.
///
/// Whole sentences are packed greedily until the next one would exceed
/// `chunk_size` tokens; a sentence longer than that is cut into token
/// windows. Every chunk after the first starts with up to `chunk_overlap`
/// trailing tokens of its predecessor. Chunk text is the original slice of
/// `text`, so whitespace inside a chunk is preserved.
#[must_use]
pub fn chunk_text(text: &str, config: ChunkConfig) -> Vec<TextChunk> {
    let ChunkConfig {
        chunk_size,
        chunk_overlap,
    } = config.normalized();
    let tokens = tokenize(text);

    let mut sentences: Vec<&[Token]> = Vec::new();
    let mut begin = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.ends_sentence {
            sentences.push(&tokens[begin..=i]);
            begin = i + 1;
        }
    }
    if begin < tokens.len() {
        sentences.push(&tokens[begin..]);
    }

    let mut packer = Packer {
        text,
        chunk_size,
        chunk_overlap,
        current: Vec::new(),
        fresh: 0,
        chunks: Vec::new(),
    };
    for sentence in sentences {
        packer.push_sentence(sentence);
    }
    packer.finish()
}

struct Packer<'a> {
    text: &'a str,
    chunk_size: usize,
    chunk_overlap: usize,
    current: Vec<Token>,
    /// Tokens in `current` that are not carried-over overlap.
    fresh: usize,
    chunks: Vec<TextChunk>,
}

impl Packer<'_> {
    fn push_sentence(&mut self, sentence: &[Token]) {
        if sentence.len() > self.chunk_size {
            for tok in sentence {
                if self.current.len() >= self.chunk_size {
                    self.flush();
                }
                self.push_token(*tok);
            }
            return;
        }

        if self.current.len() + sentence.len() > self.chunk_size {
            if self.fresh > 0 {
                self.flush();
            }
            let room = self.chunk_size - sentence.len();
            if self.current.len() > room {
                self.current.drain(..self.current.len() - room);
            }
        }
        for tok in sentence {
            self.push_token(*tok);
        }
    }

    fn push_token(&mut self, tok: Token) {
        self.current.push(tok);
        self.fresh += 1;
    }

    fn flush(&mut self) {
        let (Some(first), Some(last)) = (self.current.first(), self.current.last()) else {
            return;
        };
        self.chunks.push(TextChunk {
            index: self.chunks.len(),
            offset: first.start,
            text: self.text[first.start..last.end].to_string(),
        });
        let keep = self.chunk_overlap.min(self.current.len());
        self.current.drain(..self.current.len() - keep);
        self.fresh = 0;
    }

    fn finish(mut self) -> Vec<TextChunk> {
        if self.fresh > 0 {
            self.flush();
        }
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkConfig {
        ChunkConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    fn texts(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn short_document_is_one_chunk() {
        let chunks = chunk_text(
            "Data breach procedures are documented and tested quarterly.",
            ChunkConfig::default(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(
            chunks[0].text,
            "Data breach procedures are documented and tested quarterly."
        );
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", ChunkConfig::default()).is_empty());
        assert!(chunk_text(" \n\t", ChunkConfig::default()).is_empty());
    }

    #[test]
    fn sentences_are_packed_whole_with_overlap() {
        let text = "One two three. Four five six. Seven eight nine.";
        let chunks = chunk_text(text, config(7, 1));
        assert_eq!(
            texts(&chunks),
            vec!["One two three. Four five six.", "six. Seven eight nine."]
        );
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].offset, text.find("six.").unwrap());
    }

    #[test]
    fn long_sentence_is_split_into_windows() {
        let text = "a b c d e f g h i j";
        let chunks = chunk_text(text, config(4, 1));
        assert_eq!(texts(&chunks), vec!["a b c d", "d e f g", "g h i j"]);
        assert_eq!(chunks[2].offset, text.find('g').unwrap());
    }

    #[test]
    fn boundary_tokens_appear_in_both_chunks() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk_text(text, config(5, 2));
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].text.split_whitespace().collect();
            let next: Vec<&str> = pair[1].text.split_whitespace().collect();
            assert_eq!(&prev[prev.len() - 2..], &next[..2]);
        }
        let last = chunks.last().unwrap();
        assert!(last.text.ends_with("kappa"));
    }

    #[test]
    fn no_chunk_exceeds_size() {
        let text = "Short one. ".repeat(40) + &"word ".repeat(30);
        for chunk in chunk_text(&text, config(8, 3)) {
            assert!(chunk.text.split_whitespace().count() <= 8, "{}", chunk.text);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Policies are reviewed annually. Staff complete training. ".repeat(20);
        assert_eq!(chunk_text(&text, config(12, 3)), chunk_text(&text, config(12, 3)));
    }

    #[test]
    fn offsets_point_into_original_text() {
        let text = "Access is logged.\n\nLogs are kept for six years. Reviews happen monthly.";
        for chunk in chunk_text(text, config(6, 2)) {
            assert!(text[chunk.offset..].starts_with(&chunk.text));
        }
    }

    #[test]
    fn normalized_keeps_overlap_below_size() {
        assert_eq!(config(0, 5).normalized(), config(1, 0));
        assert_eq!(config(4, 9).normalized(), config(4, 3));
    }
}
