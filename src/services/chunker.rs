use std::num::NonZeroUsize;

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(1500) {
    Some(n) => n,
    None => unreachable!(),
};

/// Splits `text` into contiguous groups of at most `max_length` words,
/// each re-joined with single spaces.
///
/// Text without any words yields no chunks.
pub fn chunk_text(text: &str, max_length: NonZeroUsize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_length.get())
        .map(|group| group.join(" "))
        .collect()
}
