/// Concatenates audio segments byte for byte.
/// Suitable for MP3 or other stream-based formats.
pub fn merge_binary(parts: &[Vec<u8>]) -> Vec<u8> {
    let total = parts.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for part in parts {
        merged.extend_from_slice(part);
    }
    merged
}

/// Random 32-hex-digit file name, e.g. `3f2a...e1.mp3`.
pub fn random_audio_filename(extension: &str) -> String {
    format!("{:032x}.{}", rand::random::<u128>(), extension)
}

/// Splits text into segments of at most `max_chars` characters, preferring
/// sentence boundaries. A single word longer than `max_chars` becomes its own
/// segment.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::new();
    let mut current = String::new();

    for sentence in sentences(text) {
        for piece in fit_words(&sentence, max_chars) {
            let needed = piece.chars().count();
            if current.is_empty() {
                current = piece;
            } else if current.chars().count() + 1 + needed <= max_chars {
                current.push(' ');
                current.push_str(&piece);
            } else {
                segments.push(std::mem::replace(&mut current, piece));
            }
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Sentences with whitespace collapsed to single spaces.
fn sentences(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            let end = i + c.len_utf8();
            push_sentence(&mut result, &text[start..end]);
            start = end;
        }
    }
    push_sentence(&mut result, &text[start..]);
    result
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        out.push(sentence);
    }
}

fn fit_words(sentence: &str, max_chars: usize) -> Vec<String> {
    if sentence.chars().count() <= max_chars {
        return vec![sentence.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split(' ') {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            pieces.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
