//! Entity annotation and command resolution.
//!
//! Pure functions over a message's text and its platform-annotated entity
//! spans. `annotate` enriches each span with the covered substring, the
//! trailing text, and the span's offset relative to the first visible
//! character; `resolve_command` decides whether the message opens with an
//! invocable command, allowing exactly one leading bot-mention token.

use crate::types::{Message, MessageEntity, User};

/// An entity span enriched with addressable text.
///
/// `string` is the exact substring the span covers, `rest_string` everything
/// after it, and `stripped_offset` the span's offset relative to the first
/// non-whitespace character of the message (0 means the entity is the very
/// first visible token).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedEntity {
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    pub url: Option<String>,
    pub user: Option<User>,
    pub language: Option<String>,
    pub string: String,
    pub rest_string: String,
    pub stripped_offset: i64,
}

/// Slices `text` by UTF-16 code unit positions, the unit entity offsets are
/// counted in on the wire.
fn utf16_slice(text: &str, start: usize, end: usize) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = end.min(units.len());
    let start = start.min(end);
    String::from_utf16_lossy(&units[start..end])
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// UTF-16 position of the first non-whitespace character.
fn leading_whitespace(text: &str) -> usize {
    text.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| c.len_utf16())
        .sum()
}

/// Enriches each raw entity with its covered substring, trailing text, and
/// whitespace-stripped offset. Order is preserved; inputs are not mutated.
/// Empty text or no entities produce an empty vector.
pub fn annotate(text: &str, entities: &[MessageEntity]) -> Vec<AnnotatedEntity> {
    if text.is_empty() || entities.is_empty() {
        return Vec::new();
    }
    let offset_whitespace = leading_whitespace(text) as i64;
    let total = utf16_len(text);
    entities
        .iter()
        .map(|e| AnnotatedEntity {
            kind: e.kind.clone(),
            offset: e.offset,
            length: e.length,
            url: e.url.clone(),
            user: e.user.clone(),
            language: e.language.clone(),
            string: utf16_slice(text, e.offset, e.offset + e.length),
            rest_string: utf16_slice(text, e.offset + e.length, total),
            stripped_offset: e.offset as i64 - offset_whitespace,
        })
        .collect()
}

/// Returns the annotated entity that constitutes the command token, or `None`
/// when the message is not a command invocation.
///
/// A command must be the first visible token, optionally prefixed by exactly
/// one bot-mention token with nothing else between them. The trimmed-prefix
/// length check rejects text smuggled between an `@mention` and the command.
pub fn resolve_command(text: &str, entities: &[MessageEntity]) -> Option<AnnotatedEntity> {
    if text.is_empty() {
        return None;
    }
    let annotated = annotate(text, entities);
    let first = annotated.first()?;
    if first.stripped_offset > 0 {
        return None;
    }
    if first.kind == "bot_command" {
        return Some(first.clone());
    }
    let second = annotated.get(1)?;
    if first.kind == "mention"
        && second.kind == "bot_command"
        && utf16_len(utf16_slice(text, 0, second.offset).trim()) == first.length
    {
        return Some(second.clone());
    }
    None
}

/// [`resolve_command`] over a message's own text and entities.
pub fn message_command(message: &Message) -> Option<AnnotatedEntity> {
    let text = message.text.as_deref()?;
    resolve_command(text, message.entities.as_deref().unwrap_or(&[]))
}
