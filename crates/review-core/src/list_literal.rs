//! Strict codec for the list-literal format exchanged with the generation
//! model and accepted from API callers: `["first item", "second item"]`.
//!
//! Items are quoted with `'` or `"`, and every item of one list uses the same
//! quote character. An item may not contain its list's quote character; there
//! is no escaping, backslashes are literal. Only whitespace may surround the
//! brackets, and a single trailing comma is tolerated. Anything else is a
//! `MalformedList` error: the decoder never repairs or truncates.

use crate::error::{Error, Result};

/// Item value a model returns when a chunk warrants no questions.
pub const PLACEHOLDER: &str = "placeholder";

/// Decode a list literal into its items, in order.
pub fn parse_list(input: &str) -> Result<Vec<String>> {
    let mut cursor = Cursor { input, pos: 0 };
    cursor.skip_ws();
    match cursor.bump() {
        Some((_, '[')) => {}
        Some((offset, c)) => return Err(Error::malformed(offset, format!("expected '[', found {c:?}"))),
        None => return Err(Error::malformed(0, "empty input, expected '['")),
    }

    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    cursor.skip_ws();
    if !cursor.eat(']') {
        loop {
            let (offset, open) = cursor.bump().ok_or_else(|| cursor.unterminated())?;
            if open != '\'' && open != '"' {
                return Err(Error::malformed(offset, format!("expected a quoted item, found {open:?}")));
            }
            match quote {
                Some(q) if q != open => {
                    return Err(Error::malformed(offset, format!("item quoted with {open:?} but the list uses {q:?}")))
                }
                Some(_) => {}
                None => quote = Some(open),
            }

            let start = cursor.pos;
            let Some(len) = input[start..].find(open) else {
                return Err(Error::malformed(offset, "unterminated item"));
            };
            items.push(input[start..start + len].to_string());
            cursor.pos = start + len + open.len_utf8();

            cursor.skip_ws();
            match cursor.bump() {
                Some((_, ',')) => {
                    cursor.skip_ws();
                    if cursor.eat(']') { break; }
                }
                Some((_, ']')) => break,
                Some((offset, c)) => {
                    return Err(Error::malformed(offset, format!("expected ',' or ']' after item, found {c:?}")))
                }
                None => return Err(cursor.unterminated()),
            }
        }
    }

    cursor.skip_ws();
    if let Some((offset, c)) = cursor.peek() {
        return Err(Error::malformed(offset, format!("unexpected content after ']': {c:?}")));
    }
    Ok(items)
}

/// Decode model output: like [`parse_list`], but `placeholder` items are
/// dropped, so a lone placeholder means "no applicable items".
pub fn parse_items(input: &str) -> Result<Vec<String>> {
    let items = parse_list(input)?;
    Ok(items.into_iter().filter(|item| !is_placeholder(item)).collect())
}

pub fn is_placeholder(item: &str) -> bool {
    item.trim().eq_ignore_ascii_case(PLACEHOLDER)
}

/// Encode items as a list literal, quoting with `"` unless an item contains
/// one, then with `'`. Fails when both characters occur.
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> Result<String> {
    let quote = if items.iter().all(|i| !i.as_ref().contains('"')) {
        '"'
    } else if items.iter().all(|i| !i.as_ref().contains('\'')) {
        '\''
    } else {
        return Err(Error::malformed(0, "items contain both quote characters, no quote is available to encode them"));
    };
    let quoted: Vec<String> = items.iter().map(|i| format!("{quote}{}{quote}", i.as_ref())).collect();
    Ok(format!("[{}]", quoted.join(", ")))
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<(usize, char)> {
        self.input[self.pos..].chars().next().map(|c| (self.pos, c))
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let (offset, c) = self.peek()?;
        self.pos += c.len_utf8();
        Some((offset, c))
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.peek() {
            Some((_, c)) if c == expected => { self.pos += c.len_utf8(); true }
            _ => false,
        }
    }

    fn skip_ws(&mut self) {
        while let Some((_, c)) = self.peek() {
            if !c.is_whitespace() { break; }
            self.pos += c.len_utf8();
        }
    }

    fn unterminated(&self) -> Error {
        Error::malformed(self.input.len(), "unterminated list, expected ']'")
    }
}
