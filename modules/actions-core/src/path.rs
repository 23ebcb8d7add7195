use std::fmt;

use serde_json::Value;

use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed lookup path such as `$.context.page['title']` or `$.items[0]`.
///
/// Parsing happens once, when an adapter or mapping is defined; lookups
/// afterwards are a plain walk over the segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = raw.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        if chars.first() == Some(&'$') {
            i = 1;
        } else if !chars.is_empty() && chars[0] != '[' {
            // Bare leading key: "context.page" is read as "$.context.page".
            let (key, next) = read_key(&chars, 0);
            if key.is_empty() {
                return Err(invalid("empty key"));
            }
            segments.push(Segment::Key(key));
            i = next;
        }

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (key, next) = read_key(&chars, i + 1);
                    if key.is_empty() {
                        return Err(invalid("empty key"));
                    }
                    segments.push(Segment::Key(key));
                    i = next;
                }
                '[' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|c| *c == ']')
                        .map(|p| p + i + 1);
                    let quote = chars.get(i + 1).copied().filter(|c| *c == '\'' || *c == '"');

                    if let Some(q) = quote {
                        let end = chars[i + 2..]
                            .iter()
                            .position(|c| *c == q)
                            .map(|p| p + i + 2)
                            .ok_or_else(|| invalid("unterminated quoted key"))?;
                        if chars.get(end + 1) != Some(&']') {
                            return Err(invalid("expected ']' after quoted key"));
                        }
                        segments.push(Segment::Key(chars[i + 2..end].iter().collect()));
                        i = end + 2;
                    } else {
                        let close = close.ok_or_else(|| invalid("unclosed bracket"))?;
                        let inner: String = chars[i + 1..close].iter().collect();
                        let index = inner
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| invalid("array index must be a non-negative integer"))?;
                        segments.push(Segment::Index(index));
                        i = close + 1;
                    }
                }
                other => {
                    return Err(invalid(&format!("unexpected character {other:?}")));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk `root` along the path. Missing segments, segments applied to
    /// scalars, and a terminal `null` all count as absent.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn read_key(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|c| *c == '.' || *c == '[')
        .map(|p| p + start)
        .unwrap_or(chars.len());
    (chars[start..end].iter().collect(), end)
}
