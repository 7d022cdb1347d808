use bytes::{Buf, BufMut};

use crate::common::{DbError, Result, Row, PAGE_SIZE};

/// Size of the little-endian length prefix in front of every encoded row
pub const ROW_LENGTH_SIZE: usize = 2;

/// Encodes a row for heap storage.
///
/// ## Row Binary Format
///
/// ```text
/// +----------------+------------------------------------+
/// | Length (u16 LE)| Payload (Length bytes)             |
/// +----------------+------------------------------------+
/// ```
///
/// The payload is one CSV record terminated by `\n`. A field is quoted when
/// it contains a comma, a quote, `\r` or `\n`, or starts with whitespace, and
/// quotes inside it are doubled. A lone empty field is written as `""` so that
/// it stays distinct from a row with no fields.
///
/// Fails with `DataExceedsPageSize` when the encoded row cannot fit a page.
pub fn serialize_row<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>> {
    let payload = encode_record(fields);
    let len = ROW_LENGTH_SIZE + payload.len();
    if len > PAGE_SIZE {
        return Err(DbError::DataExceedsPageSize {
            len,
            page_size: PAGE_SIZE,
        });
    }

    let mut out = Vec::with_capacity(len);
    out.put_u16_le(payload.len() as u16);
    out.extend_from_slice(payload.as_bytes());
    Ok(out)
}

/// Decodes one length-prefixed row from the front of `data`.
///
/// Returns the fields and the number of bytes consumed, or `None` when `data`
/// is too short for the announced length, the length is zero (the unused tail
/// of a heap page), or the payload is not a valid record.
pub fn deserialize_row(data: &[u8]) -> Option<(Row, usize)> {
    if data.len() < ROW_LENGTH_SIZE {
        return None;
    }
    let len = (&data[..ROW_LENGTH_SIZE]).get_u16_le() as usize;
    if len == 0 || data.len() < ROW_LENGTH_SIZE + len {
        return None;
    }

    let payload = std::str::from_utf8(&data[ROW_LENGTH_SIZE..ROW_LENGTH_SIZE + len]).ok()?;
    let fields = decode_record(payload)?;
    Some((fields, ROW_LENGTH_SIZE + len))
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace)
}

fn encode_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        let field = field.as_ref();
        if i > 0 {
            out.push(',');
        }

        if needs_quotes(field) || (fields.len() == 1 && field.is_empty()) {
            out.push('"');
            for c in field.chars() {
                if c == '"' {
                    out.push('"');
                }
                out.push(c);
            }
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
    out
}

fn decode_record(payload: &str) -> Option<Row> {
    let line = payload
        .strip_suffix("\r\n")
        .or_else(|| payload.strip_suffix('\n'))
        .unwrap_or(payload);
    if line.is_empty() {
        return Some(Vec::new());
    }

    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next()? {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => break,
                    c => field.push(c),
                }
            }
            fields.push(field);
            match chars.next() {
                None => return Some(fields),
                Some(',') => continue,
                // garbage after a closing quote
                Some(_) => return None,
            }
        }

        loop {
            match chars.next() {
                None => {
                    fields.push(field);
                    return Some(fields);
                }
                Some(',') => {
                    fields.push(field);
                    break;
                }
                Some('"') => return None,
                Some(c) => field.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(fields: &[&str]) {
        let encoded = serialize_row(fields).unwrap();
        let (decoded, consumed) = deserialize_row(&encoded).unwrap();
        assert_eq!(decoded, fields);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn test_row_wire_format() {
        let encoded = serialize_row(&["1", "alice"]).unwrap();
        assert_eq!(&encoded[..2], &8u16.to_le_bytes());
        assert_eq!(&encoded[2..], b"1,alice\n");
    }

    #[test]
    fn test_row_escaping_round_trips() {
        round_trip(&["plain", "with,comma", "say \"hi\"", "two\nlines"]);
        round_trip(&[" leading space", "", "trailing,"]);
        round_trip(&["", ""]);
        round_trip(&[""]);
        round_trip(&[]);
    }

    #[test]
    fn test_quoted_field_encoding() {
        let encoded = serialize_row(&["a,b", "c\"d"]).unwrap();
        assert_eq!(&encoded[2..], b"\"a,b\",\"c\"\"d\"\n");
    }

    #[test]
    fn test_deserialize_rejects_short_input() {
        let encoded = serialize_row(&["abc", "def"]).unwrap();
        assert!(deserialize_row(&encoded[..encoded.len() - 1]).is_none());
        assert!(deserialize_row(&encoded[..1]).is_none());
    }

    #[test]
    fn test_zero_length_is_end_sentinel() {
        assert!(deserialize_row(&[0u8; 16]).is_none());
    }

    #[test]
    fn test_deserialize_rejects_malformed_payload() {
        let mut data = vec![4, 0];
        data.extend_from_slice(b"a\"b\n");
        assert!(deserialize_row(&data).is_none());

        let mut data = vec![3, 0];
        data.extend_from_slice(b"\"ab");
        assert!(deserialize_row(&data).is_none());
    }

    #[test]
    fn test_accepts_payload_without_newline() {
        let mut data = vec![3, 0];
        data.extend_from_slice(b"x,y");
        assert_eq!(deserialize_row(&data), Some((vec!["x".into(), "y".into()], 5)));
    }

    #[test]
    fn test_oversized_row_is_rejected() {
        let big = "x".repeat(PAGE_SIZE);
        assert!(matches!(
            serialize_row(&[big]),
            Err(DbError::DataExceedsPageSize { .. })
        ));
    }
}
