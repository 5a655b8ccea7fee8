use super::line_reader::PatchLineReader;
use super::INDEX_PREFIX;
use crate::error::{PatchError, PatchResult};
use crate::types::{BinaryPayload, SinglePatch};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIME_PREFIX: &str = "MIME: ";

static BINARY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^MIME: (.*?); encoding: (.*?); length: (-?\d+)$").unwrap());

pub fn read_binary_patch(
    reader: &mut PatchLineReader<'_>,
    patch: &mut SinglePatch,
) -> PatchResult<()> {
    let mut payload: Option<BinaryPayload> = None;
    let mut first_line: Option<(usize, &str)> = None;

    while let Some(line) = reader.next_line() {
        if line.is_empty() || line.starts_with(INDEX_PREFIX) {
            reader.unread();
            break;
        }

        if let Some(BinaryPayload::Content { lines, .. }) = payload.as_mut() {
            lines.push(line.to_string());
            continue;
        }

        first_line.get_or_insert((reader.line_number(), line));
        let Some(caps) = BINARY_HEADER.captures(line) else {
            continue;
        };
        let length: i64 = caps[3].parse().map_err(|_| {
            PatchError::format(reader.line_number(), line, "binary length out of range")
        })?;
        if length == -1 {
            payload = Some(BinaryPayload::Delete);
            break;
        }
        payload = Some(BinaryPayload::Content {
            mime_type: caps[1].to_string(),
            encoding: caps[2].to_string(),
            length,
            lines: Vec::new(),
        });
    }

    let payload = payload.ok_or_else(|| {
        let (line_number, line) = first_line.unwrap_or((reader.line_number(), ""));
        PatchError::format(line_number, line, "missing binary header")
    })?;
    patch.binary = Some(payload);
    Ok(())
}

/// Decodes the body of a binary patch into the bytes to write.
pub fn decode_payload(encoding: &str, lines: &[String]) -> PatchResult<Vec<u8>> {
    if !encoding.eq_ignore_ascii_case("base64") {
        return Err(PatchError::InvalidBinary {
            reason: format!("unsupported encoding {:?}", encoding),
        });
    }

    let joined: String = lines
        .iter()
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    STANDARD
        .decode(joined)
        .map_err(|e| PatchError::InvalidBinary {
            reason: e.to_string(),
        })
}
