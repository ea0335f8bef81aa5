//! RPL preset-bank text format.
//!
//! Byte-compatible with the third-party bank ecosystem:
//!
//! ```text
//! <REAPER_PRESET_LIBRARY `bank name`
//!   <PRESET `preset name`
//!     bm9# ... base64 chunk lines ...
//!   >
//! >
//! ```
//!
//! Each preset's chunk decodes to a text part and a raw part separated by
//! a NUL byte. The text part holds 64 whitespace-separated slider tokens
//! (`-` marks an unset slider), the embedded preset name, and, when any of
//! sliders 64..255 is populated, 192 further tokens. The raw part is the
//! script's `@serialize` output verbatim.

use std::fs;
use std::path::Path;

use rsfx_engine::{SavedState, SliderValue};

use crate::bank::{Bank, Preset};
use crate::base64;
use crate::error::BankError;

const BANK_TAG: &str = "<REAPER_PRESET_LIBRARY";
const PRESET_TAG: &str = "<PRESET";
const CHUNK_LINE_LEN: usize = 128;

/// Load a bank file.
///
/// A missing, unreadable or structurally corrupt file is "no bank"; the
/// caller creates an empty bank on demand.
pub fn load_bank(path: &Path) -> Option<Bank> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "bank not readable");
            return None;
        }
    };
    let bank = parse_bank(&text);
    if bank.is_none() {
        tracing::warn!(path = %path.display(), "corrupt bank file ignored");
    }
    bank
}

/// Write a bank file, creating parent directories as needed.
pub fn save_bank(path: &Path, bank: &Bank) -> Result<(), BankError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BankError::create_dir(parent, e))?;
    }
    fs::write(path, format_bank(bank)).map_err(|e| BankError::write_file(path, e))
}

/// Parse bank text. `None` when the structure or any blob is corrupt.
pub fn parse_bank(text: &str) -> Option<Bank> {
    let mut bank: Option<Bank> = None;
    let mut current: Option<(String, String)> = None;
    let mut skip_depth = 0u32;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Unknown nested records are skipped wholesale.
        if skip_depth > 0 {
            if trimmed.starts_with('<') {
                skip_depth += 1;
            } else if trimmed == ">" {
                skip_depth -= 1;
            }
            continue;
        }

        if let Some((name, mut chunk)) = current.take() {
            if trimmed == ">" {
                let blob = base64::decode(&chunk)?;
                let mut preset = unpack_preset(&blob)?;
                preset.name = name;
                bank.as_mut()?.presets.push(preset);
            } else {
                chunk.push_str(trimmed);
                current = Some((name, chunk));
            }
            continue;
        }

        let tokens = split_tokens(trimmed);
        match tokens.first().map(String::as_str) {
            Some(BANK_TAG) => {
                bank = Some(Bank::new(tokens.get(1).cloned().unwrap_or_default()));
            }
            Some(PRESET_TAG) if bank.is_some() => {
                current = Some((tokens.get(1).cloned()?, String::new()));
            }
            Some(token) if token.starts_with('<') => skip_depth = 1,
            Some(">") => {}
            _ => {}
        }
    }

    bank
}

/// Render a bank to RPL text.
pub fn format_bank(bank: &Bank) -> String {
    let mut out = String::new();
    out.push_str(BANK_TAG);
    out.push(' ');
    out.push_str(&escape_name(&bank.name));
    out.push('\n');
    for preset in &bank.presets {
        out.push_str("  ");
        out.push_str(PRESET_TAG);
        out.push(' ');
        out.push_str(&escape_name(&preset.name));
        out.push('\n');
        let encoded = base64::encode(&pack_preset(preset));
        for chunk in encoded.as_bytes().chunks(CHUNK_LINE_LEN) {
            out.push_str("    ");
            // Chunks are split from pure ASCII base64.
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out.push_str("  >\n");
    }
    out.push_str(">\n");
    out
}

/// Build a preset's binary blob.
pub fn pack_preset(preset: &Preset) -> Vec<u8> {
    let state = &preset.state;
    let extended = state.sliders.iter().any(|s| s.index >= 64);

    let mut text = String::new();
    for index in 0..64 {
        if index > 0 {
            text.push(' ');
        }
        push_slider_token(&mut text, state, index);
    }
    text.push(' ');
    text.push_str(&escape_name(&preset.name));
    if extended {
        for index in 64..256 {
            text.push(' ');
            push_slider_token(&mut text, state, index);
        }
    }

    let mut blob = text.into_bytes();
    blob.push(0);
    blob.extend_from_slice(&state.data);
    blob
}

fn push_slider_token(text: &mut String, state: &SavedState, index: u32) {
    match state.slider(index) {
        Some(value) => text.push_str(&format_number(value)),
        None => text.push('-'),
    }
}

/// Parse a preset's binary blob.
pub fn unpack_preset(blob: &[u8]) -> Option<Preset> {
    let (text, data) = match blob.iter().position(|&b| b == 0) {
        Some(nul) => (&blob[..nul], blob[nul + 1..].to_vec()),
        None => (blob, Vec::new()),
    };
    let text = String::from_utf8_lossy(text);
    let tokens = split_tokens(&text);
    if tokens.len() < 65 {
        return None;
    }

    let mut sliders = Vec::new();
    let mut collect = |range: std::ops::Range<usize>, base: usize, offset: usize| {
        for index in range {
            let token = &tokens[base + index - offset];
            if token == "-" {
                continue;
            }
            if let Ok(value) = token.parse::<f64>() {
                sliders.push(SliderValue {
                    index: index as u32,
                    value,
                });
            }
        }
    };
    collect(0..64, 0, 0);
    let name = tokens[64].clone();
    if tokens.len() >= 65 + 192 {
        collect(64..256, 65, 64);
    }

    Some(Preset {
        blob_name: name.clone(),
        name,
        state: SavedState {
            sliders,
            data,
        },
    })
}

/// Render a number the way bank files do: six decimals, trailing zeros
/// (and a bare trailing point) trimmed.
pub fn format_number(value: f64) -> String {
    let mut s = format!("{value:.6}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Quote a name for bank text when it needs it; inner backticks become
/// apostrophes since the format has no escape character.
pub fn escape_name(name: &str) -> String {
    let needs_quotes = name.is_empty()
        || name.contains([' ', '\t', '"', '\'', '`']);
    if !needs_quotes {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        out.push(if c == '`' { '\'' } else { c });
    }
    out.push('`');
    out
}

/// Split a line into tokens, honoring `` ` ``, `"` and `'` quoting. CR and
/// LF count as plain separators. Quotes are stripped from the stored
/// token; an unterminated quote swallows the rest of the line.
pub fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let quote = bytes[i];
        if quote == b'`' || quote == b'"' || quote == b'\'' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            tokens.push(text[start..i].to_string());
            i += usize::from(i < bytes.len());
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            tokens.push(text[start..i].to_string());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(sliders: &[(u32, f64)], data: &[u8]) -> SavedState {
        SavedState {
            sliders: sliders
                .iter()
                .map(|&(index, value)| SliderValue { index, value })
                .collect(),
            data: data.to_vec(),
        }
    }

    fn preset(name: &str, state: SavedState) -> Preset {
        Preset {
            name: name.to_string(),
            blob_name: name.to_string(),
            state,
        }
    }

    #[test]
    fn tokenizer_handles_quoting() {
        assert_eq!(split_tokens("a b c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_tokens("<PRESET `warm pad`"),
            vec!["<PRESET", "warm pad"]
        );
        assert_eq!(split_tokens("`it's \"ok\"` x"), vec!["it's \"ok\"", "x"]);
        // Unterminated quote swallows the rest.
        assert_eq!(split_tokens("`abc def"), vec!["abc def"]);
        assert_eq!(split_tokens("a\r\nb"), vec!["a", "b"]);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(8.5), "8.5");
        assert_eq!(format_number(-1.25), "-1.25");
        assert_eq!(format_number(0.123456789), "0.123457");
        assert_eq!(format_number(100.0), "100");
    }

    #[test]
    fn name_escaping() {
        assert_eq!(escape_name("plain"), "plain");
        assert_eq!(escape_name("warm pad"), "`warm pad`");
        assert_eq!(escape_name(""), "``");
        assert_eq!(escape_name("back`tick"), "`back'tick`");
        assert_eq!(split_tokens(&escape_name("warm pad")), vec!["warm pad"]);
    }

    #[test]
    fn blob_roundtrip_compact() {
        let p = preset("init", state_with(&[(0, 0.5), (63, -150.0)], b"bytes"));
        let blob = pack_preset(&p);
        // Only the 64-token form when no high slider is populated.
        let text_len = blob.iter().position(|&b| b == 0).unwrap();
        assert_eq!(split_tokens(&String::from_utf8_lossy(&blob[..text_len])).len(), 65);

        let back = unpack_preset(&blob).unwrap();
        assert_eq!(back.name, "init");
        assert_eq!(back.state, p.state);
    }

    #[test]
    fn blob_roundtrip_extended() {
        let p = preset("high", state_with(&[(0, 1.0), (200, 0.25)], &[]));
        let blob = pack_preset(&p);
        let back = unpack_preset(&blob).unwrap();
        assert_eq!(back.state.slider(200), Some(0.25));
        assert_eq!(back.state.slider(1), None);
    }

    #[test]
    fn blob_without_nul_has_no_data() {
        let p = preset("x", state_with(&[(0, 1.0)], &[]));
        let mut blob = pack_preset(&p);
        let nul = blob.iter().position(|&b| b == 0).unwrap();
        blob.truncate(nul);
        let back = unpack_preset(&blob).unwrap();
        assert!(back.state.data.is_empty());
        assert_eq!(back.state.slider(0), Some(1.0));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        assert!(unpack_preset(b"1 2 3\0").is_none());
    }

    #[test]
    fn bank_text_roundtrip() {
        let bank = Bank::new("My Bank")
            .with_preset_added("warm pad", state_with(&[(0, 0.5)], b"\x01\x02"))
            .with_preset_added("plain", state_with(&[(2, -6.0), (100, 3.5)], &[]));

        let text = format_bank(&bank);
        assert!(text.starts_with("<REAPER_PRESET_LIBRARY `My Bank`\n"));

        let back = parse_bank(&text).unwrap();
        assert_eq!(back.name, "My Bank");
        assert_eq!(back.presets.len(), 2);
        assert_eq!(back.presets[0].name, "warm pad");
        assert_eq!(back.presets[0].state, bank.presets[0].state);
        assert_eq!(back.presets[1].state.slider(100), Some(3.5));
    }

    #[test]
    fn long_blobs_wrap_into_chunk_lines() {
        let data = vec![0xAB; 400];
        let bank = Bank::new("b").with_preset_added("big", state_with(&[], &data));
        // An all-unset slider snapshot still needs the 64 placeholder tokens.
        let text = format_bank(&bank);
        let chunk_lines: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("    ") && !l.trim().is_empty())
            .collect();
        assert!(chunk_lines.len() > 1);
        assert!(chunk_lines.iter().all(|l| l.trim().len() <= 128));

        let back = parse_bank(&text).unwrap();
        assert_eq!(back.presets[0].state.data, data);
    }

    #[test]
    fn crlf_bank_files_load() {
        let bank = Bank::new("b").with_preset_added("p", state_with(&[(0, 1.0)], &[]));
        let text = format_bank(&bank).replace('\n', "\r\n");
        let back = parse_bank(&text).unwrap();
        assert_eq!(back.presets[0].state.slider(0), Some(1.0));
    }

    #[test]
    fn corrupt_chunk_fails_the_whole_bank() {
        let text = "<REAPER_PRESET_LIBRARY b\n  <PRESET p\n    ***\n  >\n>\n";
        assert!(parse_bank(text).is_none());
    }

    #[test]
    fn unknown_nested_records_are_skipped() {
        let bank = Bank::new("b").with_preset_added("p", state_with(&[(0, 2.0)], &[]));
        let mut text = String::from("<REAPER_PRESET_LIBRARY b\n  <SOMETHING_ELSE x\n    data\n  >\n");
        for line in format_bank(&bank).lines().skip(1) {
            text.push_str(line);
            text.push('\n');
        }
        let back = parse_bank(&text).unwrap();
        assert_eq!(back.presets.len(), 1);
    }

    #[test]
    fn file_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banks").join("fx.rpl");
        assert!(load_bank(&path).is_none());

        let bank = Bank::new("fx").with_preset_added("a", state_with(&[(0, 1.0)], b"xyz"));
        save_bank(&path, &bank).unwrap();
        let back = load_bank(&path).unwrap();
        assert_eq!(back.presets[0].state.data, b"xyz");
    }

    #[test]
    fn corrupt_file_loads_as_no_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.rpl");
        std::fs::write(&path, "this is not a bank\n").unwrap();
        assert!(load_bank(&path).is_none());
    }
}
