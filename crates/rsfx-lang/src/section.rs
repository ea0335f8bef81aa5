//! Section splitting.
//!
//! A script is partitioned into named sections by `@name` markers at line
//! starts. The header is everything before the first marker and always
//! exists, even for empty input. Re-opened sections are concatenated with
//! blank-line padding so that a section's internal line numbers stay
//! consistent with a single `line_offset`.

use crate::error::LangError;
use crate::num::parse_int_prefix;
use crate::reader::TextReader;

/// One named block of script source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// 0-based original-source line where the section content begins.
    pub line_offset: u32,
    /// Section text, newline-terminated per source line.
    pub text: String,
}

impl Section {
    /// An empty section starting at `line_offset`.
    pub fn with_offset(line_offset: u32) -> Self {
        Self {
            line_offset,
            text: String::new(),
        }
    }
}

/// A script split into its sections.
#[derive(Debug, Clone, Default)]
pub struct Toplevel {
    /// Header metadata text; always present, offset 0.
    pub header: Section,
    /// `@init` section.
    pub init: Option<Section>,
    /// `@slider` section.
    pub slider: Option<Section>,
    /// `@block` section.
    pub block: Option<Section>,
    /// `@sample` section.
    pub sample: Option<Section>,
    /// `@serialize` section.
    pub serialize: Option<Section>,
    /// `@gfx` section.
    pub gfx: Option<Section>,
    /// Requested graphics width from `@gfx W H`, 0 when unspecified.
    pub gfx_w: u32,
    /// Requested graphics height from `@gfx W H`, 0 when unspecified.
    pub gfx_h: u32,
}

/// The section a splitter is currently appending to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Header,
    Init,
    Slider,
    Block,
    Sample,
    Serialize,
    Gfx,
}

/// The tagged-section slot for `slot`, or `None` for the header.
fn slot_of(toplevel: &mut Toplevel, slot: Slot) -> Option<&mut Option<Section>> {
    match slot {
        Slot::Header => None,
        Slot::Init => Some(&mut toplevel.init),
        Slot::Slider => Some(&mut toplevel.slider),
        Slot::Block => Some(&mut toplevel.block),
        Slot::Sample => Some(&mut toplevel.sample),
        Slot::Serialize => Some(&mut toplevel.serialize),
        Slot::Gfx => Some(&mut toplevel.gfx),
    }
}

/// Open (or re-open) the section in `slot`, padding a re-opened section
/// with blank lines up to `line_no` so its line numbering stays coherent.
fn open_section(slot: &mut Option<Section>, line_no: u32) {
    match slot {
        Some(section) => {
            let lines = section.text.bytes().filter(|&b| b == b'\n').count() as u32;
            let pad = (line_no + 1).saturating_sub(section.line_offset + lines);
            for _ in 0..pad {
                section.text.push('\n');
            }
        }
        None => {
            *slot = Some(Section::with_offset(line_no + 1));
        }
    }
}

/// Split `reader` into sections.
///
/// With `only_header` set, parsing stops at the first `@` marker; only the
/// header section is populated. An unrecognized `@name` is a hard error.
pub fn parse_toplevel(
    reader: &mut dyn TextReader,
    only_header: bool,
) -> Result<Toplevel, LangError> {
    let mut toplevel = Toplevel::default();
    let mut current = Slot::Header;

    let mut line = String::with_capacity(256);
    let mut lineno: u32 = 0;

    while reader.read_line(&mut line) {
        if line.starts_with('@') {
            if only_header {
                return Ok(toplevel);
            }

            let mut tokens = line.split_ascii_whitespace();
            let tag = tokens.next().unwrap_or("");

            current = match tag {
                "@init" => Slot::Init,
                "@slider" => Slot::Slider,
                "@block" => Slot::Block,
                "@sample" => Slot::Sample,
                "@serialize" => Slot::Serialize,
                "@gfx" => {
                    let w = tokens.next().map_or(0, parse_int_prefix);
                    let h = tokens.next().map_or(0, parse_int_prefix);
                    toplevel.gfx_w = if w > 0 { w as u32 } else { 0 };
                    toplevel.gfx_h = if h > 0 { h as u32 } else { 0 };
                    Slot::Gfx
                }
                _ => {
                    return Err(LangError::UnrecognizedSection {
                        line: lineno,
                        text: line.clone(),
                    });
                }
            };

            if let Some(slot) = slot_of(&mut toplevel, current) {
                open_section(slot, lineno);
            }
        } else {
            // The slot was opened when its tag was seen; the default here is
            // never constructed and only sidesteps an unwrap.
            let section = match slot_of(&mut toplevel, current) {
                Some(slot) => slot.get_or_insert_with(Section::default),
                None => &mut toplevel.header,
            };
            section.text.push_str(&line);
            section.text.push('\n');
        }

        lineno += 1;
    }

    Ok(toplevel)
}
