//! Header metadata parsing.
//!
//! Two passes over the header section: the first handles the documented
//! line forms (`desc:`, pins, sliders, `config:`, `options:`, `import`,
//! `filename:`), the second scavenges `//author:` and `//tags:` comments —
//! not part of the format, but plenty of scripts in the wild carry their
//! metadata that way.

use std::collections::HashSet;

use crate::config::{ConfigItem, parse_config_line};
use crate::error::LangError;
use crate::num::{parse_int_prefix, parse_number_prefix, trim_spaces_around_equals};
use crate::reader::{StringReader, TextReader};
use crate::section::Section;
use crate::slider::{MAX_SLIDERS, Slider, parse_slider};

/// Highest channel count a script can declare per side.
pub const MAX_CHANNELS: usize = 64;

/// `options:` line values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Shared-memory namespace requested with `gmem=`.
    pub gmem: String,
    /// Memory cap requested with `maxmem=`, 0 when unset.
    pub maxmem: u32,
    /// Preallocation request; `-1` means `prealloc=*` (all up front).
    pub prealloc: i32,
    /// Script wants every keyboard event.
    pub want_all_kb: bool,
    /// Script asks the host to hide its meters.
    pub no_meter: bool,
    /// Requested graphics refresh rate.
    pub gfx_hz: u32,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            gmem: String::new(),
            maxmem: 0,
            prealloc: 0,
            want_all_kb: false,
            no_meter: false,
            gfx_hz: 30,
        }
    }
}

/// Structured header metadata.
#[derive(Debug, Clone)]
pub struct Header {
    /// Effect description from `desc:`.
    pub desc: String,
    /// Author, from `author:` or a `//author:` comment.
    pub author: String,
    /// Tags, from `tags:` or a `//tags:` comment.
    pub tags: Vec<String>,
    /// Input pin names.
    pub in_pins: Vec<String>,
    /// Output pin names.
    pub out_pins: Vec<String>,
    /// Whether any `in_pin:`/`out_pin:` line appeared.
    pub explicit_pins: bool,
    /// Sparse slider table indexed by slider id.
    pub sliders: Vec<Option<Slider>>,
    /// `filename:` resources, in index order.
    pub filenames: Vec<String>,
    /// Unresolved `import` names, in declaration order.
    pub imports: Vec<String>,
    /// Valid `config:` declarations.
    pub config_items: Vec<ConfigItem>,
    /// `options:` line values.
    pub options: HeaderOptions,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            desc: String::new(),
            author: String::new(),
            tags: Vec::new(),
            in_pins: Vec::new(),
            out_pins: Vec::new(),
            explicit_pins: false,
            sliders: vec![None; MAX_SLIDERS],
            filenames: Vec::new(),
            imports: Vec::new(),
            config_items: Vec::new(),
            options: HeaderOptions::default(),
        }
    }
}

impl Header {
    /// Sliders that exist, with their ids.
    pub fn sliders_present(&self) -> impl Iterator<Item = (u32, &Slider)> {
        self.sliders
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|slider| (id as u32, slider)))
    }
}

fn trim_ascii(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Parse a `filename:N,path` line. The index must be checked against the
/// accumulated list by the caller.
fn parse_filename(line: &str) -> Option<(u32, String)> {
    let rest = line.strip_prefix("filename:")?;
    let (index, used) = parse_number_prefix(rest);
    let index = if used == 0 { 0.0 } else { index };
    if index < 0.0 || index > f64::from(u32::MAX) {
        return None;
    }
    let comma = rest.find(',')?;
    Some((index as u32, rest[comma + 1..].to_string()))
}

/// Parse a header [`Section`] into structured metadata.
///
/// The only fatal condition is a duplicate `config:` identifier; malformed
/// sliders and config lines are skipped so the rest of the header loads.
pub fn parse_header(section: &Section) -> Result<Header, LangError> {
    let mut header = Header::default();

    let mut reader = StringReader::new(&section.text);
    let mut line = String::with_capacity(256);
    let mut lineno = section.line_offset;

    // pass 1: regular metadata

    let mut config_identifiers: HashSet<String> = HashSet::new();

    while reader.read_line(&mut line) {
        if let Some(rest) = line.strip_prefix("desc:") {
            if header.desc.is_empty() {
                header.desc = trim_ascii(rest).to_string();
            }
        } else if let Some(rest) = line.strip_prefix("author:") {
            if header.author.is_empty() {
                header.author = trim_ascii(rest).to_string();
            }
        } else if let Some(rest) = line.strip_prefix("tags:") {
            if header.tags.is_empty() {
                header.tags = rest.split_ascii_whitespace().map(str::to_string).collect();
            }
        } else if let Some(rest) = line.strip_prefix("in_pin:") {
            header.explicit_pins = true;
            header.in_pins.push(trim_ascii(rest).to_string());
        } else if let Some(rest) = line.strip_prefix("out_pin:") {
            header.explicit_pins = true;
            header.out_pins.push(trim_ascii(rest).to_string());
        } else if let Some(rest) = line.strip_prefix("config:") {
            let item = parse_config_line(rest);
            if item.is_valid() {
                let identifier = item.identifier.to_ascii_lowercase();
                if !config_identifiers.insert(identifier) {
                    return Err(LangError::DuplicateConfig {
                        line: lineno,
                        identifier: item.identifier,
                    });
                }
                header.config_items.push(item);
            } else {
                tracing::debug!(line = lineno, "skipping invalid config line");
            }
        } else if let Some(rest) = line.strip_prefix("options:") {
            parse_options_line(rest, &mut header.options);
        } else if let Some(rest) = line
            .strip_prefix("import")
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_whitespace()))
        {
            header.imports.push(trim_ascii(&rest[1..]).to_string());
        } else if let Some(slider) = parse_slider(&line) {
            let id = slider.id as usize;
            if id < MAX_SLIDERS {
                header.sliders[id] = Some(slider);
            }
        } else if let Some((index, filename)) = parse_filename(&line) {
            // Indices must arrive in order; anything else is dropped.
            if index as usize == header.filenames.len() {
                header.filenames.push(filename);
            }
        }

        lineno += 1;
    }

    // pass 2: comment metadata

    let mut reader = StringReader::new(&section.text);
    while reader.read_line(&mut line) {
        if let Some(rest) = line.strip_prefix("//author:") {
            if header.author.is_empty() {
                header.author = trim_ascii(rest).to_string();
            }
        } else if let Some(rest) = line.strip_prefix("//tags:") {
            if header.tags.is_empty() {
                header.tags = rest.split_ascii_whitespace().map(str::to_string).collect();
            }
        }
    }

    // A single pin named "none" empties the side.
    if header.in_pins.len() == 1 && header.in_pins[0].eq_ignore_ascii_case("none") {
        header.in_pins.clear();
    }
    if header.out_pins.len() == 1 && header.out_pins[0].eq_ignore_ascii_case("none") {
        header.out_pins.clear();
    }

    header.in_pins.truncate(MAX_CHANNELS);
    header.out_pins.truncate(MAX_CHANNELS);

    Ok(header)
}

fn parse_options_line(rest: &str, options: &mut HeaderOptions) {
    let normalized = trim_spaces_around_equals(rest);
    for opt in normalized.split_ascii_whitespace() {
        let (name, value) = match opt.find('=') {
            Some(pos) => (&opt[..pos], &opt[pos + 1..]),
            None => (opt, ""),
        };
        match name {
            "gmem" => options.gmem = value.to_string(),
            "maxmem" => {
                let maxmem = parse_int_prefix(value);
                options.maxmem = if maxmem < 0 { 0 } else { maxmem as u32 };
            }
            "prealloc" => {
                options.prealloc = if value == "*" {
                    -1
                } else {
                    parse_int_prefix(value) as i32
                };
            }
            "want_all_kb" => options.want_all_kb = true,
            "no_meter" => options.no_meter = true,
            "gfx_hz" => {
                let gfx_hz = parse_int_prefix(value);
                if gfx_hz > 0 && gfx_hz < 2000 {
                    options.gfx_hz = gfx_hz as u32;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_of(text: &str) -> Header {
        let section = Section {
            line_offset: 0,
            text: text.to_string(),
        };
        parse_header(&section).unwrap()
    }

    #[test]
    fn ordinary_header() {
        let header = header_of(
            "desc:The desc\n\
             in_pin:The input 1\n\
             in_pin:The input 2\n\
             out_pin:The output 1\n\
             out_pin:The output 2\n\
             slider43:123.1<45.2,67.3,89.4>Cui cui\n\
             import foo.jsfx-inc\n",
        );
        assert_eq!(header.desc, "The desc");
        assert_eq!(header.in_pins, vec!["The input 1", "The input 2"]);
        assert_eq!(header.out_pins, vec!["The output 1", "The output 2"]);
        assert!(header.explicit_pins);
        assert!(header.sliders[42].is_some());
        assert_eq!(header.imports, vec!["foo.jsfx-inc"]);
    }

    #[test]
    fn single_none_pin_empties_the_side() {
        let header = header_of("in_pin:none\nout_pin:none\n");
        assert!(header.in_pins.is_empty());
        assert!(header.out_pins.is_empty());

        let header = header_of("in_pin:nOnE\nout_pin:NoNe\n");
        assert!(header.in_pins.is_empty());
        assert!(header.out_pins.is_empty());
    }

    #[test]
    fn none_among_other_pins_is_a_name() {
        let header = header_of(
            "in_pin:none\n\
             in_pin:Input\n\
             out_pin:Output\n\
             out_pin:none\n",
        );
        assert_eq!(header.in_pins, vec!["none", "Input"]);
        assert_eq!(header.out_pins, vec!["Output", "none"]);
    }

    #[test]
    fn filenames_in_order() {
        let header = header_of("filename:0,toto\nfilename:1,titi\nfilename:2,tata\n");
        assert_eq!(header.filenames, vec!["toto", "titi", "tata"]);
    }

    #[test]
    fn out_of_order_filenames_are_dropped() {
        let header = header_of("filename:0,toto\nfilename:2,tata\nfilename:1,titi\n");
        assert_eq!(header.filenames, vec!["toto", "titi"]);
    }

    #[test]
    fn first_desc_wins() {
        let header = header_of("desc:first\ndesc:second\n");
        assert_eq!(header.desc, "first");
    }

    #[test]
    fn comment_metadata_fills_gaps() {
        let header = header_of("desc:x\n//author: Someone\n//tags: delay lofi\n");
        assert_eq!(header.author, "Someone");
        assert_eq!(header.tags, vec!["delay", "lofi"]);

        // Explicit lines take precedence over comments.
        let header = header_of("author:Real\n//author: Fake\n");
        assert_eq!(header.author, "Real");
    }

    #[test]
    fn valid_config_is_registered() {
        let header = header_of("config:nch \"Channels\" 8 1 2 4 8\n");
        assert_eq!(header.config_items.len(), 1);
        assert_eq!(header.config_items[0].identifier, "nch");
        assert_eq!(header.config_items[0].var_values, vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn invalid_config_is_skipped() {
        let header = header_of("config:nch Channels 8 1\ndesc:still fine\n");
        assert!(header.config_items.is_empty());
        assert_eq!(header.desc, "still fine");
    }

    #[test]
    fn duplicate_config_identifier_is_fatal() {
        let section = Section {
            line_offset: 0,
            text: "config:nch \"Channels\" 8 1 2\nconfig:NCH \"Other\" 1 1 2\n".to_string(),
        };
        let err = parse_header(&section).unwrap_err();
        assert_eq!(
            err,
            LangError::DuplicateConfig {
                line: 1,
                identifier: "NCH".to_string(),
            }
        );
    }

    #[test]
    fn options_line() {
        let header = header_of("options:gmem=delay_space maxmem=8000000 want_all_kb\n");
        assert_eq!(header.options.gmem, "delay_space");
        assert_eq!(header.options.maxmem, 8_000_000);
        assert!(header.options.want_all_kb);
        assert!(!header.options.no_meter);
        assert_eq!(header.options.gfx_hz, 30);
    }

    #[test]
    fn options_gfx_hz_bounds() {
        assert_eq!(header_of("options:gfx_hz=60\n").options.gfx_hz, 60);
        // Out-of-range and garbage keep the default.
        assert_eq!(header_of("options:gfx_hz=0\n").options.gfx_hz, 30);
        assert_eq!(header_of("options:gfx_hz=5000\n").options.gfx_hz, 30);
        assert_eq!(header_of("options:gfx_hz=fast\n").options.gfx_hz, 30);
    }

    #[test]
    fn options_prealloc_star() {
        assert_eq!(header_of("options:prealloc=*\n").options.prealloc, -1);
        assert_eq!(header_of("options:prealloc=4096\n").options.prealloc, 4096);
    }

    #[test]
    fn options_with_spaces_around_equals() {
        let header = header_of("options:gmem = delay_space\n");
        assert_eq!(header.options.gmem, "delay_space");
    }

    #[test]
    fn import_requires_whitespace() {
        let header = header_of("importx foo\nimport\tbar.jsfx-inc\n");
        assert_eq!(header.imports, vec!["bar.jsfx-inc"]);
    }

    #[test]
    fn pins_are_capped() {
        let mut text = String::new();
        for i in 0..80 {
            text.push_str(&format!("in_pin:input {i}\n"));
        }
        let header = header_of(&text);
        assert_eq!(header.in_pins.len(), MAX_CHANNELS);
    }

    #[test]
    fn line_numbers_honor_section_offset() {
        let section = Section {
            line_offset: 10,
            text: "config:aa \"AA\" 1 1 2\nconfig:aa \"AA\" 1 1 2\n".to_string(),
        };
        let err = parse_header(&section).unwrap_err();
        assert_eq!(err.line(), 11);
    }
}
