//! `config:` line grammar.
//!
//! Format: `identifier "display name" default option option=label ...`.
//! Options are numbers; an option may carry a human label after `=`, quoted
//! or bare. A numeric option without a label uses its own literal text as
//! the label. The quote handling mirrors the reference host, quirks
//! included: single-quoted labels keep their quotes, an unterminated quote
//! swallows the rest of the line.

use crate::num::parse_number_prefix;

/// One parsed configuration choice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigItem {
    /// Script-visible variable name.
    pub identifier: String,
    /// Human-readable name shown by hosts.
    pub name: String,
    /// Option labels, parallel to `var_values`.
    pub var_names: Vec<String>,
    /// Option values, parallel to `var_names`.
    pub var_values: Vec<f64>,
    /// Default option value.
    pub default_value: f64,
}

impl ConfigItem {
    /// Whether the line declared a usable choice.
    ///
    /// Hosts require at least two options; a failed line is skipped, not
    /// fatal to the header.
    pub fn is_valid(&self) -> bool {
        self.identifier.len() >= 2
            && self.name.len() >= 2
            && self.var_names.len() >= 2
            && self.var_values.len() >= 2
            && self.var_names.len() == self.var_values.len()
            && self.var_names.iter().all(|name| !name.is_empty())
    }
}

/// Parse the text after a `config:` prefix.
///
/// Never fails; an unusable line simply yields an item whose
/// [`is_valid`](ConfigItem::is_valid) is false.
pub fn parse_config_line(rest: &str) -> ConfigItem {
    let mut item = ConfigItem::default();
    let b = rest.as_bytes();
    let len = b.len();
    let mut cur = 0usize;

    while cur < len && b[cur].is_ascii_whitespace() {
        cur += 1;
    }

    // Identifier, up to whitespace.
    let ident_start = cur;
    while cur < len && !b[cur].is_ascii_whitespace() {
        cur += 1;
    }
    item.identifier = rest[ident_start..cur].to_string();

    while cur < len && b[cur].is_ascii_whitespace() {
        cur += 1;
    }
    if cur >= len {
        return item;
    }

    // Display name, optionally quoted with " or '.
    let name_start = cur;
    let closing = match b[cur] {
        q @ (b'"' | b'\'') => q,
        _ => b' ',
    };
    let mut pos = cur + 1;
    while pos < len && b[pos] != closing {
        pos += 1;
    }
    item.name = if closing == b'"' {
        rest[name_start + 1..pos].to_string()
    } else {
        rest[name_start..pos].to_string()
    };

    cur = (pos + 1).min(len);
    while cur < len && b[cur].is_ascii_whitespace() {
        cur += 1;
    }

    // Default value.
    let (default_value, used) = parse_number_prefix(&rest[cur..]);
    item.default_value = default_value;
    if used == 0 {
        return item;
    }
    cur += used;

    // The reference parser steps one byte past the default before scanning
    // options; keep that quirk.
    cur = (cur + 1).min(len);

    while cur < len {
        while cur < len && b[cur].is_ascii_whitespace() {
            cur += 1;
        }

        let (value, used) = parse_number_prefix(&rest[cur..]);
        if used == 0 {
            return item;
        }
        let mut label = rest[cur..cur + used]
            .trim_start_matches(|c: char| c.is_ascii_whitespace())
            .to_string();
        cur += used;

        while cur < len && b[cur].is_ascii_whitespace() {
            cur += 1;
        }

        if cur < len && b[cur] == b'=' {
            cur += 1;
            while cur < len && b[cur].is_ascii_whitespace() {
                cur += 1;
            }
            if cur < len {
                let closing = match b[cur] {
                    q @ (b'"' | b'\'') => q,
                    _ => b' ',
                };
                let mut pos = cur + 1;
                while pos < len && b[pos] != closing {
                    pos += 1;
                }
                label = match closing {
                    b'"' => rest[cur + 1..pos].to_string(),
                    b' ' => rest[cur..pos].to_string(),
                    // Single quotes are kept, closing one included if found.
                    _ => rest[cur..(pos + usize::from(pos < len)).min(len)].to_string(),
                };
                cur = (pos + usize::from(pos < len)).min(len);
            }
        }

        item.var_names.push(label);
        item.var_values.push(value);
    }

    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(
        line: &str,
        id: &str,
        name: &str,
        var_names: &[&str],
        var_values: &[f64],
        default_value: f64,
    ) {
        let item = parse_config_line(line);
        assert_eq!(item.identifier, id, "{line}");
        assert_eq!(item.name, name, "{line}");
        assert_eq!(item.var_names, var_names, "{line}");
        assert_eq!(item.var_values, var_values, "{line}");
        assert_eq!(item.default_value, default_value, "{line}");
        assert!(item.is_valid(), "{line}");
    }

    fn invalid(line: &str) {
        assert!(!parse_config_line(line).is_valid(), "{line}");
    }

    #[test]
    fn quoted_name_and_labeled_option() {
        validate(
            " nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "48"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
        validate(
            "nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "48"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn single_quoted_labels_keep_their_quotes() {
        validate(
            "nch \"Channels\" 8 1 2 4 8='8 (namesake)' 12 16 24 32 48",
            "nch",
            "Channels",
            &[
                "1",
                "2",
                "4",
                "'8 (namesake)'",
                "12",
                "16",
                "24",
                "32",
                "48",
            ],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn unterminated_single_quote_swallows_the_rest() {
        validate(
            "nch \"Channels\" 8 1 2 4 8='8 (namesake)\" 12 16 24 32 48",
            "nch",
            "Channels",
            &["1", "2", "4", "'8 (namesake)\" 12 16 24 32 48"],
            &[1.0, 2.0, 4.0, 8.0],
            8.0,
        );
    }

    #[test]
    fn double_quote_inside_single_quotes() {
        validate(
            "nch \"Channels\" 8 1 2 4 8='8 (name\"sake)' 12 16 24 32 48",
            "nch",
            "Channels",
            &[
                "1",
                "2",
                "4",
                "'8 (name\"sake)'",
                "12",
                "16",
                "24",
                "32",
                "48",
            ],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn spaces_around_label_equals() {
        validate(
            "nch \"Channels\" 8 1 2 4 8 =   \"8 (namesake)\" 12 16 24 32 48",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "48"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn trailing_empty_label_falls_back_to_number() {
        validate(
            "nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48=",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "48"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn trailing_quoted_label() {
        validate(
            "nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48='blip'",
            "nch",
            "Channels",
            &[
                "1",
                "2",
                "4",
                "8 (namesake)",
                "12",
                "16",
                "24",
                "32",
                "'blip'",
            ],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn bare_label_after_spaced_equals() {
        validate(
            "nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48= blip",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "blip"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn unterminated_double_quote_label() {
        validate(
            "nch \"Channels\" 8 1 2 4 8=\"8 (namesake)\" 12 16 24 32 48=\"blip",
            "nch",
            "Channels",
            &["1", "2", "4", "8 (namesake)", "12", "16", "24", "32", "blip"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn unquoted_name_and_heavy_whitespace() {
        validate(
            "nch Channels 8 1 2 = test    4 8  =   \"8 (namesake)\"    12 16 24   32 48  = 'blip",
            "nch",
            "Channels",
            &["1", "test", "4", "8 (namesake)", "12", "16", "24", "32", "'blip"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0],
            8.0,
        );
    }

    #[test]
    fn default_not_among_options_is_kept() {
        validate(
            "nch Channels 100 1 2 = test    4 8  =   \"8 (namesake)\"    12 14 24   32 48  = 'blip",
            "nch",
            "Channels",
            &["1", "test", "4", "8 (namesake)", "12", "14", "24", "32", "'blip"],
            &[1.0, 2.0, 4.0, 8.0, 12.0, 14.0, 24.0, 32.0, 48.0],
            100.0,
        );
    }

    #[test]
    fn short_option_lists() {
        validate(
            "nch Channels 3 1 =5 2=",
            "nch",
            "Channels",
            &["5", "2"],
            &[1.0, 2.0],
            3.0,
        );
    }

    #[test]
    fn invalid_lines() {
        invalid("nch Channels");
        invalid("nch ");
        invalid("");
        invalid("nch Channels 8");
        invalid("nch Channels ");
        invalid("nch Channels 8 1"); // at least two options are required
        invalid("nch Channels 8 1 ");
        invalid("nch Channels 8 1 =5");
        invalid("nch Channels 8=\"test\" 1 2 3");
    }
}
