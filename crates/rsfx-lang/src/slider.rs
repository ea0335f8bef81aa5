//! Slider declaration grammar.
//!
//! This parser is intentionally very permissive: real-world scripts contain
//! every imaginable malformation of the slider line, and the reference
//! behavior absorbs stray punctuation and garbage tokens as long as the
//! numeric fields stay extractable. Tightening it would reject scripts that
//! load fine elsewhere, so treat the misc cases in the tests below as a
//! conformance corpus.

use crate::num::parse_number_prefix;

/// Highest allowed number of sliders per script.
pub const MAX_SLIDERS: usize = 256;

/// Value-mapping shape of a slider range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SliderShape {
    /// Plain linear mapping.
    #[default]
    Linear,
    /// Logarithmic mapping; the modifier is the desired midpoint value.
    Log,
    /// Power-law mapping; the modifier is the exponent.
    Square,
}

/// One parsed `sliderN:` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    /// 0-based slider index (declaration says `sliderN` with N = id + 1).
    pub id: u32,
    /// Script variable bound to the slider; `sliderN` when not named.
    pub var: String,
    /// Default value.
    pub def: f64,
    /// Range minimum.
    pub min: f64,
    /// Range maximum.
    pub max: f64,
    /// Step increment.
    pub inc: f64,
    /// Range mapping shape.
    pub shape: SliderShape,
    /// Shape parameter (log midpoint or power exponent).
    pub shape_modifier: f64,
    /// Enumerated slider (`{a,b,c}` list or path form).
    pub is_enum: bool,
    /// Labels of an enumerated slider, in declaration order.
    pub enum_names: Vec<String>,
    /// Directory of a path-valued slider, empty otherwise.
    pub path: String,
    /// User-facing description.
    pub desc: String,
    /// False when the description carried a `-` visibility prefix.
    pub initially_visible: bool,
}

impl Default for Slider {
    fn default() -> Self {
        Self {
            id: 0,
            var: String::new(),
            def: 0.0,
            min: 0.0,
            max: 0.0,
            inc: 0.0,
            shape: SliderShape::Linear,
            shape_modifier: 0.0,
            is_enum: false,
            enum_names: Vec::new(),
            path: String::new(),
            desc: String::new(),
            initially_visible: true,
        }
    }
}

/// Parse one header line as a slider declaration.
///
/// Returns `None` when the line is not a slider (or too broken to salvage);
/// the header parser then tries its other line forms.
pub fn parse_slider(line: &str) -> Option<Slider> {
    let b = line.as_bytes();
    let mut slider = Slider::default();

    if b.len() < 6 || !b[..6].eq_ignore_ascii_case(b"slider") {
        return None;
    }
    let mut cur = 6usize;

    // ID, declared 1-based.
    let id_start = cur;
    while cur < b.len() && b[cur].is_ascii_digit() {
        cur += 1;
    }
    let id: u64 = line[id_start..cur].parse().ok()?;
    if id < 1 || id > MAX_SLIDERS as u64 {
        return None;
    }
    slider.id = (id - 1) as u32;

    if b.get(cur) != Some(&b':') {
        return None;
    }
    cur += 1;

    while cur < b.len() && b[cur].is_ascii_whitespace() {
        cur += 1;
    }

    // A custom variable name exists if '=' appears before any '<' or ','.
    {
        let mut pos = cur;
        let mut equals = None;
        while pos < b.len() {
            match b[pos] {
                b'=' => {
                    equals = Some(pos);
                    break;
                }
                b'<' | b',' => break,
                _ => pos += 1,
            }
        }
        if let Some(eq) = equals {
            slider.var = line[cur..eq].to_string();
            cur = eq + 1;
        } else {
            slider.var = format!("slider{}", id);
        }
    }

    if b.get(cur) == Some(&b'/') {
        // Path slider: /dir:default:description
        let path_start = cur;
        while cur < b.len() && b[cur] != b':' {
            cur += 1;
        }
        if cur >= b.len() {
            return None;
        }
        slider.path = line[path_start..cur].to_string();
        cur += 1;

        let (def, used) = parse_number_prefix(&line[cur..]);
        slider.def = def;
        cur += used;
        slider.inc = 1.0;
        slider.is_enum = true;

        while cur < b.len() && b[cur] != b':' {
            cur += 1;
        }
        if cur >= b.len() {
            return None;
        }
        cur += 1;
    } else {
        // Regular slider: default, optional <min,max,inc{enums}:shape>.
        let (def, used) = parse_number_prefix(&line[cur..]);
        slider.def = def;
        cur += used;

        while cur < b.len() && b[cur] != b',' && b[cur] != b'<' {
            cur += 1;
        }
        if cur >= b.len() {
            return None;
        }

        if b[cur] == b',' {
            cur += 1;
        } else {
            // b[cur] == b'<'
            cur += 1;

            let (min, used) = parse_number_prefix(&line[cur..]);
            slider.min = min;
            cur += used;

            while cur < b.len() && b[cur] != b',' && b[cur] != b'>' {
                cur += 1;
            }
            if cur >= b.len() {
                return None;
            }

            if b[cur] == b',' {
                cur += 1;
                let (max, used) = parse_number_prefix(&line[cur..]);
                slider.max = max;
                cur += used;

                while cur < b.len() && b[cur] != b',' && b[cur] != b'>' {
                    cur += 1;
                }
                if cur >= b.len() {
                    return None;
                }
            }

            if b[cur] == b',' {
                cur += 1;
                let (inc, used) = parse_number_prefix(&line[cur..]);
                slider.inc = inc;
                cur += used;

                while cur < b.len() && b[cur] != b'{' && b[cur] != b'>' && b[cur] != b':' {
                    cur += 1;
                }
                if cur >= b.len() {
                    return None;
                }

                if b[cur] == b'{' {
                    cur += 1;
                    let names_start = cur;
                    while cur < b.len() && b[cur] != b'}' && b[cur] != b'>' {
                        cur += 1;
                    }
                    if cur >= b.len() {
                        return None;
                    }
                    slider.is_enum = true;
                    slider.enum_names = line[names_start..cur]
                        .split(',')
                        .filter(|name| !name.is_empty())
                        .map(|name| {
                            name.trim_matches(|c: char| c.is_ascii_whitespace()).to_string()
                        })
                        .collect();
                }

                if b.get(cur) == Some(&b':') {
                    cur += 1;
                    if line[cur..].len() >= 3 {
                        let word = &b[cur..cur + 3];
                        if word.eq_ignore_ascii_case(b"log") {
                            slider.shape = SliderShape::Log;
                            cur += 3;
                        } else if word.eq_ignore_ascii_case(b"sqr") {
                            slider.shape = SliderShape::Square;
                            slider.shape_modifier = 2.0;
                            cur += 3;
                        }
                    }

                    if b.get(cur) == Some(&b'=') {
                        cur += 1;
                        let (modifier, used) = parse_number_prefix(&line[cur..]);
                        slider.shape_modifier = modifier;
                        cur += used;

                        // Degenerate modifiers silently demote to linear.
                        if modifier.abs() < 0.0001 {
                            if slider.shape == SliderShape::Square {
                                slider.shape = SliderShape::Linear;
                            }
                        } else if (modifier - slider.min).abs() < 0.0000001 {
                            slider.shape = SliderShape::Linear;
                        }
                        if (slider.max - slider.min).abs() < 1e-12 {
                            slider.shape = SliderShape::Linear;
                        }

                        while cur < b.len() && b[cur] != b'>' {
                            cur += 1;
                        }
                        if cur >= b.len() {
                            return None;
                        }
                    }
                }
            }

            while cur < b.len() && b[cur] != b'>' {
                cur += 1;
            }
            if cur >= b.len() {
                return None;
            }
            cur += 1;
        }

        while cur < b.len() && (b[cur] == b',' || b[cur].is_ascii_whitespace()) {
            cur += 1;
        }
        if cur >= b.len() {
            return None;
        }
    }

    // Enumerated ranges are recomputed from the label count.
    if slider.is_enum && !slider.enum_names.is_empty() {
        slider.min = 0.0;
        slider.inc = 1.0;
        slider.max = (slider.enum_names.len() - 1) as f64;
    }

    // Description; a '-' prefix hides the slider until the script shows it.
    while cur < b.len() && b[cur].is_ascii_whitespace() {
        cur += 1;
    }
    if b.get(cur) == Some(&b'-') {
        cur += 1;
        slider.initially_visible = false;
    }
    slider.desc = line[cur..].trim_matches(|c: char| c.is_ascii_whitespace()).to_string();
    if slider.desc.is_empty() {
        return None;
    }

    Some(slider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(
        line: &str,
        id: u32,
        desc: &str,
        def: f64,
        min: f64,
        max: f64,
        inc: f64,
        shape: SliderShape,
        shape_modifier: f64,
    ) {
        let slider = parse_slider(line).unwrap();
        assert_eq!(slider.id, id);
        assert_eq!(slider.desc, desc);
        assert_eq!(slider.def, def);
        assert_eq!(slider.min, min);
        assert_eq!(slider.max, max);
        assert_eq!(slider.inc, inc);
        assert_eq!(slider.shape, shape);
        assert_eq!(slider.shape_modifier, shape_modifier);
        assert!(!slider.is_enum);
        assert!(slider.enum_names.is_empty());
        assert!(slider.path.is_empty());
    }

    #[test]
    fn minimal_range_syntax() {
        let slider = parse_slider("slider43:123,Cui cui").unwrap();
        assert_eq!(slider.id, 42);
        assert_eq!(slider.var, "slider43");
        assert_eq!(slider.desc, "Cui cui");
        assert_eq!(slider.def, 123.0);
        assert_eq!((slider.min, slider.max, slider.inc), (0.0, 0.0, 0.0));
    }

    #[test]
    fn slider_zero_is_invalid() {
        assert!(parse_slider("slider0:123,Cui cui").is_none());
    }

    #[test]
    fn no_range_triple() {
        regular(
            "slider43:123.1,Cui cui",
            42,
            "Cui cui",
            123.1,
            0.0,
            0.0,
            0.0,
            SliderShape::Linear,
            0.0,
        );
    }

    #[test]
    fn empty_angle_brackets() {
        regular(
            "slider43:123.1<>,Cui cui",
            42,
            "Cui cui",
            123.1,
            0.0,
            0.0,
            0.0,
            SliderShape::Linear,
            0.0,
        );
    }

    #[test]
    fn full_range_triple() {
        regular(
            "slider43:123.1<45.2,67.3,89.4>Cui cui",
            42,
            "Cui cui",
            123.1,
            45.2,
            67.3,
            89.4,
            SliderShape::Linear,
            0.0,
        );
    }

    #[test]
    fn log_shape() {
        regular(
            "slider43:20<20.0,22050,0.01:log>log me",
            42,
            "log me",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Log,
            0.0,
        );
    }

    #[test]
    fn log_shape_with_midpoint() {
        regular(
            "slider43:20<20.0,22050,0.01:log=5000>log me",
            42,
            "log me",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Log,
            5000.0,
        );
    }

    #[test]
    fn log_shape_with_garbage_tokens() {
        regular(
            "slider43:20<20.0,22050,0.01,-.,#+,@abcd:log=5000>log me",
            42,
            "log me",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Log,
            5000.0,
        );
        regular(
            "slider43:20<20.0,22050,0.01,-.,#+,@abcd:log=5000.#=1414?-+<,>log me",
            42,
            "log me",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Log,
            5000.0,
        );
    }

    #[test]
    fn shape_name_is_case_insensitive() {
        regular(
            "slider43:20<20.0,22050,0.01:LOg>captains log",
            42,
            "captains log",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Log,
            0.0,
        );
    }

    #[test]
    fn log_midpoint_too_close_to_min_demotes() {
        regular(
            "slider43:20<20.0,22050,0.01:LOg=20>captains log",
            42,
            "captains log",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Linear,
            20.0,
        );
    }

    #[test]
    fn log_with_degenerate_range_demotes() {
        regular(
            "slider43:20<20.0,20.0,0.01:LOg=10>captains log",
            42,
            "captains log",
            20.0,
            20.0,
            20.0,
            0.01,
            SliderShape::Linear,
            10.0,
        );
    }

    #[test]
    fn sqr_shape_defaults_modifier_two() {
        regular(
            "slider43:20<20.0,22050,0.01:sqr>square",
            42,
            "square",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Square,
            2.0,
        );
    }

    #[test]
    fn sqr_shape_with_modifier() {
        regular(
            "slider43:20<20.0,22050,0.01:sqr=3>square",
            42,
            "square",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Square,
            3.0,
        );
    }

    #[test]
    fn sqr_zero_modifier_demotes_to_linear() {
        regular(
            "slider43:20<20.0,22050,0.01:sqr=0>square",
            42,
            "square",
            20.0,
            20.0,
            22050.0,
            0.01,
            SliderShape::Linear,
            0.0,
        );
    }

    #[test]
    fn path_slider() {
        let slider = parse_slider("slider43:/titi:777:Cui cui").unwrap();
        assert_eq!(slider.id, 42);
        assert_eq!(slider.desc, "Cui cui");
        assert_eq!(slider.def, 777.0);
        assert_eq!(slider.path, "/titi");
        assert!(slider.is_enum);
        assert!(slider.enum_names.is_empty());
        assert_eq!((slider.min, slider.max, slider.inc), (0.0, 0.0, 1.0));
    }

    #[test]
    fn enum_slider() {
        let slider = parse_slider("slider5:0<0,2,1{LP,BP,HP}>Type").unwrap();
        assert_eq!(slider.id, 4);
        assert_eq!(slider.desc, "Type");
        assert!(slider.is_enum);
        assert_eq!(slider.enum_names, vec!["LP", "BP", "HP"]);
        assert_eq!((slider.min, slider.max, slider.inc), (0.0, 2.0, 1.0));
    }

    #[test]
    fn enum_slider_with_stray_bracket() {
        let slider = parse_slider("slider5:0<0,2,1<{LP,BP,HP}>Type").unwrap();
        assert!(slider.is_enum);
        assert_eq!(slider.enum_names, vec!["LP", "BP", "HP"]);
        assert_eq!((slider.min, slider.max, slider.inc), (0.0, 2.0, 1.0));
    }

    #[test]
    fn hidden_slider_prefix() {
        let slider = parse_slider("slider4:0<0,1,0.1>-the slider 4").unwrap();
        assert!(!slider.initially_visible);
        assert_eq!(slider.desc, "the slider 4");

        let visible = parse_slider("slider1:0<0,1,0.1>the slider 1").unwrap();
        assert!(visible.initially_visible);
    }

    #[test]
    fn named_variable() {
        let slider = parse_slider("slider1:foo=1<1,3,0.1>the slider 1").unwrap();
        assert_eq!(slider.var, "foo");
        assert_eq!(slider.def, 1.0);
    }

    #[test]
    fn missing_description_is_rejected() {
        assert!(parse_slider("slider1:0<0,1,0.1>").is_none());
        assert!(parse_slider("slider1:0<0,1,0.1>-").is_none());
    }

    #[test]
    fn misc_permissive_corpus() {
        // Conformance corpus of real-world malformations; all must parse to
        // the same numeric fields.
        for line in [
            "slider1:official=0<-150,12,1>official",
            "slider2:0<-150,12,1>official no var.name",
            "slider3:=0<-150,12,1>=value",
            "slider4:<-150,12,1>no default",
            "slider5:0<-150,12,1,,,>toomanycommas",
            "slider6:0<-150,12,1,2,3,4>toomanyvalues",
            "slider7:0time<-150kilo,12uhr,1euro>strings",
            "slider8:0*2<-150-151,12=13,1+3>math?",
            "slider9:+/-0a0<-150<<-149<,12...13,1 3><v<<al..u e>",
            "slider10:a1?+!%&<-150%&=/?+!,12!%/&?+=,1=/?+!%&>?+!%&=/",
            "SLIDER11:shouty=0<-150,12,1>shouty",
            "SlIdEr12:infantile=0<-150,12,1>hehe",
            "slider13: compRatio=0<-150,12,1> Ratio [x:1]",
            "slider14:  compRatio2=0<-150,12,1> Ratio [x:1]",
            "slider15:  all_the_spaces   = 0 < -150 , 12 , 1    > Ratio [x:1]",
        ] {
            let slider = parse_slider(line).unwrap_or_else(|| panic!("rejected: {line}"));
            assert_eq!(slider.def, 0.0, "{line}");
            assert_eq!(slider.min, -150.0, "{line}");
            assert_eq!(slider.max, 12.0, "{line}");
            assert_eq!(slider.inc, 1.0, "{line}");
            assert_eq!(slider.shape, SliderShape::Linear, "{line}");
            assert!(!slider.is_enum, "{line}");
        }
    }

    #[test]
    fn default_variable_name_follows_declared_index() {
        let slider = parse_slider("slider2:0<-150,12,1>no var").unwrap();
        assert_eq!(slider.var, "slider2");
    }
}
