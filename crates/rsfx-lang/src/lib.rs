//! Script-text front end for the rsfx effect host.
//!
//! This crate turns raw script source into structured data, stopping short
//! of compilation: the [`preprocess`] pass expands `<? ?>` meta-code, the
//! [`section`] splitter partitions a file into its `@`-tagged sections, and
//! the [`header`], [`slider`] and [`config`] parsers extract metadata from
//! the header section. All grammars are deliberately permissive; scripts in
//! the wild rely on that.
//!
//! Typical flow:
//!
//! ```
//! use rsfx_lang::{parse_header, parse_toplevel, StringReader};
//!
//! let text = "desc:gain\nslider1:0<-60,12,0.1>Gain (dB)\n@sample\nspl0 *= g;\n";
//! let toplevel = parse_toplevel(&mut StringReader::new(text), false)?;
//! let header = parse_header(&toplevel.header)?;
//! assert_eq!(header.desc, "gain");
//! # Ok::<(), rsfx_lang::LangError>(())
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod header;
mod num;
pub mod preprocess;
pub mod reader;
pub mod section;
pub mod slider;

pub use config::{ConfigItem, parse_config_line};
pub use error::LangError;
pub use eval::{EvalError, Interpreter, MetaEvaluator};
pub use header::{Header, HeaderOptions, MAX_CHANNELS, parse_header};
pub use preprocess::preprocess;
pub use reader::{StreamReader, StringReader, TextReader};
pub use section::{Section, Toplevel, parse_toplevel};
pub use slider::{MAX_SLIDERS, Slider, SliderShape, parse_slider};
