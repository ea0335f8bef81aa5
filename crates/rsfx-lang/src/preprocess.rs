//! Meta-code preprocessor.
//!
//! Scans raw source for `<? ... ?>` blocks, evaluates each block with a
//! [`MetaEvaluator`] and splices the block's printed output into the result
//! in place of the markers. Text outside the markers passes through
//! byte-exact, so line numbers of ordinary code survive preprocessing.
//!
//! On failure the accumulated partial output is kept in `output`, so
//! callers reporting import-chain errors can still show surrounding text.

use crate::error::LangError;
use crate::eval::MetaEvaluator;
use crate::reader::{self, TextReader};

const OPEN: &str = "<?";
const CLOSE: &str = "?>";

/// Preprocess `reader` into `output`.
///
/// `output` is appended to (C toolchains accumulate into a caller buffer;
/// keeping that shape lets a caller concatenate several files). On error,
/// everything up to the failing block has already been appended.
pub fn preprocess(
    reader: &mut dyn TextReader,
    eval: &mut dyn MetaEvaluator,
    output: &mut String,
) -> Result<(), LangError> {
    let text = reader::read_to_string(reader);
    let mut rest = text.as_str();
    let mut line: u32 = 0;

    while let Some(open) = rest.find(OPEN) {
        let before = &rest[..open];
        output.push_str(before);
        line += count_newlines(before);

        let after_open = &rest[open + OPEN.len()..];
        let (code, after_block) = match after_open.find(CLOSE) {
            Some(close) => (
                &after_open[..close],
                &after_open[close + CLOSE.len()..],
            ),
            // Unterminated block: the rest of the file is meta-code.
            None => (after_open, ""),
        };

        match eval.evaluate(code) {
            Ok(printed) => {
                output.push_str(&printed);
                line += count_newlines(code);
                rest = after_block;
            }
            Err(err) => {
                let mut offset = err.offset.min(code.len());
                while offset > 0 && !code.is_char_boundary(offset) {
                    offset -= 1;
                }
                // Annotate only the physical line holding the error, not
                // the whole block.
                let start = code[..offset].rfind('\n').map_or(0, |i| i + 1);
                let end = code[offset..]
                    .find('\n')
                    .map_or(code.len(), |i| offset + i);
                return Err(LangError::Preprocess {
                    line: line + count_newlines(&code[..offset]),
                    message: format!(
                        "preprocessor: {}: '{} <!> {}'",
                        err.message,
                        &code[start..offset],
                        &code[offset..end]
                    ),
                });
            }
        }
    }

    output.push_str(rest);
    Ok(())
}

fn count_newlines(s: &str) -> u32 {
    s.bytes().filter(|&b| b == b'\n').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Interpreter;
    use crate::reader::StringReader;

    fn run(text: &str) -> (String, Result<(), LangError>) {
        let mut output = String::new();
        let result = preprocess(
            &mut StringReader::new(text),
            &mut Interpreter::new(),
            &mut output,
        );
        (output, result)
    }

    #[test]
    fn expands_meta_block_inline() {
        let text = "// the header\n\
                    @init\n\
                    <?c = 12; c += 1; printf(\"c = %d;\", c);?>\n\
                    @block\n";
        let (output, result) = run(text);
        assert!(result.is_ok());
        assert_eq!(output, "// the header\n@init\nc = 13;\n@block\n");
    }

    #[test]
    fn malformed_meta_code_is_annotated() {
        let text = "// the header\n\
                    @init\n\
                    <?c = 1a2; c += 1; printf(\"c = %d;\", c);?>\n\
                    @block\n";
        let (output, result) = run(text);
        let err = result.unwrap_err();
        assert_eq!(
            err,
            LangError::Preprocess {
                line: 2,
                message: "preprocessor: syntax error: \
                          'c = 1 <!> a2; c += 1; printf(\"c = %d;\", c);'"
                    .to_string(),
            }
        );
        // Partial output is retained up to the failing block.
        assert_eq!(output, "// the header\n@init\n");
    }

    #[test]
    fn caller_values_are_visible() {
        let text = "@init\n<?printf(\"c = %d;\", preproc_value);?>\n";
        let mut output = String::new();
        let mut eval = Interpreter::with_values([("preproc_value", 42.0)]);
        preprocess(&mut StringReader::new(text), &mut eval, &mut output).unwrap();
        assert_eq!(output, "@init\nc = 42;\n");
    }

    #[test]
    fn text_without_markers_passes_through() {
        let text = "desc:plain\n@init\nx = 1;\n";
        let (output, result) = run(text);
        assert!(result.is_ok());
        assert_eq!(output, text);
    }

    #[test]
    fn idempotent_on_marker_free_output() {
        let text = "@init\n<?printf(\"y = %d;\", 2);?>\n";
        let (once, _) = run(text);
        let (twice, result) = run(&once);
        assert!(result.is_ok());
        assert_eq!(once, twice);
    }

    #[test]
    fn state_carries_across_blocks() {
        let text = "<?n = 2;?>\n<?printf(\"%d\", n + 1);?>\n";
        let (output, result) = run(text);
        assert!(result.is_ok());
        assert_eq!(output, "\n3\n");
    }

    #[test]
    fn error_line_tracks_multiline_blocks() {
        let text = "line0\n<?\na = 1;\nb = $;\n?>\n";
        let (_, result) = run(text);
        let err = result.unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn error_annotation_echoes_only_the_failing_line() {
        let text = "<?\na = 1;\nb = $;\nc = 3;\n?>\n";
        let (_, result) = run(text);
        let err = result.unwrap_err();
        let LangError::Preprocess { message, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(message.contains(" <!> "), "got: {message}");
        assert!(message.contains("b = "), "got: {message}");
        // Statements from other lines of the block stay out of the echo.
        assert!(!message.contains("a = 1"), "got: {message}");
        assert!(!message.contains("c = 3"), "got: {message}");
    }

    #[test]
    fn unterminated_block_is_still_evaluated() {
        let text = "a\n<?printf(\"x\");";
        let (output, result) = run(text);
        assert!(result.is_ok());
        assert_eq!(output, "a\nx");
    }
}
