//! Conversion of raw payload bytes from a configured charset to UTF-8 text.

use std::borrow::Cow;

use encoding_rs::{CoderResult, Encoding};
use memchr::memmem;

const BUFFER_SIZE: usize = 4096;

// BOM unicode character (U+FEFF)
// http://unicode.org/faq/utf_bom.html#bom4
const BOM: char = '\u{feff}';

/// The malformed escape emitted by nginx (and a few other producers) for
/// control characters, and its JSON replacement.
const HEX_ESCAPE: &[u8] = b"\\x";
const UNICODE_ESCAPE: &[u8] = b"\\u00";

/// The result of transcoding a single payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    /// The payload as UTF-8 text.
    pub text: String,
    /// Whether malformed sequences were replaced with U+FFFD.
    pub replaced_malformed: bool,
    /// Whether a leading byte order mark was removed.
    pub removed_bom: bool,
}

/// Converts payloads from a configured source encoding into UTF-8 text.
///
/// Every payload is decoded independently: a sequence cut short at the end of
/// one payload is replaced rather than carried into the next one.
#[derive(Debug, Clone, Copy)]
pub struct CharsetNormalizer {
    encoding: &'static Encoding,
}

impl CharsetNormalizer {
    /// Creates a normalizer decoding from `encoding`.
    pub const fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// The source encoding.
    pub const fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Converts `input` into UTF-8 text, repairing `\x` escapes on the way.
    ///
    /// This never fails: malformed input is replaced with U+FFFD. A leading
    /// byte order mark (U+FEFF) is removed, so the text of a payload that
    /// started with one is not byte-for-byte the decoded input.
    pub fn normalize(&self, input: &[u8]) -> String {
        self.transcode(input).text
    }

    /// Like [`CharsetNormalizer::normalize`], also reporting what had to be
    /// repaired.
    pub fn transcode(&self, input: &[u8]) -> Transcoded {
        // The `\x` pattern only exists at the byte level for encodings that
        // share ASCII's code points; for the others it's replaced in the text.
        let (mut text, replaced_malformed) = if self.encoding.is_ascii_compatible() {
            self.decode_to_utf8(&repair_hex_escapes(input))
        } else {
            let (text, had_errors) = self.decode_to_utf8(input);
            (repair_hex_escapes_str(text), had_errors)
        };

        // We can choose not to strip the BOM and keep it as is, but the JSON
        // parser rejects it and the source encoding is already known.
        let removed_bom = text.starts_with(BOM);
        if removed_bom {
            text.remove(0);
        }

        Transcoded {
            text,
            replaced_malformed,
            removed_bom,
        }
    }

    fn decode_to_utf8(&self, input: &[u8]) -> (String, bool) {
        // We explicitly choose not to remove BOM as part of encoding_rs's
        // decoding capabilities, since the BOM of a non-UTF-8 source is
        // meaningless once the encoding is configured. Leading BOMs are
        // stripped from the UTF-8 output instead.
        let mut decoder = self.encoding.new_decoder_without_bom_handling();
        let mut output = String::with_capacity(
            decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(BUFFER_SIZE),
        );

        let mut total_read_from_input = 0;
        let mut total_had_errors = false;

        loop {
            let (result, read, had_errors) = decoder.decode_to_string(
                &input[total_read_from_input..],
                &mut output,
                true, // every payload stands on its own
            );

            total_read_from_input += read;
            total_had_errors |= had_errors;

            match result {
                CoderResult::InputEmpty => break, // we have consumed all of the given input so we are done!
                CoderResult::OutputFull => output.reserve(BUFFER_SIZE), // make room and continue with the rest of the input
            }
        }

        (output, total_had_errors)
    }
}

impl Default for CharsetNormalizer {
    fn default() -> Self {
        Self::new(encoding_rs::UTF_8)
    }
}

/// Replaces every literal `\x` with `\u00`.
///
/// This is a plain byte substitution: it applies inside JSON strings and
/// outside of them alike, and does not look at what follows the `x`.
pub fn repair_hex_escapes(input: &[u8]) -> Cow<'_, [u8]> {
    let mut matches = memmem::find_iter(input, HEX_ESCAPE).peekable();
    if matches.peek().is_none() {
        return Cow::Borrowed(input);
    }

    let mut output = Vec::with_capacity(input.len() + input.len() / 4);
    let mut last = 0;
    for index in matches {
        output.extend_from_slice(&input[last..index]);
        output.extend_from_slice(UNICODE_ESCAPE);
        last = index + HEX_ESCAPE.len();
    }
    output.extend_from_slice(&input[last..]);

    Cow::Owned(output)
}

fn repair_hex_escapes_str(text: String) -> String {
    if text.contains("\\x") {
        text.replace("\\x", "\\u00")
    } else {
        text
    }
}
