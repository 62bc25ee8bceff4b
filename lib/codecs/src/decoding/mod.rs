//! A collection of support structures that are used in the process of decoding
//! bytes into events.

pub mod framing;

use std::{fmt, sync::Arc};

use encoding_rs::Encoding;
use serde::{de, Deserialize, Deserializer, Serialize};
use snafu::{OptionExt, Snafu};
use tracing::{info, trace, warn};

pub use framing::{
    BoxedFramingError, BytesDecoder, BytesDecoderConfig, CharacterDelimitedDecoder,
    CharacterDelimitedDecoderConfig, CharacterDelimitedDecoderOptions, Framer, FramingConfig,
    FramingError, NewlineDelimitedDecoder, NewlineDelimitedDecoderConfig,
    NewlineDelimitedDecoderOptions, StreamDecodingError,
};

use crate::{
    event::{LogEvent, Value},
    transcode::{CharsetNormalizer, Transcoded},
};

/// The charset label could not be resolved to a known encoding.
#[derive(Debug, Snafu)]
#[snafu(display("unknown charset {label:?}"))]
pub struct UnknownCharsetError {
    label: String,
}

/// Config used to build a `JsonDecoder`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JsonDecoderConfig {
    /// The character set of incoming payloads.
    ///
    /// Any label known to the [WHATWG Encoding Standard][encoding_standard] is
    /// accepted, for example `UTF-8`, `CP1252`, `ISO-8859-1`, `Shift_JIS` or
    /// `UTF-16LE`. Payloads are converted to UTF-8 before they are parsed.
    ///
    /// Labels that the standard maps to the `replacement` encoding, such as
    /// `ISO-2022-KR` or `HZ-GB-2312`, are rejected.
    ///
    /// [encoding_standard]: https://encoding.spec.whatwg.org/#names-and-labels
    #[serde(default = "default_charset", deserialize_with = "deserialize_charset")]
    pub charset: &'static Encoding,
}

/// Resolves a charset label, refusing labels that would decode every payload
/// to a single U+FFFD.
fn charset_for_label(label: &str) -> Result<&'static Encoding, UnknownCharsetError> {
    Encoding::for_label_no_replacement(label.trim().as_bytes()).context(UnknownCharsetSnafu { label })
}

fn deserialize_charset<'de, D>(deserializer: D) -> Result<&'static Encoding, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    charset_for_label(&label).map_err(de::Error::custom)
}

const fn default_charset() -> &'static Encoding {
    encoding_rs::UTF_8
}

impl Default for JsonDecoderConfig {
    fn default() -> Self {
        Self::new(default_charset())
    }
}

impl JsonDecoderConfig {
    /// Creates a new `JsonDecoderConfig`.
    pub const fn new(charset: &'static Encoding) -> Self {
        Self { charset }
    }

    /// Creates a `JsonDecoderConfig` from a charset label such as `"CP1252"`.
    pub fn from_label(label: &str) -> Result<Self, UnknownCharsetError> {
        charset_for_label(label).map(Self::new)
    }

    /// Build the `JsonDecoder` from this configuration, reporting through
    /// `tracing`.
    pub fn build(&self) -> JsonDecoder {
        JsonDecoder::new(self.charset)
    }
}

/// Receives the conditions the decoder recovers from.
///
/// None of these affect the decoded event; they are only reported.
pub trait DecoderDiagnostics: Send + Sync {
    /// The payload was not valid JSON and a fallback event is produced.
    fn parse_failure(&self, error: &serde_json::Error, text: &str);

    /// Malformed byte sequences were replaced with U+FFFD. `text` is the
    /// payload after replacement.
    fn malformed_replaced(&self, _charset: &'static Encoding, _text: &str) {}

    /// A leading byte order mark was dropped. It does not reappear in the
    /// fallback `message`.
    fn bom_removed(&self, _charset: &'static Encoding) {}
}

/// Reports decoder diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DecoderDiagnostics for TracingDiagnostics {
    fn parse_failure(&self, error: &serde_json::Error, text: &str) {
        info!(
            message = "JSON parse failure. Falling back to plain-text.",
            %error,
            data = %text,
        );
    }

    fn malformed_replaced(&self, charset: &'static Encoding, text: &str) {
        warn!(
            message = "Replaced malformed characters from source encoding. The payload may use a different character encoding than configured.",
            expected_charset = %charset.name(),
            data = %text,
        );
    }

    fn bom_removed(&self, charset: &'static Encoding) {
        trace!(
            message = "Removing initial BOM bytes from the final output while decoding to utf-8.",
            from_encoding = %charset.name(),
        );
    }
}

/// The outcome of decoding one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The payload was valid JSON.
    Parsed(LogEvent),
    /// The payload was not valid JSON. The event holds the normalized text in
    /// `message` and is tagged with `_jsonparsefailure`. A leading byte order
    /// mark is not part of the normalized text.
    Fallback(LogEvent),
}

impl Decoded {
    /// Whether the payload fell back to plain text.
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// The decoded event.
    pub const fn event(&self) -> &LogEvent {
        match self {
            Self::Parsed(event) | Self::Fallback(event) => event,
        }
    }

    /// Consumes the outcome, returning the event.
    pub fn into_event(self) -> LogEvent {
        match self {
            Self::Parsed(event) | Self::Fallback(event) => event,
        }
    }
}

/// Decodes raw payloads into events, one event per payload.
///
/// Each payload is converted from the configured charset to UTF-8, `\x`
/// escapes are rewritten to `\u00`, and the result is parsed as exactly one
/// JSON value. Objects become the event's fields. Any other JSON value is
/// stored under `message`. Payloads that don't parse produce a fallback event
/// instead of an error, so decoding never fails.
#[derive(Clone)]
pub struct JsonDecoder {
    normalizer: CharsetNormalizer,
    diagnostics: Arc<dyn DecoderDiagnostics>,
}

impl JsonDecoder {
    /// Creates a new `JsonDecoder` reporting through `tracing`.
    pub fn new(charset: &'static Encoding) -> Self {
        Self::with_diagnostics(charset, Arc::new(TracingDiagnostics))
    }

    /// Creates a new `JsonDecoder` reporting to `diagnostics`.
    pub fn with_diagnostics(
        charset: &'static Encoding,
        diagnostics: Arc<dyn DecoderDiagnostics>,
    ) -> Self {
        Self {
            normalizer: CharsetNormalizer::new(charset),
            diagnostics,
        }
    }

    /// The configured source charset.
    pub const fn charset(&self) -> &'static Encoding {
        self.normalizer.encoding()
    }

    /// Decodes one payload.
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        let Transcoded {
            text,
            replaced_malformed,
            removed_bom,
        } = self.normalizer.transcode(bytes);

        if replaced_malformed {
            self.diagnostics.malformed_replaced(self.charset(), &text);
        }
        if removed_bom {
            self.diagnostics.bom_removed(self.charset());
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Decoded::Parsed(LogEvent::from_parsed(value)),
            Err(error) => {
                self.diagnostics.parse_failure(&error, &text);
                Decoded::Fallback(LogEvent::json_parse_failure(text))
            }
        }
    }

    /// Decodes one payload and hands the resulting event to `emit`.
    ///
    /// `emit` is called exactly once, whatever the payload contains.
    pub fn decode_with<F>(&self, bytes: &[u8], emit: F)
    where
        F: FnOnce(LogEvent),
    {
        emit(self.decode(bytes).into_event())
    }
}

impl Default for JsonDecoder {
    fn default() -> Self {
        JsonDecoderConfig::default().build()
    }
}

impl fmt::Debug for JsonDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("charset", &self.charset().name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use encoding_rs::{UTF_16LE, UTF_8, WINDOWS_1252};
    use indoc::indoc;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::event::{ObjectMap, JSON_PARSE_FAILURE_TAG, MESSAGE_KEY, TAGS_KEY};

    #[derive(Default)]
    struct Recorded {
        parse_failures: Mutex<Vec<String>>,
        malformed: Mutex<Vec<(&'static str, String)>>,
        boms: Mutex<usize>,
    }

    impl DecoderDiagnostics for Recorded {
        fn parse_failure(&self, _error: &serde_json::Error, text: &str) {
            self.parse_failures.lock().unwrap().push(text.to_owned());
        }

        fn malformed_replaced(&self, charset: &'static Encoding, text: &str) {
            self.malformed
                .lock()
                .unwrap()
                .push((charset.name(), text.to_owned()));
        }

        fn bom_removed(&self, _charset: &'static Encoding) {
            *self.boms.lock().unwrap() += 1;
        }
    }

    fn recording_decoder(charset: &'static Encoding) -> (JsonDecoder, Arc<Recorded>) {
        let recorded = Arc::new(Recorded::default());
        let decoder = JsonDecoder::with_diagnostics(charset, recorded.clone());
        (decoder, recorded)
    }

    fn fallback(message: &str) -> LogEvent {
        LogEvent::from_iter([
            (MESSAGE_KEY, Value::from(message)),
            (TAGS_KEY, Value::from(vec![JSON_PARSE_FAILURE_TAG])),
        ])
    }

    #[test]
    fn config_defaults_to_utf8() {
        let config: JsonDecoderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.charset, UTF_8);
    }

    #[test]
    fn config_resolves_charset_aliases() {
        let config: JsonDecoderConfig = serde_json::from_str(r#"{"charset":"CP1252"}"#).unwrap();
        assert_eq!(config.charset, WINDOWS_1252);

        let config = JsonDecoderConfig::from_label("ISO-8859-1").unwrap();
        assert_eq!(config.charset, WINDOWS_1252);
    }

    #[test]
    fn config_rejects_unknown_charset() {
        assert!(serde_json::from_str::<JsonDecoderConfig>(r#"{"charset":"klingon"}"#).is_err());
        let error = JsonDecoderConfig::from_label("klingon").unwrap_err();
        assert_eq!(error.to_string(), r#"unknown charset "klingon""#);
    }

    #[test]
    fn config_rejects_replacement_charsets() {
        for label in ["iso-2022-kr", "csiso2022kr", "hz-gb-2312", "ISO-2022-CN"] {
            let error = JsonDecoderConfig::from_label(label).unwrap_err();
            assert_eq!(error.to_string(), format!("unknown charset {label:?}"));

            let json = format!(r#"{{"charset":"{label}"}}"#);
            let error = serde_json::from_str::<JsonDecoderConfig>(&json).unwrap_err();
            assert!(error.to_string().contains("unknown charset"), "{error}");
        }
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = JsonDecoderConfig::new(WINDOWS_1252);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"charset":"windows-1252"}"#);
        assert_eq!(serde_json::from_str::<JsonDecoderConfig>(&json).unwrap(), config);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(serde_json::from_str::<JsonDecoderConfig>(r#"{"chrset":"UTF-8"}"#).is_err());
    }

    #[test]
    fn decode_object_keeps_document_order() {
        let decoder = JsonDecoder::default();
        let decoded = decoder.decode(br#"{"z":1,"a":"x","m":[true,null]}"#);

        assert!(!decoded.is_fallback());
        let event = decoded.into_event();
        assert_eq!(event.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(event.get("z"), Some(&Value::Integer(1)));
        assert_eq!(event.get("a"), Some(&Value::from("x")));
        assert_eq!(
            event.get("m"),
            Some(&Value::Array(vec![Value::Boolean(true), Value::Null]))
        );
        assert!(!event.has_tag(JSON_PARSE_FAILURE_TAG));
    }

    #[test]
    fn decode_pretty_printed_object() {
        let input = indoc! {r#"
            {
              "status": 200,
              "request": {"method": "GET", "uri": "/"}
            }
        "#};
        let event = JsonDecoder::default().decode(input.as_bytes()).into_event();

        let mut request = ObjectMap::new();
        request.insert("method".into(), "GET".into());
        request.insert("uri".into(), "/".into());
        assert_eq!(event.get("status"), Some(&Value::Integer(200)));
        assert_eq!(event.get("request"), Some(&Value::Object(request)));
    }

    #[test]
    fn decode_repairs_nginx_escapes() {
        let decoded = JsonDecoder::default().decode(br#"{"foo": "\x22aaa\x0a\x0Abbb\x22"}"#);

        assert!(!decoded.is_fallback());
        assert_eq!(
            decoded.event().get("foo"),
            Some(&Value::from("\"aaa\n\nbbb\""))
        );
    }

    #[test]
    fn decode_plain_text_falls_back() {
        let (decoder, recorded) = recording_decoder(UTF_8);
        let decoded = decoder.decode(b"this is not json");

        assert!(decoded.is_fallback());
        assert_eq!(decoded.into_event(), fallback("this is not json"));
        assert_eq!(
            *recorded.parse_failures.lock().unwrap(),
            vec!["this is not json".to_owned()]
        );
    }

    #[test]
    fn decode_trailing_garbage_falls_back() {
        let decoded = JsonDecoder::default().decode(br#"{"a":1} trailing"#);
        assert_eq!(decoded.into_event(), fallback(r#"{"a":1} trailing"#));
    }

    #[test]
    fn decode_empty_payload_falls_back() {
        let decoded = JsonDecoder::default().decode(b"");
        assert_eq!(decoded.into_event(), fallback(""));
    }

    #[test]
    fn decode_non_object_is_wrapped_in_message() {
        let decoder = JsonDecoder::default();

        let decoded = decoder.decode(b"[1,2]");
        assert!(!decoded.is_fallback());
        let event = decoded.into_event();
        assert_eq!(event.len(), 1);
        assert_eq!(
            event.get(MESSAGE_KEY),
            Some(&Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert!(event.tags().is_empty());

        let event = decoder.decode(br#""just a string""#).into_event();
        assert_eq!(event.get(MESSAGE_KEY), Some(&Value::from("just a string")));

        let event = decoder.decode(b"null").into_event();
        assert_eq!(event.get(MESSAGE_KEY), Some(&Value::Null));
    }

    #[test]
    fn decode_binary_blob_falls_back_with_valid_utf8() {
        let (decoder, recorded) = recording_decoder(UTF_8);
        let blob: Vec<u8> = (128..=255).collect();
        let decoded = decoder.decode(&blob);

        assert!(decoded.is_fallback());
        let message = decoded.event().get(MESSAGE_KEY).unwrap();
        assert!(matches!(message, Value::Bytes(bytes) if std::str::from_utf8(bytes).is_ok()));

        let malformed = recorded.malformed.lock().unwrap();
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].0, "UTF-8");
        assert_eq!(message.as_str().as_deref(), Some(malformed[0].1.as_str()));
    }

    #[test]
    fn decode_reports_the_replaced_text() {
        let (decoder, recorded) = recording_decoder(UTF_8);
        let event = decoder.decode(b"caf\xe9 au lait").into_event();

        assert_eq!(event, fallback("caf\u{fffd} au lait"));
        assert_eq!(
            *recorded.malformed.lock().unwrap(),
            vec![("UTF-8", "caf\u{fffd} au lait".to_owned())]
        );
    }

    #[test]
    fn decode_windows_1252_payload() {
        let decoder = JsonDecoderConfig::from_label("CP1252").unwrap().build();
        let event = decoder.decode(b"{\"city\":\"M\xfcnchen\"}").into_event();
        assert_eq!(event.get("city"), Some(&Value::from("München")));
    }

    #[test]
    fn decode_utf16_payload() {
        let input: Vec<u8> = r#"{"a":"\x41"}"#
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let event = JsonDecoder::new(UTF_16LE).decode(&input).into_event();
        assert_eq!(event.get("a"), Some(&Value::from("A")));
    }

    #[test]
    fn decode_strips_bom() {
        let (decoder, recorded) = recording_decoder(UTF_8);
        let decoded = decoder.decode(b"\xef\xbb\xbf{\"a\":1}");

        assert!(!decoded.is_fallback());
        assert_eq!(*recorded.boms.lock().unwrap(), 1);
        assert!(recorded.parse_failures.lock().unwrap().is_empty());
    }

    #[test]
    fn fallback_message_omits_bom() {
        let (decoder, recorded) = recording_decoder(UTF_8);
        let event = decoder.decode(b"\xef\xbb\xbfnot json").into_event();

        assert_eq!(event, fallback("not json"));
        assert_eq!(*recorded.boms.lock().unwrap(), 1);
        assert_eq!(
            *recorded.parse_failures.lock().unwrap(),
            vec!["not json".to_owned()]
        );
    }

    #[test]
    fn decode_with_emits_once() {
        let decoder = JsonDecoder::default();
        let mut events = Vec::new();
        decoder.decode_with(br#"{"a":1}"#, |event| events.push(event));
        decoder.decode_with(b"nope", |event| events.push(event));

        assert_eq!(events.len(), 2);
        assert!(!events[0].has_tag(JSON_PARSE_FAILURE_TAG));
        assert!(events[1].has_tag(JSON_PARSE_FAILURE_TAG));
    }

    #[test]
    fn debug_shows_charset() {
        let decoder = JsonDecoder::new(WINDOWS_1252);
        assert_eq!(format!("{decoder:?}"), "JsonDecoder { charset: \"windows-1252\", .. }");
    }

    proptest! {
        #[test]
        fn decode_with_emits_exactly_once(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let decoder = JsonDecoder::with_diagnostics(UTF_8, Arc::new(Recorded::default()));
            let mut calls = 0;
            decoder.decode_with(&bytes, |_| calls += 1);
            prop_assert_eq!(calls, 1);
        }

        #[test]
        fn fallback_has_exactly_message_and_tags(
            text in "[a-zA-Z0-9 \u{e9}\u{df}\u{4e2d}\u{1f600}]{1,64}"
        ) {
            let decoder = JsonDecoder::with_diagnostics(UTF_8, Arc::new(Recorded::default()));
            let payload = format!("<{text}>");
            let decoded = decoder.decode(payload.as_bytes());
            prop_assert!(decoded.is_fallback());
            let event = decoded.into_event();
            prop_assert_eq!(event.keys().collect::<Vec<_>>(), vec![MESSAGE_KEY, TAGS_KEY]);
            prop_assert_eq!(event.get(MESSAGE_KEY), Some(&Value::from(payload)));
            prop_assert_eq!(event.tags(), vec![JSON_PARSE_FAILURE_TAG.to_owned()]);
        }

        #[test]
        fn windows_1252_fallback_message_is_the_transcoded_text(
            bytes in proptest::collection::vec(0x20u8..=0xff, 1..64)
        ) {
            // A backslash could start a `\x` escape, which is rewritten.
            let mut payload = b"<".to_vec();
            payload.extend(bytes.iter().map(|&b| if b == b'\\' { b'/' } else { b }));
            let (expected, _, _) = WINDOWS_1252.decode(&payload);

            let (decoder, recorded) = recording_decoder(WINDOWS_1252);
            let decoded = decoder.decode(&payload);

            prop_assert!(decoded.is_fallback());
            prop_assert_eq!(
                decoded.event().get(MESSAGE_KEY),
                Some(&Value::from(&*expected))
            );
            prop_assert!(recorded.malformed.lock().unwrap().is_empty());
        }
    }
}
