#![allow(missing_docs)]

use std::path::PathBuf;

use ::codecs::decoding::{
    CharacterDelimitedDecoderConfig, CharacterDelimitedDecoderOptions, FramingConfig,
    JsonDecoderConfig, NewlineDelimitedDecoderConfig,
};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use snafu::{OptionExt, ResultExt};

use crate::{
    config::{CharsetSnafu, Config, ConfigError, Format, MissingDelimiterSnafu},
    get_version,
    internal_events::ConfigLoadError,
};

#[derive(Parser, Debug)]
#[command(rename_all = "kebab-case")]
pub struct Opts {
    #[command(flatten)]
    pub root: RootOpts,
}

impl Opts {
    pub fn get_matches() -> Result<Self, clap::Error> {
        let version = get_version();
        let app = Opts::command().version(version);
        Opts::from_arg_matches(&app.try_get_matches()?)
    }

    pub const fn log_level(&self) -> &'static str {
        let (quiet_level, verbose_level) = (self.root.quiet, self.root.verbose);

        match quiet_level {
            0 => match verbose_level {
                0 => "info",
                1 => "debug",
                2..=255 => "trace",
            },
            1 => "warn",
            2 => "error",
            3..=255 => "off",
        }
    }
}

#[derive(Parser, Debug)]
#[command(rename_all = "kebab-case")]
pub struct RootOpts {
    /// Read configuration from a file.
    /// File format is detected from the file name unless `--config-format` is given.
    #[arg(id = "config", short, long, env = "JSON_NGINX_CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Format of the configuration file: toml, json or yaml.
    #[arg(long, env = "JSON_NGINX_CONFIG_FORMAT")]
    pub config_format: Option<Format>,

    /// Charset of the input payloads. Any WHATWG encoding label is accepted,
    /// e.g. `UTF-8`, `CP1252`, `Shift_JIS`.
    #[arg(long, env = "JSON_NGINX_CHARSET")]
    pub charset: Option<String>,

    /// How the input stream is split into payloads.
    #[arg(long, env = "JSON_NGINX_FRAMING")]
    pub framing: Option<FramingMethod>,

    /// The ASCII character separating payloads. Implies `--framing character-delimited`.
    #[arg(long, env = "JSON_NGINX_DELIMITER", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Discard payloads longer than this many bytes.
    #[arg(long, env = "JSON_NGINX_MAX_LENGTH")]
    pub max_length: Option<usize>,

    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Set the logging format
    #[arg(long, default_value = "text", env = "JSON_NGINX_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl RootOpts {
    /// Loads the config file, if any, and applies the command line overrides
    /// on top of it.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config_path {
            Some(path) => Config::load_from_path(path, self.config_format)?,
            None => Config::default(),
        };
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(label) = &self.charset {
            config.decoding = JsonDecoderConfig::from_label(label).context(CharsetSnafu)?;
        }

        let max_length = self.max_length.or_else(|| max_length(&config.framing));
        let method = match (self.framing, self.delimiter) {
            (Some(method), _) => method,
            (None, Some(_)) => FramingMethod::CharacterDelimited,
            (None, None) => {
                set_max_length(&mut config.framing, max_length);
                return Ok(());
            }
        };

        config.framing = match method {
            FramingMethod::Bytes => FramingConfig::Bytes,
            FramingMethod::NewlineDelimited => {
                let mut framing = NewlineDelimitedDecoderConfig::new();
                framing.newline_delimited.max_length = max_length;
                framing.into()
            }
            FramingMethod::CharacterDelimited => {
                let current = match &config.framing {
                    FramingConfig::CharacterDelimited(framing) => {
                        Some(framing.character_delimited.delimiter)
                    }
                    _ => None,
                };
                let delimiter = self.delimiter.or(current).context(MissingDelimiterSnafu)?;
                CharacterDelimitedDecoderConfig {
                    character_delimited: CharacterDelimitedDecoderOptions::new(
                        delimiter, max_length,
                    ),
                }
                .into()
            }
        };
        Ok(())
    }
}

fn max_length(framing: &FramingConfig) -> Option<usize> {
    match framing {
        FramingConfig::Bytes => None,
        FramingConfig::CharacterDelimited(config) => config.character_delimited.max_length,
        FramingConfig::NewlineDelimited(config) => config.newline_delimited.max_length,
    }
}

fn set_max_length(framing: &mut FramingConfig, max_length: Option<usize>) {
    match framing {
        FramingConfig::Bytes => {}
        FramingConfig::CharacterDelimited(config) => {
            config.character_delimited.max_length = max_length
        }
        FramingConfig::NewlineDelimited(config) => config.newline_delimited.max_length = max_length,
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(format!("delimiter must be a single ASCII character, got {value:?}")),
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMethod {
    /// The whole input is one payload.
    Bytes,
    /// One payload per line.
    NewlineDelimited,
    /// Payloads separated by `--delimiter`.
    CharacterDelimited,
}

pub fn handle_config_errors(error: &ConfigError) -> exitcode::ExitCode {
    emit!(ConfigLoadError { error });

    exitcode::CONFIG
}

#[cfg(test)]
mod tests {
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use similar_asserts::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> Opts {
        Opts::try_parse_from(std::iter::once("json-nginx").chain(args.iter().copied())).unwrap()
    }

    fn effective(args: &[&str]) -> Result<Config, ConfigError> {
        parse(args).root.load_config()
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(parse(&[]).log_level(), "info");
        assert_eq!(parse(&["-v"]).log_level(), "debug");
        assert_eq!(parse(&["-vvv"]).log_level(), "trace");
        assert_eq!(parse(&["-v", "-q"]).log_level(), "warn");
        assert_eq!(parse(&["-qqq"]).log_level(), "off");
    }

    #[test]
    fn defaults_without_flags() {
        let config = effective(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.decoding.charset, UTF_8);
    }

    #[test]
    fn charset_override() {
        let config = effective(&["--charset", "cp1252"]).unwrap();
        assert_eq!(config.decoding.charset, WINDOWS_1252);
    }

    #[test]
    fn unknown_charset_is_a_config_error() {
        let error = effective(&["--charset", "klingon"]).unwrap_err();
        assert!(matches!(error, ConfigError::Charset { .. }));
    }

    #[test]
    fn replacement_charset_is_a_config_error() {
        let error = effective(&["--charset", "iso-2022-kr"]).unwrap_err();
        assert!(matches!(error, ConfigError::Charset { .. }));

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"[decoding]\ncharset = \"hz-gb-2312\"\n").unwrap();
        let path = file.path().to_str().unwrap();
        assert!(effective(&["--config", path]).is_err());
    }

    #[test]
    fn delimiter_implies_character_delimited() {
        let config = effective(&["--delimiter", "|", "--max-length", "64"]).unwrap();
        assert_eq!(
            config.framing,
            FramingConfig::CharacterDelimited(CharacterDelimitedDecoderConfig {
                character_delimited: CharacterDelimitedDecoderOptions::new(b'|', Some(64)),
            })
        );
    }

    #[test]
    fn character_delimited_requires_a_delimiter() {
        let error = effective(&["--framing", "character-delimited"]).unwrap_err();
        assert!(matches!(error, ConfigError::MissingDelimiter));
    }

    #[test]
    fn max_length_applies_to_current_framing() {
        let config = effective(&["--max-length", "10"]).unwrap();
        assert_eq!(
            config.framing,
            FramingConfig::NewlineDelimited(NewlineDelimitedDecoderConfig::new_with_max_length(
                10
            ))
        );

        let config = effective(&["--framing", "bytes", "--max-length", "10"]).unwrap();
        assert_eq!(config.framing, FramingConfig::Bytes);
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let args = ["json-nginx", "--delimiter", "é"];
        assert!(Opts::try_parse_from(args).is_err());
        let args = ["json-nginx", "--delimiter", "ab"];
        assert!(Opts::try_parse_from(args).is_err());
    }

    #[test]
    fn config_file_then_overrides() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"decoding:\n  charset: windows-1252\nframing:\n  method: bytes\n")
            .unwrap();
        let path = file.path().to_str().unwrap();

        let config = effective(&["--config", path]).unwrap();
        assert_eq!(config.decoding.charset, WINDOWS_1252);
        assert_eq!(config.framing, FramingConfig::Bytes);

        let config = effective(&["--config", path, "--charset", "utf-8"]).unwrap();
        assert_eq!(config.decoding.charset, UTF_8);
        assert_eq!(config.framing, FramingConfig::Bytes);
    }
}
