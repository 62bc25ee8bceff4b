use std::{
    fs,
    path::{Path, PathBuf},
};

use ::codecs::decoding::{FramingConfig, JsonDecoderConfig, UnknownCharsetError};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub mod format;

pub use format::{Format, FormatHint};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("could not read config file {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "could not tell the format of config file {} from its extension; pass --config-format",
        path.display()
    ))]
    UnknownFormat { path: PathBuf },
    #[snafu(display("could not parse config file {} as {format}: {message}", path.display()))]
    Parse {
        path: PathBuf,
        format: Format,
        message: String,
    },
    #[snafu(display("invalid charset: {source}"))]
    Charset { source: UnknownCharsetError },
    #[snafu(display("character_delimited framing requires --delimiter"))]
    MissingDelimiter,
}

/// The effective configuration of the decode/encode stage.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How payloads are decoded.
    #[serde(default)]
    pub decoding: JsonDecoderConfig,

    /// How the input stream is split into payloads.
    #[serde(default)]
    pub framing: FramingConfig,
}

impl Config {
    /// Loads a config file, taking its format from `hint` or else from the
    /// file extension.
    pub fn load_from_path(path: &Path, hint: FormatHint) -> Result<Self, ConfigError> {
        let format = match hint {
            Some(format) => format,
            None => Format::from_path(path).map_err(|path| UnknownFormatSnafu { path }.build())?,
        };
        let content = fs::read_to_string(path).context(ReadSnafu { path })?;

        debug!(message = "Loading config.", path = ?path, %format);
        format::deserialize(&content, format).map_err(|message| {
            ParseSnafu {
                path,
                format,
                message,
            }
            .build()
        })
    }
}
