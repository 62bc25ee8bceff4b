#![allow(missing_docs)]
use std::io::{IsTerminal, Write};

use ::codecs::StreamDecodingError as _;
use exitcode::ExitCode;
use futures::StreamExt;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    runtime::{self, Runtime},
};
use tokio_util::codec::FramedRead;

use crate::{
    cli::{handle_config_errors, LogFormat, Opts, RootOpts},
    codecs::{Decoder, DecoderError},
    config::{self, Config, Format},
    internal_events::{JsonNginxStarted, JsonNginxStopped, StreamReadError},
    sinks::WriterSink,
    trace,
};

pub struct Application {
    pub root_opts: RootOpts,
    pub config: Config,
}

impl Application {
    pub fn run() -> ExitCode {
        match Self::prepare() {
            Ok((runtime, app)) => runtime.block_on(app.start()),
            Err(code) => code,
        }
    }

    pub fn prepare() -> Result<(Runtime, Self), ExitCode> {
        let opts = Opts::get_matches().map_err(|error| {
            // Printing to stdout/err can itself fail; ignore it.
            _ = error.print();
            if error.use_stderr() {
                exitcode::USAGE
            } else {
                exitcode::OK
            }
        })?;

        Self::prepare_from_opts(opts)
    }

    pub fn prepare_from_opts(opts: Opts) -> Result<(Runtime, Self), ExitCode> {
        init_logging(
            std::io::stderr().is_terminal(),
            opts.root.log_format,
            opts.log_level(),
        );

        let config = opts
            .root
            .load_config()
            .map_err(|error| handle_config_errors(&error))?;

        if opts.root.print_config {
            return Err(print_config(&config, output_format(&opts.root)));
        }

        let runtime = build_runtime()?;

        Ok((
            runtime,
            Self {
                root_opts: opts.root,
                config,
            },
        ))
    }

    pub async fn start(self) -> ExitCode {
        emit!(JsonNginxStarted {
            charset: self.config.decoding.charset.name(),
            config_path: self.root_opts.config_path.as_deref(),
        });

        let code = run_pipeline(tokio::io::stdin(), tokio::io::stdout(), &self.config).await;

        emit!(JsonNginxStopped);
        code
    }
}

/// Decodes every payload read from `input` and writes the re-encoded events
/// to `output`, one JSON document per line, until `input` is exhausted.
pub async fn run_pipeline<R, W>(input: R, output: W, config: &Config) -> ExitCode
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let decoder = Decoder::from_config(&config.framing, &config.decoding);
    let mut events = FramedRead::new(input, decoder);
    let mut sink = WriterSink::new(output);

    while let Some(next) = events.next().await {
        match next {
            Ok(event) => {
                if sink.send(&event).await.is_err() {
                    return exitcode::IOERR;
                }
            }
            Err(error) => {
                // Framing errors are reported by the decoder itself.
                if let DecoderError::Io { source } = &error {
                    emit!(StreamReadError { error: source });
                }
                if !error.can_continue() {
                    return match error {
                        DecoderError::Io { .. } => exitcode::IOERR,
                        DecoderError::Framing { .. } => exitcode::DATAERR,
                    };
                }
            }
        }
    }

    match sink.flush().await {
        Ok(()) => exitcode::OK,
        Err(_) => exitcode::IOERR,
    }
}

fn output_format(opts: &RootOpts) -> Format {
    opts.config_format
        .or_else(|| {
            opts.config_path
                .as_deref()
                .and_then(|path| Format::from_path(path).ok())
        })
        .unwrap_or_default()
}

fn print_config(config: &Config, format: Format) -> ExitCode {
    let text = match config::format::serialize(config, format) {
        Ok(text) => text,
        Err(error) => {
            error!(message = "Failed to serialize config.", %error, %format);
            return exitcode::SOFTWARE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    match writeln!(stdout, "{}", text.trim_end()).and_then(|()| stdout.flush()) {
        Ok(()) => exitcode::OK,
        Err(_) => exitcode::IOERR,
    }
}

fn get_log_levels(default: &str) -> String {
    std::env::var("JSON_NGINX_LOG").unwrap_or_else(|_| default.into())
}

pub fn build_runtime() -> Result<Runtime, ExitCode> {
    let mut rt_builder = runtime::Builder::new_current_thread();
    rt_builder.enable_all();

    debug!(message = "Building runtime.");
    rt_builder.build().map_err(|error| {
        error!(message = "Unable to create async runtime.", %error);
        exitcode::SOFTWARE
    })
}

pub fn init_logging(color: bool, format: LogFormat, log_level: &str) {
    let level = get_log_levels(log_level);
    let json = match format {
        LogFormat::Text => false,
        LogFormat::Json => true,
    };

    trace::init(color, json, &level);
    debug!(message = "Log level is enabled.", level = ?level);
}

#[cfg(test)]
mod tests {
    use ::codecs::decoding::{CharacterDelimitedDecoderConfig, FramingConfig, JsonDecoderConfig};
    use clap::Parser;
    use encoding_rs::WINDOWS_1252;
    use similar_asserts::assert_eq;

    use super::*;

    async fn pipeline(input: &[u8], config: &Config) -> (ExitCode, String) {
        let mut output = Vec::new();
        let code = run_pipeline(input, &mut output, config).await;
        (code, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn re_encodes_each_line() {
        let input = b"{\"b\": 1, \"a\": [true, null]}\nGET /index.html 200\n\n{\"s\":\"\\x22q\\x22\"}\n";
        let (code, output) = pipeline(input, &Config::default()).await;

        assert_eq!(code, exitcode::OK);
        assert_eq!(
            output,
            concat!(
                "{\"b\":1,\"a\":[true,null]}\n",
                "{\"message\":\"GET /index.html 200\",\"tags\":[\"_jsonparsefailure\"]}\n",
                "{\"message\":\"\",\"tags\":[\"_jsonparsefailure\"]}\n",
                "{\"s\":\"\\\"q\\\"\"}\n",
            )
        );
    }

    #[tokio::test]
    async fn honors_charset_and_framing() {
        let config = Config {
            decoding: JsonDecoderConfig::new(WINDOWS_1252),
            framing: FramingConfig::from(CharacterDelimitedDecoderConfig::new(b'\0')),
        };
        let (code, output) = pipeline(b"{\"city\":\"Z\xfcrich\"}\0", &config).await;

        assert_eq!(code, exitcode::OK);
        assert_eq!(output, "{\"city\":\"Z\u{fc}rich\"}\n");
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let (code, output) = pipeline(b"", &Config::default()).await;

        assert_eq!(code, exitcode::OK);
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn write_failure_is_an_io_error() {
        let output = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            ))
            .build();
        let input: &[u8] = b"{\"a\":1}\n";

        assert_eq!(
            run_pipeline(input, output, &Config::default()).await,
            exitcode::IOERR
        );
    }

    #[test]
    fn output_format_follows_config_path() {
        let opts = Opts::try_parse_from(["json-nginx", "--config", "/etc/json-nginx.yaml"])
            .unwrap()
            .root;
        assert_eq!(output_format(&opts), Format::Yaml);

        let opts = Opts::try_parse_from(["json-nginx"]).unwrap().root;
        assert_eq!(output_format(&opts), Format::Toml);
    }
}
