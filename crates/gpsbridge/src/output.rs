use std::io::{self, Write};

use clap::ValueEnum;
use gpsbridge::nmea::ConvertedMessage;
use gpsbridge::sink::{Consumer, Result, SinkError};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line, tagged with the message type.
    Json,
    /// `TYPE name=value ...` per line.
    Pretty,
}

/// Prints every message to a writer, stdout by default.
pub struct StdoutConsumer<W = io::Stdout> {
    out: W,
    format: OutputFormat,
}

impl StdoutConsumer<io::Stdout> {
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writer(io::stdout(), format)
    }
}

impl<W: Write> StdoutConsumer<W> {
    pub fn with_writer(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, message: &ConvertedMessage) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let line = serde_json::to_string(message).map_err(io::Error::from)?;
                writeln!(self.out, "{line}")?;
            }
            OutputFormat::Pretty => {
                write!(self.out, "{}", message.name())?;
                let values = message.field_values();
                for (name, value) in message.field_names().iter().zip(values) {
                    write!(self.out, " {name}={value}")?;
                }
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Consumer for StdoutConsumer<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    fn consume(&mut self, message: &ConvertedMessage) -> Result<()> {
        self.emit(message).map_err(|err| SinkError::Consumer {
            consumer: "stdout".into(),
            message: err.to_string(),
        })
    }
}
