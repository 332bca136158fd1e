use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use gpsbridge_nmea::{ConvertedMessage, MessageKind};
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::sink::Consumer;

/// Writes each message type to `<dir>/<TYPE>.log`.
///
/// A file is created (truncating any previous run) the first time its type
/// is seen and starts with a `# field ...` header line. Every message then
/// appends one line of space-separated values.
#[derive(Debug)]
pub struct TextLogWriter {
    dir: PathBuf,
    logs: HashMap<MessageKind, LineWriter<File>>,
}

impl TextLogWriter {
    /// Create a writer for `dir`, creating the directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| SinkError::io(&dir, err))?;
        Ok(Self {
            dir,
            logs: HashMap::new(),
        })
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log file for `kind`.
    pub fn log_path(&self, kind: MessageKind) -> PathBuf {
        self.dir.join(format!("{}.log", kind.name()))
    }

    /// Append one message to its log.
    pub fn write(&mut self, message: &ConvertedMessage) -> Result<()> {
        let kind = message.kind();
        let path = self.log_path(kind);

        let log = match self.logs.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let log = open_log(&path, kind).map_err(|err| SinkError::io(&path, err))?;
                entry.insert(log)
            }
        };

        write_row(log, message).map_err(|err| SinkError::io(&path, err))
    }
}

impl Consumer for TextLogWriter {
    fn name(&self) -> &str {
        "textlog"
    }

    fn consume(&mut self, message: &ConvertedMessage) -> Result<()> {
        self.write(message)
    }
}

fn open_log(path: &Path, kind: MessageKind) -> std::io::Result<LineWriter<File>> {
    let mut log = LineWriter::new(File::create(path)?);
    writeln!(log, "# {}", kind.field_names().join(" "))?;
    debug!(path = %path.display(), message = kind.name(), "text log opened");
    Ok(log)
}

fn write_row(log: &mut LineWriter<File>, message: &ConvertedMessage) -> std::io::Result<()> {
    let mut line = String::new();
    for (i, value) in message.field_values().iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&value.to_string());
    }
    writeln!(log, "{line}")
}
