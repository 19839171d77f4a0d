//! Append-only command log behind a persistent `MemoryStore`.
//!
//! Each frame is a little-endian `u32` payload length followed by the bincode
//! encoding of one [`Command`]. A frame cut short at the end of the file is
//! what a crash mid-append leaves behind; replay stops before it and the file
//! is cut back to the last whole frame.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const LOG_FILE: &str = "wal.log";
const REWRITE_FILE: &str = "wal.log.tmp";

/// One store mutation as it is written to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    SAdd {
        key: String,
        member: String,
    },
    ZAdd {
        key: String,
        member: String,
        score: i64,
    },
    Del {
        key: String,
    },
}

fn write_frame<W: Write>(out: &mut W, command: &Command) -> Result<()> {
    let payload = bincode::serialize(command)?;
    out.write_all(&(payload.len() as u32).to_le_bytes())?;
    out.write_all(&payload)?;
    Ok(())
}

/// Reads frames off any byte stream and tracks how far the last whole frame
/// reached.
pub struct FrameReader<R> {
    inner: R,
    offset: u64,
    torn: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            torn: false,
        }
    }

    /// Bytes covered by the frames read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// True once a partial frame was found at the end of the stream.
    pub fn torn(&self) -> bool {
        self.torn
    }

    /// `Ok(None)` at a clean end of stream or at a torn tail.
    pub fn next_command(&mut self) -> Result<Option<Command>> {
        let mut len_buf = [0u8; 4];
        match fill(&mut self.inner, &mut len_buf)? {
            0 => return Ok(None),
            4 => {}
            _ => {
                self.torn = true;
                return Ok(None);
            }
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        if fill(&mut self.inner, &mut payload)? < len {
            self.torn = true;
            return Ok(None);
        }
        let command = bincode::deserialize(&payload)?;
        self.offset += 4 + len as u64;
        Ok(Some(command))
    }
}

/// Like `read_exact`, but reports how many bytes arrived before EOF.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

pub struct Wal {
    dir: PathBuf,
    writer: BufWriter<File>,
}

impl Wal {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let writer = BufWriter::new(open_append(&dir.join(LOG_FILE))?);
        Ok(Self { dir, writer })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn append(&mut self, command: &Command) -> Result<()> {
        write_frame(&mut self.writer, command)
    }

    /// Flush buffered frames, optionally fsyncing the file.
    pub fn flush(&mut self, sync: bool) -> Result<()> {
        self.writer.flush()?;
        if sync {
            self.writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Every whole command in the log, oldest first. A torn tail is dropped
    /// from the file so later appends start on a frame boundary.
    pub fn replay(&mut self) -> Result<Vec<Command>> {
        self.writer.flush()?;
        let path = self.path();
        let mut frames = FrameReader::new(BufReader::new(File::open(&path)?));
        let mut commands = Vec::new();
        while let Some(command) = frames.next_command()? {
            commands.push(command);
        }
        if frames.torn() {
            tracing::warn!(
                path = %path.display(),
                kept_bytes = frames.offset(),
                "dropping torn frame at end of log"
            );
            self.writer.get_ref().set_len(frames.offset())?;
        }
        Ok(commands)
    }

    /// Log length in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(fs::metadata(self.path())?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Replace the whole log with `commands`. The new log is written and
    /// fsynced next to the old one, then renamed over it, so a failure part
    /// way leaves the previous log intact.
    pub fn rewrite<I>(&mut self, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = Command>,
    {
        self.writer.flush()?;
        let tmp = self.dir.join(REWRITE_FILE);
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for command in commands {
                write_frame(&mut out, &command)?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        let path = self.path();
        fs::rename(&tmp, &path)?;
        self.writer = BufWriter::new(open_append(&path)?);
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)
}
