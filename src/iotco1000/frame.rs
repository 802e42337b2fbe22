use std::{
    io::{self, Read, Write},
    thread::sleep,
    time::Duration,
};

use chrono::{DateTime, Utc};
use serialport::{ClearBuffer, SerialPort};
use thiserror::Error;
use tracing::debug;

/// Any line ending wakes the module up and makes it print one reading.
pub const STIMULUS: &[u8] = b"\r\n";

pub const LINE_TERMINATOR: u8 = b'\n';

const READ_CHUNK_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("serial device I/O failed")]
    Io(#[from] io::Error),

    #[error("serial device accepted none of the stimulus bytes")]
    WriteZero,

    #[error("response exceeded {limit} bytes without a line terminator")]
    TooLong { limit: usize },

    #[error("no line terminator after {attempts} empty reads")]
    Timeout { attempts: u32 },
}

impl FrameError {
    /// Whether the serial channel itself is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::WriteZero)
    }
}

/// Byte channel the module is attached to.
pub trait SerialChannel: Read + Write {
    /// Discards anything received but not read yet.
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialChannel for Box<dyn SerialPort> {
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Time the module gets to produce its reply after the stimulus.
    pub settle_delay: Duration,

    pub empty_read_backoff: Duration,

    pub max_frame_len: usize,

    /// Consecutive empty reads tolerated before giving up on the frame.
    pub max_empty_reads: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            empty_read_backoff: Duration::from_millis(50),
            max_frame_len: 1024,
            max_empty_reads: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,

    pub requested_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FrameReader<C> {
    channel: C,
    config: FrameConfig,
    /// Set after a frame was abandoned midway; its tail may still be queued.
    resync: bool,
}

impl<C: SerialChannel> FrameReader<C> {
    pub fn with_config(channel: C, config: FrameConfig) -> Self {
        Self {
            channel,
            config,
            resync: false,
        }
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Writes the stimulus, waits for the module to settle and reads one line.
    pub fn request(&mut self) -> Result<Frame, FrameError> {
        if self.resync {
            self.channel.clear_input()?;
            self.resync = false;
        }

        let written = self.channel.write(STIMULUS)?;
        if written == 0 {
            return Err(FrameError::WriteZero);
        }
        self.channel.flush()?;

        let requested_at = Utc::now();

        sleep(self.config.settle_delay);

        let bytes = self.read_line().inspect_err(|e| {
            self.resync = matches!(e, FrameError::TooLong { .. } | FrameError::Timeout { .. });
        })?;
        let text = String::from_utf8_lossy(&bytes);
        debug!(frame = %text.trim_end(), "received frame");

        Ok(Frame {
            bytes,
            requested_at,
        })
    }

    /// Accumulates reads until the last received byte is the line terminator.
    pub fn read_line(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut buffer = Vec::with_capacity(READ_CHUNK_LEN);
        let mut chunk = [0u8; READ_CHUNK_LEN];
        let mut empty_reads = 0u32;

        loop {
            let bytes_read = match self.channel.read(&mut chunk) {
                Ok(n) => n,
                // serialport reports an expired read timeout as an error, not as 0 bytes
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
                {
                    0
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            };

            if bytes_read == 0 {
                empty_reads += 1;
                if empty_reads >= self.config.max_empty_reads {
                    return Err(FrameError::Timeout {
                        attempts: empty_reads,
                    });
                }
                sleep(self.config.empty_read_backoff);
                continue;
            }
            empty_reads = 0;

            buffer.extend_from_slice(&chunk[..bytes_read]);

            if buffer.last() == Some(&LINE_TERMINATOR) {
                if buffer.len() > self.config.max_frame_len {
                    return Err(FrameError::TooLong {
                        limit: self.config.max_frame_len,
                    });
                }
                return Ok(buffer);
            }

            if buffer.len() >= self.config.max_frame_len {
                return Err(FrameError::TooLong {
                    limit: self.config.max_frame_len,
                });
            }

            sleep(self.config.empty_read_backoff);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays scripted read results and records everything written.
    struct ScriptedChannel {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
        accepts_writes: bool,
        clears: usize,
    }

    impl ScriptedChannel {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
                accepts_writes: true,
                clears: 0,
            }
        }
    }

    impl SerialChannel for ScriptedChannel {
        fn clear_input(&mut self) -> io::Result<()> {
            self.clears += 1;
            self.reads.clear();
            Ok(())
        }
    }

    impl Read for ScriptedChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.accepts_writes {
                return Ok(0);
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fast_config() -> FrameConfig {
        FrameConfig {
            settle_delay: Duration::ZERO,
            empty_read_backoff: Duration::ZERO,
            max_frame_len: 64,
            max_empty_reads: 5,
        }
    }

    #[test]
    fn request_writes_stimulus_and_assembles_chunks() {
        let channel = ScriptedChannel::new(vec![
            Ok(b"ABC123, 1".to_vec()),
            Ok(Vec::new()),
            Err(io::Error::from(io::ErrorKind::TimedOut)),
            Ok(b"2, 21\r\n".to_vec()),
        ]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let frame = reader.request().unwrap();

        assert_eq!(frame.bytes, b"ABC123, 12, 21\r\n");
        let channel = reader.into_inner();
        assert_eq!(channel.written, STIMULUS);
        assert_eq!(channel.clears, 0);
    }

    #[test]
    fn unaccepted_stimulus_is_fatal() {
        let mut channel = ScriptedChannel::new(vec![Ok(b"ABC123\n".to_vec())]);
        channel.accepts_writes = false;
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.request().unwrap_err();

        assert!(matches!(err, FrameError::WriteZero));
        assert!(err.is_fatal());
    }

    #[test]
    fn read_error_is_fatal_and_not_retried() {
        let channel = ScriptedChannel::new(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::from(io::ErrorKind::BrokenPipe)),
            Ok(b"\n".to_vec()),
        ]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.read_line().unwrap_err();

        assert!(matches!(err, FrameError::Io(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn stalled_device_times_out() {
        let channel = ScriptedChannel::new(vec![Ok(b"no terminator".to_vec())]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.read_line().unwrap_err();

        assert!(matches!(err, FrameError::Timeout { attempts: 5 }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let channel = ScriptedChannel::new(vec![Ok(vec![b'x'; 40]), Ok(vec![b'y'; 40])]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.read_line().unwrap_err();

        assert!(matches!(err, FrameError::TooLong { limit: 64 }));
    }

    #[test]
    fn terminated_frame_past_limit_is_rejected() {
        let mut line = vec![b'x'; 69];
        line.push(b'\n');
        let channel = ScriptedChannel::new(vec![Ok(line)]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.read_line().unwrap_err();

        assert!(matches!(err, FrameError::TooLong { limit: 64 }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn abandoned_frame_tail_is_cleared_before_next_request() {
        let channel = ScriptedChannel::new(vec![
            Ok(vec![b'x'; 40]),
            Ok(vec![b'x'; 40]),
            Ok(b"stale tail\n".to_vec()),
        ]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        let err = reader.request().unwrap_err();
        assert!(matches!(err, FrameError::TooLong { .. }));

        // the tail was dropped, so the device now looks silent
        let err = reader.request().unwrap_err();
        assert!(matches!(err, FrameError::Timeout { .. }));

        let channel = reader.into_inner();
        assert_eq!(channel.clears, 1);
        assert_eq!(channel.written, b"\r\n\r\n");
    }

    #[test]
    fn frame_at_limit_is_accepted() {
        let mut line = vec![b'x'; 63];
        line.push(b'\n');
        let channel = ScriptedChannel::new(vec![Ok(line.clone())]);
        let mut reader = FrameReader::with_config(channel, fast_config());

        assert_eq!(reader.read_line().unwrap(), line);
    }
}
