//! IR receiver signal source
//!
//! The receiver (an Arduino running an IR decoder sketch) prints one decoded
//! code per line over USB serial. [`LineReader`] turns the byte stream into
//! frames, and [`open`] finds and opens the receiver port.

use std::io::{self, Read};

use irplus_engine::Signal;
use serialport::{SerialPort, SerialPortType};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;

/// Longest accepted line; anything longer is line noise and is dropped whole
const MAX_FRAME_LEN: usize = 256;

/// Errors from the signal source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No serial port matching \"{0}\" found")]
    NotFound(String),
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("Read error: {0}")]
    Io(#[from] io::Error),
    #[error("Signal source closed")]
    Closed,
}

/// A stream of raw receiver frames.
pub trait SignalSource: Send {
    /// Next complete frame, or `None` if the read timed out first.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

impl<T: SignalSource + ?Sized> SignalSource for Box<T> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        (**self).next_frame()
    }
}

/// Splits a byte stream into `\n`-terminated frames.
///
/// The line terminator (`\n` or `\r\n`) is stripped and empty lines are
/// skipped. Partial lines are kept across timeouts. Lines longer than
/// `MAX_FRAME_LEN` are dropped, including any tail that arrives later.
pub struct LineReader<R> {
    reader: R,
    pending: Vec<u8>,
    /// Inside an overlong line; skip up to the next `\n`
    discarding: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(MAX_FRAME_LEN),
            discarding: false,
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

impl<R: Read + Send> SignalSource for LineReader<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut chunk = [0u8; 64];
        loop {
            while let Some(line) = self.take_line() {
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                if line.len() > MAX_FRAME_LEN {
                    warn!("Discarding {}-byte line", line.len());
                    continue;
                }
                if !line.is_empty() {
                    return Ok(Some(line));
                }
            }

            if self.pending.len() > MAX_FRAME_LEN {
                warn!("Discarding {} bytes without line break", self.pending.len());
                self.pending.clear();
                self.discarding = true;
            }

            match self.reader.read(&mut chunk) {
                Ok(0) => return Err(SourceError::Closed),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    return Ok(None)
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Decode a frame into a signal, or `None` for non-text/blank frames.
pub fn decode_frame(frame: &[u8]) -> Option<Signal> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            debug!("Dropping non-UTF-8 frame {:02X?}: {}", frame, e);
            return None;
        }
    };
    match Signal::new(text) {
        Ok(signal) => Some(signal),
        Err(e) => {
            debug!("Dropping frame: {}", e);
            None
        }
    }
}

/// A serial port as shown by `irplus ports`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// USB product and manufacturer strings, when known
    pub description: Option<String>,
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>, SourceError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()?
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(usb) => {
                    let parts: Vec<String> =
                        [usb.product, usb.manufacturer].into_iter().flatten().collect();
                    (!parts.is_empty()).then(|| parts.join(" / "))
                }
                _ => None,
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}

/// First port whose description contains `needle` (case-insensitive)
pub fn find_port<'a>(ports: &'a [PortInfo], needle: &str) -> Option<&'a PortInfo> {
    let needle = needle.to_lowercase();
    ports.iter().find(|p| {
        p.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
    })
}

/// Open the receiver port configured in `config`.
pub fn open(config: &SerialConfig) -> Result<LineReader<Box<dyn SerialPort>>, SourceError> {
    let name = match &config.port {
        Some(port) => port.clone(),
        None => {
            let ports = list_ports()?;
            find_port(&ports, &config.description_match)
                .map(|p| p.name.clone())
                .ok_or_else(|| SourceError::NotFound(config.description_match.clone()))?
        }
    };

    let port = serialport::new(&name, config.baud_rate)
        .timeout(config.read_timeout())
        .open()?;
    info!("Opened receiver on {} at {} baud", name, config.baud_rate);
    Ok(LineReader::new(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Reader that replays scripted chunks and errors, then reports EOF.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
    }

    #[test]
    fn test_splits_crlf_frames() {
        let mut src = LineReader::new(io::Cursor::new(b"FF30CF\r\nFF18E7\r\n".to_vec()));
        assert_eq!(src.next_frame().unwrap(), Some(b"FF30CF".to_vec()));
        assert_eq!(src.next_frame().unwrap(), Some(b"FF18E7".to_vec()));
        assert!(matches!(src.next_frame(), Err(SourceError::Closed)));
    }

    #[test]
    fn test_partial_frame_survives_timeout() {
        let mut src = LineReader::new(Scripted(VecDeque::from(vec![
            Ok(b"FF3".to_vec()),
            timeout(),
            Ok(b"0CF\r".to_vec()),
            Ok(b"\n".to_vec()),
        ])));
        assert_eq!(src.next_frame().unwrap(), None);
        assert_eq!(src.next_frame().unwrap(), Some(b"FF30CF".to_vec()));
    }

    #[test]
    fn test_skips_empty_lines() {
        let mut src = LineReader::new(io::Cursor::new(b"\r\n\nFFFFFFFF\n".to_vec()));
        assert_eq!(src.next_frame().unwrap(), Some(b"FFFFFFFF".to_vec()));
    }

    #[test]
    fn test_interrupted_read_retries() {
        let mut src = LineReader::new(Scripted(VecDeque::from(vec![
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(b"AB\n".to_vec()),
        ])));
        assert_eq!(src.next_frame().unwrap(), Some(b"AB".to_vec()));
    }

    #[test]
    fn test_runaway_line_is_discarded() {
        let mut chunks: VecDeque<io::Result<Vec<u8>>> =
            (0..5).map(|_| Ok(vec![b'x'; 64])).collect();
        chunks.push_back(Ok(b"\nOK\n".to_vec()));
        let mut src = LineReader::new(Scripted(chunks));
        assert_eq!(src.next_frame().unwrap(), Some(b"OK".to_vec()));
    }

    #[test]
    fn test_overlong_complete_line_is_dropped() {
        let mut bytes = vec![b'x'; 300];
        bytes.extend_from_slice(b"\nOK\n");
        let mut src = LineReader::new(io::Cursor::new(bytes));
        assert_eq!(src.next_frame().unwrap(), Some(b"OK".to_vec()));
        assert!(matches!(src.next_frame(), Err(SourceError::Closed)));
    }

    #[test]
    fn test_tail_of_cleared_line_is_dropped() {
        let mut bytes = vec![b'y'; 400];
        bytes.extend_from_slice(b"\r\nFF30CF\r\n");
        let mut src = LineReader::new(io::Cursor::new(bytes));
        assert_eq!(src.next_frame().unwrap(), Some(b"FF30CF".to_vec()));
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut bytes = vec![b'A'; MAX_FRAME_LEN];
        bytes.push(b'\n');
        let mut src = LineReader::new(io::Cursor::new(bytes));
        assert_eq!(src.next_frame().unwrap().map(|f| f.len()), Some(MAX_FRAME_LEN));
    }

    #[test]
    fn test_decode_frame() {
        assert_eq!(decode_frame(b"FF30CF"), Some(Signal::new("FF30CF").unwrap()));
        assert_eq!(decode_frame(&[0xFF, 0xFE, 0x41]), None);
        assert_eq!(decode_frame(b"   "), None);
    }

    #[test]
    fn test_find_port_matches_description() {
        let ports = vec![
            PortInfo {
                name: "/dev/ttyS0".to_string(),
                description: None,
            },
            PortInfo {
                name: "/dev/ttyACM0".to_string(),
                description: Some("Arduino Uno / Arduino (www.arduino.cc)".to_string()),
            },
        ];
        assert_eq!(
            find_port(&ports, "arduino").map(|p| p.name.as_str()),
            Some("/dev/ttyACM0")
        );
        assert!(find_port(&ports, "CH340").is_none());
    }
}
