//! # Transport
//!
//! The two seams the rest of the crate sees, [`LineSource`] for reading and
//! [`CommandWriter`] for writing, and their tokio-serial implementation.

use std::future::Future;
use std::time::Duration;

use log::{error, info, warn};
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
pub use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

use super::{EventSender, LinkEvent, reader::run_reader};
use crate::config::HmiConfig;
use crate::error::{HmiError, Result};
use crate::protocol::decode_line;

/// Longest partial line kept across read timeouts before it is handed on as-is.
pub const MAX_LINE_BYTES: usize = 1024;

/// Source of inbound lines.
pub trait LineSource: Send {
    /// Reads one line, trimmed of its terminator and surrounding whitespace.
    ///
    /// `Ok(None)` means the read timed out with no complete line.
    fn read_line(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Sink for encoded outbound commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandWriter: Send {
    /// Queues or writes one encoded command line.
    fn write_line(&mut self, line: &[u8]) -> Result<()>;
}

/// Line reader over any async byte stream, bounded by a per-read timeout.
///
/// Bytes of a line that is still incomplete when the timeout fires are kept
/// and completed by the next call, up to [`MAX_LINE_BYTES`].
pub struct SerialLineSource<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    timeout: Duration,
}

impl<R: AsyncRead + Unpin + Send> SerialLineSource<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            timeout,
        }
    }

    fn take_line(&mut self) -> String {
        let line = decode_line(&self.pending);
        self.pending.clear();
        line
    }
}

impl<R: AsyncRead + Unpin + Send> LineSource for SerialLineSource<R> {
    async fn read_line(&mut self) -> Result<Option<String>> {
        let timeout = self.timeout;
        let read = tokio::time::timeout(timeout, self.reader.read_until(b'\n', &mut self.pending)).await;
        match read {
            Err(_) if self.pending.len() >= MAX_LINE_BYTES => {
                warn!("no line terminator after {} bytes, flushing partial line", self.pending.len());
                Ok(Some(self.take_line()))
            }
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(HmiError::port_read(e.to_string())),
            Ok(Ok(0)) if self.pending.is_empty() => {
                Err(HmiError::port_read("serial stream closed"))
            }
            Ok(Ok(_)) => Ok(Some(self.take_line())),
        }
    }
}

/// [`CommandWriter`] that hands lines to the writer task.
#[derive(Clone)]
pub struct ChannelWriter {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelWriter {
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// A writer with no link behind it; every write fails.
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl CommandWriter for ChannelWriter {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.tx
            .send(line.to_vec())
            .map_err(|_| HmiError::port_write("serial link is not open"))
    }
}

/// Sole owner of the write half: drains queued lines in order.
pub async fn run_writer<W>(mut port: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>, events: EventSender)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let written = match port.write_all(&line).await {
            Ok(()) => port.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("serial write failed: {e}");
            let _ = events.send(LinkEvent::WriteError(e.to_string()));
        }
    }
    info!("writer task stopped");
}

/// An open serial connection with its reader and writer tasks.
pub struct SerialLink {
    writer: ChannelWriter,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl SerialLink {
    /// Opens the configured port and spawns the reader and writer on `runtime`.
    pub fn open(config: &HmiConfig, runtime: &Handle, events: EventSender) -> Result<Self> {
        let stream = {
            let _guard = runtime.enter();
            open_port(config)?
        };
        Ok(Self::spawn(stream, config, runtime, events))
    }

    /// Spawns the link tasks over an already-open duplex stream.
    pub fn spawn<S>(stream: S, config: &HmiConfig, runtime: &Handle, events: EventSender) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();

        let source = SerialLineSource::new(read_half, config.read_timeout());
        let reader_task = runtime.spawn(run_reader(source, events.clone(), config.read_retry()));
        let writer_task = runtime.spawn(run_writer(write_half, rx, events));

        Self {
            writer: ChannelWriter::new(tx),
            reader_task,
            writer_task,
        }
    }

    /// Writer handle for the command dispatcher.
    pub fn writer(&self) -> ChannelWriter {
        self.writer.clone()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

fn open_port(config: &HmiConfig) -> Result<SerialStream> {
    match tokio_serial::new(&config.port_name, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout())
        .open_native_async()
    {
        Ok(stream) => {
            info!("opened serial port {} at {} baud", config.port_name, config.baud_rate);
            Ok(stream)
        }
        Err(e) => {
            error!("failed to open serial port {}: {}", config.port_name, e);
            Err(HmiError::port_open(&config.port_name, e.to_string()))
        }
    }
}
