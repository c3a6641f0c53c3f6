//! G-code link over a serial byte stream
//!
//! Each command is written as one `\n`-terminated line, then the link waits
//! for the controller's `ok`. While waiting, other lines are classified:
//!
//! - `echo:busy` restarts the acknowledgment timer, once per command
//! - `Error...` marks the command as rejected (the trailing `ok` is still
//!   consumed so the next command starts clean)
//! - position reports are kept for [`Transport::query_position`]
//!
//! Lines already received when a command is about to be written belong to
//! an earlier command and are dropped first.
//!
//! Works with any `embedded-io-async` stream: a UART, a USB CDC port, or a
//! host serial port adapter.

use embassy_futures::select::{select, Either};
use embedded_io_async::{Read, Write};

use dabber_core::config::LinkConfig;
use dabber_core::traits::{Clock, MachinePosition, Transport, TransportError};
use dabber_protocol::{gcode, Command, Line, LineAssembler, PositionReport, Response};

/// Buffer size for a single read from the port
const RX_BUF_SIZE: usize = 64;

/// Byte stream with line framing on the receive side
///
/// Bytes read past the end of a line are kept for the next call.
pub struct LineReader<IO> {
    io: IO,
    assembler: LineAssembler,
    buf: [u8; RX_BUF_SIZE],
    pos: usize,
    len: usize,
}

impl<IO: Read + Write> LineReader<IO> {
    pub fn new(io: IO) -> Self {
        Self {
            io,
            assembler: LineAssembler::new(),
            buf: [0; RX_BUF_SIZE],
            pos: 0,
            len: 0,
        }
    }

    /// Wait for the next complete line
    pub async fn read_line(&mut self) -> Result<Line, TransportError> {
        loop {
            while self.pos < self.len {
                let byte = self.buf[self.pos];
                self.pos += 1;
                if let Some(line) = self.assembler.feed(byte) {
                    return Ok(line);
                }
            }

            let n = self
                .io
                .read(&mut self.buf)
                .await
                .map_err(|_| TransportError::Io)?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            trace!("rx {} bytes", n);
            self.pos = 0;
            self.len = n;
        }
    }

    /// Write one line and flush it
    pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.io
            .write_all(line.as_bytes())
            .await
            .map_err(|_| TransportError::Io)?;
        self.io
            .write_all(b"\n")
            .await
            .map_err(|_| TransportError::Io)?;
        self.io.flush().await.map_err(|_| TransportError::Io)
    }

    /// Drop buffered input, including a partial line
    pub fn discard_input(&mut self) {
        self.pos = 0;
        self.len = 0;
        self.assembler.reset();
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}

/// Acknowledged G-code transport
pub struct SerialTransport<IO, C> {
    port: LineReader<IO>,
    clock: C,
    ack_timeout_ms: u64,
    last_position: Option<PositionReport>,
}

impl<IO, C> SerialTransport<IO, C>
where
    IO: Read + Write,
    C: Clock,
{
    /// Wrap an open port
    pub fn new(io: IO, clock: C, ack_timeout_ms: u64) -> Self {
        Self {
            port: LineReader::new(io),
            clock,
            ack_timeout_ms,
            last_position: None,
        }
    }

    /// Wrap an open port using the link section of the machine config
    pub fn from_config(io: IO, clock: C, config: &LinkConfig) -> Self {
        Self::new(io, clock, config.ack_timeout_ms)
    }

    /// Drop anything the controller sent before the first command
    ///
    /// Controllers print a start banner on connect; call this once the
    /// banner has been read so it is not mistaken for a reply.
    pub fn discard_input(&mut self) {
        self.port.discard_input();
    }

    /// Release the underlying port
    pub fn into_inner(self) -> IO {
        self.port.into_inner()
    }

    /// Drop every line that has already arrived
    ///
    /// A reply that shows up after its command timed out must not
    /// acknowledge the next command.
    async fn drain_received(&mut self) -> Result<(), TransportError> {
        loop {
            match select(self.port.read_line(), self.clock.delay_ms(0)).await {
                Either::First(line) => {
                    let line = line?;
                    debug!("dropping stale line: {}", line.as_str());
                }
                Either::Second(()) => break,
            }
        }
        self.port.discard_input();
        Ok(())
    }

    async fn execute(&mut self, command: &Command) -> Result<(), TransportError> {
        self.drain_received().await?;
        trace!("tx {}", command.as_str());
        self.port.write_line(command.as_str()).await?;
        self.wait_for_ok().await
    }

    async fn wait_for_ok(&mut self) -> Result<(), TransportError> {
        let mut deadline = self.clock.now_ms() + self.ack_timeout_ms;
        let mut extended = false;
        let mut rejected = false;

        loop {
            let remaining = deadline.saturating_sub(self.clock.now_ms());
            if remaining == 0 {
                break;
            }
            let line = match select(self.port.read_line(), self.clock.delay_ms(remaining)).await {
                Either::First(line) => line?,
                Either::Second(()) => break,
            };

            match Response::parse(&line) {
                Response::Ok if rejected => return Err(TransportError::Rejected),
                Response::Ok => return Ok(()),
                Response::Busy => {
                    if !extended {
                        extended = true;
                        deadline = self.clock.now_ms() + self.ack_timeout_ms;
                        debug!("controller busy, waiting longer");
                    }
                }
                Response::Position(report) => self.last_position = Some(report),
                Response::Error => {
                    warn!("controller error: {}", line.as_str());
                    rejected = true;
                }
                Response::Other => trace!("rx {}", line.as_str()),
            }
        }

        if rejected {
            Err(TransportError::Rejected)
        } else {
            warn!("no acknowledgment within {} ms", self.ack_timeout_ms);
            Err(TransportError::Timeout)
        }
    }
}

impl<IO, C> Transport for SerialTransport<IO, C>
where
    IO: Read + Write,
    C: Clock,
{
    async fn send(&mut self, commands: &[Command]) -> Result<(), TransportError> {
        for command in commands {
            self.execute(command).await?;
        }
        Ok(())
    }

    async fn query_position(&mut self) -> Result<Option<MachinePosition>, TransportError> {
        self.last_position = None;
        self.execute(&gcode::report_position()).await?;
        Ok(self.last_position.map(MachinePosition::from))
    }
}
