//! High-level device interface

use std::io;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use bro2_core::{
    Command, ConfigureFields, DeviceCapabilities, LineBuffer, NegotiateFields, RecordHeader,
    ScanRecord, Session, SessionState, StatusOutcome, StatusResponse,
    constants::{CONTROL_READ_SIZE, DEFAULT_CONNECT_TIMEOUT},
};
use bro2_transport::{ReadOutcome, TcpTransport, Transport};
use bro2_types::{
    DeviceName, OptionId, OptionValue, Resolution, ScanArea, ScanParameters, ScanSettings,
};

use crate::error::{Error, Result};

/// Largest single socket read while streaming
const READ_CHUNK_SIZE: usize = 4096;

/// Brother network scanner
///
/// Owns the connection, the scan settings and the reassembly buffer of one
/// scan session. All operations take `&mut self`; a device is never shared.
///
/// # Examples
///
/// ```no_run
/// use bro2::Device;
///
/// #[tokio::main]
/// async fn main() -> bro2::Result<()> {
///     let mut device = Device::new("192.168.1.20", bro2::DEFAULT_PORT);
///
///     device.connect().await?;
///     let params = device.start().await?;
///     println!("{}", params);
///
///     let mut line = vec![0u8; 64 * 1024];
///     loop {
///         match device.read(&mut line).await {
///             Ok(n) => println!("{} bytes", n),
///             Err(bro2::Error::Disconnected) => break,
///             Err(e) => return Err(e),
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    session: Session,
    host: String,
    connect_timeout: Duration,
    settings: ScanSettings,
    params: Option<ScanParameters>,
    line_buffer: LineBuffer,
}

impl Device {
    /// Create a new device instance (TCP transport)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let transport = Box::new(TcpTransport::new(host.clone(), port));
        Self::with_transport(host, transport)
    }

    /// Create a device on top of an existing transport
    pub fn with_transport(host: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(),
            host: host.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            settings: ScanSettings::default(),
            params: None,
            line_buffer: LineBuffer::new(),
        }
    }

    /// Open a device by frontend name (`bro2:<host>`) and connect to it
    pub async fn open(name: &str) -> Result<Self> {
        let name: DeviceName = name.parse()?;
        let mut device = Self::new(name.host(), bro2_core::DEFAULT_PORT);
        device.connect().await?;
        Ok(device)
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the scan-data buffer capacity
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.line_buffer = LineBuffer::with_capacity(capacity);
        self
    }

    /// Start from custom settings instead of the defaults
    pub fn with_settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Host this device talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Current settings (including values corrected by the device)
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Read one option
    pub fn get_option(&self, id: OptionId) -> OptionValue {
        self.settings.get(id)
    }

    /// Change one option
    ///
    /// Not allowed once the device is armed; the committed parameters would
    /// no longer match the stream.
    pub fn set_option(&mut self, id: OptionId, value: OptionValue) -> Result<()> {
        if self.session.is_armed() {
            return Err(bro2_core::Error::InvalidSessionState {
                state: self.session.state(),
                action: "change options",
            }
            .into());
        }

        debug!(option = %id, value = %value, "Setting option");
        self.settings.set(id, value)?;
        Ok(())
    }

    /// Parameters of the image being streamed
    pub fn parameters(&self) -> Result<ScanParameters> {
        self.session
            .expect(&[SessionState::Configured, SessionState::Streaming], "get parameters")?;

        self.params.ok_or(Error::NotConnected)
    }

    /// Connect to device and read its status line
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectFailed`] if the connection cannot be established
    /// - [`Error::DeviceBusy`] if another client holds the scanner; the
    ///   connection is released and `connect` may be retried
    /// - [`Error::UnexpectedStatus`] or a parse error for any other reply
    pub async fn connect(&mut self) -> Result<()> {
        if !self.session.state().can_connect() {
            return Err(bro2_core::Error::InvalidSessionState {
                state: self.session.state(),
                action: "connect",
            }
            .into());
        }

        info!("Connecting to {}...", self.transport.remote_addr());

        self.line_buffer.clear();
        self.params = None;

        let connected = match timeout(self.connect_timeout, self.transport.connect()).await {
            Ok(result) => result,
            Err(_) => Err(bro2_transport::Error::ConnectionTimeout),
        };

        if let Err(e) = connected {
            warn!("Connect to {} failed: {}", self.host, e);
            self.session.fail();
            return Err(Error::ConnectFailed(e));
        }

        self.session.connected()?;

        match self.read_status().await {
            Ok(()) => {
                info!("Connected to {}", self.transport.remote_addr());
                Ok(())
            }
            Err(Error::DeviceBusy) => {
                info!("Device {} is busy", self.host);
                self.release().await;
                self.session.reset();
                Err(Error::DeviceBusy)
            }
            Err(e) => {
                self.abort(&e).await;
                Err(e)
            }
        }
    }

    /// Negotiate and configure, leaving the device ready to stream
    pub async fn start(&mut self) -> Result<ScanParameters> {
        self.negotiate().await?;
        self.configure().await
    }

    /// Ask the device what it can do with the current settings
    ///
    /// On success the resolution and the bottom-right corner of the scan
    /// area are replaced with the values the device reported.
    pub async fn negotiate(&mut self) -> Result<DeviceCapabilities> {
        self.session.expect(&[SessionState::StatusChecked], "negotiate")?;

        let result = self.exchange_negotiate().await;
        self.settle(result).await
    }

    /// Commit the settings and arm the device
    pub async fn configure(&mut self) -> Result<ScanParameters> {
        self.session.expect(&[SessionState::Negotiated], "configure")?;

        let result = self.exchange_configure().await;
        self.settle(result).await
    }

    /// Read the payload of one scan-data record into `buf`
    ///
    /// Returns the number of bytes delivered; `0` means no complete record
    /// is available yet (or, in non-blocking mode, no data arrived). A
    /// record with an empty payload also reads as `0`; use
    /// [`read_record`](Self::read_record) when tags matter.
    ///
    /// # Errors
    ///
    /// - [`Error::Disconnected`] when the device closes the stream
    /// - `OutputTooSmall` if `buf` cannot hold the next record; the record
    ///   stays buffered and the call can be repeated with a larger buffer
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.begin_read()?;

        if let Some(header) = self.take_into(buf).await? {
            return Ok(usize::from(header.len));
        }

        if !self.fill().await? {
            return Ok(0);
        }

        Ok(self
            .take_into(buf)
            .await?
            .map_or(0, |header| usize::from(header.len)))
    }

    /// Read one complete scan-data record, tag included
    pub async fn read_record(&mut self) -> Result<Option<ScanRecord>> {
        self.begin_read()?;

        if let Some(record) = self.take_record().await? {
            return Ok(Some(record));
        }

        if !self.fill().await? {
            return Ok(None);
        }

        self.take_record().await
    }

    /// Abort the scan and release the connection
    ///
    /// The cancel command is best effort; the connection is released even if
    /// it cannot be sent. Partially received records are discarded.
    pub async fn cancel(&mut self) {
        if self.transport.is_connected() {
            info!("Cancelling scan on {}", self.host);

            if let Err(e) = self.send_command(&Command::Cancel).await {
                warn!("Failed to send CANCEL command: {}", e);
            }

            self.release().await;
        }

        self.line_buffer.clear();
        self.params = None;
        self.session.cancel();
    }

    /// Close the session
    pub async fn close(&mut self) {
        if self.session.is_armed() {
            self.cancel().await;
        } else if self.transport.is_connected() {
            info!("Disconnecting from {}...", self.host);
            self.release().await;
        }

        self.line_buffer.clear();
        self.params = None;
        self.session.reset();

        info!("Disconnected");
    }

    /// Switch scan-data reads between blocking and non-blocking
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        if !self.transport.is_connected() {
            return Err(Error::NotConnected);
        }

        self.transport.set_nonblocking(nonblocking)?;
        Ok(())
    }

    // Protocol steps

    async fn read_status(&mut self) -> Result<()> {
        let mut buf = [0u8; CONTROL_READ_SIZE];
        let n = self.read_control(&mut buf).await?;

        let status = StatusResponse::parse(&buf[..n])?;
        debug!(%status, "Status line");

        match status.outcome() {
            StatusOutcome::Ready => {
                self.session.status_checked()?;
                Ok(())
            }
            StatusOutcome::Busy => Err(Error::DeviceBusy),
            StatusOutcome::NotGoodReady | StatusOutcome::Other(_) => {
                Err(Error::UnexpectedStatus(status.effective_code()))
            }
        }
    }

    async fn exchange_negotiate(&mut self) -> Result<DeviceCapabilities> {
        let resolution = self.settings.resolution();
        let command = Command::Negotiate(NegotiateFields {
            x_res: resolution.x,
            y_res: resolution.y,
            mode: self.settings.mode().to_string(),
        });
        self.send_command(&command).await?;

        let mut buf = [0u8; CONTROL_READ_SIZE];
        let n = self.read_control(&mut buf).await?;
        let caps = DeviceCapabilities::parse(&buf[..n])?;

        let (x, y) = caps.resolution();
        let (max_x, max_y) = caps.max_extent();
        if (x, y) != (resolution.x, resolution.y) {
            debug!(
                requested = ?(resolution.x, resolution.y),
                reported = ?(x, y),
                "Device adjusted resolution"
            );
        }

        self.settings.set_resolution(Resolution { x, y });
        self.settings.set_area(ScanArea {
            br_x: max_x,
            br_y: max_y,
            ..self.settings.area()
        });
        self.session.negotiated()?;

        Ok(caps)
    }

    async fn exchange_configure(&mut self) -> Result<ScanParameters> {
        let settings = &self.settings;
        let resolution = settings.resolution();
        let area = settings.area();

        let command = Command::Configure(ConfigureFields {
            x_res: resolution.x,
            y_res: resolution.y,
            mode: settings.mode().to_string(),
            compression: settings.compression().to_string(),
            brightness: settings.brightness(),
            contrast: settings.contrast(),
            tl_x: area.tl_x,
            tl_y: area.tl_y,
            br_x: area.br_x,
            br_y: area.br_y,
            aux: settings.aux().to_string(),
        });
        self.send_command(&command).await?;

        let params = ScanParameters::from_settings(&self.settings);
        debug!(%params, "Scan configured");

        self.params = Some(params);
        self.session.configured()?;

        Ok(params)
    }

    fn begin_read(&mut self) -> Result<()> {
        self.session
            .expect(&[SessionState::Configured, SessionState::Streaming], "read")?;
        self.session.streaming()?;
        Ok(())
    }

    /// One socket read into the line buffer; `false` if it would block
    async fn fill(&mut self) -> Result<bool> {
        let want = self.line_buffer.remaining().min(READ_CHUNK_SIZE);
        if want == 0 {
            let err = Error::from(bro2_core::Error::BufferOverrun {
                required: self.line_buffer.len() + 1,
                capacity: self.line_buffer.capacity(),
            });
            self.abort(&err).await;
            return Err(err);
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let outcome = match self.transport.read(&mut chunk[..want]).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = Error::from(e);
                self.abort(&err).await;
                return Err(err);
            }
        };

        match outcome {
            ReadOutcome::Data(n) => {
                if let Err(e) = self.line_buffer.feed(&chunk[..n]) {
                    let err = Error::from(e);
                    self.abort(&err).await;
                    return Err(err);
                }
                Ok(true)
            }
            ReadOutcome::WouldBlock => Ok(false),
            ReadOutcome::Closed => {
                info!("Device {} ended the stream", self.host);
                self.release().await;
                self.line_buffer.clear();
                self.session.close();
                Err(Error::Disconnected)
            }
        }
    }

    async fn take_into(&mut self, buf: &mut [u8]) -> Result<Option<RecordHeader>> {
        match self.line_buffer.copy_record_into(buf) {
            Ok(header) => Ok(header),
            Err(e @ bro2_core::Error::OutputTooSmall { .. }) => Err(e.into()),
            Err(e) => {
                let err = Error::from(e);
                self.abort(&err).await;
                Err(err)
            }
        }
    }

    async fn take_record(&mut self) -> Result<Option<ScanRecord>> {
        let result = self.line_buffer.next_record().map_err(Error::from);
        self.settle(result).await
    }

    // Helper methods

    async fn send_command(&mut self, command: &Command) -> Result<()> {
        let data = command.encode()?;
        debug!("Sending {} ({} bytes)", command, data.len());

        let written = self.transport.write(&data).await?;
        if written != data.len() {
            return Err(Error::ShortWrite {
                expected: data.len(),
                written,
            });
        }

        Ok(())
    }

    /// Single read for a control reply
    async fn read_control(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.transport.read(buf).await? {
            ReadOutcome::Data(n) => {
                trace!("Control reply: {:02X?}", &buf[..n.min(32)]);
                Ok(n)
            }
            ReadOutcome::Closed => Err(Error::Disconnected),
            ReadOutcome::WouldBlock => {
                Err(bro2_transport::Error::Io(io::ErrorKind::WouldBlock.into()).into())
            }
        }
    }

    /// Tear the session down after a failed protocol step
    async fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.abort(e).await;
        }
        result
    }

    async fn abort(&mut self, err: &Error) {
        warn!("Session with {} failed: {}", self.host, err);
        self.release().await;
        self.line_buffer.clear();
        self.params = None;
        self.session.fail();
    }

    async fn release(&mut self) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Failed to release connection: {}", e);
            }
        }
    }
}
