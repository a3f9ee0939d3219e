//! Controller client: owns the TCP connection to the LiteTouch bridge.
//!
//! [`LiteTouchController::connect`] spawns a single task that owns the
//! socket. Handles only push commands into a bounded queue, so callers
//! never wait on the network. Commands are refused with
//! [`LiteTouchError::NotConnected`] while the link is down. The task
//! reconnects forever with a fixed delay and re-requests LED states for
//! every subscribed address after each reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::address::{Address, signal_for};
use crate::config::LiteTouchConfig;
use crate::dispatcher::{Dispatcher, Subscription};
use crate::error::{LiteTouchError, ProtocolError};
use crate::protocol::{Command, Frame, RERR, RPONG, TERMINATOR};
use crate::registry::StateRegistry;

/// Operations a switch needs from the bus controller.
///
/// Only [`send`](Self::send), [`subscribe`](Self::subscribe) and
/// [`last_level`](Self::last_level) are required; the named commands are
/// built on top of `send`. None of them block.
pub trait Controller: Send + Sync {
    /// Queue a command for the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::Busy`] when the queue is full or
    /// [`LiteTouchError::NotConnected`] when the bridge is unreachable.
    fn send(&self, command: Command) -> Result<(), LiteTouchError>;

    /// Receive every frame addressed to `address`.
    fn subscribe(&self, address: &Address) -> Subscription;

    /// Last level reported for `address`, if any.
    fn last_level(&self, address: &Address) -> Option<i64>;

    /// # Errors
    ///
    /// See [`send`](Self::send).
    fn toggle_switch(&self, keypad: u16, button: u16) -> Result<(), LiteTouchError> {
        self.send(Command::ToggleSwitch { keypad, button })
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    fn set_load_on(&self, load_id: u32) -> Result<(), LiteTouchError> {
        self.send(Command::LoadOn(load_id))
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    fn set_load_off(&self, load_id: u32) -> Result<(), LiteTouchError> {
        self.send(Command::LoadOff(load_id))
    }

    /// Set the controller clock to the local wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    fn set_clock(&self) -> Result<(), LiteTouchError> {
        self.send(Command::SetClock(litehub_domain::time::local_wall_clock()))
    }

    /// Ask the bridge to report the LED state of `address`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    fn get_led_states(&self, address: &Address) -> Result<(), LiteTouchError> {
        self.send(Command::GetLedStates(address.clone()))
    }
}

/// Longest line accepted from the bridge, terminator included.
const MAX_FRAME_LEN: usize = 256;

#[derive(Default)]
struct Shared {
    dispatcher: Dispatcher,
    registry: StateRegistry,
    online: AtomicBool,
}

/// Marks the link as up for as long as it is alive.
struct Online<'a>(&'a AtomicBool);

impl<'a> Online<'a> {
    fn mark(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Online<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Cloneable handle to the connection task.
///
/// The task exits once every handle has been dropped.
#[derive(Clone)]
pub struct LiteTouchController {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
}

impl LiteTouchController {
    /// Spawn the connection task for the bridge described by `config`.
    ///
    /// Must be called from within a tokio runtime. The connection is
    /// established in the background and [`send`](Controller::send) fails
    /// until it is up.
    #[must_use]
    pub fn connect(config: &LiteTouchConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(config.command_buffer.max(1));
        let shared = Arc::new(Shared::default());
        let connection = Connection {
            bridge: config.bridge_addr(),
            keep_alive: Duration::from_secs(config.keep_alive_secs.max(1)),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            shared: Arc::clone(&shared),
        };
        let handle = tokio::spawn(connection.run(receiver));
        (Self { commands, shared }, handle)
    }

    /// Whether the TCP link to the bridge is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.online.load(Ordering::SeqCst)
    }
}

impl Controller for LiteTouchController {
    fn send(&self, command: Command) -> Result<(), LiteTouchError> {
        if !self.is_connected() {
            return Err(LiteTouchError::NotConnected);
        }
        self.commands.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => LiteTouchError::Busy,
            TrySendError::Closed(_) => LiteTouchError::NotConnected,
        })
    }

    fn subscribe(&self, address: &Address) -> Subscription {
        self.shared.dispatcher.subscribe(address.signal())
    }

    fn last_level(&self, address: &Address) -> Option<i64> {
        self.shared.registry.level(address.as_str())
    }
}

struct Connection {
    bridge: String,
    keep_alive: Duration,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
}

impl Connection {
    async fn run(self, mut commands: mpsc::Receiver<Command>) {
        loop {
            match TcpStream::connect(&self.bridge).await {
                Ok(stream) => {
                    tracing::info!(bridge = %self.bridge, "connected to LiteTouch bridge");
                    match self.serve(stream, &mut commands).await {
                        Ok(()) => {
                            tracing::info!("all controller handles dropped, closing connection");
                            return;
                        }
                        Err(err) => {
                            tracing::warn!(bridge = %self.bridge, error = %err, "connection to LiteTouch bridge lost");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(bridge = %self.bridge, error = %err, "failed to connect to LiteTouch bridge");
                }
            }

            if !self.wait_before_reconnect(&mut commands).await {
                tracing::info!("all controller handles dropped, giving up reconnecting");
                return;
            }
        }
    }

    /// Sleep for the reconnect delay, dropping whatever was still queued
    /// when the link went down. Returns `false` when every handle is gone.
    async fn wait_before_reconnect(&self, commands: &mut mpsc::Receiver<Command>) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => return true,
                command = commands.recv() => match command {
                    Some(command) => {
                        tracing::warn!(%command, "LiteTouch bridge offline, command dropped");
                    }
                    None => return false,
                },
            }
        }
    }

    /// Drive one connection. `Ok(())` means the command queue closed.
    async fn serve(
        &self,
        stream: TcpStream,
        commands: &mut mpsc::Receiver<Command>,
    ) -> Result<(), LiteTouchError> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut lines = LineBuffer::default();
        // set before reading the subscriptions so a concurrent attach either
        // sends its own request or is covered by the resync below
        let _online = Online::mark(&self.shared.online);

        for signal in self.shared.dispatcher.signals() {
            if let Some(address) = Address::from_signal(&signal) {
                write_command(&mut writer, &Command::GetLedStates(address)).await?;
            }
        }

        let idle = tokio::time::sleep(self.keep_alive);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                read = async {
                    let mut limited = (&mut reader).take(lines.room());
                    limited.read_until(TERMINATOR, &mut lines.bytes).await
                } => {
                    if read? == 0 {
                        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
                    }
                    if let Some(line) = lines.take_line() {
                        self.handle_line(&line);
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        return Ok(());
                    };
                    write_command(&mut writer, &command).await?;
                    idle.as_mut().reset(Instant::now() + self.keep_alive);
                }
                () = &mut idle => {
                    write_command(&mut writer, &Command::KeepAlive).await?;
                    idle.as_mut().reset(Instant::now() + self.keep_alive);
                }
            }
        }
    }

    fn handle_line(&self, line: &str) {
        let frame = match Frame::parse(line) {
            Ok(frame) => frame,
            Err(ProtocolError::Empty) => return,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed LiteTouch frame");
                return;
            }
        };

        match frame.msg_type.as_str() {
            RPONG => tracing::trace!("keep-alive acknowledged"),
            RERR => {
                tracing::warn!(code = ?frame.values.first(), "LiteTouch bridge reported an error");
            }
            _ => self.fan_out(&frame),
        }
    }

    fn fan_out(&self, frame: &Frame) {
        let Some(address) = frame.address() else {
            tracing::debug!(msg_type = %frame.msg_type, "frame without address ignored");
            return;
        };
        if frame.is_status() {
            match frame.level() {
                Ok(level) => self.shared.registry.record(address, level),
                Err(err) => tracing::warn!(address, error = %err, "status frame without usable level"),
            }
        }
        let delivered = self.shared.dispatcher.dispatch(&signal_for(address), frame);
        tracing::trace!(address, msg_type = %frame.msg_type, delivered, "frame dispatched");
    }
}

/// Bytes read so far for the current line.
///
/// A line that reaches [`MAX_FRAME_LEN`] without a terminator is dropped in
/// full, including the rest of it up to the next terminator.
#[derive(Default)]
struct LineBuffer {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    /// How many more bytes the current line may take.
    fn room(&self) -> u64 {
        MAX_FRAME_LEN.saturating_sub(self.bytes.len()) as u64
    }

    /// Hand out the buffered line once it is terminated.
    fn take_line(&mut self) -> Option<String> {
        if self.bytes.last() == Some(&TERMINATOR) {
            let line = String::from_utf8_lossy(&self.bytes).into_owned();
            self.bytes.clear();
            return (!std::mem::take(&mut self.overflowed)).then_some(line);
        }
        if self.bytes.len() >= MAX_FRAME_LEN {
            if !self.overflowed {
                tracing::warn!(limit = MAX_FRAME_LEN, "oversized LiteTouch frame discarded");
            }
            self.overflowed = true;
            self.bytes.clear();
        }
        None
    }
}

async fn write_command(writer: &mut OwnedWriteHalf, command: &Command) -> Result<(), LiteTouchError> {
    tracing::debug!(%command, "sending LiteTouch command");
    writer.write_all(&command.encode()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(3);

    async fn bridge() -> (TcpListener, LiteTouchConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = LiteTouchConfig {
            host: "127.0.0.1".to_string(),
            port,
            reconnect_delay_secs: 0,
            ..LiteTouchConfig::default()
        };
        (listener, config)
    }

    async fn accept(listener: &TcpListener) -> BufReader<TcpStream> {
        let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        BufReader::new(stream)
    }

    async fn read_frame(stream: &mut BufReader<TcpStream>) -> String {
        let mut buf = Vec::new();
        timeout(WAIT, stream.read_until(TERMINATOR, &mut buf))
            .await
            .unwrap()
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    async fn wait_until_connected(controller: &LiteTouchController, connected: bool) {
        timeout(WAIT, async {
            while controller.is_connected() != connected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn should_write_command_frames() {
        let (listener, config) = bridge().await;
        let (controller, _task) = LiteTouchController::connect(&config);
        let mut socket = accept(&listener).await;
        wait_until_connected(&controller, true).await;

        controller.set_load_on(12).unwrap();
        controller.toggle_switch(4, 2).unwrap();

        assert_eq!(read_frame(&mut socket).await, "R,CSLON,12\r");
        assert_eq!(read_frame(&mut socket).await, "R,CTGSW,4,2\r");
    }

    #[tokio::test]
    async fn should_fan_out_status_frames_and_record_levels() {
        let (listener, config) = bridge().await;
        let (controller, _task) = LiteTouchController::connect(&config);
        let address = Address::new("12_3").unwrap();
        let mut subscription = controller.subscribe(&address);
        let mut socket = accept(&listener).await;

        assert_eq!(read_frame(&mut socket).await, "R,CGLES,12_3\r");
        socket
            .get_mut()
            .write_all(b"R,RPONG\rR,RLEDU,9_9,1\rR,RLEDU,12_3,1\r")
            .await
            .unwrap();

        let frame = timeout(WAIT, subscription.recv()).await.unwrap().unwrap();
        assert_eq!(frame.msg_type, "RLEDU");
        assert_eq!(frame.values, vec!["12_3", "1"]);
        assert_eq!(controller.last_level(&address), Some(1));
        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn should_resync_subscribed_addresses_after_reconnect() {
        let (listener, config) = bridge().await;
        let (controller, _task) = LiteTouchController::connect(&config);
        let _subscription = controller.subscribe(&Address::new("7_1").unwrap());

        let mut first = accept(&listener).await;
        assert_eq!(read_frame(&mut first).await, "R,CGLES,7_1\r");
        drop(first);

        let mut second = accept(&listener).await;
        assert_eq!(read_frame(&mut second).await, "R,CGLES,7_1\r");
    }

    #[tokio::test]
    async fn should_send_keep_alive_when_idle() {
        let (listener, mut config) = bridge().await;
        config.keep_alive_secs = 1;
        let (_controller, _task) = LiteTouchController::connect(&config);
        let mut socket = accept(&listener).await;

        assert_eq!(read_frame(&mut socket).await, "R,CPING\r");
    }

    #[tokio::test]
    async fn should_report_busy_when_queue_is_full() {
        let (listener, mut config) = bridge().await;
        config.command_buffer = 1;
        let (controller, _task) = LiteTouchController::connect(&config);
        let _socket = accept(&listener).await;
        wait_until_connected(&controller, true).await;

        // no await in between, so the task cannot drain the queue
        controller.set_load_on(1).unwrap();
        assert!(matches!(
            controller.set_load_off(1),
            Err(LiteTouchError::Busy)
        ));
    }

    #[tokio::test]
    async fn should_reject_commands_while_offline() {
        let (listener, mut config) = bridge().await;
        config.reconnect_delay_secs = 1;
        let (controller, _task) = LiteTouchController::connect(&config);

        let first = accept(&listener).await;
        wait_until_connected(&controller, true).await;
        drop(first);
        wait_until_connected(&controller, false).await;

        assert!(matches!(
            controller.set_load_on(5),
            Err(LiteTouchError::NotConnected)
        ));

        let mut second = accept(&listener).await;
        wait_until_connected(&controller, true).await;
        controller.set_load_off(5).unwrap();
        assert_eq!(read_frame(&mut second).await, "R,CSLOF,5\r");
    }

    #[tokio::test]
    async fn should_reject_commands_before_first_connection() {
        let (listener, mut config) = bridge().await;
        config.reconnect_delay_secs = 1;
        drop(listener);
        let (controller, _task) = LiteTouchController::connect(&config);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!controller.is_connected());
        assert!(matches!(
            controller.set_load_on(5),
            Err(LiteTouchError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn should_drop_oversized_lines_and_keep_reading() {
        let (listener, config) = bridge().await;
        let (controller, _task) = LiteTouchController::connect(&config);
        let address = Address::new("12_3").unwrap();
        let mut subscription = controller.subscribe(&address);
        let mut socket = accept(&listener).await;
        assert_eq!(read_frame(&mut socket).await, "R,CGLES,12_3\r");

        let mut noise = vec![b'x'; MAX_FRAME_LEN * 4];
        // tail of the oversized line, must not be parsed on its own
        noise.extend_from_slice(b"R,RLEDU,12_3,0\r");
        noise.extend_from_slice(b"R,RLEDU,12_3,1\r");
        socket.get_mut().write_all(&noise).await.unwrap();

        let frame = timeout(WAIT, subscription.recv()).await.unwrap().unwrap();
        assert_eq!(frame.values, vec!["12_3", "1"]);
        assert_eq!(controller.last_level(&address), Some(1));
        assert!(controller.is_connected());
    }

    #[test]
    fn should_hand_out_terminated_lines_within_the_limit() {
        let mut lines = LineBuffer::default();
        lines.bytes.extend_from_slice(b"R,RPONG");
        assert_eq!(lines.take_line(), None);
        assert_eq!(lines.room(), (MAX_FRAME_LEN - 7) as u64);

        lines.bytes.push(TERMINATOR);
        assert_eq!(lines.take_line().as_deref(), Some("R,RPONG\r"));
        assert_eq!(lines.room(), MAX_FRAME_LEN as u64);
    }

    #[test]
    fn should_skip_the_remainder_of_an_oversized_line() {
        let mut lines = LineBuffer::default();
        lines.bytes.resize(MAX_FRAME_LEN, b'x');
        assert_eq!(lines.take_line(), None);
        assert!(lines.bytes.is_empty());

        lines.bytes.extend_from_slice(b"xx\r");
        assert_eq!(lines.take_line(), None);

        lines.bytes.extend_from_slice(b"R,RLEDU,12_3,1\r");
        assert_eq!(lines.take_line().as_deref(), Some("R,RLEDU,12_3,1\r"));
    }

    #[tokio::test]
    async fn should_report_not_connected_after_task_stops() {
        let (_listener, config) = bridge().await;
        let (controller, task) = LiteTouchController::connect(&config);

        task.abort();
        let _ = task.await;

        assert!(matches!(
            controller.set_clock(),
            Err(LiteTouchError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn should_stop_when_all_handles_are_dropped() {
        let (listener, config) = bridge().await;
        let (controller, task) = LiteTouchController::connect(&config);
        let _socket = accept(&listener).await;

        drop(controller);

        timeout(WAIT, task).await.unwrap().unwrap();
    }
}
