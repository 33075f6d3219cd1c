use atat::AtatCmd;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_io_async::{Error as _, Read, Write};

use crate::config::ModemConfig;
use crate::response::RawResponse;

/// Size of the buffer commands are serialized into.
pub const CMD_BUF_SIZE: usize = 128;

const CTRL_Z: u8 = 0x1A;
const READ_CHUNK: usize = 64;

/// How long an exchange waits before and while reading the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Pause between writing the command and the first read.
    pub settle: Duration,
    /// Time allowed for a final result code to arrive once reading started.
    pub deadline: Duration,
}

impl Timing {
    pub const fn new(settle: Duration, deadline: Duration) -> Self {
        Self { settle, deadline }
    }

    pub const fn command<C: ModemConfig>() -> Self {
        Self::new(C::SETTLE_TIME, C::RESPONSE_TIMEOUT)
    }

    /// For queries answered by the network rather than the modem itself.
    pub const fn network<C: ModemConfig>() -> Self {
        Self::new(C::NETWORK_SETTLE_TIME, C::RESPONSE_TIMEOUT)
    }
}

/// The serial link to the modem, shared by every task talking to it.
///
/// Each operation holds the link for its whole duration, so exchanges never
/// interleave. Operations never fail: transport errors and timeouts end the
/// exchange and whatever was read so far is returned for the parsers to judge.
pub struct CommandChannel<M: RawMutex, T> {
    port: Mutex<M, T>,
}

impl<M: RawMutex, T: Read + Write> CommandChannel<M, T> {
    pub fn new(port: T) -> Self {
        Self {
            port: Mutex::new(port),
        }
    }

    /// Close the channel, handing back the transport.
    pub fn into_inner(self) -> T {
        self.port.into_inner()
    }

    /// Write `command` and read until `OK`/`ERROR` or the deadline.
    pub async fn exchange(&self, command: &[u8], timing: Timing) -> RawResponse {
        let mut port = self.port.lock().await;

        discard_stale(&mut *port).await;
        let response = if transmit(&mut *port, command).await {
            Timer::after(timing.settle).await;
            receive(&mut *port, timing.deadline).await
        } else {
            RawResponse::new()
        };

        info!("{} => {:?}", printable(command), response.as_str());
        response
    }

    /// Serialize `cmd` and [`exchange`](Self::exchange) it.
    pub async fn send<Cmd: AtatCmd>(&self, cmd: &Cmd, timing: Timing) -> RawResponse {
        let mut buf = [0u8; CMD_BUF_SIZE];
        let len = cmd.write(&mut buf);
        self.exchange(&buf[..len], timing).await
    }

    /// Send a command that prompts for a payload, such as `AT+CMGS`.
    ///
    /// The payload follows `prompt` after the command and is terminated by
    /// `\r` and then, after another `prompt`, by Ctrl-Z. The final result
    /// code is then read as for any other command. The link is held from the
    /// command to the result code.
    pub async fn submit<Cmd: AtatCmd>(
        &self,
        cmd: &Cmd,
        payload: &[u8],
        prompt: Duration,
        timing: Timing,
    ) -> RawResponse {
        let mut buf = [0u8; CMD_BUF_SIZE];
        let len = cmd.write(&mut buf);

        let mut port = self.port.lock().await;

        discard_stale(&mut *port).await;
        let response = if submit_payload(&mut *port, &buf[..len], payload, prompt).await {
            Timer::after(timing.settle).await;
            receive(&mut *port, timing.deadline).await
        } else {
            RawResponse::new()
        };

        info!(
            "{} <{} bytes> => {:?}",
            printable(&buf[..len]),
            payload.len(),
            response.as_str()
        );
        response
    }

    /// Abort any pending prompt with Ctrl-Z and write `cmd` without waiting
    /// for an answer. Used for commands that reboot the modem.
    pub async fn reset<Cmd: AtatCmd>(&self, cmd: &Cmd) {
        let mut buf = [0u8; CMD_BUF_SIZE];
        let len = cmd.write(&mut buf);

        let mut port = self.port.lock().await;
        if transmit(&mut *port, &[CTRL_Z]).await {
            transmit(&mut *port, &buf[..len]).await;
        }
        info!("{} => <no response>", printable(&buf[..len]));
    }
}

/// Drop whatever the modem sent after the end of the previous exchange, such
/// as the `\r\n` following a final `OK`.
async fn discard_stale<T: Read>(port: &mut T) {
    let mut chunk = [0u8; READ_CHUNK];
    let mut discarded = 0;
    while let Ok(Ok(n)) = with_timeout(Duration::from_ticks(0), port.read(&mut chunk)).await {
        if n == 0 {
            break;
        }
        discarded += n;
    }
    if discarded > 0 {
        debug!("Discarded {} stale bytes", discarded);
    }
}

async fn submit_payload<T: Write>(
    port: &mut T,
    command: &[u8],
    payload: &[u8],
    prompt: Duration,
) -> bool {
    if !transmit(port, command).await {
        return false;
    }
    Timer::after(prompt).await;
    if !transmit(port, payload).await || !transmit(port, b"\r").await {
        return false;
    }
    Timer::after(prompt).await;
    transmit(port, &[CTRL_Z]).await
}

async fn transmit<T: Write>(port: &mut T, bytes: &[u8]) -> bool {
    if let Err(e) = port.write_all(bytes).await {
        error!("Failed to write to modem: {:?}", e.kind());
        return false;
    }
    if let Err(e) = port.flush().await {
        error!("Failed to flush modem: {:?}", e.kind());
        return false;
    }
    true
}

async fn receive<T: Read>(port: &mut T, deadline: Duration) -> RawResponse {
    let mut response = RawResponse::new();
    let start = Instant::now();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let Some(remaining) = deadline.checked_sub(start.elapsed()) else {
            warn!("Timed out - no response from modem");
            break;
        };

        match with_timeout(remaining, port.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                warn!("Modem link closed");
                break;
            }
            Ok(Ok(n)) => {
                let has_room = response.extend(&chunk[..n]);
                if response.is_terminated() {
                    break;
                }
                if !has_room {
                    warn!("Response buffer full");
                    break;
                }
            }
            Ok(Err(e)) => {
                error!("Failed to read from modem: {:?}", e.kind());
                break;
            }
            Err(_) => {
                warn!("Timed out - no response from modem");
                break;
            }
        }
    }

    response
}

fn printable(command: &[u8]) -> &str {
    core::str::from_utf8(command)
        .map(|s| s.trim_end_matches(['\r', '\n']))
        .unwrap_or("<binary>")
}
