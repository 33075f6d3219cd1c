pub(crate) mod bringup;
pub mod channel;
pub mod control;
pub mod state;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};

use crate::config::ModemConfig;
use channel::CommandChannel;
use control::Control;

/// Everything a modem session needs, owned in one place so it can live in a
/// `static` or on the stack of the task that opened the link.
pub struct Resources<M: RawMutex, T> {
    channel: CommandChannel<M, T>,
    state: state::State<M>,
}

impl<M: RawMutex, T: Read + Write> Resources<M, T> {
    /// Take ownership of an open serial link to the modem.
    pub fn new(port: T) -> Self {
        Self {
            channel: CommandChannel::new(port),
            state: state::State::new(),
        }
    }

    /// A session handle. Call [`Control::init`] on it before anything else.
    pub fn control<C: ModemConfig>(&self, config: C) -> Control<'_, M, T, C> {
        Control::new(&self.channel, &self.state, config)
    }

    pub fn channel(&self) -> &CommandChannel<M, T> {
        &self.channel
    }

    /// Close the session and give the serial link back.
    pub fn into_inner(self) -> T {
        self.state.reset();
        self.channel.into_inner()
    }
}
