use core::convert::Infallible;
use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::asynch::state::SmsMode;
use crate::module_timing;

/// Placeholder for configurations without a reset line.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub trait ModemConfig {
    type ResetPin: OutputPin;

    /// Pause after every command before reading its response.
    const SETTLE_TIME: Duration = module_timing::command_settle_time();
    /// Pause used for registration, PDP context and message storage queries.
    const NETWORK_SETTLE_TIME: Duration = module_timing::network_settle_time();
    const RESPONSE_TIMEOUT: Duration = module_timing::response_timeout();
    const SMS_PROMPT_TIME: Duration = module_timing::sms_prompt_time();
    /// Low time of the reset line.
    const RESET_TIME: Duration = module_timing::reset_time();

    const CONTEXT_ID: u8 = 1;
    /// Number of `AT+QIACT?` queries before giving up on the PDP context.
    const PDP_ACTIVATION_ATTEMPTS: u8 = 2;
    /// SMS message format selected at the end of bring-up.
    const SMS_MODE: SmsMode = SmsMode::Text;
    /// Storage slot read and deleted by `pop_message`.
    const MESSAGE_INDEX: u16 = 1;

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin>;
}

/// Stock wiring: no reset line, default timings.
#[derive(Default)]
pub struct DefaultConfig;

impl ModemConfig for DefaultConfig {
    type ResetPin = NoPin;

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
        None
    }
}

/// Drives the reset line of the modem, with the pin wired directly.
pub struct ResetPinConfig<P: OutputPin>(pub P);

impl<P: OutputPin> ModemConfig for ResetPinConfig<P> {
    type ResetPin = P;

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
        Some(&mut self.0)
    }
}
