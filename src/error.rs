use crate::hex::DecodeHexError;

/// Failure kinds raised while validating or driving the modem.
///
/// Every variant maps to a specific AT response condition. Runtime read
/// operations (GPS, cell monitor, SMS pop) report absence as an empty result
/// instead of one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    // Bring-up failures
    ModemNotFunctional,
    NoService,
    NotRegistered,
    RegistrationPending,
    RegistrationDenied,
    PdpActivationFailed,
    SmsUnsupported,
    GpsEnableFailed,

    // Channel and framing failures
    /// The channel returned without `OK` or `ERROR` before its deadline.
    ChannelTimeout,
    /// The modem answered `ERROR` (or `+CME ERROR`/`+CMS ERROR`) where `OK`
    /// was required.
    CommandRejected,
    /// An expected marker was absent, or a required field did not parse.
    MalformedResponse,

    // Session errors
    /// The session is not in the `Ready` state.
    NotReady,
    IoPin,

    // SMS codec errors
    InvalidRecipient,
    InvalidMessage,
    MessageTooLong,
}

impl From<DecodeHexError> for Error {
    fn from(_: DecodeHexError) -> Self {
        Self::MalformedResponse
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::ModemNotFunctional => "modem is not fully functional",
            Self::NoService => "modem has no service",
            Self::NotRegistered => "modem is not registered",
            Self::RegistrationPending => "modem is not registered, searching",
            Self::RegistrationDenied => "modem registration denied",
            Self::PdpActivationFailed => "failed to activate PDP context",
            Self::SmsUnsupported => "SMS service does not support MO and MT messaging",
            Self::GpsEnableFailed => "failed to enable GPS",
            Self::ChannelTimeout => "timed out waiting for a final result code",
            Self::CommandRejected => "command rejected by modem",
            Self::MalformedResponse => "malformed response",
            Self::NotReady => "modem session is not ready",
            Self::IoPin => "reset pin failure",
            Self::InvalidRecipient => "recipient must be a numeric phone number",
            Self::InvalidMessage => "message contains characters outside of 8-bit range",
            Self::MessageTooLong => "message exceeds 140 octets",
        };
        f.write_str(s)
    }
}
