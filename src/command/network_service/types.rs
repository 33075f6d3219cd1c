//! Argument and parameter types used by Network service Commands and Responses
use crate::error::Error;

/// EPS registration status `<stat>` of `+CEREG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    /// Not registered, the MT is not currently searching an operator to register to
    NotRegistered,
    /// Registered, home network
    Home,
    /// Not registered, but the MT is currently searching a new operator to register to
    Searching,
    Denied,
    /// Unknown (e.g. out of E-UTRAN coverage)
    Unknown,
    /// Registered, roaming
    Roaming,
    Unrecognized(u8),
}

impl From<u8> for RegistrationStatus {
    fn from(stat: u8) -> Self {
        match stat {
            0 => Self::NotRegistered,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            4 => Self::Unknown,
            5 => Self::Roaming,
            other => Self::Unrecognized(other),
        }
    }
}

impl RegistrationStatus {
    /// Whether the status lets the modem proceed. An unknown registration is
    /// accepted, the modem still reports a usable PDP context in that state.
    pub fn check(self) -> Result<(), Error> {
        match self {
            Self::Home | Self::Unknown | Self::Roaming => Ok(()),
            Self::Searching => Err(Error::RegistrationPending),
            Self::Denied => Err(Error::RegistrationDenied),
            Self::NotRegistered | Self::Unrecognized(_) => Err(Error::NotRegistered),
        }
    }

    pub fn is_registered(self) -> bool {
        self.check().is_ok()
    }
}

/// Cell monitor output selection of `#MONIZIP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, atat::atat_derive::AtatEnum)]
pub enum CellMonitorMode {
    ServingCell = 0,
    /// Serving cell and all neighbours
    AllCells = 7,
}
