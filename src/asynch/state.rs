use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

pub use crate::command::network_service::types::RegistrationStatus;
pub use crate::command::sms::types::SmsMode;

/// Where the session is in its bring-up.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationState {
    Uninitialized,
    Validating,
    /// Bring-up succeeded, all operations are allowed.
    Ready,
    /// Bring-up failed. Terminal until the session is reset.
    Failed,
}

/// Functionality level last reported by `AT+CFUN?`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FunctionalityMode {
    Unknown,
    Minimum,
    Full,
    Other(u8),
}

impl From<u8> for FunctionalityMode {
    fn from(fun: u8) -> Self {
        match fun {
            0 => Self::Minimum,
            1 => Self::Full,
            other => Self::Other(other),
        }
    }
}

/// Everything known about the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Shared {
    pub operation_state: OperationState,
    pub functionality: FunctionalityMode,
    pub registration: Option<RegistrationStatus>,
    pub pdp_active: bool,
    pub gps_powered: bool,
    /// Message format the modem was last switched to, `None` until set.
    pub sms_mode: Option<SmsMode>,
}

impl Shared {
    const fn new() -> Self {
        Self {
            operation_state: OperationState::Uninitialized,
            functionality: FunctionalityMode::Unknown,
            registration: None,
            pdp_active: false,
            gps_powered: false,
            sms_mode: None,
        }
    }
}

/// Modem state shared between the session handles of all tasks.
pub struct State<M: RawMutex> {
    shared: Mutex<M, RefCell<Shared>>,
}

impl<M: RawMutex> Default for State<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> State<M> {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared::new())),
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Shared {
        self.shared.lock(|s| *s.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut Shared)) {
        self.shared.lock(|s| f(&mut s.borrow_mut()))
    }

    pub fn operation_state(&self) -> OperationState {
        self.shared.lock(|s| s.borrow().operation_state)
    }

    pub fn set_operation_state(&self, state: OperationState) {
        self.update(|s| {
            if s.operation_state != state {
                debug!("Operation state {:?} -> {:?}", s.operation_state, state);
            }
            s.operation_state = state;
        });
    }

    pub fn sms_mode(&self) -> Option<SmsMode> {
        self.shared.lock(|s| s.borrow().sms_mode)
    }

    pub fn set_sms_mode(&self, mode: SmsMode) {
        self.update(|s| s.sms_mode = Some(mode));
    }

    /// Forget everything known about the modem.
    pub fn reset(&self) {
        self.update(|s| *s = Shared::new());
    }
}
