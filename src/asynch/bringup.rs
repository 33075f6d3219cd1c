//! Modem bring-up
//!
//! A linear sequence of checks, each repairing what it can, run once at the
//! start of a session:
//!
//! 1. the modem answers `AT`
//! 2. verbose `+CME ERROR` reporting is enabled
//! 3. full functionality (`AT+CFUN`)
//! 4. a radio service is available (`AT+QCSQ`)
//! 5. the modem is registered on the EPS network (`AT+CEREG`)
//! 6. a PDP context is active, activating one if needed (`AT+QIACT`)
//! 7. SMS can be both sent and received (`AT+CSMS`)
//! 8. the GNSS engine is powered (`AT+QGPS`)
//! 9. the configured SMS message format is selected (`AT+CMGF`)
//!
//! The first failure is final: the session is marked `Failed` and must be
//! reset before it can be brought up again.

use core::marker::PhantomData;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};

use super::channel::{CommandChannel, Timing};
use super::state::{FunctionalityMode, OperationState, SmsMode, State};
use crate::command::gnss::responses::parse_gps_power;
use crate::command::gnss::{EnableGps, GetGpsPower};
use crate::command::mobile_control::responses::{parse_functionality, require_full_functionality};
use crate::command::mobile_control::types::{Functionality, TerminationErrorMode};
use crate::command::mobile_control::{
    GetModuleFunctionality, SetModuleFunctionality, SetReportMobileTerminationError,
};
use crate::command::network_service::responses::{parse_network_mode, parse_registration};
use crate::command::network_service::{GetEPSNetworkRegistrationStatus, GetNetworkMode};
use crate::command::psn::responses::parse_context_state;
use crate::command::psn::{ActivatePDPContext, GetPDPContextState};
use crate::command::sms::responses::require_sms_support;
use crate::command::sms::{GetMessageService, SetMessageFormat};
use crate::command::AT;
use crate::config::ModemConfig;
use crate::error::Error;

/// Stand-alone GNSS positioning
const GPS_STANDALONE: u8 = 1;

pub(crate) struct Bringup<'a, M: RawMutex, T, C> {
    channel: &'a CommandChannel<M, T>,
    state: &'a State<M>,
    _config: PhantomData<C>,
}

impl<'a, M, T, C> Bringup<'a, M, T, C>
where
    M: RawMutex,
    T: Read + Write,
    C: ModemConfig,
{
    pub(crate) fn new(channel: &'a CommandChannel<M, T>, state: &'a State<M>) -> Self {
        Self {
            channel,
            state,
            _config: PhantomData,
        }
    }

    pub(crate) async fn run(&self) -> Result<(), Error> {
        match self.state.operation_state() {
            OperationState::Uninitialized | OperationState::Ready => {}
            OperationState::Validating => {
                warn!("Bring-up already in progress");
                return Err(Error::NotReady);
            }
            OperationState::Failed => {
                error!("Bring-up failed before, reset the modem first");
                return Err(Error::NotReady);
            }
        }

        self.state.set_operation_state(OperationState::Validating);
        match self.validate().await {
            Ok(()) => {
                info!("Modem ready");
                self.state.set_operation_state(OperationState::Ready);
                Ok(())
            }
            Err(e) => {
                error!("Modem bring-up failed: {}", e);
                self.state.set_operation_state(OperationState::Failed);
                Err(e)
            }
        }
    }

    async fn validate(&self) -> Result<(), Error> {
        self.channel
            .send(&AT, Timing::command::<C>())
            .await
            .require_ok()?;
        info!("Modem is responding, testing states");

        self.enable_verbose_errors().await?;
        self.check_functionality().await?;
        self.check_service().await?;
        self.check_registration().await?;
        self.check_pdp_context().await?;
        self.check_sms_service().await?;
        self.check_gps().await?;
        select_sms_mode::<M, T, C>(self.channel, self.state, C::SMS_MODE).await
    }

    async fn enable_verbose_errors(&self) -> Result<(), Error> {
        info!("Enabling detailed error messages");
        self.channel
            .send(
                &SetReportMobileTerminationError {
                    n: TerminationErrorMode::Verbose,
                },
                Timing::command::<C>(),
            )
            .await
            .require_ok()
    }

    async fn check_functionality(&self) -> Result<(), Error> {
        info!("Testing ME functionality");
        let resp = self
            .channel
            .send(&GetModuleFunctionality, Timing::command::<C>())
            .await;

        if !resp.is_ok() {
            warn!("Unexpected functionality response, requesting full functionality");
            self.channel
                .send(
                    &SetModuleFunctionality {
                        fun: Functionality::Full,
                    },
                    Timing::command::<C>(),
                )
                .await
                .require_ok()
                .map_err(|_| Error::ModemNotFunctional)?;

            let resp = self
                .channel
                .send(&GetModuleFunctionality, Timing::command::<C>())
                .await;
            let fun = parse_functionality(&resp).map_err(|_| Error::ModemNotFunctional)?;
            self.record_functionality(fun);
            return require_full_functionality(&resp);
        }

        if let Ok(fun) = parse_functionality(&resp) {
            self.record_functionality(fun);
        }
        require_full_functionality(&resp)
    }

    fn record_functionality(&self, fun: u8) {
        self.state
            .update(|s| s.functionality = FunctionalityMode::from(fun));
    }

    async fn check_service(&self) -> Result<(), Error> {
        info!("Testing signal strength and service");
        let resp = self
            .channel
            .send(&GetNetworkMode, Timing::command::<C>())
            .await;
        let mode = parse_network_mode(&resp)?;
        info!("Mode: {} ({:?})", mode.mode.as_str(), mode.value);
        Ok(())
    }

    async fn check_registration(&self) -> Result<(), Error> {
        info!("Testing EPS registration");
        let resp = self
            .channel
            .send(&GetEPSNetworkRegistrationStatus, Timing::network::<C>())
            .await;
        let registration = parse_registration(&resp)?;
        self.state
            .update(|s| s.registration = Some(registration.status));
        info!("Registration status: {:?}", registration.status);
        registration.status.check()
    }

    /// Query the context state, activating the context when no record comes
    /// back. Gives up after `PDP_ACTIVATION_ATTEMPTS` queries.
    async fn check_pdp_context(&self) -> Result<(), Error> {
        for attempt in 1..=C::PDP_ACTIVATION_ATTEMPTS {
            info!("Querying PDP context, attempt {}", attempt);
            let resp = self
                .channel
                .send(&GetPDPContextState, Timing::network::<C>())
                .await;
            if !resp.is_ok() {
                error!("Failed to query PDP context");
                return Err(Error::PdpActivationFailed);
            }

            if let Some(context) = parse_context_state(&resp) {
                info!("IP address is {}", context.ip_address.as_str());
                self.state.update(|s| s.pdp_active = true);
                return Ok(());
            }

            if attempt < C::PDP_ACTIVATION_ATTEMPTS {
                info!("Attempting to activate PDP context {}", C::CONTEXT_ID);
                self.channel
                    .send(
                        &ActivatePDPContext { cid: C::CONTEXT_ID },
                        Timing::network::<C>(),
                    )
                    .await
                    .require_ok()
                    .map_err(|_| Error::PdpActivationFailed)?;
            }
        }

        error!("Failed to activate PDP context");
        Err(Error::PdpActivationFailed)
    }

    async fn check_sms_service(&self) -> Result<(), Error> {
        let resp = self
            .channel
            .send(&GetMessageService, Timing::command::<C>())
            .await;
        require_sms_support(&resp)
    }

    async fn check_gps(&self) -> Result<(), Error> {
        info!("Testing if GPS controller is powered up");
        let resp = self
            .channel
            .send(&GetGpsPower, Timing::command::<C>())
            .await;
        if !parse_gps_power(&resp) {
            info!("Attempting to power-up GPS controller");
            let resp = self
                .channel
                .send(
                    &EnableGps {
                        mode: GPS_STANDALONE,
                    },
                    Timing::command::<C>(),
                )
                .await;
            if resp.is_error() {
                error!("Failed to enable GPS");
                return Err(Error::GpsEnableFailed);
            }
        }
        info!("GPS is enabled");
        self.state.update(|s| s.gps_powered = true);
        Ok(())
    }
}

/// Switch the SMS message format with `AT+CMGF` and remember it.
pub(crate) async fn select_sms_mode<M, T, C>(
    channel: &CommandChannel<M, T>,
    state: &State<M>,
    mode: SmsMode,
) -> Result<(), Error>
where
    M: RawMutex,
    T: Read + Write,
    C: ModemConfig,
{
    info!("Setting SMS message format to {:?}", mode);
    channel
        .send(&SetMessageFormat { mode }, Timing::command::<C>())
        .await
        .require_ok()?;
    state.set_sms_mode(mode);
    Ok(())
}
