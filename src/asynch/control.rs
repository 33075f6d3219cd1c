use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Instant, Timer};
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Read, Write};
use heapless::Vec;
use no_std_net::IpAddr;

use super::bringup::{select_sms_mode, Bringup};
use super::channel::{CommandChannel, Timing};
use super::state::{OperationState, Shared, SmsMode, State};
use crate::command::general::responses::{
    parse_imsi, parse_subscriber_number, Imsi, SubscriberNumber,
};
use crate::command::general::{GetIMSI, GetSubscriberNumber, SoftReset};
use crate::command::gnss::responses::{parse_gps_fix, GpsFix};
use crate::command::gnss::GetLocation;
use crate::command::network_service::responses::{
    parse_cell_reports, parse_serving_cell, parse_signal_quality, CellReport, ServingCell,
    SignalQuality, MAX_CELL_REPORTS,
};
use crate::command::network_service::types::CellMonitorMode;
use crate::command::network_service::{
    GetCellMonitor, GetServingCell, GetSignalQuality, SetCellMonitor,
};
use crate::command::psn::responses::parse_context_state;
use crate::command::psn::GetPDPContextState;
use crate::command::sms::responses::parse_message;
use crate::command::sms::{DeleteMessage, ReadMessage, SendMessage};
use crate::config::ModemConfig;
use crate::error::Error;
use crate::pdu::{self, DecodedSms};

/// Handle to a modem session.
///
/// Any number of tasks may hold a `Control` over the same channel and state;
/// their exchanges are serialized by the channel.
pub struct Control<'a, M: RawMutex, T, C> {
    channel: &'a CommandChannel<M, T>,
    state: &'a State<M>,
    config: C,
}

impl<'a, M, T, C> Control<'a, M, T, C>
where
    M: RawMutex,
    T: Read + Write,
    C: ModemConfig,
{
    pub fn new(channel: &'a CommandChannel<M, T>, state: &'a State<M>, config: C) -> Self {
        Self {
            channel,
            state,
            config,
        }
    }

    /// Validate the modem and repair what can be repaired. Must succeed
    /// before any other operation.
    pub async fn init(&self) -> Result<(), Error> {
        Bringup::<M, T, C>::new(self.channel, self.state).run().await
    }

    pub fn state(&self) -> Shared {
        self.state.snapshot()
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        match self.state.operation_state() {
            OperationState::Ready => Ok(()),
            state => {
                warn!("Modem is not ready: {:?}", state);
                Err(Error::NotReady)
            }
        }
    }

    pub async fn imsi(&self) -> Result<Option<Imsi>, Error> {
        self.ensure_ready()?;
        let resp = self.channel.send(&GetIMSI, Timing::command::<C>()).await;
        Ok(parse_imsi(&resp))
    }

    pub async fn phone_number(&self) -> Result<Option<SubscriberNumber>, Error> {
        self.ensure_ready()?;
        let resp = self
            .channel
            .send(&GetSubscriberNumber, Timing::command::<C>())
            .await;
        let number = parse_subscriber_number(&resp);
        if number.is_none() {
            error!("Failed to get subscriber number");
        }
        Ok(number)
    }

    /// Address of the first active PDP context.
    pub async fn ip_address(&self) -> Result<Option<IpAddr>, Error> {
        self.ensure_ready()?;
        let resp = self
            .channel
            .send(&GetPDPContextState, Timing::command::<C>())
            .await;
        let ip = parse_context_state(&resp).and_then(|context| context.ip());
        if ip.is_none() {
            error!("Failed to get context");
        }
        Ok(ip)
    }

    pub async fn signal_quality(&self) -> Result<Option<SignalQuality>, Error> {
        self.ensure_ready()?;
        let resp = self
            .channel
            .send(&GetSignalQuality, Timing::command::<C>())
            .await;
        Ok(parse_signal_quality(&resp))
    }

    /// Current position, `None` while the receiver has no fix.
    pub async fn gps_fix(&self) -> Result<Option<GpsFix>, Error> {
        self.ensure_ready()?;
        let resp = self.channel.send(&GetLocation, Timing::command::<C>()).await;
        Ok(parse_gps_fix(&resp, Instant::now()))
    }

    pub async fn serving_cell(&self) -> Result<ServingCell, Error> {
        self.ensure_ready()?;
        let resp = self
            .channel
            .send(&GetServingCell, Timing::command::<C>())
            .await;
        let cell = parse_serving_cell(&resp);
        info!("Serving cell: mcc = {}, mnc = {}", cell.mcc, cell.mnc);
        Ok(cell)
    }

    /// The serving cell and strongest neighbours, at most
    /// [`MAX_CELL_REPORTS`] of them.
    pub async fn cell_monitor(&self) -> Result<Vec<CellReport, MAX_CELL_REPORTS>, Error> {
        self.ensure_ready()?;

        let resp = self
            .channel
            .send(
                &SetCellMonitor {
                    mode: CellMonitorMode::AllCells,
                },
                Timing::command::<C>(),
            )
            .await;
        if !resp.is_ok() {
            warn!("Failed to select cell monitor mode");
            return Ok(Vec::new());
        }

        let resp = self
            .channel
            .send(&GetCellMonitor, Timing::network::<C>())
            .await;
        if !resp.is_ok() {
            warn!("Failed to read cell monitor");
            return Ok(Vec::new());
        }
        Ok(parse_cell_reports(&resp))
    }

    /// Read the message in the configured storage slot and delete it. Later
    /// messages move up, so repeated calls drain the storage.
    pub async fn pop_message(&self) -> Result<Option<DecodedSms>, Error> {
        self.ensure_ready()?;

        let index = C::MESSAGE_INDEX;
        let resp = self
            .channel
            .send(&ReadMessage { index }, Timing::network::<C>())
            .await;
        if !resp.contains("+CMGR:") {
            debug!("No messages to pop");
            return Ok(None);
        }

        let mode = self.state.sms_mode().unwrap_or(C::SMS_MODE);
        let message = parse_message(&resp, mode);
        if let Some(message) = &message {
            info!(
                "Popped message from {:?}: {}",
                message.sender.as_deref(),
                message.text.as_str()
            );
        }

        let resp = self
            .channel
            .send(&DeleteMessage { index }, Timing::command::<C>())
            .await;
        if !resp.is_ok() {
            warn!("Failed to delete message {}", index);
        }
        Ok(message)
    }

    /// Send `text` to `recipient` as an 8-bit PDU.
    ///
    /// The modem is switched to PDU mode for the submission if needed and put
    /// back into text mode afterwards, whether the submission succeeded or not.
    /// The result is the one of the submission alone.
    pub async fn send_message(&self, recipient: &str, text: &str) -> Result<(), Error> {
        self.ensure_ready()?;

        let pdu = pdu::encode(recipient, text)?;
        info!("octets = {}, pdu = {}", pdu.octets, pdu.hex.as_str());
        let length = u16::try_from(pdu.octets).map_err(|_| Error::MessageTooLong)?;

        let previous = self.state.sms_mode();
        if previous != Some(SmsMode::Pdu) {
            self.set_pdu_mode().await?;
        }

        let result = self
            .channel
            .submit(
                &SendMessage { length },
                pdu.hex.as_bytes(),
                C::SMS_PROMPT_TIME,
                Timing::network::<C>(),
            )
            .await
            .require_ok();
        if let Err(e) = result {
            error!("Failed to send SMS message: {}", e);
        }

        // State stays in PDU mode when switching back fails
        if previous == Some(SmsMode::Text) {
            if let Err(e) = self.set_text_mode().await {
                warn!("Failed to restore text mode: {}", e);
            }
        }
        result
    }

    pub async fn set_text_mode(&self) -> Result<(), Error> {
        select_sms_mode::<M, T, C>(self.channel, self.state, SmsMode::Text).await
    }

    pub async fn set_pdu_mode(&self) -> Result<(), Error> {
        select_sms_mode::<M, T, C>(self.channel, self.state, SmsMode::Pdu).await
    }

    /// Reboot the modem, through the reset line when one is wired and with
    /// `AT+CRES` otherwise. The session has to be initialized again after.
    pub async fn reset(&mut self) -> Result<(), Error> {
        if let Some(pin) = self.config.reset_pin() {
            info!("Resetting modem through reset pin");
            pin.set_low().map_err(|_| Error::IoPin)?;
            Timer::after(C::RESET_TIME).await;
            pin.set_high().map_err(|_| Error::IoPin)?;
        } else {
            info!("Resetting modem with AT+CRES");
            self.channel.reset(&SoftReset).await;
        }
        self.state.reset();
        Ok(())
    }

    /// End the session. The transport is handed back by
    /// [`CommandChannel::into_inner`].
    pub fn disconnect(&self) {
        info!("Disconnecting modem session");
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{bring_up_script, init_logger, FastConfig, MockSerial};
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Channel = CommandChannel<NoopRawMutex, MockSerial>;

    fn ready(state: &State<NoopRawMutex>) {
        state.set_operation_state(OperationState::Ready);
        state.set_sms_mode(SmsMode::Text);
    }

    #[test]
    fn operations_require_ready() {
        init_logger();
        let serial = MockSerial::new();
        let channel = Channel::new(serial.clone());
        let state = State::new();
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(block_on(control.gps_fix()), Err(Error::NotReady));
        assert_eq!(block_on(control.pop_message()), Err(Error::NotReady));
        assert_eq!(
            block_on(control.send_message("4155157916", "hi")),
            Err(Error::NotReady)
        );
        assert_eq!(block_on(control.imsi()), Err(Error::NotReady));
        assert!(serial.written().is_empty());
    }

    #[test]
    fn init_then_identity() {
        init_logger();
        let serial = bring_up_script(MockSerial::new())
            .expect("AT+CIMI\r", "AT+CIMI\r\r\n310260123456789\r\n\r\nOK\r\n")
            .expect(
                "AT+CNUM\r",
                "AT+CNUM\r\r\n+CNUM: \"\",\"+14083875060\",145\r\n\r\nOK\r\n",
            )
            .expect(
                "AT+QIACT?\r",
                "AT+QIACT?\r\r\n+QIACT: 1,1,1,\"10.170.72.113\"\r\n\r\nOK\r\n",
            )
            .expect("AT+CSQ\r", "AT+CSQ\r\r\n+CSQ: 21,99\r\n\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        let control = Control::new(&channel, &state, FastConfig);

        block_on(async {
            control.init().await.unwrap();
            assert_eq!(control.state().operation_state, OperationState::Ready);

            let imsi = control.imsi().await.unwrap();
            assert_eq!(imsi.as_deref(), Some("310260123456789"));
            let phone = control.phone_number().await.unwrap();
            assert_eq!(phone.as_deref(), Some("+14083875060"));
            let ip = control.ip_address().await.unwrap();
            assert_eq!(ip, "10.170.72.113".parse().ok());
            let rssi = control.signal_quality().await.unwrap();
            assert_eq!(rssi, Some(SignalQuality { rssi: 21, ber: 99 }));
        });
        serial.assert_done();
    }

    #[test]
    fn gps_and_cells() {
        init_logger();
        let serial = MockSerial::new()
            .expect(
                "AT+QGPSLOC?\r",
                "AT+QGPSLOC?\r\r\n+QGPSLOC: 042434.668,3745.8152N,12223.3605W,1.00,0.0,3,325.98,0.04,0.02,291117,07\r\n\r\nOK\r\n",
            )
            .expect(
                "AT#RFSTS\r",
                "AT#RFSTS\r\r\n#RFSTS: \"310 260\",686,-82,00FD,01,3,19,10,2,8AF3\r\n\r\nOK\r\n",
            )
            .expect("AT#MONIZIP=7\r", "AT#MONIZIP=7\r\r\nOK\r\n")
            .expect(
                "AT#MONIZIP\r",
                "AT#MONIZIP\r\r\n#MONIZIP: S,00FD,8AF3,686,-84\r\n#MONIZIP: N1,FFFF,0000,688,-111\r\n\r\nOK\r\n",
            )
            .expect("AT#MONIZIP=7\r", "AT#MONIZIP=7\r\r\nERROR\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        block_on(async {
            let fix = control.gps_fix().await.unwrap().unwrap();
            assert_eq!(fix.fix, 3);
            assert!(fix.longitude < 0.0);

            let cell = control.serving_cell().await.unwrap();
            assert_eq!(cell, ServingCell { mcc: 310, mnc: 260 });

            let cells = control.cell_monitor().await.unwrap();
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].cell_id, 0x8AF3);

            assert!(control.cell_monitor().await.unwrap().is_empty());
        });
        serial.assert_done();
    }

    #[test]
    fn pop_text_message() {
        init_logger();
        let serial = MockSerial::new()
            .expect(
                "AT+CMGR=1\r",
                "AT+CMGR=1\r\r\n+CMGR: \"REC UNREAD\",\"+14083875060\",\"\",\"18/12/13,16:10:27-32\"\r\nWhat time is it?\r\n\r\nOK\r\n",
            )
            .expect("AT+CMGD=1\r", "AT+CMGD=1\r\r\nOK\r\n")
            .expect("AT+CMGR=1\r", "AT+CMGR=1\r\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        block_on(async {
            let sms = control.pop_message().await.unwrap().unwrap();
            assert_eq!(sms.sender.as_deref(), Some("+14083875060"));
            assert_eq!(sms.text.as_str(), "What time is it?");

            assert_eq!(control.pop_message().await, Ok(None));
        });
        serial.assert_done();
    }

    #[test]
    fn pop_pdu_message() {
        init_logger();
        let serial = MockSerial::new()
            .expect(
                "AT+CMGR=1\r",
                "AT+CMGR=1\r\r\n+CMGR: 1,\"\",33\r\n07914180835760F0040B914180835760F000008121316101722B0FC8329BFD065DDF723619D4026501\r\n\r\nOK\r\n",
            )
            .expect("AT+CMGD=1\r", "AT+CMGD=1\r\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        state.set_sms_mode(SmsMode::Pdu);
        let control = Control::new(&channel, &state, FastConfig);

        let sms = block_on(control.pop_message()).unwrap().unwrap();
        assert_eq!(sms.text.as_str(), "Hello World - Y");
        assert_eq!(sms.sender.as_deref(), Some("+14083875060"));
        serial.assert_done();
    }

    #[test]
    fn send_message_from_text_mode() {
        init_logger();
        let serial = MockSerial::new()
            .expect("AT+CMGF=0\r", "AT+CMGF=0\r\r\nOK\r\n")
            .expect("AT+CMGS=15\r", "AT+CMGS=15\r\r\n> ")
            .expect("0011000A9114555197610004C2024869\r", "")
            .expect("\x1A", "\r\n+CMGS: 7\r\n\r\nOK\r\n")
            .expect("AT+CMGF=1\r", "AT+CMGF=1\r\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(block_on(control.send_message("4155157916", "Hi")), Ok(()));
        assert_eq!(state.sms_mode(), Some(SmsMode::Text));
        serial.assert_done();
    }

    #[test]
    fn send_message_failure_restores_text_mode() {
        init_logger();
        let serial = MockSerial::new()
            .expect("AT+CMGF=0\r", "AT+CMGF=0\r\r\nOK\r\n")
            .expect("AT+CMGS=15\r", "AT+CMGS=15\r\r\n> ")
            .expect("0011000A9114555197610004C2024869\r", "")
            .expect("\x1A", "\r\n+CMS ERROR: 500\r\n")
            .expect("AT+CMGF=1\r", "AT+CMGF=1\r\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(
            block_on(control.send_message("+4155157916", "Hi")),
            Err(Error::CommandRejected)
        );
        assert_eq!(state.sms_mode(), Some(SmsMode::Text));
        serial.assert_done();
    }

    #[test]
    fn send_message_delivered_despite_restore_failure() {
        init_logger();
        let serial = MockSerial::new()
            .expect("AT+CMGF=0\r", "AT+CMGF=0\r\r\nOK\r\n")
            .expect("AT+CMGS=15\r", "AT+CMGS=15\r\r\n> ")
            .expect("0011000A9114555197610004C2024869\r", "")
            .expect("\x1A", "\r\n+CMGS: 8\r\n\r\nOK\r\n")
            .expect("AT+CMGF=1\r", "AT+CMGF=1\r\r\n+CMS ERROR: 500\r\n")
            .expect("AT+CMGR=1\r", "AT+CMGR=1\r\r\nOK\r\n");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(block_on(control.send_message("4155157916", "Hi")), Ok(()));
        assert_eq!(state.sms_mode(), Some(SmsMode::Pdu));
        assert_eq!(block_on(control.pop_message()), Ok(None));
        serial.assert_done();
    }

    #[test]
    fn send_message_failure_wins_over_restore_failure() {
        init_logger();
        let serial = MockSerial::new()
            .expect("AT+CMGF=0\r", "AT+CMGF=0\r\r\nOK\r\n")
            .expect("AT+CMGS=15\r", "AT+CMGS=15\r\r\n> ")
            .expect("0011000A9114555197610004C2024869\r", "")
            .expect("\x1A", "\r\n+CMS ERROR: 500\r\n")
            .expect("AT+CMGF=1\r", "");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(
            block_on(control.send_message("4155157916", "Hi")),
            Err(Error::CommandRejected)
        );
        assert_eq!(state.sms_mode(), Some(SmsMode::Pdu));
        serial.assert_done();
    }

    #[test]
    fn send_message_rejects_before_io() {
        init_logger();
        let serial = MockSerial::new();
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let control = Control::new(&channel, &state, FastConfig);

        assert_eq!(
            block_on(control.send_message("not a number", "Hi")),
            Err(Error::InvalidRecipient)
        );
        assert!(serial.written().is_empty());
    }

    #[test]
    fn soft_reset_forgets_state() {
        init_logger();
        let serial = MockSerial::new()
            .expect("\x1A", "")
            .expect("AT+CRES\r", "");
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let mut control = Control::new(&channel, &state, FastConfig);

        block_on(control.reset()).unwrap();
        assert_eq!(state.operation_state(), OperationState::Uninitialized);
        assert_eq!(state.sms_mode(), None);
        serial.assert_done();
    }

    #[derive(Clone, Default)]
    struct RecordingPin(Rc<RefCell<std::vec::Vec<bool>>>);

    impl ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(true);
            Ok(())
        }
    }

    struct PinConfig(RecordingPin);

    impl ModemConfig for PinConfig {
        type ResetPin = RecordingPin;

        const RESET_TIME: embassy_time::Duration = embassy_time::Duration::from_millis(1);

        fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
            Some(&mut self.0)
        }
    }

    #[test]
    fn pin_reset_pulses_low() {
        init_logger();
        let serial = MockSerial::new();
        let channel = Channel::new(serial.clone());
        let state = State::new();
        ready(&state);
        let pin = RecordingPin::default();
        let mut control = Control::new(&channel, &state, PinConfig(pin.clone()));

        block_on(control.reset()).unwrap();
        assert_eq!(*pin.0.borrow(), [false, true]);
        assert!(serial.written().is_empty());

        control.disconnect();
        assert_eq!(state.operation_state(), OperationState::Uninitialized);
    }
}
