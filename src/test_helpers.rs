//! Scripted serial link for driving the modem session in tests.

use core::convert::Infallible;
use core::future::poll_fn;
use core::task::Poll;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::Duration;

use crate::config::{ModemConfig, NoPin};

/// Longest reply handed out by a single read, so responses arrive in pieces.
const MAX_READ: usize = 16;

#[derive(Default)]
struct Inner {
    script: VecDeque<(Vec<u8>, Vec<u8>)>,
    pending: Vec<u8>,
    written: Vec<u8>,
    rx: VecDeque<u8>,
}

/// A modem that expects an exact sequence of writes and answers each with a
/// canned reply. A write that does not match the script fails the test.
/// Reads with nothing to deliver never complete, like a silent modem.
#[derive(Clone, Default)]
pub struct MockSerial {
    inner: Rc<RefCell<Inner>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `command` to be written next and answer it with `reply`.
    pub fn expect(self, command: &str, reply: &str) -> Self {
        self.inner
            .borrow_mut()
            .script
            .push_back((command.as_bytes().to_vec(), reply.as_bytes().to_vec()));
        self
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    #[track_caller]
    pub fn assert_done(&self) {
        let inner = self.inner.borrow();
        let remaining: Vec<_> = inner
            .script
            .iter()
            .map(|(cmd, _)| String::from_utf8_lossy(cmd).into_owned())
            .collect();
        assert!(remaining.is_empty(), "unsent commands: {:?}", remaining);
        assert!(
            inner.pending.is_empty(),
            "unexpected trailing write: {:?}",
            String::from_utf8_lossy(&inner.pending)
        );
    }
}

impl embedded_io_async::ErrorType for MockSerial {
    type Error = Infallible;
}

impl embedded_io_async::Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        inner.written.extend_from_slice(buf);
        inner.pending.extend_from_slice(buf);

        let Some((expected, _)) = inner.script.front() else {
            panic!(
                "unexpected write: {:?}",
                String::from_utf8_lossy(&inner.pending)
            );
        };
        assert!(
            expected.starts_with(&inner.pending),
            "expected {:?}, got {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&inner.pending)
        );

        if *expected == inner.pending {
            if let Some((_, reply)) = inner.script.pop_front() {
                inner.rx.extend(reply);
            }
            inner.pending.clear();
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io_async::Read for MockSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        poll_fn(|_| {
            let mut inner = self.inner.borrow_mut();
            if inner.rx.is_empty() {
                return Poll::Pending;
            }
            let n = buf.len().min(inner.rx.len()).min(MAX_READ);
            for (dst, src) in buf.iter_mut().zip(inner.rx.drain(..n)) {
                *dst = src;
            }
            Poll::Ready(Ok(n))
        })
        .await
    }
}

/// Millisecond timings so sessions run quickly against the mock.
pub struct FastConfig;

impl ModemConfig for FastConfig {
    type ResetPin = NoPin;

    const SETTLE_TIME: Duration = Duration::from_millis(1);
    const NETWORK_SETTLE_TIME: Duration = Duration::from_millis(1);
    const RESPONSE_TIMEOUT: Duration = Duration::from_millis(50);
    const SMS_PROMPT_TIME: Duration = Duration::from_millis(1);
    const RESET_TIME: Duration = Duration::from_millis(1);

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
        None
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Script a successful bring-up of a registered, roaming modem.
pub fn bring_up_script(serial: MockSerial) -> MockSerial {
    serial
        .expect("AT\r", "AT\r\r\nOK\r\n")
        .expect("AT+CMEE=2\r", "AT+CMEE=2\r\r\nOK\r\n")
        .expect("AT+CFUN?\r", "AT+CFUN?\r\r\n+CFUN: 1\r\n\r\nOK\r\n")
        .expect(
            "AT+QCSQ\r",
            "AT+QCSQ\r\r\n+QCSQ: \"CAT-M1\",-73,-98,142,-10\r\n\r\nOK\r\n",
        )
        .expect("AT+CEREG?\r", "AT+CEREG?\r\r\n+CEREG: 0,5\r\n\r\nOK\r\n")
        .expect(
            "AT+QIACT?\r",
            "AT+QIACT?\r\r\n+QIACT: 1,1,1,\"10.170.72.113\"\r\n\r\nOK\r\n",
        )
        .expect("AT+CSMS?\r", "AT+CSMS?\r\r\n+CSMS: 0,1,1,1\r\n\r\nOK\r\n")
        .expect("AT+QGPS?\r", "AT+QGPS?\r\r\n+QGPS: 1\r\n\r\nOK\r\n")
        .expect("AT+CMGF=1\r", "AT+CMGF=1\r\r\nOK\r\n")
}
