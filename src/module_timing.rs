use embassy_time::Duration;

/// Pause between writing a command and the first read of its response
pub const fn command_settle_time() -> Duration {
    Duration::from_secs(1)
}

/// Pause for commands whose answer depends on the network (registration,
/// PDP contexts, message storage)
pub const fn network_settle_time() -> Duration {
    Duration::from_secs(5)
}

/// Upper bound on polling for a final result code, counted from the end of
/// the settle time
pub const fn response_timeout() -> Duration {
    Duration::from_secs(60)
}

/// Time for the modem to present its `> ` prompt after `AT+CMGS`
pub const fn sms_prompt_time() -> Duration {
    Duration::from_millis(500)
}

/// Low time of `RESET` pin to trigger module reset (reboot)
pub const fn reset_time() -> Duration {
    Duration::from_millis(100)
}

