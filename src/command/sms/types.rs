//! Argument and parameter types used by Short Messages Service Commands
use atat::atat_derive::AtatEnum;

/// Message format +CMGF
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmsMode {
    /// Messages are exchanged as hex encoded PDUs
    Pdu = 0,
    /// Messages are exchanged as text, with header fields in quotes
    Text = 1,
}
