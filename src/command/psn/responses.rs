//! Responses for Packet Switched Data Services Commands
use atat::atat_derive::AtatResp;
use heapless::String;
use no_std_net::IpAddr;

use crate::response::{parse_record, RawResponse};

/// PDP context state +QIACT
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct PDPContextState {
    #[at_arg(position = 0)]
    pub cid: u8,
    /// 1 when activated
    #[at_arg(position = 1)]
    pub state: u8,
    /// 1 for IPv4, 2 for IPv6
    #[at_arg(position = 2)]
    pub context_type: u8,
    #[at_arg(position = 3)]
    pub ip_address: String<40>,
}

impl PDPContextState {
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip_address.parse().ok()
    }
}

/// The first context record, if any context is active.
pub fn parse_context_state(resp: &RawResponse) -> Option<PDPContextState> {
    parse_record(resp, "+QIACT:")
}
