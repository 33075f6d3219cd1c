//! Responses for Network service Commands
use atat::atat_derive::AtatResp;
use heapless::{String, Vec};

use super::types::RegistrationStatus;
use crate::error::Error;
use crate::response::{parse_int_auto, parse_record, unquote, RawResponse};

/// At most this many cells are kept from a cell monitor listing.
pub const MAX_CELL_REPORTS: usize = 3;

/// Access technology reported by +QCSQ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkMode {
    /// `GSM`, `CAT-M1`, `CAT-NB1`, ...
    pub mode: String<16>,
    /// First measurement following the mode, RSSI for most technologies
    pub value: Option<i16>,
}

/// EPS network registration status +CEREG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registration {
    pub n: u8,
    pub status: RegistrationStatus,
}

/// Signal quality +CSQ
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    #[at_arg(position = 0)]
    pub rssi: u8,
    #[at_arg(position = 1)]
    pub ber: u8,
}

/// Serving network identity, from the first field of #RFSTS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServingCell {
    pub mcc: u16,
    pub mnc: u16,
}

/// One row of the #MONIZIP cell monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellReport {
    pub lac: u32,
    pub cell_id: u32,
    /// Received power in dBm, `0` when not reported
    pub signal: i32,
}

/// `+QCSQ: <sysmode>[,<value>...]`. Without a final `OK`, or with `NOSERVICE`
/// as the mode, the modem has no service.
pub fn parse_network_mode(resp: &RawResponse) -> Result<NetworkMode, Error> {
    if !resp.is_ok() {
        error!("Failed to query network mode: {}", resp.as_str());
        return Err(Error::NoService);
    }

    let record = resp.line_after("+QCSQ:").ok_or(Error::NoService)?;
    let mut parts = record.split(',');
    let mode = unquote(parts.next().unwrap_or_default());
    if mode.is_empty() || mode == "NOSERVICE" {
        error!("NOSERVICE mode reported");
        return Err(Error::NoService);
    }

    let value = parts.next().and_then(|v| v.trim().parse().ok());
    let mut network_mode = NetworkMode {
        mode: String::new(),
        value,
    };
    // Longer tokens are truncated, the mode is informational only
    for c in mode.chars() {
        if network_mode.mode.push(c).is_err() {
            break;
        }
    }
    Ok(network_mode)
}

/// `+CEREG: <n>,<stat>[,...]`
pub fn parse_registration(resp: &RawResponse) -> Result<Registration, Error> {
    resp.require_ok()?;

    let record = resp.line_after("+CEREG:").ok_or(Error::MalformedResponse)?;
    let mut parts = record.split(',').map(str::trim);
    let n = parts
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or(Error::MalformedResponse)?;
    let status = parts
        .next()
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or(Error::MalformedResponse)?;

    Ok(Registration {
        n,
        status: RegistrationStatus::from(status),
    })
}

pub fn parse_signal_quality(resp: &RawResponse) -> Option<SignalQuality> {
    parse_record(resp, "+CSQ:")
}

/// `#RFSTS: "<mcc> <mnc>",...`. Anything unexpected gives `(0, 0)`.
pub fn parse_serving_cell(resp: &RawResponse) -> ServingCell {
    let codes = resp
        .line_after("#RFSTS:")
        .and_then(|record| record.split(',').next())
        .map(unquote);

    let parsed = codes.and_then(|codes| {
        let (mcc, mnc) = codes.split_once(' ')?;
        Some(ServingCell {
            mcc: mcc.trim().parse().ok()?,
            mnc: mnc.trim().parse().ok()?,
        })
    });

    match parsed {
        Some(cell) => cell,
        None => {
            warn!("No serving cell information: {}", resp.as_str());
            ServingCell::default()
        }
    }
}

/// Parse `#MONIZIP: <cell>,<lac>,<id>,<arfcn>,<power>,...` rows.
///
/// The first line is the command echo. Rows without a cell tag and
/// placeholder rows (LAC `FFFF`) are skipped. Parsing stops at the first
/// blank line or final result code, or after [`MAX_CELL_REPORTS`] cells.
pub fn parse_cell_reports(resp: &RawResponse) -> Vec<CellReport, MAX_CELL_REPORTS> {
    let mut cells = Vec::new();

    for line in resp.lines().skip(1) {
        if line.is_empty() || line == "OK" || line == "ERROR" {
            break;
        }

        let row = line.split_once(": ").map_or(line, |(_, row)| row);
        let mut parts = row.split(',').map(str::trim);
        let cell = parts.next().unwrap_or_default();
        let lac = parts.next().unwrap_or_default();
        let cell_id = parts.next().unwrap_or_default();
        let signal = parts.nth(1).unwrap_or_default();

        if !lac.is_empty() && lac.chars().all(|c| c.eq_ignore_ascii_case(&'F')) {
            debug!("Cell report is null: {}", row);
            continue;
        }
        if cell.is_empty() {
            continue;
        }

        let (Ok(lac), Ok(cell_id)) = (
            u32::from_str_radix(lac, 16),
            u32::from_str_radix(cell_id, 16),
        ) else {
            warn!("Malformed cell report: {}", row);
            continue;
        };
        let signal = parse_int_auto(signal).unwrap_or_else(|| {
            warn!("Failed to parse signal: {}", signal);
            0
        });

        let report = CellReport {
            lac,
            cell_id,
            signal,
        };
        info!(
            "lac = {} (0x{:x}), cellid = {} (0x{:x}), signal = {}",
            lac, lac, cell_id, cell_id, signal
        );
        if cells.push(report).is_err() {
            break;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONIZIP: &str = "AT#MONIZIP\r\r\n\
        #MONIZIP: S,00FD,8AF3,686,-84,19,19,0,0\r\n\
        #MONIZIP: N1,00FD,8AF5,760,-94,9,9\r\n\
        #MONIZIP: N2,FFFF,0000,688,-111,-1,-1\r\n\
        #MONIZIP: N3,00FE,8B01,687,-101dbm,-1,-1\r\n\
        #MONIZIP: N4,00FE,8B02,685,-103,-1,-1\r\n\
        #MONIZIP: N5,00FE,8B03,758,-105,-1,-1\r\n\
        \r\nOK\r\n";

    #[test]
    fn network_mode() {
        let resp = RawResponse::from("AT+QCSQ\r\r\n+QCSQ: \"CAT-M1\",-73,-98,142,-10\r\n\r\nOK\r\n");
        let mode = parse_network_mode(&resp).unwrap();
        assert_eq!(mode.mode.as_str(), "CAT-M1");
        assert_eq!(mode.value, Some(-73));

        let resp = RawResponse::from("AT+QCSQ\r\r\n+QCSQ: \"NOSERVICE\"\r\n\r\nOK\r\n");
        assert_eq!(parse_network_mode(&resp), Err(Error::NoService));

        let resp = RawResponse::from("AT+QCSQ\r\r\n+QCSQ: NOSERVICE\r\n\r\nOK\r\n");
        assert_eq!(parse_network_mode(&resp), Err(Error::NoService));

        let resp = RawResponse::from("AT+QCSQ\r\r\nERROR\r\n");
        assert_eq!(parse_network_mode(&resp), Err(Error::NoService));
    }

    #[test]
    fn registration_mapping() {
        let check = |stat: u8| {
            let mut text: String<64> = String::new();
            core::fmt::Write::write_fmt(
                &mut text,
                format_args!("AT+CEREG?\r\r\n+CEREG: 0,{}\r\n\r\nOK\r\n", stat),
            )
            .unwrap();
            parse_registration(&RawResponse::from(text.as_str()))
                .unwrap()
                .status
                .check()
        };

        assert_eq!(check(1), Ok(()));
        assert_eq!(check(4), Ok(()));
        assert_eq!(check(5), Ok(()));
        assert_eq!(check(0), Err(Error::NotRegistered));
        assert_eq!(check(2), Err(Error::RegistrationPending));
        assert_eq!(check(3), Err(Error::RegistrationDenied));
        assert_eq!(check(9), Err(Error::NotRegistered));
    }

    #[test]
    fn registration_with_location() {
        let resp = RawResponse::from(
            "AT+CEREG?\r\r\n+CEREG: 2,5,\"00FD\",\"01A2D001\",7\r\n\r\nOK\r\n",
        );
        let reg = parse_registration(&resp).unwrap();
        assert_eq!(reg.n, 2);
        assert_eq!(reg.status, RegistrationStatus::Roaming);
    }

    #[test]
    fn registration_missing_marker() {
        let resp = RawResponse::from("AT+CEREG?\r\r\nOK\r\n");
        assert_eq!(parse_registration(&resp), Err(Error::MalformedResponse));
    }

    #[test]
    fn signal_quality() {
        let resp = RawResponse::from("AT+CSQ\r\r\n+CSQ: 21,99\r\n\r\nOK\r\n");
        assert_eq!(
            parse_signal_quality(&resp),
            Some(SignalQuality { rssi: 21, ber: 99 })
        );

        let resp = RawResponse::from("AT+CSQ\r\r\nERROR\r\n");
        assert_eq!(parse_signal_quality(&resp), None);
    }

    #[test]
    fn serving_cell() {
        let resp = RawResponse::from(
            "AT#RFSTS\r\r\n#RFSTS: \"310 260\",686,-82,00FD,01,3,19,10,2,8AF3,\"204043396525363\",\"T-Mobile\",3,4\r\n\r\nOK\r\n",
        );
        assert_eq!(
            parse_serving_cell(&resp),
            ServingCell { mcc: 310, mnc: 260 }
        );

        let resp = RawResponse::from("AT#RFSTS\r\r\nERROR\r\n");
        assert_eq!(parse_serving_cell(&resp), ServingCell::default());

        let resp = RawResponse::from("AT#RFSTS\r\r\n#RFSTS: \"310\",686\r\n\r\nOK\r\n");
        assert_eq!(parse_serving_cell(&resp), ServingCell::default());
    }

    #[test]
    fn cell_monitor() {
        let cells = parse_cell_reports(&RawResponse::from(MONIZIP));
        assert_eq!(cells.len(), 3);
        assert_eq!(
            cells[0],
            CellReport {
                lac: 0x00FD,
                cell_id: 0x8AF3,
                signal: -84
            }
        );
        assert_eq!(cells[1].cell_id, 0x8AF5);
        // Unparsable power falls back to zero, the FFFF row is skipped
        assert_eq!(
            cells[2],
            CellReport {
                lac: 0x00FE,
                cell_id: 0x8B01,
                signal: 0
            }
        );
    }

    #[test]
    fn cell_monitor_stops_at_blank() {
        let resp = RawResponse::from(
            "AT#MONIZIP\r\r\n#MONIZIP: S,00FD,8AF3,686,-84\r\n\r\n#MONIZIP: N1,00FD,8AF5,760,-94\r\nOK\r\n",
        );
        assert_eq!(parse_cell_reports(&resp).len(), 1);

        let resp = RawResponse::from("AT#MONIZIP\r\r\n#MONIZIP: ,00FD,8AF3,686,-84\r\n\r\nOK\r\n");
        assert!(parse_cell_reports(&resp).is_empty());
    }
}
