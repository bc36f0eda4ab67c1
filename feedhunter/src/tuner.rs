use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DeliverySystem, FeedRecord, Modulation};

/// Inversion, pilot: let the demodulator decide.
pub const INVERSION_AUTO: u8 = 2;
pub const PILOT_AUTO: u8 = 2;
/// Roll-off factor 0.35, the DVB-S default.
pub const ROLLOFF_035: u8 = 0;

/// Ad-hoc feeds are mostly DVB-S2 / 8PSK, so that is the guess for unknown values.
pub const DEFAULT_SYSTEM: DeliverySystem = DeliverySystem::DvbS2;
pub const DEFAULT_MODULATION: Modulation = Modulation::Psk8;

/**
    Transponder descriptor in the receiver's scan API encoding.

    Frequency is in kHz and symbol rate in symbols per second, as the scan API
    expects them.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransponderParams {
    pub frequency: u32,
    pub symbol_rate: u32,
    pub polarization: u8,
    pub fec: u8,
    pub inversion: u8,
    pub orbital_position: u16,
    pub system: u8,
    pub modulation: u8,
    pub rolloff: u8,
    pub pilot: u8,
}

impl TransponderParams {
    /// Pure mapping from a record; every input field is already default-filled.
    pub fn from_record(record: &FeedRecord) -> Self {
        Self {
            frequency: record.frequency_mhz.saturating_mul(1000),
            symbol_rate: record.symbol_rate_ksym.saturating_mul(1000),
            polarization: record.polarization.code(),
            fec: record.forward_error_correction.code(),
            inversion: INVERSION_AUTO,
            orbital_position: record.orbital_position,
            system: record.system.unwrap_or(DEFAULT_SYSTEM).code(),
            modulation: record.modulation.unwrap_or(DEFAULT_MODULATION).code(),
            rolloff: ROLLOFF_035,
            pilot: PILOT_AUTO,
        }
    }
}

impl From<&FeedRecord> for TransponderParams {
    fn from(record: &FeedRecord) -> Self {
        Self::from_record(record)
    }
}

/**
    Service reference handed to the receiver's play API.

    Encodes the tuning triple and FEC of a feed as
    `1:0:1:<freq MHz>:<pol>:<SR ksym>:<fec>:0:0:0:`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceReference {
    pub frequency_mhz: u32,
    pub polarization: u8,
    pub symbol_rate_ksym: u32,
    pub fec: u8,
}

impl ServiceReference {
    pub fn from_record(record: &FeedRecord) -> Self {
        Self {
            frequency_mhz: record.frequency_mhz,
            polarization: record.polarization.code(),
            symbol_rate_ksym: record.symbol_rate_ksym,
            fec: record.forward_error_correction.code(),
        }
    }

    /**
        Parse a reference written by [`fmt::Display`]. Only the fields this
        module writes are read back; anything else yields `None`.
    */
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 10 || parts[..3] != ["1", "0", "1"] {
            return None;
        }
        Some(Self {
            frequency_mhz: parts[3].parse().ok()?,
            polarization: parts[4].parse().ok()?,
            symbol_rate_ksym: parts[5].parse().ok()?,
            fec: parts[6].parse().ok()?,
        })
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1:0:1:{}:{}:{}:{}:0:0:0:",
            self.frequency_mhz, self.polarization, self.symbol_rate_ksym, self.fec
        )
    }
}
