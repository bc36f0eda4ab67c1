use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::orbital::parse_orbital_position;

/**
    Signal polarization of a linear-polarized satellite transponder.
*/
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Polarization {
    #[default]
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

impl Polarization {
    /**
        Lenient parse of a scraped label: `H`, `V`, `Horizontal`, `vertical`, ...
    */
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().chars().next()?.to_ascii_uppercase() {
            'H' => Some(Self::Horizontal),
            'V' => Some(Self::Vertical),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Horizontal => "H",
            Self::Vertical => "V",
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Polarization {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseError {
            kind: "polarization",
            value: s.to_owned(),
        })
    }
}

/**
    Forward error correction code rate.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fec {
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "2/3")]
    TwoThirds,
    #[serde(rename = "3/4")]
    ThreeQuarters,
    #[serde(rename = "5/6")]
    FiveSixths,
    #[serde(rename = "7/8")]
    SevenEighths,
    #[default]
    Auto,
}

impl Fec {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().replace([' ', '_'], "/");
        match label.to_ascii_lowercase().as_str() {
            "1/2" => Some(Self::Half),
            "2/3" => Some(Self::TwoThirds),
            "3/4" => Some(Self::ThreeQuarters),
            "5/6" => Some(Self::FiveSixths),
            "7/8" => Some(Self::SevenEighths),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    /// Receiver scan API code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Half => 2,
            Self::TwoThirds => 3,
            Self::ThreeQuarters => 4,
            Self::FiveSixths => 5,
            Self::SevenEighths => 6,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Half => "1/2",
            Self::TwoThirds => "2/3",
            Self::ThreeQuarters => "3/4",
            Self::FiveSixths => "5/6",
            Self::SevenEighths => "7/8",
            Self::Auto => "Auto",
        }
    }
}

impl fmt::Display for Fec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Fec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseError {
            kind: "FEC",
            value: s.to_owned(),
        })
    }
}

/**
    Satellite delivery system.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliverySystem {
    #[serde(rename = "DVB-S")]
    DvbS,
    #[serde(rename = "DVB-S2")]
    DvbS2,
}

impl DeliverySystem {
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "DVBS" | "S" => Some(Self::DvbS),
            "DVBS2" | "S2" => Some(Self::DvbS2),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::DvbS => 0,
            Self::DvbS2 => 1,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::DvbS => "DVB-S",
            Self::DvbS2 => "DVB-S2",
        }
    }
}

impl fmt::Display for DeliverySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for DeliverySystem {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseError {
            kind: "delivery system",
            value: s.to_owned(),
        })
    }
}

/**
    Carrier modulation.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modulation {
    #[serde(rename = "QPSK")]
    Qpsk,
    #[serde(rename = "8PSK")]
    Psk8,
    #[serde(rename = "16APSK")]
    Apsk16,
    #[serde(rename = "32APSK")]
    Apsk32,
}

impl Modulation {
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "QPSK" => Some(Self::Qpsk),
            "8PSK" => Some(Self::Psk8),
            "16APSK" => Some(Self::Apsk16),
            "32APSK" => Some(Self::Apsk32),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Qpsk => 1,
            Self::Psk8 => 2,
            Self::Apsk16 => 4,
            Self::Apsk32 => 5,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Qpsk => "QPSK",
            Self::Psk8 => "8PSK",
            Self::Apsk16 => "16APSK",
            Self::Apsk32 => "32APSK",
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Modulation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseError {
            kind: "modulation",
            value: s.to_owned(),
        })
    }
}

/**
    One live satellite feed, as scraped from a listing page.

    Records are built once per fetch and handed out by value or behind an
    `Arc`; a refresh replaces the whole list rather than editing entries.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub satellite_label: String,
    /// Tenths of a degree East, `0..=3599`.
    pub orbital_position: u16,
    pub frequency_mhz: u32,
    pub polarization: Polarization,
    pub symbol_rate_ksym: u32,
    pub forward_error_correction: Fec,
    pub category: String,
    pub event_title: String,
    pub is_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<DeliverySystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulation: Option<Modulation>,
}

pub const DEFAULT_CATEGORY: &str = "N/A";

impl FeedRecord {
    /**
        A record with every field at its default, positioned by `satellite_label`.
    */
    pub fn new(satellite_label: impl Into<String>) -> Self {
        let satellite_label = satellite_label.into();
        let orbital_position = parse_orbital_position(&satellite_label);
        Self {
            satellite_label,
            orbital_position,
            frequency_mhz: 0,
            polarization: Polarization::default(),
            symbol_rate_ksym: 0,
            forward_error_correction: Fec::default(),
            category: DEFAULT_CATEGORY.to_string(),
            event_title: String::new(),
            is_encrypted: false,
            system: None,
            modulation: None,
        }
    }

    pub fn encryption_label(&self) -> &'static str {
        if self.is_encrypted { "BISS/Crypt" } else { "FTA" }
    }

    pub fn key(&self) -> FeedKey {
        FeedKey {
            frequency_mhz: self.frequency_mhz,
            polarization: self.polarization,
            symbol_rate_ksym: self.symbol_rate_ksym,
        }
    }
}

/**
    Synthetic identity of a feed's tuning triple, used to suppress duplicates
    when persisting feeds. Orbital position is not part of the key, matching the
    service reference: two feeds with the same triple on different satellites
    count as duplicates.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedKey {
    pub frequency_mhz: u32,
    pub polarization: Polarization,
    pub symbol_rate_ksym: u32,
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.frequency_mhz, self.polarization, self.symbol_rate_ksym
        )
    }
}
