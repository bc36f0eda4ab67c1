use crate::error::RuleError;
use crate::orbital::parse_orbital_position;
use crate::rules::{CompiledRules, Entry, Field, RuleSet};
use crate::types::{
    DEFAULT_CATEGORY, DeliverySystem, Fec, FeedRecord, Modulation, Polarization,
};

/**
    Turns a listing page into feed records, driven entirely by a [`RuleSet`].

    Field misses degrade to defaults instead of dropping the entry: an entry is
    kept as long as a satellite label was found, even when frequency and symbol
    rate come out as 0. A page that matches nothing yields an empty list.
*/
#[derive(Debug)]
pub struct FeedParser {
    id: String,
    rules: CompiledRules,
}

impl FeedParser {
    pub fn new(rules: &RuleSet) -> Result<Self, RuleError> {
        Ok(Self {
            id: rules.source.id.clone(),
            rules: rules.compile()?,
        })
    }

    /// ID of the rule set driving this parser.
    pub fn rule_set_id(&self) -> &str {
        &self.id
    }

    pub fn parse(&self, body: &str) -> Vec<FeedRecord> {
        if body.trim().is_empty() {
            return Vec::new();
        }

        let entries = self.rules.entries(body);
        let total = entries.len();

        let records: Vec<FeedRecord> = entries
            .iter()
            .filter_map(|entry| self.parse_entry(entry))
            .collect();

        if records.len() < total {
            tracing::debug!(
                rules = %self.id,
                entries = total,
                records = records.len(),
                "[parser] Skipped entries without a satellite label"
            );
        }

        records
    }

    fn parse_entry(&self, entry: &Entry) -> Option<FeedRecord> {
        let field = |f: Field| self.rules.field(f, entry);

        let satellite_label = field(Field::Satellite)?;
        let orbital_position = parse_orbital_position(&satellite_label);

        Some(FeedRecord {
            orbital_position,
            frequency_mhz: field(Field::Frequency)
                .and_then(|v| parse_leading_u32(&v))
                .unwrap_or(0),
            polarization: field(Field::Polarization)
                .and_then(|v| Polarization::from_label(&v))
                .unwrap_or_default(),
            symbol_rate_ksym: field(Field::SymbolRate)
                .and_then(|v| parse_leading_u32(&v))
                .unwrap_or(0),
            forward_error_correction: field(Field::Fec)
                .and_then(|v| Fec::from_label(&v))
                .unwrap_or_default(),
            category: field(Field::Category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            event_title: field(Field::Title).unwrap_or_default(),
            is_encrypted: self.rules.is_encrypted(entry),
            system: field(Field::System).and_then(|v| DeliverySystem::from_label(&v)),
            modulation: field(Field::Modulation).and_then(|v| Modulation::from_label(&v)),
            satellite_label,
        })
    }
}

/// First run of ASCII digits in `s`, e.g. `"11585.5 MHz" -> 11585`.
fn parse_leading_u32(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
