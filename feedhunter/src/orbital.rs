use std::sync::OnceLock;

use regex::Regex;

/// Positions are tenths of a degree along the arc, East-based.
pub const FULL_CIRCLE: u16 = 3600;

fn position_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,3}(?:[.,]\d+)?)\s*°?\s*([EW])\b")
            .expect("orbital position regex should compile")
    })
}

/**
    Parse the first `<number>[°]<E|W>` occurrence in `text` into the receiver's
    orbital position encoding: tenths of a degree East, West mirrored as
    `3600 - tenths`. The result is always within `0..3600`.

    Returns 0 when nothing matches. Callers treat 0 as "unknown satellite",
    never as an error.
*/
pub fn parse_orbital_position(text: &str) -> u16 {
    let Some(captures) = position_regex().captures(text) else {
        return 0;
    };

    let number = captures[1].replace(',', ".");
    let Ok(degrees) = number.parse::<f64>() else {
        return 0;
    };

    let tenths = (degrees * 10.0).round() as i64;
    let position = if captures[2].eq_ignore_ascii_case("W") {
        i64::from(FULL_CIRCLE) - tenths
    } else {
        tenths
    };

    position.rem_euclid(i64::from(FULL_CIRCLE)) as u16
}

/**
    Render an orbital position back into its display form, e.g. `192 -> "19.2°E"`.
*/
pub fn format_orbital_position(position: u16) -> String {
    let position = position % FULL_CIRCLE;
    if position > FULL_CIRCLE / 2 {
        let west = FULL_CIRCLE - position;
        format!("{}.{}°W", west / 10, west % 10)
    } else {
        format!("{}.{}°E", position / 10, position % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_east_and_west() {
        assert_eq!(parse_orbital_position("10.0°E"), 100);
        assert_eq!(parse_orbital_position("10.0°W"), 3500);
        assert_eq!(parse_orbital_position("19.2°E"), 192);
        assert_eq!(parse_orbital_position("12.5°W"), 3475);
        assert_eq!(parse_orbital_position("7W"), 3530);
    }

    #[test]
    fn test_embedded_in_label() {
        assert_eq!(parse_orbital_position("Eutelsat 7B (7.0°E)"), 70);
        assert_eq!(parse_orbital_position("Hispasat 30W-5 30.0 ° w"), 3300);
        assert_eq!(parse_orbital_position("Astra 19,2°E"), 192);
    }

    #[test]
    fn test_wraps_into_range() {
        assert_eq!(parse_orbital_position("0.0°W"), 0);
        assert_eq!(parse_orbital_position("0°E"), 0);
        assert_eq!(parse_orbital_position("180.0°W"), 1800);
        assert_eq!(parse_orbital_position("359.9°E"), 3599);
        assert!(parse_orbital_position("999°E") < FULL_CIRCLE);
    }

    #[test]
    fn test_malformed_is_zero() {
        assert_eq!(parse_orbital_position(""), 0);
        assert_eq!(parse_orbital_position("Unknown"), 0);
        assert_eq!(parse_orbital_position("°E"), 0);
        assert_eq!(parse_orbital_position("Frequency: 11585"), 0);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_orbital_position(192), "19.2°E");
        assert_eq!(format_orbital_position(3475), "12.5°W");
        assert_eq!(format_orbital_position(0), "0.0°E");
    }
}
