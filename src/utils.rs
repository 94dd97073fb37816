use std::f64::consts::LN_10;

// -------------------------------------------------------------------------------------------------

const MINUS_INF_IN_DB: f64 = -200.0;

const LIN_TO_DB_FACTOR: f64 = 20.0 / LN_10;
const DB_TO_LIN_FACTOR: f64 = LN_10 / 20.0;

// -------------------------------------------------------------------------------------------------

/// Convert a linear gain to decibels.
pub fn linear_to_db(value: f64) -> f64 {
    if value == 1.0 {
        return 0.0; // avoid rounding errors at exactly 0 dB
    } else if value > 1e-12 {
        return value.ln() * LIN_TO_DB_FACTOR;
    }
    MINUS_INF_IN_DB
}

/// Convert decibels to a linear gain.
pub fn db_to_linear(value: f64) -> f64 {
    if value == 0.0 {
        return 1.0; // avoid rounding errors at exactly 0 dB
    } else if value > MINUS_INF_IN_DB {
        return (value * DB_TO_LIN_FACTOR).exp();
    }
    0.0
}

// -------------------------------------------------------------------------------------------------

/// Make a persistence key from a parameter name: keeps ASCII alphanumerics, `_`, `-` and `.`,
/// and replaces everything else with `_`.
pub fn sanitize_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_db_conversion() {
        assert_eq!(linear_to_db(1.0), 0.0);
        assert_eq!(linear_to_db(0.0), MINUS_INF_IN_DB);
        assert_eq!(db_to_linear(MINUS_INF_IN_DB), 0.0);
        assert_eq!(db_to_linear(0.0), 1.0);
        assert!((linear_to_db(db_to_linear(20.0)) - 20.0).abs() < 1e-9);
        assert!((linear_to_db(db_to_linear(-20.0)) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn key_sanitizing() {
        assert_eq!(sanitize_key("volume"), "volume");
        assert_eq!(sanitize_key(" Main Volume "), "Main_Volume");
        assert_eq!(sanitize_key("eq/low-gain.1"), "eq_low-gain.1");
        assert_eq!(sanitize_key("Läutstärke"), "L_utst_rke");
    }
}
