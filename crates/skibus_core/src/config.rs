//! # Run Configuration
//!
//! A [`SimConfig`] only exists in validated form. It is built from the five
//! positional CLI values or from a TOML file:
//!
//! ```toml
//! skiers = 120
//! stops = 4
//! capacity = 20
//! max_wait_us = 5000
//! max_drive_us = 500
//! ```
//!
//! Both sources go through the same range checks.

use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    MAX_BUS_DRIVE_US, MAX_CAPACITY, MAX_SKIERS, MAX_SKIER_WAIT_US, MAX_STOPS, MIN_CAPACITY,
    MIN_SKIERS, MIN_STOPS, POSITIONAL_ARGS,
};
use crate::error::ConfigError;

/// Name and inclusive range of each setting, in positional order.
const FIELDS: [(&str, u64, u64); POSITIONAL_ARGS] = [
    ("skiers", MIN_SKIERS as u64, MAX_SKIERS as u64),
    ("stops", MIN_STOPS as u64, MAX_STOPS as u64),
    ("capacity", MIN_CAPACITY as u64, MAX_CAPACITY as u64),
    ("max_wait_us", 0, MAX_SKIER_WAIT_US as u64),
    ("max_drive_us", 0, MAX_BUS_DRIVE_US as u64),
];

/// Immutable, validated run configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    skiers: u32,
    stops: u8,
    capacity: u16,
    max_wait_us: u32,
    max_drive_us: u32,
}

/// On-disk shape, checked by [`SimConfig::from_values`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    skiers: u64,
    stops: u64,
    capacity: u64,
    max_wait_us: u64,
    max_drive_us: u64,
}

impl SimConfig {
    /// Creates a configuration, rejecting any value outside its range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] naming the first offending setting.
    pub fn new(
        skiers: u32,
        stops: u8,
        capacity: u16,
        max_wait_us: u32,
        max_drive_us: u32,
    ) -> Result<Self, ConfigError> {
        Self::from_values([
            u64::from(skiers),
            u64::from(stops),
            u64::from(capacity),
            u64::from(max_wait_us),
            u64::from(max_drive_us),
        ])
    }

    /// Parses the five positional CLI values.
    ///
    /// Each value must be a plain run of ASCII digits; signs, blanks and
    /// fractions are rejected as non-numeric.
    ///
    /// # Errors
    ///
    /// Wrong count, non-numeric text, or an out-of-range value.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        if args.len() != POSITIONAL_ARGS {
            return Err(ConfigError::ArgumentCount {
                expected: POSITIONAL_ARGS,
                found: args.len(),
            });
        }

        let mut values = [0u64; POSITIONAL_ARGS];
        for (slot, (raw, &(name, _, _))) in values.iter_mut().zip(args.iter().zip(FIELDS.iter())) {
            let raw = raw.as_ref();
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::NotNumeric {
                    name,
                    value: raw.to_string(),
                });
            }
            // All digits, so the only parse failure left is overflow.
            *slot = raw.parse().unwrap_or(u64::MAX);
        }

        Self::from_values(values)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Malformed TOML, unknown or missing keys, or an out-of-range value.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        Self::from_values([
            raw.skiers,
            raw.stops,
            raw.capacity,
            raw.max_wait_us,
            raw.max_drive_us,
        ])
    }

    /// Loads a TOML config file.
    ///
    /// # Errors
    ///
    /// The file cannot be read, or [`SimConfig::from_toml_str`] rejects it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn from_values(values: [u64; POSITIONAL_ARGS]) -> Result<Self, ConfigError> {
        for (&value, &(name, min, max)) in values.iter().zip(FIELDS.iter()) {
            if value < min || value > max {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    min,
                    max,
                });
            }
        }

        // Every value is now within a range that fits its field.
        Ok(Self {
            skiers: values[0] as u32,
            stops: values[1] as u8,
            capacity: values[2] as u16,
            max_wait_us: values[3] as u32,
            max_drive_us: values[4] as u32,
        })
    }

    /// Number of skiers, N.
    #[inline]
    #[must_use]
    pub const fn skiers(&self) -> u32 {
        self.skiers
    }

    /// Number of boarding stops, S.
    #[inline]
    #[must_use]
    pub const fn stops(&self) -> u8 {
        self.stops
    }

    /// Seats on the bus, C.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Longest walk to a stop, in microseconds.
    #[inline]
    #[must_use]
    pub const fn max_wait_us(&self) -> u32 {
        self.max_wait_us
    }

    /// Longest drive between stops, in microseconds.
    #[inline]
    #[must_use]
    pub const fn max_drive_us(&self) -> u32 {
        self.max_drive_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_positional_args() {
        let config = SimConfig::from_args(&["8", "4", "10", "4", "5"]).unwrap();
        assert_eq!(config.skiers(), 8);
        assert_eq!(config.stops(), 4);
        assert_eq!(config.capacity(), 10);
        assert_eq!(config.max_wait_us(), 4);
        assert_eq!(config.max_drive_us(), 5);
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = SimConfig::from_args(&["8", "4", "10"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ArgumentCount { expected: 5, found: 3 }
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        for bad in ["abc", "-3", "+3", "4.5", "", " 4"] {
            let err = SimConfig::from_args(&["8", bad, "10", "4", "5"]).unwrap_err();
            assert!(
                matches!(err, ConfigError::NotNumeric { name: "stops", .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_zero_skiers_rejected() {
        let err = SimConfig::from_args(&["0", "4", "10", "4", "5"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { name: "skiers", value: 0, .. }
        ));
    }

    #[test]
    fn test_range_boundaries() {
        assert!(SimConfig::new(19_999, 10, 100, 10_000, 1_000).is_ok());
        assert!(SimConfig::new(1, 1, 10, 0, 0).is_ok());

        assert!(SimConfig::new(20_000, 1, 10, 0, 0).is_err());
        assert!(SimConfig::new(1, 0, 10, 0, 0).is_err());
        assert!(SimConfig::new(1, 11, 10, 0, 0).is_err());
        assert!(SimConfig::new(1, 1, 9, 0, 0).is_err());
        assert!(SimConfig::new(1, 1, 101, 0, 0).is_err());
        assert!(SimConfig::new(1, 1, 10, 10_001, 0).is_err());
        assert!(SimConfig::new(1, 1, 10, 0, 1_001).is_err());
    }

    #[test]
    fn test_huge_value_is_out_of_range() {
        let err = SimConfig::from_args(&["99999999999999999999999", "4", "10", "4", "5"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { name: "skiers", .. }));
    }

    #[test]
    fn test_toml_config() {
        let config = SimConfig::from_toml_str(
            "skiers = 120\nstops = 4\ncapacity = 20\nmax_wait_us = 5000\nmax_drive_us = 500\n",
        )
        .unwrap();
        assert_eq!(config, SimConfig::new(120, 4, 20, 5000, 500).unwrap());
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let err = SimConfig::from_toml_str(
            "skiers = 1\nstops = 1\ncapacity = 10\nmax_wait_us = 0\nmax_drive_us = 0\nspeed = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_toml_range_checked() {
        let err = SimConfig::from_toml_str(
            "skiers = 1\nstops = 12\ncapacity = 10\nmax_wait_us = 0\nmax_drive_us = 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { name: "stops", value: 12, .. }));
    }
}
