//! Fixture defaults loaded from a TOML file.
//!
//! ```toml
//! [clock]
//! start = "2002-01-01 09:00:00"
//! tzinfo = "+05:30"
//! delta = 1
//! delta_type = "minutes"
//! strict = true
//!
//! [tempdir]
//! ignore = ["^\\.svn$", "\\.pyc$"]
//! prefix = "mysuite"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::datetime::{DeltaUnit, FakeClock, FakeClockConfig, Flavour};
use crate::tempdir::TempDirOptions;

/// Errors returned when loading or applying settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid start `{0}`, expected `YYYY-MM-DD[ HH:MM:SS[.ffffff]]` or `none`")]
    InvalidStart(String),

    #[error("invalid offset `{0}`, expected `+HH:MM`, `-HH:MM` or `Z`")]
    InvalidOffset(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clock: ClockSettings,
    pub tempdir: TempDirSettings,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }
}

/// Read settings from `path`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml_str(&text)
}

/// `[clock]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// First instant, or `"none"` for an empty queue. Unset means the
    /// default start.
    pub start: Option<String>,
    pub tzinfo: Option<String>,
    pub delta: Option<i64>,
    pub delta_type: DeltaUnit,
    pub strict: bool,
    /// Dates derived from clock readings are strict fakes too.
    pub date_strict: bool,
}

impl ClockSettings {
    pub fn config(&self) -> Result<FakeClockConfig, SettingsError> {
        let defaults = FakeClockConfig::default();
        let start = match self.start.as_deref() {
            None => defaults.start,
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(parse_start(raw)?),
        };
        let tzinfo = self.tzinfo.as_deref().map(parse_offset).transpose()?;
        Ok(FakeClockConfig {
            start,
            tzinfo,
            delta: self.delta,
            delta_type: self.delta_type,
            strict: self.strict,
            date_flavour: if self.date_strict {
                Flavour::Strict
            } else {
                Flavour::Native
            },
        })
    }

    pub fn build(&self) -> Result<FakeClock, SettingsError> {
        Ok(FakeClock::with_config(self.config()?))
    }
}

/// `[tempdir]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TempDirSettings {
    pub ignore: Vec<String>,
    pub prefix: Option<String>,
}

impl TempDirSettings {
    pub fn options(&self) -> TempDirOptions {
        TempDirOptions {
            ignore: self.ignore.clone(),
            prefix: self.prefix.clone(),
            ..TempDirOptions::default()
        }
    }
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, SettingsError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| SettingsError::InvalidStart(raw.to_string()))
}

/// Parse `+HH:MM`, `-HHMM`, `+HH` or `Z`.
pub fn parse_offset(raw: &str) -> Result<FixedOffset, SettingsError> {
    let invalid = || SettingsError::InvalidOffset(raw.to_string());
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_parse() {
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_offset("-0100").unwrap().local_minus_utc(), -3600);
        assert_eq!(parse_offset("+02").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
        for bad in ["05:00", "+5:0", "+ab:cd", "+01:75", ""] {
            assert!(matches!(parse_offset(bad), Err(SettingsError::InvalidOffset(_))), "{bad}");
        }
    }

    #[test]
    fn start_forms() {
        assert_eq!(
            parse_start("2002-01-01").unwrap().to_string(),
            "2002-01-01 00:00:00"
        );
        assert_eq!(
            parse_start("2002-01-01 01:02:03.000004").unwrap().to_string(),
            "2002-01-01 01:02:03.000004"
        );
        assert!(matches!(parse_start("yesterday"), Err(SettingsError::InvalidStart(_))));
    }

    #[test]
    fn empty_document_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.clock.config().unwrap(), FakeClockConfig::default());
    }

    #[test]
    fn none_start_means_empty_queue() {
        let settings = Settings::from_toml_str("[clock]\nstart = \"none\"\n").unwrap();
        assert_eq!(settings.clock.config().unwrap().start, None);
    }

    #[test]
    fn delta_type_is_case_insensitive() {
        let settings = Settings::from_toml_str("[clock]\ndelta_type = \"Minutes\"\n").unwrap();
        assert_eq!(settings.clock.delta_type, DeltaUnit::Minutes);
        let err = Settings::from_toml_str("[clock]\ndelta_type = \"fortnights\"\n").unwrap_err();
        assert!(err.to_string().contains("unknown delta unit `fortnights`"));
    }
}
