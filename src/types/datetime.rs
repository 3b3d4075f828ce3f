//! Date and time types.
//!
//! Thin validating wrappers around `chrono`; only a subset of what `chrono`
//! can represent is expressible in the IMAP grammar.

use std::fmt::{Debug, Formatter};

use chrono::{Datelike, FixedOffset};
use thiserror::Error;

/// `date-time`, e.g., `"01-Jul-2003 10:52:37 +0200"` (INTERNALDATE, APPEND).
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct DateTime(pub(crate) chrono::DateTime<FixedOffset>);

impl DateTime {
    pub fn validate(value: &chrono::DateTime<FixedOffset>) -> Result<(), DateTimeError> {
        if !(0..=9999).contains(&value.year()) {
            return Err(DateTimeError::YearOutOfRange { got: value.year() });
        }

        if value.timestamp_subsec_nanos() != 0 {
            return Err(DateTimeError::UnalignedNanoSeconds {
                got: value.timestamp_subsec_nanos(),
            });
        }

        if value.offset().local_minus_utc() % 60 != 0 {
            return Err(DateTimeError::UnalignedOffset {
                got: value.offset().local_minus_utc() % 60,
            });
        }

        Ok(())
    }
}

impl TryFrom<chrono::DateTime<FixedOffset>> for DateTime {
    type Error = DateTimeError;

    fn try_from(value: chrono::DateTime<FixedOffset>) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl Debug for DateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl AsRef<chrono::DateTime<FixedOffset>> for DateTime {
    fn as_ref(&self) -> &chrono::DateTime<FixedOffset> {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum DateTimeError {
    #[error("Year {got} is out of range 0..=9999")]
    YearOutOfRange { got: i32 },
    #[error("Fractional seconds ({got} ns) can't be expressed")]
    UnalignedNanoSeconds { got: u32 },
    #[error("Offset with seconds ({got}) can't be expressed")]
    UnalignedOffset { got: i32 },
}

/// `date`, e.g., `1-Jul-2003` (SEARCH BEFORE/ON/SINCE).
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct NaiveDate(pub(crate) chrono::NaiveDate);

impl NaiveDate {
    pub fn validate(value: &chrono::NaiveDate) -> Result<(), NaiveDateError> {
        if !(0..=9999).contains(&value.year()) {
            return Err(NaiveDateError::YearOutOfRange { got: value.year() });
        }

        Ok(())
    }
}

impl TryFrom<chrono::NaiveDate> for NaiveDate {
    type Error = NaiveDateError;

    fn try_from(value: chrono::NaiveDate) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl Debug for NaiveDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl AsRef<chrono::NaiveDate> for NaiveDate {
    fn as_ref(&self) -> &chrono::NaiveDate {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum NaiveDateError {
    #[error("Year {got} is out of range 0..=9999")]
    YearOutOfRange { got: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_rejects_subsecond_precision() {
        let base = chrono::DateTime::parse_from_rfc3339("2023-05-01T12:34:56.1+02:00").unwrap();
        assert!(DateTime::try_from(base).is_err());

        let good = chrono::DateTime::parse_from_rfc3339("2023-05-01T12:34:56+02:00").unwrap();
        assert!(DateTime::try_from(good).is_ok());
    }
}
