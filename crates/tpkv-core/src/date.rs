//! Calendar dates as ordered integer ordinals.
//!
//! Ordinal 1 is 0001-01-01 in the proleptic Gregorian calendar, so the
//! numbering agrees with the usual "days from the common era" convention and
//! sorted-set scores compare exactly like the dates they encode.

use crate::error::{Result, TpkvError};
use chrono::{Datelike, Days, NaiveDate};

const FORMAT: &str = "%Y-%m-%d";

pub fn parse(date: &str) -> Result<NaiveDate> {
    let malformed = || TpkvError::MalformedDate(date.to_string());
    let mut parts = date.trim().splitn(3, '-');
    let mut next = || -> Result<u32> {
        let part = parts.next().ok_or_else(malformed)?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        part.parse().map_err(|_| malformed())
    };
    let (y, m, d) = (next()?, next()?, next()?);
    let year = i32::try_from(y).map_err(|_| malformed())?;
    if year < 1 {
        return Err(malformed());
    }
    NaiveDate::from_ymd_opt(year, m, d).ok_or_else(malformed)
}

pub fn encode(date: &str) -> Result<i64> {
    Ok(ordinal(parse(date)?))
}

pub fn ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

/// Inverse of [`encode`]; ordinals below 1 have no calendar date.
pub fn decode(ordinal: i64) -> Result<String> {
    i32::try_from(ordinal)
        .ok()
        .filter(|&days| days >= 1)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| d.format(FORMAT).to_string())
        .ok_or_else(|| TpkvError::MalformedDate(ordinal.to_string()))
}

/// `date` moved by `days` (negative moves back).
pub fn shift_days(date: &str, days: i64) -> Result<String> {
    let base = parse(date)?;
    let step = Days::new(days.unsigned_abs());
    let shifted = if days < 0 {
        base.checked_sub_days(step)
    } else {
        base.checked_add_days(step)
    };
    shifted
        .filter(|d| d.year() >= 1)
        .map(|d| d.format(FORMAT).to_string())
        .ok_or_else(|| TpkvError::MalformedDate(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_common_era_numbering() -> Result<()> {
        assert_eq!(encode("0001-01-01")?, 1);
        assert_eq!(encode("1970-01-01")?, 719_163);
        assert_eq!(encode("1998-09-02")?, 729_634);
        Ok(())
    }

    #[test]
    fn ordering_is_preserved() -> Result<()> {
        let dates = ["1992-01-01", "1992-02-29", "1995-03-14", "1995-03-15", "1998-12-01"];
        for pair in dates.windows(2) {
            assert!(encode(pair[0])? < encode(pair[1])?, "{pair:?}");
        }
        Ok(())
    }

    #[test]
    fn first_day_is_the_lower_bound() -> Result<()> {
        assert_eq!(decode(1)?, "0001-01-01");
        assert!(shift_days("0001-01-01", -1).is_err());
        Ok(())
    }

    #[test]
    fn decode_inverts_encode() -> Result<()> {
        for d in ["1992-01-01", "1996-02-29", "1998-09-02", "2000-12-31"] {
            assert_eq!(decode(encode(d)?)?, d);
        }
        Ok(())
    }

    #[test]
    fn cutoff_arithmetic() -> Result<()> {
        assert_eq!(shift_days("1998-12-01", -90)?, "1998-09-02");
        assert_eq!(shift_days("1995-02-27", 2)?, "1995-03-01");
        Ok(())
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in [
            "",
            "1995-03",
            "1995-3x-01",
            "1995-13-01",
            "1995-02-30",
            "abcd-01-01",
            "1995--01",
            "0000-01-01",
            "0000-12-31",
        ] {
            assert!(
                matches!(encode(bad), Err(TpkvError::MalformedDate(_))),
                "{bad} should fail"
            );
        }
        assert!(decode(0).is_err());
        assert!(decode(-365).is_err());
    }
}
