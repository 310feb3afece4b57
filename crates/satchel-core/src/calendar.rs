//! Bounds on the dates and timestamps a record may carry.
//!
//! Stored values use four-digit years so that their text form sorts
//! chronologically; anything outside that range is rejected on write.

use chrono::Datelike;

use crate::{Error, Result};

pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// Fails with a validation error on `field` if `value` falls outside
/// [`MIN_YEAR`]..=[`MAX_YEAR`].
pub fn check_year(field: &'static str, value: &impl Datelike) -> Result<()> {
  if (MIN_YEAR..=MAX_YEAR).contains(&value.year()) {
    Ok(())
  } else {
    Err(Error::validation(
      field,
      format!("year must be between {MIN_YEAR} and {MAX_YEAR}"),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{NaiveDate, TimeZone, Utc};

  #[test]
  fn four_digit_years_pass() {
    let d = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
    assert!(check_year("date", &d).is_ok());
    let t = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
    assert!(check_year("due_at", &t).is_ok());
  }

  #[test]
  fn five_digit_and_negative_years_fail() {
    let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(check_year("due_at", &far).unwrap_err().field(), "due_at");
    let bce = NaiveDate::from_ymd_opt(-1, 6, 1).unwrap();
    assert_eq!(check_year("date", &bce).unwrap_err().field(), "date");
  }
}
