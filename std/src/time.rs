use crate::{int_arg, string_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Value};
use std::time::UNIX_EPOCH;

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("now", Arity::fixed(0), |_, _| {
      let elapsed = UNIX_EPOCH.elapsed().unwrap_or_default();
      Ok(Value::Int(elapsed.as_millis() as i64))
    })
    .function("format", Arity::range(1, 1), |_, args| {
      let millis = int_arg(args, 0, "format")?;
      let pattern = match args.get(1) {
        Some(_) => string_arg(args, 1, "format")?.to_string(),
        None => "%Y-%m-%d %H:%M:%S".to_string(),
      };
      Ok(Value::from(format_timestamp(millis, &pattern)))
    })
    .finish()
}

/// Render a UTC timestamp with a small strftime subset
/// (%Y %m %d %H %M %S %%).
fn format_timestamp(millis: i64, pattern: &str) -> String {
  let seconds = millis.div_euclid(1000);
  let days = seconds.div_euclid(86_400);
  let seconds_of_day = seconds.rem_euclid(86_400);

  let (year, month, day) = civil_from_days(days);
  let (hour, minute, second) = (
    seconds_of_day / 3600,
    (seconds_of_day % 3600) / 60,
    seconds_of_day % 60,
  );

  let mut out = String::new();
  let mut chars = pattern.chars();
  while let Some(character) = chars.next() {
    if character != '%' {
      out.push(character);
      continue;
    }
    match chars.next() {
      Some('Y') => out.push_str(&format!("{year:04}")),
      Some('m') => out.push_str(&format!("{month:02}")),
      Some('d') => out.push_str(&format!("{day:02}")),
      Some('H') => out.push_str(&format!("{hour:02}")),
      Some('M') => out.push_str(&format!("{minute:02}")),
      Some('S') => out.push_str(&format!("{second:02}")),
      Some('%') => out.push('%'),
      Some(other) => {
        out.push('%');
        out.push(other);
      }
      None => out.push('%'),
    }
  }
  out
}

/// Days-since-epoch to calendar date (Howard Hinnant's civil algorithm).
fn civil_from_days(days: i64) -> (i64, i64, i64) {
  let z = days + 719_468;
  let era = z.div_euclid(146_097);
  let doe = z.rem_euclid(146_097);
  let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
  let year = yoe + era * 400;
  let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
  let mp = (5 * doy + 2) / 153;
  let day = doy - (153 * mp + 2) / 5 + 1;
  let month = if mp < 10 { mp + 3 } else { mp - 9 };
  (if month <= 2 { year + 1 } else { year }, month, day)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn epoch_formats_to_1970() {
    assert_eq!(format_timestamp(0, "%Y-%m-%d %H:%M:%S"), "1970-01-01 00:00:00");
  }

  #[test]
  fn known_timestamp() {
    // 2000-01-01T00:00:00Z
    assert_eq!(format_timestamp(946_684_800_000, "%Y-%m-%d"), "2000-01-01");
  }

  #[test]
  fn unknown_specifiers_pass_through() {
    assert_eq!(format_timestamp(0, "%Y%%%q"), "1970%%q");
  }
}
