//! Temporal format strings of the Arrow C Data Interface.
//!
//! | format        | Arrow type                  | bits |
//! |---------------|-----------------------------|------|
//! | `tdD`         | `Date32`                    | 32   |
//! | `tdm`         | `Date64`                    | 64   |
//! | `tts`/`ttm`   | `Time32(Second/Millisecond)`| 32   |
//! | `ttu`/`ttn`   | `Time64(Micro/Nanosecond)`  | 64   |
//! | `ts{u}:{tz}`  | `Timestamp(u, tz)`          | 64   |
//! | `tD{u}`       | `Duration(u)`               | 64   |
//!
//! An empty `{tz}` means a naive timestamp.

use arrow_schema::{DataType as ArrowDataType, TimeUnit};

use crate::error::InterchangeError;

fn unit_char(unit: &TimeUnit) -> char {
    match unit {
        TimeUnit::Second => 's',
        TimeUnit::Millisecond => 'm',
        TimeUnit::Microsecond => 'u',
        TimeUnit::Nanosecond => 'n',
    }
}

fn parse_unit(s: &str) -> Option<TimeUnit> {
    match s {
        "s" => Some(TimeUnit::Second),
        "m" => Some(TimeUnit::Millisecond),
        "u" => Some(TimeUnit::Microsecond),
        "n" => Some(TimeUnit::Nanosecond),
        _ => None,
    }
}

/// Returns `(bit_width, format)` for a temporal Arrow type.
pub(crate) fn to_format(dt: &ArrowDataType) -> Result<(u32, String), InterchangeError> {
    let encoded = match dt {
        ArrowDataType::Date32 => (32, "tdD".to_string()),
        ArrowDataType::Date64 => (64, "tdm".to_string()),
        ArrowDataType::Time32(unit @ (TimeUnit::Second | TimeUnit::Millisecond)) => {
            (32, format!("tt{}", unit_char(unit)))
        }
        ArrowDataType::Time64(unit @ (TimeUnit::Microsecond | TimeUnit::Nanosecond)) => {
            (64, format!("tt{}", unit_char(unit)))
        }
        ArrowDataType::Timestamp(unit, tz) => (
            64,
            format!("ts{}:{}", unit_char(unit), tz.as_deref().unwrap_or("")),
        ),
        ArrowDataType::Duration(unit) => (64, format!("tD{}", unit_char(unit))),
        dt => {
            return Err(InterchangeError::UnsupportedType(format!(
                "data type {} not supported by the interchange protocol",
                dt
            )))
        }
    };
    Ok(encoded)
}

/// Parses a temporal format string into its Arrow type.
pub(crate) fn from_format(format: &str) -> Result<ArrowDataType, InterchangeError> {
    let unsupported = || {
        InterchangeError::UnsupportedFormat(format!("unsupported temporal data type: {:?}", format))
    };

    if let Some(rest) = format.strip_prefix("ts") {
        let (unit, tz) = rest.split_once(':').ok_or_else(unsupported)?;
        let unit = parse_unit(unit).ok_or_else(unsupported)?;
        let tz = (!tz.is_empty()).then(|| tz.into());
        return Ok(ArrowDataType::Timestamp(unit, tz));
    }
    if let Some(unit) = format.strip_prefix("tD") {
        let unit = parse_unit(unit).ok_or_else(unsupported)?;
        return Ok(ArrowDataType::Duration(unit));
    }

    match format {
        "tdD" => Ok(ArrowDataType::Date32),
        "tdm" => Ok(ArrowDataType::Date64),
        "tts" => Ok(ArrowDataType::Time32(TimeUnit::Second)),
        "ttm" => Ok(ArrowDataType::Time32(TimeUnit::Millisecond)),
        "ttu" => Ok(ArrowDataType::Time64(TimeUnit::Microsecond)),
        "ttn" => Ok(ArrowDataType::Time64(TimeUnit::Nanosecond)),
        _ => Err(unsupported()),
    }
}
