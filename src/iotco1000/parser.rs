use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::iotco1000::AirQualityMeasurement;

const FIELD_DELIMITER: &str = ", ";

/// Number of fields in one reading; fields 4..=6 are not used here.
pub const FIELD_COUNT: usize = 11;

/// Leftovers of a serial line that end up glued to the last field.
const TRAILING_JUNK: &[char] = &[' ', '\r', '\n', '\0'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SerialNumber,
    CoConcentration,
    Temperature,
    RelativeHumidity,
    DaysUp,
    HoursUp,
    MinutesUp,
    SecondsUp,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::SerialNumber,
        Field::CoConcentration,
        Field::Temperature,
        Field::RelativeHumidity,
        Field::DaysUp,
        Field::HoursUp,
        Field::MinutesUp,
        Field::SecondsUp,
    ];

    pub fn index(&self) -> usize {
        match self {
            Field::SerialNumber => 0,
            Field::CoConcentration => 1,
            Field::Temperature => 2,
            Field::RelativeHumidity => 3,
            Field::DaysUp => 7,
            Field::HoursUp => 8,
            Field::MinutesUp => 9,
            Field::SecondsUp => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::SerialNumber => "serial number",
            Field::CoConcentration => "CO concentration",
            Field::Temperature => "temperature",
            Field::RelativeHumidity => "relative humidity",
            Field::DaysUp => "days up",
            Field::HoursUp => "hours up",
            Field::MinutesUp => "minutes up",
            Field::SecondsUp => "seconds up",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing {field} (field {index}): reading has only {found} fields", index = .field.index())]
    MissingField { field: Field, found: usize },

    #[error("failed converting {field} ({raw:?}) to {target}")]
    InvalidField {
        field: Field,
        raw: String,
        target: &'static str,
        #[source]
        source: ParseIntError,
    },

    #[error("failed parsing uptime {raw:?}")]
    InvalidUptime {
        raw: String,
        #[source]
        source: humantime::DurationError,
    },
}

impl ParseError {
    pub fn field(&self) -> Option<Field> {
        match self {
            ParseError::MissingField { field, .. } | ParseError::InvalidField { field, .. } => {
                Some(*field)
            }
            ParseError::InvalidUptime { .. } => None,
        }
    }
}

/// Parses one `", "`-delimited reading into a measurement.
///
/// Minutes and seconds are not parsed on their own; they are spliced into an
/// `"{hours}h{minutes}m{seconds}s"` string together with the day and hour
/// counts and parsed as a whole.
pub fn parse_measurement(
    raw: &[u8],
    measurement_time: DateTime<Tz>,
) -> Result<AirQualityMeasurement, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();

    if fields.len() < FIELD_COUNT {
        let field = Field::ALL
            .into_iter()
            .find(|f| f.index() >= fields.len())
            .unwrap_or(Field::SecondsUp);
        return Err(ParseError::MissingField {
            field,
            found: fields.len(),
        });
    }

    let sensor_serial_number = fields[Field::SerialNumber.index()].to_owned();
    let co_concentration_ppb: i32 = parse_int(&fields, Field::CoConcentration, "i32")?;
    let temperature_c: i8 = parse_int(&fields, Field::Temperature, "i8")?;
    let relative_humidity: i8 = parse_int(&fields, Field::RelativeHumidity, "i8")?;
    let days_up: i16 = parse_int(&fields, Field::DaysUp, "i16")?;
    let hours_up: i8 = parse_int(&fields, Field::HoursUp, "i8")?;
    let minutes_up = fields[Field::MinutesUp.index()].trim();
    let seconds_up = fields[Field::SecondsUp.index()].trim_matches(TRAILING_JUNK);

    let total_hours = i32::from(days_up) * 24 + i32::from(hours_up);
    let uptime_str = format!("{total_hours}h{minutes_up}m{seconds_up}s");
    let uptime = humantime::parse_duration(&uptime_str).map_err(|source| {
        ParseError::InvalidUptime {
            raw: uptime_str.clone(),
            source,
        }
    })?;

    Ok(AirQualityMeasurement {
        sensor_serial_number,
        co_concentration_ppb,
        temperature_c,
        relative_humidity,
        uptime,
        measurement_time,
    })
}

fn parse_int<T>(fields: &[&str], field: Field, target: &'static str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    let raw = fields[field.index()];
    raw.parse().map_err(|source| ParseError::InvalidField {
        field,
        raw: raw.to_owned(),
        target,
        source,
    })
}
