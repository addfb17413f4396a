use calamine::{CellErrorType, Data, DataType};
use chrono::{NaiveDate, NaiveDateTime};

/// Cell texts read as missing values, whatever the column type.
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// Month-first is tried before day-first for slashed dates.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

fn is_na_token(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

pub(crate) fn to_text(cell: Option<&Data>) -> Result<Option<String>, String> {
    let Some(cell) = cell else {
        return Ok(None);
    };
    match cell {
        Data::Empty => Ok(None),
        Data::String(value) if is_na_token(value) => Ok(None),
        Data::String(value) => Ok(Some(value.clone())),
        Data::Float(value) => Ok(Some(format_float(*value))),
        Data::Int(value) => Ok(Some(value.to_string())),
        Data::Bool(value) => Ok(Some(if *value { "True" } else { "False" }.to_string())),
        Data::DateTime(value) => value
            .as_datetime()
            .map(|dt| Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok_or_else(|| format!("date serial {} is out of range", value.as_f64())),
        Data::DateTimeIso(value) | Data::DurationIso(value) => Ok(Some(value.clone())),
        Data::Error(CellErrorType::NA) => Ok(None),
        Data::Error(err) => Ok(Some(err.to_string())),
    }
}

pub(crate) fn to_number(cell: Option<&Data>) -> Result<Option<f64>, String> {
    let Some(cell) = cell else {
        return Ok(None);
    };
    match cell {
        Data::Empty => Ok(None),
        Data::Float(value) => Ok(Some(*value)),
        Data::Int(value) => Ok(Some(*value as f64)),
        Data::Bool(value) => Ok(Some(if *value { 1.0 } else { 0.0 })),
        Data::String(value) => {
            let trimmed = value.trim();
            if is_na_token(trimmed) {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("'{value}' is not a number"))
        }
        Data::Error(CellErrorType::NA) => Ok(None),
        Data::Error(err) => Err(format!("cell holds error {err}")),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            Err("date cell in a numeric column".to_string())
        }
    }
}

pub(crate) fn to_datetime(cell: Option<&Data>) -> Result<Option<NaiveDateTime>, String> {
    let Some(cell) = cell else {
        return Ok(None);
    };
    match cell {
        Data::Empty => Ok(None),
        Data::DateTime(value) => value
            .as_datetime()
            .map(Some)
            .ok_or_else(|| format!("date serial {} is out of range", value.as_f64())),
        Data::Float(_) | Data::Int(_) => cell
            .as_datetime()
            .map(Some)
            .ok_or_else(|| format!("date serial {cell} is out of range")),
        Data::DateTimeIso(value) => parse_datetime_text(value).map(Some),
        Data::String(value) => {
            let trimmed = value.trim();
            if is_na_token(trimmed) {
                return Ok(None);
            }
            parse_datetime_text(trimmed).map(Some)
        }
        Data::Error(CellErrorType::NA) => Ok(None),
        Data::Error(err) => Err(format!("cell holds error {err}")),
        Data::Bool(_) | Data::DurationIso(_) => Err("cell is not a date".to_string()),
    }
}

fn parse_datetime_text(value: &str) -> Result<NaiveDateTime, String> {
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return Ok(parsed.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(format!("'{value}' is not a recognised date"))
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_cells_keep_nulls_as_nulls() {
        assert_eq!(to_text(None).unwrap(), None);
        assert_eq!(to_text(Some(&Data::Empty)).unwrap(), None);
        assert_eq!(to_text(Some(&Data::String("nan".into()))).unwrap(), None);
        assert_eq!(to_text(Some(&Data::Error(CellErrorType::NA))).unwrap(), None);
        assert_eq!(
            to_text(Some(&Data::String("RING".into()))).unwrap(),
            Some("RING".to_string())
        );
    }

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(to_text(Some(&Data::Float(1234.0))).unwrap(), Some("1234".into()));
        assert_eq!(to_text(Some(&Data::Float(12.5))).unwrap(), Some("12.5".into()));
        assert_eq!(to_text(Some(&Data::Int(77))).unwrap(), Some("77".into()));
        assert_eq!(to_text(Some(&Data::Bool(true))).unwrap(), Some("True".into()));
    }

    #[test]
    fn numeric_cells_accept_numbers_and_numeric_text() {
        assert_eq!(to_number(Some(&Data::Float(2.5))).unwrap(), Some(2.5));
        assert_eq!(to_number(Some(&Data::Int(3))).unwrap(), Some(3.0));
        assert_eq!(to_number(Some(&Data::String(" 4.25 ".into()))).unwrap(), Some(4.25));
        assert_eq!(to_number(Some(&Data::String("N/A".into()))).unwrap(), None);
        assert!(to_number(Some(&Data::String("lots".into()))).is_err());
        assert!(to_number(Some(&Data::Error(CellErrorType::Div0))).is_err());
    }

    #[test]
    fn date_cells_parse_serials_and_text() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(to_datetime(Some(&Data::Float(45017.0))).unwrap(), Some(expected));
        assert_eq!(to_datetime(Some(&Data::Int(45017))).unwrap(), Some(expected));
        assert_eq!(
            to_datetime(Some(&Data::Float(45017.5))).unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 1).and_then(|d| d.and_hms_opt(12, 0, 0))
        );
        assert_eq!(
            to_datetime(Some(&Data::String("2023-04-01".into()))).unwrap(),
            Some(expected)
        );
        assert_eq!(
            to_datetime(Some(&Data::DateTimeIso("2023-04-01T00:00:00".into()))).unwrap(),
            Some(expected)
        );
        assert_eq!(
            to_datetime(Some(&Data::String("13/04/2023".into()))).unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 13).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(to_datetime(Some(&Data::String("soon".into()))).is_err());
    }

    #[test]
    fn out_of_range_serials_are_coercion_errors() {
        let err = to_datetime(Some(&Data::Float(1e20))).unwrap_err();
        assert!(err.contains("out of range"), "{err}");
    }
}
