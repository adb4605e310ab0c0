//! Date filters available to every template.
//!
//! | Filter               | Output                  |
//! |----------------------|-------------------------|
//! | `long_date`          | `March 01, 2024`        |
//! | `date_to_xml_string` | `2024-03-01T00:00:00`   |
//! | `archive_date`       | `2024/03`               |
//!
//! Input is UNIX seconds or any date string `parse_date` accepts, including
//! the stored `full_date` form. Empty input renders as an empty string.

use crate::utils::date::{
    ARCHIVE_DATE_FORMAT, LONG_DATE_FORMAT, XML_DATE_FORMAT, from_timestamp, parse_date,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tera::{Tera, Value};

/// Register every filter on `tera`.
pub fn register(tera: &mut Tera) {
    tera.register_filter("long_date", long_date);
    tera.register_filter("date_to_xml_string", date_to_xml_string);
    tera.register_filter("archive_date", archive_date);
}

pub fn long_date(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date(value, LONG_DATE_FORMAT, "long_date")
}

pub fn date_to_xml_string(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date(value, XML_DATE_FORMAT, "date_to_xml_string")
}

pub fn archive_date(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date(value, ARCHIVE_DATE_FORMAT, "archive_date")
}

fn format_date(value: &Value, format: &str, filter: &str) -> tera::Result<Value> {
    let parsed: Option<NaiveDateTime> = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(s) if s.trim().is_empty() => return Ok(Value::String(String::new())),
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(from_timestamp),
        _ => None,
    };

    parsed
        .map(|date| Value::String(date.format(format).to_string()))
        .ok_or_else(|| tera::Error::msg(format!("`{filter}` cannot read a date from {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(filter: fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>, v: Value) -> Value {
        filter(&v, &HashMap::new()).unwrap()
    }

    #[test]
    fn test_long_date_from_full_date() {
        assert_eq!(apply(long_date, json!("2024-03-01 00:00:00-00:00")), json!("March 01, 2024"));
    }

    #[test]
    fn test_filters_accept_timestamps() {
        assert_eq!(apply(date_to_xml_string, json!(1_709_251_200)), json!("2024-03-01T00:00:00"));
        assert_eq!(apply(archive_date, json!(1_709_251_200)), json!("2024/03"));
    }

    #[test]
    fn test_filters_accept_iso() {
        assert_eq!(apply(archive_date, json!("2024-03-01T10:00:00")), json!("2024/03"));
        assert_eq!(apply(date_to_xml_string, json!("2024-03-01")), json!("2024-03-01T00:00:00"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(apply(long_date, json!("")), json!(""));
        assert_eq!(apply(archive_date, Value::Null), json!(""));
    }

    #[test]
    fn test_unparsable_input_errors() {
        assert!(long_date(&json!("soon"), &HashMap::new()).is_err());
        assert!(long_date(&json!([1]), &HashMap::new()).is_err());
    }

    #[test]
    fn test_registered_on_engine() {
        let mut tera = Tera::default();
        register(&mut tera);
        let mut context = tera::Context::new();
        context.insert("d", "2024-03-01 00:00:00-00:00");

        let out = tera
            .render_str("{{ d | long_date }} {{ d | archive_date }}", &context)
            .unwrap();
        assert_eq!(out, "March 01, 2024 2024/03");
    }
}
