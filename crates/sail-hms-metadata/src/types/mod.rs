//! Type conversions between HMS type strings and Arrow types
//!
//! Columns are persisted in the metastore with Hive type names such as
//! `decimal(10,2)` or `map<string,array<int>>`. Callers see Arrow
//! [`DataType`]s. Partition values are escaped when rendered into partition
//! names like `year=2023/month=01`.

use crate::error::{HmsError, HmsResult};
use arrow_schema::{DataType, Field, Fields, TimeUnit, DECIMAL128_MAX_PRECISION};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Convert HMS type string to Arrow DataType
pub fn parse_hms_type(type_str: &str) -> HmsResult<DataType> {
    let type_str = type_str.trim().to_lowercase();

    match type_str.as_str() {
        // Primitive types
        "boolean" => Ok(DataType::Boolean),
        "tinyint" => Ok(DataType::Int8),
        "smallint" => Ok(DataType::Int16),
        "int" | "integer" => Ok(DataType::Int32),
        "bigint" => Ok(DataType::Int64),
        "float" => Ok(DataType::Float32),
        "double" | "double precision" => Ok(DataType::Float64),
        "string" => Ok(DataType::Utf8),
        "binary" => Ok(DataType::Binary),
        "timestamp" => Ok(DataType::Timestamp(TimeUnit::Microsecond, None)),
        "date" => Ok(DataType::Date32),
        "void" => Ok(DataType::Null),

        // Complex types requiring parsing
        s if s.starts_with("decimal") => parse_decimal_type(s),
        s if s.starts_with("char") || s.starts_with("varchar") => Ok(DataType::Utf8),
        s if s.starts_with("array") => parse_array_type(s),
        s if s.starts_with("map") => parse_map_type(s),
        s if s.starts_with("struct") => parse_struct_type(s),

        s => Err(HmsError::TypeConversion(format!("Unsupported HMS type: {}", s))),
    }
}

/// Convert an Arrow DataType to the HMS type string stored in the metastore.
///
/// Only types that [`parse_hms_type`] reads back are accepted, so a column
/// that can be written can always be read.
pub fn to_hms_type(data_type: &DataType) -> HmsResult<String> {
    let s = match data_type {
        DataType::Null => "void".to_string(),
        DataType::Boolean => "boolean".to_string(),
        DataType::Int8 => "tinyint".to_string(),
        DataType::Int16 => "smallint".to_string(),
        DataType::Int32 => "int".to_string(),
        DataType::Int64 => "bigint".to_string(),
        DataType::Float32 => "float".to_string(),
        DataType::Float64 => "double".to_string(),
        DataType::Utf8 | DataType::LargeUtf8 => "string".to_string(),
        DataType::Binary | DataType::LargeBinary => "binary".to_string(),
        DataType::Date32 => "date".to_string(),
        DataType::Timestamp(_, _) => "timestamp".to_string(),
        DataType::Decimal128(precision, scale) => {
            check_decimal(*precision, i16::from(*scale))?;
            format!("decimal({},{})", precision, scale)
        }
        DataType::List(field) | DataType::LargeList(field) => {
            format!("array<{}>", to_hms_type(field.data_type())?)
        }
        DataType::Map(entries, _) => match entries.data_type() {
            DataType::Struct(fields) if fields.len() == 2 => format!(
                "map<{},{}>",
                to_hms_type(fields[0].data_type())?,
                to_hms_type(fields[1].data_type())?
            ),
            other => {
                return Err(HmsError::TypeConversion(format!(
                    "Invalid map entries type: {}",
                    other
                )))
            }
        },
        DataType::Struct(fields) if fields.is_empty() => {
            return Err(HmsError::TypeConversion(
                "Struct type without fields has no HMS type".into(),
            ))
        }
        DataType::Struct(fields) => {
            let fields = fields
                .iter()
                .map(|f| {
                    let name = f.name();
                    if name.trim() != name || name.contains([',', ':', '<', '>']) {
                        return Err(HmsError::TypeConversion(format!(
                            "Invalid struct field name for HMS: {:?}",
                            name
                        )));
                    }
                    Ok(format!("{}:{}", name, to_hms_type(f.data_type())?))
                })
                .collect::<HmsResult<Vec<_>>>()?;
            format!("struct<{}>", fields.join(","))
        }
        other => {
            return Err(HmsError::TypeConversion(format!(
                "No HMS type for Arrow type: {}",
                other
            )))
        }
    };
    Ok(s)
}

/// Parse decimal type (e.g., "decimal(10,2)")
fn parse_decimal_type(type_str: &str) -> HmsResult<DataType> {
    static DECIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = DECIMAL_REGEX.get_or_init(|| {
        Regex::new(r"^decimal\s*\(\s*(\d+)\s*(?:,\s*(\d+))?\s*\)$").unwrap()
    });

    if type_str == "decimal" {
        // Hive default precision and scale
        return Ok(DataType::Decimal128(10, 0));
    }

    let captures = re.captures(type_str).ok_or_else(|| {
        HmsError::TypeConversion(format!("Invalid decimal type: {}", type_str))
    })?;

    let precision: u8 = captures[1]
        .parse()
        .map_err(|_| HmsError::TypeConversion("Invalid decimal precision".into()))?;
    let scale: i8 = match captures.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| HmsError::TypeConversion("Invalid decimal scale".into()))?,
        None => 0,
    };

    check_decimal(precision, i16::from(scale))?;
    Ok(DataType::Decimal128(precision, scale))
}

/// Hive decimals have `1 <= precision <= 38` and `0 <= scale <= precision`
fn check_decimal(precision: u8, scale: i16) -> HmsResult<()> {
    if !(1..=DECIMAL128_MAX_PRECISION).contains(&precision) {
        return Err(HmsError::TypeConversion(format!(
            "Decimal precision {} out of range 1..={}",
            precision, DECIMAL128_MAX_PRECISION
        )));
    }
    if scale < 0 || scale > i16::from(precision) {
        return Err(HmsError::TypeConversion(format!(
            "Decimal scale {} out of range 0..={}",
            scale, precision
        )));
    }
    Ok(())
}

/// Contents between the outermost angle brackets of `name<...>`
fn generic_body<'a>(type_str: &'a str, name: &str) -> HmsResult<&'a str> {
    type_str
        .strip_prefix(name)
        .map(str::trim_start)
        .and_then(|s| s.strip_prefix('<'))
        .and_then(|s| s.strip_suffix('>'))
        .map(str::trim)
        .ok_or_else(|| HmsError::TypeConversion(format!("Invalid {} type: {}", name, type_str)))
}

/// Split on commas that are not nested inside `<>` or `()`
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Parse array type (e.g., "array<int>")
fn parse_array_type(type_str: &str) -> HmsResult<DataType> {
    let element_type = parse_hms_type(generic_body(type_str, "array")?)?;
    Ok(DataType::List(Arc::new(Field::new("item", element_type, true))))
}

/// Parse map type (e.g., "map<string,int>")
fn parse_map_type(type_str: &str) -> HmsResult<DataType> {
    let parts = split_top_level(generic_body(type_str, "map")?);
    let [key, value] = parts.as_slice() else {
        return Err(HmsError::TypeConversion(format!(
            "Invalid map type: {}",
            type_str
        )));
    };

    let key_type = parse_hms_type(key)?;
    let value_type = parse_hms_type(value)?;

    Ok(DataType::Map(
        Arc::new(Field::new(
            "entries",
            DataType::Struct(Fields::from(vec![
                Field::new("key", key_type, false),
                Field::new("value", value_type, true),
            ])),
            false,
        )),
        false,
    ))
}

/// Parse struct type (e.g., "struct<name:string,age:int>")
fn parse_struct_type(type_str: &str) -> HmsResult<DataType> {
    let body = generic_body(type_str, "struct")?;
    let fields = split_top_level(body)
        .into_iter()
        .map(|field_str| {
            let (name, field_type) = field_str.split_once(':').ok_or_else(|| {
                HmsError::TypeConversion(format!("Invalid struct field: {}", field_str))
            })?;
            Ok(Field::new(name.trim(), parse_hms_type(field_type)?, true))
        })
        .collect::<HmsResult<Vec<_>>>()?;

    Ok(DataType::Struct(Fields::from(fields)))
}

/// Normalize optional string (trim and convert empty to None)
pub fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Escape partition value for HMS
pub fn escape_partition_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Unescape partition value from HMS
pub fn unescape_partition_value(value: &str) -> HmsResult<String> {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .map_err(|e| HmsError::TypeConversion(format!("Invalid partition value: {}", e)))
}

/// Render a partition name (e.g., "year=2023/month=01") from ordered key/value pairs
pub fn format_partition_spec<K, V>(spec: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    spec.iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                escape_partition_value(k.as_ref()),
                escape_partition_value(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse partition spec string (e.g., "year=2023/month=01"), keeping key order
pub fn parse_partition_spec(spec: &str) -> HmsResult<Vec<(String, String)>> {
    spec.split('/')
        .map(|part| {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                HmsError::TypeConversion(format!("Missing partition value in: {}", part))
            })?;
            if key.is_empty() {
                return Err(HmsError::TypeConversion("Missing partition key".into()));
            }

            Ok((unescape_partition_value(key)?, unescape_partition_value(value)?))
        })
        .collect()
}
