//! Built-in XML Schema datatypes.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|-?INF|NaN)$").unwrap()
});
static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .unwrap()
});
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap());
static NC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").unwrap());
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}_:][\p{L}\p{N}_.\-:]*$").unwrap());
static NM_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_.\-:]+$").unwrap());
static LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap());

/// Built-in datatypes the compiler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    AnyType,
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    AnyUri,
    Boolean,
    Decimal,
    Integer,
    Long,
    Int,
    Short,
    NonNegativeInteger,
    PositiveInteger,
    Float,
    Double,
    DateTime,
    Date,
    Time,
    Id,
    IdRef,
    IdRefs,
    NcName,
    Name,
    NmToken,
    Language,
}

impl Builtin {
    /// Look up a built-in by its local name in the XML Schema namespace.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "anyType" => Builtin::AnyType,
            "anySimpleType" => Builtin::AnySimpleType,
            "string" => Builtin::String,
            "normalizedString" => Builtin::NormalizedString,
            "token" => Builtin::Token,
            "anyURI" => Builtin::AnyUri,
            "boolean" => Builtin::Boolean,
            "decimal" => Builtin::Decimal,
            "integer" => Builtin::Integer,
            "long" => Builtin::Long,
            "int" => Builtin::Int,
            "short" => Builtin::Short,
            "nonNegativeInteger" => Builtin::NonNegativeInteger,
            "positiveInteger" => Builtin::PositiveInteger,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "dateTime" => Builtin::DateTime,
            "date" => Builtin::Date,
            "time" => Builtin::Time,
            "ID" => Builtin::Id,
            "IDREF" => Builtin::IdRef,
            "IDREFS" => Builtin::IdRefs,
            "NCName" => Builtin::NcName,
            "Name" => Builtin::Name,
            "NMTOKEN" => Builtin::NmToken,
            "language" => Builtin::Language,
            _ => return None,
        };
        Some(builtin)
    }

    /// Check a lexical value.
    pub(crate) fn check(&self, raw: &str) -> Result<(), String> {
        let value = raw.trim();
        let ok = match self {
            Builtin::AnyType
            | Builtin::AnySimpleType
            | Builtin::String
            | Builtin::NormalizedString
            | Builtin::Token
            | Builtin::AnyUri => true,
            Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Builtin::Decimal => DECIMAL.is_match(value),
            Builtin::Integer => INTEGER.is_match(value),
            Builtin::Long => value.parse::<i64>().is_ok(),
            Builtin::Int => value.parse::<i32>().is_ok(),
            Builtin::Short => value.parse::<i16>().is_ok(),
            Builtin::NonNegativeInteger => {
                INTEGER.is_match(value) && !value.starts_with('-') || is_negative_zero(value)
            }
            Builtin::PositiveInteger => {
                INTEGER.is_match(value)
                    && !value.starts_with('-')
                    && value.trim_start_matches('+').chars().any(|c| c != '0')
            }
            Builtin::Float | Builtin::Double => FLOAT.is_match(value),
            Builtin::DateTime => DATE_TIME
                .captures(value)
                .is_some_and(|c| valid_date(&c[1], &c[2], &c[3]) && valid_time(&c[4], &c[5], &c[6])),
            Builtin::Date => DATE
                .captures(value)
                .is_some_and(|c| valid_date(&c[1], &c[2], &c[3])),
            Builtin::Time => TIME.is_match(value),
            Builtin::Id | Builtin::IdRef | Builtin::NcName => NC_NAME.is_match(value),
            Builtin::IdRefs => {
                !value.is_empty() && value.split_whitespace().all(|v| NC_NAME.is_match(v))
            }
            Builtin::Name => NAME.is_match(value),
            Builtin::NmToken => NM_TOKEN.is_match(value),
            Builtin::Language => LANGUAGE.is_match(value),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("[{}] is not a valid value of the atomic type '{}'", raw, self.name()))
        }
    }

    /// Schema name of the type.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Builtin::AnyType => "xs:anyType",
            Builtin::AnySimpleType => "xs:anySimpleType",
            Builtin::String => "xs:string",
            Builtin::NormalizedString => "xs:normalizedString",
            Builtin::Token => "xs:token",
            Builtin::AnyUri => "xs:anyURI",
            Builtin::Boolean => "xs:boolean",
            Builtin::Decimal => "xs:decimal",
            Builtin::Integer => "xs:integer",
            Builtin::Long => "xs:long",
            Builtin::Int => "xs:int",
            Builtin::Short => "xs:short",
            Builtin::NonNegativeInteger => "xs:nonNegativeInteger",
            Builtin::PositiveInteger => "xs:positiveInteger",
            Builtin::Float => "xs:float",
            Builtin::Double => "xs:double",
            Builtin::DateTime => "xs:dateTime",
            Builtin::Date => "xs:date",
            Builtin::Time => "xs:time",
            Builtin::Id => "xs:ID",
            Builtin::IdRef => "xs:IDREF",
            Builtin::IdRefs => "xs:IDREFS",
            Builtin::NcName => "xs:NCName",
            Builtin::Name => "xs:Name",
            Builtin::NmToken => "xs:NMTOKEN",
            Builtin::Language => "xs:language",
        }
    }
}

fn is_negative_zero(value: &str) -> bool {
    value.starts_with('-') && value[1..].chars().all(|c| c == '0') && value.len() > 1
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

fn valid_time(hour: &str, minute: &str, second: &str) -> bool {
    match (hour.parse::<u32>(), minute.parse::<u32>(), second.parse::<u32>()) {
        (Ok(h), Ok(m), Ok(s)) => (h < 24 && m < 60 && s < 60) || (h == 24 && m == 0 && s == 0),
        _ => false,
    }
}
