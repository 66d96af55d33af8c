//! Preference Normalizer — resolves every recognized preference field to a
//! concrete value, defaulting whatever the caller left out.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Neutral rating used for any unrated subject.
pub const DEFAULT_RATING: Rating = Rating(3);
pub const DEFAULT_CAREER_FOCUS: &str = "General";
pub const DEFAULT_LOCATION: &str = "Any";

/// A 1–5 interest rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        (i64::from(Self::MIN)..=i64::from(Self::MAX))
            .contains(&value)
            .then(|| Rating(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.get(), Self::MAX)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollegePreference {
    #[default]
    Indian,
    Foreign,
}

impl CollegePreference {
    const ACCEPTED: &'static str = "indian, foreign";

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "indian" => Some(CollegePreference::Indian),
            "foreign" => Some(CollegePreference::Foreign),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CollegePreference::Indian => "Indian",
            CollegePreference::Foreign => "Foreign",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CollegeType {
    #[default]
    University,
    #[serde(rename = "Liberal Arts")]
    LiberalArts,
    Technical,
    Specialized,
}

impl CollegeType {
    const ACCEPTED: &'static str = "University, Liberal Arts, Technical, Specialized";

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "university" => Some(CollegeType::University),
            "liberal arts" => Some(CollegeType::LiberalArts),
            "technical" => Some(CollegeType::Technical),
            "specialized" => Some(CollegeType::Specialized),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CollegeType::University => "University",
            CollegeType::LiberalArts => "Liberal Arts",
            CollegeType::Technical => "Technical",
            CollegeType::Specialized => "Specialized",
        }
    }
}

/// A fully-resolved preference record. Every field holds either the caller's
/// value or its documented default; unrecognized input keys are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub college_preference: CollegePreference,
    pub math: Rating,
    pub science: Rating,
    pub literature: Rating,
    pub social: Rating,
    pub art: Rating,
    pub tech: Rating,
    pub business: Rating,
    pub hands_on: Rating,
    pub career_focus: String,
    pub location: String,
    pub college_type: CollegeType,
}

impl Default for PreferenceRecord {
    fn default() -> Self {
        Self {
            college_preference: CollegePreference::default(),
            math: DEFAULT_RATING,
            science: DEFAULT_RATING,
            literature: DEFAULT_RATING,
            social: DEFAULT_RATING,
            art: DEFAULT_RATING,
            tech: DEFAULT_RATING,
            business: DEFAULT_RATING,
            hands_on: DEFAULT_RATING,
            career_focus: DEFAULT_CAREER_FOCUS.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            college_type: CollegeType::default(),
        }
    }
}

/// Normalizes an untrusted request payload into a `PreferenceRecord`.
///
/// Rejects (as `InvalidRequest`) a payload that is absent, not an object, or
/// empty, and any recognized field whose value is out of range. Missing, null
/// and blank fields are never an error: they take the documented default.
pub fn normalize_preferences(payload: &Value) -> Result<PreferenceRecord, AppError> {
    let fields = match payload {
        Value::Object(map) if !map.is_empty() => map,
        Value::Object(_) | Value::Null => {
            return Err(AppError::InvalidRequest(
                "Invalid request data: preferences are required".to_string(),
            ))
        }
        _ => {
            return Err(AppError::InvalidRequest(
                "Invalid request data: preferences must be a JSON object".to_string(),
            ))
        }
    };

    let defaults = PreferenceRecord::default();

    Ok(PreferenceRecord {
        college_preference: enum_field(
            fields,
            "collegePreference",
            CollegePreference::parse,
            CollegePreference::ACCEPTED,
        )?
        .unwrap_or(defaults.college_preference),
        math: rating_field(fields, "math")?.unwrap_or(defaults.math),
        science: rating_field(fields, "science")?.unwrap_or(defaults.science),
        literature: rating_field(fields, "literature")?.unwrap_or(defaults.literature),
        social: rating_field(fields, "social")?.unwrap_or(defaults.social),
        art: rating_field(fields, "art")?.unwrap_or(defaults.art),
        tech: rating_field(fields, "tech")?.unwrap_or(defaults.tech),
        business: rating_field(fields, "business")?.unwrap_or(defaults.business),
        hands_on: rating_field(fields, "handsOn")?.unwrap_or(defaults.hands_on),
        career_focus: text_field(fields, "careerFocus")?.unwrap_or(defaults.career_focus),
        location: text_field(fields, "location")?.unwrap_or(defaults.location),
        college_type: enum_field(
            fields,
            "collegeType",
            CollegeType::parse,
            CollegeType::ACCEPTED,
        )?
        .unwrap_or(defaults.college_type),
    })
}

/// Looks up a field, treating null and blank strings as absent.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}

fn rating_field(fields: &Map<String, Value>, key: &str) -> Result<Option<Rating>, AppError> {
    let Some(value) = present(fields, key) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.and_then(Rating::new).map(Some).ok_or_else(|| {
        AppError::InvalidRequest(format!(
            "'{key}' must be a whole number between {} and {}",
            Rating::MIN,
            Rating::MAX
        ))
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, AppError> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(AppError::InvalidRequest(format!("'{key}' must be a string"))),
    }
}

fn enum_field<T>(
    fields: &Map<String, Value>,
    key: &str,
    parse: fn(&str) -> Option<T>,
    accepted: &str,
) -> Result<Option<T>, AppError> {
    let Some(raw) = text_field(fields, key)? else {
        return Ok(None);
    };
    parse(&raw).map(Some).ok_or_else(|| {
        AppError::InvalidRequest(format!(
            "'{key}' has unsupported value '{raw}' (expected one of: {accepted})"
        ))
    })
}
