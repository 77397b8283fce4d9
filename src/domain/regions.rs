//! Regions partition the marketplace: every catalogue listing is visible in
//! one or more regions, and each request is served in the scope of at most
//! one region.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;

const MAX_CODE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub currency: String,
    pub currency_symbol: String,
    pub timezone: String,
    pub country_code: String,
    pub is_active: bool,
    pub default_tax_rate: String,
    pub support_email: String,
    pub support_phone: String,
}

/// Normalize a caller-supplied region code (`uk ` -> `UK`).
///
/// Returns `None` for blank input and for values longer than any stored code.
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CODE_LEN {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingValueType {
    String,
    Integer,
    Float,
    Boolean,
    Json,
}

impl SettingValueType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Key/value configuration scoped to a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalSetting {
    pub id: i64,
    pub region_id: i64,
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: String,
}

impl RegionalSetting {
    /// Interpret the stored text according to `value_type`.
    pub fn typed_value(&self) -> Result<Value, DomainError> {
        let raw = self.value.trim();
        match self.value_type {
            SettingValueType::String => Ok(Value::String(self.value.clone())),
            SettingValueType::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| self.invalid(err)),
            SettingValueType::Float => raw
                .parse::<f64>()
                .map(Value::from)
                .map_err(|err| self.invalid(err)),
            SettingValueType::Boolean => Ok(Value::Bool(matches!(
                raw.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            ))),
            SettingValueType::Json => serde_json::from_str(raw).map_err(|err| self.invalid(err)),
        }
    }

    fn invalid(&self, err: impl std::fmt::Display) -> DomainError {
        DomainError::validation(format!(
            "regional setting `{}` is not a valid {:?}: {err}",
            self.key, self.value_type
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(value: &str, value_type: SettingValueType) -> RegionalSetting {
        RegionalSetting {
            id: 1,
            region_id: 1,
            key: "booking_window_days".to_string(),
            value: value.to_string(),
            value_type,
            description: String::new(),
        }
    }

    #[test]
    fn normalize_code_uppercases_and_trims() {
        assert_eq!(normalize_code(" uae "), Some("UAE".to_string()));
        assert_eq!(normalize_code("UK"), Some("UK".to_string()));
    }

    #[test]
    fn normalize_code_rejects_blank_and_oversized() {
        assert_eq!(normalize_code("   "), None);
        assert_eq!(normalize_code("abcdefghijk"), None);
    }

    #[test]
    fn typed_values_follow_declared_type() {
        assert_eq!(
            setting("14", SettingValueType::Integer).typed_value().unwrap(),
            Value::from(14)
        );
        assert_eq!(
            setting("Yes", SettingValueType::Boolean)
                .typed_value()
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            setting("off", SettingValueType::Boolean)
                .typed_value()
                .unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            setting(r#"{"vat": true}"#, SettingValueType::Json)
                .typed_value()
                .unwrap()["vat"],
            Value::Bool(true)
        );
    }

    #[test]
    fn malformed_integer_is_a_validation_error() {
        let err = setting("fourteen", SettingValueType::Integer)
            .typed_value()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
