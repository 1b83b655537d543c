//! Input validation shared by the registry and the dispatcher.

use crate::errors::ServiceError;
use models::types::{HttpMethod, ServiceType, UploadFormat};
use serde_json::{Map, Value};

/// Primitive types an option schema may declare for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    String,
    Number,
    Boolean,
}

impl OptionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn name_of(value: &Value) -> &'static str {
        match value {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Version labels are the letter `v` followed by a whole number.
pub fn validate_version(version: &str) -> Result<u32, ServiceError> {
    let digits = version.strip_prefix('v').ok_or_else(|| {
        ServiceError::BadRequest(format!(
            "Invalid version format '{version}'. Expected 'v' followed by a whole number."
        ))
    })?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::BadRequest(format!(
            "Invalid version format '{version}'. Expected 'v' followed by a whole number."
        )));
    }
    digits.parse::<u32>().map_err(|_| {
        ServiceError::BadRequest(format!("Invalid version format '{version}'. Number too large."))
    })
}

/// Base addresses are opaque URLs; reject the shapes that would break
/// path concatenation at dispatch time.
pub fn validate_address(address: &str) -> Result<(), ServiceError> {
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(ServiceError::BadRequest(
            "Invalid base address. Expected a URL without whitespace.".into(),
        ));
    }
    if address.ends_with('/') {
        return Err(ServiceError::BadRequest(
            "Invalid base address. Trailing slash is not allowed.".into(),
        ));
    }
    Ok(())
}

pub fn parse_service_type(raw: &str) -> Result<ServiceType, ServiceError> {
    raw.parse::<ServiceType>().map_err(|_| {
        let valid: Vec<&str> = ServiceType::ALL.iter().map(|t| t.as_str()).collect();
        ServiceError::BadRequest(format!(
            "Invalid service type '{raw}'. Valid types are: {}.",
            valid.join(", ")
        ))
    })
}

pub fn parse_method(raw: &str) -> Result<HttpMethod, ServiceError> {
    raw.parse::<HttpMethod>().map_err(|_| {
        let valid: Vec<&str> = HttpMethod::ALL.iter().map(|m| m.as_str()).collect();
        ServiceError::BadRequest(format!(
            "Invalid endpoint method '{raw}'. Valid methods are: {}.",
            valid.join(", ")
        ))
    })
}

/// Endpoint definition as supplied on service registration or endpoint
/// creation, before it is persisted.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub endpoint_path: String,
    pub method: HttpMethod,
    pub task: String,
    pub text_based: bool,
    pub options: Option<Map<String, Value>>,
    pub supported_formats: Option<Vec<String>>,
}

pub fn validate_endpoint_spec(spec: &EndpointSpec) -> Result<(), ServiceError> {
    if !spec.endpoint_path.starts_with('/') {
        return Err(ServiceError::BadRequest(format!(
            "Invalid endpoint path '{}'. Paths must start with '/'.",
            spec.endpoint_path
        )));
    }
    if spec.task.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "Endpoint task must not be empty.".into(),
        ));
    }
    if spec.text_based {
        let options = spec.options.as_ref().ok_or_else(|| {
            ServiceError::BadRequest(
                "Text based endpoints must declare an options schema.".into(),
            )
        })?;
        for (key, declared) in options {
            let name = declared.as_str().and_then(OptionType::from_name);
            if name.is_none() {
                return Err(ServiceError::BadRequest(format!(
                    "Invalid option type for '{key}'. Valid types are: string, number, boolean."
                )));
            }
        }
    } else {
        let formats = spec.supported_formats.as_ref().filter(|f| !f.is_empty());
        let formats = formats.ok_or_else(|| {
            ServiceError::BadRequest(
                "Non text based endpoints must declare supported upload formats.".into(),
            )
        })?;
        for format in formats {
            if format.parse::<UploadFormat>().is_err() {
                let valid: Vec<&str> = UploadFormat::ALL.iter().map(|f| f.as_str()).collect();
                return Err(ServiceError::BadRequest(format!(
                    "Invalid upload format '{format}'. Valid formats are: {}.",
                    valid.join(", ")
                )));
            }
        }
    }
    Ok(())
}

/// Check supplied options against the declared schema: the key sets must
/// match exactly and every value must be of the declared primitive type.
pub fn validate_options(
    declared: &Map<String, Value>,
    supplied: &Map<String, Value>,
) -> Result<(), ServiceError> {
    let mismatch = declared.len() != supplied.len()
        || declared.keys().any(|k| !supplied.contains_key(k));
    if mismatch {
        return Err(ServiceError::SchemaMismatch {
            message: "Options do not match the pre-defined options for this endpoint.".into(),
            expected: Value::Object(declared.clone()),
        });
    }
    for (key, declared_type) in declared {
        // Stored schemas are validated on write, so the type name is known.
        let expected = declared_type
            .as_str()
            .and_then(OptionType::from_name)
            .ok_or_else(|| {
                ServiceError::Db(format!("corrupt option schema for key '{key}'"))
            })?;
        let value = &supplied[key];
        if !expected.matches(value) {
            return Err(ServiceError::SchemaMismatch {
                message: format!(
                    "Invalid value type for option '{key}'. Expected '{}', but received '{}'.",
                    expected.as_str(),
                    OptionType::name_of(value)
                ),
                expected: Value::Object(declared.clone()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Value::String((*v).to_owned())))
            .collect()
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn version_labels_accept_whole_numbers_only() {
        assert_eq!(validate_version("v1").unwrap(), 1);
        assert_eq!(validate_version("v0").unwrap(), 0);
        assert_eq!(validate_version("v12").unwrap(), 12);
        assert!(validate_version("1").is_err());
        assert!(validate_version("v1.5").is_err());
        assert!(validate_version("v").is_err());
        assert!(validate_version("vx").is_err());
        assert!(validate_version("v-1").is_err());
    }

    #[test]
    fn address_rejects_whitespace_and_trailing_slash() {
        assert!(validate_address("http://10.0.0.4:5000").is_ok());
        assert!(validate_address("http://10.0.0.4:5000/").is_err());
        assert!(validate_address("http://bad host").is_err());
        assert!(validate_address("").is_err());
    }

    #[test]
    fn service_type_parse_is_closed() {
        assert!(parse_service_type("SUD").is_ok());
        assert!(parse_service_type("NER").is_ok());
        assert!(parse_service_type("OCR").is_err());
    }

    fn text_spec(options: Map<String, Value>) -> EndpointSpec {
        EndpointSpec {
            endpoint_path: "/predict".into(),
            method: HttpMethod::Post,
            task: "sentiment".into(),
            text_based: true,
            options: Some(options),
            supported_formats: None,
        }
    }

    #[test]
    fn endpoint_spec_requires_leading_slash() {
        let mut spec = text_spec(schema(&[("message", "string")]));
        spec.endpoint_path = "predict".into();
        assert!(validate_endpoint_spec(&spec).is_err());
    }

    #[test]
    fn endpoint_spec_rejects_unknown_option_type() {
        let spec = text_spec(schema(&[("message", "text")]));
        assert!(validate_endpoint_spec(&spec).is_err());
    }

    #[test]
    fn non_text_endpoint_requires_known_formats() {
        let mut spec = text_spec(Map::new());
        spec.text_based = false;
        spec.options = None;
        assert!(validate_endpoint_spec(&spec).is_err());

        spec.supported_formats = Some(vec!["IMAGE".into(), "AUDIO".into()]);
        assert!(validate_endpoint_spec(&spec).is_ok());

        spec.supported_formats = Some(vec!["GIF".into()]);
        assert!(validate_endpoint_spec(&spec).is_err());
    }

    #[test]
    fn options_must_match_key_set_exactly() {
        let declared = schema(&[("message", "string"), ("limit", "number")]);

        let ok = as_map(json!({"message": "hi", "limit": 3}));
        assert!(validate_options(&declared, &ok).is_ok());

        let missing = as_map(json!({"message": "hi"}));
        assert!(matches!(
            validate_options(&declared, &missing),
            Err(ServiceError::SchemaMismatch { .. })
        ));

        let extra = as_map(json!({"message": "hi", "limit": 3, "lang": "en"}));
        assert!(matches!(
            validate_options(&declared, &extra),
            Err(ServiceError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn option_values_are_type_checked() {
        let declared = schema(&[("message", "string"), ("verbose", "boolean")]);
        let wrong = as_map(json!({"message": 42, "verbose": true}));
        let err = validate_options(&declared, &wrong).unwrap_err();
        match err {
            ServiceError::SchemaMismatch { message, expected } => {
                assert!(message.contains("'message'"));
                assert!(message.contains("'string'"));
                assert!(message.contains("'number'"));
                assert_eq!(expected, json!({"message": "string", "verbose": "boolean"}));
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
