use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role carried inside the identity token. Immutable per identity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Registered service categories. Closed enum, extended here when a new
/// category of backend is onboarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "SUD")]
    Sud,
    #[serde(rename = "NER")]
    Ner,
}

impl ServiceType {
    pub const ALL: [ServiceType; 2] = [ServiceType::Sud, ServiceType::Ner];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Sud => "SUD",
            ServiceType::Ner => "NER",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUD" => Ok(ServiceType::Sud),
            "NER" => Ok(ServiceType::Ner),
            other => Err(format!("unknown service type '{other}'")),
        }
    }
}

/// HTTP methods an endpoint may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 4] =
        [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unknown HTTP method '{other}'")),
        }
    }
}

/// Upload formats a non-text-based endpoint may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadFormat {
    Image,
    Audio,
    Video,
}

impl UploadFormat {
    pub const ALL: [UploadFormat; 3] =
        [UploadFormat::Image, UploadFormat::Audio, UploadFormat::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFormat::Image => "IMAGE",
            UploadFormat::Audio => "AUDIO",
            UploadFormat::Video => "VIDEO",
        }
    }
}

impl FromStr for UploadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMAGE" => Ok(UploadFormat::Image),
            "AUDIO" => Ok(UploadFormat::Audio),
            "VIDEO" => Ok(UploadFormat::Video),
            other => Err(format!("unknown upload format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn service_type_is_case_sensitive() {
        assert_eq!("SUD".parse::<ServiceType>().unwrap(), ServiceType::Sud);
        assert!("sud".parse::<ServiceType>().is_err());
    }

    #[test]
    fn http_method_parses_closed_set() {
        for m in HttpMethod::ALL {
            assert_eq!(m.as_str().parse::<HttpMethod>().unwrap(), m);
        }
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }
}
