// File: forms.rs
// Location: /src/forms.rs

use crate::payload::{EmailPayload, Payload, PhonePayload, WebsitePayload, WifiPayload};

/// A rejected form field and the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<&str> = errors.iter().map(|e| e.message).collect();
    messages.join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn for_field(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn validate(payload: &Payload) -> Result<(), ValidationErrors> {
    match payload {
        Payload::Website(data) => validate_website(data),
        Payload::Email(data) => validate_email(data),
        Payload::Phone(data) => validate_phone(data),
        Payload::Wifi(data) => validate_wifi(data),
    }
}

pub fn validate_website(data: &WebsitePayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if data.url.is_empty() {
        errors.push("url", "URL is required");
    } else if !is_http_url(&data.url) {
        errors.push(
            "url",
            "Please enter a valid URL starting with http:// or https://",
        );
    }
    errors.into_result()
}

pub fn validate_email(data: &EmailPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if data.email.is_empty() {
        errors.push("email", "Email is required");
    } else if !is_email_address(&data.email) {
        errors.push("email", "Invalid email address");
    }
    errors.into_result()
}

pub fn validate_phone(data: &PhonePayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if data.phone_number.is_empty() {
        errors.push("phoneNumber", "Phone number is required");
    } else if !is_phone_number(&data.phone_number) {
        errors.push("phoneNumber", "Please enter a valid phone number");
    }
    errors.into_result()
}

pub fn validate_wifi(data: &WifiPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if data.ssid.is_empty() {
        errors.push("ssid", "Network name is required");
    }
    if data.security.requires_password() && data.password.is_empty() {
        errors.push("password", "Password is required for secured networks");
    }
    errors.into_result()
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let rest = if let Some(rest) = lower.strip_prefix("https://") {
        rest
    } else if let Some(rest) = lower.strip_prefix("http://") {
        rest
    } else {
        return false;
    };

    matches!(rest.chars().next(), Some(c) if c != '\n' && c != '\r')
}

// [A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}, case-insensitive
fn is_email_address(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if !local_ok {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    host_ok && tld_ok
}

// [+]?[(]?[0-9]{1,4}[)]?[-\s./0-9]*
fn is_phone_number(value: &str) -> bool {
    let mut rest = value;
    rest = rest.strip_prefix('+').unwrap_or(rest);
    rest = rest.strip_prefix('(').unwrap_or(rest);

    let digits = rest
        .chars()
        .take(4)
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return false;
    }
    rest = &rest[digits..];
    rest = rest.strip_prefix(')').unwrap_or(rest);

    rest.chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || "-./".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::WifiSecurity;

    #[test]
    fn test_website_requires_scheme() {
        let ok = WebsitePayload {
            url: "HTTPS://example.com".to_string(),
        };
        assert!(validate_website(&ok).is_ok());

        let missing = WebsitePayload { url: String::new() };
        let err = validate_website(&missing).unwrap_err();
        assert_eq!(err.for_field("url"), Some("URL is required"));

        let bare = WebsitePayload {
            url: "example.com".to_string(),
        };
        assert!(validate_website(&bare).is_err());

        let empty_host = WebsitePayload {
            url: "http://".to_string(),
        };
        assert!(validate_website(&empty_host).is_err());
    }

    #[test]
    fn test_email_addresses() {
        let check = |email: &str| {
            validate_email(&EmailPayload {
                email: email.to_string(),
                ..EmailPayload::default()
            })
            .is_ok()
        };

        assert!(check("someone@example.com"));
        assert!(check("first.last+tag@mail.example.co"));
        assert!(!check("someone@example"));
        assert!(!check("someone@example.c"));
        assert!(!check("@example.com"));
        assert!(!check("a@b@example.com"));
        assert!(!check("some one@example.com"));
    }

    #[test]
    fn test_phone_numbers() {
        let check = |number: &str| {
            validate_phone(&PhonePayload {
                phone_number: number.to_string(),
            })
            .is_ok()
        };

        assert!(check("+1 555-010-9999"));
        assert!(check("(555) 010-9999"));
        assert!(check("(030) 1234.5678"));
        assert!(check("5550100"));
        assert!(!check("call me"));
        assert!(!check("+"));
        assert!(!check("(12345)"));
        assert!(!check("+1 (555) 010-9999"));

        let err = validate_phone(&PhonePayload {
            phone_number: String::new(),
        })
        .unwrap_err();
        assert_eq!(err.for_field("phoneNumber"), Some("Phone number is required"));
    }

    #[test]
    fn test_wifi_password_rules() {
        let mut data = WifiPayload {
            ssid: String::new(),
            password: String::new(),
            security: WifiSecurity::Wpa2,
            hidden: false,
        };
        let err = validate_wifi(&data).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.for_field("ssid"), Some("Network name is required"));
        assert_eq!(
            err.for_field("password"),
            Some("Password is required for secured networks")
        );

        data.ssid = "Cafe".to_string();
        data.security = WifiSecurity::NoPass;
        assert!(validate_wifi(&data).is_ok());
    }

    #[test]
    fn test_validate_dispatches_on_payload() {
        let payload = Payload::Website(WebsitePayload {
            url: "ftp://example.com".to_string(),
        });
        let err = validate(&payload).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }
}
