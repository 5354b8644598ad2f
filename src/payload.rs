// File: payload.rs
// Location: /src/payload.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsitePayload {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailPayload {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePayload {
    pub phone_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WifiSecurity {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WPA2")]
    Wpa2,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiSecurity {
    pub const ALL: [WifiSecurity; 4] = [
        WifiSecurity::Wpa,
        WifiSecurity::Wpa2,
        WifiSecurity::Wep,
        WifiSecurity::NoPass,
    ];

    /// Token written into the `T:` field of a WiFi payload.
    pub fn as_str(self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wpa2 => "WPA2",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "nopass",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA/WPA2",
            WifiSecurity::Wpa2 => "WPA2",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "No Password",
        }
    }

    pub fn requires_password(self) -> bool {
        self != WifiSecurity::NoPass
    }
}

impl fmt::Display for WifiSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WifiPayload {
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub security: WifiSecurity,
    #[serde(default)]
    pub hidden: bool,
}

/// Content submitted by one of the preset forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Website(WebsitePayload),
    Email(EmailPayload),
    Phone(PhonePayload),
    Wifi(WifiPayload),
}

impl Payload {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The literal string a QR code must carry for this content.
    pub fn to_qr_text(&self) -> String {
        match self {
            Payload::Website(data) => website_text(data),
            Payload::Email(data) => email_text(data),
            Payload::Phone(data) => phone_text(data),
            Payload::Wifi(data) => wifi_text(data),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Website(_) => "website",
            Payload::Email(_) => "email",
            Payload::Phone(_) => "phone",
            Payload::Wifi(_) => "wifi",
        }
    }
}

pub fn website_text(data: &WebsitePayload) -> String {
    data.url.clone()
}

pub fn email_text(data: &EmailPayload) -> String {
    let mut mailto = format!("mailto:{}", data.email);
    let mut params = Vec::new();

    if let Some(subject) = data.subject.as_deref().filter(|s| !s.is_empty()) {
        params.push(format!("subject={}", urlencoding::encode(subject)));
    }

    if let Some(body) = data.body.as_deref().filter(|s| !s.is_empty()) {
        params.push(format!("body={}", urlencoding::encode(body)));
    }

    if !params.is_empty() {
        mailto.push('?');
        mailto.push_str(&params.join("&"));
    }

    mailto
}

pub fn phone_text(data: &PhonePayload) -> String {
    format!("tel:{}", data.phone_number)
}

// WIFI:T:WPA;S:mynetwork;P:mypass;H:true;;
pub fn wifi_text(data: &WifiPayload) -> String {
    let password = if data.security.requires_password() {
        data.password.as_str()
    } else {
        ""
    };

    format!(
        "WIFI:T:{};S:{};P:{};H:{};;",
        data.security, data.ssid, password, data.hidden
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wifi(ssid: &str, password: &str, security: WifiSecurity, hidden: bool) -> WifiPayload {
        WifiPayload {
            ssid: ssid.to_string(),
            password: password.to_string(),
            security,
            hidden,
        }
    }

    #[test]
    fn test_wifi_wpa() {
        let data = wifi("MyNet", "secret", WifiSecurity::Wpa, false);
        assert_eq!(wifi_text(&data), "WIFI:T:WPA;S:MyNet;P:secret;H:false;;");
    }

    #[test]
    fn test_wifi_hidden_wep() {
        let data = wifi("Lab", "abcde", WifiSecurity::Wep, true);
        assert_eq!(wifi_text(&data), "WIFI:T:WEP;S:Lab;P:abcde;H:true;;");
    }

    #[test]
    fn test_wifi_nopass_drops_password() {
        let data = wifi("Cafe", "leftover-password", WifiSecurity::NoPass, true);
        assert_eq!(wifi_text(&data), "WIFI:T:nopass;S:Cafe;P:;H:true;;");
    }

    #[test]
    fn test_email_address_only() {
        let data = EmailPayload {
            email: "someone@example.com".to_string(),
            ..EmailPayload::default()
        };
        assert_eq!(email_text(&data), "mailto:someone@example.com");
    }

    #[test]
    fn test_email_subject_is_percent_encoded() {
        let data = EmailPayload {
            email: "someone@example.com".to_string(),
            subject: Some("Hello World & more?".to_string()),
            body: None,
        };
        assert_eq!(
            email_text(&data),
            "mailto:someone@example.com?subject=Hello%20World%20%26%20more%3F"
        );
    }

    #[test]
    fn test_email_subject_and_body() {
        let data = EmailPayload {
            email: "a@b.io".to_string(),
            subject: Some("Hi".to_string()),
            body: Some("line one\nline two".to_string()),
        };
        assert_eq!(
            email_text(&data),
            "mailto:a@b.io?subject=Hi&body=line%20one%0Aline%20two"
        );
    }

    #[test]
    fn test_email_body_only() {
        let data = EmailPayload {
            email: "a@b.io".to_string(),
            subject: Some(String::new()),
            body: Some("x=y".to_string()),
        };
        assert_eq!(email_text(&data), "mailto:a@b.io?body=x%3Dy");
    }

    #[test]
    fn test_phone_and_website_pass_through() {
        let phone = PhonePayload {
            phone_number: "+1 (555) 010-9999".to_string(),
        };
        assert_eq!(phone_text(&phone), "tel:+1 (555) 010-9999");

        let site = WebsitePayload {
            url: "https://example.com/a?b=c d".to_string(),
        };
        assert_eq!(website_text(&site), "https://example.com/a?b=c d");
    }

    #[test]
    fn test_payload_from_form_json() {
        let payload =
            Payload::from_json(r#"{"type":"phone","phoneNumber":"555-0100"}"#).unwrap();
        assert_eq!(payload.kind(), "phone");
        assert_eq!(payload.to_qr_text(), "tel:555-0100");

        let payload = Payload::from_json(
            r#"{"type":"wifi","ssid":"MyNet","password":"pw","security":"nopass","hidden":false}"#,
        )
        .unwrap();
        assert_eq!(payload.to_qr_text(), "WIFI:T:nopass;S:MyNet;P:;H:false;;");
    }

    #[test]
    fn test_payload_json_rejects_unknown_security() {
        let result = Payload::from_json(
            r#"{"type":"wifi","ssid":"MyNet","password":"pw","security":"WPA3","hidden":false}"#,
        );
        assert!(result.is_err());
    }
}
