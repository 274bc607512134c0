use std::collections::HashMap;

use serde_json::Value;
use wardline_contracts::InboundRequest;
use wardline_kernel::phone::normalize_phone;

use crate::error::EngineError;

/// Gateway payload dialects, told apart by their phone field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    AfricasTalking,
    Twilio,
    Msisdn,
}

struct FieldNames {
    phone: &'static str,
    session: &'static [&'static str],
    service: &'static [&'static str],
    text: &'static [&'static str],
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::AfricasTalking => "africastalking",
            Vendor::Twilio => "twilio",
            Vendor::Msisdn => "msisdn",
        }
    }

    fn detect(fields: &HashMap<String, String>) -> Option<Self> {
        [Vendor::AfricasTalking, Vendor::Twilio, Vendor::Msisdn]
            .into_iter()
            .find(|v| fields.contains_key(v.fields().phone))
    }

    fn fields(self) -> FieldNames {
        match self {
            Vendor::AfricasTalking => FieldNames {
                phone: "phoneNumber",
                session: &["sessionId"],
                service: &["serviceCode"],
                text: &["text"],
            },
            Vendor::Twilio => FieldNames {
                phone: "From",
                session: &["SessionId", "CallSid"],
                service: &["To"],
                text: &["Body"],
            },
            Vendor::Msisdn => FieldNames {
                phone: "msisdn",
                session: &["session_id", "sessionId"],
                service: &["service_code", "serviceCode"],
                text: &["ussd_string", "input"],
            },
        }
    }
}

/// Turns a raw gateway body (JSON or form-encoded) into an [`InboundRequest`]
/// with an E.164 phone number.
pub fn normalize(
    content_type: Option<&str>,
    body: &[u8],
    country_code: &str,
) -> Result<(Vendor, InboundRequest), EngineError> {
    let fields = decode_fields(content_type, body)?;
    let vendor = Vendor::detect(&fields)
        .ok_or_else(|| EngineError::MalformedRequest("no phone field".to_string()))?;
    let names = vendor.fields();

    let raw_phone = fields.get(names.phone).map(String::as_str).unwrap_or_default();
    let phone_number = normalize_phone(raw_phone, country_code).ok_or_else(|| {
        EngineError::MalformedRequest(format!("unusable {} value", names.phone))
    })?;

    let first = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| fields.get(*k))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };
    Ok((
        vendor,
        InboundRequest {
            session_id: first(names.session),
            phone_number,
            service_code: first(names.service),
            raw_text: first(names.text),
        },
    ))
}

fn decode_fields(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<HashMap<String, String>, EngineError> {
    let looks_json = match content_type {
        Some(ct) => ct.to_ascii_lowercase().contains("json"),
        None => body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{'),
    };
    if !looks_json {
        return Ok(url::form_urlencoded::parse(body).into_owned().collect());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| EngineError::MalformedRequest(format!("invalid json: {e}")))?;
    let Value::Object(map) = value else {
        return Err(EngineError::MalformedRequest(
            "json body must be an object".to_string(),
        ));
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k, text))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: Option<&str> = Some("application/x-www-form-urlencoded");
    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn africastalking_form_body() {
        let body = b"sessionId=ATUid_1&serviceCode=%2A384%2A12%23&phoneNumber=%2B254712345678&text=1%2A2";
        let (vendor, req) = normalize(FORM, body, "254").unwrap();
        assert_eq!(vendor, Vendor::AfricasTalking);
        assert_eq!(req.session_id, "ATUid_1");
        assert_eq!(req.service_code, "*384*12#");
        assert_eq!(req.phone_number, "+254712345678");
        assert_eq!(req.raw_text, "1*2");
    }

    #[test]
    fn twilio_json_body_falls_back_to_call_sid() {
        let body = br#"{"From":"0712345678","CallSid":"CA123","To":"*384#","Body":"1"}"#;
        let (vendor, req) = normalize(JSON, body, "254").unwrap();
        assert_eq!(vendor, Vendor::Twilio);
        assert_eq!(req.session_id, "CA123");
        assert_eq!(req.phone_number, "+254712345678");
        assert_eq!(req.raw_text, "1");
    }

    #[test]
    fn msisdn_numeric_phone_and_input_alias() {
        let body = br#"{"msisdn":254712345678,"session_id":"s-9","input":"2*1"}"#;
        let (vendor, req) = normalize(None, body, "254").unwrap();
        assert_eq!(vendor, Vendor::Msisdn);
        assert_eq!(req.phone_number, "+254712345678");
        assert_eq!(req.raw_text, "2*1");
        assert_eq!(req.service_code, "");
    }

    #[test]
    fn missing_text_is_fresh_session() {
        let body = br#"{"phoneNumber":"+254712345678","sessionId":"s1"}"#;
        let (_, req) = normalize(JSON, body, "254").unwrap();
        assert_eq!(req.raw_text, "");
    }

    #[test]
    fn missing_or_blank_phone_is_malformed() {
        for body in [
            &br#"{"sessionId":"s1","text":"1"}"#[..],
            &br#"{"phoneNumber":"","text":"1"}"#[..],
            &br#"{"phoneNumber":"abc","text":"1"}"#[..],
            &b"[1,2,3]"[..],
            &b"{not json"[..],
        ] {
            assert!(matches!(
                normalize(JSON, body, "254"),
                Err(EngineError::MalformedRequest(_))
            ));
        }
    }
}
