use chrono::Utc;
use serde_json::json;

use crate::ipc::error::err;
use crate::token::{Claims, TokenError, TokenSigner};

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> HandlerErr {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn internal(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "internal",
        message: format!("{e:?}"),
        details: None,
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Extracts `params.token` and validates it. Token failures pass through as
/// their own error codes so every identity-gated method reports them the
/// same way.
pub fn claims_from_params(
    signer: &TokenSigner,
    params: &serde_json::Value,
) -> Result<Claims, HandlerErr> {
    let token = get_required_str(params, "token")?;
    signer.validate(&token, Utc::now()).map_err(|e| match e {
        TokenError::Invalid => HandlerErr::new("invalid_credential", "invalid token"),
        TokenError::Expired => HandlerErr::new("expired", "token has expired"),
    })
}

/// Month filter key: "MM" (any year) or "YYYY-MM".
pub fn parse_month_key(month: &str) -> Result<(Option<i32>, u32), HandlerErr> {
    let t = month.trim();
    if let Ok(m) = t.parse::<u32>() {
        if (1..=12).contains(&m) {
            return Ok((None, m));
        }
        return Err(HandlerErr::new(
            "bad_params",
            "month must be between 01 and 12",
        ));
    }
    let Some((y, m)) = t.split_once('-') else {
        return Err(HandlerErr::new("bad_params", "month must be MM or YYYY-MM"));
    };
    let year = y
        .parse::<i32>()
        .map_err(|_| HandlerErr::new("bad_params", "month year must be numeric"))?;
    let month_num = m
        .parse::<u32>()
        .map_err(|_| HandlerErr::new("bad_params", "month must be YYYY-MM"))?;
    if !(1..=12).contains(&month_num) {
        return Err(HandlerErr::new(
            "bad_params",
            "month must be between 01 and 12",
        ));
    }
    Ok((Some(year), month_num))
}

pub fn band_json(percent: f64) -> serde_json::Value {
    json!(crate::stats::attendance_band(percent).label())
}
