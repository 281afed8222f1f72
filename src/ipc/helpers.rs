use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::map::{Grade, GrowthError, NormLookupError, NormSetError, Subject, Term};
use rusqlite::Connection;
use serde_json::Value;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<NormLookupError> for HandlerErr {
    fn from(e: NormLookupError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<GrowthError> for HandlerErr {
    fn from(e: GrowthError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<NormSetError> for HandlerErr {
    fn from(e: NormSetError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

pub fn respond(req: &Request, res: Result<Value, HandlerErr>) -> Value {
    match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn required_f64(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    v.as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key)))
}

pub fn optional_f64(params: &Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_f64(params, key).map(Some),
    }
}

pub fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn parse_grade_value(v: &Value) -> Option<Grade> {
    match v {
        Value::Number(n) => n.as_i64().and_then(Grade::from_i64),
        Value::String(s) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("k") {
                Grade::new(0)
            } else {
                t.parse::<i64>().ok().and_then(Grade::from_i64)
            }
        }
        _ => None,
    }
}

/// Comma-separated wire names, for "must be one of" messages.
pub fn choices<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> String {
    all.iter().map(|v| name(*v)).collect::<Vec<_>>().join(", ")
}

pub fn required_grade(params: &Value) -> Result<Grade, HandlerErr> {
    params
        .get("grade")
        .and_then(parse_grade_value)
        .ok_or_else(|| {
            HandlerErr::bad_params(format!(
                "grade must be K or an integer in 0..={}",
                Grade::MAX
            ))
        })
}

pub fn required_term(params: &Value, key: &str) -> Result<Term, HandlerErr> {
    Term::parse(required_str(params, key)?).ok_or_else(|| {
        HandlerErr::bad_params(format!(
            "{} must be one of: {}",
            key,
            choices(&Term::ALL, Term::as_str)
        ))
    })
}

pub fn required_subject(params: &Value) -> Result<Subject, HandlerErr> {
    Subject::parse(required_str(params, "subject")?).ok_or_else(|| {
        HandlerErr::bad_params(format!(
            "subject must be one of: {}",
            choices(&Subject::ALL, Subject::as_str)
        ))
    })
}

pub fn academic_year(params: &Value) -> Option<&str> {
    optional_str(params, "academicYear")
}
