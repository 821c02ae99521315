//! Declarative payload schemas.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. [`Schema::clean`] turns an
//! untrusted JSON payload into a [`Record`] holding only declared fields, with
//! values normalised for the storage layer (trimmed strings, quantised
//! decimals as strings, ISO dates), plus one [`FieldError`] per failing field.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use crudkit_db::Record;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::error::FieldError;
use crate::messages::{self, codes};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Char,
    Email,
    Choice(&'static [&'static str]),
    Integer,
    Decimal { max_digits: u32, decimal_places: u32 },
    Date,
    Boolean,
    CharList,
    Json,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    ty: FieldType,
    required: bool,
    nullable: bool,
    default: Option<Value>,
    max_length: Option<usize>,
    min_length: Option<usize>,
    allow_blank: bool,
    min_value: Option<i64>,
    max_value: Option<i64>,
    allow_empty: bool,
}

type Failure = (&'static str, String);

fn fail(code: &'static str, message: impl Into<String>) -> Failure {
    (code, message.into())
}

impl FieldSpec {
    fn of(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            nullable: false,
            default: None,
            max_length: None,
            min_length: None,
            allow_blank: false,
            min_value: None,
            max_value: None,
            allow_empty: true,
        }
    }

    pub fn char(name: &'static str) -> Self {
        Self::of(name, FieldType::Char)
    }

    pub fn email(name: &'static str) -> Self {
        Self::of(name, FieldType::Email)
    }

    pub fn choice(name: &'static str, choices: &'static [&'static str]) -> Self {
        Self::of(name, FieldType::Choice(choices))
    }

    pub fn integer(name: &'static str) -> Self {
        Self::of(name, FieldType::Integer)
    }

    pub fn decimal(name: &'static str, max_digits: u32, decimal_places: u32) -> Self {
        Self::of(
            name,
            FieldType::Decimal {
                max_digits,
                decimal_places,
            },
        )
    }

    pub fn date(name: &'static str) -> Self {
        Self::of(name, FieldType::Date)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::of(name, FieldType::Boolean)
    }

    pub fn char_list(name: &'static str) -> Self {
        Self::of(name, FieldType::CharList)
    }

    pub fn json(name: &'static str) -> Self {
        Self::of(name, FieldType::Json)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the field is absent from a full (non-partial) payload.
    pub fn default(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    pub fn min_value(mut self, n: i64) -> Self {
        self.min_value = Some(n);
        self
    }

    pub fn max_value(mut self, n: i64) -> Self {
        self.max_value = Some(n);
        self
    }

    /// Reject `[]` for list fields.
    pub fn non_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn validate(&self, v: &Value) -> Result<Value, Vec<FieldError>> {
        let single = |(code, message): Failure| {
            vec![FieldError::new(self.name, code, message).with_user_value(v)]
        };
        match self.ty {
            FieldType::Char => self.clean_char(v).map(Value::String).map_err(single),
            FieldType::Email => self.clean_email(v).map(Value::String).map_err(single),
            FieldType::Choice(choices) => self.clean_choice(choices, v).map_err(single),
            FieldType::Integer => self.clean_integer(v).map(Value::from).map_err(single),
            FieldType::Decimal {
                max_digits,
                decimal_places,
            } => clean_decimal(v, max_digits, decimal_places)
                .map(|d| Value::String(d.to_string()))
                .map_err(single),
            FieldType::Date => clean_date(v).map(Value::String).map_err(single),
            FieldType::Boolean => clean_bool(v).map(Value::Bool).map_err(single),
            FieldType::CharList => self.clean_char_list(v),
            FieldType::Json => Ok(v.clone()),
        }
    }

    fn clean_char(&self, v: &Value) -> Result<String, Failure> {
        let s = match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err(fail(codes::INVALID, "Not a valid string.")),
        };
        if s.is_empty() {
            return if self.allow_blank {
                Ok(s)
            } else {
                Err(fail(codes::BLANK, messages::BLANK))
            };
        }
        let len = s.chars().count();
        if let Some(max) = self.max_length {
            if len > max {
                return Err(fail(
                    codes::MAX_LENGTH,
                    format!("Ensure this field has no more than {max} characters."),
                ));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(fail(
                    codes::MIN_LENGTH,
                    format!("Ensure this field has at least {min} characters."),
                ));
            }
        }
        Ok(s)
    }

    fn clean_email(&self, v: &Value) -> Result<String, Failure> {
        static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
        let s = self.clean_char(v)?;
        if s.is_empty() {
            return Ok(s);
        }
        let valid = EMAIL
            .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(&s));
        if valid {
            Ok(s)
        } else {
            Err(fail(codes::INVALID, "Enter a valid email address."))
        }
    }

    fn clean_choice(&self, choices: &[&str], v: &Value) -> Result<Value, Failure> {
        let s = match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        if s.is_empty() && self.allow_blank {
            return Ok(Value::String(s));
        }
        if choices.contains(&s.as_str()) {
            Ok(Value::String(s))
        } else {
            Err(fail(
                codes::INVALID_CHOICE,
                format!("\"{s}\" is not a valid choice."),
            ))
        }
    }

    fn clean_integer(&self, v: &Value) -> Result<i64, Failure> {
        let whole = |f: f64| (f.fract() == 0.0 && f.is_finite()).then_some(f as i64);
        let n = match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
            _ => None,
        }
        .ok_or_else(|| fail(codes::INVALID, "A valid integer is required."))?;

        if let Some(min) = self.min_value {
            if n < min {
                return Err(fail(
                    codes::MIN_VALUE,
                    format!("Ensure this value is greater than or equal to {min}."),
                ));
            }
        }
        if let Some(max) = self.max_value {
            if n > max {
                return Err(fail(
                    codes::MAX_VALUE,
                    format!("Ensure this value is less than or equal to {max}."),
                ));
            }
        }
        Ok(n)
    }

    fn clean_char_list(&self, v: &Value) -> Result<Value, Vec<FieldError>> {
        let Value::Array(items) = v else {
            return Err(vec![FieldError::new(
                self.name,
                codes::NOT_A_LIST,
                format!(
                    "Expected a list of items but got type \"{}\".",
                    input_type(v)
                ),
            )
            .with_user_value(v)]);
        };
        if items.is_empty() && !self.allow_empty {
            return Err(vec![FieldError::new(
                self.name,
                codes::EMPTY,
                messages::EMPTY_LIST,
            )]);
        }

        let child = FieldSpec {
            allow_blank: false,
            ..self.clone()
        };
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            match child.clean_char(item) {
                Ok(s) => out.push(Value::String(s)),
                Err((code, message)) => errors.push(
                    FieldError::new(idx.to_string(), code, message)
                        .with_user_value(item)
                        .nested_under(self.name),
                ),
            }
        }
        if errors.is_empty() {
            Ok(Value::Array(out))
        } else {
            Err(errors)
        }
    }
}

fn input_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn clean_decimal(v: &Value, max_digits: u32, decimal_places: u32) -> Result<Decimal, Failure> {
    let invalid = || fail(codes::INVALID, "A valid number is required.");
    let raw = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid()),
    };
    let d = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| invalid())?;

    let digits = d.mantissa().unsigned_abs().to_string().len() as u32;
    let scale = d.scale();
    let (total, whole, places) = if scale == 0 {
        (digits, digits, 0)
    } else if digits > scale {
        (digits, digits - scale, scale)
    } else {
        (scale, 0, scale)
    };

    if total > max_digits {
        return Err(fail(
            codes::MAX_DIGITS,
            format!("Ensure that there are no more than {max_digits} digits in total."),
        ));
    }
    if places > decimal_places {
        return Err(fail(
            codes::MAX_DECIMAL_PLACES,
            format!("Ensure that there are no more than {decimal_places} decimal places."),
        ));
    }
    let max_whole = max_digits.saturating_sub(decimal_places);
    if whole > max_whole {
        return Err(fail(
            codes::MAX_WHOLE_DIGITS,
            format!("Ensure that there are no more than {max_whole} digits before the decimal point."),
        ));
    }

    let mut q = d.round_dp(decimal_places);
    q.rescale(decimal_places);
    Ok(q)
}

fn clean_date(v: &Value) -> Result<String, Failure> {
    let invalid = || {
        fail(
            codes::INVALID,
            "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
        )
    };
    match v {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(|d| d.to_string())
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn clean_bool(v: &Value) -> Result<bool, Failure> {
    const TRUE: &[&str] = &["t", "y", "yes", "true", "on", "1"];
    const FALSE: &[&str] = &["f", "n", "no", "false", "off", "0"];
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::String(s) if TRUE.contains(&s.to_lowercase().as_str()) => Ok(true),
        Value::String(s) if FALSE.contains(&s.to_lowercase().as_str()) => Ok(false),
        _ => Err(fail(codes::INVALID, "Must be a valid boolean.")),
    }
}

/// Ordered set of field specs.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// `page` and `page_size` (both ≥ 1, defaults 1 and 10) plus a free-text `search`.
    pub fn pagination() -> Self {
        Self::new()
            .field(FieldSpec::integer("page").min_value(1).default(json!(1)))
            .field(
                FieldSpec::integer("page_size")
                    .min_value(1)
                    .default(json!(10)),
            )
            .field(FieldSpec::char("search").optional().allow_blank())
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Validates `input` against the schema. With `partial`, absent fields are
    /// skipped instead of being defaulted or reported as required.
    pub fn clean(&self, input: &Value, partial: bool) -> (Record, Vec<FieldError>) {
        let mut out = Record::new();
        let mut errors = Vec::new();

        let Value::Object(map) = input else {
            errors.push(FieldError::new(
                NON_FIELD_ERRORS,
                codes::INVALID,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    input_type(input)
                ),
            ));
            return (out, errors);
        };

        for spec in &self.fields {
            match map.get(spec.name) {
                None if partial => {}
                None => {
                    if let Some(d) = &spec.default {
                        out.insert(spec.name.to_string(), d.clone());
                    } else if spec.required {
                        errors.push(FieldError::new(
                            spec.name,
                            codes::REQUIRED,
                            messages::REQUIRED,
                        ));
                    }
                }
                Some(Value::Null) if spec.nullable => {
                    out.insert(spec.name.to_string(), Value::Null);
                }
                Some(Value::Null) => {
                    errors.push(FieldError::new(spec.name, codes::NULL, messages::NULL));
                }
                Some(v) => match spec.validate(v) {
                    Ok(clean) => {
                        out.insert(spec.name.to_string(), clean);
                    }
                    Err(errs) => errors.extend(errs),
                },
            }
        }
        (out, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Schema {
        Schema::new()
            .field(FieldSpec::choice("customer_type", &["BUSINESS", "INDIVIDUAL"]))
            .field(FieldSpec::char("first_name").max_length(5).optional().allow_blank())
            .field(FieldSpec::email("email").max_length(100))
            .field(FieldSpec::decimal("rate", 10, 2).optional())
    }

    fn codes_of(errors: &[FieldError]) -> Vec<(&str, &str)> {
        errors
            .iter()
            .map(|e| (e.field.as_str(), e.code.as_str()))
            .collect()
    }

    #[test]
    fn required_and_unknown_keys() {
        let (data, errors) = customer().clean(&json!({"nickname": "x"}), false);
        assert!(data.is_empty());
        assert_eq!(
            codes_of(&errors),
            vec![("customer_type", "REQUIRED"), ("email", "REQUIRED")]
        );
        assert_eq!(errors[0].message, "This field is required.");
    }

    #[test]
    fn partial_skips_absent_fields() {
        let (data, errors) = customer().clean(&json!({"first_name": "  Ann "}), true);
        assert!(errors.is_empty());
        assert_eq!(data.get("first_name"), Some(&json!("Ann")));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn length_and_choice_messages() {
        let (_, errors) = customer().clean(
            &json!({"customer_type": "SHOP", "first_name": "Alexander", "email": "a@b.io"}),
            false,
        );
        assert_eq!(
            codes_of(&errors),
            vec![("customer_type", "INVALID_CHOICE"), ("first_name", "MAX_LENGTH")]
        );
        assert_eq!(errors[0].message, "\"SHOP\" is not a valid choice.");
        assert_eq!(errors[0].user_value, Some(json!("SHOP")));
        assert_eq!(errors[1].max_limit, Some(5));
    }

    #[test]
    fn blank_and_null() {
        let schema = Schema::new()
            .field(FieldSpec::char("title"))
            .field(FieldSpec::char("note").nullable());
        let (data, errors) = schema.clean(&json!({"title": "   ", "note": null}), false);
        assert_eq!(codes_of(&errors), vec![("title", "BLANK")]);
        assert_eq!(data.get("note"), Some(&Value::Null));

        let (_, errors) = schema.clean(&json!({"title": null}), true);
        assert_eq!(codes_of(&errors), vec![("title", "NULL")]);
    }

    #[test]
    fn email_format() {
        let (_, errors) = customer().clean(
            &json!({"customer_type": "BUSINESS", "email": "not-an-email"}),
            false,
        );
        assert_eq!(codes_of(&errors), vec![("email", "INVALID")]);
        assert_eq!(errors[0].message, "Enter a valid email address.");
    }

    #[test]
    fn decimals_are_checked_and_quantised() {
        let schema = Schema::new().field(FieldSpec::decimal("total", 5, 2));
        let (data, errors) = schema.clean(&json!({"total": 12.5}), false);
        assert!(errors.is_empty());
        assert_eq!(data.get("total"), Some(&json!("12.50")));

        let (_, errors) = schema.clean(&json!({"total": "1.005"}), false);
        assert_eq!(codes_of(&errors), vec![("total", "MAX_DECIMAL_PLACES")]);
        assert_eq!(errors[0].max_limit, Some(2));

        let (_, errors) = schema.clean(&json!({"total": "123456"}), false);
        assert_eq!(codes_of(&errors), vec![("total", "MAX_DIGITS")]);

        let (_, errors) = schema.clean(&json!({"total": "1234.5"}), false);
        assert_eq!(codes_of(&errors), vec![("total", "MAX_WHOLE_DIGITS")]);

        let (_, errors) = schema.clean(&json!({"total": "abc"}), false);
        assert_eq!(errors[0].message, "A valid number is required.");
    }

    #[test]
    fn pagination_defaults_and_minimums() {
        let (data, errors) = Schema::pagination().clean(&json!({}), false);
        assert!(errors.is_empty());
        assert_eq!(data.get("page"), Some(&json!(1)));
        assert_eq!(data.get("page_size"), Some(&json!(10)));

        let (data, errors) = Schema::pagination().clean(&json!({"page": "3"}), false);
        assert!(errors.is_empty());
        assert_eq!(data.get("page"), Some(&json!(3)));

        let (_, errors) = Schema::pagination().clean(&json!({"page_size": "0"}), false);
        assert_eq!(codes_of(&errors), vec![("page_size", "MIN_VALUE")]);
        assert_eq!(errors[0].min_limit, Some(1));
    }

    #[test]
    fn list_items_are_addressed_by_index() {
        let schema = Schema::new().field(FieldSpec::char_list("ids").max_length(4));
        let (_, errors) = schema.clean(&json!({"ids": ["ab", "", "abcdef"]}), false);
        assert_eq!(
            codes_of(&errors),
            vec![("ids.1", "BLANK"), ("ids.2", "MAX_LENGTH")]
        );

        let (_, errors) = schema.clean(&json!({"ids": "ab"}), false);
        assert_eq!(codes_of(&errors), vec![("ids", "NOT_A_LIST")]);
        assert_eq!(errors[0].message, "Expected a list of items but got type \"str\".");
    }

    #[test]
    fn booleans_dates_and_defaults() {
        let schema = Schema::new()
            .field(FieldSpec::boolean("flag").default(json!(false)))
            .field(FieldSpec::date("date"));
        let (data, errors) = schema.clean(&json!({"date": "2024-02-29"}), false);
        assert!(errors.is_empty());
        assert_eq!(data.get("flag"), Some(&json!(false)));

        let (data, errors) = schema.clean(&json!({"flag": "yes", "date": "29/02/2024"}), false);
        assert_eq!(data.get("flag"), Some(&json!(true)));
        assert_eq!(codes_of(&errors), vec![("date", "INVALID")]);
    }

    #[test]
    fn non_object_payload() {
        let (_, errors) = customer().clean(&json!([1, 2]), false);
        assert_eq!(codes_of(&errors), vec![(NON_FIELD_ERRORS, "INVALID")]);
        assert_eq!(
            errors[0].message,
            "Invalid data. Expected a dictionary, but got list."
        );
    }
}
