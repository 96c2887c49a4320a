use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ApiError, FieldErrors};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects per-field messages across a whole request body; the first failed
/// check on a field wins, later checks on the same field are ignored.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: FieldErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &'static str, message: String) {
        self.errors.entry(field).or_insert(message);
    }

    /// Marks the field as required. Returns an empty placeholder when the
    /// value is absent so validation of the other fields can continue;
    /// `finish` turns the recorded error into a response before the
    /// placeholder can ever be used.
    pub fn required(&mut self, field: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) => value,
            None => {
                self.fail(field, format!("required field {field}"));
                String::new()
            }
        }
    }

    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.fail(
                field,
                format!("field {field} minimum length is {min} and maximum length is {max}"),
            );
        }
    }

    pub fn min_length(&mut self, field: &'static str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.fail(field, format!("field {field} minimum length is {min}"));
        }
    }

    pub fn email_format(&mut self, field: &'static str, value: &str) {
        if !is_valid_email(value) {
            self.fail(field, format!("field {field} must be an email"));
        }
    }

    pub fn not_empty(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            self.fail(field, format!("field {field} must be not empty"));
        }
    }

    /// Parses a path parameter as an integer, collecting the failure into the
    /// same map as body errors. Returns a placeholder on failure, like
    /// `required`.
    pub fn integer_param(&mut self, field: &'static str, raw: &str) -> i64 {
        match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                self.fail(
                    field,
                    format!("parameter {field} must be a number (integer)"),
                );
                0
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Path ids arrive as strings; a non-integer id is a validation error on the
/// `id` field, not a routing miss.
pub fn parse_id_param(raw: &str) -> Result<i64, ApiError> {
    let mut v = FieldValidator::new();
    let id = v.integer_param("id", raw);
    v.finish()?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(validator: FieldValidator) -> FieldErrors {
        match validator.finish() {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_valid_body() {
        let mut v = FieldValidator::new();
        let name = v.required("name", Some("ann".into()));
        v.length("name", &name, 1, 128);
        let email = v.required("email", Some("ann@x.com".into()));
        v.email_format("email", &email);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn missing_field_reports_required() {
        let mut v = FieldValidator::new();
        v.required("name", None);
        let errors = errors_of(v);
        assert_eq!(errors["name"], "required field name");
    }

    #[test]
    fn required_wins_over_later_checks() {
        let mut v = FieldValidator::new();
        let name = v.required("name", None);
        v.length("name", &name, 1, 128);
        let errors = errors_of(v);
        assert_eq!(errors["name"], "required field name");
    }

    #[test]
    fn collects_all_fields_instead_of_failing_fast() {
        let mut v = FieldValidator::new();
        v.required("name", None);
        v.required("email", None);
        let password = v.required("password", Some("short".into()));
        v.min_length("password", &password, 8);
        let errors = errors_of(v);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["password"], "field password minimum length is 8");
    }

    #[test]
    fn length_checks_both_bounds() {
        let mut v = FieldValidator::new();
        v.length("name", "", 1, 128);
        v.length("description", &"x".repeat(257), 1, 256);
        let errors = errors_of(v);
        assert_eq!(
            errors["name"],
            "field name minimum length is 1 and maximum length is 128"
        );
        assert_eq!(
            errors["description"],
            "field description minimum length is 1 and maximum length is 256"
        );
    }

    #[test]
    fn email_format_is_checked() {
        let mut v = FieldValidator::new();
        v.email_format("email", "not-an-email");
        let errors = errors_of(v);
        assert_eq!(errors["email"], "field email must be an email");

        assert!(is_valid_email("ann@x.com"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn not_empty_rejects_the_empty_string() {
        let mut v = FieldValidator::new();
        v.not_empty("refreshToken", "");
        let errors = errors_of(v);
        assert_eq!(errors["refreshToken"], "field refreshToken must be not empty");
    }

    #[test]
    fn id_error_lands_in_the_same_map_as_body_errors() {
        let mut v = FieldValidator::new();
        v.integer_param("id", "forty-two");
        v.length("name", "", 1, 128);
        let errors = errors_of(v);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["id"], "parameter id must be a number (integer)");
        assert_eq!(
            errors["name"],
            "field name minimum length is 1 and maximum length is 128"
        );
    }

    #[test]
    fn id_param_must_be_an_integer() {
        assert_eq!(parse_id_param("42").expect("valid id"), 42);
        let err = parse_id_param("forty-two").unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors["id"], "parameter id must be a number (integer)");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
