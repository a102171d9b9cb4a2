use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use regex::Regex;
use tracing::{debug, trace};

use crate::inputter::Inputter;

static STRICT_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));
static DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<d>[0-9]{2})-(?P<m>[0-9]{2})-(?P<y>[0-9]{4})$").expect("valid dob regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Username,
    Email,
    Phone,
    Dob,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Username, Field::Email, Field::Phone, Field::Dob];

    pub fn label(self) -> &'static str {
        match self {
            Field::Username => "Username",
            Field::Email => "Email Address",
            Field::Phone => "Phone Number",
            Field::Dob => "Date of Birth",
        }
    }

    fn next(self) -> Self {
        match self {
            Field::Username => Field::Email,
            Field::Email => Field::Phone,
            Field::Phone => Field::Dob,
            Field::Dob => Field::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Username => Field::Dob,
            Field::Email => Field::Username,
            Field::Phone => Field::Email,
            Field::Dob => Field::Phone,
        }
    }
}

/// How validation failures reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Stop at the first failing rule and raise a blocking alert.
    AlertFirstError,
    /// Report every failing field inline.
    AccumulateAllErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailRule {
    ContainsAt,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormPolicy {
    pub delivery: Delivery,
    pub email: EmailRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(Field),
    InvalidEmail,
    InvalidPhone,
    DobFormat,
    DobNotADate,
    DobInFuture,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required(field) => {
                write!(f, "Please fill out the {} field.", field.label())
            }
            ValidationError::InvalidEmail => {
                write!(f, "Invalid email. Please check your email address.")
            }
            ValidationError::InvalidPhone => write!(
                f,
                "Invalid phone number. Please enter a 10-digit phone number."
            ),
            ValidationError::DobFormat => write!(
                f,
                "Invalid date of birth. Please use the dd-mm-yyyy format."
            ),
            ValidationError::DobNotADate => write!(
                f,
                "Invalid date of birth. Please enter a real calendar date."
            ),
            ValidationError::DobInFuture => write!(
                f,
                "Invalid date of birth. Date of birth cannot be in the future."
            ),
        }
    }
}

pub fn validate_email(email: &str, rule: EmailRule) -> Result<(), ValidationError> {
    let ok = match rule {
        EmailRule::ContainsAt => email.contains('@'),
        EmailRule::Strict => STRICT_EMAIL.is_match(email),
    };
    if ok { Ok(()) } else { Err(ValidationError::InvalidEmail) }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// Parses a `dd-mm-yyyy` date of birth that must not lie after `today`.
pub fn validate_dob(dob: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let caps = DOB.captures(dob).ok_or(ValidationError::DobFormat)?;
    let part = |name: &str| caps[name].parse::<u32>().map_err(|_| ValidationError::DobFormat);
    let (day, month) = (part("d")?, part("m")?);
    let year = caps["y"]
        .parse::<i32>()
        .map_err(|_| ValidationError::DobFormat)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ValidationError::DobNotADate)?;
    if date > today {
        return Err(ValidationError::DobInFuture);
    }
    Ok(date)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
}

impl FormState {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Dob => &self.dob,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Username => self.username = value,
            Field::Email => self.email = value,
            Field::Phone => self.phone = value,
            Field::Dob => self.dob = value,
        }
    }

    /// Every failing rule in check order: all required checks first, then
    /// the format checks of the fields that were filled in.
    pub fn validate(&self, policy: FormPolicy, today: NaiveDate) -> Vec<(Field, ValidationError)> {
        let mut errors: Vec<(Field, ValidationError)> = Field::ALL
            .iter()
            .filter(|&&f| self.get(f).trim().is_empty())
            .map(|&f| (f, ValidationError::Required(f)))
            .collect();
        let missing = |f: Field| errors.iter().any(|(e, _)| *e == f);

        let mut format_errors = Vec::new();
        if !missing(Field::Email)
            && let Err(e) = validate_email(&self.email, policy.email)
        {
            format_errors.push((Field::Email, e));
        }
        if !missing(Field::Phone)
            && let Err(e) = validate_phone(&self.phone)
        {
            format_errors.push((Field::Phone, e));
        }
        if !missing(Field::Dob)
            && let Err(e) = validate_dob(&self.dob, today)
        {
            format_errors.push((Field::Dob, e));
        }
        errors.extend(format_errors);
        errors
    }
}

pub type ErrorState = BTreeMap<Field, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The modal was closed, nothing to submit.
    Ignored,
    Accepted(FormState),
    /// Blocking notification carrying the first failure.
    Alert(String),
    /// Errors were stored inline, one per failing field.
    Inline(usize),
}

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully!";

#[derive(Debug, Clone)]
pub struct FormModal {
    policy: FormPolicy,
    state: ModalState,
    form: FormState,
    errors: ErrorState,
    focus: Field,
    input: Inputter,
    status: Option<String>,
}

impl FormModal {
    pub fn new(policy: FormPolicy) -> Self {
        Self {
            policy,
            state: ModalState::Closed,
            form: FormState::default(),
            errors: ErrorState::new(),
            focus: Field::Username,
            input: Inputter::default(),
            status: None,
        }
    }

    pub fn open(&mut self) {
        self.reset();
        self.state = ModalState::Open;
        self.status = None;
        trace!("Form modal opened ({:?})", self.policy.delivery);
    }

    pub fn close(&mut self) {
        self.reset();
        self.state = ModalState::Closed;
        self.status = None;
        trace!("Form modal closed");
    }

    fn reset(&mut self) {
        self.form = FormState::default();
        self.errors.clear();
        self.focus = Field::Username;
        self.input.clear();
    }

    /// Store a new field value. Only that field's error is dropped, nothing
    /// is re-validated until the next submit.
    pub fn input(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value.into());
        self.errors.remove(&field);
    }

    pub fn submit(&mut self, today: NaiveDate) -> SubmitOutcome {
        if self.state == ModalState::Closed {
            return SubmitOutcome::Ignored;
        }
        let failures = self.form.validate(self.policy, today);
        debug!("Form submit: {} failing rule(s)", failures.len());

        if failures.is_empty() {
            let accepted = self.form.clone();
            self.close();
            if self.policy.delivery == Delivery::AccumulateAllErrors {
                self.status = Some(SUCCESS_MESSAGE.to_string());
            }
            return SubmitOutcome::Accepted(accepted);
        }

        match self.policy.delivery {
            Delivery::AlertFirstError => {
                let message = failures[0].1.to_string();
                self.status = Some("Submission failed.".to_string());
                SubmitOutcome::Alert(message)
            }
            Delivery::AccumulateAllErrors => {
                self.errors = failures
                    .into_iter()
                    .map(|(field, e)| (field, e.to_string()))
                    .collect();
                let count = self.errors.len();
                self.status = Some(format!(
                    "Please correct {count} field{}.",
                    if count == 1 { "" } else { "s" }
                ));
                SubmitOutcome::Inline(count)
            }
        }
    }

    /// Key handling while the modal is open.
    pub fn handle_key(&mut self, key: KeyEvent, today: NaiveDate) -> SubmitOutcome {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.set_focus(self.focus.next()),
            KeyCode::BackTab | KeyCode::Up => self.set_focus(self.focus.prev()),
            KeyCode::Enter => return self.submit(today),
            KeyCode::Esc => self.close(),
            _ => {
                let result = self.input.read(key);
                if result.changed {
                    self.input(self.focus, result.input);
                }
            }
        }
        SubmitOutcome::Ignored
    }

    fn set_focus(&mut self, field: Field) {
        self.focus = field;
        self.input.set(self.form.get(field));
    }

    pub fn is_open(&self) -> bool {
        self.state == ModalState::Open
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn policy(&self) -> FormPolicy {
        self.policy
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    const ALERT: FormPolicy = FormPolicy {
        delivery: Delivery::AlertFirstError,
        email: EmailRule::ContainsAt,
    };
    const INLINE: FormPolicy = FormPolicy {
        delivery: Delivery::AccumulateAllErrors,
        email: EmailRule::Strict,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn filled(modal: &mut FormModal) {
        modal.input(Field::Username, "jane");
        modal.input(Field::Email, "jane@example.com");
        modal.input(Field::Phone, "1234567890");
        modal.input(Field::Dob, "01-02-1990");
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.co", EmailRule::Strict).is_ok());
        assert_eq!(
            validate_email("a@b", EmailRule::Strict),
            Err(ValidationError::InvalidEmail)
        );
        assert!(validate_email("a@b.co", EmailRule::ContainsAt).is_ok());
        assert!(validate_email("a@b", EmailRule::ContainsAt).is_ok());
        assert!(validate_email("ab", EmailRule::ContainsAt).is_err());
        assert!(validate_email("a b@c.de", EmailRule::Strict).is_err());
    }

    #[test]
    fn phone_needs_exactly_ten_digits() {
        assert!(validate_phone("1234567890").is_ok());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("12345678901").is_err());
        assert!(validate_phone("12345abcde").is_err());
        assert!(validate_phone("123-456-7890").is_err());
        // Non ascii digits
        assert!(validate_phone("١٢٣٤٥٦٧٨٩٠").is_err());
    }

    #[test]
    fn dob_must_be_a_real_past_date() {
        assert_eq!(
            validate_dob("15-06-1999", today()),
            Ok(NaiveDate::from_ymd_opt(1999, 6, 15).unwrap())
        );
        assert_eq!(
            validate_dob("31-02-2020", today()),
            Err(ValidationError::DobNotADate)
        );
        assert_eq!(
            validate_dob("31-04-2020", today()),
            Err(ValidationError::DobNotADate)
        );
        assert_eq!(
            validate_dob("01-01-2030", today()),
            Err(ValidationError::DobInFuture)
        );
        assert_eq!(
            validate_dob("1990-01-01", today()),
            Err(ValidationError::DobFormat)
        );
        // Born today is fine
        assert!(validate_dob("19-10-2026", today()).is_ok());
        assert_eq!(
            validate_dob("20-10-2026", today()),
            Err(ValidationError::DobInFuture)
        );
    }

    #[test]
    fn future_dob_has_its_own_message() {
        let future = ValidationError::DobInFuture.to_string();
        assert_ne!(future, ValidationError::InvalidPhone.to_string());
        assert!(future.contains("future"));
    }

    #[test]
    fn open_resets_fields_and_errors() {
        let mut modal = FormModal::new(INLINE);
        modal.open();
        modal.input(Field::Username, "x");
        modal.submit(today());
        assert!(!modal.errors().is_empty());

        modal.open();
        assert_eq!(modal.form(), &FormState::default());
        assert!(modal.errors().is_empty());
        assert!(modal.is_open());
    }

    #[test]
    fn submit_on_closed_modal_is_ignored() {
        let mut modal = FormModal::new(ALERT);
        assert_eq!(modal.submit(today()), SubmitOutcome::Ignored);
    }

    #[test]
    fn alert_variant_reports_first_failure_only() {
        let mut modal = FormModal::new(ALERT);
        modal.open();
        modal.input(Field::Email, "nope");
        modal.input(Field::Phone, "12");
        let outcome = modal.submit(today());
        assert_eq!(
            outcome,
            SubmitOutcome::Alert(ValidationError::Required(Field::Username).to_string())
        );
        assert!(modal.is_open());
        assert!(modal.errors().is_empty());
        assert_eq!(modal.status(), Some("Submission failed."));
    }

    #[test]
    fn alert_variant_checks_formats_in_order() {
        let mut modal = FormModal::new(ALERT);
        modal.open();
        filled(&mut modal);
        modal.input(Field::Phone, "12345abcde");
        modal.input(Field::Dob, "31-02-2020");
        assert_eq!(
            modal.submit(today()),
            SubmitOutcome::Alert(ValidationError::InvalidPhone.to_string())
        );
        modal.input(Field::Phone, "1234567890");
        assert_eq!(
            modal.submit(today()),
            SubmitOutcome::Alert(ValidationError::DobNotADate.to_string())
        );
    }

    #[test]
    fn inline_variant_accumulates_all_errors() {
        let mut modal = FormModal::new(INLINE);
        modal.open();
        modal.input(Field::Email, "a@b");
        modal.input(Field::Phone, "123456789");
        modal.input(Field::Dob, "01-01-2030");
        assert_eq!(modal.submit(today()), SubmitOutcome::Inline(4));

        let errors = modal.errors();
        assert_eq!(
            errors.get(&Field::Username),
            Some(&ValidationError::Required(Field::Username).to_string())
        );
        assert_eq!(
            errors.get(&Field::Email),
            Some(&ValidationError::InvalidEmail.to_string())
        );
        assert_eq!(
            errors.get(&Field::Phone),
            Some(&ValidationError::InvalidPhone.to_string())
        );
        assert_eq!(
            errors.get(&Field::Dob),
            Some(&ValidationError::DobInFuture.to_string())
        );
        assert_eq!(modal.status(), Some("Please correct 4 fields."));
    }

    #[test]
    fn typing_clears_only_that_fields_error() {
        let mut modal = FormModal::new(INLINE);
        modal.open();
        modal.submit(today());
        assert_eq!(modal.errors().len(), 4);

        // Still invalid, but the error is cleared optimistically
        modal.input(Field::Phone, "1");
        assert_eq!(modal.errors().len(), 3);
        assert!(!modal.errors().contains_key(&Field::Phone));
    }

    #[test]
    fn valid_submit_closes_and_resets() {
        let mut modal = FormModal::new(ALERT);
        modal.open();
        filled(&mut modal);
        let outcome = modal.submit(today());
        match outcome {
            SubmitOutcome::Accepted(form) => assert_eq!(form.username, "jane"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(modal.state(), ModalState::Closed);
        assert_eq!(modal.form(), &FormState::default());

        let mut modal = FormModal::new(INLINE);
        modal.open();
        filled(&mut modal);
        assert!(matches!(modal.submit(today()), SubmitOutcome::Accepted(_)));
        assert!(modal.errors().is_empty());
        assert_eq!(modal.status(), Some(SUCCESS_MESSAGE));
        assert!(!modal.is_open());
    }

    #[test]
    fn success_after_failure_drops_failed_status() {
        let mut modal = FormModal::new(ALERT);
        modal.open();
        assert!(matches!(modal.submit(today()), SubmitOutcome::Alert(_)));
        assert_eq!(modal.status(), Some("Submission failed."));

        filled(&mut modal);
        assert!(matches!(modal.submit(today()), SubmitOutcome::Accepted(_)));
        assert!(!modal.is_open());
        assert_eq!(modal.status(), None);
    }

    #[test]
    fn keys_edit_the_focused_field() {
        let mut modal = FormModal::new(INLINE);
        modal.open();
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        modal.handle_key(key(KeyCode::Char('a')), today());
        modal.handle_key(key(KeyCode::Tab), today());
        modal.handle_key(key(KeyCode::Char('b')), today());
        modal.handle_key(key(KeyCode::BackTab), today());
        modal.handle_key(key(KeyCode::Char('c')), today());
        assert_eq!(modal.form().username, "ac");
        assert_eq!(modal.form().email, "b");
        assert_eq!(modal.focus(), Field::Username);

        assert_eq!(
            modal.handle_key(key(KeyCode::Enter), today()),
            SubmitOutcome::Inline(3)
        );
        modal.handle_key(key(KeyCode::Esc), today());
        assert!(!modal.is_open());
    }
}
