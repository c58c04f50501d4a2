//! Form validation.
//!
//! Each validator returns every failing field in form order; an empty
//! vector means the input is acceptable.

use crate::error::ValidationError;
use crate::models::{Credentials, ProductDraft, Registration, ShippingAddress};

/// Minimum display-name length.
const NAME_MIN: usize = 2;
/// Minimum password length.
const PASSWORD_MIN: usize = 6;
/// Minimum product title length.
const TITLE_MIN: usize = 3;
/// Minimum product description length.
const DESCRIPTION_MIN: usize = 10;

/// Returns `true` for `local@domain.tld` where the TLD has at least two
/// letters.
#[inline]
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '%' | '+' | '-'));
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-'));
    let tld_ok = tld.chars().count() >= 2 && tld.chars().all(|ch| ch.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}

/// Checks the login form.
#[inline]
#[must_use]
pub fn validate_credentials(credentials: &Credentials) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_email(&credentials.email, &mut errors);
    if is_blank(&credentials.password) {
        errors.push(ValidationError::Required { field: "password" });
    }
    errors
}

/// Checks the registration form, including the password confirmation.
#[inline]
#[must_use]
pub fn validate_registration(
    registration: &Registration,
    confirm_password: &str,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_min_len(&registration.name, "name", "Name", NAME_MIN, &mut errors);
    check_email(&registration.email, &mut errors);
    if is_blank(&registration.password) {
        errors.push(ValidationError::Required { field: "password" });
    } else if registration.password.chars().count() < PASSWORD_MIN {
        errors.push(ValidationError::WeakPassword);
    }
    if confirm_password.is_empty() {
        errors.push(ValidationError::Required {
            field: "confirm_password",
        });
    } else if confirm_password != registration.password {
        errors.push(ValidationError::PasswordMismatch);
    }
    errors
}

/// Checks a merchant's product form.
#[inline]
#[must_use]
pub fn validate_product_draft(draft: &ProductDraft) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_min_len(&draft.title, "title", "Title", TITLE_MIN, &mut errors);
    check_min_len(
        &draft.description,
        "description",
        "Description",
        DESCRIPTION_MIN,
        &mut errors,
    );
    if !draft.price.is_finite() || draft.price < 0.0_f64 {
        errors.push(ValidationError::InvalidPrice);
    }
    if is_blank(&draft.category) {
        errors.push(ValidationError::Required { field: "category" });
    }
    errors
}

/// Checks the checkout address; every field is required.
#[inline]
#[must_use]
pub fn validate_shipping_address(address: &ShippingAddress) -> Vec<ValidationError> {
    [
        ("full_name", &address.full_name),
        ("street", &address.street),
        ("city", &address.city),
        ("state", &address.state),
        ("zip_code", &address.zip_code),
        ("phone", &address.phone),
    ]
    .into_iter()
    .filter(|&(_, value)| is_blank(value))
    .map(|(field, _)| ValidationError::Required { field })
    .collect()
}

/// `true` for empty or whitespace-only input.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Required plus format check for an email field.
fn check_email(email: &str, errors: &mut Vec<ValidationError>) {
    if is_blank(email) {
        errors.push(ValidationError::Required { field: "email" });
    } else if !is_valid_email(email.trim()) {
        errors.push(ValidationError::InvalidEmail);
    }
}

/// Required plus minimum-length check.
fn check_min_len(
    value: &str,
    field: &'static str,
    label: &'static str,
    min: usize,
    errors: &mut Vec<ValidationError>,
) {
    if is_blank(value) {
        errors.push(ValidationError::Required { field });
    } else if value.trim().chars().count() < min {
        errors.push(ValidationError::TooShort { field, label, min });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn registration(name: &str, email: &str, password: &str) -> Registration {
        Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            role: Role::Customer,
        }
    }

    #[test]
    fn accepts_ordinary_emails() {
        for email in ["ada@example.com", "a.b+tag@mail.example.co", "x_y%z@host-1.io"] {
            assert!(is_valid_email(email), "{email}");
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in [
            "",
            "plain",
            "@example.com",
            "ada@",
            "ada@example",
            "ada@example.c",
            "ada@.com",
            "ada@exa mple.com",
            "ada@example.c0m",
            "a@b@example.com",
        ] {
            assert!(!is_valid_email(email), "{email}");
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = validate_credentials(&Credentials {
            email: String::new(),
            password: String::new(),
        });
        assert_eq!(
            errors,
            [
                ValidationError::Required { field: "email" },
                ValidationError::Required { field: "password" },
            ]
        );
    }

    #[test]
    fn login_rejects_bad_email() {
        let errors = validate_credentials(&Credentials {
            email: "nope".to_owned(),
            password: "secret".to_owned(),
        });
        assert_eq!(errors, [ValidationError::InvalidEmail]);
    }

    #[test]
    fn valid_registration_passes() {
        let form = registration("Ada", "ada@example.com", "secret1");
        assert!(validate_registration(&form, "secret1").is_empty());
    }

    #[test]
    fn registration_reports_every_field() {
        let form = registration("A", "bad", "123");
        let errors = validate_registration(&form, "321");
        assert_eq!(
            errors,
            [
                ValidationError::TooShort {
                    field: "name",
                    label: "Name",
                    min: 2
                },
                ValidationError::InvalidEmail,
                ValidationError::WeakPassword,
                ValidationError::PasswordMismatch,
            ]
        );
        assert_eq!(errors[0].to_string(), "Name must be at least 2 characters");
    }

    #[test]
    fn registration_requires_confirmation() {
        let form = registration("Ada", "ada@example.com", "secret1");
        let errors = validate_registration(&form, "");
        assert_eq!(errors[0].field(), Some("confirm_password"));
    }

    #[test]
    fn product_draft_rules() {
        let draft = ProductDraft {
            title: "Hi".to_owned(),
            description: "short".to_owned(),
            price: -1.0,
            category: " ".to_owned(),
        };
        let fields: Vec<Option<&str>> = validate_product_draft(&draft)
            .iter()
            .map(ValidationError::field)
            .collect();
        assert_eq!(
            fields,
            [Some("title"), Some("description"), Some("price"), Some("category")]
        );
    }

    #[test]
    fn product_draft_rejects_nan_price_and_accepts_zero() {
        let mut draft = ProductDraft {
            title: "Desk lamp".to_owned(),
            description: "Warm light for late evenings".to_owned(),
            price: f64::NAN,
            category: "Home".to_owned(),
        };
        assert_eq!(validate_product_draft(&draft), [ValidationError::InvalidPrice]);
        draft.price = 0.0;
        assert!(validate_product_draft(&draft).is_empty());
    }

    #[test]
    fn address_requires_every_field() {
        let errors = validate_shipping_address(&ShippingAddress {
            full_name: "Ada".to_owned(),
            city: "London".to_owned(),
            ..ShippingAddress::default()
        });
        let fields: Vec<Option<&str>> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            fields,
            [Some("street"), Some("state"), Some("zip_code"), Some("phone")]
        );
        assert_eq!(errors[0].to_string(), "This field is required");
    }
}
