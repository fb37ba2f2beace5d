use super::common::*;
use std::sync::Arc;

use crate::marketplace::audit::AuditRecorder;
use crate::marketplace::identity::domain::{AccountRole, ClientDraft, RegistrationDraft};
use crate::marketplace::identity::password::PasswordWeakness;
use crate::marketplace::identity::repository::AccountRepository;
use crate::marketplace::identity::service::{IdentityError, IdentityService};

fn draft_with(mutate: impl FnOnce(&mut ClientDraft)) -> RegistrationDraft {
    let RegistrationDraft::Client(mut client) = client_draft("marta@example.com") else {
        unreachable!()
    };
    mutate(&mut client);
    RegistrationDraft::Client(client)
}

#[test]
fn client_registration_stores_normalized_email() {
    let (service, accounts, _) = build_service();

    let account = service
        .register(client_draft("  Marta@Example.COM "))
        .expect("registration succeeds");

    assert_eq!(account.email, "marta@example.com");
    assert_eq!(account.role, AccountRole::Client);
    assert!(account.provider.is_none());
    assert!(accounts
        .fetch_by_email("marta@example.com")
        .expect("lookup runs")
        .is_some());
}

#[test]
fn provider_registration_captures_agency_details() {
    let (service, _, _) = build_service();

    let account = service
        .register(provider_draft("jorge@example.com"))
        .expect("registration succeeds");

    assert_eq!(account.role, AccountRole::Provider);
    let details = account.provider.expect("provider details present");
    assert_eq!(details.agency_name.as_deref(), Some("Inmobiliaria Luna"));
    assert!(!details.verified);
}

#[test]
fn blank_mandatory_fields_are_collected_in_one_pass() {
    let (service, _, _) = build_service();

    let err = service
        .register(draft_with(|c| {
            c.name = "   ".to_string();
            c.first_surname = String::new();
            c.email = String::new();
        }))
        .expect_err("validation fails");

    let IdentityError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    let named: Vec<&str> = fields.iter().map(|f| f.field).collect();
    assert!(named.contains(&"name"));
    assert!(named.contains(&"first_surname"));
    assert!(named.contains(&"email"));
}

#[test]
fn malformed_email_is_rejected() {
    let (service, _, _) = build_service();

    let err = service
        .register(draft_with(|c| c.email = "not-an-address".to_string()))
        .expect_err("validation fails");

    let IdentityError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(fields.iter().any(|f| f.field == "email"));
}

#[test]
fn password_mismatch_flags_the_confirmation_field() {
    let (service, _, _) = build_service();

    let err = service
        .register(draft_with(|c| {
            c.password_confirmation = "Distinta#2024".to_string();
        }))
        .expect_err("validation fails");

    let IdentityError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(fields.iter().any(|f| f.field == "password_confirmation"));
}

#[test]
fn weak_password_reports_every_unmet_requirement() {
    let (service, _, _) = build_service();

    let err = service
        .register(draft_with(|c| {
            c.password = "corta".to_string();
            c.password_confirmation = "corta".to_string();
        }))
        .expect_err("strength policy fails");

    let IdentityError::WeakPassword(weaknesses) = err else {
        panic!("expected weak password error, got {err:?}");
    };
    assert!(weaknesses.contains(&PasswordWeakness::TooShort));
    assert!(weaknesses.contains(&PasswordWeakness::MissingUppercase));
    assert!(weaknesses.contains(&PasswordWeakness::MissingDigit));
    assert!(weaknesses.contains(&PasswordWeakness::MissingSymbol));
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let (service, _, _) = build_service();

    service
        .register(client_draft("marta@example.com"))
        .expect("first registration succeeds");
    let err = service
        .register(client_draft("MARTA@example.com"))
        .expect_err("second registration fails");

    assert!(matches!(err, IdentityError::DuplicateEmail));
}

#[test]
fn racing_insert_still_surfaces_duplicate_email() {
    let audit = Arc::new(MemoryAudit::default());
    let service = IdentityService::new(
        Arc::new(RacyAccounts),
        Arc::new(PlainTextHasher),
        AuditRecorder::new(audit.clone()),
    );

    let err = service
        .register(client_draft("marta@example.com"))
        .expect_err("store conflict fires");

    assert!(matches!(err, IdentityError::DuplicateEmail));
    assert!(audit.actions().is_empty(), "failed registration never audits");
}

#[test]
fn successful_registration_is_audited_without_credentials() {
    let (service, _, audit) = build_service();

    service
        .register(client_draft("marta@example.com"))
        .expect("registration succeeds");

    assert_eq!(audit.actions(), vec!["account.registered".to_string()]);
    for detail in audit.details() {
        assert!(!detail.contains(GOOD_PASSWORD));
    }
}
