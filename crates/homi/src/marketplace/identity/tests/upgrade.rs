use super::common::*;

use crate::marketplace::identity::domain::{AccountRole, ProviderUpgrade};
use crate::marketplace::identity::repository::AccountRepository;
use crate::marketplace::identity::service::{IdentityError, UpgradeOutcome};

fn upgrade_request() -> ProviderUpgrade {
    ProviderUpgrade {
        current_password: GOOD_PASSWORD.to_string(),
        second_surname: Some("Luna".to_string()),
        phone: Some("744-555-0101".to_string()),
        agency_name: Some("Inmobiliaria Luna".to_string()),
        tax_id: None,
        postal_code: None,
        social_links: Vec::new(),
    }
}

#[test]
fn upgrade_promotes_a_client_and_returns_a_fresh_principal() {
    let (service, _, audit) = build_service();
    let account = service
        .register(client_draft("marta@example.com"))
        .expect("registration succeeds");

    let outcome = service
        .upgrade_to_provider(&account.id, upgrade_request())
        .expect("upgrade succeeds");

    let UpgradeOutcome::Upgraded { account, principal } = outcome else {
        panic!("expected an upgrade");
    };
    assert_eq!(account.role, AccountRole::Provider);
    assert_eq!(principal.role, AccountRole::Provider);
    let details = account.provider.expect("provider details set");
    assert_eq!(details.agency_name.as_deref(), Some("Inmobiliaria Luna"));
    assert!(!details.verified);
    assert!(audit
        .actions()
        .contains(&"account.upgraded_to_provider".to_string()));
}

#[test]
fn upgrade_requires_the_current_password() {
    let (service, accounts, _) = build_service();
    let account = service
        .register(client_draft("marta@example.com"))
        .expect("registration succeeds");

    let mut request = upgrade_request();
    request.current_password = "Equivocada#2024".to_string();
    let err = service
        .upgrade_to_provider(&account.id, request)
        .expect_err("wrong proof rejected");

    assert!(matches!(err, IdentityError::WrongPassword));
    let stored = accounts
        .fetch(&account.id)
        .expect("lookup runs")
        .expect("account still there");
    assert_eq!(stored.role, AccountRole::Client);
}

#[test]
fn upgrade_collects_missing_contact_fields() {
    let (service, _, _) = build_service();
    let account = service
        .register(client_draft("marta@example.com"))
        .expect("registration succeeds");

    let mut request = upgrade_request();
    request.second_surname = None;
    request.phone = None;
    let err = service
        .upgrade_to_provider(&account.id, request)
        .expect_err("contact fields required");

    let IdentityError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    let named: Vec<&str> = fields.iter().map(|f| f.field).collect();
    assert_eq!(named, vec!["second_surname", "phone"]);
}

#[test]
fn upgrade_is_an_informational_noop_the_second_time() {
    let (service, _, audit) = build_service();
    let account = service
        .register(client_draft("marta@example.com"))
        .expect("registration succeeds");

    service
        .upgrade_to_provider(&account.id, upgrade_request())
        .expect("first upgrade succeeds");
    let outcome = service
        .upgrade_to_provider(&account.id, upgrade_request())
        .expect("second attempt is not an error");

    let UpgradeOutcome::AlreadyProvider { account } = outcome else {
        panic!("expected the no-op outcome");
    };
    assert_eq!(account.role, AccountRole::Provider);

    let upgrades = audit
        .actions()
        .iter()
        .filter(|a| a.as_str() == "account.upgraded_to_provider")
        .count();
    assert_eq!(upgrades, 1, "the no-op must not audit again");
}

#[test]
fn upgrade_on_an_unknown_account_is_not_found() {
    let (service, _, _) = build_service();

    let err = service
        .upgrade_to_provider(
            &crate::marketplace::identity::AccountId("acct-missing".to_string()),
            upgrade_request(),
        )
        .expect_err("unknown account rejected");

    assert!(matches!(err, IdentityError::NotFound));
}
