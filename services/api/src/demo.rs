use crate::infra::{
    InMemoryAccountRepository, InMemoryAuditStore, InMemoryListingRepository, InMemoryMediaStorage,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use homi::config::MarketConfig;
use homi::error::AppError;
use homi::marketplace::audit::{AuditRecorder, AuditTrail};
use homi::marketplace::identity::{
    AccountId, AccountRole, Argon2CredentialHasher, IdentityService, ProviderUpgrade,
    RegistrationDraft, SessionPrincipal, UpgradeOutcome,
};
use homi::marketplace::listings::{
    ListingDesk, ListingDraft, MediaUpload, ModerationDecision, SearchEngine, SearchQuery,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Market city for the walkthrough (defaults to Acapulco)
    #[arg(long)]
    pub(crate) city: Option<String>,
}

/// Walk the full listing lifecycle in memory: registration, provider
/// upgrade, submission, moderation, and the public search.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let city = args.city.unwrap_or_else(|| "Acapulco".to_string());
    let market = MarketConfig {
        city: city.clone(),
        front_page_limit: 6,
        media_dir: PathBuf::from("media"),
    };

    let accounts = Arc::new(InMemoryAccountRepository::default());
    let listings = Arc::new(InMemoryListingRepository::default());
    let audit_store = Arc::new(InMemoryAuditStore::default());
    let recorder = AuditRecorder::new(audit_store.clone());

    let identity = IdentityService::new(
        accounts.clone(),
        Arc::new(Argon2CredentialHasher),
        recorder.clone(),
    );
    let desk = ListingDesk::new(
        listings.clone(),
        Arc::new(InMemoryMediaStorage::default()),
        recorder,
    );
    let search = SearchEngine::new(listings, &market);

    println!("Homi marketplace demo ({city})");

    println!("\n1. Registration");
    let weak: RegistrationDraft = serde_json::from_value(serde_json::json!({
        "role": "client",
        "name": "Marta",
        "first_surname": "Soto",
        "email": "marta@example.com",
        "password": "corta",
        "password_confirmation": "corta",
    }))
    .expect("well-formed draft");
    match identity.register(weak) {
        Ok(_) => println!("  Weak password unexpectedly accepted"),
        Err(err) => println!("  Weak password rejected: {err}"),
    }

    let draft: RegistrationDraft = serde_json::from_value(serde_json::json!({
        "role": "client",
        "name": "Marta",
        "first_surname": "Soto",
        "email": "marta@example.com",
        "password": "Correcto#2024",
        "password_confirmation": "Correcto#2024",
    }))
    .expect("well-formed draft");
    let account = match identity.register(draft) {
        Ok(account) => account,
        Err(err) => {
            println!("  Registration failed: {err}");
            return Ok(());
        }
    };
    println!(
        "  Registered {} ({}) as {}",
        account.display_name(),
        account.email,
        account.role.label()
    );

    println!("\n2. Provider upgrade");
    let upgrade = ProviderUpgrade {
        current_password: "Correcto#2024".to_string(),
        second_surname: Some("Luna".to_string()),
        phone: Some("744-555-0101".to_string()),
        agency_name: Some("Inmobiliaria Luna".to_string()),
        tax_id: None,
        postal_code: None,
        social_links: Vec::new(),
    };
    let principal = match identity.upgrade_to_provider(&account.id, upgrade) {
        Ok(UpgradeOutcome::Upgraded { principal, .. }) => {
            println!("  {} is now a provider", principal.display_name);
            principal
        }
        Ok(UpgradeOutcome::AlreadyProvider { account }) => account.principal(),
        Err(err) => {
            println!("  Upgrade failed: {err}");
            return Ok(());
        }
    };

    println!("\n3. Listing submission");
    let listing_draft = ListingDraft {
        title: "Casa con vista en Centro".to_string(),
        description: "Tres recámaras a dos cuadras del zócalo".to_string(),
        operation: "sale".to_string(),
        category: "house".to_string(),
        price: "1850000".to_string(),
        rooms: "3".to_string(),
        bathrooms: "2".to_string(),
        area_m2: "140".to_string(),
        street: "Av. Juárez 12".to_string(),
        unit: "A".to_string(),
        neighborhood: "Centro".to_string(),
        postal_code: "39300".to_string(),
        city,
        latitude: "16.8531".to_string(),
        longitude: "-99.8237".to_string(),
    };
    let uploads = vec![
        MediaUpload {
            file_name: "fachada.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
            principal: false,
        },
        MediaUpload {
            file_name: "cocina.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
            principal: false,
        },
    ];
    let listing = match desk.submit(Some(&principal), listing_draft, uploads) {
        Ok(listing) => listing,
        Err(err) => {
            println!("  Submission failed: {err}");
            return Ok(());
        }
    };
    println!(
        "  Listing {} submitted ({} images, status {})",
        listing.id.0,
        listing.images.len(),
        listing.status.label()
    );

    match search.search(SearchQuery::default()) {
        Ok(results) => println!(
            "  Public search before moderation: {} result(s)",
            results.listings.len()
        ),
        Err(err) => println!("  Search unavailable: {err}"),
    }

    println!("\n4. Moderation");
    // A back-office principal outside the account store; the audit trail
    // must tolerate the unknown actor id.
    let moderator = SessionPrincipal {
        account_id: AccountId("acct-backoffice".to_string()),
        display_name: "Mesa de Moderación".to_string(),
        role: AccountRole::Admin,
    };
    match desk.moderate(&moderator, &listing.id, ModerationDecision::Approve) {
        Ok(listing) => println!("  Listing {} approved", listing.id.0),
        Err(err) => println!("  Moderation failed: {err}"),
    }

    println!("\n5. Public search");
    match search.search(SearchQuery::default()) {
        Ok(results) => {
            println!("  {} result(s) in {}", results.listings.len(), results.city);
            for card in &results.listings {
                println!(
                    "  - {} | {} | {} | ${:.0} | {}",
                    card.id.0,
                    card.title,
                    card.operation.label(),
                    card.price,
                    card.principal_image_url.as_deref().unwrap_or("no image")
                );
            }
            println!("  Neighborhood facet: {:?}", results.neighborhoods);
        }
        Err(err) => println!("  Search unavailable: {err}"),
    }

    println!("\n6. Audit trail");
    let trail = AuditTrail::new(audit_store, accounts);
    match trail.list() {
        Ok(entries) => {
            for entry in entries {
                let actor = entry
                    .actor_name
                    .or(entry.actor_id.map(|id| id.0))
                    .unwrap_or_else(|| "system".to_string());
                println!("  [{}] {} - {}", entry.action, actor, entry.detail);
            }
        }
        Err(err) => println!("  Audit trail unavailable: {err}"),
    }

    Ok(())
}
