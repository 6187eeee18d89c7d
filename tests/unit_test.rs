use chrono::NaiveDate;
use paydhan_backend::auth::{hash_secret, verify_secret, SessionManager};
use paydhan_backend::config::SessionConfig;
use paydhan_backend::services::report_service::{render_pdf, render_xlsx, ReportData, ReportFormat};
use paydhan_backend::services::upi_service::{qr_data_url, upi_link};
use paydhan_backend::splitting::{equal_shares, transition, SplitAction, SplitState};
use paydhan_backend::validation;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A 1000 rupee dinner shared by seven people
#[test]
fn test_equal_split_of_awkward_total() {
    let shares = equal_shares(dec("1000"), 7).unwrap();

    assert_eq!(shares.len(), 7);
    assert_eq!(shares.iter().copied().sum::<Decimal>(), dec("1000"));
    // 7 x 142.85 leaves five paise for the first five participants
    assert_eq!(shares.iter().filter(|s| **s == dec("142.86")).count(), 5);
    assert_eq!(shares.iter().filter(|s| **s == dec("142.85")).count(), 2);
    assert!(shares.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_split_lifecycle() {
    let mut state = SplitState::Pending;

    state = transition(state, SplitAction::RequestApproval).unwrap();
    assert_eq!(state, SplitState::AwaitingApproval);

    // Payer disputes, debtor asks again, payer confirms
    state = transition(state, SplitAction::Reject).unwrap();
    assert_eq!(state, SplitState::Pending);
    state = transition(state, SplitAction::RequestApproval).unwrap();
    state = transition(state, SplitAction::Approve).unwrap();
    assert_eq!(state, SplitState::Settled);

    let err = transition(state, SplitAction::RequestApproval).unwrap_err();
    assert!(err.public_message().contains("settled"));
}

#[test]
fn test_user_input_normalisation() {
    assert_eq!(validation::username("  Asha_99 ").unwrap(), "asha_99");
    assert_eq!(validation::email(" Asha@Example.COM ").unwrap(), "asha@example.com");
    assert_eq!(validation::colour("#a1b2c3").unwrap(), "#A1B2C3");
    assert_eq!(validation::upi_id("asha.k@okhdfc").unwrap(), "asha.k@okhdfc");

    assert!(validation::amount(dec("0.001")).is_err());
    assert!(validation::amount(dec("-1")).is_err());
    assert!(validation::upi_id("no-at-sign").is_err());
}

#[test]
fn test_upi_payment_link() {
    let link = upi_link("asha@okbank", "Asha K", Some(dec("250.5")), Some("Dinner & drinks"));

    assert_eq!(
        link,
        "upi://pay?pa=asha%40okbank&pn=Asha%20K&am=250.50&cu=INR&tn=Dinner%20%26%20drinks"
    );

    let qr = qr_data_url(&link).unwrap();
    assert!(qr.starts_with("data:image/svg+xml;base64,"));
}

#[test]
fn test_pin_hash_never_stores_plaintext() {
    let hash = hash_secret("4321").unwrap();
    assert!(!hash.contains("4321"));
    assert!(verify_secret("4321", &hash).unwrap());
    assert!(!verify_secret("1234", &hash).unwrap());
}

#[test]
fn test_session_tokens_are_bound_to_secret() {
    let issuer = SessionManager::new(&SessionConfig::default());
    let user_id = Uuid::new_v4();
    let token = issuer.issue(user_id).unwrap();

    assert_eq!(issuer.verify(&token).unwrap().sub, user_id);

    let other = SessionManager::new(&SessionConfig {
        jwt_secret: "a-completely-different-signing-secret-value".to_string(),
        ..SessionConfig::default()
    });
    assert!(other.verify(&token).is_err());
}

#[test]
fn test_empty_month_still_renders() {
    let data = ReportData {
        from: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        to: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        payments: Vec::new(),
        group_shares: Vec::new(),
        include_group_expenses: true,
    };

    assert_eq!(data.net(), Decimal::ZERO);
    assert_eq!(
        data.filename(ReportFormat::Pdf),
        "paydhan-report-2024-02-01-2024-02-29.pdf"
    );
    assert!(render_pdf(&data).unwrap().starts_with(b"%PDF"));
    assert!(render_xlsx(&data).unwrap().starts_with(b"PK"));
}
