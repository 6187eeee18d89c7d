//! End-to-end flows against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch server and
//! `cargo test -- --ignored`; `#[sqlx::test]` creates a fresh database
//! per test and applies `./migrations`.

mod helpers;

use axum::http::{header, StatusCode};
use helpers::*;
use paydhan_backend::auth::GoogleProfile;
use paydhan_backend::error::AppError;
use paydhan_backend::repositories::UserRepository;
use paydhan_backend::services::auth_service::{
    PinLoginRequest, ResetPinRequest, SignupRequest, UsernamePinRequest,
};
use paydhan_backend::services::expense_service::{CreateExpenseRequest, SplitInput};
use paydhan_backend::services::group_service::{InviteRequest, LeaveOutcome};
use paydhan_backend::services::notification_service::ListNotificationsQuery;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Sign up → session cookie → categories → payments → stats → report
#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_personal_finance_flow(pool: PgPool) {
    let state = state_from_pool(pool);

    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/auth/signup",
            r#"{"email":"Meera@Example.com","password":"correct horse","full_name":"Meera"}"#,
            None,
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["user"]["email"], "meera@example.com");
    assert!(res.body["user"].get("password_hash").is_none());

    let cookie = res
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("signup should set a session cookie")
        .to_string();

    // Wrong password gets the generic message
    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/auth/signin",
            r#"{"email":"meera@example.com","password":"wrong password"}"#,
            None,
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid email or password");

    let res = send(router(&state), get("/api/auth/user", Some(&cookie))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["profile_complete"], false);

    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/categories",
            r##"{"name":"Groceries","category_type":"expense","color":"#22aa55"}"##,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let category_id = res.body["category"]["id"].as_str().unwrap().to_string();

    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/categories",
            r#"{"name":"Groceries","category_type":"expense"}"#,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let body = format!(
        r#"{{"amount":"450.50","payment_type":"expense","category_id":"{}","payment_date":"2024-03-10"}}"#,
        category_id
    );
    let res = send(router(&state), json_request("POST", "/api/payments", &body, Some(&cookie))).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let groceries_id = res.body["payment"]["id"].as_str().unwrap().to_string();

    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/payments",
            r#"{"amount":"50000","payment_type":"income","payment_date":"2024-03-01"}"#,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);

    // Income payment against an expense category
    let body = format!(
        r#"{{"amount":"10","payment_type":"income","category_id":"{}"}}"#,
        category_id
    );
    let res = send(router(&state), json_request("POST", "/api/payments", &body, Some(&cookie))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(
        router(&state),
        get("/api/payments/stats?from=2024-03-01&to=2024-03-31", Some(&cookie)),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let stats = &res.body["stats"];
    assert_eq!(stats["transaction_count"], 2);
    assert_eq!(dec(stats["total_income"].as_str().unwrap()), dec("50000"));
    assert_eq!(dec(stats["total_expense"].as_str().unwrap()), dec("450.50"));
    assert_eq!(dec(stats["net_balance"].as_str().unwrap()), dec("49549.50"));

    // An explicit null drops the category so the entry can become income
    let res = send(
        router(&state),
        json_request(
            "PUT",
            &format!("/api/payments/{}", groceries_id),
            r#"{"payment_type":"income","category_id":null}"#,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["payment"]["payment_type"], "income");
    assert!(res.body["payment"]["category_id"].is_null());

    // Leaving the field out keeps whatever is stored
    let body = format!(r#"{{"payment_type":"expense","category_id":"{}"}}"#, category_id);
    let res = send(
        router(&state),
        json_request("PUT", &format!("/api/payments/{}", groceries_id), &body, Some(&cookie)),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let res = send(
        router(&state),
        json_request(
            "PUT",
            &format!("/api/payments/{}", groceries_id),
            r#"{"description":"Weekly shop"}"#,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["payment"]["category_id"], category_id.as_str());

    let res = send(
        router(&state),
        json_request(
            "POST",
            "/api/reports/generate",
            r#"{"format":"excel","from":"2024-03-01","to":"2024-03-31"}"#,
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let disposition = res
        .headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(
        disposition,
        "attachment; filename=\"paydhan-report-2024-03-01-2024-03-31.xlsx\""
    );
}

/// Create group → invite → accept → split an expense → settle via approval
#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_group_expense_flow(pool: PgPool) {
    let state = state_from_pool(pool);

    let asha = create_test_user(&state, "asha").await;
    let ravi = create_test_user(&state, "ravi").await;
    let kiran = create_test_user(&state, "kiran").await;

    let group = create_test_group(&state, &asha, &[&ravi]).await;

    // Step 1: invite kiran by username and accept
    let invite = state
        .group_service
        .invite(
            group.id,
            asha.id,
            &InviteRequest {
                username: Some("Kiran".to_string()),
                email: None,
            },
        )
        .await
        .expect("Failed to invite");

    let duplicate = state
        .group_service
        .invite(
            group.id,
            ravi.id,
            &InviteRequest {
                username: None,
                email: Some("kiran@example.com".to_string()),
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let pending = state.invite_service.pending(kiran.id).await.unwrap();
    assert_eq!(pending.len(), 1);

    // Only the invitee may answer
    let wrong = state.invite_service.accept(invite.id, ravi.id).await;
    assert!(wrong.is_err());

    state
        .invite_service
        .accept(invite.id, kiran.id)
        .await
        .expect("Failed to accept");
    let again = state.invite_service.decline(invite.id, kiran.id).await;
    assert!(matches!(again, Err(AppError::BusinessLogic(_))));

    let members = state.group_service.members(group.id, kiran.id).await.unwrap();
    assert_eq!(members.len(), 3);

    // Members see each other's names and roles, never email addresses
    let res = send(
        router(&state),
        get(
            &format!("/api/groups/{}/members", group.id),
            Some(&session_cookie(&state, kiran.id)),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let listed = res.body["members"].as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|m| m.get("email").is_none()));
    assert!(listed.iter().any(|m| m["username"] == "asha" && m["role"] == "admin"));

    // Step 2: asha pays 100.00 split three ways
    let created = state
        .expense_service
        .create(
            group.id,
            asha.id,
            &CreateExpenseRequest {
                description: "Dinner".to_string(),
                amount: dec("100.00"),
                paid_by: None,
                split_type: "equal".to_string(),
                participants: Some(vec![asha.id, ravi.id, kiran.id]),
                splits: None,
            },
        )
        .await
        .expect("Failed to create expense");

    let total: Decimal = created.splits.iter().map(|s| s.amount).sum();
    assert_eq!(total, dec("100.00"));
    assert!(!created.expense.is_settled);

    let payer_split = created.splits.iter().find(|s| s.user_id == asha.id).unwrap();
    assert!(payer_split.is_settled);
    let ravi_split = created.splits.iter().find(|s| s.user_id == ravi.id).unwrap().clone();
    let kiran_split = created.splits.iter().find(|s| s.user_id == kiran.id).unwrap().clone();

    // Every other participant was notified
    let (notes, unread) = state
        .notification_service
        .list(ravi.id, &ListNotificationsQuery::default())
        .await
        .unwrap();
    assert_eq!(unread, 1);
    assert_eq!(notes[0].kind, "expense_added");

    // Step 3: only the payer can remind
    let forbidden = state.settlement_service.remind(created.expense.id, ravi.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    let reminded = state
        .settlement_service
        .remind(created.expense.id, asha.id)
        .await
        .unwrap();
    assert_eq!(reminded, 2);

    // Step 4: approval round trips
    let approve_early = state.settlement_service.approve(ravi_split.id, asha.id).await;
    assert!(matches!(approve_early, Err(AppError::BusinessLogic(_))));

    state
        .settlement_service
        .request_approval(ravi_split.id, ravi.id)
        .await
        .unwrap();
    let rejected = state
        .settlement_service
        .reject(ravi_split.id, asha.id)
        .await
        .unwrap();
    assert!(!rejected.approval_requested);
    assert!(!rejected.is_settled);

    for (split, owner) in [(&ravi_split, &ravi), (&kiran_split, &kiran)] {
        state
            .settlement_service
            .request_approval(split.id, owner.id)
            .await
            .unwrap();
        let settled = state
            .settlement_service
            .approve(split.id, asha.id)
            .await
            .unwrap();
        assert!(settled.is_settled);
    }

    let expenses = state.expense_service.list(group.id, kiran.id).await.unwrap();
    assert_eq!(expenses.len(), 1);
    assert!(expenses[0].expense.is_settled);
    assert!(expenses[0].splits.iter().all(|s| s.is_settled));

    // Nothing left to chase
    let nothing = state.settlement_service.remind(created.expense.id, asha.id).await;
    assert!(matches!(nothing, Err(AppError::BusinessLogic(_))));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_custom_split_and_admin_settle(pool: PgPool) {
    let state = state_from_pool(pool);

    let asha = create_test_user(&state, "asha").await;
    let ravi = create_test_user(&state, "ravi").await;
    let outsider = create_test_user(&state, "outsider").await;
    let group = create_test_group(&state, &asha, &[&ravi]).await;

    let bad_sum = state
        .expense_service
        .create(
            group.id,
            ravi.id,
            &CreateExpenseRequest {
                description: "Cab".to_string(),
                amount: dec("300"),
                paid_by: None,
                split_type: "custom".to_string(),
                participants: None,
                splits: Some(vec![
                    SplitInput { user_id: asha.id, amount: dec("100") },
                    SplitInput { user_id: ravi.id, amount: dec("150") },
                ]),
            },
        )
        .await;
    match bad_sum {
        Err(AppError::Validation(msg)) => {
            assert_eq!(msg, "Split amounts must add up to the expense total")
        }
        other => panic!("expected validation error, got {:?}", other.map(|e| e.expense.id)),
    }

    let not_member = state
        .expense_service
        .create(
            group.id,
            ravi.id,
            &CreateExpenseRequest {
                description: "Cab".to_string(),
                amount: dec("300"),
                paid_by: None,
                split_type: "custom".to_string(),
                participants: None,
                splits: Some(vec![
                    SplitInput { user_id: outsider.id, amount: dec("100") },
                    SplitInput { user_id: ravi.id, amount: dec("200") },
                ]),
            },
        )
        .await;
    assert!(matches!(not_member, Err(AppError::Validation(_))));

    let created = state
        .expense_service
        .create(
            group.id,
            ravi.id,
            &CreateExpenseRequest {
                description: "Cab".to_string(),
                amount: dec("300"),
                paid_by: None,
                split_type: "custom".to_string(),
                participants: None,
                splits: Some(vec![
                    SplitInput { user_id: asha.id, amount: dec("120.50") },
                    SplitInput { user_id: ravi.id, amount: dec("179.50") },
                ]),
            },
        )
        .await
        .unwrap();

    // asha is an admin, not the payer, and may still settle everything
    let settled = state
        .settlement_service
        .settle_expense(created.expense.id, asha.id)
        .await
        .unwrap();
    assert!(settled.is_settled);

    let twice = state
        .settlement_service
        .settle_expense(created.expense.id, asha.id)
        .await;
    assert!(matches!(twice, Err(AppError::BusinessLogic(_))));

    let outsider_view = state.expense_service.list(group.id, outsider.id).await;
    assert!(matches!(outsider_view, Err(AppError::Forbidden(_))));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_leave_promotes_then_deletes(pool: PgPool) {
    let state = state_from_pool(pool);

    let asha = create_test_user(&state, "asha").await;
    let ravi = create_test_user(&state, "ravi").await;
    let group = create_test_group(&state, &asha, &[&ravi]).await;

    let outcome = state.group_service.leave(group.id, asha.id).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::LeftAndPromoted { promoted: ravi.id });

    let details = state.group_service.get(group.id, ravi.id).await.unwrap();
    assert_eq!(details.members.len(), 1);
    assert_eq!(details.members[0].role, "admin");

    let outcome = state.group_service.leave(group.id, ravi.id).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::GroupDeleted);

    let gone = state.group_service.get(group.id, ravi.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_equal_split_below_a_paisa_each(pool: PgPool) {
    let state = state_from_pool(pool);

    let asha = create_test_user(&state, "asha").await;
    let ravi = create_test_user(&state, "ravi").await;
    let kiran = create_test_user(&state, "kiran").await;
    let group = create_test_group(&state, &asha, &[&ravi, &kiran]).await;

    let res = send(
        router(&state),
        json_request(
            "POST",
            &format!("/api/groups/{}/expenses", group.id),
            r#"{"description":"Toffee","amount":"0.02","split_type":"equal"}"#,
            Some(&session_cookie(&state, asha.id)),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Amount is too small to split between 3 participants");

    let expenses = state.expense_service.list(group.id, asha.id).await.unwrap();
    assert!(expenses.is_empty());

    // Three paise is the smallest amount three people can share
    let res = send(
        router(&state),
        json_request(
            "POST",
            &format!("/api/groups/{}/expenses", group.id),
            r#"{"description":"Toffee","amount":"0.03","split_type":"equal"}"#,
            Some(&session_cookie(&state, asha.id)),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_complete_profile_and_reset_pin(pool: PgPool) {
    let state = state_from_pool(pool);
    let auth = &state.auth_service;

    let asha = create_test_user(&state, "asha").await;
    let meera = auth
        .signup(&SignupRequest {
            email: "meera@example.com".to_string(),
            password: "correct horse".to_string(),
            full_name: Some("Meera".to_string()),
        })
        .await
        .unwrap();
    assert!(!meera.profile_complete());

    // Username owned by someone else
    let taken = auth
        .complete_profile(
            meera.id,
            &UsernamePinRequest {
                username: "Asha".to_string(),
                pin: "5678".to_string(),
                full_name: None,
            },
        )
        .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let completed = auth
        .complete_profile(
            meera.id,
            &UsernamePinRequest {
                username: "meera".to_string(),
                pin: "5678".to_string(),
                full_name: None,
            },
        )
        .await
        .unwrap();
    assert!(completed.profile_complete());
    assert_eq!(completed.username.as_deref(), Some("meera"));

    for user_id in [meera.id, asha.id] {
        let again = auth
            .complete_profile(
                user_id,
                &UsernamePinRequest {
                    username: "someone_new".to_string(),
                    pin: "0000".to_string(),
                    full_name: None,
                },
            )
            .await;
        match again {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Profile is already complete"),
            other => panic!("expected validation error, got {:?}", other.map(|u| u.id)),
        }
    }

    let reset = |current_pin: Option<&str>, password: Option<&str>, new_pin: &str| ResetPinRequest {
        current_pin: current_pin.map(String::from),
        password: password.map(String::from),
        new_pin: new_pin.to_string(),
    };

    let neither = auth.reset_pin(meera.id, &reset(None, None, "1111")).await;
    assert!(matches!(neither, Err(AppError::Validation(_))));

    let wrong_pin = auth.reset_pin(meera.id, &reset(Some("0000"), None, "1111")).await;
    assert!(matches!(wrong_pin, Err(AppError::Unauthorized(_))));

    let wrong_password = auth
        .reset_pin(meera.id, &reset(None, Some("not my password"), "1111"))
        .await;
    assert!(matches!(wrong_password, Err(AppError::Unauthorized(_))));

    // asha never set a password, so a password cannot prove who she is
    let no_password = auth
        .reset_pin(asha.id, &reset(None, Some("correct horse"), "1111"))
        .await;
    assert!(matches!(no_password, Err(AppError::Unauthorized(_))));

    auth.reset_pin(meera.id, &reset(None, Some("correct horse"), "2468"))
        .await
        .unwrap();
    auth.reset_pin(asha.id, &reset(Some("1234"), None, "4321"))
        .await
        .unwrap();

    let login = |username: &str, pin: &str| PinLoginRequest {
        username: username.to_string(),
        pin: pin.to_string(),
    };
    assert_eq!(auth.login(&login("meera", "2468")).await.unwrap().id, meera.id);
    assert!(matches!(
        auth.login(&login("meera", "5678")).await,
        Err(AppError::Unauthorized(_))
    ));
    assert_eq!(auth.login(&login("asha", "4321")).await.unwrap().id, asha.id);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_google_identity_resolution(pool: PgPool) {
    let state = state_from_pool(pool);
    let auth = &state.auth_service;

    let asha = create_test_user(&state, "asha").await;
    let profile = |sub: &str, email: &str, verified: Option<bool>| GoogleProfile {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        email_verified: verified,
        name: Some("Google Name".to_string()),
        picture: Some("https://example.com/a.png".to_string()),
    };

    // Unverified address must not take over the existing account
    for verified in [Some(false), None] {
        let refused = auth
            .google_sign_in(&profile("g-unverified", "asha@example.com", verified))
            .await;
        assert!(matches!(refused, Err(AppError::Unauthorized(_))));
    }
    let untouched = UserRepository::new(state.database.pool().clone())
        .find_by_id(asha.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.google_id, None);

    // Verified address links by email
    let linked = auth
        .google_sign_in(&profile("g-asha", "Asha@Example.com", Some(true)))
        .await
        .unwrap();
    assert_eq!(linked.id, asha.id);
    assert_eq!(linked.google_id.as_deref(), Some("g-asha"));
    assert_eq!(linked.username.as_deref(), Some("asha"));

    // Known Google id wins regardless of the email it reports
    let again = auth
        .google_sign_in(&profile("g-asha", "other@example.com", None))
        .await
        .unwrap();
    assert_eq!(again.id, asha.id);

    // A second Google account cannot replace the first link
    let hijack = auth
        .google_sign_in(&profile("g-other", "asha@example.com", Some(true)))
        .await;
    assert!(matches!(hijack, Err(AppError::Conflict(_))));

    // Unknown verified email becomes a new account
    let fresh = auth
        .google_sign_in(&profile("g-new", "new@example.com", Some(true)))
        .await
        .unwrap();
    assert_eq!(fresh.email.as_deref(), Some("new@example.com"));
    assert_eq!(fresh.full_name.as_deref(), Some("Google Name"));
    assert!(!fresh.profile_complete());
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_remove_member_rules(pool: PgPool) {
    let state = state_from_pool(pool);

    let asha = create_test_user(&state, "asha").await;
    let ravi = create_test_user(&state, "ravi").await;
    let kiran = create_test_user(&state, "kiran").await;
    let group = create_test_group(&state, &asha, &[&ravi, &kiran]).await;

    let not_admin = state.group_service.remove_member(group.id, ravi.id, kiran.id).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden(_))));

    let self_removal = state.group_service.remove_member(group.id, asha.id, asha.id).await;
    assert!(matches!(self_removal, Err(AppError::Validation(_))));

    state
        .group_service
        .remove_member(group.id, asha.id, kiran.id)
        .await
        .unwrap();

    let twice = state.group_service.remove_member(group.id, asha.id, kiran.id).await;
    assert!(matches!(twice, Err(AppError::NotFound(_))));

    let members = state.group_service.members(group.id, asha.id).await.unwrap();
    assert_eq!(members.len(), 2);
    let gone = state.group_service.members(group.id, kiran.id).await;
    assert!(matches!(gone, Err(AppError::Forbidden(_))));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn test_accept_keeps_invite_pending_when_join_fails(pool: PgPool) {
    let state = state_from_pool(pool.clone());

    let asha = create_test_user(&state, "asha").await;
    let kiran = create_test_user(&state, "kiran").await;
    let group = create_test_group(&state, &asha, &[]).await;

    let invite = state
        .group_service
        .invite(
            group.id,
            asha.id,
            &InviteRequest {
                username: Some("kiran".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();

    // Refuse any new membership row
    sqlx::query("ALTER TABLE group_members ADD CONSTRAINT no_new_members CHECK (false) NOT VALID")
        .execute(&pool)
        .await
        .unwrap();

    let failed = state.invite_service.accept(invite.id, kiran.id).await;
    assert!(matches!(failed, Err(AppError::Validation(_))));

    let pending = state.invite_service.pending(kiran.id).await.unwrap();
    assert_eq!(pending.len(), 1);

    sqlx::query("ALTER TABLE group_members DROP CONSTRAINT no_new_members")
        .execute(&pool)
        .await
        .unwrap();

    let accepted = state.invite_service.accept(invite.id, kiran.id).await.unwrap();
    assert_eq!(accepted.status, "accepted");
    let members = state.group_service.members(group.id, kiran.id).await.unwrap();
    assert_eq!(members.len(), 2);
}
