//! End-to-end acquisition flow against the scripted driver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use secrecy::Secret;
use sessmux_broker::{
    AcquireError, AcquireSettings, CredentialAcquirer, RefreshScheduler, SchedulerConfig,
    SessionStore, now_ms,
};
use sessmux_browser::{
    Cookie, Driver, FieldRole,
    testing::{ScriptedDriver, ScriptedElement, ScriptedPage},
};

fn settings() -> AcquireSettings {
    AcquireSettings {
        sign_in_url: "https://upstream.example/sign-in".into(),
        sign_in_markers: vec!["sign-in".into(), "signin".into(), "login".into()],
        identity: "user@example.com".into(),
        secret: Secret::new("hunter2".into()),
        session_ttl_ms: 60_000,
        navigation_timeout: Duration::from_millis(200),
        probe_timeout: Duration::from_millis(10),
        settle_grace: Duration::ZERO,
        type_delay: Duration::ZERO,
    }
}

fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        refresh_interval: Duration::from_secs(3_600),
        acquire_ceiling: Duration::from_secs(5),
        rejection_alert_threshold: 3,
    }
}

fn granted_page() -> ScriptedPage {
    ScriptedPage::sign_in_form().with_post_submit(
        "https://upstream.example/home",
        vec![Cookie::new("session", "abc"), Cookie::new("csrf", "def")],
    )
}

#[tokio::test]
async fn successful_sign_in_yields_a_snapshot() {
    let driver = Arc::new(ScriptedDriver::new(granted_page()));
    let acquirer = CredentialAcquirer::new(Arc::clone(&driver) as Arc<dyn Driver>, settings());

    let before = now_ms();
    let snapshot = acquirer.acquire().await.unwrap();

    assert_eq!(snapshot.cookie_header(), "session=abc; csrf=def");
    assert_eq!(snapshot.cookies().len(), 2);
    assert!(snapshot.acquired_at_ms() >= before);
    assert_eq!(
        snapshot.expires_at_ms(),
        snapshot.acquired_at_ms() + 60_000
    );

    // Credentials were typed into the right fields, and the submit control
    // was clicked rather than falling back to Enter.
    let log = driver.log();
    assert_eq!(
        log.typed,
        vec![
            ("#username".to_string(), "user@example.com".to_string()),
            ("#password".to_string(), "hunter2".to_string()),
        ]
    );
    assert_eq!(log.clicked, vec![r#"button[type="submit"]"#.to_string()]);
    assert!(!log.enter_pressed);
    assert_eq!(log.closed, 1);
}

#[tokio::test]
async fn missing_submit_control_falls_back_to_enter() {
    let page = ScriptedPage::blank()
        .with_element(ScriptedElement::text_input(
            &["#username"],
            Default::default(),
        ))
        .with_element(ScriptedElement::text_input(
            &["#password"],
            Default::default(),
        ))
        .with_post_submit(
            "https://upstream.example/home",
            vec![Cookie::new("session", "abc")],
        );
    let driver = Arc::new(ScriptedDriver::new(page));
    let acquirer = CredentialAcquirer::new(Arc::clone(&driver) as Arc<dyn Driver>, settings());

    let snapshot = acquirer.acquire().await.unwrap();
    assert_eq!(snapshot.cookie_header(), "session=abc");

    let log = driver.log();
    assert!(log.clicked.is_empty());
    assert!(log.enter_pressed);
    assert_eq!(log.closed, 1);
}

#[tokio::test]
async fn missing_secret_field_fails_without_touching_the_store() {
    // Page with an identity field but no password field anywhere.
    let page = ScriptedPage::blank().with_element(ScriptedElement::text_input(
        &["#username"],
        Default::default(),
    ));
    let driver = Arc::new(ScriptedDriver::new(page));
    let acquirer = Arc::new(CredentialAcquirer::new(
        Arc::clone(&driver) as Arc<dyn Driver>,
        settings(),
    ));

    let store = Arc::new(SessionStore::new());
    let scheduler =
        RefreshScheduler::new(Arc::clone(&store), acquirer, scheduler_config());
    scheduler.refresh_now().await;

    assert!(store.read().is_none());
    assert!(!store.is_refreshing());
    // Nothing was typed, and the session was still closed.
    let log = driver.log();
    assert!(log.typed.is_empty());
    assert_eq!(log.closed, 1);
}

#[tokio::test]
async fn missing_secret_field_reports_the_role() {
    let page = ScriptedPage::blank().with_element(ScriptedElement::text_input(
        &["#username"],
        Default::default(),
    ));
    let acquirer =
        CredentialAcquirer::new(Arc::new(ScriptedDriver::new(page)), settings());

    let err = acquirer.acquire().await.unwrap_err();
    assert!(matches!(
        err,
        AcquireError::FieldNotFound(FieldRole::Secret)
    ));
}

#[tokio::test]
async fn landing_back_on_sign_in_is_a_rejection() {
    // Cookies get set, but the browser never leaves the sign-in surface.
    let page = ScriptedPage::sign_in_form().with_post_submit(
        "https://upstream.example/sign-in?error=invalid",
        vec![Cookie::new("session", "junk")],
    );
    let driver = Arc::new(ScriptedDriver::new(page));
    let acquirer = CredentialAcquirer::new(Arc::clone(&driver) as Arc<dyn Driver>, settings());

    let err = acquirer.acquire().await.unwrap_err();
    assert!(matches!(err, AcquireError::LoginRejected { .. }));
    assert_eq!(driver.log().closed, 1);
}

#[tokio::test]
async fn empty_cookie_jar_is_a_rejection() {
    let page = ScriptedPage::sign_in_form()
        .with_post_submit("https://upstream.example/home", Vec::new());
    let acquirer =
        CredentialAcquirer::new(Arc::new(ScriptedDriver::new(page)), settings());

    let err = acquirer.acquire().await.unwrap_err();
    assert!(matches!(err, AcquireError::LoginRejected { .. }));
}

#[tokio::test]
async fn launch_failure_surfaces_as_launch_error() {
    let driver = ScriptedDriver::new(granted_page()).failing_launch();
    let acquirer = CredentialAcquirer::new(Arc::new(driver), settings());

    let err = acquirer.acquire().await.unwrap_err();
    assert!(matches!(err, AcquireError::Launch(_)));
}

#[tokio::test]
async fn concurrent_triggers_collapse_into_one_acquisition() {
    // Navigation latency holds the first acquisition in flight while the
    // other triggers arrive; the refresh slot must admit exactly one.
    let driver = Arc::new(
        ScriptedDriver::new(granted_page()).with_latency(Duration::from_millis(100)),
    );
    let acquirer = Arc::new(CredentialAcquirer::new(
        Arc::clone(&driver) as Arc<dyn Driver>,
        settings(),
    ));
    let store = Arc::new(SessionStore::new());
    let scheduler =
        RefreshScheduler::new(Arc::clone(&store), acquirer, scheduler_config());

    let (first, second, third) = tokio::join!(
        scheduler.refresh_now(),
        scheduler.refresh_now(),
        scheduler.refresh_now()
    );

    assert_eq!(
        [first, second, third].iter().filter(|ran| **ran).count(),
        1
    );
    assert_eq!(driver.open_count(), 1);
    assert_eq!(store.read().unwrap().cookie_header(), "session=abc; csrf=def");
}

#[tokio::test]
async fn stale_snapshot_is_served_while_a_refresh_runs() {
    let driver = Arc::new(
        ScriptedDriver::new(granted_page()).with_latency(Duration::from_millis(100)),
    );
    let acquirer = Arc::new(CredentialAcquirer::new(
        Arc::clone(&driver) as Arc<dyn Driver>,
        settings(),
    ));
    let store = Arc::new(SessionStore::new());

    // Seed an already-expired snapshot.
    let stale = sessmux_broker::CredentialSnapshot::from_cookies(
        vec![Cookie::new("session", "stale")],
        now_ms() - 120_000,
        60_000,
    )
    .unwrap();
    store.commit(stale);
    assert!(store.is_expired(now_ms()));

    let scheduler =
        RefreshScheduler::new(Arc::clone(&store), acquirer, scheduler_config());
    let refresh = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.refresh_now().await }
    });

    // While the refresh is in flight, readers still get the stale snapshot.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.read().unwrap().cookie_header(), "session=stale");

    refresh.await.unwrap();
    assert_eq!(store.read().unwrap().cookie_header(), "session=abc; csrf=def");
    assert!(!store.is_expired(now_ms()));
}
