use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{
    AgentRunner, BrowserError, BrowserPort, FailureReason, FlowError, OverlayMark, RunRequest,
    RunResult, OTHER_OVERLAY_COLOR,
};
use action_locator::Locator;
use async_trait::async_trait;
use labelpilot_core_types::{ActionKind, RawElement};
use labelpilot_policy_center::PolicyHandle;
use parking_lot::Mutex;
use perceiver_semantic::{LabelerPort, RawLabel};
use perceiver_structural::Batch;

#[derive(Default)]
struct MockBrowser {
    page: Option<RawElement>,
    hang_on: Option<String>,
    fail_on: Option<String>,
    screenshot_fails: bool,
    stalled: bool,
    actions: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<String>>,
    marks: Mutex<Vec<OverlayMark>>,
}

impl MockBrowser {
    fn with_page(page: RawElement) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    fn actions(&self) -> Vec<String> {
        self.actions.lock().clone()
    }
}

#[async_trait]
impl BrowserPort for MockBrowser {
    async fn capture(&self, url: &str) -> Result<RawElement, BrowserError> {
        if self.stalled && self.page.is_none() {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.page.clone().ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            reason: "connection refused".into(),
        })
    }

    async fn wait_for_selector(&self, locator: &Locator) -> Result<(), BrowserError> {
        if self.stalled || self.hang_on.as_deref() == Some(locator.as_str()) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        if self.fail_on.as_deref() == Some(locator.as_str()) {
            return Err(BrowserError::Action {
                selector: locator.to_string(),
                reason: "element detached".into(),
            });
        }
        self.actions.lock().push(format!("click {locator}"));
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.actions.lock().push(format!("type {locator} {text}"));
        Ok(())
    }

    async fn screenshot(&self, name: &str) -> Result<PathBuf, BrowserError> {
        if self.stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.screenshot_fails {
            return Err(BrowserError::Screenshot("page crashed".into()));
        }
        self.screenshots.lock().push(name.to_string());
        Ok(PathBuf::from("artifacts").join(name))
    }

    async fn highlight(&self, _locator: &Locator, mark: &OverlayMark) -> Result<(), BrowserError> {
        self.marks.lock().push(mark.clone());
        Ok(())
    }
}

/// Labels elements by their exact text; everything else is left unlabeled.
struct ByText(HashMap<&'static str, (&'static str, f64, bool)>);

impl ByText {
    fn new(entries: &[(&'static str, &'static str, f64)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(text, intent, conf)| (*text, (*intent, *conf, false)))
                .collect(),
        )
    }
}

#[async_trait]
impl LabelerPort for ByText {
    fn name(&self) -> &str {
        "by-text"
    }

    async fn label(&self, batch: &Batch) -> perceiver_semantic::Result<Vec<RawLabel>> {
        Ok(batch
            .elements
            .iter()
            .filter_map(|el| {
                self.0.get(el.text.as_str()).map(|(intent, conf, important)| {
                    RawLabel::new(*intent, *conf)
                        .at(el.node_index)
                        .important(*important)
                })
            })
            .collect())
    }
}

fn login_page() -> RawElement {
    RawElement::new("body", "").with_child(
        RawElement::new("form", "").with_children([
            RawElement::new("input", "Username").with_id("user"),
            RawElement::new("input", "Password").with_id("pass"),
            RawElement::new("button", "Log in").with_id("go").clickable(),
        ]),
    )
}

fn runner(browser: Arc<MockBrowser>, labeler: ByText) -> AgentRunner {
    AgentRunner::new(browser, PolicyHandle::default())
        .expect("runner")
        .with_local_labeler(Arc::new(labeler))
}

fn login_request() -> RunRequest {
    RunRequest::new("https://example.com/login", "login")
        .with_input("input-username", "alice")
        .with_input("input-password", "hunter2")
}

#[tokio::test]
async fn dry_run_without_usable_labels_returns_plan() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let outcome = runner(browser.clone(), ByText::new(&[]))
        .run(login_request().dry_run(true))
        .await
        .unwrap();

    match outcome.result {
        RunResult::DryRun {
            planned_actions,
            usable_labels,
        } => {
            assert_eq!(planned_actions.len(), 3);
            assert_eq!(planned_actions[2].intent, "login-button");
            assert_eq!(planned_actions[2].action, ActionKind::Click);
            assert!(usable_labels.is_empty());
        }
        other => panic!("expected dry run, got {other:?}"),
    }
    assert!(browser.actions().is_empty());
}

#[tokio::test]
async fn missing_login_button_is_incomplete() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let labeler = ByText::new(&[
        ("Username", "input-username", 0.97),
        ("Password", "input-password", 0.97),
    ]);
    let outcome = runner(browser.clone(), labeler)
        .run(login_request())
        .await
        .unwrap();

    match outcome.result {
        RunResult::Incomplete {
            reason,
            missing_intents,
            actions_attempted,
            fallback_ui,
            ..
        } => {
            assert_eq!(reason, "intent-not-found");
            assert_eq!(missing_intents, vec!["login-button".to_string()]);
            assert_eq!(actions_attempted.len(), 2);
            assert!(fallback_ui.message.contains("login-button"));
        }
        other => panic!("expected incomplete, got {other:?}"),
    }
    assert_eq!(
        browser.actions(),
        vec!["type #user alice".to_string(), "type #pass hunter2".to_string()]
    );
}

#[tokio::test]
async fn search_without_submit_succeeds() {
    let page = RawElement::new("body", "")
        .with_child(RawElement::new("input", "Search catalog").with_id("q"));
    let browser = Arc::new(MockBrowser::with_page(page));
    let labeler = ByText::new(&[("Search catalog", "search-box", 0.90)]);
    let request =
        RunRequest::new("https://example.com", "search").with_input("search-box", "rust books");
    let outcome = runner(browser.clone(), labeler).run(request).await.unwrap();

    match outcome.result {
        RunResult::Success { actions_taken, .. } => {
            assert_eq!(actions_taken, vec!["type search-box".to_string()]);
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(browser.actions(), vec!["type #q rust books".to_string()]);
    assert_eq!(outcome.metrics.original_element_count, 2);
}

#[tokio::test]
async fn action_timeout_fails_with_run_screenshot() {
    let page = RawElement::new("body", "")
        .with_child(RawElement::new("a", "Home").with_id("home").clickable());
    let browser = Arc::new(MockBrowser {
        hang_on: Some("#home".into()),
        ..MockBrowser::with_page(page)
    });
    let mut request = RunRequest::new("https://example.com", "navigation");
    request.timeout_ms = 50;
    let outcome = runner(browser.clone(), ByText::new(&[("Home", "nav-link", 0.9)]))
        .run(request)
        .await
        .unwrap();

    let expected = format!("error_{}.png", outcome.run_id);
    match outcome.result {
        RunResult::Failure {
            reason,
            screenshot_path,
            ..
        } => {
            assert_eq!(reason, FailureReason::ActionTimeout);
            let path = screenshot_path.expect("screenshot path");
            assert!(path.ends_with(&expected));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(*browser.screenshots.lock(), vec![expected]);
}

#[tokio::test]
async fn screenshot_failure_keeps_original_error() {
    let page = RawElement::new("body", "")
        .with_child(RawElement::new("a", "Home").with_id("home").clickable());
    let browser = Arc::new(MockBrowser {
        fail_on: Some("#home".into()),
        screenshot_fails: true,
        ..MockBrowser::with_page(page)
    });
    let outcome = runner(browser, ByText::new(&[("Home", "nav-link", 0.9)]))
        .run(RunRequest::new("https://example.com", "navigation"))
        .await
        .unwrap();

    match outcome.result {
        RunResult::Failure {
            reason,
            error,
            screenshot_path,
        } => {
            assert_eq!(reason, FailureReason::ActionFailed);
            assert!(error.contains("element detached"));
            assert!(screenshot_path.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_input_value_is_a_failure() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let labeler = ByText::new(&[("Username", "input-username", 0.97)]);
    let mut request = RunRequest::new("https://example.com/login", "login");
    request.screenshot_on_error = false;
    let outcome = runner(browser.clone(), labeler).run(request).await.unwrap();

    match outcome.result {
        RunResult::Failure {
            reason,
            screenshot_path,
            ..
        } => {
            assert_eq!(reason, FailureReason::MissingInput);
            assert!(screenshot_path.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(browser.screenshots.lock().is_empty());
}

#[tokio::test]
async fn capture_failure_is_navigation_failure() {
    let browser = Arc::new(MockBrowser::default());
    let outcome = runner(browser, ByText::new(&[]))
        .run(login_request())
        .await
        .unwrap();
    match outcome.result {
        RunResult::Failure { reason, error, .. } => {
            assert_eq!(reason, FailureReason::NavigationFailed);
            assert!(error.contains("connection refused"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

fn signup_page() -> RawElement {
    RawElement::new("body", "").with_child(RawElement::new("form", "").with_children([
        RawElement::new("input", "Password").with_id("pw"),
        RawElement::new("button", "Create account").with_id("create"),
    ]))
}

fn signup_labels() -> ByText {
    ByText::new(&[
        ("Password", "input-password", 0.97),
        ("Create account", "submit-form", 0.9),
    ])
}

fn signup_request() -> RunRequest {
    RunRequest::new("https://example.com/signup", "signup").with_input("input-password", "pw")
}

#[tokio::test]
async fn missing_required_keeps_scanning_by_default() {
    let browser = Arc::new(MockBrowser::with_page(signup_page()));
    let outcome = runner(browser, signup_labels())
        .run(signup_request())
        .await
        .unwrap();
    match outcome.result {
        RunResult::Incomplete {
            missing_intents,
            actions_attempted,
            ..
        } => {
            assert_eq!(
                missing_intents,
                vec!["input-username", "input-email", "input-confirm-password"]
            );
            assert_eq!(
                actions_attempted,
                vec!["type input-password", "click submit-form"]
            );
        }
        other => panic!("expected incomplete, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_required_stops_when_retry_disabled() {
    let browser = Arc::new(MockBrowser::with_page(signup_page()));
    let mut request = signup_request();
    request.retry_if_missing = false;
    let outcome = runner(browser.clone(), signup_labels())
        .run(request)
        .await
        .unwrap();
    match outcome.result {
        RunResult::Incomplete {
            missing_intents,
            actions_attempted,
            ..
        } => {
            assert_eq!(missing_intents, vec!["input-username"]);
            assert!(actions_attempted.is_empty());
        }
        other => panic!("expected incomplete, got {other:?}"),
    }
    assert!(browser.actions().is_empty());
}

#[tokio::test]
async fn low_confidence_high_risk_click_never_fires() {
    let page = RawElement::new("body", "").with_child(
        RawElement::new("button", "Delete my account")
            .with_id("del")
            .clickable(),
    );
    let browser = Arc::new(MockBrowser::with_page(page));
    let outcome = runner(
        browser.clone(),
        ByText::new(&[("Delete my account", "delete-account", 0.80)]),
    )
    .run(RunRequest::new("https://example.com/settings", "deleteAccount"))
    .await
    .unwrap();

    assert_eq!(outcome.result.status(), "incomplete");
    assert_eq!(outcome.metrics.high_risk_skipped_count, 1);
    assert!(browser.actions().is_empty());
}

#[tokio::test]
async fn debug_overlay_marks_labeled_elements() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let labeler = ByText::new(&[
        ("Username", "input-username", 0.97),
        ("Password", "input-password", 0.97),
    ]);
    let mut request = login_request().dry_run(true);
    request.debug_overlay = true;
    runner(browser.clone(), labeler).run(request).await.unwrap();

    let marks = browser.marks.lock().clone();
    assert_eq!(marks.len(), 3);
    let password = marks
        .iter()
        .find(|mark| mark.intent == "input-password")
        .unwrap();
    assert_eq!(password.color, "#ffaa00");
    let unlabeled = marks.iter().find(|mark| mark.intent == "other").unwrap();
    assert_eq!(unlabeled.color, OTHER_OVERLAY_COLOR);
}

#[tokio::test]
async fn stalled_page_still_returns_a_failure() {
    let browser = Arc::new(MockBrowser {
        stalled: true,
        ..MockBrowser::with_page(login_page())
    });
    let labeler = ByText::new(&[("Username", "input-username", 0.97)]);
    let request = RunRequest {
        timeout_ms: 50,
        ..login_request()
    };
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        runner(browser.clone(), labeler).run(request),
    )
    .await
    .expect("run returns despite a hung screenshot")
    .unwrap();

    match outcome.result {
        RunResult::Failure {
            reason,
            screenshot_path,
            ..
        } => {
            assert_eq!(reason, FailureReason::ActionTimeout);
            assert!(screenshot_path.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn stalled_capture_is_a_navigation_failure() {
    let browser = Arc::new(MockBrowser {
        stalled: true,
        ..MockBrowser::default()
    });
    let request = RunRequest {
        timeout_ms: 50,
        ..login_request()
    };
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        runner(browser, ByText::new(&[])).run(request),
    )
    .await
    .expect("run returns despite a hung capture")
    .unwrap();

    match outcome.result {
        RunResult::Failure { reason, error, .. } => {
            assert_eq!(reason, FailureReason::NavigationFailed);
            assert!(error.contains("timed out"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_capture() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let runner = runner(browser.clone(), ByText::new(&[]));

    let cases = [
        RunRequest::new("", "login"),
        RunRequest::new("https://example.com", ""),
        RunRequest::new("https://example.com", "teleport"),
        RunRequest {
            timeout_ms: 0,
            ..RunRequest::new("https://example.com", "login")
        },
        RunRequest {
            use_remote_labeler: true,
            ..RunRequest::new("https://example.com", "login")
        },
    ];
    for request in cases {
        let err = runner.run(request).await.unwrap_err();
        assert!(matches!(err, FlowError::Configuration(_)), "{err}");
    }
    assert!(browser.screenshots.lock().is_empty());
}

#[test]
fn runs_can_be_driven_with_block_on() {
    let browser = Arc::new(MockBrowser::with_page(login_page()));
    let runner = runner(browser, ByText::new(&[]));
    let outcome =
        tokio_test::block_on(runner.run(login_request().dry_run(true))).expect("dry run");
    assert_eq!(outcome.result.status(), "dry-run");
}
