//! Behavioural tests for per-role session state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use pagewright::browser::{BrowserError, Locator};
use pagewright::storage::{LoginFlow, MemoryStateStore, StateStore};
use pagewright::test_support::RecordingBrowser;
use pagewright::{ExecutionContext, FileStateStore, StepError, StorageStateManager};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

/// Types the role name into the login form and counts attempts.
#[derive(Default)]
struct FormLogin {
    attempts: AtomicUsize,
    pause: Duration,
}

impl FormLogin {
    fn with_pause(pause: Duration) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            pause,
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginFlow for FormLogin {
    async fn login(&self, role: &str, ctx: &mut ExecutionContext) -> Result<(), StepError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.pause).await;
        let page = ctx.page()?;
        page.goto("/").await?;
        page.fill(&Locator::test_id("username"), role).await?;
        page.click(&Locator::test_id("login-button")).await?;
        Ok(())
    }
}

#[fixture]
fn browser() -> RecordingBrowser {
    let browser = RecordingBrowser::new();
    browser.set_storage_state(json!({"cookies": [{"name": "session-username"}]}));
    browser
}

fn manager(
    browser: &RecordingBrowser,
    store: Arc<dyn StateStore>,
    login: &Arc<FormLogin>,
) -> StorageStateManager {
    let login: Arc<dyn LoginFlow> = Arc::clone(login) as Arc<dyn LoginFlow>;
    StorageStateManager::new(Arc::new(browser.clone()), store, login)
}

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    #[expect(clippy::expect_used, reason = "temp dirs have UTF-8 paths in tests")]
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path")
}

#[rstest]
#[tokio::test]
async fn repeated_ensure_logs_in_once(browser: RecordingBrowser) {
    let login = Arc::new(FormLogin::default());
    let manager = manager(&browser, Arc::new(MemoryStateStore::new()), &login);

    let first = manager.ensure("admin").await;
    let second = manager.ensure("admin").await;

    assert_eq!(login.attempts(), 1);
    assert!(first.is_ok());
    assert_eq!(first, second);
    assert_eq!(browser.opened_pages(), 1);
    assert_eq!(browser.closed_pages(), 1);
    assert_eq!(
        browser.calls(),
        [
            "goto /",
            "fill data-test=username admin",
            "click data-test=login-button",
            "storage_state",
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_login(browser: RecordingBrowser) {
    let login = Arc::new(FormLogin::with_pause(Duration::from_millis(50)));
    let manager = Arc::new(manager(&browser, Arc::new(MemoryStateStore::new()), &login));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.ensure("admin").await })
        })
        .collect();
    let mut states = Vec::new();
    for handle in handles {
        let Ok(Ok(state)) = handle.await else {
            panic!("ensure should succeed");
        };
        states.push(state);
    }

    assert_eq!(login.attempts(), 1);
    assert!(states.windows(2).all(|pair| pair.first() == pair.last()));
}

#[rstest]
#[tokio::test]
async fn roles_are_independent(browser: RecordingBrowser) {
    let login = Arc::new(FormLogin::with_pause(Duration::from_millis(10)));
    let manager = manager(&browser, Arc::new(MemoryStateStore::new()), &login);

    let (admin, user) = tokio::join!(manager.ensure("admin"), manager.ensure("standard_user"));

    assert_eq!(login.attempts(), 2);
    assert_eq!(admin.map(|state| state.role).ok().as_deref(), Some("admin"));
    assert_eq!(
        user.map(|state| state.role).ok().as_deref(),
        Some("standard_user")
    );
}

#[rstest]
#[tokio::test]
async fn failed_login_is_reported_and_not_retried(browser: RecordingBrowser) {
    browser.fail_on(
        "click data-test=login-button",
        BrowserError::ElementNotFound(Locator::test_id("login-button")),
    );
    let login = Arc::new(FormLogin::default());
    let manager = manager(&browser, Arc::new(MemoryStateStore::new()), &login);

    let Err(first) = manager.ensure("locked_out_user").await else {
        panic!("login should fail");
    };
    let second = manager.ensure("locked_out_user").await;

    assert_eq!(first.role, "locked_out_user");
    assert!(first.reason.contains("login-button"), "{}", first.reason);
    assert_eq!(second, Err(first));
    assert_eq!(login.attempts(), 1);
    assert_eq!(browser.closed_pages(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn deadline_cuts_a_slow_login_short_and_closes_its_page(browser: RecordingBrowser) {
    let login = Arc::new(FormLogin::with_pause(Duration::from_secs(60)));
    let store = Arc::new(MemoryStateStore::new());
    let manager = manager(&browser, Arc::clone(&store) as Arc<dyn StateStore>, &login);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    let Err(err) = manager.ensure_before("admin", Some(deadline)).await else {
        panic!("login should run out of time");
    };
    assert_eq!(err.reason, "run deadline exceeded during login");
    assert_eq!(browser.opened_pages(), 1);
    assert_eq!(browser.closed_pages(), 1);
    assert!(matches!(store.load("admin"), Ok(None)));

    assert_eq!(manager.ensure("admin").await, Err(err));
    assert_eq!(login.attempts(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn deadline_bounds_the_wait_for_another_login(browser: RecordingBrowser) {
    let login = Arc::new(FormLogin::with_pause(Duration::from_secs(60)));
    let manager = Arc::new(manager(&browser, Arc::new(MemoryStateStore::new()), &login));
    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.ensure("admin").await })
    };
    tokio::task::yield_now().await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let waiting = manager.ensure_before("admin", Some(deadline)).await;
    assert!(waiting.is_err_and(|err| err.reason == "run deadline exceeded during login"));

    let Ok(Ok(state)) = first.await else {
        panic!("the unbounded login should finish");
    };
    assert_eq!(state.role, "admin");
    assert_eq!(login.attempts(), 1);
}

#[rstest]
#[tokio::test]
async fn adapter_failure_becomes_auth_error(browser: RecordingBrowser) {
    browser.fail_open(BrowserError::Adapter("browser binary missing".into()));
    let login = Arc::new(FormLogin::default());
    let manager = manager(&browser, Arc::new(MemoryStateStore::new()), &login);

    let Err(err) = manager.ensure("admin").await else {
        panic!("ensure should fail");
    };
    assert!(err.reason.contains("could not open a browser page"), "{err}");
    assert_eq!(login.attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn persisted_state_is_reused_by_later_runs(browser: RecordingBrowser) {
    #[expect(clippy::expect_used, reason = "tests need a scratch directory")]
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = utf8(&temp).join("state");
    let login = Arc::new(FormLogin::default());
    let open_store = || -> Arc<dyn StateStore> {
        match FileStateStore::open(&root) {
            Ok(store) => Arc::new(store),
            Err(err) => panic!("store should open: {err}"),
        }
    };

    let first_run = manager(&browser, open_store(), &login);
    let Ok(captured) = first_run.ensure("admin").await else {
        panic!("first run should log in");
    };
    assert!(root.join("admin.json").exists());

    let second_run = manager(&browser, open_store(), &login);
    let restored = second_run.ensure("admin").await;
    assert_eq!(restored.as_ref(), Ok(&captured));
    assert_eq!(login.attempts(), 1);

    let forced = manager(&browser, open_store(), &login).with_regeneration(true);
    assert!(forced.ensure("admin").await.is_ok());
    assert!(forced.ensure("admin").await.is_ok());
    assert_eq!(login.attempts(), 2);
}

#[rstest]
#[tokio::test]
async fn unreadable_state_is_regenerated(browser: RecordingBrowser) {
    #[expect(clippy::expect_used, reason = "tests need a scratch directory")]
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = utf8(&temp);
    assert!(std::fs::write(root.join("admin.json"), "{not json").is_ok());
    let Ok(store) = FileStateStore::open(&root) else {
        panic!("store should open");
    };
    let login = Arc::new(FormLogin::default());
    let manager = manager(&browser, Arc::new(store), &login);

    assert!(manager.ensure("admin").await.is_ok());
    assert_eq!(login.attempts(), 1);
}
