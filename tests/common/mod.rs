#![allow(dead_code)]

pub mod fixtures;

use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use rickdash::cancel::CancelToken;
use rickdash::error::{Result, RickdashError};
use rickdash::search::{SearchCoordinator, SearchSnapshot};
use rickdash::source::{Page, PageRequest, PageSource};
use rickdash::types::Character;

/// Scripted reply of a [`MockSource`]
pub struct MockReply {
    pub delay: Duration,
    pub result: Result<Page<Character>>,
}

impl MockReply {
    pub fn ok(page: Page<Character>) -> Self {
        Self::ok_after(Duration::ZERO, page)
    }

    pub fn ok_after(delay: Duration, page: Page<Character>) -> Self {
        MockReply {
            delay,
            result: Ok(page),
        }
    }

    pub fn fail(error: RickdashError) -> Self {
        MockReply {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }
}

type Responder = dyn Fn(&PageRequest) -> MockReply + Send + Sync;

struct MockInner {
    responder: Box<Responder>,
    calls: Mutex<Vec<PageRequest>>,
    tokens: Mutex<Vec<CancelToken>>,
    ignore_cancellation: AtomicBool,
}

/// In-memory page source that records every request
#[derive(Clone)]
pub struct MockSource {
    inner: Arc<MockInner>,
}

impl MockSource {
    pub fn new(responder: impl Fn(&PageRequest) -> MockReply + Send + Sync + 'static) -> Self {
        MockSource {
            inner: Arc::new(MockInner {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
                tokens: Mutex::new(Vec::new()),
                ignore_cancellation: AtomicBool::new(false),
            }),
        }
    }

    /// Behave like a transport that cannot abort: always run to completion.
    pub fn ignoring_cancellation(self) -> Self {
        self.inner.ignore_cancellation.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<PageRequest> {
        self.inner.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    pub fn tokens(&self) -> Vec<CancelToken> {
        self.inner.tokens.lock().clone()
    }

    pub fn last_token(&self) -> Option<CancelToken> {
        self.inner.tokens.lock().last().cloned()
    }
}

impl PageSource for MockSource {
    type Item = Character;

    async fn fetch_page(
        &self,
        request: &PageRequest,
        token: &CancelToken,
    ) -> Result<Page<Character>> {
        self.inner.calls.lock().push(request.clone());
        self.inner.tokens.lock().push(token.clone());
        let MockReply { delay, result } = (self.inner.responder)(request);

        if self.inner.ignore_cancellation.load(Ordering::SeqCst) {
            tokio::time::sleep(delay).await;
            return result;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(token.to_error()),
            _ = tokio::time::sleep(delay) => result,
        }
    }
}

/// Wait for a coordinator state, failing the test instead of hanging.
pub async fn settle<S, F>(
    coordinator: &SearchCoordinator<S>,
    predicate: F,
) -> SearchSnapshot<S::Item>
where
    S: PageSource,
    F: FnMut(&SearchSnapshot<S::Item>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), coordinator.wait_for(predicate))
        .await
        .expect("coordinator never reached the expected state")
}

/// Runs the `rickdash` binary with an isolated config file
pub struct RickdashTest {
    pub temp_dir: TempDir,
    endpoint: Option<String>,
}

impl RickdashTest {
    pub fn new() -> Self {
        RickdashTest {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("Failed to write config");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_rickdash"));
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("RICKDASH_CONFIG", self.config_path())
            .env_remove("RICKDASH_ENDPOINT")
            .env_remove("RICKDASH_LOG");
        if let Some(endpoint) = &self.endpoint {
            command.env("RICKDASH_ENDPOINT", endpoint);
        }
        command.output().expect("Failed to execute command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "Command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
