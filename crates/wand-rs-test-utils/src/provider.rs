use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use wand_rs_protocol::{Completion, CompletionProvider, ProviderError};

/// Replays a fixed script of outcomes, one per call, and records each prompt.
///
/// Calling past the end of the script returns a provider error.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Result<Completion, ProviderError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Result<Completion, ProviderError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script made only of normal completions with these texts.
    pub fn answering<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(answers.into_iter().map(|text| Ok(Completion::stop(text))))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, system_prompt: &str) -> Result<Completion, ProviderError> {
        self.prompts.lock().push(system_prompt.to_string());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Err(ProviderError::Provider("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Answers every prompt with the same completion.
#[derive(Clone)]
pub struct FixedProvider {
    completion: Completion,
    calls: Arc<AtomicUsize>,
}

impl FixedProvider {
    pub fn new(completion: Completion) -> Self {
        Self {
            completion,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(&self, _system_prompt: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.completion.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails every call with a transport error.
#[derive(Clone, Default)]
pub struct FailingProvider {
    calls: Arc<AtomicUsize>,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _system_prompt: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Answers normally and cancels `token` once it has served `after` calls.
#[derive(Clone)]
pub struct TripwireProvider {
    token: CancellationToken,
    after: usize,
    calls: Arc<AtomicUsize>,
    answer: String,
}

impl TripwireProvider {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        Self {
            token,
            after,
            calls: Arc::new(AtomicUsize::new(0)),
            answer: "amended".to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for TripwireProvider {
    async fn complete(&self, _system_prompt: &str) -> Result<Completion, ProviderError> {
        let served = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if served >= self.after {
            self.token.cancel();
        }
        Ok(Completion::stop(self.answer.clone()))
    }

    fn name(&self) -> &str {
        "tripwire"
    }
}

/// Holds every call until `release` is cancelled, signalling `entered` first.
///
/// Lets a test act while a request is in flight.
#[derive(Clone)]
pub struct GatedProvider {
    entered: CancellationToken,
    release: CancellationToken,
    calls: Arc<AtomicUsize>,
}

impl GatedProvider {
    pub fn new() -> Self {
        Self {
            entered: CancellationToken::new(),
            release: CancellationToken::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolves once the first call has started.
    pub async fn entered(&self) {
        self.entered.cancelled().await;
    }

    /// Let held and future calls complete.
    pub fn release(&self) {
        self.release.cancel();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for GatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for GatedProvider {
    async fn complete(&self, _system_prompt: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.cancel();
        self.release.cancelled().await;
        Ok(Completion::stop("amended"))
    }

    fn name(&self) -> &str {
        "gated"
    }
}
