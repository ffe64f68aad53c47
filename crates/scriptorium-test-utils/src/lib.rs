//! Testing utilities for the Scriptorium workspace
//!
//! Shared fixtures and in-memory collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use scriptorium_core::{
    ordering_key, Acquirer, ArtifactRef, ChallengeError, ChallengeSource, CollaboratorError,
    DiscoveredItem, ExtractionError, Group, Item, KeySource, Lister, Navigator, Session,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn item(title: &str, group: u32, label: &str) -> Item {
    let key = ordering_key(label).expect("fixture label must hold a numeral");
    Item::new(title, Group(group), label, key)
}

pub fn discovered(title: &str, group: u32, label: &str) -> DiscoveredItem {
    DiscoveredItem {
        title: title.to_string(),
        ordering_label: label.to_string(),
        group: Group(group),
    }
}

pub fn artifact_for(title: &str) -> ArtifactRef {
    ArtifactRef::new(format!("/fixtures/{}.pdf", title.replace(' ', "_")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireCall {
    Initial { title: String },
    WithCode { title: String, code: String },
    WithChallengeCode { title: String, code: String },
}

impl AcquireCall {
    pub fn title(&self) -> &str {
        match self {
            Self::Initial { title }
            | Self::WithCode { title, .. }
            | Self::WithChallengeCode { title, .. } => title,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Initial { .. } => None,
            Self::WithCode { code, .. } | Self::WithChallengeCode { code, .. } => Some(code),
        }
    }
}

/// Acquirer over an in-memory collection; each title may require a code
#[derive(Debug, Default)]
pub struct FakeAcquirer {
    codes: HashMap<String, Option<String>>,
    transient: Mutex<HashMap<String, u32>>,
    broken: HashSet<String>,
    calls: Mutex<Vec<AcquireCall>>,
}

impl FakeAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, title: &str, code: Option<&str>) -> Self {
        self.codes
            .insert(title.to_string(), code.map(ToString::to_string));
        self
    }

    pub fn failing_first(self, title: &str, times: u32) -> Self {
        self.transient.lock().insert(title.to_string(), times);
        self
    }

    pub fn broken(mut self, title: &str) -> Self {
        self.broken.insert(title.to_string());
        self
    }

    pub fn calls(&self) -> Vec<AcquireCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, title: &str) -> Vec<AcquireCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.title() == title)
            .cloned()
            .collect()
    }

    fn acquire(&self, call: AcquireCall) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.calls.lock().push(call.clone());
        let title = call.title();

        if self.broken.contains(title) {
            return Err(CollaboratorError::Other(format!(
                "download of {title} never started"
            )));
        }

        if let Some(remaining) = self.transient.lock().get_mut(title) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CollaboratorError::Timeout { duration_ms: 5_000 });
            }
        }

        let Some(required) = self.codes.get(title) else {
            return Ok(None);
        };
        let unlocked = match (required.as_deref(), call.code()) {
            (None, _) => true,
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
        };
        Ok(unlocked.then(|| artifact_for(title)))
    }
}

#[async_trait]
impl Acquirer for FakeAcquirer {
    async fn acquire_initial(&self, title: &str) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(AcquireCall::Initial {
            title: title.to_string(),
        })
    }

    async fn acquire_with_code(
        &self,
        title: &str,
        code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(AcquireCall::WithCode {
            title: title.to_string(),
            code: code.to_string(),
        })
    }

    async fn acquire_with_challenge_code(
        &self,
        title: &str,
        derived_code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(AcquireCall::WithChallengeCode {
            title: title.to_string(),
            code: derived_code.to_string(),
        })
    }
}

/// Key source answering from a title -> key table
#[derive(Debug, Default)]
pub struct FakeKeys {
    keys: HashMap<ArtifactRef, String>,
    transient: Mutex<HashMap<ArtifactRef, u32>>,
    calls: AtomicUsize,
}

impl FakeKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, title: &str, key: &str) -> Self {
        self.keys.insert(artifact_for(title), key.to_string());
        self
    }

    pub fn failing_first(self, title: &str, times: u32) -> Self {
        self.transient.lock().insert(artifact_for(title), times);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for FakeKeys {
    async fn extract(&self, artifact: &ArtifactRef) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(remaining) = self.transient.lock().get_mut(artifact) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ExtractionError::Recognition("blurry scan".to_string()));
            }
        }

        self.keys
            .get(artifact)
            .cloned()
            .ok_or_else(|| ExtractionError::PatternNotFound {
                text: String::new(),
            })
    }
}

/// Challenge service answering from a (title, previous key) table
#[derive(Debug)]
pub struct FakeChallenge {
    configured: bool,
    answers: HashMap<(String, String), String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeChallenge {
    pub fn new() -> Self {
        Self {
            configured: true,
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_answer(mut self, title: &str, previous_key: &str, derived: &str) -> Self {
        self.answers.insert(
            (title.to_string(), previous_key.to_string()),
            derived.to_string(),
        );
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

impl Default for FakeChallenge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeSource for FakeChallenge {
    fn ensure_configured(&self) -> Result<(), ChallengeError> {
        if self.configured {
            Ok(())
        } else {
            Err(ChallengeError::EndpointNotConfigured)
        }
    }

    async fn resolve(
        &self,
        title: &str,
        previous_key: &str,
    ) -> Result<Option<String>, ChallengeError> {
        self.ensure_configured()?;
        let request = (title.to_string(), previous_key.to_string());
        self.calls.lock().push(request.clone());
        Ok(self.answers.get(&request).cloned())
    }
}

/// Listing session over in-memory pages; records where it was positioned
#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<Group, Vec<DiscoveredItem>>,
    unreachable: HashSet<Group>,
    visits: Mutex<Vec<Group>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, group: u32, cards: Vec<DiscoveredItem>) -> Self {
        self.pages.insert(Group(group), cards);
        self
    }

    pub fn unreachable(mut self, group: u32) -> Self {
        self.unreachable.insert(Group(group));
        self
    }

    pub fn visits(&self) -> Vec<Group> {
        self.visits.lock().clone()
    }
}

#[async_trait]
impl Navigator for FakeSession {
    async fn goto_context(&self, group: Group) -> Result<(), CollaboratorError> {
        if self.unreachable.contains(&group) {
            return Err(CollaboratorError::NotFound(format!("pager button for {group}")));
        }
        self.visits.lock().push(group);
        Ok(())
    }
}

#[async_trait]
impl Lister for FakeSession {
    async fn discover(&self, group: Group) -> Result<Vec<DiscoveredItem>, CollaboratorError> {
        Ok(self.pages.get(&group).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn close(&self) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
