//! The four-step story wizard.
//!
//! A [`Session`] holds everything the user has produced so far. The [`Wizard`]
//! owns the current session and moves it between [`WizardStep`]s through the
//! transition table in [`WizardStep::next`]. Every accepted mutation is
//! persisted before it becomes visible, and at most one mutation runs at a
//! time: while an operation is in flight the wizard reports busy and rejects
//! all others.

pub mod store;

pub use store::{FileStore, MemoryStore, SessionStore, StoreError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::images::{generate_images, Image, ImageError, ImageProvider};
use crate::story::{self, FormError, FormPatch, FormState, Story};
use crate::styles;

/// Store keys of the persisted session
pub const FORM_KEY: &str = "fiabe-form";
pub const STEP_KEY: &str = "fiabe-step";
pub const STORY_KEY: &str = "fiabe-story";
pub const IMAGES_KEY: &str = "fiabe-images";

/// Wizard position. Serialized as its number (1-4).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    #[default]
    Details = 1,
    Style = 2,
    Storyboard = 3,
    Illustrations = 4,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Details,
            WizardStep::Style,
            WizardStep::Storyboard,
            WizardStep::Illustrations,
        ]
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Details => "Dettagli",
            WizardStep::Style => "Stile",
            WizardStep::Storyboard => "Storyboard",
            WizardStep::Illustrations => "Illustrazioni",
        }
    }

    /// Completion percentage shown by the progress bar
    pub fn progress(self) -> u8 {
        self.number() * 25
    }

    /// Step reached by applying `transition` here, or `None` if illegal
    pub fn next(self, transition: Transition) -> Option<WizardStep> {
        use WizardStep::*;
        match (self, transition) {
            (Details, Transition::Advance) => Some(Style),
            (Style, Transition::GenerateStoryboard) => Some(Storyboard),
            (Storyboard, Transition::GenerateIllustrations) => Some(Illustrations),
            (Details | Style, Transition::EditForm) => Some(self),
            (from, Transition::Back(to)) if to < from => Some(to),
            (_, Transition::Reset) => Some(Details),
            _ => None,
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(WizardStep::Details),
            2 => Ok(WizardStep::Style),
            3 => Ok(WizardStep::Storyboard),
            4 => Ok(WizardStep::Illustrations),
            other => Err(format!("wizard step must be 1-4, got {other}")),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> u8 {
        step.number()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// Moves the wizard can be asked to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance,
    GenerateStoryboard,
    GenerateIllustrations,
    EditForm,
    Back(WizardStep),
    Reset,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Advance => write!(f, "advance"),
            Transition::GenerateStoryboard => write!(f, "generate the storyboard"),
            Transition::GenerateIllustrations => write!(f, "generate illustrations"),
            Transition::EditForm => write!(f, "edit the form"),
            Transition::Back(to) => write!(f, "go back to step {to}"),
            Transition::Reset => write!(f, "reset"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("cannot {transition} from step {from}")]
    IllegalTransition {
        from: WizardStep,
        transition: Transition,
    },

    #[error("a generation is already in progress")]
    Busy,

    #[error(transparent)]
    InvalidForm(#[from] FormError),

    #[error("story synthesis failed: {0}")]
    Synthesis(String),

    #[error(transparent)]
    Generation(#[from] ImageError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Everything the wizard has produced for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub form: FormState,
    #[schema(value_type = u8, minimum = 1, maximum = 4)]
    pub step: WizardStep,
    pub story: Option<Story>,
    pub images: Vec<Image>,
}

impl Session {
    /// Load the session from `store`.
    ///
    /// Missing or unreadable values fall back to their defaults; only store
    /// I/O failures are errors.
    pub fn load(store: &dyn SessionStore) -> Result<Self, StoreError> {
        let session = Session {
            form: read_value(store, FORM_KEY)?.unwrap_or_default(),
            step: read_value(store, STEP_KEY)?.unwrap_or_default(),
            story: read_value::<Option<Story>>(store, STORY_KEY)?.flatten(),
            images: read_value(store, IMAGES_KEY)?.unwrap_or_default(),
        };
        Ok(session.normalized())
    }

    /// Write all four values to `store`.
    ///
    /// The step goes last: if an earlier write fails, the stored step still
    /// names a position its data supports.
    pub fn persist(&self, store: &dyn SessionStore) -> Result<(), StoreError> {
        store.put(FORM_KEY, &to_value(FORM_KEY, &self.form)?)?;
        store.put(STORY_KEY, &to_value(STORY_KEY, &self.story)?)?;
        store.put(IMAGES_KEY, &to_value(IMAGES_KEY, &self.images)?)?;
        store.put(STEP_KEY, &to_value(STEP_KEY, &self.step)?)?;
        Ok(())
    }

    /// Pull the step back to the furthest one the stored data supports
    fn normalized(mut self) -> Self {
        let scenes = self.story.as_ref().map_or(0, |s| s.outline().len());
        let supported = if scenes == 0 {
            WizardStep::Style
        } else if self.images.len() != scenes {
            WizardStep::Storyboard
        } else {
            WizardStep::Illustrations
        };
        if self.step > supported {
            tracing::warn!(
                stored = %self.step,
                resumed = %supported,
                "Stored wizard step is ahead of its data; resuming earlier"
            );
            self.step = supported;
        }
        self
    }
}

fn read_value<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let value = match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(None),
        Err(StoreError::Json { key, source }) => {
            tracing::warn!(key = %key, error = %source, "Discarding corrupt session value");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable session value");
            Ok(None)
        }
    }
}

fn to_value<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })
}

/// Releases the busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The wizard state machine for a single session
pub struct Wizard {
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn ImageProvider>,
    session: RwLock<Session>,
    busy: AtomicBool,
}

impl Wizard {
    /// Resume the session held in `store`
    pub fn open(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn ImageProvider>,
    ) -> Result<Self, StoreError> {
        let session = Session::load(store.as_ref())?;
        tracing::debug!(step = %session.step, "Wizard session loaded");
        Ok(Self {
            store,
            provider,
            session: RwLock::new(session),
            busy: AtomicBool::new(false),
        })
    }

    pub fn provider(&self) -> &Arc<dyn ImageProvider> {
        &self.provider
    }

    /// Copy of the current session
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, WizardError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| WizardError::Busy)
    }

    fn check(from: WizardStep, transition: Transition) -> Result<WizardStep, WizardError> {
        from.next(transition)
            .ok_or(WizardError::IllegalTransition { from, transition })
    }

    /// Persist `next`, then make it the current session
    async fn commit(&self, next: Session) -> Result<Session, WizardError> {
        next.persist(self.store.as_ref())?;
        *self.session.write().await = next.clone();
        Ok(next)
    }

    /// Apply a validated form edit. Only allowed on the first two steps.
    pub async fn update_form(&self, patch: FormPatch) -> Result<Session, WizardError> {
        let _busy = self.acquire()?;
        let mut next = self.snapshot().await;
        Self::check(next.step, Transition::EditForm)?;

        patch.apply(&mut next.form)?;
        self.commit(next).await
    }

    /// Details -> Style
    pub async fn advance(&self) -> Result<Session, WizardError> {
        self.step_to(Transition::Advance).await
    }

    /// Return to an earlier step, keeping the story and images
    pub async fn back(&self, step: WizardStep) -> Result<Session, WizardError> {
        self.step_to(Transition::Back(step)).await
    }

    async fn step_to(&self, transition: Transition) -> Result<Session, WizardError> {
        let _busy = self.acquire()?;
        let mut next = self.snapshot().await;
        let from = next.step;
        next.step = Self::check(from, transition)?;

        let session = self.commit(next).await?;
        tracing::info!(from = %from, to = %session.step, "Wizard step changed");
        Ok(session)
    }

    /// Start over: default form, no story, no images
    pub async fn reset(&self) -> Result<Session, WizardError> {
        let _busy = self.acquire()?;
        let from = self.session.read().await.step;

        let session = self.commit(Session::default()).await?;
        tracing::info!(from = %from, "Wizard reset");
        Ok(session)
    }

    /// Style -> Storyboard: synthesize the story from the form
    pub async fn generate_storyboard(&self) -> Result<Session, WizardError> {
        let _busy = self.acquire()?;
        let mut next = self.snapshot().await;
        let target = Self::check(next.step, Transition::GenerateStoryboard)?;

        let story = story::synthesize(&next.form).map_err(|e| {
            tracing::error!(error = %e, "Story synthesis failed");
            WizardError::Synthesis(format!("{e:#}"))
        })?;

        tracing::info!(
            title = %story.title,
            scenes = story.outline().len(),
            "Storyboard generated"
        );
        next.story = Some(story);
        next.step = target;
        self.commit(next).await
    }

    /// Storyboard -> Illustrations: illustrate every scene of the story.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn generate_illustrations(&self) -> Result<Session, WizardError> {
        let _busy = self.acquire()?;
        let mut next = self.snapshot().await;
        let target = Self::check(next.step, Transition::GenerateIllustrations)?;

        let outline = next
            .story
            .as_ref()
            .map(|s| s.outline().to_vec())
            .unwrap_or_default();
        let style = styles::get_style(Some(&next.form.style_id));

        let images = generate_images(self.provider.as_ref(), &outline, style).await?;

        next.images = images;
        next.step = target;
        self.commit(next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::PlaceholderProvider;
    use crate::story::Scene;
    use crate::styles::Style;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Provider that fails every call after the first `succeed` ones
    struct FlakyProvider {
        succeed: usize,
        calls: AtomicUsize,
    }

    impl FlakyProvider {
        fn new(succeed: usize) -> Self {
            Self {
                succeed,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn illustrate(
            &self,
            index: usize,
            scene: &Scene,
            _style: &Style,
        ) -> Result<Image, ImageError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.succeed {
                return Err(ImageError::upstream("flaky", 502, "bad gateway"));
            }
            Ok(Image::for_scene(scene, format!("https://img.test/{index}.png")))
        }
    }

    /// Provider that parks on its first scene until released
    struct GatedProvider {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ImageProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn illustrate(
            &self,
            index: usize,
            scene: &Scene,
            _style: &Style,
        ) -> Result<Image, ImageError> {
            if index == 0 {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(Image::for_scene(scene, "https://img.test/x.png"))
        }
    }

    fn wizard_with(provider: Arc<dyn ImageProvider>) -> (Wizard, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let wizard = Wizard::open(store.clone(), provider).unwrap();
        (wizard, store)
    }

    fn wizard() -> Wizard {
        wizard_with(Arc::new(PlaceholderProvider::new())).0
    }

    /// Drive a wizard to the storyboard step
    async fn at_storyboard(wizard: &Wizard) -> Session {
        wizard
            .update_form(FormPatch {
                scene_count: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        wizard.advance().await.unwrap();
        wizard.generate_storyboard().await.unwrap()
    }

    #[test]
    fn test_step_serializes_as_number() {
        assert_eq!(serde_json::to_value(WizardStep::Storyboard).unwrap(), 3);
        assert_eq!(
            serde_json::from_value::<WizardStep>(serde_json::json!(4)).unwrap(),
            WizardStep::Illustrations
        );
        assert!(serde_json::from_value::<WizardStep>(serde_json::json!(7)).is_err());
    }

    #[test]
    fn test_step_progress_and_labels() {
        let progress: Vec<u8> = WizardStep::all().iter().map(|s| s.progress()).collect();
        assert_eq!(progress, vec![25, 50, 75, 100]);
        assert_eq!(WizardStep::Style.label(), "Stile");
        assert_eq!(WizardStep::Storyboard.to_string(), "3 (Storyboard)");
    }

    #[test]
    fn test_transition_table() {
        use WizardStep::{Details, Illustrations, Storyboard};
        let style = WizardStep::Style;

        assert_eq!(Details.next(Transition::Advance), Some(style));
        assert_eq!(style.next(Transition::Advance), None);
        assert_eq!(style.next(Transition::GenerateStoryboard), Some(Storyboard));
        assert_eq!(Details.next(Transition::GenerateStoryboard), None);
        assert_eq!(
            Storyboard.next(Transition::GenerateIllustrations),
            Some(Illustrations)
        );
        assert_eq!(style.next(Transition::GenerateIllustrations), None);
        assert_eq!(Details.next(Transition::EditForm), Some(Details));
        assert_eq!(Storyboard.next(Transition::EditForm), None);

        for &from in WizardStep::all() {
            assert_eq!(from.next(Transition::Reset), Some(Details));
            for &to in WizardStep::all() {
                let expected = (to < from).then_some(to);
                assert_eq!(from.next(Transition::Back(to)), expected, "{from} -> {to}");
            }
        }
    }

    #[tokio::test]
    async fn test_new_session_starts_with_defaults() {
        let session = wizard().snapshot().await;
        assert_eq!(session.step, WizardStep::Details);
        assert_eq!(session.form, FormState::default());
        assert!(session.story.is_none());
        assert!(session.images.is_empty());
    }

    #[tokio::test]
    async fn test_full_walkthrough() {
        let wizard = wizard();
        let session = at_storyboard(&wizard).await;
        assert_eq!(session.step, WizardStep::Storyboard);
        assert_eq!(session.story.as_ref().unwrap().outline().len(), 5);

        let session = wizard.generate_illustrations().await.unwrap();
        assert_eq!(session.step, WizardStep::Illustrations);
        assert_eq!(session.images.len(), 5);
        assert!(session.images[0].url.starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test]
    async fn test_illegal_moves_are_rejected_without_change() {
        let wizard = wizard();

        let err = wizard.generate_storyboard().await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::IllegalTransition {
                from: WizardStep::Details,
                transition: Transition::GenerateStoryboard
            }
        ));

        let err = wizard.generate_illustrations().await.unwrap_err();
        assert!(matches!(err, WizardError::IllegalTransition { .. }));

        let err = wizard.back(WizardStep::Details).await.unwrap_err();
        assert!(matches!(err, WizardError::IllegalTransition { .. }));

        assert_eq!(wizard.snapshot().await, Session::default());
    }

    #[tokio::test]
    async fn test_back_from_storyboard_keeps_story() {
        let wizard = wizard();
        let at_three = at_storyboard(&wizard).await;

        let session = wizard.back(WizardStep::Style).await.unwrap();
        assert_eq!(session.step, WizardStep::Style);
        assert_eq!(session.story, at_three.story);
    }

    #[tokio::test]
    async fn test_illustration_success_moves_to_final_step() {
        let (wizard, _) = wizard_with(Arc::new(FlakyProvider::new(usize::MAX)));
        at_storyboard(&wizard).await;

        let session = wizard.generate_illustrations().await.unwrap();
        assert_eq!(session.step, WizardStep::Illustrations);
        assert_eq!(session.images.len(), 5);
    }

    #[tokio::test]
    async fn test_illustration_failure_stays_on_storyboard() {
        let (wizard, store) = wizard_with(Arc::new(FlakyProvider::new(2)));
        let before = at_storyboard(&wizard).await;

        let err = wizard.generate_illustrations().await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Generation(ImageError::Upstream { status: 502, .. })
        ));

        let after = wizard.snapshot().await;
        assert_eq!(after, before);
        assert_eq!(after.step, WizardStep::Storyboard);
        assert!(after.images.is_empty());
        assert_eq!(Session::load(store.as_ref()).unwrap(), before);
        assert!(!wizard.is_busy());
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_previous_images() {
        let wizard = wizard();
        at_storyboard(&wizard).await;
        let done = wizard.generate_illustrations().await.unwrap();
        wizard.back(WizardStep::Storyboard).await.unwrap();

        let flaky = Wizard::open(wizard.store.clone(), Arc::new(FlakyProvider::new(0))).unwrap();
        flaky.generate_illustrations().await.unwrap_err();

        let after = flaky.snapshot().await;
        assert_eq!(after.step, WizardStep::Storyboard);
        assert_eq!(after.images, done.images);
    }

    #[tokio::test]
    async fn test_form_edits() {
        let wizard = wizard();

        let session = wizard
            .update_form(FormPatch {
                setting: Some("porto di Trieste".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(session.form.setting, "porto di Trieste");

        let err = wizard
            .update_form(FormPatch {
                scene_count: Some(20),
                setting: Some("altrove".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::InvalidForm(FormError::SceneCountOutOfRange(20))
        ));
        assert_eq!(wizard.snapshot().await.form.setting, "porto di Trieste");

        wizard.advance().await.unwrap();
        wizard
            .update_form(FormPatch::style("noir-minimal"))
            .await
            .unwrap();
        wizard.generate_storyboard().await.unwrap();

        let err = wizard
            .update_form(FormPatch::style("olivetti-soft"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::IllegalTransition {
                transition: Transition::EditForm,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let wizard = wizard();
        at_storyboard(&wizard).await;
        wizard.generate_illustrations().await.unwrap();

        let session = wizard.reset().await.unwrap();
        assert_eq!(session, Session::default());
        assert_eq!(wizard.snapshot().await, Session::default());
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let (wizard, store) = wizard_with(Arc::new(PlaceholderProvider::new()));
        at_storyboard(&wizard).await;
        wizard.generate_illustrations().await.unwrap();

        let current = wizard.snapshot().await;
        let reopened = Wizard::open(store, Arc::new(PlaceholderProvider::new())).unwrap();
        assert_eq!(reopened.snapshot().await, current);
    }

    #[tokio::test]
    async fn test_busy_session_rejects_other_mutations() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (wizard, _) = wizard_with(Arc::new(GatedProvider {
            started: started.clone(),
            release: release.clone(),
        }));
        let wizard = Arc::new(wizard);
        at_storyboard(&wizard).await;

        let running = {
            let wizard = wizard.clone();
            tokio::spawn(async move { wizard.generate_illustrations().await })
        };
        started.notified().await;

        assert!(wizard.is_busy());
        assert!(matches!(wizard.reset().await, Err(WizardError::Busy)));
        assert!(matches!(
            wizard.back(WizardStep::Style).await,
            Err(WizardError::Busy)
        ));
        assert!(matches!(
            wizard.generate_illustrations().await,
            Err(WizardError::Busy)
        ));
        // Reads stay available
        assert_eq!(wizard.snapshot().await.step, WizardStep::Storyboard);

        release.notify_one();
        let session = running.await.unwrap().unwrap();
        assert_eq!(session.step, WizardStep::Illustrations);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn test_load_tolerates_corrupt_values() {
        let store = MemoryStore::new();
        store.put(FORM_KEY, &serde_json::json!("garbage")).unwrap();
        store.put(STEP_KEY, &serde_json::json!(9)).unwrap();
        store.put(STORY_KEY, &Value::Null).unwrap();

        let session = Session::load(&store).unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_load_pulls_step_back_to_available_data() {
        let store = MemoryStore::new();
        store.put(STEP_KEY, &serde_json::json!(4)).unwrap();

        let session = Session::load(&store).unwrap();
        assert_eq!(session.step, WizardStep::Style);
    }

    #[tokio::test]
    async fn test_load_pulls_back_when_images_do_not_match_outline() {
        let wizard = wizard();
        at_storyboard(&wizard).await;
        let mut session = wizard.generate_illustrations().await.unwrap();
        session.images.pop();

        let store = MemoryStore::new();
        session.persist(&store).unwrap();

        let loaded = Session::load(&store).unwrap();
        assert_eq!(loaded.step, WizardStep::Storyboard);
        assert_eq!(loaded.images.len(), 4);
    }

    /// Store that refuses writes to one key once armed
    struct FailingStore {
        inner: MemoryStore,
        fail_key: std::sync::Mutex<Option<&'static str>>,
    }

    impl FailingStore {
        fn arm(&self, key: &'static str) {
            *self.fail_key.lock().unwrap() = Some(key);
        }
    }

    impl SessionStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
            if *self.fail_key.lock().unwrap() == Some(key) {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_stored_step_consistent() {
        let store = Arc::new(FailingStore {
            inner: MemoryStore::new(),
            fail_key: std::sync::Mutex::new(None),
        });
        let wizard = Wizard::open(store.clone(), Arc::new(PlaceholderProvider::new())).unwrap();

        // Six illustrated scenes, then back to Style and a shorter storyboard
        wizard.advance().await.unwrap();
        wizard.generate_storyboard().await.unwrap();
        assert_eq!(wizard.generate_illustrations().await.unwrap().images.len(), 6);
        wizard.back(WizardStep::Style).await.unwrap();
        wizard
            .update_form(FormPatch {
                scene_count: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        let before = wizard.generate_storyboard().await.unwrap();

        store.arm(IMAGES_KEY);
        let err = wizard.generate_illustrations().await.unwrap_err();
        assert!(matches!(err, WizardError::Storage(StoreError::Io { .. })));
        assert_eq!(wizard.snapshot().await, before);

        let reloaded = Session::load(store.as_ref()).unwrap();
        assert_eq!(reloaded.step, WizardStep::Storyboard);
        assert_eq!(reloaded.story.unwrap().outline().len(), 4);
    }
}
