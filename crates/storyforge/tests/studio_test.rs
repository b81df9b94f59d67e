//! Tests for the generation orchestrator and session operations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyforge::{
    Archive, ArchiveConfig, ChatBackend, ChatRequest, ChatResponse, CorpusCategory,
    CorpusSource, ExportError, ExportErrorKind, Exporter, GenerationOutcome, HistoryStatus,
    HISTORY_KEY, HttpError, ImageBackend, ImageFetcher, ImageRequest, ImageResponse,
    InMemoryStore, KeyValueStore, PersistOutcome, SceneGenerator, StoryforgeErrorKind, StoryforgeResult, Studio,
    StudioOptions,
};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Image backend returning fixed payloads; the first `hang` calls never finish.
struct MockImages {
    images: Vec<String>,
    hang: usize,
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
    started: Notify,
}

impl MockImages {
    fn returning(images: &[&str]) -> Self {
        Self {
            images: images.iter().map(|s| s.to_string()).collect(),
            hang: 0,
            fail: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            started: Notify::new(),
        }
    }

    fn hanging_first(mut self, hang: usize) -> Self {
        self.hang = hang;
        self
    }

    fn failing() -> Self {
        let mut backend = Self::returning(&[]);
        backend.fail = true;
        backend
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Option<ImageRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageBackend for MockImages {
    async fn generate(&self, request: &ImageRequest) -> StoryforgeResult<ImageResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.started.notify_one();

        if call < self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(HttpError::new("502 Bad Gateway").into());
        }
        Ok(ImageResponse::new(self.images.clone(), None))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

/// Corpus source serving small fixed corpora, or failing every fetch.
struct MockCorpus {
    texts: HashMap<CorpusCategory, String>,
}

impl MockCorpus {
    fn complete() -> Self {
        let texts = [
            (CorpusCategory::Solo, "reading a book\nclimbing a ladder"),
            (CorpusCategory::Couple, "dancing together\nsharing an umbrella"),
            (CorpusCategory::Detail, "close-up of hands\nclose-up of eyes"),
        ]
        .into_iter()
        .map(|(c, t)| (c, t.to_string()))
        .collect();
        Self { texts }
    }

    fn failing() -> Self {
        Self {
            texts: HashMap::new(),
        }
    }
}

#[async_trait]
impl CorpusSource for MockCorpus {
    async fn fetch(&self, category: CorpusCategory) -> StoryforgeResult<String> {
        self.texts
            .get(&category)
            .cloned()
            .ok_or_else(|| HttpError::new(format!("503 fetching {}", category)).into())
    }
}

/// Chat backend with a canned reply, or one that never answers.
struct MockChat {
    reply: Option<String>,
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn complete(&self, _request: &ChatRequest) -> StoryforgeResult<ChatResponse> {
        match &self.reply {
            Some(reply) => Ok(ChatResponse::new(reply.clone())),
            None => std::future::pending().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

struct NoFetch;

#[async_trait]
impl ImageFetcher for NoFetch {
    async fn fetch(&self, url: &str) -> StoryforgeResult<Vec<u8>> {
        Err(ExportError::new(ExportErrorKind::Fetch {
            url: url.to_string(),
            message: "offline".to_string(),
        })
        .into())
    }
}

/// In-memory store that holds each history write open until released.
struct GatedStore {
    inner: InMemoryStore,
    written: Notify,
    release: Notify,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            written: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &str) -> StoryforgeResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoryforgeResult<()> {
        self.inner.set(key, value).await?;
        if key == HISTORY_KEY {
            self.written.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoryforgeResult<()> {
        self.inner.remove(key).await
    }
}

const PIXEL: &str = "UklGRhoAAABXRUJQVlA4TA0AAAAvAAAAEAcQERGIiP4HAA==";

struct Fixture {
    studio: Arc<Studio>,
    images: Arc<MockImages>,
    archive: Arc<Archive>,
}

fn fixture_with(
    images: MockImages,
    corpus: MockCorpus,
    chat: Option<MockChat>,
    options: StudioOptions,
) -> Fixture {
    fixture_on(images, corpus, chat, options, Arc::new(InMemoryStore::new()))
}

fn fixture_on(
    images: MockImages,
    corpus: MockCorpus,
    chat: Option<MockChat>,
    options: StudioOptions,
    store: Arc<dyn KeyValueStore>,
) -> Fixture {
    let images = Arc::new(images);
    let mut scenes = SceneGenerator::new(Arc::new(corpus)).with_rng_seed(11);
    if let Some(chat) = chat {
        scenes = scenes.with_chat(Arc::new(chat));
    }
    let archive = Arc::new(Archive::new(store, ArchiveConfig::default()));
    let studio = Studio::new(
        images.clone(),
        Arc::new(scenes),
        archive.clone(),
        Arc::new(Exporter::new(Arc::new(NoFetch))),
        options,
    );
    Fixture {
        studio: Arc::new(studio),
        images,
        archive,
    }
}

fn fixture(images: MockImages) -> Fixture {
    fixture_with(images, MockCorpus::complete(), None, StudioOptions::default())
}

async fn name_character(studio: &Studio) {
    studio
        .update_prompt_settings(|p| p.character_name = "Aria".to_string())
        .await;
    studio
        .update_generation_settings(|s| {
            s.ai_enhancer = false;
            s.start = 1;
            s.mid = 1;
            s.end = 0;
            s.seed = 4242;
        })
        .await;
}

#[tokio::test]
async fn test_blank_name_is_rejected_before_any_call() {
    let f = fixture(MockImages::returning(&[PIXEL]));
    f.studio
        .update_prompt_settings(|p| p.character_name = "   ".to_string())
        .await;

    let outcome = f.studio.generate().await.unwrap();

    assert_eq!(
        outcome,
        GenerationOutcome::Rejected("Please enter a character name".to_string())
    );
    assert_eq!(f.images.calls(), 0);
    assert!(f.studio.prompts().await.prompt_scenes.is_empty());
    assert!(!f.studio.is_generating());
}

#[tokio::test]
async fn test_completed_generation_updates_session_and_history() {
    let f = fixture(MockImages::returning(&[PIXEL, PIXEL]));
    name_character(&f.studio).await;

    let outcome = f.studio.generate().await.unwrap();
    let GenerationOutcome::Completed(report) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };

    let generation = report.generation();
    assert_eq!(generation.images().len(), 2);
    assert_eq!(
        *report.history(),
        HistoryStatus::Saved(PersistOutcome::Stored(Default::default()))
    );
    assert!(report.warning().is_none());

    // Every image shares the batch seed and has its own id
    let images = generation.images();
    assert!(images.iter().all(|image| *image.seed() == 4242));
    assert_ne!(images[0].id(), images[1].id());
    assert!(images[0].url().starts_with("data:image/webp;base64,"));

    // Scenes were written back into the live prompts and the snapshot
    let scenes = f.studio.prompts().await.prompt_scenes;
    assert_eq!(scenes.len(), 2);
    assert_eq!(generation.prompts().prompt_scenes, scenes);

    assert_eq!(f.studio.images().await, *images);
    let history = f.archive.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id(), generation.id());
    assert!(!f.studio.is_generating());
}

#[tokio::test]
async fn test_request_carries_assembled_prompts_and_options() {
    let options = StudioOptions::builder()
        .image_format("jpg")
        .image_quality("70")
        .optimize_size(false)
        .build()
        .unwrap();
    let f = fixture_with(
        MockImages::returning(&[PIXEL]),
        MockCorpus::complete(),
        None,
        options,
    );
    name_character(&f.studio).await;
    f.studio
        .update_prompt_settings(|p| p.negative_prompt = "blurry".to_string())
        .await;
    f.studio
        .update_generation_settings(|s| s.lora = Some("123@456".to_string()))
        .await;

    let outcome = f.studio.generate().await.unwrap();
    assert!(matches!(outcome, GenerationOutcome::Completed(_)));

    let request = f.images.last_request().unwrap();
    assert!(request.character_prompt().starts_with("[Aria]"));
    assert_eq!(request.scene_prompts().split(";\n").count(), 2);
    assert_eq!(request.negative_prompt(), "blurry");
    assert_eq!((*request.width(), *request.height()), (1344, 768));
    assert_eq!(*request.seed(), 4242);
    assert_eq!(request.image_format(), "jpg");
    assert_eq!(request.image_quality(), "70");
    assert!(!*request.optimize_size());
    assert_eq!(request.lora_air().as_deref(), Some("123@456"));

    let images = f.studio.images().await;
    assert!(images[0].url().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_seed_is_rerandomized_after_completion() {
    let options = StudioOptions::builder().seed_max(10u64).build().unwrap();
    let f = fixture_with(
        MockImages::returning(&[PIXEL]),
        MockCorpus::complete(),
        None,
        options,
    );
    name_character(&f.studio).await;

    f.studio.generate().await.unwrap();

    let seed = f.studio.settings().await.seed;
    assert!(seed < 10, "seed {} outside [0, 10)", seed);
    assert_eq!(*f.studio.images().await[0].seed(), 4242);
}

#[tokio::test]
async fn test_corpus_failure_falls_back_and_completes() {
    let f = fixture_with(
        MockImages::returning(&[PIXEL]),
        MockCorpus::failing(),
        None,
        StudioOptions::default(),
    );
    name_character(&f.studio).await;

    let outcome = f.studio.generate().await.unwrap();

    assert!(matches!(outcome, GenerationOutcome::Completed(_)));
    assert_eq!(f.studio.prompts().await.prompt_scenes.len(), 2);
    assert_eq!(f.images.calls(), 1);
}

#[tokio::test]
async fn test_malformed_enhancement_still_yields_scenes() {
    let f = fixture_with(
        MockImages::returning(&[PIXEL]),
        MockCorpus::complete(),
        Some(MockChat {
            reply: Some("{{{ not json at all".to_string()),
        }),
        StudioOptions::default(),
    );
    name_character(&f.studio).await;
    f.studio
        .update_generation_settings(|s| s.ai_enhancer = true)
        .await;

    let outcome = f.studio.generate().await.unwrap();

    assert!(matches!(outcome, GenerationOutcome::Completed(_)));
    assert!(!f.studio.prompts().await.prompt_scenes.is_empty());
}

#[tokio::test]
async fn test_no_scenes_is_rejected() {
    let f = fixture(MockImages::returning(&[PIXEL]));
    name_character(&f.studio).await;
    f.studio
        .update_generation_settings(|s| {
            s.start = 0;
            s.mid = 0;
            s.end = 0;
        })
        .await;

    let outcome = f.studio.generate().await.unwrap();

    assert_eq!(
        outcome,
        GenerationOutcome::Rejected("Please enter at least one valid prompt scene".to_string())
    );
    assert_eq!(f.images.calls(), 0);
}

#[tokio::test]
async fn test_empty_result_is_cancelled() {
    let f = fixture(MockImages::returning(&[]));
    name_character(&f.studio).await;

    let outcome = f.studio.generate().await.unwrap();

    assert_eq!(outcome, GenerationOutcome::Cancelled);
    assert!(f.archive.history().await.unwrap().is_empty());
    assert_eq!(f.studio.settings().await.seed, 4242);
}

#[tokio::test]
async fn test_api_error_leaves_state_intact() {
    let f = fixture(MockImages::failing());
    name_character(&f.studio).await;
    let existing = vec![storyforge::GeneratedImage::new(
        "https://example.com/a.png",
        1,
        Default::default(),
        Default::default(),
    )];
    f.studio.restore_images(existing.clone()).await;

    let err = f.studio.generate().await.unwrap_err();

    assert!(matches!(err.kind(), StoryforgeErrorKind::Http(_)));
    assert!(f.studio.has_error().await);
    assert_eq!(f.studio.images().await, existing);
    assert_eq!(f.studio.settings().await.seed, 4242);
    assert!(f.archive.history().await.unwrap().is_empty());
    assert!(!f.studio.is_generating());
}

#[tokio::test]
async fn test_timeout_is_cancelled() {
    let options = StudioOptions::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let f = fixture_with(
        MockImages::returning(&[PIXEL]).hanging_first(1),
        MockCorpus::complete(),
        None,
        options,
    );
    name_character(&f.studio).await;

    let outcome = f.studio.generate().await.unwrap();

    assert_eq!(outcome, GenerationOutcome::Cancelled);
    assert!(!f.studio.is_generating());
    assert!(f.studio.images().await.is_empty());
}

#[tokio::test]
async fn test_new_request_replaces_in_flight_one() {
    let f = fixture(MockImages::returning(&[PIXEL]).hanging_first(1));
    name_character(&f.studio).await;

    let first = {
        let studio = f.studio.clone();
        tokio::spawn(async move { studio.generate().await })
    };
    f.images.started.notified().await;
    assert!(f.studio.is_generating());

    let second = f.studio.generate().await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, GenerationOutcome::Cancelled);
    let GenerationOutcome::Completed(report) = second else {
        panic!("expected completion, got {:?}", second);
    };
    assert_eq!(f.studio.images().await, *report.generation().images());
    let history = f.archive.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id(), report.generation().id());
    assert!(!f.studio.is_generating());
}

#[tokio::test]
async fn test_cancel_generation_stops_in_flight_request() {
    let f = fixture(MockImages::returning(&[PIXEL]).hanging_first(1));
    name_character(&f.studio).await;

    let pending = {
        let studio = f.studio.clone();
        tokio::spawn(async move { studio.generate().await })
    };
    f.images.started.notified().await;
    f.studio.cancel_generation();

    assert_eq!(pending.await.unwrap().unwrap(), GenerationOutcome::Cancelled);
    assert!(!f.studio.is_generating());
    assert!(f.studio.images().await.is_empty());
    assert!(f.archive.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_covers_scene_enhancement() {
    let options = StudioOptions::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let f = fixture_with(
        MockImages::returning(&[PIXEL]),
        MockCorpus::complete(),
        Some(MockChat { reply: None }),
        options,
    );
    name_character(&f.studio).await;
    f.studio
        .update_generation_settings(|s| s.ai_enhancer = true)
        .await;

    let outcome = tokio::time::timeout(Duration::from_secs(5), f.studio.generate())
        .await
        .expect("generate should end once the timeout elapses")
        .unwrap();

    assert_eq!(outcome, GenerationOutcome::Cancelled);
    assert_eq!(f.images.calls(), 0);
    assert!(!f.studio.is_generating());
    assert!(f.archive.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_during_history_write_keeps_the_committed_batch() {
    let store = Arc::new(GatedStore::new());
    let f = fixture_on(
        MockImages::returning(&[PIXEL]),
        MockCorpus::complete(),
        None,
        StudioOptions::default(),
        store.clone(),
    );
    name_character(&f.studio).await;

    let pending = {
        let studio = f.studio.clone();
        tokio::spawn(async move { studio.generate().await })
    };
    store.written.notified().await;
    assert!(!f.studio.is_generating());
    f.studio.cancel_generation();
    store.release.notify_one();

    let outcome = pending.await.unwrap().unwrap();
    let GenerationOutcome::Completed(report) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };
    let history = f.archive.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id(), report.generation().id());
    assert_eq!(f.studio.images().await, *report.generation().images());
}

#[tokio::test]
async fn test_delete_and_restore_images() {
    let f = fixture(MockImages::returning(&[PIXEL, PIXEL, PIXEL]));
    name_character(&f.studio).await;
    f.studio.generate().await.unwrap();

    let images = f.studio.images().await;
    let target = *images[1].id();

    let deleted = f.studio.delete_image(target).await.unwrap().unwrap();
    assert_eq!(*deleted.id(), target);
    assert_eq!(f.studio.images().await.len(), 2);
    assert_eq!(*f.archive.trash().await.unwrap()[0].id(), target);

    let restored = f.studio.restore_from_trash(&[target]).await.unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].timestamp(), images[1].timestamp());
    assert_eq!(*f.studio.images().await[0].id(), target);
    assert!(f.archive.trash().await.unwrap().is_empty());

    assert!(f.studio.delete_image(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_all_images_moves_buffer_to_trash() {
    let f = fixture(MockImages::returning(&[PIXEL, PIXEL]));
    name_character(&f.studio).await;
    f.studio.generate().await.unwrap();

    assert_eq!(f.studio.delete_all_images().await.unwrap(), 2);
    assert!(f.studio.images().await.is_empty());
    assert_eq!(f.archive.trash().await.unwrap().len(), 2);
    assert_eq!(f.studio.delete_all_images().await.unwrap(), 0);
}

#[tokio::test]
async fn test_download_buffer() {
    let f = fixture(MockImages::returning(&[PIXEL, PIXEL]));
    let dir = TempDir::new().unwrap();

    let err = f.studio.download_all(dir.path()).await.unwrap_err();
    assert!(format!("{}", err).contains("No images to download"));

    name_character(&f.studio).await;
    f.studio.generate().await.unwrap();

    let zip = f.studio.download_all(dir.path()).await.unwrap();
    assert!(zip.exists());

    let id = *f.studio.images().await[0].id();
    let single = f.studio.download_image(id, dir.path()).await.unwrap().unwrap();
    assert_eq!(
        single.file_name().unwrap().to_str().unwrap(),
        "generated-image-4242.webp"
    );
    assert!(
        f.studio
            .download_image(uuid::Uuid::new_v4(), dir.path())
            .await
            .unwrap()
            .is_none()
    );
}
