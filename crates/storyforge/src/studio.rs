//! Generation orchestration and the live editing session.

use crate::StudioConfig;
use derive_getters::Getters;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use storyforge_core::{
    GeneratedImage, Generation, GenerationSettings, ImageRequest, PromptSettings,
};
use storyforge_error::{
    ModelsError, ModelsErrorKind, PromptErrorKind, StoryforgeErrorKind, StoryforgeResult,
};
use storyforge_export::Exporter;
use storyforge_interface::{ChatBackend, ImageBackend};
use storyforge_models::{
    HttpCorpusSource, HttpImageFetcher, OpenRouterClient, StoryDiffusionClient,
};
use storyforge_prompt::{PromptAssembler, SceneGenerator, SceneOptions};
use storyforge_storage::{Archive, FileSystemStore, KeyValueStore, PersistOutcome};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Request parameters that come from configuration rather than the session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into), default)]
pub struct StudioOptions {
    /// Output encoding requested from the image API
    image_format: String,
    /// Encoder quality hint
    image_quality: String,
    /// Ask the server to shrink output
    optimize_size: bool,
    /// Upper bound on scene generation plus the image request
    timeout: Duration,
    /// Exclusive upper bound for re-randomized seeds
    seed_max: u64,
}

impl Default for StudioOptions {
    fn default() -> Self {
        Self {
            image_format: "webp".to_string(),
            image_quality: "85".to_string(),
            optimize_size: true,
            timeout: Duration::from_secs(300),
            seed_max: 1_000_000,
        }
    }
}

impl StudioOptions {
    /// Creates a new builder for `StudioOptions`.
    pub fn builder() -> StudioOptionsBuilder {
        StudioOptionsBuilder::default()
    }

    /// Options taken from the image API and generation sections.
    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            image_format: config.image_api().image_format().clone(),
            image_quality: config.image_api().image_quality().clone(),
            optimize_size: *config.image_api().optimize_size(),
            timeout: config.image_api().timeout(),
            seed_max: *config.generation().seed_max(),
        }
    }
}

/// Whether a finished batch made it into history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStatus {
    /// Written, possibly degraded by compression
    Saved(PersistOutcome),
    /// Not written; the images are still in the session buffer
    Failed(String),
}

/// A completed generation and how it was persisted.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct GenerationReport {
    /// The batch, as saved to history
    generation: Generation,
    /// History write result
    history: HistoryStatus,
}

impl GenerationReport {
    /// Message for the user when history was degraded or not written.
    pub fn warning(&self) -> Option<String> {
        match &self.history {
            HistoryStatus::Saved(PersistOutcome::NewestOnly { dropped }) => Some(format!(
                "Storage is full; only the newest generation was kept ({dropped} dropped)"
            )),
            HistoryStatus::Saved(outcome @ PersistOutcome::Stored(level)) if outcome.is_degraded() => {
                Some(format!(
                    "Storage is nearly full; history images were stored with {level} compression"
                ))
            }
            HistoryStatus::Saved(_) => None,
            HistoryStatus::Failed(message) => {
                Some(format!("Generation was not saved to history: {message}"))
            }
        }
    }
}

/// Result of [`Studio::generate`].
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Images were produced and applied to the session
    Completed(GenerationReport),
    /// Superseded, timed out, or the API returned nothing
    Cancelled,
    /// Input was rejected before any network call
    Rejected(String),
}

#[derive(Debug)]
struct Session {
    settings: GenerationSettings,
    prompts: PromptSettings,
    images: Vec<GeneratedImage>,
    has_error: bool,
}

#[derive(Debug)]
struct ActiveRequest {
    id: u64,
    token: CancellationToken,
}

type ActiveSlot = std::sync::Mutex<Option<ActiveRequest>>;

fn lock_active(slot: &ActiveSlot) -> std::sync::MutexGuard<'_, Option<ActiveRequest>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Where [`Studio::stage`] stopped.
enum Staged {
    /// Nothing to apply
    Finished(GenerationOutcome),
    /// A batch waiting for [`Studio::commit`]
    Ready(Generation),
}

/// Clears the in-progress slot when its request ends, however it ends.
struct ActiveGuard<'a> {
    slot: &'a ActiveSlot,
    id: u64,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut active = lock_active(self.slot);
        if active.as_ref().is_some_and(|request| request.id == self.id) {
            *active = None;
        }
    }
}

/// Orchestrates scene generation, image generation and persistence for one
/// editing session.
///
/// The session holds the live settings and prompts plus the buffer of images
/// from the most recent batch. Only one generation applies its result at a
/// time: starting a new one cancels the one in flight.
pub struct Studio {
    image_backend: Arc<dyn ImageBackend>,
    scenes: Arc<SceneGenerator>,
    archive: Arc<Archive>,
    exporter: Arc<Exporter>,
    options: StudioOptions,
    session: Mutex<Session>,
    active: ActiveSlot,
    next_request_id: AtomicU64,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("backend", &self.image_backend.backend_name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Assemble a studio from its parts.
    pub fn new(
        image_backend: Arc<dyn ImageBackend>,
        scenes: Arc<SceneGenerator>,
        archive: Arc<Archive>,
        exporter: Arc<Exporter>,
        options: StudioOptions,
    ) -> Self {
        Self {
            image_backend,
            scenes,
            archive,
            exporter,
            options,
            session: Mutex::new(Session {
                settings: GenerationSettings::default(),
                prompts: PromptSettings::default(),
                images: Vec::new(),
                has_error: false,
            }),
            active: std::sync::Mutex::new(None),
            next_request_id: AtomicU64::new(0),
        }
    }

    /// Wire the HTTP clients and the file-backed store described by `config`.
    ///
    /// Scene enhancement is disabled when the API key variable is unset.
    pub fn from_config(config: &StudioConfig) -> StoryforgeResult<Self> {
        let dir = config.storage().resolve_dir()?;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileSystemStore::new(dir, *config.storage().quota_bytes())?);

        let mut scenes =
            SceneGenerator::new(Arc::new(HttpCorpusSource::new(config.corpus().clone())))
                .with_cache(store.clone());
        match OpenRouterClient::from_env(config.llm().api_key_env(), config.llm().url().clone()) {
            Ok(client) => {
                let chat: Arc<dyn ChatBackend> = Arc::new(client);
                scenes = scenes.with_chat(chat);
            }
            Err(e) => warn!(error = %e, "Scene enhancement unavailable"),
        }

        let mut studio = Self::new(
            Arc::new(StoryDiffusionClient::new(config.image_api().url().clone())),
            Arc::new(scenes),
            Arc::new(Archive::new(store, config.archive().clone())),
            Arc::new(Exporter::new(Arc::new(HttpImageFetcher::new()))),
            StudioOptions::from_config(config),
        );

        let seed = studio.random_seed();
        let session = studio.session.get_mut();
        session.settings.llm_model = Some(config.llm().default_model().clone());
        session.settings.seed = seed;
        Ok(studio)
    }

    /// History and trash.
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Image downloader.
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Current generation settings.
    pub async fn settings(&self) -> GenerationSettings {
        self.session.lock().await.settings.clone()
    }

    /// Current prompts.
    pub async fn prompts(&self) -> PromptSettings {
        self.session.lock().await.prompts.clone()
    }

    /// Images from the most recent batch, plus any restored ones.
    pub async fn images(&self) -> Vec<GeneratedImage> {
        self.session.lock().await.images.clone()
    }

    /// Whether the last generation ended in an error.
    pub async fn has_error(&self) -> bool {
        self.session.lock().await.has_error
    }

    /// Whether a generation is in flight and can still be cancelled.
    pub fn is_generating(&self) -> bool {
        lock_active(&self.active).is_some()
    }

    /// Apply a partial update to the generation settings.
    pub async fn update_generation_settings(&self, update: impl FnOnce(&mut GenerationSettings)) {
        update(&mut self.session.lock().await.settings);
    }

    /// Apply a partial update to the prompts.
    pub async fn update_prompt_settings(&self, update: impl FnOnce(&mut PromptSettings)) {
        update(&mut self.session.lock().await.prompts);
    }

    /// Cancel the generation in flight, if any.
    pub fn cancel_generation(&self) {
        if let Some(request) = lock_active(&self.active).take() {
            info!(request_id = request.id, "Generation cancelled");
            request.token.cancel();
        }
    }

    /// Generate a batch from the live settings and prompts.
    ///
    /// Any generation already in flight is cancelled and reports
    /// [`GenerationOutcome::Cancelled`]. The timeout covers scene generation
    /// and the image call together; running past it also ends as cancelled.
    ///
    /// A batch is committed to the session under the session lock, and only
    /// then written to history. Once committed it can no longer be cancelled,
    /// so a cancelled request never leaves a generation behind in history.
    ///
    /// # Errors
    ///
    /// Network and API failures. The session is left as it was, apart from
    /// the scene list written once scene generation succeeds.
    #[instrument(skip(self))]
    pub async fn generate(&self) -> StoryforgeResult<GenerationOutcome> {
        let (settings, prompts) = {
            let mut session = self.session.lock().await;
            session.has_error = false;
            (session.settings.clone(), session.prompts.clone())
        };

        if let Err(e) = prompts.validate() {
            debug!(error = %e, "Generation rejected");
            return Ok(GenerationOutcome::Rejected(e.user_message()));
        }

        let (id, token) = self.begin_request();
        let _guard = ActiveGuard {
            slot: &self.active,
            id,
        };

        let staged = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(request_id = id, "Generation superseded");
                Ok(Staged::Finished(GenerationOutcome::Cancelled))
            }
            result = tokio::time::timeout(self.options.timeout, self.stage(id, settings, prompts)) => {
                result.unwrap_or_else(|_| {
                    warn!(
                        request_id = id,
                        timeout_ms = self.options.timeout.as_millis() as u64,
                        "Generation timed out"
                    );
                    Ok(Staged::Finished(GenerationOutcome::Cancelled))
                })
            }
        };

        let result = match staged {
            Ok(Staged::Finished(outcome)) => Ok(outcome),
            Ok(Staged::Ready(generation)) => Ok(self.commit(id, generation).await),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(request_id = id, error = %e, "Generation failed");
            self.session.lock().await.has_error = true;
        }
        result
    }

    fn begin_request(&self) -> (u64, CancellationToken) {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = lock_active(&self.active).replace(ActiveRequest {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            info!(previous = previous.id, request_id = id, "Replacing in-flight generation");
            previous.token.cancel();
        }
        (id, token)
    }

    fn is_current(&self, id: u64) -> bool {
        lock_active(&self.active)
            .as_ref()
            .is_some_and(|request| request.id == id && !request.token.is_cancelled())
    }

    /// Take the active slot if `id` still owns it.
    ///
    /// After this a cancel or a newer request no longer sees `id` in flight.
    fn claim(&self, id: u64) -> bool {
        let mut active = lock_active(&self.active);
        let owned = active
            .as_ref()
            .is_some_and(|request| request.id == id && !request.token.is_cancelled());
        if owned {
            *active = None;
        }
        owned
    }

    /// Scenes and images, up to the point where the batch is ready to apply.
    async fn stage(
        &self,
        id: u64,
        settings: GenerationSettings,
        mut prompts: PromptSettings,
    ) -> StoryforgeResult<Staged> {
        let scene_options = SceneOptions::from_settings(&settings, &prompts);
        let scenes = match self.scenes.generate(&scene_options).await {
            Ok(scenes) => scenes,
            Err(e) => {
                return match e.kind() {
                    StoryforgeErrorKind::Prompt(p) if p.kind == PromptErrorKind::NoValidScenes => {
                        Ok(Staged::Finished(GenerationOutcome::Rejected(p.kind.to_string())))
                    }
                    _ => Err(e),
                };
            }
        };

        prompts.prompt_scenes = scenes.clone();
        {
            let mut session = self.session.lock().await;
            if self.is_current(id) {
                session.prompts.prompt_scenes = scenes;
            }
        }

        let request = self.build_request(&settings, &prompts)?;
        info!(
            request_id = id,
            backend = self.image_backend.backend_name(),
            seed = settings.seed,
            scenes = prompts.prompt_scenes.len(),
            "Requesting images"
        );

        let response = self.image_backend.generate(&request).await?;
        let urls = response.to_view_urls(&request.mime_type());
        if urls.is_empty() {
            warn!(request_id = id, "Image API returned no images");
            return Ok(Staged::Finished(GenerationOutcome::Cancelled));
        }

        let images: Vec<GeneratedImage> = urls
            .into_iter()
            .map(|url| GeneratedImage::new(url, settings.seed, settings.clone(), prompts.clone()))
            .collect();
        Ok(Staged::Ready(Generation::new(images, settings, prompts)))
    }

    /// Apply a staged batch to the session, then save it to history.
    async fn commit(&self, id: u64, generation: Generation) -> GenerationOutcome {
        let next_seed = self.random_seed();
        {
            let mut session = self.session.lock().await;
            if !self.claim(id) {
                info!(request_id = id, "Discarding superseded result");
                return GenerationOutcome::Cancelled;
            }
            session.images = generation.images().clone();
            session.settings.seed = next_seed;
        }

        let history = match self.archive.save_to_history(generation.clone()).await {
            Ok(outcome) => HistoryStatus::Saved(outcome),
            Err(e) => {
                warn!(error = %e, quota = e.is_quota_exceeded(), "History save failed");
                HistoryStatus::Failed(e.to_string())
            }
        };

        info!(
            request_id = id,
            generation = %generation.id(),
            images = generation.images().len(),
            "Generation complete"
        );
        GenerationOutcome::Completed(GenerationReport {
            generation,
            history,
        })
    }

    fn build_request(
        &self,
        settings: &GenerationSettings,
        prompts: &PromptSettings,
    ) -> StoryforgeResult<ImageRequest> {
        let assembled = PromptAssembler::assemble(settings, prompts);
        let (width, height) = settings.size.dimensions();

        ImageRequest::builder()
            .character_prompt(assembled.character_prompt().clone())
            .scene_prompts(assembled.scene_prompts().clone())
            .hiresfixprompt(assembled.hiresfix_prompt().clone())
            .negative_prompt(prompts.negative_prompt.clone())
            .width(width)
            .height(height)
            .seed(settings.seed)
            .image_format(self.options.image_format.clone())
            .optimize_size(self.options.optimize_size)
            .image_quality(self.options.image_quality.clone())
            .lora_air(settings.lora_air().map(str::to_string))
            .build()
            .map_err(|e| ModelsError::new(ModelsErrorKind::Builder(e.to_string())).into())
    }

    fn random_seed(&self) -> u64 {
        rand::thread_rng().gen_range(0..self.options.seed_max.max(1))
    }

    /// Move one image from the buffer to trash.
    ///
    /// Returns `None` when the image is not in the buffer.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: Uuid) -> StoryforgeResult<Option<GeneratedImage>> {
        let image = {
            let session = self.session.lock().await;
            session.images.iter().find(|image| *image.id() == id).cloned()
        };
        let Some(image) = image else {
            debug!("Image not in buffer");
            return Ok(None);
        };

        self.archive.save_to_trash(vec![image.clone()]).await?;
        self.session
            .lock()
            .await
            .images
            .retain(|candidate| *candidate.id() != id);
        Ok(Some(image))
    }

    /// Move the whole buffer to trash, returning how many images moved.
    #[instrument(skip(self))]
    pub async fn delete_all_images(&self) -> StoryforgeResult<usize> {
        let images = self.images().await;
        if images.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = images.iter().map(|image| *image.id()).collect();
        self.archive.save_to_trash(images).await?;
        self.session
            .lock()
            .await
            .images
            .retain(|image| !ids.contains(image.id()));

        info!(count = ids.len(), "Moved buffer to trash");
        Ok(ids.len())
    }

    /// Prepend images to the buffer, keeping their original timestamps.
    pub async fn restore_images(&self, images: Vec<GeneratedImage>) {
        let mut session = self.session.lock().await;
        session.images.retain(|image| !images.iter().any(|r| r.id() == image.id()));
        session.images.splice(0..0, images);
    }

    /// Move images from trash back into the buffer.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn restore_from_trash(&self, ids: &[Uuid]) -> StoryforgeResult<Vec<GeneratedImage>> {
        let restored = self.archive.restore_from_trash(ids).await?;
        self.restore_images(restored.clone()).await;
        Ok(restored)
    }

    /// Write one buffered image to `dir`.
    ///
    /// Returns `None` when the image is not in the buffer.
    pub async fn download_image(&self, id: Uuid, dir: &Path) -> StoryforgeResult<Option<PathBuf>> {
        let image = {
            let session = self.session.lock().await;
            session.images.iter().find(|image| *image.id() == id).cloned()
        };
        match image {
            Some(image) => Ok(Some(self.exporter.export_image(&image, dir).await?)),
            None => Ok(None),
        }
    }

    /// Zip the whole buffer into `dir`.
    ///
    /// # Errors
    ///
    /// "No images to download" when the buffer is empty.
    pub async fn download_all(&self, dir: &Path) -> StoryforgeResult<PathBuf> {
        let images = self.images().await;
        self.exporter.export_batch(&images, dir).await
    }
}
