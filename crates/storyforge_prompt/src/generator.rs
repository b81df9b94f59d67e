//! Scene list generation from the corpora, optionally rewritten by an LLM.

use crate::{Corpus, extract_scene_prompts, sample_lines};
use derive_getters::Getters;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use storyforge_core::{
    ChatMessage, ChatRequest, CorpusCategory, DEFAULT_LLM_MODEL, GenerationSettings,
    PromptSettings, SceneList,
};
use storyforge_error::{
    ModelsError, ModelsErrorKind, PromptError, PromptErrorKind, StoryforgeResult,
};
use storyforge_interface::{ChatBackend, CorpusSource};
use storyforge_storage::KeyValueStore;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Store key of the persisted corpus cache.
pub const CORPUS_CACHE_KEY: &str = "sceneGeneratorCache";

/// System instruction sent with every enhancement request.
pub const SCENE_SYSTEM_PROMPT: &str =
    "Your output must be in JSON format. {scene_prompts:'prompt1/prompt2/prompt3...'}";

/// Parameters for one scene generation.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into), default)]
pub struct SceneOptions {
    /// Rewrite the sampled scenes through the chat backend
    use_api: bool,
    /// Lines drawn from the solo corpus
    start: usize,
    /// Lines drawn from the couple corpus
    mid: usize,
    /// Lines drawn from the detail corpus
    end: usize,
    /// Extra instructions appended to the enhancement request
    extra_instructions: String,
    /// Chat model identifier
    model: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            use_api: false,
            start: 1,
            mid: 1,
            end: 1,
            extra_instructions: String::new(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

impl SceneOptions {
    /// Creates a new builder for `SceneOptions`.
    pub fn builder() -> SceneOptionsBuilder {
        SceneOptionsBuilder::default()
    }

    /// Options for a generation request made with these settings.
    pub fn from_settings(settings: &GenerationSettings, prompts: &PromptSettings) -> Self {
        Self {
            use_api: settings.ai_enhancer,
            start: settings.start as usize,
            mid: settings.mid as usize,
            end: settings.end as usize,
            extra_instructions: prompts.arguments.clone(),
            model: settings.llm_model_or_default().to_string(),
        }
    }
}

/// Produces scene lists from the solo, couple and detail corpora.
///
/// Corpora are loaded once, from the cache store if it holds all three,
/// otherwise from the [`CorpusSource`]. When the source fails the bundled
/// fallback corpus is used for that call and the source is tried again on
/// the next one, so generation never fails for lack of a corpus.
pub struct SceneGenerator {
    corpus_source: Arc<dyn CorpusSource>,
    chat: Option<Arc<dyn ChatBackend>>,
    cache: Option<Arc<dyn KeyValueStore>>,
    corpus: OnceCell<Corpus>,
    fallback: Corpus,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for SceneGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGenerator")
            .field("chat", &self.chat.as_ref().map(|c| c.provider_name()))
            .field("cached", &self.cache.is_some())
            .field("initialized", &self.corpus.initialized())
            .finish_non_exhaustive()
    }
}

impl SceneGenerator {
    /// Generator drawing corpora from `corpus_source`, with no enhancement backend.
    pub fn new(corpus_source: Arc<dyn CorpusSource>) -> Self {
        Self {
            corpus_source,
            chat: None,
            cache: None,
            corpus: OnceCell::new(),
            fallback: Corpus::fallback(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use `chat` to rewrite scene lists when enhancement is requested.
    pub fn with_chat(mut self, chat: Arc<dyn ChatBackend>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Read and write the corpus cache in `store`.
    pub fn with_cache(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cache = Some(store);
        self
    }

    /// Make sampling deterministic.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Whether the corpora have been loaded from the cache or the source.
    pub fn is_initialized(&self) -> bool {
        self.corpus.initialized()
    }

    /// Load the corpora if they are not loaded yet.
    ///
    /// Returns the bundled fallback when neither the cache nor the source
    /// can provide them. The fallback is not kept, so the next call retries.
    pub async fn initialize(&self) -> &Corpus {
        match self.corpus.get_or_try_init(|| self.load_corpus()).await {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(error = %e, "Using bundled fallback corpus");
                &self.fallback
            }
        }
    }

    /// Generate a scene list.
    ///
    /// Samples `start`, `mid` and `end` lines from the solo, couple and
    /// detail corpora, in that order. With `use_api` set, the list is sent
    /// to the chat backend for rewriting; any failure there falls back to
    /// the sampled list.
    ///
    /// # Errors
    ///
    /// Returns [`PromptErrorKind::NoValidScenes`] if the final list is empty.
    #[instrument(skip(self, options), fields(use_api = options.use_api, start = options.start, mid = options.mid, end = options.end))]
    pub async fn generate(&self, options: &SceneOptions) -> StoryforgeResult<SceneList> {
        let corpus = self.initialize().await;
        let sampled = self.sample(corpus, options);
        debug!(scenes = sampled.len(), "Sampled scenes");

        let scenes = match (options.use_api, &self.chat) {
            (true, Some(chat)) => self
                .enhance(chat.as_ref(), &sampled, options)
                .await
                .unwrap_or(sampled),
            (true, None) => {
                debug!("No chat backend configured, using sampled scenes");
                sampled
            }
            (false, _) => sampled,
        };

        if scenes.is_empty() {
            warn!("Scene generation produced no scenes");
            return Err(PromptError::new(PromptErrorKind::NoValidScenes).into());
        }
        info!(scenes = scenes.len(), "Generated scene list");
        Ok(scenes)
    }

    fn sample(&self, corpus: &Corpus, options: &SceneOptions) -> SceneList {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let lines: Vec<String> = [
            (CorpusCategory::Solo, options.start),
            (CorpusCategory::Couple, options.mid),
            (CorpusCategory::Detail, options.end),
        ]
        .into_iter()
        .flat_map(|(category, count)| sample_lines(corpus.get(category), count, &mut *rng))
        .collect();

        // Corpus lines may themselves contain several slash-separated scenes
        SceneList::from_delimited(&lines.join("/"))
    }

    /// Rewrite `sampled` through the chat backend, `None` on any failure.
    async fn enhance(
        &self,
        chat: &dyn ChatBackend,
        sampled: &SceneList,
        options: &SceneOptions,
    ) -> Option<SceneList> {
        let request = match build_enhancement_request(sampled, options) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Could not build enhancement request");
                return None;
            }
        };

        let response = match chat.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = chat.provider_name(), error = %e, "Enhancement failed, using sampled scenes");
                return None;
            }
        };

        let Some(text) = extract_scene_prompts(response.content()) else {
            warn!("Enhancement response had no scenes, using sampled scenes");
            return None;
        };

        let scenes = SceneList::from_delimited(&text);
        if scenes.is_empty() {
            warn!("Enhanced scene list is empty, using sampled scenes");
            return None;
        }
        debug!(scenes = scenes.len(), "Enhanced scene list");
        Some(scenes)
    }

    async fn load_corpus(&self) -> StoryforgeResult<Corpus> {
        if let Some(corpus) = self.read_cache().await {
            info!("Loaded scene corpora from cache");
            return Ok(corpus);
        }

        let source = self.corpus_source.as_ref();
        let (solo, couple, detail) = futures::try_join!(
            source.fetch(CorpusCategory::Solo),
            source.fetch(CorpusCategory::Couple),
            source.fetch(CorpusCategory::Detail),
        )?;

        let corpus = Corpus {
            solo,
            couple,
            detail,
        };
        if !corpus.is_complete() {
            return Err(PromptError::new(PromptErrorKind::CorpusUnavailable(
                "fetched corpus has an empty category".to_string(),
            ))
            .into());
        }

        info!("Fetched scene corpora");
        self.write_cache(&corpus).await;
        Ok(corpus)
    }

    async fn read_cache(&self) -> Option<Corpus> {
        let store = self.cache.as_ref()?;
        let raw = match store.get(CORPUS_CACHE_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read corpus cache");
                return None;
            }
        };
        match serde_json::from_str::<Corpus>(&raw) {
            Ok(corpus) if corpus.is_complete() => Some(corpus),
            Ok(_) => {
                debug!("Corpus cache incomplete, ignoring");
                None
            }
            Err(e) => {
                warn!(error = %e, "Corpus cache is corrupt, ignoring");
                None
            }
        }
    }

    async fn write_cache(&self, corpus: &Corpus) {
        let Some(store) = &self.cache else {
            return;
        };
        let json = match serde_json::to_string(corpus) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize corpus cache");
                return;
            }
        };
        if let Err(e) = store.set(CORPUS_CACHE_KEY, &json).await {
            warn!(error = %e, "Failed to save corpus cache");
        }
    }
}

/// Chat request asking the model to rewrite a scene list.
pub fn build_enhancement_request(
    scenes: &SceneList,
    options: &SceneOptions,
) -> StoryforgeResult<ChatRequest> {
    let user = format!(
        "scene_prompts:\"{}\" and here are the extra Instructions: {}",
        scenes.to_delimited(),
        options.extra_instructions
    );
    ChatRequest::builder()
        .model(options.model.clone())
        .messages(vec![
            ChatMessage::system(SCENE_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ])
        .build()
        .map_err(|e| ModelsError::new(ModelsErrorKind::Builder(e.to_string())).into())
}
