//! Tests for scene generation with mock corpus and chat backends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storyforge_core::{ChatRequest, ChatResponse, ChatRole, CorpusCategory};
use storyforge_error::{
    HttpError, PromptErrorKind, StoryforgeErrorKind, StoryforgeResult,
};
use storyforge_interface::{ChatBackend, CorpusSource};
use storyforge_prompt::{CORPUS_CACHE_KEY, Corpus, SCENE_SYSTEM_PROMPT, SceneGenerator, SceneOptions};
use storyforge_storage::{InMemoryStore, KeyValueStore};

/// Corpus source backed by a map; missing categories fail, as does every
/// fetch while `down` is set.
struct MockCorpus {
    texts: HashMap<CorpusCategory, String>,
    calls: AtomicUsize,
    down: AtomicBool,
}

impl MockCorpus {
    fn complete() -> Self {
        let texts = [
            (CorpusCategory::Solo, "solo one\nsolo two\nsolo three\nsolo four\nsolo five"),
            (CorpusCategory::Couple, "couple one\ncouple two\ncouple three\ncouple four"),
            (CorpusCategory::Detail, "detail one\ndetail two\ndetail three\ndetail four"),
        ]
        .into_iter()
        .map(|(c, t)| (c, t.to_string()))
        .collect();
        Self {
            texts,
            calls: AtomicUsize::new(0),
            down: AtomicBool::new(false),
        }
    }

    fn failing() -> Self {
        Self {
            texts: HashMap::new(),
            calls: AtomicUsize::new(0),
            down: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CorpusSource for MockCorpus {
    async fn fetch(&self, category: CorpusCategory) -> StoryforgeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(HttpError::new("connection refused").into());
        }
        self.texts
            .get(&category)
            .cloned()
            .ok_or_else(|| HttpError::new(format!("503 fetching {}", category)).into())
    }
}

/// Chat backend returning a fixed reply, or failing when `reply` is `None`.
struct MockChat {
    reply: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn complete(&self, request: &ChatRequest) -> StoryforgeResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(text) => Ok(ChatResponse::new(text.clone())),
            None => Err(HttpError::new("connection reset").into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

fn options(use_api: bool) -> SceneOptions {
    SceneOptions::builder()
        .use_api(use_api)
        .start(1usize)
        .mid(1usize)
        .end(1usize)
        .extra_instructions("keep it cozy")
        .model("test/model")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_local_generation_samples_each_category_in_order() {
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete())).with_rng_seed(11);
    let scenes = generator.generate(&options(false)).await.unwrap();

    assert_eq!(scenes.len(), 3);
    assert!(scenes.as_slice()[0].starts_with("solo"));
    assert!(scenes.as_slice()[1].starts_with("couple"));
    assert!(scenes.as_slice()[2].starts_with("detail"));
}

#[tokio::test]
async fn test_corpus_failure_falls_back_to_bundled_corpus() {
    let generator = SceneGenerator::new(Arc::new(MockCorpus::failing())).with_rng_seed(5);
    let scenes = generator.generate(&options(false)).await.unwrap();

    assert_eq!(scenes.len(), 3);
    let fallback = Corpus::fallback();
    assert!(fallback.solo.contains(scenes.as_slice()[0].as_str()));
    assert!(fallback.detail.contains(scenes.as_slice()[2].as_str()));
}

#[tokio::test]
async fn test_corpus_is_cached_and_reused() {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(MockCorpus::complete());

    let first = SceneGenerator::new(source.clone()).with_cache(store.clone());
    first.initialize().await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert!(store.get(CORPUS_CACHE_KEY).await.unwrap().is_some());

    let second = SceneGenerator::new(source.clone()).with_cache(store.clone());
    let corpus = second.initialize().await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert!(corpus.couple.contains("couple two"));
}

#[tokio::test]
async fn test_fallback_corpus_is_not_cached() {
    let store = Arc::new(InMemoryStore::new());
    let generator = SceneGenerator::new(Arc::new(MockCorpus::failing())).with_cache(store.clone());
    generator.initialize().await;

    assert!(store.get(CORPUS_CACHE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_source_is_retried_after_falling_back() {
    let source = Arc::new(MockCorpus::complete());
    source.down.store(true, Ordering::SeqCst);
    let generator = SceneGenerator::new(source.clone()).with_rng_seed(3);

    let first = generator.generate(&options(false)).await.unwrap();
    assert!(Corpus::fallback().solo.contains(first.as_slice()[0].as_str()));
    assert!(!generator.is_initialized());
    let calls_while_down = source.calls.load(Ordering::SeqCst);
    assert!(calls_while_down > 0);

    source.down.store(false, Ordering::SeqCst);
    let second = generator.generate(&options(false)).await.unwrap();
    assert!(second.as_slice()[0].starts_with("solo"));
    assert!(generator.is_initialized());
    assert!(source.calls.load(Ordering::SeqCst) > calls_while_down);
}

#[tokio::test]
async fn test_incomplete_source_corpus_is_not_kept() {
    let mut source = MockCorpus::complete();
    source.texts.insert(CorpusCategory::Couple, "   \n".to_string());
    let generator = SceneGenerator::new(Arc::new(source));

    let corpus = generator.initialize().await;
    assert_eq!(*corpus, Corpus::fallback());
    assert!(!generator.is_initialized());
}

#[tokio::test]
async fn test_enhancement_uses_extracted_scenes() {
    let chat = Arc::new(MockChat::replying(
        "<think>ok</think>```json\n{\"scene_prompts\": \"sledding downhill/ warming hands by a fire\"}\n```",
    ));
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete()))
        .with_chat(chat.clone())
        .with_rng_seed(2);

    let scenes = generator.generate(&options(true)).await.unwrap();
    assert_eq!(
        scenes.as_slice(),
        ["sledding downhill".to_string(), "warming hands by a fire".to_string()]
    );

    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model(), "test/model");
    assert_eq!(*request.messages()[0].role(), ChatRole::System);
    assert_eq!(request.messages()[0].content(), SCENE_SYSTEM_PROMPT);
    let user = request.messages()[1].content();
    assert!(user.starts_with("scene_prompts:\"solo"));
    assert!(user.ends_with("and here are the extra Instructions: keep it cozy"));
}

#[tokio::test]
async fn test_malformed_llm_output_still_yields_scenes() {
    let chat = Arc::new(MockChat::replying("{\"scene_prompts\": 42, \"oops\": ["));
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete())).with_chat(chat);

    let scenes = generator.generate(&options(true)).await.unwrap();
    assert!(!scenes.is_empty());
}

#[tokio::test]
async fn test_chat_failure_reverts_to_sampled_scenes() {
    let chat = Arc::new(MockChat::failing());
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete()))
        .with_chat(chat.clone())
        .with_rng_seed(4);

    let scenes = generator.generate(&options(true)).await.unwrap();
    assert_eq!(scenes.len(), 3);
    assert!(scenes.as_slice()[0].starts_with("solo"));
    assert_eq!(chat.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_reply_reverts_to_sampled_scenes() {
    let chat = Arc::new(MockChat::replying("<think>nothing to say</think>"));
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete())).with_chat(chat);

    let scenes = generator.generate(&options(true)).await.unwrap();
    assert_eq!(scenes.len(), 3);
}

#[tokio::test]
async fn test_zero_counts_is_no_valid_scenes() {
    let generator = SceneGenerator::new(Arc::new(MockCorpus::complete()));
    let options = SceneOptions::builder()
        .start(0usize)
        .mid(0usize)
        .end(0usize)
        .build()
        .unwrap();

    let err = generator.generate(&options).await.unwrap_err();
    match err.kind() {
        StoryforgeErrorKind::Prompt(e) => assert_eq!(e.kind, PromptErrorKind::NoValidScenes),
        other => panic!("unexpected error: {}", other),
    }
}
