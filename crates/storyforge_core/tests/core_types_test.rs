use storyforge_core::{
    GeneratedImage, Generation, GenerationSettings, ImageResponse, ImageSize, PromptSettings,
    SceneList,
};
use strum::IntoEnumIterator;

#[test]
fn every_size_preset_parses_to_its_dimensions() {
    for size in ImageSize::iter() {
        let label = size.to_string();
        let (w, h) = label
            .split_once('x')
            .map(|(w, h)| (w.parse::<u32>().unwrap(), h.parse::<u32>().unwrap()))
            .unwrap();

        let parsed: ImageSize = label.parse().unwrap();
        assert_eq!(parsed, size);
        assert!(parsed.width() > 0 && parsed.height() > 0);
        assert_eq!((parsed.width(), parsed.height()), (w, h));
    }
}

#[test]
fn landscape_preset_matches_documented_mapping() {
    let size: ImageSize = "1344x768".parse().unwrap();
    assert_eq!(size.dimensions(), (1344, 768));
}

#[test]
fn unknown_size_is_rejected() {
    let err = "1024x1024".parse::<ImageSize>().unwrap_err();
    assert!(err.user_message().contains("1024x1024"));
}

#[test]
fn scene_list_serializes_as_slash_string() {
    let mut prompts = PromptSettings::default();
    prompts.character_name = "Aria".to_string();
    prompts.prompt_scenes = SceneList::from(vec![
        "reading a book".to_string(),
        "  ".to_string(),
        "dancing in rain".to_string(),
    ]);

    let json = serde_json::to_value(&prompts).unwrap();
    assert_eq!(json["promptScenes"], "reading a book/dancing in rain");
    assert_eq!(json["characterName"], "Aria");

    let back: PromptSettings = serde_json::from_value(json).unwrap();
    assert_eq!(back.prompt_scenes.len(), 2);
}

#[test]
fn legacy_settings_json_is_accepted() {
    let json = r#"{
        "style": "meitabu",
        "aiEnhancer": false,
        "seed": 123,
        "size": "768x1344",
        "start": 1,
        "mid": 2,
        "end": 3,
        "llmModel": "some/model"
    }"#;

    let settings: GenerationSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.size, ImageSize::Portrait);
    assert_eq!(settings.llm_model_or_default(), "some/model");
    assert!(!settings.ai_enhancer);
}

#[test]
fn blank_model_falls_back_to_default() {
    let settings = GenerationSettings {
        llm_model: Some("  ".to_string()),
        ..GenerationSettings::default()
    };
    assert_eq!(settings.llm_model_or_default(), storyforge_core::DEFAULT_LLM_MODEL);
}

#[test]
fn whitespace_character_name_fails_validation() {
    let prompts = PromptSettings {
        character_name: "   ".to_string(),
        ..PromptSettings::default()
    };
    assert!(prompts.validate().is_err());
}

#[test]
fn lora_air_ignores_blank_values() {
    let mut settings = GenerationSettings::default();
    assert_eq!(settings.lora_air(), None);

    settings.lora = Some("   ".to_string());
    assert_eq!(settings.lora_air(), None);

    settings.lora = Some(" 2@5 ".to_string());
    assert_eq!(settings.lora_air(), Some("2@5"));
}

#[test]
fn saved_record_shape_round_trips() {
    let json = serde_json::json!({
        "id": "6f2c1f9e-8a8e-4a55-9d55-3f0f8a7f2b10",
        "url": "https://cdn.example/1.webp",
        "seed": 77,
        "timestamp": "2024-05-01T10:00:00Z",
        "settings": {
            "template": "portrait",
            "style": "Anime",
            "aiEnhancer": true,
            "seed": 77,
            "size": "836x1216",
            "civitaiLora": "133@701",
            "start": 3,
            "mid": 2,
            "end": 1
        },
        "prompts": {
            "characterName": "Aria",
            "characterBase": "",
            "clothingDetails": "",
            "characterSceneDetails": "",
            "background": "harbor",
            "finalDetailQualityTags": "",
            "promptScenes": "",
            "maxPrompts": "6",
            "arguments": "",
            "negativePrompt": ""
        }
    });

    let image: GeneratedImage = serde_json::from_value(json).unwrap();
    assert_eq!(image.settings().template, "portrait");
    assert_eq!(image.settings().lora_air(), Some("133@701"));
    assert_eq!(image.prompts().max_prompts, "6");

    let back = serde_json::to_value(&image).unwrap();
    assert_eq!(back["settings"]["civitaiLora"], "133@701");
    assert_eq!(back["settings"]["template"], "portrait");
    assert_eq!(back["prompts"]["maxPrompts"], "6");
    assert!(back["prompts"].get("civitaiLora").is_none());
}

#[test]
fn search_matches_snapshot_fields_case_insensitively() {
    let prompts = PromptSettings {
        character_name: "Aria".to_string(),
        background: "Moonlit Harbor".to_string(),
        ..PromptSettings::default()
    };
    let image = GeneratedImage::new("https://x/1.png", 1, GenerationSettings::default(), prompts.clone());
    let generation = Generation::new(vec![image.clone()], GenerationSettings::default(), prompts);

    assert!(image.matches_search("harbor"));
    assert!(generation.matches_search("REALISTIC"));
    assert!(generation.matches_search(""));
    assert!(!image.matches_search("castle"));
}

#[test]
fn response_payloads_become_data_uris() {
    let response = ImageResponse::new(
        vec!["QUJD".to_string(), "https://cdn/x.webp".to_string(), "".to_string()],
        Some("req-1".to_string()),
    );
    let urls = response.to_view_urls("image/webp");
    assert_eq!(urls, vec!["data:image/webp;base64,QUJD", "https://cdn/x.webp"]);
}

#[test]
fn image_without_url_field_deserializes_empty() {
    let image = GeneratedImage::new("data:image/png;base64,AA", 9, GenerationSettings::default(), PromptSettings::default());
    let mut json = serde_json::to_value(&image).unwrap();
    json.as_object_mut().unwrap().remove("url");

    let back: GeneratedImage = serde_json::from_value(json).unwrap();
    assert_eq!(back.url(), "");
    assert_eq!(back.id(), image.id());
    assert_eq!(*back.seed(), 9);
}
