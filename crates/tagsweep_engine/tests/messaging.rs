mod common;

use std::sync::Arc;

use common::{init_logging, ScriptedClassifier};
use serde_json::{json, Value};
use tagsweep_core::{Settings, Stats};
use tagsweep_engine::{
    ClassifyError, Coordinator, MemoryStore, MessageError, MessagingClassifier, PageClassifier,
    Request, Store,
};

const URL: &str = "https://crypt.bandcamp.com/album/frozen-keep";

fn coordinator(classifier: ScriptedClassifier, store: Arc<MemoryStore>) -> Coordinator {
    Coordinator::new(Arc::new(classifier), store)
}

async fn call(coordinator: &Coordinator, request: Value) -> Value {
    let raw = coordinator.handle_json(&request.to_string()).await;
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn fetch_page_reports_match() {
    init_logging();
    let coordinator = coordinator(ScriptedClassifier::new(true), Arc::new(MemoryStore::new()));

    let response = call(&coordinator, json!({"action": "fetchPage", "url": URL})).await;
    assert_eq!(response, json!({"success": true, "matches": true, "url": URL}));
}

#[tokio::test]
async fn fetch_page_failure_flags_rate_limiting() {
    let classifier = ScriptedClassifier::new(true).script(
        URL,
        vec![
            Err(ClassifyError::RateLimited),
            Err(ClassifyError::HttpError { status: 500 }),
        ],
    );
    let coordinator = coordinator(classifier, Arc::new(MemoryStore::new()));

    let limited = call(&coordinator, json!({"action": "fetchPage", "url": URL})).await;
    assert_eq!(limited["success"], json!(false));
    assert_eq!(limited["rateLimited"], json!(true));
    assert_eq!(limited["url"], json!(URL));
    assert!(limited["error"].as_str().unwrap().contains("429"));

    let failed = call(&coordinator, json!({"action": "fetchPage", "url": URL})).await;
    assert_eq!(failed["rateLimited"], json!(false));
}

#[tokio::test]
async fn unknown_and_malformed_messages_are_rejected() {
    let coordinator = coordinator(ScriptedClassifier::new(false), Arc::new(MemoryStore::new()));

    let response = call(&coordinator, json!({"action": "toggleHighlights"})).await;
    assert_eq!(response, json!({"success": false, "error": "Unknown action"}));

    assert!(matches!(
        Request::from_json(r#"{"action": "fetchPage"}"#),
        Err(MessageError::Malformed(_))
    ));
    assert!(matches!(
        Request::from_json("not json"),
        Err(MessageError::Malformed(_))
    ));
}

#[tokio::test]
async fn stats_and_settings_round_trip_through_the_store() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = coordinator(ScriptedClassifier::new(false), store.clone());

    let delta = json!({"totalChecked": 5, "totalRemoved": 2, "errors": 1});
    for _ in 0..2 {
        let response = call(&coordinator, json!({"action": "updateStats", "stats": delta})).await;
        assert_eq!(response, json!({"success": true}));
    }
    let stats = call(&coordinator, json!({"action": "getStats"})).await;
    assert_eq!(
        stats["stats"],
        json!({"totalChecked": 10, "totalRemoved": 4, "errors": 2})
    );

    let saved = call(
        &coordinator,
        json!({"action": "saveSettings", "settings": {"batchSize": 0, "debugMode": true}}),
    )
    .await;
    assert_eq!(saved["success"], json!(true));
    let stored = store.load_settings().unwrap();
    assert_eq!(stored.batch_size, 1);
    assert!(stored.debug_mode);

    let settings = call(&coordinator, json!({"action": "getSettings"})).await;
    assert_eq!(settings["settings"]["debugMode"], json!(true));
    assert_eq!(
        serde_json::from_value::<Settings>(settings["settings"].clone()).unwrap(),
        stored
    );
    assert_eq!(store.load_stats().unwrap(), Stats { total_checked: 10, total_removed: 4, errors: 2 });
}

#[tokio::test]
async fn messaging_classifier_maps_responses_back() {
    let classifier = ScriptedClassifier::new(false).script(
        URL,
        vec![
            Ok(true),
            Err(ClassifyError::RateLimited),
            Err(ClassifyError::Timeout),
        ],
    );
    let coordinator = Arc::new(coordinator(classifier, Arc::new(MemoryStore::new())));
    let agent = MessagingClassifier::new(coordinator);

    let classification = agent.classify(URL).await.unwrap();
    assert!(classification.matches);
    assert_eq!(classification.url, URL);

    assert_eq!(agent.classify(URL).await.unwrap_err(), ClassifyError::RateLimited);
    assert_eq!(agent.classify(URL).await.unwrap_err(), ClassifyError::Timeout);
}

#[tokio::test]
async fn failure_kind_survives_the_json_boundary() {
    let classifier = ScriptedClassifier::new(false).script(
        URL,
        vec![
            Err(ClassifyError::HttpError { status: 404 }),
            Err(ClassifyError::ParseError("response too large".into())),
        ],
    );
    let coordinator = Arc::new(coordinator(classifier, Arc::new(MemoryStore::new())));

    let raw = coordinator
        .handle_json(&json!({"action": "fetchPage", "url": URL}).to_string())
        .await;
    let response: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        response["failure"],
        json!({"kind": "httpError", "detail": {"status": 404}})
    );
    assert_eq!(response["error"], json!("http status 404"));

    let agent = MessagingClassifier::new(coordinator);
    assert_eq!(
        agent.classify(URL).await.unwrap_err(),
        ClassifyError::ParseError("response too large".into())
    );
}
