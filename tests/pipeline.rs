//! Pipeline Integration Tests
//!
//! Tests for a refill cycle against scripted generator output.

mod common;

use std::sync::Arc;

use common::{context, drain_events, posts_json, topics_json, Script, ScriptedGenerator};
use pulse::adapters::Generator;
use pulse::core::{ContentPipeline, RefillOutcome, WorkQueue};
use pulse::config::{ContentSettings, TimeoutSettings};
use pulse::domain::{PulseEvent, Topic, WorkItem};
use tempfile::TempDir;

#[tokio::test]
async fn test_refill_queues_full_batch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("queue.json");
    let generator = ScriptedGenerator::new(Script {
        scout: Some(topics_json(&["ETF inflows", "RBI stance"])),
        architect: Some(posts_json(&["first take", "second take", "third take"])),
        image: Some("neon vault\nat dusk".to_string()),
    });

    let (ctx, mut rx) = context(
        &path,
        Some(generator.clone() as Arc<dyn Generator>),
        None,
        Some(64000.0),
    )
    .await;

    let outcome = ctx.refill().await;
    assert_eq!(outcome, RefillOutcome::Queued { added: 3, pending: 3 });
    assert_eq!(ctx.cycles(), 1);
    assert_eq!(ctx.recent_themes().await, vec!["ETF inflows", "RBI stance"]);

    let stored = WorkQueue::load(&path).await;
    let items: Vec<&WorkItem> = stored.items().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2].index, 3);
    assert_eq!(items[0].image_prompt.as_deref(), Some("neon vault at dusk"));

    let events = drain_events(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        PulseEvent::TrendsFound { topics, price: Some(_) } if topics.len() == 2
    ));
    assert!(matches!(events[1], PulseEvent::BatchGenerated { count: 3, .. }));
}

#[tokio::test]
async fn test_prose_reply_skips_cycle() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("queue.json");
    std::fs::write(&path, r#"[{"post":"already waiting"}]"#).unwrap();

    let generator = ScriptedGenerator::new(Script {
        scout: Some("I'm sorry, I can't browse the internet right now.".to_string()),
        architect: Some(posts_json(&["should never be asked"])),
        image: Some("unused".to_string()),
    });

    let (ctx, mut rx) = context(
        &path,
        Some(generator.clone() as Arc<dyn Generator>),
        None,
        None,
    )
    .await;

    assert_eq!(ctx.refill().await, RefillOutcome::NoTopics);
    assert_eq!(generator.calls_matching("You are the ARCHITECT"), 0);
    assert_eq!(ctx.queue().len().await.unwrap(), 1);
    assert!(drain_events(&mut rx).is_empty());
    assert!(ctx.recent_themes().await.is_empty());
}

#[tokio::test]
async fn test_architect_failure_leaves_themes_alone() {
    let temp = TempDir::new().unwrap();
    let generator = ScriptedGenerator::new(Script {
        scout: Some(topics_json(&["Halving"])),
        architect: None,
        image: None,
    });

    let (ctx, mut rx) = context(
        &temp.path().join("queue.json"),
        Some(generator as Arc<dyn Generator>),
        None,
        None,
    )
    .await;

    assert_eq!(ctx.refill().await, RefillOutcome::NoItems);
    assert!(ctx.recent_themes().await.is_empty());

    // Trends were still announced
    let events = drain_events(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "trends_found");
}

#[tokio::test]
async fn test_image_prompt_failure_is_not_fatal() {
    let generator = ScriptedGenerator::new(Script {
        scout: None,
        architect: Some(posts_json(&["one", "two"])),
        image: None,
    });
    let pipeline = ContentPipeline::new(
        generator.clone(),
        ContentSettings::default(),
        TimeoutSettings::default(),
    );

    let items = pipeline
        .architect(&[Topic::new("Mining"), Topic::new("Fees")], None)
        .await;

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.image_prompt.is_none()));
    assert_eq!(generator.calls_matching("Create a detailed image prompt"), 2);
}

#[tokio::test]
async fn test_image_topic_falls_back_to_subject() {
    let generator = ScriptedGenerator::new(Script {
        scout: None,
        architect: Some(posts_json(&["one", "two", "three"])),
        image: Some("prompt".to_string()),
    });
    let pipeline = ContentPipeline::new(
        generator.clone(),
        ContentSettings::default(),
        TimeoutSettings::default(),
    );

    let items = pipeline.architect(&[Topic::new("Mining")], None).await;
    assert_eq!(items.len(), 3);

    assert_eq!(generator.calls_matching("image prompt for: Mining."), 1);
    assert_eq!(generator.calls_matching("image prompt for: Bitcoin."), 2);
}

#[tokio::test]
async fn test_blank_posts_dropped_and_reindexed() {
    let generator = ScriptedGenerator::new(Script {
        scout: None,
        architect: Some(r#"[{"post":"keep me"},{"post":"   "},{"text":"also\nkept"}]"#.to_string()),
        image: Some("p".to_string()),
    });
    let pipeline = ContentPipeline::new(
        generator,
        ContentSettings::default(),
        TimeoutSettings::default(),
    );

    let items = pipeline.architect(&[], None).await;
    let summary: Vec<(usize, &str)> = items.iter().map(|i| (i.index, i.text.as_str())).collect();
    assert_eq!(summary, vec![(1, "keep me"), (2, "also kept")]);
}

#[tokio::test]
async fn test_refill_without_generator_is_disabled() {
    let temp = TempDir::new().unwrap();
    let (ctx, _rx) = context(&temp.path().join("queue.json"), None, None, None).await;

    assert_eq!(ctx.refill().await, RefillOutcome::Disabled);
    assert_eq!(ctx.queue().len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scout_keeps_valid_entries() {
    let generator = ScriptedGenerator::new(Script {
        scout: Some(
            r#"[{"topic":"ETF inflows","who":null,"statement":"record week","impact":null},
                {"who":"nobody","statement":"no topic key"},
                {"topic":"RBI","who":"RBI","statement":"draft rules","impact":"local access"}]"#
                .to_string(),
        ),
        architect: None,
        image: None,
    });
    let pipeline = ContentPipeline::new(
        generator,
        ContentSettings::default(),
        TimeoutSettings::default(),
    );

    let topics = pipeline.scout(None, &[]).await;

    let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["ETF inflows", "RBI"]);
    assert_eq!(topics[0].originator, "N/A");
    assert_eq!(topics[0].rationale, "");
    assert_eq!(topics[1].originator, "RBI");
}

#[tokio::test]
async fn test_image_topic_follows_reply_position() {
    let generator = ScriptedGenerator::new(Script {
        scout: None,
        architect: Some(posts_json(&["about A", "  ", "about C"])),
        image: Some("p".to_string()),
    });
    let pipeline = ContentPipeline::new(
        generator.clone(),
        ContentSettings::default(),
        TimeoutSettings::default(),
    );

    let items = pipeline
        .architect(&[Topic::new("A"), Topic::new("B"), Topic::new("C")], None)
        .await;

    let summary: Vec<(usize, &str)> = items.iter().map(|i| (i.index, i.text.as_str())).collect();
    assert_eq!(summary, vec![(1, "about A"), (2, "about C")]);
    assert_eq!(generator.calls_matching("image prompt for: A."), 1);
    assert_eq!(generator.calls_matching("image prompt for: C."), 1);
    assert_eq!(generator.calls_matching("image prompt for: B."), 0);
}

#[tokio::test]
async fn test_unstorable_batch_is_not_announced() {
    let temp = TempDir::new().unwrap();
    // A directory at the queue path makes every write fail
    let path = temp.path().join("queue.json");
    std::fs::create_dir_all(path.join("occupied")).unwrap();

    let generator = ScriptedGenerator::new(Script {
        scout: Some(topics_json(&["Halving"])),
        architect: Some(posts_json(&["one", "two"])),
        image: Some("p".to_string()),
    });
    let (ctx, mut rx) = context(&path, Some(generator as Arc<dyn Generator>), None, None).await;

    assert_eq!(ctx.refill().await, RefillOutcome::QueueFailed);
    assert!(ctx.recent_themes().await.is_empty());

    let kinds: Vec<&str> = drain_events(&mut rx).iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["trends_found"]);
}
