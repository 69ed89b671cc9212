// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session engine scenarios against a scripted provider, a real
//! SQLite turn log, and mocked Google endpoints.

use std::sync::Arc;

use chrono::Utc;
use donna_agent::session::{SessionEngine, APOLOGY_MESSAGE};
use donna_calendar::{CalendarClient, OAuthClient, TokenStore};
use donna_config::model::{DonnaConfig, GoogleConfig, StorageConfig};
use donna_core::types::{ContentBlock, Credential, TurnRole};
use donna_core::{DonnaError, StorageAdapter};
use donna_storage::SqliteStorage;
use donna_test_utils::MockProvider;
use donna_tools::{ToolRegistry, NOT_CONNECTED_MESSAGE};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    engine: SessionEngine,
    provider: Arc<MockProvider>,
    storage: Arc<dyn StorageAdapter>,
    _dir: tempfile::TempDir,
}

async fn stack(calendar: &MockServer, oauth: &MockServer) -> Stack {
    let dir = tempdir().unwrap();
    let storage_config = StorageConfig {
        database_path: dir.path().join("engine.db").to_str().unwrap().to_string(),
        wal_mode: false,
    };
    let storage: Arc<dyn StorageAdapter> = {
        let s = SqliteStorage::new(storage_config);
        s.initialize().await.unwrap();
        Arc::new(s)
    };

    let google = GoogleConfig {
        client_id: Some("test-client".into()),
        client_secret: Some("test-secret".into()),
        ..GoogleConfig::default()
    };
    let oauth_client = OAuthClient::new(&google)
        .unwrap()
        .with_token_url(oauth.uri());
    let tokens = Arc::new(TokenStore::new(Arc::clone(&storage), oauth_client, &google));
    let calendar_client = CalendarClient::new().unwrap().with_base_url(calendar.uri());

    let config = DonnaConfig::default();
    let registry = Arc::new(ToolRegistry::new(
        calendar_client,
        tokens,
        &config.session,
    ));
    let provider = Arc::new(MockProvider::new());
    let engine = SessionEngine::new(
        Arc::clone(&storage),
        Arc::clone(&provider) as _,
        registry,
        config,
    );

    Stack {
        engine,
        provider,
        storage,
        _dir: dir,
    }
}

async fn connect(storage: &Arc<dyn StorageAdapter>, user_id: &str) {
    let cred = Credential {
        access_token: "ya29.token".into(),
        refresh_token: Some("1//refresh".into()),
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        scope: None,
    };
    storage.put_credential(user_id, &cred).await.unwrap();
}

fn events_body() -> serde_json::Value {
    serde_json::json!({
        "items": [{
            "id": "evt1",
            "summary": "Standup",
            "start": {"dateTime": "2026-08-29T09:00:00+00:00"},
            "end": {"dateTime": "2026-08-29T09:15:00+00:00"}
        }]
    })
}

#[tokio::test]
async fn plain_turn_persists_user_and_assistant() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider.push_reply("Nothing much today.").await;
    let reply = s.engine.handle_turn("alice", "anything going on?").await.unwrap();
    assert_eq!(reply, "Nothing much today.");

    let turns = s.storage.recent_turns("alice", 10).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "anything going on?");
    assert_eq!(turns[1].role, TurnRole::Assistant);
    assert_eq!(turns[1].content, "Nothing much today.");

    // The model saw the system prompt, the user message, and all three tools.
    let requests = s.provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].system_prompt.is_some());
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].tools.len(), 3);
}

#[tokio::test]
async fn tool_round_trip_produces_paired_turns() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;
    connect(&s.storage, "alice").await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
        .mount(&calendar)
        .await;

    s.provider
        .push_tool_call("toolu_1", "get_today_events", serde_json::json!({}))
        .await;
    s.provider.push_reply("You have Standup at 9:00.").await;

    let reply = s.engine.handle_turn("alice", "what's on today?").await.unwrap();
    assert_eq!(reply, "You have Standup at 9:00.");

    // Turn log: user, assistant tool call, tool result, final assistant.
    let turns = s.storage.recent_turns("alice", 10).await.unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].role, TurnRole::Assistant);
    assert_eq!(turns[1].tool_name.as_deref(), Some("get_today_events"));
    assert_eq!(turns[1].tool_call_id.as_deref(), Some("toolu_1"));
    assert_eq!(turns[2].role, TurnRole::Tool);
    assert_eq!(turns[2].tool_call_id.as_deref(), Some("toolu_1"));
    assert!(turns[2].content.contains("Standup"));
    assert_eq!(turns[3].role, TurnRole::Assistant);

    // Second model request replays the tool_use/tool_result pair in order.
    let requests = s.provider.requests().await;
    assert_eq!(requests.len(), 2);
    let replay = &requests[1].messages;
    assert_eq!(replay.len(), 3);
    assert!(matches!(replay[1].content[0], ContentBlock::ToolUse { .. }));
    match &replay[2].content[0] {
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            ..
        } => {
            assert_eq!(tool_use_id, "toolu_1");
            assert!(content.contains("Standup"));
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
}

#[tokio::test]
async fn unconnected_calendar_degrades_inside_the_loop() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider
        .push_tool_call("toolu_1", "get_today_events", serde_json::json!({}))
        .await;
    s.provider
        .push_reply("You haven't connected a calendar yet; use /connect_calendar.")
        .await;

    let reply = s.engine.handle_turn("alice", "what's on?").await.unwrap();
    assert!(reply.contains("/connect_calendar"));

    let turns = s.storage.recent_turns("alice", 10).await.unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[2].role, TurnRole::Tool);
    assert_eq!(turns[2].content, NOT_CONNECTED_MESSAGE);
}

#[tokio::test]
async fn tool_round_budget_degrades_to_apology() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    // The model keeps asking for tools; default budget is 4 rounds.
    for i in 0..6 {
        s.provider
            .push_tool_call(
                &format!("toolu_{i}"),
                "get_today_events",
                serde_json::json!({}),
            )
            .await;
    }

    let reply = s.engine.handle_turn("alice", "loop forever").await.unwrap();
    assert_eq!(reply, APOLOGY_MESSAGE);
    assert_eq!(s.provider.request_count().await, 4);

    let turns = s.storage.recent_turns("alice", 20).await.unwrap();
    let last = turns.last().unwrap();
    assert_eq!(last.role, TurnRole::Assistant);
    assert_eq!(last.content, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn transient_provider_failure_is_retried() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider
        .push_error(DonnaError::Provider {
            message: "overloaded".into(),
            status: Some(529),
            source: None,
        })
        .await;
    s.provider.push_reply("Recovered fine.").await;

    let reply = s.engine.handle_turn("alice", "hello").await.unwrap();
    assert_eq!(reply, "Recovered fine.");
    assert_eq!(s.provider.request_count().await, 2);
}

#[tokio::test]
async fn permanent_provider_failure_degrades_to_a_persisted_apology() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider
        .push_error(DonnaError::Provider {
            message: "bad request".into(),
            status: Some(400),
            source: None,
        })
        .await;

    let reply = s.engine.handle_turn("alice", "hello").await.unwrap();
    assert_eq!(reply, APOLOGY_MESSAGE);
    // Permanent errors are not retried.
    assert_eq!(s.provider.request_count().await, 1);

    // The reply the user saw is the last turn in the log.
    let turns = s.storage.recent_turns("alice", 10).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[1].role, TurnRole::Assistant);
    assert_eq!(turns[1].content, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn exhausted_provider_retries_degrade_to_a_persisted_apology() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    // One more transient failure than the retry budget allows.
    for _ in 0..3 {
        s.provider
            .push_error(DonnaError::Provider {
                message: "overloaded".into(),
                status: Some(529),
                source: None,
            })
            .await;
    }

    let reply = s.engine.handle_turn("alice", "hello").await.unwrap();
    assert_eq!(reply, APOLOGY_MESSAGE);
    assert_eq!(s.provider.request_count().await, 3);

    let turns = s.storage.recent_turns("alice", 10).await.unwrap();
    let last = turns.last().unwrap();
    assert_eq!(last.role, TurnRole::Assistant);
    assert_eq!(last.content, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn later_turns_replay_earlier_conversation() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider.push_reply("Hi Alice.").await;
    s.provider.push_reply("Still here.").await;

    s.engine.handle_turn("alice", "hello").await.unwrap();
    s.engine.handle_turn("alice", "you there?").await.unwrap();

    let requests = s.provider.requests().await;
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[1].messages[0].role, "user");
    assert_eq!(requests[1].messages[1].role, "assistant");
    assert_eq!(requests[1].messages[2].role, "user");
}

#[tokio::test]
async fn users_have_independent_conversations() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let s = stack(&calendar, &oauth).await;

    s.provider.push_reply("for alice").await;
    s.provider.push_reply("for bob").await;

    s.engine.handle_turn("alice", "hi").await.unwrap();
    s.engine.handle_turn("bob", "hi").await.unwrap();

    let alice = s.storage.recent_turns("alice", 10).await.unwrap();
    let bob = s.storage.recent_turns("bob", 10).await.unwrap();
    assert_eq!(alice.len(), 2);
    assert_eq!(bob.len(), 2);
    assert_eq!(alice[1].content, "for alice");
    assert_eq!(bob[1].content, "for bob");
}
