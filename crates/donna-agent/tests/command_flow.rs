// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash command flows end to end: OAuth connect, status, today, disconnect.

use std::sync::Arc;

use donna_agent::commands::{parse, Command, CommandHandler};
use donna_calendar::{CalendarClient, OAuthClient, TokenStore};
use donna_config::model::{GoogleConfig, SessionConfig, StorageConfig};
use donna_core::StorageAdapter;
use donna_storage::SqliteStorage;
use donna_tools::{ToolRegistry, NOT_CONNECTED_MESSAGE};
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Flow {
    handler: CommandHandler,
    storage: Arc<dyn StorageAdapter>,
    _dir: tempfile::TempDir,
}

async fn flow(calendar: &MockServer, oauth: &MockServer) -> Flow {
    let dir = tempdir().unwrap();
    let storage_config = StorageConfig {
        database_path: dir.path().join("commands.db").to_str().unwrap().to_string(),
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
    let registry = Arc::new(ToolRegistry::new(
        calendar_client,
        Arc::clone(&tokens),
        &SessionConfig::default(),
    ));

    Flow {
        handler: CommandHandler::new(
            Arc::clone(&storage),
            tokens,
            registry,
            "Donna".to_string(),
        ),
        storage,
        _dir: dir,
    }
}

#[tokio::test]
async fn connect_without_code_shows_the_consent_link() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let reply = f
        .handler
        .handle("alice", Command::ConnectCalendar(None))
        .await;
    assert!(reply.contains("accounts.google.com"));
    assert!(reply.contains("/connect_calendar <code>"));
}

#[tokio::test]
async fn connect_with_code_exchanges_and_persists() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0AbCdEf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "refresh_token": "1//refresh",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&oauth)
        .await;

    let reply = f
        .handler
        .handle("alice", Command::ConnectCalendar(Some("4/0AbCdEf".into())))
        .await;
    assert!(reply.contains("Calendar connected"));

    let cred = f.storage.get_credential("alice").await.unwrap().unwrap();
    assert_eq!(cred.access_token, "ya29.fresh");
    assert_eq!(cred.refresh_token.as_deref(), Some("1//refresh"));
}

#[tokio::test]
async fn connect_with_a_bad_code_reports_the_failure() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .mount(&oauth)
        .await;

    let reply = f
        .handler
        .handle("alice", Command::ConnectCalendar(Some("bogus".into())))
        .await;
    assert!(reply.contains("Connection failed"));
    assert!(f.storage.get_credential("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn status_reflects_the_connection_state() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let before = f.handler.handle("alice", Command::CalendarStatus).await;
    assert!(before.contains("not connected"));

    let cred = donna_core::types::Credential {
        access_token: "ya29.token".into(),
        refresh_token: Some("1//refresh".into()),
        expires_at: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
        scope: None,
    };
    f.storage.put_credential("alice", &cred).await.unwrap();

    let after = f.handler.handle("alice", Command::CalendarStatus).await;
    assert!(after.contains("Calendar connected"));
    assert!(after.contains("valid until"));
}

#[tokio::test]
async fn today_without_a_connection_explains_how_to_connect() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let reply = f.handler.handle("alice", Command::Today).await;
    assert_eq!(reply, NOT_CONNECTED_MESSAGE);
}

#[tokio::test]
async fn today_lists_events_when_connected() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let cred = donna_core::types::Credential {
        access_token: "ya29.token".into(),
        refresh_token: Some("1//refresh".into()),
        expires_at: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
        scope: None,
    };
    f.storage.put_credential("alice", &cred).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "evt1",
                "summary": "Dentist",
                "start": {"dateTime": "2026-08-29T14:00:00+00:00"},
                "end": {"dateTime": "2026-08-29T15:00:00+00:00"}
            }]
        })))
        .mount(&calendar)
        .await;

    let reply = f.handler.handle("alice", Command::Today).await;
    assert!(reply.contains("Dentist"));
}

#[tokio::test]
async fn disconnect_removes_the_credential() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let cred = donna_core::types::Credential {
        access_token: "ya29.token".into(),
        refresh_token: None,
        expires_at: None,
        scope: None,
    };
    f.storage.put_credential("alice", &cred).await.unwrap();

    let reply = f.handler.handle("alice", Command::DisconnectCalendar).await;
    assert_eq!(reply, "Calendar disconnected.");
    assert!(f.storage.get_credential("alice").await.unwrap().is_none());

    // Disconnecting again is harmless.
    let again = f.handler.handle("alice", Command::DisconnectCalendar).await;
    assert_eq!(again, "Calendar disconnected.");
}

#[tokio::test]
async fn start_and_help_mention_the_essentials() {
    let calendar = MockServer::start().await;
    let oauth = MockServer::start().await;
    let f = flow(&calendar, &oauth).await;

    let start = f.handler.handle("alice", Command::Start).await;
    assert!(start.contains("Donna"));
    assert!(start.contains("/connect_calendar"));

    let help = f.handler.handle("alice", Command::Help).await;
    assert!(help.contains("/today"));

    // parse() and handle() agree on the unknown-command path.
    let unknown = parse("/nope").unwrap();
    let reply = f.handler.handle("alice", unknown).await;
    assert!(reply.contains("/help"));
}
