// Integration tests for the draft assistant.
//
// These exercise the library's public API end-to-end: configuration loading,
// context composition over the shipped assets, multi-turn draft sessions,
// the read-only tools and the transport request handling.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use hoopcast::config::{self, Config};
use hoopcast::context::extractor::PdfTextExtractor;
use hoopcast::context::ContextAggregator;
use hoopcast::draft::serpentine::next_pick;
use hoopcast::llm::client::{CompletionService, LlmClient, LlmError};
use hoopcast::protocol::{ServerResponse, ToolCall};
use hoopcast::session::{SessionFactory, NO_ANSWER};
use hoopcast::stats::source::CsvStatsSource;
use hoopcast::tools::DraftTools;
use hoopcast::ws_server;

// ===========================================================================
// Test helpers
// ===========================================================================

/// The crate root, where the shipped assets live (the cwd for `cargo test`).
fn crate_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Load the shipped defaults through the public config API, from a scratch
/// base directory seeded with `defaults/`.
fn shipped_config(name: &str) -> Config {
    let tmp = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&tmp);
    let defaults = tmp.join("defaults");
    std::fs::create_dir_all(&defaults).unwrap();
    for file in ["league.toml", "assistant.toml", "credentials.toml.example"] {
        std::fs::copy(crate_root().join("defaults").join(file), defaults.join(file)).unwrap();
    }

    config::ensure_config_files(&tmp).unwrap();
    let mut config = config::load_config_from(&tmp).unwrap();
    let _ = std::fs::remove_dir_all(&tmp);

    // Asset paths are relative to the crate root.
    let absolute = |p: &str| crate_root().join(p).display().to_string();
    config.paths.resources_dir = absolute(&config.paths.resources_dir);
    config.paths.rules_path = absolute(&config.paths.rules_path);
    config.paths.strategy_path = absolute(&config.paths.strategy_path);
    config.paths.stats_csv = absolute(&config.paths.stats_csv);
    config
}

/// Records prompts and answers with a fixed two-block reply.
struct RecordingCompletion {
    prompts: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    fn new() -> Arc<Self> {
        Arc::new(RecordingCompletion {
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionService for RecordingCompletion {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, LlmError> {
        assert_eq!(max_tokens, 700);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(vec![
            "Recommended players: Victor Wembanyama, Nikola Jokic, Shai Gilgeous-Alexander"
                .to_string(),
            "STATS: {\"Victor Wembanyama\": {\"PTS\": 21.44}}".to_string(),
        ])
    }
}

fn services(config: &Config, completion: Arc<dyn CompletionService>) -> (SessionFactory, DraftTools) {
    let context = Arc::new(ContextAggregator::from_config(config, Arc::new(PdfTextExtractor)));
    let stats = Arc::new(CsvStatsSource::new(&config.paths.stats_csv));
    let tools = DraftTools::new(stats, Arc::clone(&context));
    (SessionFactory::from_config(config, completion, context), tools)
}

// ===========================================================================
// Configuration
// ===========================================================================

#[test]
fn shipped_defaults_load_and_validate() {
    let config = shipped_config("hoopcast_it_config");
    assert_eq!(config.league.num_teams, 10);
    assert_eq!(config.llm.max_tokens, 700);
    assert_eq!(config.session.max_history, 0);
    assert!(Path::new(&config.paths.stats_csv).is_file());
    assert!(Path::new(&config.paths.resources_dir).is_dir());
}

// ===========================================================================
// Context composition over the shipped assets
// ===========================================================================

#[tokio::test]
async fn shipped_context_has_both_sections() {
    let config = shipped_config("hoopcast_it_context");
    let context = ContextAggregator::from_config(&config, Arc::new(PdfTextExtractor));

    let text = context.build_context().await;
    // The shipped resources directory carries no PDFs.
    assert!(text.starts_with("Resources:\n\n\nPrompts:\nTEAM-BUILDING STRATEGY"));
    assert!(text.contains("\nLEAGUE RULES\n"));
    assert_eq!(text, context.build_context().await);
}

// ===========================================================================
// Multi-turn sessions
// ===========================================================================

#[tokio::test]
async fn draft_conversation_tracks_state_across_turns() {
    let config = shipped_config("hoopcast_it_conversation");
    let llm = RecordingCompletion::new();
    let (sessions, _tools) = services(&config, llm.clone());
    let mut session = sessions.create();

    // Turn 1: first pick at 5.
    let reply = session.process_query("I drafted LeBron James, at pick 5").await;
    assert_eq!(
        reply,
        "Recommended players: Victor Wembanyama, Nikola Jokic, Shai Gilgeous-Alexander\n\
         STATS: {\"Victor Wembanyama\": {\"PTS\": 21.44}}"
    );
    assert_eq!(session.state().drafted_players, vec!["Lebron James"]);
    assert_eq!(session.state().current_pick, Some(15));
    let first = llm.prompt(0);
    assert!(first.contains("Prompts:\nTEAM-BUILDING STRATEGY"));
    assert!(first.contains("\n\nUser question: I drafted LeBron James, at pick 5\n"));
    assert!(first.contains("\nDraft Pick: 5\n"));

    // Turn 2: restating the roster leaves the pick alone.
    session
        .process_query("My current roster is: LeBron James, Victor Wembanyama")
        .await;
    assert_eq!(
        session.state().drafted_players,
        vec!["Lebron James", "Victor Wembanyama"]
    );
    assert_eq!(session.state().current_pick, Some(15));

    // Turn 3: next-pick intent mirrors the serpentine order.
    session.process_query("Who should I pick next?").await;
    assert_eq!(session.state().current_pick, next_pick(15));
    assert!(llm.prompt(2).contains("\nDraft Pick: 25\n"));
    assert!(llm
        .prompt(2)
        .contains("\nYour drafted players: Lebron James, Victor Wembanyama\n"));

    // Turn 4: round/position overrides a bare pick number.
    session
        .process_query("I'm drafting at position 4 in round 3, not pick 99")
        .await;
    assert_eq!(session.state().current_pick, Some(24));

    assert_eq!(session.history().len(), 8);
}

#[tokio::test]
async fn sessions_from_one_factory_are_isolated() {
    let config = shipped_config("hoopcast_it_isolation");
    let (sessions, _tools) = services(&config, RecordingCompletion::new());

    let mut first = sessions.create();
    let second = sessions.create();
    first.process_query("I drafted Nikola Jokic at pick 2").await;

    assert_eq!(first.state().current_pick, Some(12));
    assert_eq!(second.state().current_pick, None);
    assert!(second.state().drafted_players.is_empty());
    assert!(second.history().is_empty());
}

#[tokio::test]
async fn unconfigured_backend_degrades_to_error_reply() {
    let mut config = shipped_config("hoopcast_it_disabled");
    config.credentials.anthropic_api_key = None;
    let client = LlmClient::from_config(&config);
    assert!(matches!(client, LlmClient::Disabled));

    let (sessions, _tools) = services(&config, Arc::new(client));
    let mut session = sessions.create();

    let reply = session.process_query("I drafted Shai Gilgeous-Alexander at pick 1").await;
    assert!(reply.starts_with("Backend error:"), "got {reply}");
    assert_ne!(reply, NO_ANSWER);
    // State transitions are kept even though the reply failed.
    assert_eq!(session.state().current_pick, Some(11));
    assert_eq!(
        session.state().drafted_players,
        vec!["Shai Gilgeous-Alexander"]
    );
}

// ===========================================================================
// Tools over the shipped stats table
// ===========================================================================

#[tokio::test]
async fn fetch_player_stats_from_shipped_table() {
    let config = shipped_config("hoopcast_it_stats");
    let (_sessions, tools) = services(&config, RecordingCompletion::new());

    let record = tools.fetch_player_stats("nikola jokic").await.unwrap();
    let seasons: Vec<&str> = record.keys().map(String::as_str).collect();
    assert_eq!(seasons, vec!["2021-22", "2022-23", "2023-24"]);

    let latest = &record["2023-24"];
    assert_eq!(latest.games, 79.0);
    assert_eq!(latest.points, 26.39);
    assert_eq!(latest.rebounds, 12.35);
    assert_eq!(latest.assists, 8.96);
    assert_eq!(latest.fg_pct, 0.58);

    // Four seasons on file, three reported.
    let lebron = tools.fetch_player_stats("LeBron James").await.unwrap();
    assert_eq!(lebron.len(), 3);
    assert!(!lebron.contains_key("2020-21"));

    assert!(tools
        .fetch_player_stats("Not A Real Player")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn tools_do_not_touch_session_state() {
    let config = shipped_config("hoopcast_it_tools_state");
    let (sessions, tools) = services(&config, RecordingCompletion::new());
    let mut session = sessions.create();
    session.process_query("I'm at pick 8").await;
    let before = session.state().clone();

    for call in [
        ToolCall::FetchPlayerStats {
            player_name: "Victor Wembanyama".into(),
        },
        ToolCall::DraftStrategy,
        ToolCall::ReferenceContext,
    ] {
        tools.dispatch(&call).await.unwrap();
    }

    assert_eq!(session.state(), &before);
}

// ===========================================================================
// Transport request handling
// ===========================================================================

#[tokio::test]
async fn handle_frame_routes_chat_tools_and_errors() {
    let config = shipped_config("hoopcast_it_frames");
    let (sessions, tools) = services(&config, RecordingCompletion::new());
    let mut session = sessions.create();

    let chat = ws_server::handle_frame(&mut session, &tools, r#"{"message": "I'm at pick 3"}"#).await;
    assert!(matches!(chat, ServerResponse::Response(ref text) if text.starts_with("Recommended players:")));

    let strategy = ws_server::handle_frame(&mut session, &tools, r#"{"tool": "draft_strategy"}"#).await;
    match strategy {
        ServerResponse::Result(value) => {
            let text = value.as_str().unwrap();
            assert!(text.starts_with("TEAM-BUILDING STRATEGY"));
            assert!(text.contains("\nLEAGUE RULES"));
        }
        other => panic!("expected result, got {other:?}"),
    }

    let stats = ws_server::handle_frame(
        &mut session,
        &tools,
        r#"{"tool": "fetch_player_stats", "player_name": "victor wembanyama"}"#,
    )
    .await;
    match stats {
        ServerResponse::Result(value) => {
            assert_eq!(value["2023-24"]["G"], json!(71.0));
            assert_eq!(value["2023-24"]["BLK"], json!(3.58));
        }
        other => panic!("expected result, got {other:?}"),
    }

    let bad = ws_server::handle_frame(&mut session, &tools, "{").await;
    assert!(matches!(bad, ServerResponse::Error(_)));

    assert_eq!(session.state().current_pick, Some(3));
}
