// Line-oriented stdin/stdout transport.
//
// One session for the whole process. Each non-empty line is an utterance;
// lines starting with `/` run a tool instead:
//
//   /stats <player name>   recent-season stats as JSON
//   /strategy              team-building strategy and league rules
//   /context               extracted scouting documents
//   /quit                  exit

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::protocol::ToolCall;
use crate::session::DraftSession;
use crate::tools::DraftTools;

const PROMPT: &str = "> ";

/// Run the REPL over stdin and stdout until EOF or `/quit`.
pub async fn run(session: DraftSession, tools: DraftTools) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_with(stdin, stdout, session, tools).await
}

/// Drive one session from `input`, writing replies to `output`.
pub async fn run_with<R, W>(
    input: R,
    mut output: W,
    mut session: DraftSession,
    tools: DraftTools,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(PROMPT.as_bytes()).await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;
            continue;
        }

        let reply = match parse_command(trimmed) {
            Some(Command::Quit) => break,
            Some(Command::Tool(call)) => match tools.dispatch(&call).await {
                Ok(serde_json::Value::String(text)) => text,
                Ok(value) => serde_json::to_string_pretty(&value)?,
                Err(e) => format!("Error: {e}"),
            },
            Some(Command::Unknown(name)) => format!("Unknown command: /{name}"),
            // Utterances go to the session exactly as typed.
            None => session.process_query(&line).await,
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n\n").await?;
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;
    }

    info!(
        turns = session.history().len(),
        pick = %session.state().pick_label(),
        "REPL session ended"
    );
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Command {
    Tool(ToolCall),
    Quit,
    Unknown(String),
}

/// `None` for plain utterances.
fn parse_command(line: &str) -> Option<Command> {
    let rest = line.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match name {
        "stats" => Command::Tool(ToolCall::FetchPlayerStats {
            player_name: arg.to_string(),
        }),
        "strategy" => Command::Tool(ToolCall::DraftStrategy),
        "context" => Command::Tool(ToolCall::ReferenceContext),
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}
