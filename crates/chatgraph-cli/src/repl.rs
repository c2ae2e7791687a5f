//! Interactive terminal chat.

use std::io::{BufRead, Write};

use chatgraph_core::USER_LINE_PREFIX;
use chatgraph_engine::{ConversationEngine, Session, TurnOutcome};
use chatgraph_storage::GraphStore;

use crate::error::CliError;

/// Runs one chat session, reading user lines from `input` and writing new
/// transcript lines to `output`. An empty line or end of input quits.
pub fn run_chat<S: GraphStore + ?Sized>(
    store: &mut S,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<Session, CliError> {
    let mut engine = ConversationEngine::new(store);
    let mut session = engine.initialize_chat()?;
    let mut shown = print_new_lines(&session, 0, None, &mut output)?;

    for line in input.lines() {
        let line = line?;
        let text = line.trim_end_matches('\r');
        if text.is_empty() {
            break;
        }
        let outcome = engine.handle_user_response(&mut session, text)?;
        // Terminated turns append no echo.
        let echo = match outcome {
            TurnOutcome::Terminated { .. } => None,
            _ => Some(format!("{}{}", USER_LINE_PREFIX, text)),
        };
        shown = print_new_lines(&session, shown, echo.as_deref(), &mut output)?;
    }

    tracing::debug!(session = %session.id(), lines = session.history().len(), "chat finished");
    Ok(session)
}

/// Writes transcript lines past `shown`. When `echo` is given, the first new
/// line is the echo of what the user just typed and is skipped.
fn print_new_lines(
    session: &Session,
    shown: usize,
    echo: Option<&str>,
    output: &mut impl Write,
) -> Result<usize, CliError> {
    let mut lines = session.history()[shown..].iter().peekable();
    if let Some(echo) = echo {
        lines.next_if(|line| line.as_str() == echo);
    }
    for line in lines {
        writeln!(output, "{}", line)?;
    }
    output.flush()?;
    Ok(session.history().len())
}
