//! Interactive board session.
//!
//! Reads one command per line from stdin and runs it against a single open
//! board. Stdin and the auto-save timer are polled from one task, so a timer
//! write never interleaves with a command's write-through.

use std::io::{IsTerminal, Write};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::autosave::AutoSave;
use crate::cli::{execute, Board, BoardCommand};
use crate::error::{Error, Result};
use crate::output::{emit_error, OutputOptions};

#[derive(Parser, Debug)]
#[command(name = "kanban", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Board(BoardCommand),

    /// Leave the session
    #[command(alias = "quit")]
    Exit,
}

enum Flow {
    Continue,
    Exit,
}

pub fn run(board: Board, output: OutputOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(board, output))
}

async fn session(mut board: Board, output: OutputOptions) -> Result<()> {
    let autosave = AutoSave::from_secs(board.config.autosave.interval_secs);
    let interactive = std::io::stdin().is_terminal();

    if interactive && !output.quiet && !output.json {
        println!(
            "kanban shell ({} tasks, auto-save every {}s). Type 'help' for commands, 'exit' to leave.",
            board.store.len(),
            autosave.interval().as_secs()
        );
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let prompt = interactive.then(std::io::stdout);
    read_commands(&mut board, stdin, prompt, autosave, output).await?;

    debug!("shell closed; final save");
    if let Some(warning) = autosave.run_once(&mut board.store) {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// Run commands from `input` until it ends or `exit`, saving on every tick.
///
/// The prompt is shown once up front and again after each handled line.
async fn read_commands<R, W>(
    board: &mut Board,
    input: R,
    mut prompt: Option<W>,
    autosave: AutoSave,
    output: OutputOptions,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut ticker = autosave.ticker();
    let mut lines = input.lines();
    show_prompt(prompt.as_mut())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Flow::Exit = handle_line(board, &line, output) {
                    break;
                }
                show_prompt(prompt.as_mut())?;
            }
            _ = ticker.tick() => {
                if let Some(warning) = autosave.run_once(&mut board.store) {
                    eprintln!("warning: {warning}");
                }
            }
        }
    }
    Ok(())
}

fn show_prompt(out: Option<&mut impl Write>) -> Result<()> {
    if let Some(out) = out {
        write!(out, "kanban> ")?;
        out.flush()?;
    }
    Ok(())
}

fn handle_line(board: &mut Board, line: &str, output: OutputOptions) -> Flow {
    let tokens = match split_words(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            let _ = emit_error("shell", &err, output.json);
            return Flow::Continue;
        }
    };
    if tokens.is_empty() {
        return Flow::Continue;
    }

    let parsed = match ShellLine::try_parse_from(tokens) {
        Ok(parsed) => parsed,
        Err(err) => {
            // Help and usage errors both land here.
            let _ = err.print();
            return Flow::Continue;
        }
    };

    match parsed.command {
        ShellCommand::Exit => Flow::Exit,
        ShellCommand::Board(command) => {
            let name = command.name();
            if let Err(err) = execute(board, command, output) {
                let _ = emit_error(name, &err, output.json);
            }
            Flow::Continue
        }
    }
}

/// Split a command line into words.
///
/// Whitespace separates words; single and double quotes group them and a
/// backslash escapes the next character outside single quotes.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => current.push(ch),
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| Error::InvalidArgument("trailing backslash".to_string()))?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), _) => current.push(ch),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, _) if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, _) => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(Error::InvalidArgument("unterminated quote".to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use crate::config::Config;
    use crate::task::TaskStore;

    fn memory_board() -> Board {
        Board {
            store: TaskStore::in_memory(),
            config: Config::default(),
            data_dir: PathBuf::new(),
            pending_warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn prompt_is_not_repeated_by_autosave_ticks() {
        let mut board = memory_board();
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut prompts = Vec::new();
        let output = OutputOptions {
            json: true,
            quiet: true,
        };

        let typing = async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            writer.write_all(b"\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
            writer.write_all(b"exit\n").await.unwrap();
        };
        let commands = read_commands(
            &mut board,
            BufReader::new(reader),
            Some(&mut prompts),
            AutoSave::new(Duration::from_millis(10)),
            output,
        );
        let (result, ()) = tokio::join!(commands, typing);
        result.unwrap();

        assert_eq!(String::from_utf8(prompts).unwrap(), "kanban> kanban> ");
        assert!(board.store.last_saved().is_some());
    }

    #[tokio::test]
    async fn no_prompt_when_not_interactive() {
        let mut board = memory_board();
        let input: &[u8] = b"exit\n";
        let output = OutputOptions {
            json: true,
            quiet: true,
        };

        read_commands(
            &mut board,
            BufReader::new(input),
            None::<Vec<u8>>,
            AutoSave::default(),
            output,
        )
        .await
        .unwrap();
        assert!(board.store.is_empty());
    }

    #[test]
    fn splits_on_whitespace_and_respects_quotes() {
        assert_eq!(
            split_words(r#"add "Fix nav bar" --labels 'bug, ios'  -p high"#).unwrap(),
            vec!["add", "Fix nav bar", "--labels", "bug, ios", "-p", "high"]
        );
        assert_eq!(split_words("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words(r#"add """#).unwrap(), vec!["add", ""]);
        assert_eq!(split_words(r"add It\'s").unwrap(), vec!["add", "It's"]);
    }

    #[test]
    fn rejects_unbalanced_input() {
        assert!(matches!(split_words("add \"open"), Err(Error::InvalidArgument(_))));
        assert!(matches!(split_words("add x\\"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn shell_lines_parse_board_commands() {
        let parsed = ShellLine::try_parse_from(["move", "01abc", "done"]).unwrap();
        assert!(matches!(
            parsed.command,
            ShellCommand::Board(BoardCommand::Move { ref id, ref status }) if id == "01abc" && status == "done"
        ));
        assert!(matches!(
            ShellLine::try_parse_from(["quit"]).unwrap().command,
            ShellCommand::Exit
        ));
        assert!(ShellLine::try_parse_from(["shell"]).is_err());
    }
}
