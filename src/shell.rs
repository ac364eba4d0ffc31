//! Interactive line-oriented form.
//!
//! Each input line is one event: editing a draft field, submitting, or acting
//! on a card. Parsing is kept separate from execution so it can be tested
//! without a manager.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::client::ClientError;
use crate::manager::TodoManager;
use crate::presentation::{render, CardView};

pub const HELP: &str = "\
Draft:   topic <text> | name <text> | url <text> | detail <text> | more <text>
Form:    submit | reset | draft
Cards:   list | done <id> | delete <id> | expand <id> | reload
Other:   help | quit";

/// One shell event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Topic(String),
    Name(String),
    Url(String),
    Detail(String),
    /// Append a line to the draft detail.
    More(String),
    Submit,
    Reset,
    ShowDraft,
    List,
    Done(i64),
    Delete(i64),
    Expand(i64),
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("{0} expects a card id")]
    MissingId(String),

    #[error("{command} expects a numeric card id, got {value:?}")]
    InvalidId { command: String, value: String },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        // `raw` keeps everything after the separating space; only `url`
        // uses it untrimmed.
        let line = line.trim_start();
        let (word, raw) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = raw.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "topic" => Self::Topic(rest.to_string()),
            "name" => Self::Name(rest.to_string()),
            "url" => Self::Url(raw.to_string()),
            "detail" => Self::Detail(rest.replace("\\n", "\n")),
            "more" => Self::More(rest.to_string()),
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "draft" => Self::ShowDraft,
            "list" | "ls" => Self::List,
            "done" | "undo" => Self::Done(parse_id(word, rest)?),
            "delete" | "rm" => Self::Delete(parse_id(word, rest)?),
            "expand" | "collapse" => Self::Expand(parse_id(word, rest)?),
            "reload" => Self::Reload,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(ParseError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}

fn parse_id(command: &str, value: &str) -> Result<i64, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingId(command.to_string()));
    }
    value.parse().map_err(|_| ParseError::InvalidId {
        command: command.to_string(),
        value: value.to_string(),
    })
}

/// Apply one command and describe the result.
pub async fn execute(manager: &TodoManager, command: Command) -> Result<String, ClientError> {
    let message = match command {
        Command::Topic(value) => {
            manager.with_draft(|d| d.set_topic(value));
            "topic set".to_string()
        }
        Command::Name(value) => {
            manager.with_draft(|d| d.set_name(value));
            "name set".to_string()
        }
        Command::Url(value) => manager.with_draft(|d| {
            d.set_url(value);
            d.url_helper_text().to_string()
        }),
        Command::Detail(value) => {
            manager.with_draft(|d| d.set_detail(value));
            "detail set".to_string()
        }
        Command::More(line) => {
            manager.with_draft(|d| {
                let detail = if d.detail().is_empty() {
                    line
                } else {
                    format!("{}\n{}", d.detail(), line)
                };
                d.set_detail(detail);
            });
            "detail extended".to_string()
        }
        Command::Submit => match manager.submit().await? {
            Some(todo) => {
                let expanded = manager.is_expanded(todo.id);
                render(&CardView::derive(&todo, expanded))
            }
            None => blocked_reason(manager),
        },
        Command::Reset => {
            manager.reset_draft();
            "draft cleared".to_string()
        }
        Command::ShowDraft => {
            let draft = manager.draft();
            format!(
                "topic:  {}\nname:   {}\nurl:    {}  ({})\ndetail: {}\nsubmit: {}",
                draft.topic(),
                draft.name(),
                draft.url(),
                draft.url_helper_text(),
                draft.detail().replace('\n', "\n        "),
                if draft.can_submit() { "enabled" } else { "disabled" },
            )
        }
        Command::List => {
            let cards = manager.cards();
            if cards.is_empty() {
                "no cards".to_string()
            } else {
                cards.iter().map(render).collect::<Vec<_>>().join("\n\n")
            }
        }
        Command::Done(id) => match manager.toggle_done(id).await? {
            Some(todo) if todo.done => format!("card {} done", id),
            Some(_) => format!("card {} pending", id),
            None => format!("card {} unchanged", id),
        },
        Command::Delete(id) => {
            if manager.delete(id).await? {
                format!("card {} deleted", id)
            } else {
                format!("card {} unchanged", id)
            }
        }
        Command::Expand(id) => {
            let label = if manager.toggle_expanded(id) {
                "expanded"
            } else {
                "collapsed"
            };
            format!("card {} {}", id, label)
        }
        Command::Reload => {
            manager.load().await?;
            format!("{} cards loaded", manager.len())
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(message)
}

fn blocked_reason(manager: &TodoManager) -> String {
    let draft = manager.draft();
    if draft.url_error() {
        format!("submit blocked: {}", draft.url_helper_text())
    } else {
        "submit blocked: topic, name and url are required".to_string()
    }
}

/// Read commands from `input` until EOF or `quit`.
pub async fn run<R>(manager: &TodoManager, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!("{}", HELP);

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => match execute(manager, command).await {
                Ok(message) => println!("{}", message),
                Err(e) => println!("error: {}", e),
            },
            Err(ParseError::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}
