//! Console command grammar.

use rb_core::validator::{parse_rating, RatingError};
use rb_core::{Credentials, NewPost, PostId};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  refresh                                   reload session and posts
  posts                                     show posts, ratings and your drafts
  rate <post> <1-5>                         set your draft rating (omit value to clear)
  comment <post> <text>                     set your draft comment
  submit <post>                             save your review
  login <user> <pass>
  register <user> <pass>
  logout
  create <title> | <description> | <location>
  help
  quit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Refresh,
    Posts,
    Rate(PostId, Option<i64>),
    Comment(PostId, String),
    Submit(PostId),
    Login(Credentials),
    Register(Credentials),
    Logout,
    Create(NewPost),
    Help,
    Quit,
    Nothing,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a post id")]
    BadPostId(String),

    #[error(transparent)]
    Rating(#[from] RatingError),
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Ok(Command::Nothing),
        "refresh" => Ok(Command::Refresh),
        "posts" => Ok(Command::Posts),
        "rate" => {
            let (post, value) = post_and_rest(rest, "rate <post> <1-5>")?;
            Ok(Command::Rate(post, parse_rating(value)?))
        }
        "comment" => {
            let (post, text) = post_and_rest(rest, "comment <post> <text>")?;
            Ok(Command::Comment(post, text.to_string()))
        }
        "submit" => Ok(Command::Submit(post_id(rest, "submit <post>")?)),
        "login" => Ok(Command::Login(credentials(rest, "login <user> <pass>")?)),
        "register" => Ok(Command::Register(credentials(rest, "register <user> <pass>")?)),
        "logout" => Ok(Command::Logout),
        "create" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let title = parts.next().unwrap_or_default();
            if title.is_empty() {
                return Err(CommandError::Usage("create <title> | <description> | <location>"));
            }
            Ok(Command::Create(NewPost {
                title: title.to_string(),
                description: parts.next().unwrap_or_default().to_string(),
                location: parts.next().unwrap_or_default().to_string(),
            }))
        }
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn post_id(token: &str, usage: &'static str) -> Result<PostId, CommandError> {
    if token.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    token
        .parse()
        .map_err(|_| CommandError::BadPostId(token.to_string()))
}

fn post_and_rest<'a>(
    rest: &'a str,
    usage: &'static str,
) -> Result<(PostId, &'a str), CommandError> {
    let (post, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Ok((post_id(post, usage)?, tail.trim()))
}

fn credentials(rest: &str, usage: &'static str) -> Result<Credentials, CommandError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(username), Some(password)) => Ok(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }),
        _ => Err(CommandError::Usage(usage)),
    }
}
