//! Terminal rendering for drafty commands
//!
//! `--json` output goes to stdout untouched so hosts can parse it. Human
//! output prefixes each line with a coloured mark; refusals go to stderr.

use std::fmt::Display;
use std::io::Write;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use drafty_share::{ShareGrant, ShareToken, SubjectId, UnixSeconds, describe_expiry};

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, data)?;
    writeln!(out)?;
    Ok(())
}

/// Leading mark of a human-readable line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Refused,
    Note,
}

impl Mark {
    fn symbol(self) -> ColoredString {
        match self {
            Mark::Done => "✓".green(),
            Mark::Refused => "✗".red(),
            Mark::Note => "ℹ".blue(),
        }
    }
}

pub fn print_line(mark: Mark, message: impl Display) {
    match mark {
        Mark::Refused => eprintln!("{} {message}", mark.symbol()),
        _ => println!("{} {message}", mark.symbol()),
    }
}

/// Why `check` let a viewer in or kept them out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessVerdict {
    Granted,
    /// The subject's status never admits share links
    StatusNotShareable,
    /// Unknown, lapsed, foreign or malformed token
    NoActiveShare,
}

impl AccessVerdict {
    pub fn is_granted(self) -> bool {
        self == AccessVerdict::Granted
    }
}

pub fn access_message(subject: SubjectId, verdict: AccessVerdict) -> String {
    match verdict {
        AccessVerdict::Granted => format!("Access granted to subject {subject}"),
        AccessVerdict::StatusNotShareable => {
            format!("Access denied to subject {subject}: status is not shareable")
        }
        AccessVerdict::NoActiveShare => format!("Access denied to subject {subject}"),
    }
}

pub fn print_access(subject: SubjectId, verdict: AccessVerdict) {
    let mark = if verdict.is_granted() {
        Mark::Done
    } else {
        Mark::Refused
    };
    print_line(mark, access_message(subject, verdict));
}

pub fn print_token(token: &ShareToken) {
    println!("  {}: {}", "Token".dimmed(), token);
}

/// One listing row: token, owner, and expiry coloured by activity
pub fn grant_row(grant: &ShareGrant, now: UnixSeconds) -> String {
    let expires = describe_expiry(grant.expires_at, now);
    let expires = if grant.is_active(now) {
        expires.green()
    } else {
        expires.red()
    };
    format!("{}  {} {}  {}", grant.token, "owner".dimmed(), grant.owner, expires)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafty_share::PrincipalId;

    #[test]
    fn test_access_messages() {
        assert_eq!(
            access_message(SubjectId(4), AccessVerdict::Granted),
            "Access granted to subject 4"
        );
        assert!(
            access_message(SubjectId(4), AccessVerdict::StatusNotShareable)
                .ends_with("status is not shareable")
        );
        assert!(!AccessVerdict::NoActiveShare.is_granted());
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        let json = serde_json::to_string(&AccessVerdict::StatusNotShareable).unwrap();
        assert_eq!(json, "\"status_not_shareable\"");
    }

    #[test]
    fn test_grant_row() {
        colored::control::set_override(false);
        let grant = ShareGrant {
            token: ShareToken::parse("abcdefgh1234").unwrap(),
            owner: PrincipalId(3),
            subject: SubjectId(4),
            expires_at: 1_000 + 7_200,
        };
        assert_eq!(grant_row(&grant, 1_000), "abcdefgh1234  owner 3  In 2 hours.");
        assert_eq!(grant_row(&grant, 9_000), "abcdefgh1234  owner 3  Expired.");
    }
}
