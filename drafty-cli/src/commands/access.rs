use anyhow::Result;
use clap::Args;
use serde::Serialize;

use drafty_share::{ShareToken, SubjectId, SubjectStatus};

use super::Context;
use crate::output::{AccessVerdict, print_access, print_json};

#[derive(Args)]
pub struct CheckArgs {
    /// Subject (document) id
    pub subject: SubjectId,
    /// Token presented by the viewer
    pub token: String,
    /// Current status of the subject as reported by the host
    #[arg(long, default_value = "draft")]
    pub status: String,
}

#[derive(Serialize)]
struct CheckResult {
    subject: u64,
    granted: bool,
    verdict: AccessVerdict,
}

/// Exit status tells the caller whether to serve the subject
///
/// Only subjects in a shareable status admit share links; a published or
/// trashed subject is denied without consulting the registry.
pub async fn check(args: CheckArgs, ctx: &Context) -> Result<bool> {
    let status: SubjectStatus = args.status.parse()?;
    let verdict = if !status.is_shareable() {
        tracing::debug!(
            subject = %args.subject,
            status = %args.status,
            "Status admits no share links"
        );
        AccessVerdict::StatusNotShareable
    } else {
        // A malformed token cannot match any grant
        let granted = match ShareToken::parse(&args.token) {
            Ok(token) => ctx.registry.share_exists(args.subject, &token).await?,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected presented token");
                false
            }
        };
        if granted {
            AccessVerdict::Granted
        } else {
            AccessVerdict::NoActiveShare
        }
    };

    if ctx.json_output {
        print_json(&CheckResult {
            subject: args.subject.0,
            granted: verdict.is_granted(),
            verdict,
        })?;
    } else {
        print_access(args.subject, verdict);
    }

    Ok(verdict.is_granted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StoreConfig};
    use drafty_share::PrincipalId;

    async fn memory_context() -> Context {
        let config = Config {
            store: StoreConfig {
                backend: "memory".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(&config, None, false, true).await.unwrap()
    }

    fn args(subject: u64, token: &str, status: &str) -> CheckArgs {
        CheckArgs {
            subject: SubjectId(subject),
            token: token.into(),
            status: status.into(),
        }
    }

    #[tokio::test]
    async fn test_check_grants_and_denies() {
        let ctx = memory_context().await;
        let token = ctx
            .registry
            .create_share(PrincipalId(1), SubjectId(2), 600)
            .await
            .unwrap();

        assert!(check(args(2, token.as_str(), "draft"), &ctx).await.unwrap());
        assert!(check(args(2, token.as_str(), "pending"), &ctx).await.unwrap());
        assert!(!check(args(3, token.as_str(), "draft"), &ctx).await.unwrap());
        assert!(!check(args(2, "../etc", "draft"), &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_denies_valid_token_on_unshareable_status() {
        let ctx = memory_context().await;
        let token = ctx
            .registry
            .create_share(PrincipalId(1), SubjectId(2), 600)
            .await
            .unwrap();

        for status in ["trash", "publish", "private"] {
            assert!(
                !check(args(2, token.as_str(), status), &ctx).await.unwrap(),
                "{status}"
            );
        }
        // The grant itself is untouched
        assert!(ctx.registry.share_exists(SubjectId(2), &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_rejects_unknown_status() {
        let ctx = memory_context().await;
        let result = check(args(2, "abcdefgh1234", "inherit"), &ctx).await;
        assert!(result.is_err());
    }
}
