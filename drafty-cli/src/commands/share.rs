use anyhow::Result;
use clap::Args;
use serde::Serialize;

use drafty_share::{
    ShareDuration, ShareGrant, ShareToken, SubjectId, SubjectStatus, UnixSeconds,
    describe_expiry,
};

use super::Context;
use crate::output::{Mark, grant_row, print_json, print_line, print_token};

#[derive(Args)]
pub struct CreateArgs {
    /// Subject (document) id
    pub subject: SubjectId,
    /// How long the link stays valid, e.g. 90, 30m, 2h, 3d
    #[arg(long = "for", default_value = "2h")]
    pub duration: ShareDuration,
    /// Current status of the subject as reported by the host
    #[arg(long, default_value = "draft")]
    pub status: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Subject (document) id
    pub subject: SubjectId,
    /// Hide shares that have already lapsed
    #[arg(long)]
    pub active: bool,
}

#[derive(Args)]
pub struct ExtendArgs {
    pub subject: SubjectId,
    pub token: ShareToken,
    /// Extra time, e.g. 30m, 2h, 1d
    #[arg(long, default_value = "2h")]
    pub by: ShareDuration,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub subject: SubjectId,
    pub token: ShareToken,
}

#[derive(Args)]
pub struct SetExpiryArgs {
    pub subject: SubjectId,
    pub token: ShareToken,
    /// New absolute expiry, Unix seconds
    #[arg(allow_negative_numbers = true)]
    pub expires_at: UnixSeconds,
}

#[derive(Serialize)]
struct GrantView {
    token: String,
    owner: u64,
    subject: u64,
    expires_at: UnixSeconds,
    expires_at_utc: Option<String>,
    active: bool,
    expires: String,
}

impl GrantView {
    fn new(grant: &ShareGrant, now: UnixSeconds) -> Self {
        Self {
            token: grant.token.to_string(),
            owner: grant.owner.0,
            subject: grant.subject.0,
            expires_at: grant.expires_at,
            expires_at_utc: utc(grant.expires_at),
            active: grant.is_active(now),
            expires: describe_expiry(grant.expires_at, now),
        }
    }
}

fn utc(ts: UnixSeconds) -> Option<String> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339())
}

#[derive(Serialize)]
struct MutationResult<'a> {
    action: &'a str,
    subject: u64,
    token: &'a str,
    ok: bool,
}

pub async fn create(args: CreateArgs, ctx: &Context) -> Result<bool> {
    let owner = ctx.require_user()?;
    let status: SubjectStatus = args.status.parse()?;
    if !status.is_shareable() {
        print_line(
            Mark::Refused,
            format!(
                "Subject {} cannot be shared while its status is '{}'",
                args.subject, args.status
            ),
        );
        return Ok(false);
    }
    let duration = args.duration;

    let token = ctx
        .registry
        .create_share(owner, args.subject, duration.as_secs())
        .await?;

    if ctx.json_output {
        let grant = ctx.registry.get_share(args.subject, &token).await?;
        let view = grant.map(|g| GrantView::new(&g, ctx.registry.now()));
        print_json(&view)?;
    } else {
        print_line(
            Mark::Done,
            format!("Shared subject {} for {duration}", args.subject),
        );
        print_token(&token);
    }

    Ok(true)
}

pub async fn list(args: ListArgs, ctx: &Context) -> Result<bool> {
    let requester = ctx.requester()?;
    let grants = if args.active {
        ctx.registry.list_active_shares(&requester, args.subject).await?
    } else {
        ctx.registry.list_visible_shares(&requester, args.subject).await?
    };

    let now = ctx.registry.now();
    if ctx.json_output {
        let views: Vec<GrantView> = grants.iter().map(|g| GrantView::new(g, now)).collect();
        print_json(&views)?;
        return Ok(true);
    }

    if grants.is_empty() {
        print_line(Mark::Note, format!("No shares on subject {}", args.subject));
        return Ok(true);
    }

    for grant in &grants {
        println!("{}", grant_row(grant, now));
    }

    Ok(true)
}

pub async fn extend(args: ExtendArgs, ctx: &Context) -> Result<bool> {
    let requester = ctx.requester()?;
    let ok = ctx
        .registry
        .extend_share(&requester, args.subject, &args.token, args.by.as_secs())
        .await?;

    report(ctx, "extend", args.subject, &args.token, ok, "extended", || {
        format!("Share extended by {}", args.by)
    })?;
    Ok(ok)
}

pub async fn delete(args: DeleteArgs, ctx: &Context) -> Result<bool> {
    let requester = ctx.requester()?;
    let ok = ctx
        .registry
        .delete_share(&requester, args.subject, &args.token)
        .await?;

    report(ctx, "delete", args.subject, &args.token, ok, "deleted", || {
        "Share deleted".to_string()
    })?;
    Ok(ok)
}

pub async fn set_expiry(args: SetExpiryArgs, ctx: &Context) -> Result<bool> {
    if !ctx.privileged {
        anyhow::bail!("set-expiry requires --privileged");
    }
    let ok = ctx
        .registry
        .set_expiry(args.subject, &args.token, args.expires_at)
        .await?;

    report(ctx, "set-expiry", args.subject, &args.token, ok, "updated", || {
        format!(
            "Share now expires {}",
            describe_expiry(args.expires_at, ctx.registry.now())
        )
    })?;
    Ok(ok)
}

fn report(
    ctx: &Context,
    action: &str,
    subject: SubjectId,
    token: &ShareToken,
    ok: bool,
    verb: &str,
    success: impl FnOnce() -> String,
) -> Result<()> {
    if ctx.json_output {
        print_json(&MutationResult {
            action,
            subject: subject.0,
            token: token.as_str(),
            ok,
        })?;
    } else if ok {
        print_line(Mark::Done, success());
    } else {
        // Missing and not-yours look the same
        print_line(Mark::Refused, format!("Share could not be {verb}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafty_share::PrincipalId;

    #[test]
    fn test_grant_view() {
        let grant = ShareGrant {
            token: ShareToken::parse("abcdefgh").unwrap(),
            owner: PrincipalId(1),
            subject: SubjectId(2),
            expires_at: 1_700_003_600,
        };
        let view = GrantView::new(&grant, 1_700_000_000);
        assert!(view.active);
        assert_eq!(view.expires, "In 1 hour.");
        assert_eq!(view.expires_at_utc.as_deref(), Some("2023-11-14T23:13:20+00:00"));

        let lapsed = GrantView::new(&grant, 1_800_000_000);
        assert!(!lapsed.active);
        assert_eq!(lapsed.expires, "Expired.");
    }

    async fn context(user: u64, privileged: bool) -> Context {
        let config = crate::config::Config {
            store: crate::config::StoreConfig {
                backend: "memory".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(&config, Some(PrincipalId(user)), privileged, true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_refuses_published_subject() {
        let ctx = context(1, false).await;
        let args = CreateArgs {
            subject: SubjectId(2),
            duration: ShareDuration::default(),
            status: "publish".into(),
        };
        assert!(!create(args, &ctx).await.unwrap());

        let listed = ctx
            .registry
            .list_visible_shares(&ctx.requester().unwrap(), SubjectId(2))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_extend_delete() {
        let ctx = context(1, false).await;
        let args = CreateArgs {
            subject: SubjectId(2),
            duration: "30m".parse().unwrap(),
            status: "draft".into(),
        };
        assert!(create(args, &ctx).await.unwrap());

        let grants = ctx
            .registry
            .list_visible_shares(&ctx.requester().unwrap(), SubjectId(2))
            .await
            .unwrap();
        assert_eq!(grants.len(), 1);
        let token = grants[0].token.clone();

        let extend_args = ExtendArgs {
            subject: SubjectId(2),
            token: token.clone(),
            by: "1h".parse().unwrap(),
        };
        assert!(extend(extend_args, &ctx).await.unwrap());

        let delete_args = DeleteArgs {
            subject: SubjectId(2),
            token: token.clone(),
        };
        assert!(delete(delete_args, &ctx).await.unwrap());

        let again = DeleteArgs {
            subject: SubjectId(2),
            token,
        };
        assert!(!delete(again, &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_expiry_needs_privilege() {
        let ctx = context(1, false).await;
        let args = SetExpiryArgs {
            subject: SubjectId(2),
            token: ShareToken::parse("abcdefgh").unwrap(),
            expires_at: 0,
        };
        assert!(set_expiry(args, &ctx).await.is_err());
    }
}
