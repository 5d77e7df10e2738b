//! Subcommand implementations. Each writes its report to `out`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aau_core::DebugFlags;
use aau_heartbeat::{HeartbeatDispatcher, resolve_endpoint};
use aau_settings::{ConfigSnapshot, TriState, load_snapshot};
use aau_tokens::registry::home_dir;
use aau_tokens::{
    AnonUsageContext, ApiKeyIdentity, ApiKeyLocations, RegistryConfig, TokenGenerator, TokenKind,
    TokenRegistry, provision_system_token, random_token, redact,
};
use anyhow::{Context, Result};

/// Time given to a heartbeat the user is not waiting for.
const NO_WAIT_GRACE: Duration = Duration::from_millis(100);

/// Options for `aau tokens`.
#[derive(Debug, Default)]
pub struct TokensArgs {
    pub prefix: Option<PathBuf>,
    pub disabled: bool,
    pub host_agent: String,
    pub redact: bool,
}

/// Options for `aau heartbeat`.
#[derive(Debug, Default)]
pub struct HeartbeatArgs {
    pub channel: Option<String>,
    pub path: Option<String>,
    pub dry_run: bool,
    pub wait: bool,
}

pub fn random(out: &mut impl Write) -> Result<()> {
    let token = random_token().context("failed to generate token")?;
    writeln!(out, "{token}")?;
    Ok(())
}

pub fn tokens(out: &mut impl Write, settings: &Path, flags: DebugFlags, args: &TokensArgs) -> Result<()> {
    let mut snapshot = load_snapshot(settings);
    if args.disabled {
        snapshot.anon_usage = TriState::Disabled;
    }
    let context = build_context(&home_dir(), snapshot, flags, args.prefix.clone())?;
    write_tokens(out, &context, args)
}

fn write_tokens(out: &mut impl Write, context: &AnonUsageContext, args: &TokensArgs) -> Result<()> {
    let agent = context.user_agent(&args.host_agent);
    let agent = if args.redact { redact(&agent) } else { agent };
    writeln!(out, "{agent}")?;
    Ok(())
}

pub fn heartbeat(
    out: &mut impl Write,
    settings: &Path,
    flags: DebugFlags,
    args: &HeartbeatArgs,
) -> Result<()> {
    let snapshot = load_snapshot(settings);
    let context = build_context(&home_dir(), snapshot, flags, None)?;
    send_heartbeat(out, &context, args)
}

fn send_heartbeat(out: &mut impl Write, context: &AnonUsageContext, args: &HeartbeatArgs) -> Result<()> {
    let snapshot = context.snapshot();
    let Some(url) = resolve_endpoint(snapshot, args.channel.as_deref(), args.path.as_deref()) else {
        writeln!(out, "no valid heartbeat channel")?;
        return Ok(());
    };
    writeln!(out, "heartbeat url: {url}")?;

    let mut dispatcher = HeartbeatDispatcher::from_env(snapshot.heartbeat_timeout);
    if args.dry_run {
        dispatcher = dispatcher.with_dry_run(true);
    }
    let handle = dispatcher.fire(&url, context.suffix_str());
    let limit = if args.wait {
        snapshot.heartbeat_timeout + Duration::from_secs(1)
    } else {
        NO_WAIT_GRACE
    };
    let finished = handle.join_within(limit);
    tracing::debug!(finished, "heartbeat join");
    Ok(())
}

pub fn provision(out: &mut impl Write, kind: TokenKind, dir: &Path) -> Result<()> {
    let (path, value) = provision_system_token(dir, kind, &TokenGenerator::default())
        .with_context(|| format!("failed to provision {kind} token in {}", dir.display()))?;
    writeln!(out, "{kind} token {value} written to {}", path.display())?;
    Ok(())
}

fn build_context(
    home: &Path,
    snapshot: ConfigSnapshot,
    flags: DebugFlags,
    prefix: Option<PathBuf>,
) -> Result<AnonUsageContext> {
    let mut config = RegistryConfig::from_env(home);
    if let Some(prefix) = prefix {
        config = config.with_prefix(prefix);
    }
    let registry = TokenRegistry::new(
        config,
        TokenGenerator::default(),
        Arc::new(ApiKeyIdentity::new(ApiKeyLocations::from_env(home))),
        flags,
    );
    AnonUsageContext::initialize(snapshot, registry).context("failed to resolve tokens")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
