use chrono::{TimeZone, Utc};
use colored::Colorize;
use serde_json::json;
use transit_auth::{
    decode_claims, expiry_seconds, token_status, AuthCheck, AuthConfig, ClaimKind, DecodedClaims,
    Resolver, SystemClock, TokenStatus,
};

use super::{read_token, require_token};
use crate::cli::{KindArg, TokenSource};
use crate::error::{CliError, Result};

fn status_label(status: &TokenStatus) -> &'static str {
    match status {
        TokenStatus::Absent => "absent",
        TokenStatus::Malformed => "malformed",
        TokenStatus::Expired(_) => "expired",
        TokenStatus::Valid(_) => "valid",
    }
}

fn format_timestamp(secs: Option<i64>) -> String {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "(not set)".to_string())
}

pub fn handle_inspect_command(
    source: TokenSource,
    config: &AuthConfig,
    json_output: bool,
) -> Result<()> {
    let token = require_token(&source)?;
    // surface the decode error instead of a bare "malformed"
    let claims = decode_claims(&token)?;
    let status = token_status(Some(&token), &SystemClock);

    let resolver = Resolver::from_config(config);
    let roles = resolver.resolve(&claims, ClaimKind::Role);
    let permissions = resolver.resolve(&claims, ClaimKind::Permission);
    let expires_at = expiry_seconds(&claims);

    if json_output {
        let output = json!({
            "status": status_label(&status),
            "subject": claims.subject,
            "email": claims.email,
            "name": claims.name,
            "issuer": claims.issuer,
            "issued_at": claims.issued_at,
            "expires_at": expires_at,
            "roles": roles.entries,
            "permissions": permissions.entries,
            "all_powerful": roles.all_powerful || permissions.all_powerful,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let label = match &status {
        TokenStatus::Valid(_) => "valid".green().bold(),
        other => status_label(other).red().bold(),
    };
    println!("Token is {label}");
    print_claims(&claims, expires_at);
    println!("  Roles: {}", join_or_none(&roles.entries));
    println!("  Permissions: {}", join_or_none(&permissions.entries));
    if permissions.all_powerful {
        println!("  {}", "Wildcard grant: every check passes".bright_yellow());
    }
    Ok(())
}

fn print_claims(claims: &DecodedClaims, expires_at: Option<i64>) {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
    println!("  Subject: {}", text(&claims.subject).bright_cyan());
    println!("  Email: {}", text(&claims.email));
    println!("  Name: {}", text(&claims.name));
    println!("  Issuer: {}", text(&claims.issuer));
    println!("  Issued: {}", format_timestamp(claims.issued_at));
    println!("  Expires: {}", format_timestamp(expires_at));
}

fn join_or_none<'a>(entries: impl IntoIterator<Item = &'a String>) -> String {
    let joined = entries
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

pub fn handle_check_command(
    source: TokenSource,
    kind: KindArg,
    item: Option<String>,
    any: Vec<String>,
    all: Vec<String>,
    config: &AuthConfig,
    json_output: bool,
) -> Result<()> {
    if item.is_none() && any.is_empty() && all.is_empty() {
        return Err(CliError::InvalidInput(
            "Nothing to check. Give an item, --any or --all".into(),
        ));
    }

    let token = read_token(&source)?;
    let kind = ClaimKind::from(kind);
    let status = token_status(token.as_deref(), &SystemClock);
    let check = AuthCheck::from_status(&status, kind, &Resolver::from_config(config));

    let mut verdicts = Vec::new();
    if let Some(item) = &item {
        verdicts.push(("check", item.clone(), check.check(item)));
    }
    if !any.is_empty() {
        verdicts.push(("check_any", any.join(","), check.check_any(any.as_slice())));
    }
    if !all.is_empty() {
        verdicts.push(("check_all", all.join(","), check.check_all(all.as_slice())));
    }
    let granted = verdicts.iter().all(|(_, _, ok)| *ok);

    if json_output {
        let results: Vec<_> = verdicts
            .iter()
            .map(|(op, items, ok)| json!({ "operation": op, "items": items, "granted": ok }))
            .collect();
        let output = json!({
            "token": status_label(&status),
            "kind": kind,
            "granted": granted,
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Token is {} ({kind} checks)", status_label(&status));
        for (op, items, ok) in &verdicts {
            let mark = if *ok { "✓".green() } else { "✗".red() };
            println!("  {mark} {op}({items})");
        }
    }

    if granted {
        Ok(())
    } else {
        Err(CliError::Denied(format!("{kind} check failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(None), "(not set)");
        assert_eq!(format_timestamp(Some(0)), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_join_or_none() {
        let empty: BTreeSet<String> = BTreeSet::new();
        assert_eq!(join_or_none(&empty), "(none)");
        let entries: BTreeSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_or_none(&entries), "a, b");
    }

    #[test]
    fn test_check_requires_something_to_check() {
        let source = TokenSource {
            token: Some("a.b.c".into()),
            token_file: None,
        };
        let result = handle_check_command(
            source,
            KindArg::Permission,
            None,
            Vec::new(),
            Vec::new(),
            &AuthConfig::default(),
            true,
        );
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_check_without_token_is_denied() {
        let source = TokenSource {
            token: Some(" ".into()),
            token_file: None,
        };
        let result = handle_check_command(
            source,
            KindArg::Permission,
            Some("fare:edit".into()),
            Vec::new(),
            Vec::new(),
            &AuthConfig::default(),
            true,
        );
        assert!(matches!(result, Err(CliError::Denied(_))));
    }
}
