use colored::Colorize;
use serde_json::json;
use transit_auth::{
    token_status, AuthCheck, AuthConfig, AuthenticationGuard, GuardDecision, PermissionGuard,
    Resolver, SystemClock,
};

use super::read_token;
use crate::cli::TokenSource;
use crate::error::Result;

/// Dry-run the guard chain: authentication first, then permissions.
///
/// Nothing is cleared or navigated; the decision is only reported.
pub fn handle_guard_command(
    source: TokenSource,
    permission: Option<String>,
    any_permission: Option<Vec<String>>,
    fallback_path: Option<String>,
    config: &AuthConfig,
    json_output: bool,
) -> Result<()> {
    let token = read_token(&source)?;
    let status = token_status(token.as_deref(), &SystemClock);

    let guard = PermissionGuard {
        permission,
        any_permission,
        fallback_path,
    };

    let (stage, decision) = match AuthenticationGuard::decide(&status, config) {
        GuardDecision::Render => {
            let check = AuthCheck::from_status(
                &status,
                config.guard_check_kind,
                &Resolver::from_config(config),
            );
            ("permission", guard.decide(&check, config))
        }
        redirect => ("authentication", redirect),
    };

    if json_output {
        let output = match &decision {
            GuardDecision::Render => json!({ "decision": "render" }),
            GuardDecision::Redirect(r) => json!({
                "decision": "redirect",
                "stage": stage,
                "path": r.path,
                "clear_session": r.clear_session,
                "notice": r.notice,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &decision {
        GuardDecision::Render => println!("{} Route renders", "✓".green()),
        GuardDecision::Redirect(r) => {
            println!(
                "{} Redirect to {} ({stage} guard)",
                "→".yellow(),
                r.path.bright_cyan()
            );
            if r.clear_session {
                println!("  Session would be cleared");
            }
            if let Some(notice) = &r.notice {
                println!("  Notice [{}]: {}", notice.kind, notice.message);
            }
        }
    }
    Ok(())
}
