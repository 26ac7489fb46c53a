mod guard;
mod token;

pub use guard::handle_guard_command;
pub use token::{handle_check_command, handle_inspect_command};

use crate::cli::TokenSource;
use crate::error::{CliError, Result};
use std::fs;
use std::io::{self, IsTerminal, Read};

/// Token from `--token`, `--token-file`, or piped stdin, in that order.
///
/// Returns `None` when nothing was supplied.
pub(crate) fn read_token(source: &TokenSource) -> Result<Option<String>> {
    let raw = if let Some(token) = &source.token {
        Some(token.clone())
    } else if let Some(path) = &source.token_file {
        Some(fs::read_to_string(path)?)
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else {
        None
    };

    Ok(raw
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

pub(crate) fn require_token(source: &TokenSource) -> Result<String> {
    read_token(source)?.ok_or_else(|| {
        CliError::InvalidInput(
            "No token provided. Use --token, --token-file or pipe a token to stdin".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flag_token_is_trimmed() {
        let source = TokenSource {
            token: Some("  a.b.c\n".into()),
            token_file: None,
        };
        assert_eq!(read_token(&source).unwrap().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let source = TokenSource {
            token: Some("   ".into()),
            token_file: None,
        };
        assert!(read_token(&source).unwrap().is_none());
        assert!(matches!(
            require_token(&source),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_token_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x.y.z").unwrap();
        let source = TokenSource {
            token: None,
            token_file: Some(file.path().to_path_buf()),
        };
        assert_eq!(read_token(&source).unwrap().as_deref(), Some("x.y.z"));
    }
}
