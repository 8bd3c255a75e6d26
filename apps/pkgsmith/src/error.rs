//! CLI error reporting

use pkgsmith_errors::{Error, UserFacingError};

/// Format an error as the single-line `ERROR: <message>: <detail>`
/// report the CLI exits with.
pub fn format_error(err: &Error) -> String {
    let message = err.user_message();
    match err.user_detail() {
        Some(detail) => format!("ERROR: {message}: {detail}"),
        None => format!("ERROR: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgsmith_errors::{AttemptedSources, SourceError};

    #[test]
    fn errors_render_as_one_line_with_detail() {
        let err: Error = SourceError::SourceNotFound {
            name: "ghost".to_string(),
            attempted: AttemptedSources::Both,
        }
        .into();
        assert_eq!(
            format_error(&err),
            "ERROR: source for ghost not found: local, aur"
        );
    }

    #[test]
    fn errors_without_detail_omit_the_second_colon() {
        let err = Error::internal("unexpected state");
        assert_eq!(
            format_error(&err),
            "ERROR: internal error: unexpected state"
        );
    }
}
