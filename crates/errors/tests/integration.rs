//! Integration tests for error types

use pkgsmith_errors::{
    AttemptedSources, AurError, Error, SourceError, UserFacingError,
};

#[test]
fn source_not_found_carries_attempted_kinds() {
    let err = SourceError::SourceNotFound {
        name: "ripgrep".to_string(),
        attempted: AttemptedSources::Aur,
    };

    assert_eq!(err.user_message(), "source for ripgrep not found");
    assert_eq!(err.user_detail().as_deref(), Some("aur"));
}

#[test]
fn provider_not_found_reports_restrictions() {
    let err = SourceError::ProviderNotFound {
        name: "linux-ck".to_string(),
        restrictions: vec![">=5.0".to_string(), "<6.0".to_string()],
    };

    assert_eq!(err.user_detail().as_deref(), Some(">=5.0, <6.0"));

    let unrestricted = SourceError::ProviderNotFound {
        name: "linux-ck".to_string(),
        restrictions: vec![],
    };
    assert_eq!(
        unrestricted.user_detail().as_deref(),
        Some("no version restrictions")
    );
}

#[test]
fn top_level_error_delegates_user_facing_fields() {
    let err: Error = SourceError::NoPkgbuild {
        directory: "/tmp/pkgbuilds/foo".to_string(),
    }
    .into();

    assert_eq!(
        err.user_message(),
        "directory does not contain a PKGBUILD file"
    );
    assert_eq!(err.user_detail().as_deref(), Some("/tmp/pkgbuilds/foo"));
    assert!(err.user_hint().is_some());
}

#[test]
fn io_errors_preserve_kind_and_path() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = Error::io_with_path(&io, "/var/cache/pkgsmith/build.json");

    match err {
        Error::Io { kind, path, .. } => {
            assert_eq!(kind, std::io::ErrorKind::NotFound);
            assert!(path.is_some());
        }
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn aur_errors_split_message_and_detail() {
    let err = AurError::CloneFailed {
        url: "https://aur.archlinux.org/foo.git".to_string(),
        message: "exit status 128".to_string(),
    };

    assert_eq!(
        err.user_message(),
        "git clone failed for https://aur.archlinux.org/foo.git"
    );
    assert_eq!(err.user_detail().as_deref(), Some("exit status 128"));
}
