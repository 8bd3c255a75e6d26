//! Integration tests for the AUR client

use pkgsmith_aur::{AurClient, AurInfo, AurPackage};

#[test]
fn client_builds_against_custom_endpoint() {
    assert!(AurClient::new("https://aur.example.org", None).is_ok());
}

#[test]
fn package_urls_follow_the_rpc_contract() {
    let info = AurInfo {
        name: "ripgrep-git".to_string(),
        version: "14.1.0.r12.gdeadbee-1".to_string(),
        url_path: "/cgit/aur.git/snapshot/ripgrep-git.tar.gz".to_string(),
    };

    let package = AurPackage::from_info("https://aur.archlinux.org", &info);
    assert_eq!(
        package.snapshot_url,
        "https://aur.archlinux.org/cgit/aur.git/snapshot/ripgrep-git.tar.gz"
    );
    assert_eq!(package.git_url, "https://aur.archlinux.org/ripgrep-git.git");
    assert_eq!(package.version, "14.1.0.r12.gdeadbee-1");
}
