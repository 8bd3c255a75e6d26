//! pkgsmith - build Arch packages and their dependencies in chroots
//!
//! Resolves each requested name to a PKGBUILD (local directory or AUR),
//! builds it in a chroot with recursively built dependencies, and
//! optionally installs the result.

mod cli;
mod error;
mod events;

use crate::cli::Cli;
use crate::error::format_error;
use clap::Parser;
use pkgsmith_aur::AurClient;
use pkgsmith_builder::{BuildContext, Builder};
use pkgsmith_chroot::Chroot;
use pkgsmith_config::Config;
use pkgsmith_errors::{BuildError, Error};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("{}", format_error(&e));
        process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env();

    let cwd = std::env::current_dir()?;
    let (names, local_root) = resolve_invocation(
        cli.names.clone(),
        cli.pkgbuilds.clone().or(config.paths.local_dir.clone()),
        &cwd,
    );

    let ctx = BuildContext {
        build_root: cli.builddir.clone().unwrap_or(config.paths.build_dir.clone()),
        pacman_conf: Some(
            cli.pacman_config
                .clone()
                .unwrap_or(config.paths.pacman_conf.clone()),
        ),
        makepkg_conf: Some(
            cli.makepkg_config
                .clone()
                .unwrap_or(config.paths.makepkg_conf.clone()),
        ),
        local_root,
        preference: cli.preference(),
    };

    let (event_sender, mut event_receiver) = pkgsmith_events::channel();
    let debug = cli.debug;
    let renderer = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            events::render(&event, debug);
        }
    });

    let chroot_dir = cli.chrootdir.clone().unwrap_or(config.paths.chroot_dir.clone());
    let chroot = Arc::new(Chroot::new(chroot_dir, Some(event_sender.clone())));
    let aur = Arc::new(AurClient::new(
        config.aur.url.clone(),
        Some(event_sender.clone()),
    )?);

    let result = run_builds(&cli, &names, ctx, &chroot, &aur, &event_sender).await;

    drop(event_sender);
    let _ = renderer.await;
    result
}

async fn run_builds(
    cli: &Cli,
    names: &[String],
    ctx: BuildContext,
    chroot: &Arc<Chroot>,
    aur: &Arc<AurClient>,
    event_sender: &pkgsmith_events::EventSender,
) -> Result<(), Error> {
    for name in names {
        let mut builder = Builder::new(
            name,
            ctx.clone(),
            Arc::clone(chroot),
            Arc::clone(aur),
            Some(event_sender.clone()),
        )
        .await?;

        if cli.remove {
            builder.remove_build_dir().await?;
            continue;
        }

        let built = builder.build(cli.rebuild_mode()).await?;
        if built.is_empty() {
            return Err(BuildError::Failed {
                package: builder.name().to_string(),
            }
            .into());
        }

        if cli.install || cli.reinstall {
            builder
                .install(
                    cli.reinstall,
                    cli.sysroot.clone(),
                    cli.repo.as_deref(),
                    cli.confirm,
                )
                .await?;
        }
    }
    Ok(())
}

/// Fill in the defaults the CLI is built around: with no names, build the
/// current directory's package; with no explicit PKGBUILD tree, use the
/// current directory (or its parent when building the directory itself).
fn resolve_invocation(
    names: Vec<String>,
    pkgbuilds: Option<PathBuf>,
    cwd: &Path,
) -> (Vec<String>, Option<PathBuf>) {
    let local_root = pkgbuilds.or_else(|| {
        if names.first().is_some_and(|first| first != ".") {
            Some(cwd.to_path_buf())
        } else {
            cwd.parent().map(Path::to_path_buf)
        }
    });

    let names = if names.is_empty() {
        cwd.file_name()
            .map(|name| vec![name.to_string_lossy().into_owned()])
            .unwrap_or_default()
    } else {
        names
            .into_iter()
            .map(|name| {
                if name == "." {
                    cwd.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or(name)
                } else {
                    name
                }
            })
            .collect()
    };

    (names, local_root)
}
