//! Event rendering for the CLI
//!
//! All crates emit domain events; this is the single place they become
//! terminal output.

use pkgsmith_events::{
    AcquisitionEvent, AppEvent, BuildEvent, GeneralEvent, InstallEvent, RepoEvent, ResolverEvent,
};

/// Render one event as terminal output.
pub fn render(event: &AppEvent, debug: bool) {
    match event {
        AppEvent::Build(event) => render_build(event),
        AppEvent::Resolver(event) => render_resolver(event, debug),
        AppEvent::Acquisition(event) => render_acquisition(event),
        AppEvent::Install(event) => render_install(event),
        AppEvent::Repo(event) => render_repo(event),
        AppEvent::General(event) => render_general(event, debug),
    }
}

fn render_build(event: &BuildEvent) {
    match event {
        BuildEvent::Started { package, pass } => {
            println!("{package}: Building... [pass {pass}]");
        }
        BuildEvent::CacheHit { package } => println!("{package}: Already built"),
        BuildEvent::Rebuilding { package } => println!("{package}: Rebuilding..."),
        BuildEvent::Output { line } => println!("{line}"),
        BuildEvent::MissingDependency {
            package,
            dependency,
            kind,
        } => println!("{package}: Missing {kind}: {dependency}"),
        BuildEvent::Succeeded { package, artifacts } => {
            println!("{package}: Built {artifacts} package(s)");
        }
        BuildEvent::Failed { package, passes } => {
            println!("{package}: Build failed [pass {passes}]");
        }
        BuildEvent::ChrootCreating { path } => {
            println!("Creating chroot... [{}]", path.display());
        }
        BuildEvent::RemovingBuildDir { package, path } => {
            println!("{package}: Removing build dir... [{}]", path.display());
        }
    }
}

fn render_resolver(event: &ResolverEvent, debug: bool) {
    match event {
        ResolverEvent::Resolving { name } => {
            if debug {
                println!("{name}: Resolving...");
            }
        }
        ResolverEvent::Resolved { name, source } => {
            println!("{name}: PKGBUILD source: {source}");
        }
        ResolverEvent::TreeScanned { root, providers } => {
            println!("Indexed {providers} providers from {}", root.display());
        }
    }
}

fn render_acquisition(event: &AcquisitionEvent) {
    match event {
        AcquisitionEvent::DownloadStarted { name, url } => {
            println!("{name}: Downloading snapshot... [{url}]");
        }
        AcquisitionEvent::DownloadCompleted { name } => {
            println!("{name}: Snapshot downloaded");
        }
        AcquisitionEvent::Cloning { name, url } => println!("{name}: Cloning {url}..."),
        AcquisitionEvent::Pulling { name, path } => {
            println!("{name}: Pulling... [{}]", path.display());
        }
        AcquisitionEvent::Synced { name, path } => {
            println!("{name}: PKGBUILD -> {}", path.display());
        }
    }
}

fn render_install(event: &InstallEvent) {
    match event {
        InstallEvent::Installing { packages, as_deps } => {
            if *as_deps {
                println!("Installing {packages} dependency package(s)...");
            } else {
                println!("Installing {packages} package(s)...");
            }
        }
        InstallEvent::Installed { packages } => println!("Installed {packages} package(s)"),
    }
}

fn render_repo(event: &RepoEvent) {
    let RepoEvent::Added { repo, packages } = event;
    println!("{repo}: Added {packages} package(s)");
}

fn render_general(event: &GeneralEvent, debug: bool) {
    match event {
        GeneralEvent::Debug { message } => {
            if debug {
                println!("{message}");
            }
        }
        GeneralEvent::Operation { message } => println!("{message}"),
        GeneralEvent::Warning { message } => eprintln!("WARNING: {message}"),
        GeneralEvent::Error { message } => eprintln!("ERROR: {message}"),
    }
}
