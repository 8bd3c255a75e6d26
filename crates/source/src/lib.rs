#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! PKGBUILD sources for pkgsmith
//!
//! A [`Pkgbuild`] describes where a package's build description comes
//! from - a local directory or the AUR - and owns the build directory the
//! package is built in. [`LocalTree`] indexes a directory of local
//! PKGBUILDs by the names and versions they provide, so dependency names
//! can be resolved against it under version restrictions.

mod pkgbuild;
mod srcinfo;
mod sync;
mod tree;

pub use pkgbuild::{Pkgbuild, SourceKind};
pub use srcinfo::Srcinfo;
pub use sync::synctree;
pub use tree::LocalTree;
