//! sformat-patcher: idempotent literal patching of generated React Native headers
//!
//! React Native's `graphicsConversions.h` calls `std::format`, which several
//! Android NDK toolchains cannot compile. This crate swaps it for
//! `folly::sformat`, makes sure `<folly/Format.h>` is included, and verifies
//! the result on disk, for every copy of the header it can find: the one
//! under `node_modules/` and the ones Gradle unpacked into its transform
//! cache.
//!
//! # Architecture
//!
//! - [`TextPatch`] is a pure, in-memory transformation of a document.
//! - [`config::patch_file`] wraps it in read → patch → write → re-read → verify.
//! - [`locate`] turns a patch set's target definitions into concrete files.
//!
//! The literals, anchor and targets all come from a [`PatchConfig`]; the
//! default patch set ships embedded in the binary.
//!
//! # Example
//!
//! ```no_run
//! use sformat_patcher::{patch_file, Diagnostics, PatchOptions, TextPatch};
//! use std::path::Path;
//!
//! let patch = TextPatch::new("std::format", "folly::sformat")
//!     .with_include("#include <folly/Format.h>", "#include <folly/dynamic.h>");
//!
//! match patch_file(
//!     Path::new("graphicsConversions.h"),
//!     &patch,
//!     &Diagnostics::default(),
//!     PatchOptions::default(),
//! ) {
//!     Ok(report) => println!("{}: {}", report.outcome, report.verdict),
//!     Err(e) => eprintln!("patch failed: {}", e),
//! }
//! ```

pub mod config;
pub mod edit;
pub mod locate;
pub mod verify;

// Re-exports
pub use config::{
    apply_patches, check_patches, load_builtin, load_from_path, load_from_str,
    matches_requirement, patch_file, ConfigError, Diagnostics, PatchConfig, PatchError,
    PatchOptions, PatchReport, PatchResult, Verdict, VersionError,
};
pub use edit::{Fingerprint, IncludeRule, IncludeStatus, Outcome, PatchRule, PatchedText, TextPatch};
pub use locate::{resolve_targets, Discovery, DiscoveryContext, DiscoveryError, Target};
pub use verify::{ExcerptLine, Verification, Violation};
