//! # focal-crop
//!
//! Turns one uploaded image into a set of responsive derivatives, every one
//! cropped around a user-chosen focal point, plus the `<picture>` element
//! that references them.
//!
//! # Architecture: Pure Core, Thin Shell
//!
//! ```text
//! upload + outputs JSON + focal point
//!         │
//!         ▼
//! request ──► outputs (parse) ──► plan (render every rectangle) ──► markup
//!                                   │
//!                                   ▼
//!                               imaging (cover resize + focal crop + encode)
//!         │
//!         ▼
//! RequestOutcome { entries, html } ──► archive (results folder on disk)
//! ```
//!
//! Everything up to [`request::RequestOutcome`] is a pure function from bytes
//! and strings to bytes and strings, so the whole pipeline is unit tested
//! against a mock backend without touching the filesystem. Only [`archive`]
//! and the CLI do I/O.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Resize-crop engine: cover geometry, focal crop, encoders, backend trait |
//! | [`outputs`] | Declarative output configuration (simple outputs and density sets) |
//! | [`plan`] | Renders every requested rectangle, groups results into picture sources |
//! | [`markup`] | `<picture>` rendering with Maud: source order, srcset, fallback `<img>` |
//! | [`naming`] | Artifact filenames, results folder names, public URLs |
//! | [`request`] | One request end to end: validation, decode, plan, markup, entries |
//! | [`archive`] | Writes results folders and resolves download names |
//! | [`config`] | `focal-crop.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Cover, Then Crop Toward the Focal Point
//!
//! Each rectangle is produced by scaling the source until it covers the target
//! on both axes, then cutting a target-sized window centred on the focal point
//! and clamped to the image. The subject stays in frame at every aspect ratio
//! and no output is ever letterboxed or stretched.
//!
//! ## Parallel Rendering, Deterministic Results
//!
//! Rectangles are independent given the decoded source, so [`plan`] renders
//! them on rayon workers. Results are collected by position and the markup
//! renderer stable-sorts its sources, so the output never depends on which
//! worker finished first.
//!
//! ## Skip Bad Entries, Fail Bad Requests
//!
//! A malformed output entry is skipped with a warning and reported back; the
//! rest still render. Anything that makes the request as a whole untrustworthy
//! (unreadable upload, oversized source, encoder failure) fails it entirely,
//! and no partial results folder is left behind.

pub mod archive;
pub mod config;
pub mod imaging;
pub mod markup;
pub mod naming;
pub mod output;
pub mod outputs;
pub mod plan;
pub mod request;

#[cfg(test)]
pub(crate) mod test_helpers;
