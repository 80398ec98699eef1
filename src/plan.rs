//! Output plan builder.
//!
//! Turns a list of validated [`OutputSpec`]s into rendered artifacts plus the
//! [`PictureSource`]s the markup renderer consumes.
//!
//! ## Ordering
//!
//! Specs are expanded in input order, density variants in declaration order.
//! Rectangles are rendered in parallel with [rayon](https://docs.rs/rayon),
//! but results are collected by position, so artifacts and sources always come
//! back in plan order no matter which rectangle finishes first.
//!
//! ## Failure
//!
//! A single failed rectangle fails the whole plan; no partial plan is
//! returned. Cleaning up anything already persisted is the caller's job.
//!
//! ## Duplicate rectangles
//!
//! Two entries asking for the same rectangle in the same format produce the
//! same filename. That is logged as a warning and listed in
//! [`Plan::duplicates`]; the later entry wins when results are written.

use crate::imaging::{
    BackendError, FocalPoint, ImageBackend, OutputFormat, RenderParams, SourceImage, produce,
};
use crate::naming::artifact_filename;
use crate::outputs::OutputSpec;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("failed to render {filename}: {source}")]
    Render {
        filename: String,
        #[source]
        source: BackendError,
    },
}

impl PlanError {
    pub fn backend_error(&self) -> &BackendError {
        match self {
            Self::Render { source, .. } => source,
        }
    }
}

/// One rendered rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Density label when the rectangle belongs to a density set.
    pub density: Option<String>,
    pub bytes: Vec<u8>,
}

/// One `srcset` candidate of a density source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityItem {
    pub filename: String,
    pub density: String,
    pub width: u32,
    pub height: u32,
}

/// Markup-level grouping of artifacts: one `<source>` element each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureSource {
    Simple {
        width: u32,
        height: u32,
        format: OutputFormat,
        filename: String,
    },
    Density {
        breakpoint: u32,
        format: OutputFormat,
        /// In declaration order.
        items: Vec<DensityItem>,
    },
}

impl PictureSource {
    /// The `min-width` this source is shown from: image width for simple
    /// sources, breakpoint for density sources.
    pub fn width(&self) -> u32 {
        match self {
            Self::Simple { width, .. } => *width,
            Self::Density { breakpoint, .. } => *breakpoint,
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Simple { format, .. } | Self::Density { format, .. } => *format,
        }
    }
}

/// Everything a plan produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// In plan order.
    pub artifacts: Vec<GeneratedArtifact>,
    /// In plan order; the renderer sorts them.
    pub sources: Vec<PictureSource>,
    /// Filenames requested more than once.
    pub duplicates: Vec<String>,
}

/// Progress notifications for front ends.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEvent {
    Started {
        specs: usize,
        rectangles: usize,
    },
    Rendered {
        spec_index: usize,
        filename: String,
        density: Option<String>,
        width: u32,
        height: u32,
        bytes: usize,
    },
}

/// One rectangle to render.
#[derive(Debug, Clone)]
struct Job {
    spec_index: usize,
    density: Option<String>,
    filename: String,
    params: RenderParams,
}

impl Job {
    fn into_artifact(self, bytes: Vec<u8>) -> GeneratedArtifact {
        GeneratedArtifact {
            filename: self.filename,
            width: self.params.width,
            height: self.params.height,
            format: self.params.format,
            density: self.density,
            bytes,
        }
    }
}

/// Expand specs into rectangles, in plan order.
fn expand_jobs(specs: &[OutputSpec], focal: FocalPoint, basename: &str) -> Vec<Job> {
    let mut jobs = Vec::new();
    for (spec_index, spec) in specs.iter().enumerate() {
        let params = |width: u32, height: u32| RenderParams {
            width,
            height,
            focal,
            format: spec.format(),
            quality: spec.quality(),
        };
        match spec {
            OutputSpec::Simple(s) => jobs.push(Job {
                spec_index,
                density: None,
                filename: artifact_filename(basename, s.width, s.height, s.format),
                params: params(s.width, s.height),
            }),
            OutputSpec::DensitySet(d) => {
                for variant in &d.densities {
                    jobs.push(Job {
                        spec_index,
                        density: Some(variant.label.clone()),
                        filename: artifact_filename(
                            basename,
                            variant.width,
                            variant.height,
                            d.format,
                        ),
                        params: params(variant.width, variant.height),
                    });
                }
            }
        }
    }
    jobs
}

fn find_duplicates(jobs: &[Job]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for job in jobs {
        if !seen.insert(job.filename.as_str()) && !duplicates.contains(&job.filename) {
            duplicates.push(job.filename.clone());
        }
    }
    duplicates
}

/// Regroup rendered jobs (still in plan order) into artifacts and sources.
fn assemble(
    specs: &[OutputSpec],
    jobs: Vec<Job>,
    rendered: Vec<Vec<u8>>,
) -> (Vec<GeneratedArtifact>, Vec<PictureSource>) {
    let mut artifacts = Vec::with_capacity(jobs.len());
    let mut sources = Vec::with_capacity(specs.len());
    let mut produced = jobs.into_iter().zip(rendered).peekable();

    for (index, spec) in specs.iter().enumerate() {
        match spec {
            OutputSpec::Simple(s) => {
                if let Some((job, bytes)) = produced.next_if(|(job, _)| job.spec_index == index) {
                    let artifact = job.into_artifact(bytes);
                    sources.push(PictureSource::Simple {
                        width: s.width,
                        height: s.height,
                        format: s.format,
                        filename: artifact.filename.clone(),
                    });
                    artifacts.push(artifact);
                }
            }
            OutputSpec::DensitySet(d) => {
                let mut items = Vec::new();
                while let Some((job, bytes)) =
                    produced.next_if(|(job, _)| job.spec_index == index)
                {
                    let artifact = job.into_artifact(bytes);
                    items.push(DensityItem {
                        filename: artifact.filename.clone(),
                        density: artifact.density.clone().unwrap_or_default(),
                        width: artifact.width,
                        height: artifact.height,
                    });
                    artifacts.push(artifact);
                }
                if !items.is_empty() {
                    sources.push(PictureSource::Density {
                        breakpoint: d.breakpoint,
                        format: d.format,
                        items,
                    });
                }
            }
        }
    }
    (artifacts, sources)
}

/// Render every rectangle the specs ask for.
///
/// `events`, when given, receives one [`PlanEvent::Started`] and then one
/// [`PlanEvent::Rendered`] per rectangle in completion order.
pub fn build_plan(
    backend: &impl ImageBackend,
    source: &SourceImage,
    specs: &[OutputSpec],
    focal: FocalPoint,
    basename: &str,
    events: Option<&Sender<PlanEvent>>,
) -> Result<Plan, PlanError> {
    let jobs = expand_jobs(specs, focal, basename);
    let duplicates = find_duplicates(&jobs);
    for filename in &duplicates {
        log::warn!("{filename} is requested more than once; the last entry wins");
    }

    if let Some(tx) = events {
        let _ = tx.send(PlanEvent::Started {
            specs: specs.len(),
            rectangles: jobs.len(),
        });
    }

    let rendered = jobs
        .par_iter()
        .map(|job| {
            let bytes = produce(backend, source, &job.params).map_err(|source| PlanError::Render {
                filename: job.filename.clone(),
                source,
            })?;
            if let Some(tx) = events {
                let _ = tx.send(PlanEvent::Rendered {
                    spec_index: job.spec_index,
                    filename: job.filename.clone(),
                    density: job.density.clone(),
                    width: job.params.width,
                    height: job.params.height,
                    bytes: bytes.len(),
                });
            }
            Ok(bytes)
        })
        .collect::<Result<Vec<_>, PlanError>>()?;

    let (artifacts, sources) = assemble(specs, jobs, rendered);
    Ok(Plan {
        artifacts,
        sources,
        duplicates,
    })
}
