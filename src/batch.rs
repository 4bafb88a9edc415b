//! Directory-level batch analysis.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::burn_spot::{locate_burn_spot, DiagnosticRenderer};
use crate::curve::{extract_curve, RecoveryCurve};
use crate::error::{FrapError, Result};
use crate::segmentation::SegmentationBackend;
use crate::stack::ImageStack;

/// Subdirectory of the save directory holding diagnostic images.
pub const BURN_SPOT_DIR: &str = "burn_spots";
/// Suffix appended to a stack's file stem to name its diagnostic image.
pub const DIAGNOSTIC_SUFFIX: &str = "_burnspots";

/// Parameters for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory containing the input TIFF stacks.
    pub read_dir: PathBuf,
    /// Directory results and diagnostics are written under.
    pub save_dir: PathBuf,
    /// Timepoints to analyze; its length sets the analysis window.
    pub time_array: Vec<f64>,
    /// Index of the first post-bleach frame, shared by every stack.
    pub bleach_frame: usize,
    /// Measurement radius in pixels.
    pub radius: f64,
    /// Write a diagnostic image per stack under [`BURN_SPOT_DIR`].
    pub save_diagnostics: bool,
}

/// Decides whether a batch may write into an already-existing save
/// directory.
pub trait OverwritePolicy {
    fn confirm(&self, dir: &Path) -> bool;
}

/// Always proceeds. Suits non-interactive callers and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysProceed;

impl OverwritePolicy for AlwaysProceed {
    fn confirm(&self, _dir: &Path) -> bool {
        true
    }
}

/// Asks on stdin, re-prompting until the answer is y or n.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl OverwritePolicy for StdinPrompt {
    fn confirm(&self, dir: &Path) -> bool {
        let mut input = String::new();
        loop {
            print!(
                "Save directory {} already exists, files may be overwritten. Proceed? [y/n] ",
                dir.display()
            );
            if std::io::stdout().flush().is_err() {
                return false;
            }
            input.clear();
            if std::io::stdin().read_line(&mut input).is_err() {
                return false;
            }
            match input.trim() {
                "y" | "Y" => return true,
                "n" | "N" => return false,
                _ => continue,
            }
        }
    }
}

impl OverwritePolicy for Box<dyn OverwritePolicy> {
    fn confirm(&self, dir: &Path) -> bool {
        self.as_ref().confirm(dir)
    }
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// One row of normalized recovery values per input stack, rows ordered
    /// by file name.
    Completed(Array2<f64>),
    /// The overwrite policy declined the existing save directory; nothing
    /// was written.
    Aborted,
}

impl BatchOutcome {
    pub fn matrix(&self) -> Option<&Array2<f64>> {
        match self {
            BatchOutcome::Completed(matrix) => Some(matrix),
            BatchOutcome::Aborted => None,
        }
    }
}

/// Runs the localization and extraction pipeline over every stack in a
/// directory.
pub struct BatchRunner<B, R, P> {
    backend: B,
    renderer: R,
    policy: P,
}

impl<B, R, P> BatchRunner<B, R, P>
where
    B: SegmentationBackend,
    R: DiagnosticRenderer,
    P: OverwritePolicy,
{
    pub fn new(backend: B, renderer: R, policy: P) -> Self {
        Self {
            backend,
            renderer,
            policy,
        }
    }

    /// Analyze every file in `config.read_dir`, in lexicographic file name
    /// order, and collect the curves into one matrix.
    ///
    /// The run is fail-fast: the first stack that cannot be analyzed
    /// aborts the batch with an error naming the file, so a half-filled
    /// matrix never reaches the caller.
    pub fn run(&self, config: &BatchConfig) -> Result<BatchOutcome> {
        if config.save_dir.exists() {
            if !self.policy.confirm(&config.save_dir) {
                log::info!("batch aborted: declined to reuse {}", config.save_dir.display());
                return Ok(BatchOutcome::Aborted);
            }
        } else {
            fs::create_dir_all(&config.save_dir)?;
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&config.read_dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(FrapError::EmptyReadDir {
                dir: config.read_dir.clone(),
            });
        }

        let spot_dir = config.save_dir.join(BURN_SPOT_DIR);
        if config.save_diagnostics {
            fs::create_dir_all(&spot_dir)?;
        }

        let mut matrix = Array2::zeros((files.len(), config.time_array.len()));
        for (index, path) in files.iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let curve = self
                .process_file(config, path, &spot_dir)
                .map_err(|source| source.for_file(&name))?;
            matrix.row_mut(index).assign(&curve);
            log::info!("completed: {name}");
        }

        Ok(BatchOutcome::Completed(matrix))
    }

    fn process_file(
        &self,
        config: &BatchConfig,
        path: &Path,
        spot_dir: &Path,
    ) -> Result<RecoveryCurve> {
        let stack = ImageStack::load(path)?;

        let diagnostic_path = if config.save_diagnostics {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "stack".to_string());
            Some(spot_dir.join(format!("{stem}{DIAGNOSTIC_SUFFIX}.png")))
        } else {
            None
        };

        let spot = locate_burn_spot(
            &self.backend,
            &self.renderer,
            &stack,
            config.bleach_frame,
            config.radius,
            diagnostic_path.as_deref(),
        )?;

        extract_curve(
            &self.backend,
            &stack,
            spot.center,
            config.bleach_frame,
            config.radius,
            config.time_array.len(),
        )
    }
}
