//! Screenshot comparison against versioned baselines
//!
//! A scenario leaves its screenshots in the actual dir; `compare` checks
//! them against the stored baseline within a pixel-percentage threshold and
//! writes a red-marked diff image when they disagree. `compare_files` diffs
//! two screenshots from the same run, for self-consistency checks (drag the
//! sun, perturb the date, expect the rendered position unchanged).

use std::path::{Path, PathBuf};

use image::{GenericImageView, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Channel delta below which two pixels count as equal. Absorbs
/// anti-aliasing and PNG encoder differences.
const CHANNEL_TOLERANCE: i32 = 5;

#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Allowed differing pixels, percent of total (0.0 - 100.0).
    pub threshold: f64,
    /// Adopt the actual screenshot as baseline when none exists.
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

/// Result of one comparison.
#[derive(Debug, Clone)]
pub struct VisualDiff {
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    pub diff_image_path: Option<PathBuf>,
}

pub struct VisualTester {
    config: VisualConfig,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    pub fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{name}.png"))
    }

    pub fn actual_path(&self, name: &str) -> PathBuf {
        self.config.actual_dir.join(format!("{name}.png"))
    }

    /// Compare a named screenshot against its baseline.
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> HarnessResult<VisualDiff> {
        let threshold = threshold.unwrap_or(self.config.threshold);
        let actual = self.actual_path(name);
        let baseline = self.baseline_path(name);

        if !actual.exists() {
            return Err(HarnessError::ScreenshotNotFound(
                actual.to_string_lossy().to_string(),
            ));
        }

        if !baseline.exists() {
            if self.config.auto_update {
                info!(name, "adopting actual screenshot as baseline");
                std::fs::copy(&actual, &baseline)?;
                return Ok(VisualDiff {
                    matches: true,
                    diff_percent: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image_path: None,
                });
            }
            return Err(HarnessError::BaselineNotFound(
                baseline.to_string_lossy().to_string(),
            ));
        }

        let diff = self.diff_files(&actual, &baseline, threshold, Some(name))?;
        if !diff.matches {
            warn!(
                name,
                diff_percent = diff.diff_percent,
                threshold,
                "visual regression detected"
            );
        }
        Ok(diff)
    }

    /// Enforce the baseline contract: error on mismatch.
    pub fn assert_matches(&self, name: &str, threshold: Option<f64>) -> HarnessResult<VisualDiff> {
        let diff = self.compare(name, threshold)?;
        if !diff.matches {
            return Err(HarnessError::ScreenshotMismatch {
                name: name.to_string(),
                diff_percent: diff.diff_percent,
                threshold: threshold.unwrap_or(self.config.threshold),
            });
        }
        Ok(diff)
    }

    /// Compare two screenshot files from the same run.
    pub fn compare_files(
        &self,
        left: &Path,
        right: &Path,
        threshold: Option<f64>,
    ) -> HarnessResult<VisualDiff> {
        let threshold = threshold.unwrap_or(self.config.threshold);
        for path in [left, right] {
            if !path.exists() {
                return Err(HarnessError::ScreenshotNotFound(
                    path.to_string_lossy().to_string(),
                ));
            }
        }
        self.diff_files(left, right, threshold, None)
    }

    fn diff_files(
        &self,
        actual_path: &Path,
        expected_path: &Path,
        threshold: f64,
        diff_name: Option<&str>,
    ) -> HarnessResult<VisualDiff> {
        // Identical bytes short-circuit the pixel walk.
        if hash_file(actual_path)? == hash_file(expected_path)? {
            debug!(
                actual = %actual_path.display(),
                "screenshots are byte-identical"
            );
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: 0,
                diff_image_path: None,
            });
        }

        let actual = image::open(actual_path)?;
        let expected = image::open(expected_path)?;

        // Differing viewport output can never satisfy the visual contract.
        if actual.dimensions() != expected.dimensions() {
            warn!(
                actual = ?actual.dimensions(),
                expected = ?expected.dimensions(),
                "screenshot dimensions differ"
            );
            let total = u64::from(actual.width()) * u64::from(actual.height());
            return Ok(VisualDiff {
                matches: false,
                diff_percent: 100.0,
                diff_pixels: total,
                total_pixels: total,
                diff_image_path: None,
            });
        }

        let (width, height) = actual.dimensions();
        let actual_rgba = actual.to_rgba8();
        let expected_rgba = expected.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = u64::from(width) * u64::from(height);

        for y in 0..height {
            for x in 0..width {
                let a = actual_rgba.get_pixel(x, y);
                let b = expected_rgba.get_pixel(x, y);
                if pixels_differ(a, b) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                } else {
                    // Dimmed original keeps context around the red marks.
                    diff_img.put_pixel(x, y, Rgba([a[0] / 2, a[1] / 2, a[2] / 2, 128]));
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let stem = diff_name.map(str::to_string).unwrap_or_else(|| {
                format!(
                    "{}-vs-{}",
                    file_stem(actual_path),
                    file_stem(expected_path)
                )
            });
            let path = self.config.diff_dir.join(format!("{stem}-diff.png"));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        Ok(VisualDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
        })
    }

    /// Adopt the actual screenshot as the new baseline.
    pub fn update_baseline(&self, name: &str) -> HarnessResult<()> {
        let actual = self.actual_path(name);
        if !actual.exists() {
            return Err(HarnessError::ScreenshotNotFound(
                actual.to_string_lossy().to_string(),
            ));
        }
        std::fs::copy(&actual, self.baseline_path(name))?;
        info!(name, "baseline updated");
        Ok(())
    }

    /// Names of all stored baselines.
    pub fn list_baselines(&self) -> HarnessResult<Vec<String>> {
        let mut names: Vec<String> = walkdir::WalkDir::new(&self.config.baseline_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
            .map(|entry| file_stem(entry.path()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Names of all screenshots captured by the latest runs.
    pub fn list_actuals(&self) -> HarnessResult<Vec<String>> {
        let mut names: Vec<String> = walkdir::WalkDir::new(&self.config.actual_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
            .map(|entry| file_stem(entry.path()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Remove stale diff images.
    pub fn clean_diffs(&self) -> HarnessResult<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.config.diff_dir)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|ext| ext == "png") {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn pixels_differ(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    (0..4).any(|i| (i32::from(a[i]) - i32::from(b[i])).abs() > CHANNEL_TOLERANCE)
}

fn hash_file(path: &Path) -> HarnessResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tester(dir: &TempDir, threshold: f64, auto_update: bool) -> VisualTester {
        VisualTester::new(VisualConfig {
            baseline_dir: dir.path().join("baselines"),
            actual_dir: dir.path().join("actual"),
            diff_dir: dir.path().join("diffs"),
            threshold,
            auto_update,
        })
        .unwrap()
    }

    fn solid_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        img.save(path).unwrap();
    }

    #[test]
    fn identical_screenshots_match() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.5, false);

        solid_png(&tester.actual_path("sun"), 16, 16, [200, 100, 0, 255]);
        solid_png(&tester.baseline_path("sun"), 16, 16, [200, 100, 0, 255]);

        let diff = tester.compare("sun", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
        assert!(diff.diff_image_path.is_none());
    }

    #[test]
    fn tolerance_absorbs_small_channel_noise() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.0, false);

        solid_png(&tester.actual_path("sun"), 8, 8, [100, 100, 100, 255]);
        solid_png(&tester.baseline_path("sun"), 8, 8, [103, 98, 100, 255]);

        let diff = tester.compare("sun", None).unwrap();
        assert!(diff.matches, "within channel tolerance: {diff:?}");
    }

    #[test]
    fn gross_difference_fails_and_writes_diff_image() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.5, false);

        solid_png(&tester.actual_path("sun"), 8, 8, [255, 255, 255, 255]);
        solid_png(&tester.baseline_path("sun"), 8, 8, [0, 0, 0, 255]);

        let diff = tester.compare("sun", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 64);
        assert_eq!(diff.diff_percent, 100.0);
        let diff_path = diff.diff_image_path.expect("diff image written");
        assert!(diff_path.exists());

        assert!(matches!(
            tester.assert_matches("sun", None),
            Err(HarnessError::ScreenshotMismatch { .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_a_hard_mismatch() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 50.0, false);

        solid_png(&tester.actual_path("sun"), 8, 8, [10, 10, 10, 255]);
        solid_png(&tester.baseline_path("sun"), 16, 8, [10, 10, 10, 255]);

        let diff = tester.compare("sun", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_percent, 100.0);
    }

    #[test]
    fn missing_baseline_errors_unless_auto_update() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.5, false);
        solid_png(&tester.actual_path("sun"), 4, 4, [1, 2, 3, 255]);

        assert!(matches!(
            tester.compare("sun", None),
            Err(HarnessError::BaselineNotFound(_))
        ));

        let adopting = VisualTester::new(VisualConfig {
            baseline_dir: dir.path().join("baselines"),
            actual_dir: dir.path().join("actual"),
            diff_dir: dir.path().join("diffs"),
            threshold: 0.5,
            auto_update: true,
        })
        .unwrap();

        let diff = adopting.compare("sun", None).unwrap();
        assert!(diff.matches);
        assert!(adopting.baseline_path("sun").exists());
    }

    #[test]
    fn compare_files_checks_same_run_consistency() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.5, false);

        let before = tester.actual_path("before");
        let after = tester.actual_path("after");
        solid_png(&before, 8, 8, [50, 60, 70, 255]);
        solid_png(&after, 8, 8, [50, 60, 70, 255]);

        let diff = tester.compare_files(&before, &after, None).unwrap();
        assert!(diff.matches);

        solid_png(&after, 8, 8, [250, 60, 70, 255]);
        let diff = tester.compare_files(&before, &after, None).unwrap();
        assert!(!diff.matches);
    }

    #[test]
    fn baseline_maintenance_roundtrip() {
        let dir = TempDir::new().unwrap();
        let tester = tester(&dir, 0.5, false);

        solid_png(&tester.actual_path("a"), 4, 4, [1, 1, 1, 255]);
        solid_png(&tester.actual_path("b"), 4, 4, [2, 2, 2, 255]);

        tester.update_baseline("a").unwrap();
        tester.update_baseline("b").unwrap();
        assert_eq!(tester.list_baselines().unwrap(), vec!["a", "b"]);
        assert_eq!(tester.list_actuals().unwrap(), vec!["a", "b"]);

        assert!(matches!(
            tester.update_baseline("missing"),
            Err(HarnessError::ScreenshotNotFound(_))
        ));

        // Force a diff image, then clean it.
        solid_png(&tester.baseline_path("a"), 4, 4, [200, 1, 1, 255]);
        let diff = tester.compare("a", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(tester.clean_diffs().unwrap(), 1);
        assert_eq!(tester.clean_diffs().unwrap(), 0);
    }
}
