#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::anyhow;
use assetflow::errors::Result;
use assetflow::{FileHandle, Filter};
use regex::Regex;

/// Expands `#include "path"` lines with the named file's contents (paths
/// relative to the including file's root) and reports the included files
/// as dynamic dependencies.
///
/// `discoveries` counts calls to `additional_dependencies`, so tests can
/// tell a fresh scan from a manifest reuse.
#[derive(Debug, Clone)]
pub struct IncludeFilter {
    pattern: Regex,
    pub discoveries: Arc<AtomicUsize>,
}

impl IncludeFilter {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r#"(?m)^#include "([^"]+)"\s*$"#).expect("valid include regex"),
            discoveries: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn discovery_count(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }

    fn includes(&self, text: &str) -> Vec<String> {
        self.pattern
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }
}

impl Default for IncludeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for IncludeFilter {
    fn name(&self) -> &str {
        "include"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in inputs {
            let text = input.read_to_string()?;
            let expanded = self.pattern.replace_all(&text, |caps: &regex::Captures<'_>| {
                std::fs::read_to_string(input.root().join(&caps[1])).unwrap_or_default()
            });
            output.write(expanded.as_bytes())?;
        }
        Ok(())
    }

    fn has_additional_dependencies(&self) -> bool {
        true
    }

    fn additional_dependencies(&self, input: &FileHandle) -> Result<Vec<PathBuf>> {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        let text = input.read_to_string()?;
        Ok(self.includes(&text).into_iter().map(PathBuf::from).collect())
    }
}

/// Upper-cases UTF-8 text. Fails on invalid UTF-8 input.
#[derive(Debug, Clone, Default)]
pub struct UppercaseFilter;

impl Filter for UppercaseFilter {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in inputs {
            output.write(input.read_to_string()?.to_uppercase())?;
        }
        Ok(())
    }
}

/// Drops every line containing `assert(`.
#[derive(Debug, Clone, Default)]
pub struct StripAssertsFilter;

impl Filter for StripAssertsFilter {
    fn name(&self) -> &str {
        "strip_asserts"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in inputs {
            let text = input.read_to_string()?;
            for line in text.lines().filter(|l| !l.contains("assert(")) {
                output.write(line)?;
                output.write("\n")?;
            }
        }
        Ok(())
    }
}

/// Copies its inputs until `failing` is set, then errors.
#[derive(Debug, Clone, Default)]
pub struct SwitchableFilter {
    pub failing: Arc<AtomicBool>,
    pub runs: Arc<AtomicUsize>,
}

impl SwitchableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Filter for SwitchableFilter {
    fn name(&self) -> &str {
        "switchable"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("filter switched to failing for {}", output.path()).into());
        }
        for input in inputs {
            output.write(input.read()?)?;
        }
        Ok(())
    }
}

/// Copies its inputs after a short pause and remembers the highest number
/// of `generate_output` calls that were in flight at once.
#[derive(Debug, Clone, Default)]
pub struct OverlapFilter {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    pub runs: Arc<AtomicUsize>,
}

impl OverlapFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peak_overlap(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Filter for OverlapFilter {
    fn name(&self) -> &str {
        "overlap"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);

        std::thread::sleep(std::time::Duration::from_millis(15));
        let result = inputs.iter().try_for_each(|input| output.write(input.read()?));

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
