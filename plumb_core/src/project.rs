//! # Project Session
//!
//! The `Project` struct holds everything one design session works on: the
//! ordered pipe sections, the consumer selector, the settings, and the last
//! successful section run.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, title, timestamps)
//! ├── settings: GlobalSettings (stream, velocity mode, temperatures)
//! ├── consumer: u32
//! ├── sections: Vec<PipeSection> (never empty, numbered from 1)
//! └── last_run: Option<SectionRun>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::project::Project;
//! use plumb_core::reference::ReferenceDataset;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let mut project = Project::new("Жилой дом", 1, 25);
//! project.add_section(40.0, 32);
//!
//! let run = project.calculate(dataset).unwrap();
//! assert_eq!(run.batch.results.len(), 2);
//!
//! let input = project.load_input(40.0);
//! let loads = project.load_calculation(dataset, &input).unwrap();
//! assert_eq!(loads.rows.len(), 25);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculations::aggregate::{DEFAULT_COLD_WATER_C, DEFAULT_HOT_WATER_C, DEFAULT_PERIOD_H};
use crate::calculations::{
    calculate_batch, calculate_loads, AggregateReport, BatchPolicy, LoadInput, PipeSection,
    SectionBatch, SectionRequest, VelocityMode,
};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ConsumerProfile, ReferenceDataset, Stream};

/// Current schema version of serialized projects
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root session container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ProjectDocument")]
pub struct Project {
    pub meta: ProjectMetadata,

    pub settings: GlobalSettings,

    /// Consumer selector t used for every section
    pub consumer: u32,

    sections: Vec<PipeSection>,

    /// Last successful section run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_run: Option<SectionRun>,
}

/// Unchecked serialized form of a project
#[derive(Deserialize)]
struct ProjectDocument {
    meta: ProjectMetadata,
    #[serde(default)]
    settings: GlobalSettings,
    consumer: u32,
    sections: Vec<PipeSection>,
    #[serde(default)]
    last_run: Option<SectionRun>,
}

impl TryFrom<ProjectDocument> for Project {
    type Error = CalcError;

    fn try_from(doc: ProjectDocument) -> CalcResult<Self> {
        if doc.sections.is_empty() {
            return Err(CalcError::invalid_input(
                "sections",
                "[]",
                "A project needs at least one section",
            ));
        }
        let mut project = Project {
            meta: doc.meta,
            settings: doc.settings,
            consumer: doc.consumer,
            sections: doc.sections,
            last_run: doc.last_run,
        };
        project.renumber();
        Ok(project)
    }
}

/// A completed section run together with the profile it resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRun {
    pub profile: ConsumerProfile,
    pub stream: Stream,
    pub batch: SectionBatch,
}

/// One row of an imported section table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportedSection {
    pub t: u32,
    #[serde(rename = "U")]
    pub fixtures: f64,
    #[serde(rename = "D")]
    pub diameter_mm: u32,
}

impl Project {
    /// Create a session with one section (`U = 1`, diameter `diameter_mm`).
    pub fn new(title: impl Into<String>, consumer: u32, diameter_mm: u32) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                title: title.into(),
                created: now,
                modified: now,
            },
            settings: GlobalSettings::default(),
            consumer,
            sections: vec![PipeSection::new(1, 1.0, diameter_mm)],
            last_run: None,
        }
    }

    pub fn sections(&self) -> &[PipeSection] {
        &self.sections
    }

    pub fn last_run(&self) -> Option<&SectionRun> {
        self.last_run.as_ref()
    }

    /// Append a section. Returns its ordinal number.
    pub fn add_section(&mut self, fixtures: f64, diameter_mm: u32) -> usize {
        let index = self.sections.len() + 1;
        self.sections.push(PipeSection::new(index, fixtures, diameter_mm));
        self.touch();
        index
    }

    /// Insert a section after section `index` (1-based). Later sections are
    /// renumbered.
    pub fn insert_section_after(&mut self, index: usize, fixtures: f64, diameter_mm: u32) -> CalcResult<usize> {
        self.check_index(index)?;
        self.sections.insert(index, PipeSection::new(index + 1, fixtures, diameter_mm));
        self.renumber();
        self.touch();
        Ok(index + 1)
    }

    /// Update the fixture count and diameter of section `index`.
    pub fn update_section(&mut self, index: usize, fixtures: f64, diameter_mm: u32) -> CalcResult<()> {
        self.check_index(index)?;
        self.sections[index - 1] = PipeSection::new(index, fixtures, diameter_mm);
        self.touch();
        Ok(())
    }

    /// Remove section `index`. The last remaining section cannot be removed.
    pub fn remove_section(&mut self, index: usize) -> CalcResult<PipeSection> {
        self.check_index(index)?;
        if self.sections.len() == 1 {
            return Err(CalcError::invalid_input(
                "section",
                index.to_string(),
                "Нельзя удалить последний участок",
            ));
        }
        let removed = self.sections.remove(index - 1);
        self.renumber();
        self.touch();
        Ok(removed)
    }

    /// Replace all sections with imported rows.
    ///
    /// Rows with a zero `t`, a non-positive or non-finite `U`, or a zero
    /// `D` are skipped. The consumer selector of the last kept row becomes the
    /// project's selector. Returns the number of rows kept; when none
    /// survive the project is left unchanged.
    pub fn replace_sections(&mut self, imported: &[ImportedSection]) -> usize {
        let kept: Vec<&ImportedSection> = imported
            .iter()
            .filter(|row| row.t > 0 && row.fixtures.is_finite() && row.fixtures > 0.0 && row.diameter_mm > 0)
            .collect();
        if kept.is_empty() {
            tracing::warn!(rows = imported.len(), "import contained no valid sections");
            return 0;
        }
        if kept.len() < imported.len() {
            tracing::warn!(skipped = imported.len() - kept.len(), "skipped invalid import rows");
        }

        self.sections = kept
            .iter()
            .enumerate()
            .map(|(i, row)| PipeSection::new(i + 1, row.fixtures, row.diameter_mm))
            .collect();
        if let Some(last) = kept.last() {
            self.consumer = last.t;
        }
        self.touch();
        self.sections.len()
    }

    /// Build the section request from the current sections and settings.
    pub fn request(&self) -> SectionRequest {
        SectionRequest::new(self.consumer, self.sections.clone())
            .with_stream(self.settings.stream)
            .with_velocity_mode(self.settings.velocity_mode)
            .with_policy(self.settings.batch_policy)
    }

    /// Run the section batch and keep it as the latest run.
    ///
    /// A failed run clears any previous one.
    pub fn calculate(&mut self, dataset: &ReferenceDataset) -> CalcResult<&SectionRun> {
        self.last_run = None;
        let profile = dataset.profile_for(self.consumer)?;
        let request = self.request();
        let batch = calculate_batch(dataset, profile, &request)?;
        tracing::info!(
            consumer = self.consumer,
            sections = batch.results.len(),
            failures = batch.failures.len(),
            "section calculation finished"
        );
        Ok(&*self.last_run.insert(SectionRun {
            profile: profile.clone(),
            stream: request.stream,
            batch,
        }))
    }

    /// Load input for `fixtures` users with the project's temperatures and
    /// period.
    pub fn load_input(&self, fixtures: f64) -> LoadInput {
        LoadInput::new(fixtures)
            .with_temperatures(self.settings.hot_water_temp_c, self.settings.cold_water_temp_c)
            .with_period(self.settings.period_hours)
    }

    /// Calculate the building load battery with the profile of the last run.
    ///
    /// Requires a prior successful [`Project::calculate`].
    pub fn load_calculation(&self, dataset: &ReferenceDataset, input: &LoadInput) -> CalcResult<AggregateReport> {
        let run = self.last_run.as_ref().ok_or(CalcError::NoPriorCalculation)?;
        calculate_loads(dataset, &run.profile, input)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    fn check_index(&self, index: usize) -> CalcResult<()> {
        if index == 0 || index > self.sections.len() {
            return Err(CalcError::invalid_input(
                "section",
                index.to_string(),
                format!("No such section (1..={})", self.sections.len()),
            ));
        }
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, section) in self.sections.iter_mut().enumerate() {
            section.index = i + 1;
        }
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Building or job name
    pub title: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Session-wide settings. Every field has a default, so a partial TOML or
/// JSON document is enough to override one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Stream calculated for the sections
    pub stream: Stream,

    pub velocity_mode: VelocityMode,

    pub batch_policy: BatchPolicy,

    /// t_h (°C)
    pub hot_water_temp_c: f64,

    /// t_c (°C)
    pub cold_water_temp_c: f64,

    /// T (h)
    pub period_hours: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            stream: Stream::default(),
            velocity_mode: VelocityMode::default(),
            batch_policy: BatchPolicy::default(),
            hot_water_temp_c: DEFAULT_HOT_WATER_C,
            cold_water_temp_c: DEFAULT_COLD_WATER_C,
            period_hours: DEFAULT_PERIOD_H,
        }
    }
}
