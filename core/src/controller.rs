//! Run controller: list, walk, then report or commit.
//!
//! Report and commit runs share [`RunController::run_family`]; the only
//! difference is the [`ChangeSink`] a changed resource is handed to. Both
//! modes therefore agree by construction on which resources changed.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::api::ResourceApi;
use crate::config::{RunConfig, RunMode, Selection};
use crate::errors::Result;
use crate::family::{Family, ResourceRef};
use crate::mapping::TagMapping;

/// What happened to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Unchanged,
    /// Would change; report mode only.
    Reported,
    /// Changed and written back.
    Committed,
    /// Processing failed; the rest of the batch continued.
    Failed { category: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub id: String,
    pub changed: bool,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ChangeRecord {
    fn new(id: String, outcome: Outcome) -> Self {
        let changed = matches!(outcome, Outcome::Reported | Outcome::Committed);
        Self {
            id,
            changed,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    pub family: Family,
    /// The run config's list for this family was empty.
    pub skipped: bool,
    pub records: Vec<ChangeRecord>,
    /// Allow-listed ids that the listing did not return.
    pub missing: Vec<String>,
}

impl FamilyReport {
    fn skipped(family: Family) -> Self {
        Self {
            family,
            skipped: true,
            records: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Ids of resources that changed, in processing order.
    pub fn changed_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.changed)
            .map(|r| r.id.as_str())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub families: Vec<FamilyReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.families.iter().any(|f| f.failures().next().is_some())
    }

    pub fn family(&self, family: Family) -> Option<&FamilyReport> {
        self.families.iter().find(|f| f.family == family)
    }
}

/// Receives every resource whose walk changed something.
#[async_trait]
pub trait ChangeSink: Send {
    async fn accept(
        &mut self,
        family: Family,
        resource: &ResourceRef,
        detail_path: &str,
        config: Value,
    ) -> Result<Outcome>;
}

/// Records changes without touching the API.
#[derive(Debug, Default)]
pub struct ReportSink;

#[async_trait]
impl ChangeSink for ReportSink {
    async fn accept(
        &mut self,
        family: Family,
        resource: &ResourceRef,
        _detail_path: &str,
        _config: Value,
    ) -> Result<Outcome> {
        tracing::debug!(%family, id = %resource.id, "would update");
        Ok(Outcome::Reported)
    }
}

/// Strips server-managed fields and writes the config back.
pub struct CommitSink<'a> {
    api: &'a dyn ResourceApi,
}

impl<'a> CommitSink<'a> {
    pub fn new(api: &'a dyn ResourceApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChangeSink for CommitSink<'_> {
    async fn accept(
        &mut self,
        family: Family,
        resource: &ResourceRef,
        detail_path: &str,
        mut config: Value,
    ) -> Result<Outcome> {
        family.strip_extraneous(&mut config);
        self.api.put(detail_path, &config).await?;
        tracing::info!(%family, id = %resource.id, "updated");
        Ok(Outcome::Committed)
    }
}

pub struct RunController<'a> {
    api: &'a dyn ResourceApi,
    mapping: TagMapping,
    mode: RunMode,
    strict: bool,
}

impl<'a> RunController<'a> {
    pub fn new(api: &'a dyn ResourceApi, mapping: TagMapping, mode: RunMode) -> Self {
        Self {
            api,
            mapping,
            mode,
            strict: false,
        }
    }

    /// Abort on the first resource failure instead of recording it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn sink(&self) -> Box<dyn ChangeSink + 'a> {
        match self.mode {
            RunMode::Report => Box::new(ReportSink),
            RunMode::Commit => Box::new(CommitSink::new(self.api)),
        }
    }

    /// Processes every family in order with the selections from `config`.
    pub async fn run(&self, config: &RunConfig) -> Result<RunReport> {
        let mut sink = self.sink();
        let mut families = Vec::with_capacity(Family::ALL.len());
        for family in Family::ALL {
            let report = self
                .run_family(family, config.selection(family), sink.as_mut())
                .await?;
            families.push(report);
        }
        Ok(RunReport {
            mode: self.mode,
            families,
        })
    }

    /// Lists, walks and hands changed resources of one family to `sink`.
    ///
    /// A failing listing call always aborts. Per-resource failures abort only
    /// in strict mode; otherwise they become [`Outcome::Failed`] records.
    pub async fn run_family(
        &self,
        family: Family,
        selection: &Selection,
        sink: &mut dyn ChangeSink,
    ) -> Result<FamilyReport> {
        if *selection == Selection::Skip {
            tracing::info!(%family, "ignoring {family} due to empty {family} list in run config");
            return Ok(FamilyReport::skipped(family));
        }

        let listing = self.api.get(family.list_path()).await?;
        let resources = family.parse_listing(listing)?;
        tracing::debug!(%family, count = resources.len(), "listed resources");

        let mut records = Vec::new();
        for resource in resources.iter().filter(|r| selection.includes(&r.id)) {
            let processed = self
                .process(family, resource, sink)
                .await
                .map_err(|e| e.in_resource(format_args!("{} {}", family.noun(), resource.id)));
            match processed {
                Ok(outcome) => records.push(ChangeRecord::new(resource.id.clone(), outcome)),
                Err(err) if self.strict || !err.category().resource_scoped() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        %family,
                        id = %resource.id,
                        category = %err.category(),
                        error = %err,
                        "resource failed, continuing"
                    );
                    records.push(ChangeRecord::new(
                        resource.id.clone(),
                        Outcome::Failed {
                            category: err.category().as_str().to_string(),
                            error: err.to_string(),
                        },
                    ));
                }
            }
        }

        let missing = match selection {
            Selection::Only(ids) => ids
                .iter()
                .filter(|id| !resources.iter().any(|r| &r.id == *id))
                .cloned()
                .collect(),
            Selection::All | Selection::Skip => Vec::new(),
        };
        for id in &missing {
            tracing::warn!(%family, %id, "requested id not returned by the listing");
        }

        let report = FamilyReport {
            family,
            skipped: false,
            records,
            missing,
        };
        tracing::info!(
            %family,
            mode = %self.mode,
            processed = report.records.len(),
            changed = report.changed_ids().len(),
            failed = report.failures().count(),
            "family done"
        );
        Ok(report)
    }

    async fn process(
        &self,
        family: Family,
        resource: &ResourceRef,
        sink: &mut dyn ChangeSink,
    ) -> Result<Outcome> {
        let detail_path = family.detail_path(resource)?;
        let mut config = family.fetch(self.api, resource, &detail_path).await?;
        let changed = family.walker().walk(&mut config, &self.mapping)?;
        if !changed {
            tracing::debug!(%family, id = %resource.id, "no tags to replace");
            return Ok(Outcome::Unchanged);
        }
        sink.accept(family, resource, &detail_path, config).await
    }
}
