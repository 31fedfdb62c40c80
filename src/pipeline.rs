//! Single entry point from control values to a render-ready dashboard.
//!
//! Each request starts at `Idle` and ends in one of `Ready`, `NotFoundError`
//! or `SchemaError`. Nothing is carried between requests.

use crate::config::AppConfig;
use crate::data;
use crate::error::DashboardError;
use crate::processing;
use crate::projection::{self, HoverField, TableRow};
use crate::render::{self, Figure};
use crate::schema;
use crate::types::FilterSelection;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Resolving,
    Validating,
    Transforming,
    Ready,
    NotFoundError,
    SchemaError,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Ready | PipelineState::NotFoundError | PipelineState::SchemaError
        )
    }

    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, Validating)
                | (Resolving, NotFoundError)
                | (Validating, Transforming)
                | (Validating, SchemaError)
                | (Transforming, Ready)
        )
    }
}

/// Control values supplied by the rendering layer.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardRequest {
    #[serde(flatten)]
    pub selection: FilterSelection,
    pub hover_fields: Vec<HoverField>,
    #[serde(default)]
    pub selected_rows: BTreeSet<i64>,
}

impl DashboardRequest {
    pub fn new(selection: FilterSelection, hover_fields: Vec<HoverField>) -> Self {
        Self {
            selection,
            hover_fields,
            selected_rows: BTreeSet::new(),
        }
    }

    pub fn with_selected_rows(mut self, rows: impl IntoIterator<Item = i64>) -> Self {
        self.selected_rows = rows.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdatingNote {
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardUpdate {
    pub state: PipelineState,
    pub figure: Figure,
    pub table: Vec<TableRow>,
    pub updating_note: UpdatingNote,
}

impl DashboardUpdate {
    fn empty(state: PipelineState, error: &DashboardError) -> Self {
        DashboardUpdate {
            state,
            figure: Figure::empty(error.diagnostic_title()),
            table: Vec::new(),
            updating_note: UpdatingNote {
                visible: error.updating_note_visible(),
            },
        }
    }
}

struct Run {
    state: PipelineState,
}

impl Run {
    fn advance(&mut self, next: PipelineState) -> Result<()> {
        ensure!(
            self.state.can_advance_to(next),
            "Invalid pipeline transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Pipeline transition");
        self.state = next;
        Ok(())
    }

    fn finish(&self) -> PipelineState {
        debug_assert!(self.state.is_terminal(), "Pipeline stopped in {:?}", self.state);
        self.state
    }
}

/// Recognized failures come back as an empty dashboard; I/O and parse
/// failures are returned as errors.
pub fn run(config: &AppConfig, request: &DashboardRequest) -> Result<DashboardUpdate> {
    let mut run = Run {
        state: PipelineState::Idle,
    };

    run.advance(PipelineState::Resolving)?;
    let handle = match data::resolve(
        &config.input.dataset_dir,
        &config.input.extension,
        &request.selection,
    ) {
        Ok(handle) => handle,
        Err(err) => {
            run.advance(PipelineState::NotFoundError)?;
            debug!(error = %err, "Dataset not found");
            return Ok(DashboardUpdate::empty(run.finish(), &err));
        }
    };
    let dataset = data::load_dataset(&handle)?;

    run.advance(PipelineState::Validating)?;
    if let Err(err) = schema::validate(&dataset) {
        run.advance(PipelineState::SchemaError)?;
        debug!(file = %dataset.filename, ?err, "Dataset rejected");
        return Ok(DashboardUpdate::empty(run.finish(), &err));
    }

    run.advance(PipelineState::Transforming)?;
    let rows = processing::transform_all(&dataset.records, config.display.wrap_width);
    let projection = projection::project(&rows, &request.hover_fields);
    let line_widths = render::highlight(dataset.records.len(), &request.selected_rows);
    let figure = render::choropleth_figure(
        &dataset.records,
        &rows,
        projection.hover_text,
        line_widths,
    );

    run.advance(PipelineState::Ready)?;
    Ok(DashboardUpdate {
        state: run.finish(),
        figure,
        table: projection.table,
        updating_note: UpdatingNote { visible: false },
    })
}
