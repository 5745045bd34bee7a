use std::path::{Path, PathBuf};

use crate::data::arrange::{project, sort_rows, SortOrder};
use crate::data::export;
use crate::data::filter::{filtered_indices, Condition, FilterInput, FilterSet};
use crate::data::format::Format;
use crate::data::loader;
use crate::data::model::{Dataset, Record};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// A loaded dataset together with its live filters.
#[derive(Debug, Clone)]
pub struct ActiveDataset {
    /// The row store and its schema.
    pub dataset: Dataset,

    /// One filter per column.
    pub filters: FilterSet,

    /// Indices of rows passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Where the dataset came from, if it was read from a file.
    pub source: Option<PathBuf>,
}

impl ActiveDataset {
    fn new(dataset: Dataset, source: Option<PathBuf>) -> Self {
        let filters = FilterSet::for_dataset(&dataset);
        let visible_indices = (0..dataset.len()).collect();
        ActiveDataset {
            dataset,
            filters,
            visible_indices,
            source,
        }
    }

    /// Rows passing the current filters, in row-store order.
    pub fn visible_rows(&self) -> Vec<&Record> {
        self.visible_indices
            .iter()
            .map(|&i| &self.dataset.records[i])
            .collect()
    }
}

/// Output shaping applied on export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputOptions {
    /// Sort the visible rows by this column; `None` keeps row-store order.
    pub sort: Option<SortOrder>,
    /// Keep only these fields; `None` keeps every field.
    pub columns: Option<Vec<String>>,
}

/// Everything the front end works against, independent of rendering.
///
/// Holds at most one dataset. A load builds the new dataset and its filters
/// completely before swapping them in, so a failed load leaves the previous
/// state untouched.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<ActiveDataset>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `.json` or `.csv` file, replacing the current dataset.
    pub fn load_file(&mut self, path: &Path) -> Result<&ActiveDataset> {
        let dataset = loader::load_file(path)?;
        log::info!(
            "Loaded {} rows with columns {:?} from {}",
            dataset.len(),
            dataset.column_names,
            path.display()
        );
        Ok(self.install(ActiveDataset::new(dataset, Some(path.to_path_buf()))))
    }

    /// Load raw bytes of a declared format, replacing the current dataset.
    pub fn load_bytes(&mut self, bytes: &[u8], format: Format) -> Result<&ActiveDataset> {
        let dataset = loader::load_bytes(bytes, format)?;
        log::info!(
            "Loaded {} rows with columns {:?}",
            dataset.len(),
            dataset.column_names
        );
        Ok(self.install(ActiveDataset::new(dataset, None)))
    }

    /// Ingest an already built dataset and initialise its filters.
    pub fn set_dataset(&mut self, dataset: Dataset) -> &ActiveDataset {
        self.install(ActiveDataset::new(dataset, None))
    }

    fn install(&mut self, active: ActiveDataset) -> &ActiveDataset {
        self.active.insert(active)
    }

    pub fn active(&self) -> Option<&ActiveDataset> {
        self.active.as_ref()
    }

    fn active_or_err(&self) -> Result<&ActiveDataset> {
        self.active.as_ref().ok_or(SieveError::NoDataset)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.active.as_ref().map(|a| &a.dataset)
    }

    pub fn filters(&self) -> Option<&FilterSet> {
        self.active.as_ref().map(|a| &a.filters)
    }

    /// Total rows in the loaded dataset.
    pub fn total_count(&self) -> usize {
        self.dataset().map_or(0, Dataset::len)
    }

    /// Rows passing the current filters.
    pub fn visible_count(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.visible_indices.len())
    }

    /// Change one column's filter and recompute the visible rows.
    ///
    /// If the new filter cannot be evaluated the change is rolled back and the
    /// previous result stays in place. Returns the new visible count.
    pub fn update_filter(
        &mut self,
        column: &str,
        condition: Condition,
        input: FilterInput,
    ) -> Result<usize> {
        let active = self.active.as_mut().ok_or(SieveError::NoDataset)?;
        let previous = active.filters.clone();

        active.filters.update(column, condition, input)?;
        match filtered_indices(&active.dataset, &active.filters) {
            Ok(visible) => {
                active.visible_indices = visible;
                Ok(active.visible_indices.len())
            }
            Err(e) => {
                active.filters = previous;
                Err(e)
            }
        }
    }

    /// Reset every filter to `any`; all rows become visible again.
    pub fn clear_filters(&mut self) -> Result<usize> {
        let active = self.active.as_mut().ok_or(SieveError::NoDataset)?;
        active.filters.clear();
        active.visible_indices = (0..active.dataset.len()).collect();
        Ok(active.visible_indices.len())
    }

    /// Recompute `visible_indices` from scratch.
    pub fn refilter(&mut self) -> Result<usize> {
        let active = self.active.as_mut().ok_or(SieveError::NoDataset)?;
        active.visible_indices = filtered_indices(&active.dataset, &active.filters)?;
        Ok(active.visible_indices.len())
    }

    /// Visible rows, sorted and projected per `options`.
    pub fn output(&self, options: &OutputOptions) -> Result<Vec<Record>> {
        let active = self.active_or_err()?;
        let mut rows = active.visible_rows();
        sort_rows(&active.dataset, &mut rows, options.sort.as_ref())?;

        match &options.columns {
            Some(columns) => {
                check_columns(&active.dataset, columns)?;
                Ok(project(rows, columns))
            }
            None => Ok(rows.into_iter().cloned().collect()),
        }
    }

    /// Serialize the shaped result in `format`.
    pub fn export(&self, format: Format, options: &OutputOptions) -> Result<Vec<u8>> {
        export::export(&self.output(options)?, format)
    }

    /// Write the shaped result to `path`, format by extension. Returns the
    /// number of rows written.
    pub fn save(&self, path: &Path, options: &OutputOptions) -> Result<usize> {
        let format = Format::from_path(path)?;
        let rows = self.output(options)?;
        std::fs::write(path, export::export(&rows, format)?)?;
        log::info!("Exported {} rows to {}", rows.len(), path.display());
        Ok(rows.len())
    }
}

fn check_columns(dataset: &Dataset, columns: &[String]) -> Result<()> {
    match columns.iter().find(|c| !dataset.column_names.contains(c)) {
        Some(missing) => Err(SieveError::UnknownColumn {
            column: missing.clone(),
        }),
        None => Ok(()),
    }
}
