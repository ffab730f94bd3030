use crate::{
    error::TransformError,
    transform::enrich::{ContractAwardRules, CreditStatementRules, ProcessedAt},
};
use chrono::NaiveDateTime;
use model::{error::DatasetError, records::dataset::Dataset};
use std::sync::Arc;
use tracing::debug;

/// A whole-dataset rewrite applied after normalization.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, dataset: &mut Dataset) -> Result<(), DatasetError>;
}

pub trait TransformPipelineExt {
    fn add_if<T, F>(self, condition: bool, factory: F) -> Self
    where
        T: Transform + 'static,
        F: FnOnce() -> T;
}

#[derive(Clone)]
pub struct TransformPipeline {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Derived columns for the known API dataset shapes, then `processed_at`.
    pub fn for_api_dataset(dataset: &str, processed_at: NaiveDateTime) -> Self {
        Self::new()
            .add_if(dataset == CreditStatementRules::DATASET, || CreditStatementRules)
            .add_if(dataset == ContractAwardRules::DATASET, || ContractAwardRules)
            .add_transform(ProcessedAt(processed_at))
    }

    pub fn apply(&self, dataset: &mut Dataset) -> Result<(), TransformError> {
        for transform in &self.transforms {
            debug!(dataset = dataset.name(), transform = transform.name(), "Applying transform");
            transform
                .apply(dataset)
                .map_err(|e| TransformError::dataset(dataset.name(), e))?;
        }
        Ok(())
    }

    pub fn add_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl TransformPipelineExt for TransformPipeline {
    fn add_if<T, F>(mut self, condition: bool, factory: F) -> Self
    where
        T: Transform + 'static,
        F: FnOnce() -> T,
    {
        if condition {
            self = self.add_transform(factory());
        }
        self
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
