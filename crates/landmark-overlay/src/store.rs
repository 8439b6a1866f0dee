//! Feature store
//!
//! Two independently loaded layers. Each load replaces its layer
//! wholesale; the primary layer is required and its failures
//! propagate, the secondary layer is optional and degrades to empty.
//!
//! Layers are shared as `Rc<[Feature]>` snapshots, so a render holds
//! its own handle on whatever was committed when it started.

use crate::feature::{Feature, FeatureCollection};
use landmark_net::{FetchError, ResourceFetcher};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Layer loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load GeoJSON: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse GeoJSON from {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Primary and secondary feature layers
#[derive(Debug)]
pub struct FeatureStore {
    primary: RefCell<Rc<[Feature]>>,
    secondary: RefCell<Rc<[Feature]>>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self {
            primary: RefCell::new(Rc::from(Vec::new())),
            secondary: RefCell::new(Rc::from(Vec::new())),
        }
    }

    /// Load the primary layer, replacing it on success
    pub async fn load_primary<F: ResourceFetcher>(
        &self,
        fetcher: &F,
        location: &str,
    ) -> Result<usize, LoadError> {
        let collection = fetch_collection(fetcher, location).await?;
        let count = collection.len();
        self.replace_primary(collection);
        info!("Loaded {} primary features from {}", count, location);
        Ok(count)
    }

    /// Load the secondary layer. Failures are logged and leave the
    /// layer empty.
    pub async fn load_secondary<F: ResourceFetcher>(&self, fetcher: &F, location: &str) -> usize {
        match fetch_collection(fetcher, location).await {
            Ok(collection) => {
                let count = collection.len();
                self.replace_secondary(collection);
                info!("Loaded {} secondary features from {}", count, location);
                count
            }
            Err(e) => {
                warn!("Unable to load secondary layer: {}", e);
                self.replace_secondary(FeatureCollection::new());
                0
            }
        }
    }

    pub fn replace_primary(&self, collection: FeatureCollection) {
        *self.primary.borrow_mut() = Rc::from(collection.into_features());
    }

    pub fn replace_secondary(&self, collection: FeatureCollection) {
        *self.secondary.borrow_mut() = Rc::from(collection.into_features());
    }

    pub fn primary_len(&self) -> usize {
        self.primary.borrow().len()
    }

    pub fn secondary_len(&self) -> usize {
        self.secondary.borrow().len()
    }

    /// Primary features, followed by secondary ones when included
    pub fn active_features(&self, include_secondary: bool) -> ActiveFeatures {
        let secondary = self.secondary.borrow();
        ActiveFeatures {
            primary: Rc::clone(&self.primary.borrow()),
            secondary: (include_secondary && !secondary.is_empty()).then(|| Rc::clone(&secondary)),
        }
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_collection<F: ResourceFetcher>(
    fetcher: &F,
    location: &str,
) -> Result<FeatureCollection, LoadError> {
    let body = fetcher.fetch(location).await?;
    debug!("Parsing {} bytes from {}", body.len(), location);
    FeatureCollection::from_slice(&body).map_err(|source| LoadError::Parse {
        location: location.to_string(),
        source,
    })
}

/// Snapshot of the features a render pass draws
#[derive(Debug, Clone)]
pub struct ActiveFeatures {
    primary: Rc<[Feature]>,
    secondary: Option<Rc<[Feature]>>,
}

impl ActiveFeatures {
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.primary
            .iter()
            .chain(self.secondary.iter().flat_map(|layer| layer.iter()))
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.as_ref().map_or(0, |layer| layer.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
