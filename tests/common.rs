//! Common test utilities

#![allow(missing_docs)]
#![allow(unreachable_pub)]
#![allow(dead_code)]

use std::sync::{
    Arc, Once,
    atomic::{AtomicUsize, Ordering},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wirebox::{Dispose, error::BoxError};

static TRACING: Once = Once::new();

/// Installs a test subscriber once, filtered by `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Counts how many times it was disposed
#[derive(Debug, Default)]
pub struct Resource {
    pub label: String,
    disposed: AtomicUsize,
}

impl Resource {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), disposed: AtomicUsize::new(0) }
    }

    pub fn disposals(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Dispose for Resource {
    fn dispose(&self) -> Result<(), BoxError> {
        self.disposed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails every disposal
#[derive(Debug, Default)]
pub struct Faulty;

impl Dispose for Faulty {
    fn dispose(&self) -> Result<(), BoxError> {
        Err("connection reset".into())
    }
}

/// Shared counter of factory invocations
#[derive(Debug, Default, Clone)]
pub struct Builds(Arc<AtomicUsize>);

impl Builds {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
