//! PyO3 bindings for reach feature computation.
//!
//! Exposes the Rust feature assembler to a Python serving layer:
//! - Request and feature vector types
//! - A feature assembler that owns its loaded history
//! - Batch computation with per-request results

use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;

use std::sync::Arc;

use reach_core::{
    Config as RustConfig,
    Error as RustError,
    FeatureVector as RustFeatureVector,
    RawRequest as RustRawRequest,
};
use reach_features::{FeatureAssembler, HistoryStore};
use reach_ingestion::HistoryReader;

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::MissingField { .. } => PyKeyError::new_err(err.to_string()),
        RustError::Io(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// An impression request with delimited identifier lists.
#[pyclass]
#[derive(Clone)]
pub struct Request {
    #[pyo3(get, set)]
    pub cpm: Option<f64>,
    #[pyo3(get, set)]
    pub hour_start: i64,
    #[pyo3(get, set)]
    pub hour_end: i64,
    #[pyo3(get, set)]
    pub publishers: String,
    #[pyo3(get, set)]
    pub audience_size: i64,
    #[pyo3(get, set)]
    pub user_ids: String,
}

#[pymethods]
impl Request {
    #[new]
    #[pyo3(signature = (hour_start, hour_end, publishers, user_ids, cpm=None, audience_size=0))]
    fn new(
        hour_start: i64,
        hour_end: i64,
        publishers: String,
        user_ids: String,
        cpm: Option<f64>,
        audience_size: i64,
    ) -> Self {
        Request {
            cpm,
            hour_start,
            hour_end,
            publishers,
            audience_size,
            user_ids,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Request(cpm={:?}, hour_start={}, hour_end={}, publishers='{}', user_ids='{}')",
            self.cpm, self.hour_start, self.hour_end, self.publishers, self.user_ids
        )
    }
}

impl From<Request> for RustRawRequest {
    fn from(r: Request) -> Self {
        RustRawRequest {
            cpm: r.cpm,
            hour_start: r.hour_start,
            hour_end: r.hour_end,
            publishers: r.publishers,
            audience_size: r.audience_size,
            user_ids: r.user_ids,
        }
    }
}

/// Feature vector for one request.
#[pyclass]
#[derive(Clone)]
pub struct FeatureVector {
    #[pyo3(get)]
    pub p1: u8,
    #[pyo3(get)]
    pub p2: u8,
    #[pyo3(get)]
    pub delay: i64,
    #[pyo3(get)]
    pub cpm: f64,
    #[pyo3(get)]
    pub remaining_time_to_next_ad: f64,
    #[pyo3(get)]
    pub avg_session_duration: f64,
    #[pyo3(get)]
    pub history_cpm_mean: f64,
    #[pyo3(get)]
    pub adv_shown_freq: f64,
}

impl FeatureVector {
    fn to_rust(&self) -> RustFeatureVector {
        RustFeatureVector {
            p1: self.p1,
            p2: self.p2,
            delay: self.delay,
            cpm: self.cpm,
            remaining_time_to_next_ad: self.remaining_time_to_next_ad,
            avg_session_duration: self.avg_session_duration,
            history_cpm_mean: self.history_cpm_mean,
            adv_shown_freq: self.adv_shown_freq,
        }
    }
}

#[pymethods]
impl FeatureVector {
    /// Feature names in model input order.
    #[staticmethod]
    fn names() -> Vec<&'static str> {
        RustFeatureVector::NAMES.to_vec()
    }

    /// Look up a feature by name.
    fn get(&self, name: &str) -> Option<f64> {
        self.to_rust().get(name)
    }

    /// Features as a numeric row in model input order.
    fn to_model_input(&self) -> Vec<f64> {
        self.to_rust().to_model_input().to_vec()
    }

    fn __repr__(&self) -> String {
        format!(
            "FeatureVector(p1={}, p2={}, delay={}, cpm={}, remaining_time_to_next_ad={:.4}, \
             avg_session_duration={:.4}, history_cpm_mean={:.4}, adv_shown_freq={:.4})",
            self.p1,
            self.p2,
            self.delay,
            self.cpm,
            self.remaining_time_to_next_ad,
            self.avg_session_duration,
            self.history_cpm_mean,
            self.adv_shown_freq
        )
    }
}

impl From<RustFeatureVector> for FeatureVector {
    fn from(f: RustFeatureVector) -> Self {
        FeatureVector {
            p1: f.p1,
            p2: f.p2,
            delay: f.delay,
            cpm: f.cpm,
            remaining_time_to_next_ad: f.remaining_time_to_next_ad,
            avg_session_duration: f.avg_session_duration,
            history_cpm_mean: f.history_cpm_mean,
            adv_shown_freq: f.adv_shown_freq,
        }
    }
}

/// Outcome of one request in a batch.
#[pyclass]
#[derive(Clone)]
pub struct FeatureResult {
    #[pyo3(get)]
    pub features: Option<FeatureVector>,
    #[pyo3(get)]
    pub error: Option<String>,
}

#[pymethods]
impl FeatureResult {
    #[getter]
    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<reach_core::Result<RustFeatureVector>> for FeatureResult {
    fn from(result: reach_core::Result<RustFeatureVector>) -> Self {
        match result {
            Ok(fv) => FeatureResult {
                features: Some(fv.into()),
                error: None,
            },
            Err(e) => FeatureResult {
                features: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Feature assembler over a history table loaded once at construction.
#[pyclass]
pub struct PyFeatureAssembler {
    inner: FeatureAssembler,
}

#[pymethods]
impl PyFeatureAssembler {
    #[new]
    #[pyo3(signature = (history_path, gap_threshold=6, publishers_amount=21, delimiter='\t'))]
    fn new(
        history_path: &str,
        gap_threshold: i64,
        publishers_amount: u32,
        delimiter: char,
    ) -> PyResult<Self> {
        let mut config = RustConfig::default();
        config.session.gap_threshold = gap_threshold;
        config.publishers.publishers_amount = publishers_amount;
        config.input.delimiter = delimiter;
        config.validate().map_err(to_py_err)?;

        let events = HistoryReader::from_config(&config.input)
            .read_path(history_path)
            .map_err(to_py_err)?;
        let history = Arc::new(HistoryStore::new(events));
        Ok(PyFeatureAssembler {
            inner: FeatureAssembler::new(history, &config),
        })
    }

    /// Compute features for one request, raising on failure.
    fn compute(&self, request: Request) -> PyResult<FeatureVector> {
        let raw: RustRawRequest = request.into();
        let parsed = raw.parse().map_err(to_py_err)?;
        self.inner
            .compute(&parsed)
            .map(FeatureVector::from)
            .map_err(to_py_err)
    }

    /// Compute features for a batch, one result per request in input order.
    fn compute_batch(&self, requests: Vec<Request>) -> Vec<FeatureResult> {
        let raw: Vec<RustRawRequest> = requests.into_iter().map(|r| r.into()).collect();
        self.inner
            .compute_raw(&raw)
            .into_iter()
            .map(FeatureResult::from)
            .collect()
    }

    /// Number of history events loaded.
    fn history_len(&self) -> usize {
        self.inner.aggregator().history().len()
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Reach features - Rust feature computation for Python.
#[pymodule]
fn reach_features_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Request>()?;
    m.add_class::<FeatureVector>()?;
    m.add_class::<FeatureResult>()?;

    // Engine classes
    m.add_class::<PyFeatureAssembler>()?;

    Ok(())
}
