// Error types for amq_bench
// amq_bench 错误类型

use std::fmt;

use thiserror::Error;

use crate::{ErrorRate, Structure};

/// Which trial an error was raised in / 出错的试验
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trial {
  /// Speed trial on one fold / 某一折的速度试验
  Fold(usize),
  /// Error-rate sweep trial / 误判率扫描试验
  Sweep { idx: usize, rate: ErrorRate },
}

impl fmt::Display for Trial {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Fold(i) => write!(f, "fold {i}"),
      Self::Sweep { idx, rate } => write!(f, "trial {idx} error_rate {rate}"),
    }
  }
}

#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),

  #[error("unsupported structure: {0}")]
  UnsupportedStructure(String),

  #[error("invalid fold count {k} for dataset of {len} records")]
  InvalidFoldCount { k: usize, len: usize },

  #[error(
    "{structure} rejected reserve on {ns} (capacity={capacity}, error_rate={error_rate:?}): {reason}"
  )]
  ConfigurationRejected {
    structure: Structure,
    ns: String,
    capacity: usize,
    error_rate: Option<f64>,
    reason: &'static str,
  },

  #[error("backend unavailable: {0}")]
  BackendUnavailable(String),

  #[error("dataset line {line}: {reason}")]
  DatasetLoad { line: usize, reason: String },

  #[error("{structure} {trial}: {source}")]
  Trial {
    structure: Structure,
    trial: Trial,
    #[source]
    source: Box<Error>,
  },

  #[error("Histogram error: {0}")]
  Histogram(#[from] hdrhistogram::CreationError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] sonic_rs::Error),
}

impl Error {
  /// Attach trial context / 附加试验上下文
  pub fn at(self, structure: Structure, trial: Trial) -> Self {
    Self::Trial {
      structure,
      trial,
      source: Box::new(self),
    }
  }

  /// Innermost error, unwrapping trial context / 去掉试验上下文后的内层错误
  pub fn root(&self) -> &Error {
    match self {
      Self::Trial { source, .. } => source.root(),
      e => e,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
