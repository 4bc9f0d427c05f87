// Enum dispatch over the in-process adapters
// 进程内适配器的枚举分发

use super::{Amq, BloomFilter, CuckooFilter, ExactSet, Structure};
use crate::Result;

/// Any in-process adapter, chosen at runtime / 运行时选择的进程内适配器
pub enum AnyAmq {
  Exact(ExactSet),
  Bloom(BloomFilter),
  Cuckoo(CuckooFilter),
}

impl AnyAmq {
  /// Open an adapter by variant name / 按名称打开适配器
  pub fn open(name: &str) -> Result<Self> {
    Ok(Self::from(name.parse::<Structure>()?))
  }
}

impl From<Structure> for AnyAmq {
  fn from(s: Structure) -> Self {
    match s {
      Structure::ExactSet => Self::Exact(ExactSet::new()),
      Structure::BloomFilter => Self::Bloom(BloomFilter::new()),
      Structure::CuckooFilter => Self::Cuckoo(CuckooFilter::new()),
    }
  }
}

macro_rules! dispatch {
  ($self:ident, $a:ident => $e:expr) => {
    match $self {
      AnyAmq::Exact($a) => $e,
      AnyAmq::Bloom($a) => $e,
      AnyAmq::Cuckoo($a) => $e,
    }
  };
}

impl Amq for AnyAmq {
  fn structure(&self) -> Structure {
    dispatch!(self, a => a.structure())
  }

  async fn insert(&mut self, ns: &str, key: &str) -> Result<bool> {
    dispatch!(self, a => a.insert(ns, key).await)
  }

  async fn exists(&mut self, ns: &str, key: &str) -> Result<bool> {
    dispatch!(self, a => a.exists(ns, key).await)
  }

  async fn memory_usage(&mut self, ns: &str) -> Result<u64> {
    dispatch!(self, a => a.memory_usage(ns).await)
  }

  async fn reserve(&mut self, ns: &str, capacity: usize, error_rate: Option<f64>) -> Result<()> {
    dispatch!(self, a => a.reserve(ns, capacity, error_rate).await)
  }

  async fn flush(&mut self) -> Result<()> {
    dispatch!(self, a => a.flush().await)
  }
}
