// Cuckoo filter adapter
// 布谷鸟过滤器适配器

use std::collections::hash_map::DefaultHasher;

use log::{debug, warn};

use super::{Amq, Structure, check_reserve, spaces::Spaces};
use crate::{Error, Result};

type Filter = cuckoofilter::CuckooFilter<DefaultHasher>;

/// Approximate false positive rate of 8-bit fingerprints in 4-slot buckets
/// 8 位指纹、每桶 4 槽时的近似误判率
pub const CUCKOO_FPP: f64 = 0.03;

/// Capacity used when inserting into an unreserved namespace
/// 未预留命名空间插入时使用的容量
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// Highest load factor a reserved filter is sized for. Cuckoo inserts start
/// failing as buckets approach full.
/// 预留时按此最大装载率分配槽位，桶接近满时插入会失败
const MAX_LOAD_PERCENT: usize = 90;

struct Slot {
  filter: Filter,
  /// Inserts refused for lack of space / 因空间不足被拒绝的插入
  full: u64,
}

impl Slot {
  /// Room for `capacity` keys / 可容纳 capacity 个 key
  fn new(capacity: usize) -> Self {
    let slots = capacity.saturating_mul(100).div_ceil(MAX_LOAD_PERCENT);
    Self {
      filter: Filter::with_capacity(slots),
      full: 0,
    }
  }

  fn insert(&mut self, ns: &str, key: &str) -> bool {
    match self.filter.test_and_add(key) {
      Ok(added) => added,
      Err(e) => {
        if self.full == 0 {
          warn!("{ns}: {e:?}, filter is full and may have evicted a key");
        }
        self.full += 1;
        false
      }
    }
  }
}

/// Cuckoo filter adapter. Its error rate is fixed by the fingerprint size,
/// only the capacity can be tuned.
/// 布谷鸟过滤器适配器，误判率由指纹长度固定，只能调整容量
#[derive(Default)]
pub struct CuckooFilter {
  spaces: Spaces<Slot>,
}

impl CuckooFilter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts refused for lack of space in `ns` / ns 中因空间不足被拒绝的插入数
  pub fn full_count(&self, ns: &str) -> u64 {
    self.spaces.get(ns).map_or(0, |s| s.full)
  }
}

impl Amq for CuckooFilter {
  fn structure(&self) -> Structure {
    Structure::CuckooFilter
  }

  async fn insert(&mut self, ns: &str, key: &str) -> Result<bool> {
    Ok(
      self
        .spaces
        .with(ns, || Slot::new(DEFAULT_CAPACITY), |s| s.insert(ns, key)),
    )
  }

  async fn exists(&mut self, ns: &str, key: &str) -> Result<bool> {
    Ok(self.spaces.get(ns).is_some_and(|s| s.filter.contains(key)))
  }

  async fn memory_usage(&mut self, ns: &str) -> Result<u64> {
    Ok(
      self
        .spaces
        .get(ns)
        .map_or(0, |s| s.filter.memory_usage() as u64),
    )
  }

  /// The error rate is validated, then ignored / 误判率只做校验，不生效
  async fn reserve(&mut self, ns: &str, capacity: usize, error_rate: Option<f64>) -> Result<()> {
    check_reserve(Structure::CuckooFilter, ns, capacity, error_rate)?;
    if !self.spaces.create(ns, Slot::new(capacity)) {
      return Err(Error::ConfigurationRejected {
        structure: Structure::CuckooFilter,
        ns: ns.to_owned(),
        capacity,
        error_rate,
        reason: "namespace already exists",
      });
    }
    debug!("{ns}: reserve {capacity}");
    Ok(())
  }

  async fn flush(&mut self) -> Result<()> {
    debug!("cuckoo_filter: flush {} namespaces", self.spaces.len());
    self.spaces.clear();
    Ok(())
  }
}
