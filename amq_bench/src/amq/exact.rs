// Exact set adapter
// 精确集合适配器

use std::{collections::HashSet, mem::size_of};

use log::debug;

use super::{Amq, Structure, check_reserve, spaces::Spaces};
use crate::Result;

#[derive(Default)]
struct Keys {
  set: HashSet<String>,
  key_bytes: u64,
}

impl Keys {
  fn insert(&mut self, key: &str) -> bool {
    if self.set.contains(key) {
      return false;
    }
    self.key_bytes += key.len() as u64;
    self.set.insert(key.to_owned())
  }

  /// Bucket array (entry + control byte) plus key heap bytes
  /// 桶数组（条目 + 控制字节）加上 key 堆内存
  fn memory(&self) -> u64 {
    (self.set.capacity() * (size_of::<String>() + 1)) as u64 + self.key_bytes
  }
}

/// Hash set backed adapter, no false positives or negatives
/// 基于哈希集合的适配器，无误判也无漏判
#[derive(Default)]
pub struct ExactSet {
  spaces: Spaces<Keys>,
}

impl ExactSet {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Amq for ExactSet {
  fn structure(&self) -> Structure {
    Structure::ExactSet
  }

  async fn insert(&mut self, ns: &str, key: &str) -> Result<bool> {
    Ok(self.spaces.with(ns, Keys::default, |k| k.insert(key)))
  }

  async fn exists(&mut self, ns: &str, key: &str) -> Result<bool> {
    Ok(self.spaces.get(ns).is_some_and(|k| k.set.contains(key)))
  }

  async fn memory_usage(&mut self, ns: &str) -> Result<u64> {
    Ok(self.spaces.get(ns).map_or(0, Keys::memory))
  }

  async fn reserve(&mut self, ns: &str, capacity: usize, error_rate: Option<f64>) -> Result<()> {
    check_reserve(Structure::ExactSet, ns, capacity, error_rate)?;
    debug!("{ns}: reserve {capacity}");
    self.spaces.with(ns, Keys::default, |k| k.set.reserve(capacity));
    Ok(())
  }

  async fn flush(&mut self) -> Result<()> {
    debug!("exact_set: flush {} namespaces", self.spaces.len());
    self.spaces.clear();
    Ok(())
  }
}
