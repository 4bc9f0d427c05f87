// Bloom filter adapter
// 布隆过滤器适配器

use std::mem::size_of;

use bloomfilter::Bloom;
use log::debug;

use super::{Amq, Structure, check_reserve, spaces::Spaces};
use crate::{Error, Result};

/// Capacity used when inserting into an unreserved namespace
/// 未预留命名空间插入时使用的容量
pub const DEFAULT_CAPACITY: usize = 100;

/// Error rate used when inserting into an unreserved namespace
/// 未预留命名空间插入时使用的误判率
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Largest bitmap a reserve may ask for, 8 GiB / 预留允许的最大位图，8 GiB
pub const MAX_BITS: f64 = (1u64 << 36) as f64;

/// Bits a filter of `capacity` keys at `error_rate` needs / 给定容量与误判率所需位数
fn bits_for(capacity: usize, error_rate: f64) -> f64 {
  -(capacity as f64) * error_rate.ln() / (std::f64::consts::LN_2 * std::f64::consts::LN_2)
}

fn new_bloom(capacity: usize, error_rate: f64) -> Bloom<str> {
  Bloom::new_for_fp_rate(capacity, error_rate)
}

fn bloom_bytes(b: &Bloom<str>) -> u64 {
  b.number_of_bits().div_ceil(8) + size_of::<Bloom<str>>() as u64
}

/// Bloom filter adapter with tunable capacity and error rate
/// 可调容量与误判率的布隆过滤器适配器
#[derive(Default)]
pub struct BloomFilter {
  spaces: Spaces<Bloom<str>>,
}

impl BloomFilter {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Amq for BloomFilter {
  fn structure(&self) -> Structure {
    Structure::BloomFilter
  }

  async fn insert(&mut self, ns: &str, key: &str) -> Result<bool> {
    // check_and_set reports whether every bit was already set
    let present = self.spaces.with(
      ns,
      || new_bloom(DEFAULT_CAPACITY, DEFAULT_ERROR_RATE),
      |b| b.check_and_set(key),
    );
    Ok(!present)
  }

  async fn exists(&mut self, ns: &str, key: &str) -> Result<bool> {
    Ok(self.spaces.get(ns).is_some_and(|b| b.check(key)))
  }

  async fn memory_usage(&mut self, ns: &str) -> Result<u64> {
    Ok(self.spaces.get(ns).map_or(0, bloom_bytes))
  }

  async fn reserve(&mut self, ns: &str, capacity: usize, error_rate: Option<f64>) -> Result<()> {
    check_reserve(Structure::BloomFilter, ns, capacity, error_rate)?;
    let rate = error_rate.unwrap_or(DEFAULT_ERROR_RATE);
    let rejected = |reason| Error::ConfigurationRejected {
      structure: Structure::BloomFilter,
      ns: ns.to_owned(),
      capacity,
      error_rate,
      reason,
    };
    // checked before allocating: the bitmap is built eagerly
    if bits_for(capacity, rate) > MAX_BITS {
      return Err(rejected("bitmap too large"));
    }
    if !self.spaces.create(ns, new_bloom(capacity, rate)) {
      return Err(rejected("namespace already exists"));
    }
    debug!("{ns}: reserve {capacity} at {rate}");
    Ok(())
  }

  async fn flush(&mut self) -> Result<()> {
    debug!("bloom_filter: flush {} namespaces", self.spaces.len());
    self.spaces.clear();
    Ok(())
  }
}
