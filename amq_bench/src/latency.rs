// Per-query latency histogram
// 单次查询延迟直方图

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Longest query we track: 10 seconds in nanoseconds. A remote backend
/// slower than this is reported at the ceiling.
/// 最长记录 10 秒（纳秒），超出按上限记
const MAX_NS: u64 = 10_000_000_000;

/// Significant figures / 有效数字
const SIGFIG: u8 = 3;

/// Query latencies of one speed trial / 一次速度试验的查询延迟
#[derive(Debug, Clone)]
pub struct QueryLatency {
  inner: Histogram<u64>,
}

impl QueryLatency {
  pub fn new() -> Result<Self> {
    Ok(Self {
      inner: Histogram::new_with_bounds(1, MAX_NS, SIGFIG)?,
    })
  }

  /// Record one query, clamped to [1, MAX_NS] / 记录一次查询，截断到 [1, MAX_NS]
  #[inline]
  pub fn record(&mut self, ns: u64) {
    let _ = self.inner.record(ns.clamp(1, MAX_NS));
  }

  /// Snapshot / 快照
  pub fn stats(&self) -> LatencyStats {
    if self.inner.is_empty() {
      return LatencyStats::default();
    }
    let h = &self.inner;
    LatencyStats {
      min: h.min(),
      max: h.max(),
      mean: h.mean(),
      p50: h.value_at_quantile(0.50),
      p99: h.value_at_quantile(0.99),
      count: h.len(),
    }
  }
}

/// Serializable latency snapshot in nanoseconds / 可序列化的延迟快照（纳秒）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LatencyStats {
  pub min: u64,
  pub max: u64,
  pub mean: f64,
  pub p50: u64,
  pub p99: u64,
  pub count: u64,
}
