// Per-trial measurement types
// 单次试验的测量结果类型

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ErrorRate, LatencyStats, Structure};

/// One speed trial: a structure on one fold
/// 一次速度试验：某结构在某一折上的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeedResult {
  pub structure: Structure,
  /// Held out fold / 保留折序号
  pub fold: usize,
  /// Keys inserted / 插入的 key 数
  pub inserted: u64,
  /// Inserts answered "already present" / 插入时被判为已存在的数量
  pub rejected: u64,
  pub insert_ns: u64,
  pub query_ns: u64,
  /// Queries against the input set / 针对输入集的查询数
  pub input_queries: u64,
  /// Input queries answered present. Below `input_queries` means false negatives.
  /// 输入集查询命中数，小于 input_queries 即存在漏判
  pub input_hits: u64,
  /// Queries against the holdout fold / 针对保留折的查询数
  pub holdout_queries: u64,
  /// Holdout queries answered present: observed false positives
  /// 保留折查询命中数，即观测到的误判
  pub holdout_hits: u64,
  pub latency: LatencyStats,
  pub memory_bytes: u64,
}

impl SpeedResult {
  pub fn insert_time(&self) -> Duration {
    Duration::from_nanos(self.insert_ns)
  }

  pub fn query_time(&self) -> Duration {
    Duration::from_nanos(self.query_ns)
  }

  /// Inserts per second / 每秒插入数
  pub fn insert_throughput(&self) -> f64 {
    per_sec(self.inserted, self.insert_ns)
  }

  /// Observed false positive rate on holdout queries / 保留折上的观测误判率
  pub fn holdout_fpr(&self) -> f64 {
    ratio(self.holdout_hits, self.holdout_queries)
  }
}

/// One error-rate trial: a structure at one error budget
/// 一次误判率试验：某结构在某一误判率预算下的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepResult {
  pub structure: Structure,
  pub error_rate: ErrorRate,
  /// Dataset size plus synthetic keys, constant across a run
  /// 数据集大小加合成 key 数，整轮不变
  pub total_keys: u64,
  /// Inserts reported as newly admitted / 报告为新加入的插入数
  pub success: u64,
  pub elapsed_ns: u64,
  pub memory_bytes: u64,
}

impl SweepResult {
  /// `total_keys - success`. Exact for an exact set, an estimate for filters:
  /// duplicates and false positive suppressions look the same.
  /// 对精确集合是准确值；对过滤器是估计值，重复 key 与误判无法区分
  pub fn collisions(&self) -> u64 {
    self.total_keys.saturating_sub(self.success)
  }

  pub fn collision_rate(&self) -> f64 {
    ratio(self.collisions(), self.total_keys)
  }

  pub fn elapsed(&self) -> Duration {
    Duration::from_nanos(self.elapsed_ns)
  }

  pub fn bits_per_key(&self) -> f64 {
    ratio(self.memory_bytes * 8, self.total_keys)
  }
}

fn ratio(n: u64, d: u64) -> f64 {
  if d == 0 { 0.0 } else { n as f64 / d as f64 }
}

fn per_sec(n: u64, ns: u64) -> f64 {
  if ns == 0 {
    0.0
  } else {
    n as f64 / Duration::from_nanos(ns).as_secs_f64()
  }
}
