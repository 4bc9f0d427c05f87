// Membership structure adapters
// 成员查询结构适配器

mod any;
mod bloom;
mod cuckoo;
mod exact;
mod spaces;

use std::{fmt, future::Future, str::FromStr};

pub use any::AnyAmq;
pub use bloom::BloomFilter;
pub use cuckoo::{CUCKOO_FPP, CuckooFilter};
pub use exact::ExactSet;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest capacity any reserve request may ask for / 预留容量上限
pub const MAX_CAPACITY: usize = 1 << 32;

/// Structure variant under test / 被测结构类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
  ExactSet,
  BloomFilter,
  CuckooFilter,
}

impl Structure {
  pub const ALL: [Structure; 3] = [Self::ExactSet, Self::BloomFilter, Self::CuckooFilter];

  /// Stable name, also the namespace prefix / 稳定名称，兼作命名空间前缀
  pub fn name(self) -> &'static str {
    match self {
      Self::ExactSet => "exact_set",
      Self::BloomFilter => "bloom_filter",
      Self::CuckooFilter => "cuckoo_filter",
    }
  }

  /// Human readable title for reports / 报表标题
  pub fn title(self) -> &'static str {
    match self {
      Self::ExactSet => "Exact Set",
      Self::BloomFilter => "Bloom Filter",
      Self::CuckooFilter => "Cuckoo Filter",
    }
  }
}

impl fmt::Display for Structure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Structure {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "exact_set" | "set" => Ok(Self::ExactSet),
      "bloom_filter" | "bloom" => Ok(Self::BloomFilter),
      "cuckoo_filter" | "cuckoo" => Ok(Self::CuckooFilter),
      _ => Err(Error::UnsupportedStructure(s.to_owned())),
    }
  }
}

/// Error budget a trial runs under / 试验使用的误判率预算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ErrorRate {
  /// No false positives, no parameter / 无误判，无参数
  Exact,
  /// Tunable target rate / 可调目标误判率
  Target(f64),
  /// Fixed approximate rate the structure cannot tune / 结构固有的近似误判率
  Approx(f64),
}

impl ErrorRate {
  /// Rate to pass to `reserve`, if the structure takes one
  /// 传给 reserve 的误判率
  pub fn target(self) -> Option<f64> {
    match self {
      Self::Target(p) => Some(p),
      _ => None,
    }
  }

  /// Expected false positive probability / 预期误判概率
  pub fn expected(self) -> f64 {
    match self {
      Self::Exact => 0.0,
      Self::Target(p) | Self::Approx(p) => p,
    }
  }
}

impl fmt::Display for ErrorRate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Exact => f.write_str("0"),
      Self::Target(p) => write!(f, "{p}"),
      Self::Approx(p) => write!(f, "~{p}"),
    }
  }
}

/// Uniform membership structure interface, every call scoped to a namespace
/// 统一的成员查询结构接口，每次调用都限定在某个命名空间
///
/// Calls are async so a networked backend fits behind the same trait. No
/// Send bound: trials run one call at a time on a single-threaded runtime.
/// 调用为异步，便于网络后端接入；单线程顺序执行，无 Send 约束。
pub trait Amq {
  /// Variant this adapter drives / 适配器对应的结构类型
  fn structure(&self) -> Structure;

  /// Insert key. `true` if newly admitted, `false` if rejected or
  /// (possibly falsely) already present.
  /// 插入 key。新加入返回 true；被拒绝或（可能误判为）已存在返回 false
  fn insert(&mut self, ns: &str, key: &str) -> impl Future<Output = Result<bool>>;

  /// Membership query / 成员查询
  fn exists(&mut self, ns: &str, key: &str) -> impl Future<Output = Result<bool>>;

  /// Bytes used by one namespace, 0 if absent / 命名空间占用字节，不存在时为 0
  fn memory_usage(&mut self, ns: &str) -> impl Future<Output = Result<u64>>;

  /// Pre-size a namespace. Capacity and error rate are independent.
  /// 预分配命名空间，容量与误判率相互独立
  fn reserve(
    &mut self,
    ns: &str,
    capacity: usize,
    error_rate: Option<f64>,
  ) -> impl Future<Output = Result<()>>;

  /// Drop every namespace / 清空所有命名空间
  fn flush(&mut self) -> impl Future<Output = Result<()>>;
}

/// Shared reserve validation / 通用预留参数校验
pub(crate) fn check_reserve(
  structure: Structure,
  ns: &str,
  capacity: usize,
  error_rate: Option<f64>,
) -> Result<()> {
  let reason = if capacity == 0 {
    Some("capacity must be positive")
  } else if capacity > MAX_CAPACITY {
    Some("capacity too large")
  } else {
    match error_rate {
      Some(_) if structure == Structure::ExactSet => Some("exact set takes no error rate"),
      Some(p) if !(p > 0.0 && p < 1.0) => Some("error rate must be in (0, 1)"),
      _ => None,
    }
  };

  match reason {
    None => Ok(()),
    Some(reason) => Err(Error::ConfigurationRejected {
      structure,
      ns: ns.to_owned(),
      capacity,
      error_rate,
      reason,
    }),
  }
}
