// Benchmark configuration
// 基准测试配置

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Columns, Error, ErrorRate, Result, Structure, amq::CUCKOO_FPP, keygen::SEED};

/// Benchmark configuration, every field defaulted / 基准测试配置，所有字段均有默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConf {
  /// Dataset path / 数据集路径
  pub dataset: PathBuf,
  pub rank_col: usize,
  pub url_col: usize,
  /// Extra synthetic keys / 额外合成 key 数
  pub n: usize,
  /// Seed for synthetic keys and query sampling / 合成 key 与查询采样的种子
  pub seed: u64,
  pub exact_set: bool,
  pub bloom: bool,
  pub cuckoo: bool,
  /// Fold count for speed trials / 速度试验折数
  pub folds: usize,
  /// Random probes per fold, five queries each / 每折随机探测次数，每次五个查询
  pub query_samples: usize,
  /// Ordered bloom sweep / 布隆过滤器误判率扫描列表
  pub bloom_error_rates: Vec<f64>,
  /// Bloom reserve capacity, `None` means dataset + n
  /// 布隆预留容量，None 表示数据集大小加 n
  pub bloom_capacity: Option<usize>,
  /// Cuckoo reserve capacity, `None` means dataset + n
  /// 布谷鸟预留容量，None 表示数据集大小加 n
  pub cuckoo_capacity: Option<usize>,
  /// Bloom target during speed trials / 速度试验中布隆过滤器的目标误判率
  pub speed_error_rate: f64,
  /// Output directory / 输出目录
  pub report_dir: PathBuf,
}

impl Default for BenchConf {
  fn default() -> Self {
    Self {
      dataset: PathBuf::from("majestic_million.csv"),
      rank_col: Columns::default().rank,
      url_col: Columns::default().url,
      n: 0,
      seed: SEED,
      exact_set: true,
      bloom: true,
      cuckoo: true,
      folds: 5,
      query_samples: 10,
      bloom_error_rates: vec![1e-2, 1e-3, 1e-4, 1e-5, 1e-6],
      bloom_capacity: None,
      cuckoo_capacity: None,
      speed_error_rate: 0.01,
      report_dir: PathBuf::from("bench_reports"),
    }
  }
}

fn valid_rate(p: f64) -> bool {
  p > 0.0 && p < 1.0
}

impl BenchConf {
  /// Load from a JSON file / 从 JSON 文件加载
  pub fn load(path: &Path) -> Result<Self> {
    let json = std::fs::read_to_string(path)?;
    Ok(sonic_rs::from_str(&json)?)
  }

  /// Select only the given structures / 只选择给定结构
  pub fn only(mut self, structures: &[Structure]) -> Self {
    self.exact_set = structures.contains(&Structure::ExactSet);
    self.bloom = structures.contains(&Structure::BloomFilter);
    self.cuckoo = structures.contains(&Structure::CuckooFilter);
    self
  }

  pub fn columns(&self) -> Columns {
    Columns {
      rank: self.rank_col,
      url: self.url_col,
    }
  }

  /// Selected structures in fixed order / 按固定顺序返回已选结构
  pub fn selected(&self) -> Result<Vec<Structure>> {
    let list: Vec<Structure> = Structure::ALL
      .into_iter()
      .filter(|s| match s {
        Structure::ExactSet => self.exact_set,
        Structure::BloomFilter => self.bloom,
        Structure::CuckooFilter => self.cuckoo,
      })
      .collect();
    if list.is_empty() {
      return Err(Error::InvalidConfiguration(
        "at least one structure must be selected".into(),
      ));
    }
    Ok(list)
  }

  /// Check everything that does not need the dataset / 校验不依赖数据集的配置
  pub fn validate(&self) -> Result<Vec<Structure>> {
    let selected = self.selected()?;
    if self.bloom {
      if self.bloom_error_rates.is_empty() {
        return Err(Error::InvalidConfiguration("bloom_error_rates is empty".into()));
      }
      if let Some(p) = self.bloom_error_rates.iter().find(|p| !valid_rate(**p)) {
        return Err(Error::InvalidConfiguration(format!(
          "bloom error rate {p} not in (0, 1)"
        )));
      }
      if !valid_rate(self.speed_error_rate) {
        return Err(Error::InvalidConfiguration(format!(
          "speed_error_rate {} not in (0, 1)",
          self.speed_error_rate
        )));
      }
    }
    Ok(selected)
  }

  /// Error budgets swept for one structure / 某结构的误判率扫描列表
  pub fn sweep(&self, s: Structure) -> Vec<ErrorRate> {
    match s {
      Structure::ExactSet => vec![ErrorRate::Exact],
      Structure::BloomFilter => self
        .bloom_error_rates
        .iter()
        .map(|&p| ErrorRate::Target(p))
        .collect(),
      Structure::CuckooFilter => vec![ErrorRate::Approx(CUCKOO_FPP)],
    }
  }

  /// Reserve capacity for a sweep trial / 扫描试验的预留容量
  pub fn capacity(&self, s: Structure, total_keys: usize) -> Option<usize> {
    match s {
      Structure::ExactSet => None,
      Structure::BloomFilter => Some(self.bloom_capacity.unwrap_or(total_keys)),
      Structure::CuckooFilter => Some(self.cuckoo_capacity.unwrap_or(total_keys)),
    }
  }
}
