// Insert / query speed runner
// 插入与查询速度测试

use std::time::Instant;

use humansize::{BINARY, format_size};
use log::info;

use crate::{Amq, Partition, QueryLatency, Result, SpeedResult, Structure, Trial};

/// Input-set queries per probe / 每次探测针对输入集的查询数
pub const INPUT_QUERIES: usize = 4;

/// One random probe: four spread input offsets and one holdout offset
/// 一次随机探测：四个分散的输入集偏移与一个保留折偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
  pub input: [usize; INPUT_QUERIES],
  pub holdout: usize,
}

/// Probes for one fold, shared by every structure so all see the same queries
/// 某一折的探测计划，所有结构共用同一组查询
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
  pub probes: Vec<Probe>,
}

impl QueryPlan {
  /// Draw `count` probes. Base `r` is uniform below both the holdout length
  /// and the input stride, so `r + j * stride` lands in distinct quarters.
  /// 抽取 count 个探测。r 同时小于保留折长度与步长，四个偏移落在不同的四分段
  pub fn draw(rng: &mut fastrand::Rng, part: &Partition<'_>, count: usize) -> Self {
    let input_len = part.input.len();
    let holdout_len = part.holdout.len();
    if input_len == 0 || holdout_len == 0 {
      return Self::default();
    }

    let stride = input_len / INPUT_QUERIES;
    let span = holdout_len.min(stride).max(1);

    let probes = (0..count)
      .map(|_| {
        let r = rng.usize(..span);
        Probe {
          input: std::array::from_fn(|j| (r + j * stride) % input_len),
          holdout: r % holdout_len,
        }
      })
      .collect();

    Self { probes }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.probes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.probes.is_empty()
  }
}

/// Speed runner / 速度测试运行器
#[derive(Debug, Clone)]
pub struct SpeedRunner {
  /// Bloom target while timing / 计时时布隆过滤器的目标误判率
  pub error_rate: f64,
}

impl Default for SpeedRunner {
  fn default() -> Self {
    Self { error_rate: 0.01 }
  }
}

impl SpeedRunner {
  pub fn new(error_rate: f64) -> Self {
    Self { error_rate }
  }

  /// Run one (structure, fold) trial. Errors carry the fold index.
  /// 运行一次（结构，折）试验，错误附带折序号
  pub async fn run<A: Amq>(
    &self,
    amq: &mut A,
    part: &Partition<'_>,
    plan: &QueryPlan,
  ) -> Result<SpeedResult> {
    let structure = amq.structure();
    self
      .trial(amq, part, plan)
      .await
      .map_err(|e| e.at(structure, Trial::Fold(part.fold)))
  }

  async fn trial<A: Amq>(
    &self,
    amq: &mut A,
    part: &Partition<'_>,
    plan: &QueryPlan,
  ) -> Result<SpeedResult> {
    let structure = amq.structure();
    let ns = structure.name();

    amq.flush().await?;
    let capacity = part.input.len().max(1);
    match structure {
      Structure::ExactSet => {}
      Structure::BloomFilter => amq.reserve(ns, capacity, Some(self.error_rate)).await?,
      Structure::CuckooFilter => amq.reserve(ns, capacity, None).await?,
    }

    // Insert phase / 插入阶段
    let mut rejected = 0u64;
    let start = Instant::now();
    for r in &part.input {
      if !amq.insert(ns, &r.url).await? {
        rejected += 1;
      }
    }
    let insert_ns = start.elapsed().as_nanos() as u64;

    // Query phase / 查询阶段
    let mut latency = QueryLatency::new()?;
    let (mut input_hits, mut holdout_hits) = (0u64, 0u64);
    let start = Instant::now();
    for p in &plan.probes {
      for &i in &p.input {
        let t = Instant::now();
        input_hits += u64::from(amq.exists(ns, &part.input[i].url).await?);
        latency.record(t.elapsed().as_nanos() as u64);
      }
      let t = Instant::now();
      holdout_hits += u64::from(amq.exists(ns, &part.holdout[p.holdout].url).await?);
      latency.record(t.elapsed().as_nanos() as u64);
    }
    let query_ns = start.elapsed().as_nanos() as u64;

    let memory_bytes = amq.memory_usage(ns).await?;
    amq.flush().await?;

    let result = SpeedResult {
      structure,
      fold: part.fold,
      inserted: part.input.len() as u64,
      rejected,
      insert_ns,
      query_ns,
      input_queries: (plan.len() * INPUT_QUERIES) as u64,
      input_hits,
      holdout_queries: plan.len() as u64,
      holdout_hits,
      latency: latency.stats(),
      memory_bytes,
    };

    info!(
      "{structure} fold {}: insert {:.2?} ({:.0} ops/s), query {:.2?}, holdout hits {}/{}, mem {}",
      part.fold,
      result.insert_time(),
      result.insert_throughput(),
      result.query_time(),
      holdout_hits,
      result.holdout_queries,
      format_size(memory_bytes, BINARY)
    );

    Ok(result)
  }
}
