// Error-rate sweep runner
// 误判率扫描测试

use std::time::Instant;

use humansize::{BINARY, format_size};
use log::info;

use crate::{Amq, BenchConf, ErrorRate, Record, Result, SweepResult, Trial};

/// Inserts the whole dataset plus synthetic keys once per error budget
/// 每个误判率预算下插入完整数据集与合成 key 一次
pub struct SweepRunner<'a> {
  conf: &'a BenchConf,
  dataset: &'a [Record],
  keys: &'a [String],
}

impl<'a> SweepRunner<'a> {
  pub fn new(conf: &'a BenchConf, dataset: &'a [Record], keys: &'a [String]) -> Self {
    Self {
      conf,
      dataset,
      keys,
    }
  }

  /// `|dataset| + n`, fixed for every trial / 对所有试验固定
  #[inline]
  pub fn total_keys(&self) -> usize {
    self.dataset.len() + self.keys.len()
  }

  /// Run every trial in the structure's sweep list, in order
  /// 按顺序运行该结构扫描列表中的每个试验
  pub async fn run<A: Amq>(&self, amq: &mut A) -> Result<Vec<SweepResult>> {
    let structure = amq.structure();
    let rates = self.conf.sweep(structure);
    let mut out = Vec::with_capacity(rates.len());
    for (idx, rate) in rates.into_iter().enumerate() {
      let r = self
        .trial(amq, idx, rate)
        .await
        .map_err(|e| e.at(structure, Trial::Sweep { idx, rate }))?;
      out.push(r);
    }
    Ok(out)
  }

  /// One trial on namespace `<structure><idx>` / 在命名空间 <结构名><序号> 上运行一次试验
  pub async fn trial<A: Amq>(&self, amq: &mut A, idx: usize, rate: ErrorRate) -> Result<SweepResult> {
    let structure = amq.structure();
    let ns = format!("{structure}{idx}");
    let total_keys = self.total_keys();

    amq.flush().await?;
    if let Some(capacity) = self.conf.capacity(structure, total_keys) {
      amq.reserve(&ns, capacity, rate.target()).await?;
    }

    let mut success = 0u64;
    let start = Instant::now();
    for r in self.dataset {
      success += u64::from(amq.insert(&ns, &r.url).await?);
    }
    for k in self.keys {
      success += u64::from(amq.insert(&ns, k).await?);
    }
    let elapsed_ns = start.elapsed().as_nanos() as u64;

    let memory_bytes = amq.memory_usage(&ns).await?;
    amq.flush().await?;

    let result = SweepResult {
      structure,
      error_rate: rate,
      total_keys: total_keys as u64,
      success,
      elapsed_ns,
      memory_bytes,
    };

    info!(
      "{structure} error_rate {rate}: {} collisions / {total_keys} keys in {:.2?}, mem {}",
      result.collisions(),
      result.elapsed(),
      format_size(memory_bytes, BINARY)
    );

    Ok(result)
  }
}
