// Report aggregation: fixed-width tables and JSON
// 报告汇总：定宽表格与 JSON

use std::{
  fs,
  path::{Path, PathBuf},
  time::Duration,
};

use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};

use crate::{Result, SpeedResult, SweepResult};

/// JSON file name inside the report dir / 报告目录中的 JSON 文件名
pub const REPORT_JSON: &str = "amq_bench.json";

#[derive(Tabled)]
struct SpeedRow {
  #[tabled(rename = "Data Structure")]
  name: &'static str,
  #[tabled(rename = "Fold")]
  fold: usize,
  #[tabled(rename = "Insertion Time")]
  insert: String,
  #[tabled(rename = "Query Time")]
  query: String,
  #[tabled(rename = "Query P99")]
  p99: String,
  #[tabled(rename = "Input Hits")]
  hits: String,
  #[tabled(rename = "Holdout Hits")]
  holdout: String,
  #[tabled(rename = "Memory Usage")]
  memory: u64,
}

#[derive(Tabled)]
struct SweepRow {
  #[tabled(rename = "Data Structure")]
  name: &'static str,
  #[tabled(rename = "Error Rate")]
  rate: String,
  #[tabled(rename = "# of Collisions")]
  collisions: u64,
  #[tabled(rename = "Time")]
  time: String,
  #[tabled(rename = "Memory Usage")]
  memory: u64,
}

fn secs(d: Duration) -> String {
  format!("{:.3}", d.as_secs_f64())
}

/// Collected results of one run / 一次运行的全部结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
  pub speed: Vec<SpeedResult>,
  pub sweep: Vec<SweepResult>,
}

impl Report {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_speed(&mut self, r: SpeedResult) {
    self.speed.push(r);
  }

  pub fn push_sweep(&mut self, r: SweepResult) {
    self.sweep.push(r);
  }

  /// Speed table, times in seconds, memory in backend bytes
  /// 速度表，时间单位秒，内存为后端报告的字节数
  pub fn speed_table(&self) -> String {
    let rows = self.speed.iter().map(|r| SpeedRow {
      name: r.structure.title(),
      fold: r.fold,
      insert: secs(r.insert_time()),
      query: secs(r.query_time()),
      p99: format!("{:.2?}", Duration::from_nanos(r.latency.p99)),
      hits: format!("{}/{}", r.input_hits, r.input_queries),
      holdout: format!("{}/{}", r.holdout_hits, r.holdout_queries),
      memory: r.memory_bytes,
    });
    Table::new(rows).with(Style::ascii()).to_string()
  }

  /// Collision table of the error-rate sweep / 误判率扫描的冲突表
  pub fn sweep_table(&self) -> String {
    let rows = self.sweep.iter().map(|r| SweepRow {
      name: r.structure.title(),
      rate: r.error_rate.to_string(),
      collisions: r.collisions(),
      time: secs(r.elapsed()),
      memory: r.memory_bytes,
    });
    Table::new(rows).with(Style::ascii()).to_string()
  }

  pub fn to_json(&self) -> Result<String> {
    Ok(sonic_rs::to_string_pretty(self)?)
  }

  /// Write JSON into `dir`, creating it if needed / 将 JSON 写入 dir，必要时创建目录
  pub fn save(&self, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_JSON);
    fs::write(&path, self.to_json()?)?;
    Ok(path)
  }
}
