// Dataset loader for ranked url lists
// 排名 url 列表的数据集加载器

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One row of the source dataset / 数据集中的一行
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
  pub url: String,
  pub rank: u64,
}

impl Record {
  pub fn new(url: impl Into<String>, rank: u64) -> Self {
    Self {
      url: url.into(),
      rank,
    }
  }
}

/// Column layout of the source file / 源文件列布局
#[derive(Debug, Clone, Copy)]
pub struct Columns {
  pub rank: usize,
  pub url: usize,
}

impl Default for Columns {
  /// Majestic Million: GlobalRank,TldRank,Domain,...
  fn default() -> Self {
    Self { rank: 0, url: 2 }
  }
}

/// Load records from a comma separated file, skipping one header row
/// 从逗号分隔文件加载记录，跳过一行表头
///
/// Malformed rows abort the load. Skipping them would shrink the key count
/// the collision figures are computed against.
/// 格式错误的行会中止加载。
pub fn load(path: &Path, cols: Columns) -> Result<Vec<Record>> {
  let reader = BufReader::new(File::open(path)?);
  let records = parse(reader, cols)?;
  info!("loaded {} records from {}", records.len(), path.display());
  Ok(records)
}

/// Parse records from any buffered reader / 从任意缓冲读取器解析记录
pub fn parse(reader: impl BufRead, cols: Columns) -> Result<Vec<Record>> {
  let mut records = Vec::new();
  // line numbers are 1-based and include the header
  for (idx, row) in reader.split(b'\n').enumerate().skip(1) {
    let row = row?;
    let line = std::str::from_utf8(&row).map_err(|e| Error::DatasetLoad {
      line: idx + 1,
      reason: format!("invalid utf-8: {e}"),
    })?;
    records.push(parse_row(line, idx + 1, cols)?);
  }
  Ok(records)
}

fn parse_row(line: &str, line_no: usize, cols: Columns) -> Result<Record> {
  let line = line.trim_end_matches('\r');
  let bad = |reason: String| Error::DatasetLoad {
    line: line_no,
    reason,
  };

  if line.trim().is_empty() {
    return Err(bad("blank row".into()));
  }

  let fields: Vec<&str> = line.split(',').collect();
  let field = |c: usize| {
    fields
      .get(c)
      .map(|s| s.trim())
      .ok_or_else(|| bad(format!("missing column {c}, row has {}", fields.len())))
  };

  let rank_raw = field(cols.rank)?;
  let rank = rank_raw
    .parse::<u64>()
    .map_err(|e| bad(format!("rank {rank_raw:?}: {e}")))?;

  let url = field(cols.url)?;
  if url.is_empty() {
    return Err(bad("empty url".into()));
  }

  Ok(Record::new(url, rank))
}
