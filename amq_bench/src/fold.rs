// K-fold dataset partitioner
// K 折数据集划分器

use std::ops::Range;

use crate::{Error, Record, Result};

/// Dataset split into `k` contiguous folds of equal size (±1)
/// 数据集被切分为 k 个连续且大小相等（±1）的折
#[derive(Debug, Clone)]
pub struct Folds<'a> {
  data: &'a [Record],
  bounds: Vec<Range<usize>>,
}

/// Input / holdout pair for one fold / 某一折的输入集与保留集
#[derive(Debug, Clone)]
pub struct Partition<'a> {
  /// Index of the held out fold / 被保留的折序号
  pub fold: usize,
  /// Every other fold, in fold order / 其余所有折，按顺序拼接
  pub input: Vec<&'a Record>,
  pub holdout: &'a [Record],
}

impl<'a> Folds<'a> {
  /// Split `data` into `k` folds. The first `len % k` folds get one extra record.
  /// 切分为 k 折，前 len % k 折各多一条记录
  pub fn new(data: &'a [Record], k: usize) -> Result<Self> {
    let len = data.len();
    if k < 2 || k > len {
      return Err(Error::InvalidFoldCount { k, len });
    }

    let (base, extra) = (len / k, len % k);
    let mut bounds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
      let end = start + base + usize::from(i < extra);
      bounds.push(start..end);
      start = end;
    }

    Ok(Self { data, bounds })
  }

  /// Fold count / 折数
  #[inline]
  pub fn k(&self) -> usize {
    self.bounds.len()
  }

  /// Records of fold `i` / 第 i 折的记录
  #[inline]
  pub fn fold(&self, i: usize) -> &'a [Record] {
    &self.data[self.bounds[i].clone()]
  }

  /// Hold out fold `i`, concatenate the rest in ascending order
  /// 保留第 i 折，其余折按升序拼接
  /// `None` when `i >= k` / i 越界时返回 None
  pub fn partition(&self, i: usize) -> Option<Partition<'a>> {
    if i >= self.k() {
      return None;
    }

    let input = (0..self.k())
      .filter(|&j| j != i)
      .flat_map(|j| self.fold(j))
      .collect();

    Some(Partition {
      fold: i,
      input,
      holdout: self.fold(i),
    })
  }

  /// All partitions in fold order / 按折顺序的全部划分
  pub fn partitions(&self) -> impl Iterator<Item = Partition<'a>> + '_ {
    (0..self.k()).filter_map(move |i| self.partition(i))
  }
}

impl Partition<'_> {
  /// Total records covered / 覆盖的记录总数
  #[inline]
  pub fn len(&self) -> usize {
    self.input.len() + self.holdout.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
