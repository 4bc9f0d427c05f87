// Run every selected structure through the speed and sweep protocols
// 让每个选中的结构依次跑完速度测试与误判率扫描

use log::info;

use crate::{
  Amq, BenchConf, Error, Folds, QueryPlan, Record, Result, SpeedResult, SpeedRunner, Structure,
  SweepResult, SweepRunner, Trial,
};

/// Speed trials for every fold and every selected structure. Probes are drawn
/// once per fold so every structure answers the same queries.
/// 对每一折、每个选中结构运行速度试验；每折只抽一次探测，所有结构查询相同
///
/// `open` supplies the backend for a structure / open 为结构提供后端
pub async fn speed_suite<A, F>(
  conf: &BenchConf,
  dataset: &[Record],
  mut open: F,
) -> Result<Vec<SpeedResult>>
where
  A: Amq,
  F: FnMut(Structure) -> Result<A>,
{
  let selected = conf.validate()?;
  let folds = Folds::new(dataset, conf.folds)?;
  let runner = SpeedRunner::new(conf.speed_error_rate);
  let mut rng = fastrand::Rng::with_seed(conf.seed);

  info!(
    "speed: {} records, {} folds, {} probes per fold",
    dataset.len(),
    folds.k(),
    conf.query_samples
  );

  let mut out = Vec::with_capacity(folds.k() * selected.len());
  for part in folds.partitions() {
    let plan = QueryPlan::draw(&mut rng, &part, conf.query_samples);
    for &s in &selected {
      let mut amq = open(s).map_err(|e| e.at(s, Trial::Fold(part.fold)))?;
      out.push(runner.run(&mut amq, &part, &plan).await?);
    }
  }
  Ok(out)
}

/// Error-rate sweeps for every selected structure on the same workload
/// 在同一负载上对每个选中结构运行误判率扫描
pub async fn sweep_suite<A, F>(
  conf: &BenchConf,
  dataset: &[Record],
  keys: &[String],
  mut open: F,
) -> Result<Vec<SweepResult>>
where
  A: Amq,
  F: FnMut(Structure) -> Result<A>,
{
  let selected = conf.validate()?;
  let runner = SweepRunner::new(conf, dataset, keys);
  if runner.total_keys() == 0 {
    return Err(Error::InvalidConfiguration(
      "sweep needs at least one record or synthetic key".into(),
    ));
  }

  info!(
    "sweep: {} records + {} synthetic keys = {}",
    dataset.len(),
    keys.len(),
    runner.total_keys()
  );

  let mut out = Vec::new();
  for s in selected {
    // an open failure belongs to the first trial / 打开失败归入第一个试验
    let mut amq = open(s).map_err(|e| match conf.sweep(s).first() {
      Some(&rate) => e.at(s, Trial::Sweep { idx: 0, rate }),
      None => e,
    })?;
    out.extend(runner.run(&mut amq).await?);
  }
  Ok(out)
}
