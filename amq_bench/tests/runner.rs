// Adapter, runner and suite tests / 适配器、运行器与套件测试

use amq_bench::{
  Amq, AnyAmq, BenchConf, BloomFilter, CuckooFilter, Error, ErrorRate, ExactSet, Folds, QueryPlan,
  Record, Report, Result, SpeedRunner, Structure, SweepRunner, Trial, gen_keys, speed_suite,
  sweep_suite,
};
use aok::Void;
use log::info;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

fn urls(n: usize) -> Vec<Record> {
  (0..n)
    .map(|i| Record::new(format!("https://site{i}.example.org/"), i as u64 + 1))
    .collect()
}

fn open(s: Structure) -> Result<AnyAmq> {
  Ok(AnyAmq::from(s))
}

/// Backend whose connection drops after `budget` calls / 调用 budget 次后断开的后端
struct Flaky {
  inner: ExactSet,
  budget: usize,
}

impl Flaky {
  fn new(budget: usize) -> Self {
    Self {
      inner: ExactSet::new(),
      budget,
    }
  }

  fn tick(&mut self) -> Result<()> {
    if self.budget == 0 {
      return Err(Error::BackendUnavailable("connection reset".into()));
    }
    self.budget -= 1;
    Ok(())
  }
}

impl Amq for Flaky {
  fn structure(&self) -> Structure {
    Structure::ExactSet
  }

  async fn insert(&mut self, ns: &str, key: &str) -> Result<bool> {
    self.tick()?;
    self.inner.insert(ns, key).await
  }

  async fn exists(&mut self, ns: &str, key: &str) -> Result<bool> {
    self.tick()?;
    self.inner.exists(ns, key).await
  }

  async fn memory_usage(&mut self, ns: &str) -> Result<u64> {
    self.tick()?;
    self.inner.memory_usage(ns).await
  }

  async fn reserve(&mut self, ns: &str, capacity: usize, error_rate: Option<f64>) -> Result<()> {
    self.tick()?;
    self.inner.reserve(ns, capacity, error_rate).await
  }

  async fn flush(&mut self) -> Result<()> {
    self.tick()?;
    self.inner.flush().await
  }
}

mod adapter {
  use super::*;

  #[compio::test]
  async fn exact_set_is_exact() -> Void {
    let mut a = ExactSet::new();
    let keys = gen_keys(7, 2000);
    let (inside, outside) = keys.split_at(1000);

    for k in inside {
      assert!(a.insert("s", k).await?);
    }
    for k in inside {
      assert!(!a.insert("s", k).await?, "duplicate must be rejected");
      assert!(a.exists("s", k).await?);
    }
    for k in outside {
      assert!(!a.exists("s", k).await?);
    }
    assert!(!a.exists("other", &inside[0]).await?);
    assert!(a.memory_usage("s").await? > 0);
    assert_eq!(a.memory_usage("other").await?, 0);

    a.flush().await?;
    assert!(!a.exists("s", &inside[0]).await?);
    assert_eq!(a.memory_usage("s").await?, 0);
    Ok(())
  }

  #[compio::test]
  async fn bloom_has_no_false_negatives() -> Void {
    let mut a = BloomFilter::new();
    a.reserve("b", 10_000, Some(0.01)).await?;
    let keys = gen_keys(3, 20_000);
    let (inside, outside) = keys.split_at(10_000);

    for k in inside {
      a.insert("b", k).await?;
    }
    for k in inside {
      assert!(a.exists("b", k).await?, "false negative for {k}");
    }

    let mut fp = 0;
    for k in outside {
      fp += usize::from(a.exists("b", k).await?);
    }
    // target 1%, wide tolerance / 目标 1%，宽容差
    let rate = fp as f64 / outside.len() as f64;
    info!("bloom observed fp rate {rate}");
    assert!(rate < 0.05, "observed {rate}");
    Ok(())
  }

  #[compio::test]
  async fn cuckoo_has_no_false_negatives() -> Void {
    let mut a = CuckooFilter::new();
    a.reserve("c", 10_000, None).await?;
    let keys = gen_keys(4, 20_000);
    let (inside, outside) = keys.split_at(8_000);

    let mut added = 0u64;
    for k in inside {
      added += u64::from(a.insert("c", k).await?);
    }
    assert_eq!(a.full_count("c"), 0);
    for k in inside {
      assert!(a.exists("c", k).await?, "false negative for {k}");
    }
    // rejected inserts are fingerprint collisions / 被拒插入即指纹冲突
    let collision = 1.0 - added as f64 / inside.len() as f64;
    assert!(collision < 0.1, "collision rate {collision}");

    let mut fp = 0;
    for k in &outside[..10_000] {
      fp += usize::from(a.exists("c", k).await?);
    }
    let rate = fp as f64 / 10_000.0;
    assert!(rate < 0.1, "observed {rate}");
    Ok(())
  }

  #[compio::test]
  async fn reserve_rejections() -> Void {
    let mut bloom = BloomFilter::new();
    for (cap, rate) in [(0, Some(0.01)), (10, Some(0.0)), (10, Some(1.0)), (10, Some(-0.5))] {
      let err = bloom.reserve("b", cap, rate).await.unwrap_err();
      assert!(matches!(err, Error::ConfigurationRejected { .. }), "{err}");
    }
    bloom.reserve("b", 10, Some(0.01)).await?;
    let again = bloom.reserve("b", 10, Some(0.01)).await;
    assert!(matches!(again, Err(Error::ConfigurationRejected { .. })));

    let mut exact = ExactSet::new();
    let err = exact.reserve("s", 10, Some(0.01)).await.unwrap_err();
    assert!(matches!(err, Error::ConfigurationRejected { structure: Structure::ExactSet, .. }));
    exact.reserve("s", 10, None).await?;

    let mut cuckoo = CuckooFilter::new();
    assert!(cuckoo.reserve("c", amq_bench::MAX_CAPACITY + 1, None).await.is_err());
    // rate is accepted and ignored / 误判率被接受但不生效
    cuckoo.reserve("c", 100, Some(0.0001)).await?;
    Ok(())
  }

  /// Oversized bloom bitmaps are refused before allocation
  /// 过大的布隆位图在分配前被拒绝
  #[compio::test]
  async fn bloom_rejects_huge_bitmap() -> Void {
    let mut bloom = BloomFilter::new();
    let err = bloom
      .reserve("huge", amq_bench::MAX_CAPACITY, Some(1e-300))
      .await
      .unwrap_err();
    assert!(
      matches!(err, Error::ConfigurationRejected { reason: "bitmap too large", .. }),
      "{err}"
    );
    assert_eq!(bloom.memory_usage("huge").await?, 0);

    // tiny rate on a small filter still fits / 小容量下的极小误判率仍可分配
    bloom.reserve("tiny", 1_000, Some(1e-300)).await?;
    assert!(bloom.memory_usage("tiny").await? > 0);
    Ok(())
  }

  /// Capacity and error rate are independent knobs: memory grows with either
  /// 容量与误判率相互独立：任一增大都会增加内存
  #[compio::test]
  async fn bloom_capacity_and_rate_combinations() -> Void {
    let caps = [1_000usize, 10_000, 100_000];
    let rates = [1e-2, 1e-4, 1e-6];
    let mut a = BloomFilter::new();
    let mut mem = vec![vec![0u64; rates.len()]; caps.len()];
    for (i, &cap) in caps.iter().enumerate() {
      for (j, &rate) in rates.iter().enumerate() {
        let ns = format!("b{i}_{j}");
        a.reserve(&ns, cap, Some(rate)).await?;
        mem[i][j] = a.memory_usage(&ns).await?;
      }
    }
    for i in 0..caps.len() {
      for j in 0..rates.len() {
        if i + 1 < caps.len() {
          assert!(mem[i + 1][j] > mem[i][j], "capacity {i}/{j}: {mem:?}");
        }
        if j + 1 < rates.len() {
          assert!(mem[i][j + 1] > mem[i][j], "rate {i}/{j}: {mem:?}");
        }
      }
    }
    Ok(())
  }

  #[compio::test]
  async fn unreserved_namespaces_autocreate() -> Void {
    for s in Structure::ALL {
      let mut a = AnyAmq::from(s);
      assert_eq!(a.structure(), s);
      assert!(a.insert("auto", "k").await?);
      assert!(a.exists("auto", "k").await?);
      assert!(a.memory_usage("auto").await? > 0);
    }
    Ok(())
  }
}

mod speed {
  use super::*;

  #[compio::test]
  async fn exact_set_speed_trial() -> Void {
    let data = urls(5_000);
    let folds = Folds::new(&data, 5)?;
    let part = folds.partition(2).expect("fold 2");
    let plan = QueryPlan::draw(&mut fastrand::Rng::with_seed(1), &part, 10);

    let mut a = ExactSet::new();
    let r = SpeedRunner::default().run(&mut a, &part, &plan).await?;

    assert_eq!(r.structure, Structure::ExactSet);
    assert_eq!(r.fold, 2);
    assert_eq!(r.inserted, 4_000);
    assert_eq!(r.rejected, 0);
    assert_eq!(r.input_queries, 40);
    assert_eq!(r.input_hits, 40);
    assert_eq!(r.holdout_queries, 10);
    assert_eq!(r.holdout_hits, 0);
    assert_eq!(r.latency.count, 50);
    assert!(r.memory_bytes > 0);

    // flushed after the trial / 试验后已清空
    assert_eq!(a.memory_usage(Structure::ExactSet.name()).await?, 0);
    Ok(())
  }

  #[compio::test]
  async fn filters_never_miss_inserted_keys() -> Void {
    let data = urls(3_000);
    let folds = Folds::new(&data, 3)?;
    let mut rng = fastrand::Rng::with_seed(5);
    for part in folds.partitions() {
      let plan = QueryPlan::draw(&mut rng, &part, 50);
      for s in [Structure::BloomFilter, Structure::CuckooFilter] {
        let mut a = AnyAmq::from(s);
        let r = SpeedRunner::new(0.01).run(&mut a, &part, &plan).await?;
        assert_eq!(r.input_hits, r.input_queries, "{s} fold {}", part.fold);
      }
    }
    Ok(())
  }

  #[compio::test]
  async fn suite_covers_every_fold_and_structure() -> Void {
    let data = urls(2_000);
    let mut conf = BenchConf::default();
    conf.folds = 4;
    conf.query_samples = 5;

    let results = speed_suite(&conf, &data, open).await?;
    assert_eq!(results.len(), 4 * 3);
    for (i, r) in results.iter().enumerate() {
      assert_eq!(r.fold, i / 3);
      assert_eq!(r.structure, Structure::ALL[i % 3]);
      assert_eq!(r.inserted, 1_500);
      assert_eq!(r.input_hits, 20);
    }
    Ok(())
  }

  #[compio::test]
  async fn suite_rejects_bad_fold_count() -> Void {
    let data = urls(3);
    let mut conf = BenchConf::default();
    conf.folds = 4;
    let err = speed_suite(&conf, &data, open).await.unwrap_err();
    assert!(matches!(err, Error::InvalidFoldCount { k: 4, len: 3 }), "{err}");
    Ok(())
  }

  #[compio::test]
  async fn backend_loss_aborts_with_context() -> Void {
    let data = urls(100);
    let conf = BenchConf::default().only(&[Structure::ExactSet]);

    // fold 0 gets a healthy backend, fold 1 loses its connection mid-insert
    // 第 0 折后端正常，第 1 折在插入中途断开
    let mut opened = 0;
    let err = speed_suite(&conf, &data, |_| {
      opened += 1;
      Ok(Flaky::new(if opened == 1 { 1_000 } else { 10 }))
    })
    .await
    .unwrap_err();

    assert_eq!(opened, 2, "run must stop at the failing fold");
    assert!(
      matches!(
        &err,
        Error::Trial { structure: Structure::ExactSet, trial: Trial::Fold(1), .. }
      ),
      "{err}"
    );
    assert!(matches!(err.root(), Error::BackendUnavailable(_)));
    assert!(err.to_string().contains("fold 1"));
    Ok(())
  }

  #[compio::test]
  async fn open_failure_carries_context() -> Void {
    let data = urls(10);
    let conf = BenchConf::default().only(&[Structure::BloomFilter]);

    let err = speed_suite(&conf, &data, |_| -> Result<ExactSet> {
      Err(Error::BackendUnavailable("connection refused".into()))
    })
    .await
    .unwrap_err();

    assert!(
      matches!(
        &err,
        Error::Trial { structure: Structure::BloomFilter, trial: Trial::Fold(0), .. }
      ),
      "{err}"
    );
    assert!(matches!(err.root(), Error::BackendUnavailable(_)));
    let msg = err.to_string();
    assert!(msg.contains("bloom_filter") && msg.contains("fold 0"), "{msg}");

    let keys = gen_keys(1, 10);
    let err = sweep_suite(&conf, &data, &keys, |_| -> Result<ExactSet> {
      Err(Error::BackendUnavailable("connection refused".into()))
    })
    .await
    .unwrap_err();
    assert!(
      matches!(
        &err,
        Error::Trial {
          structure: Structure::BloomFilter,
          trial: Trial::Sweep { idx: 0, rate: ErrorRate::Target(r) },
          ..
        } if *r == 1e-2
      ),
      "{err}"
    );
    assert!(matches!(err.root(), Error::BackendUnavailable(_)));
    Ok(())
  }
}

mod sweep {
  use super::*;

  #[compio::test]
  async fn exact_set_has_no_collisions() -> Void {
    let data = urls(10_000);
    let keys = gen_keys(1, 1_000);
    let conf = BenchConf::default();

    let mut a = ExactSet::new();
    let results = SweepRunner::new(&conf, &data, &keys).run(&mut a).await?;
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.error_rate, ErrorRate::Exact);
    assert_eq!(r.total_keys, 11_000);
    assert_eq!(r.collisions(), 0);
    assert!(r.memory_bytes > 0);
    Ok(())
  }

  #[compio::test]
  async fn exact_set_counts_duplicates_exactly() -> Void {
    let mut data = urls(1_000);
    data.extend(urls(25));
    let conf = BenchConf::default();

    let mut a = ExactSet::new();
    let results = SweepRunner::new(&conf, &data, &[]).run(&mut a).await?;
    assert_eq!(results[0].collisions(), 25);
    Ok(())
  }

  #[compio::test]
  async fn bloom_sweep_keeps_workload_constant() -> Void {
    let data = urls(20_000);
    let keys = gen_keys(1, 2_000);
    let mut conf = BenchConf::default();
    conf.bloom_error_rates = vec![1e-1, 1e-2, 1e-4];

    let mut a = BloomFilter::new();
    let results = SweepRunner::new(&conf, &data, &keys).run(&mut a).await?;
    assert_eq!(results.len(), 3);

    for (r, want) in results.iter().zip(&conf.bloom_error_rates) {
      assert_eq!(r.error_rate, ErrorRate::Target(*want));
      assert_eq!(r.total_keys, 22_000);
    }

    // collisions accrue while the filter fills, so the observed rate averages
    // to about a sixth of the target; check a broad window around that
    // 冲突随过滤器填充累积，观测值约为目标的六分之一；检查其附近的宽区间
    let at_1pct = results[1].collision_rate();
    assert!(at_1pct > 0.0003 && at_1pct < 0.03, "1% target gave {at_1pct}");
    assert!(results[0].collision_rate() > results[2].collision_rate());
    assert!(results[2].memory_bytes > results[0].memory_bytes);
    Ok(())
  }

  #[compio::test]
  async fn bloom_capacity_is_independent_of_rate() -> Void {
    let data = urls(5_000);
    let mut small = BenchConf::default();
    small.bloom_error_rates = vec![1e-3];
    small.bloom_capacity = Some(1_000);
    let mut exact = small.clone();
    exact.bloom_capacity = None;

    let run = |conf: BenchConf| {
      let data = &data;
      async move {
        let mut a = BloomFilter::new();
        SweepRunner::new(&conf, data, &[]).run(&mut a).await
      }
    };
    let under = run(small).await?;
    let sized = run(exact).await?;

    // undersized filter saturates / 容量不足时过滤器饱和
    assert!(under[0].collisions() > sized[0].collisions());
    assert!(under[0].memory_bytes < sized[0].memory_bytes);
    Ok(())
  }

  #[compio::test]
  async fn cuckoo_sweep_is_single_fixed_rate_trial() -> Void {
    let data = urls(20_000);
    let keys = gen_keys(1, 1_000);
    let conf = BenchConf::default();

    let mut a = CuckooFilter::new();
    let results = SweepRunner::new(&conf, &data, &keys).run(&mut a).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].error_rate, ErrorRate::Approx(amq_bench::CUCKOO_FPP));
    assert_eq!(results[0].total_keys, 21_000);
    assert!(results[0].collision_rate() < 0.1);
    Ok(())
  }

  #[compio::test]
  async fn rejected_reserve_carries_trial_context() -> Void {
    let data = urls(10);
    let mut conf = BenchConf::default();
    conf.cuckoo_capacity = Some(0);

    let mut a = CuckooFilter::new();
    let err = SweepRunner::new(&conf, &data, &[]).run(&mut a).await.unwrap_err();
    assert!(
      matches!(
        &err,
        Error::Trial { structure: Structure::CuckooFilter, trial: Trial::Sweep { idx: 0, .. }, .. }
      ),
      "{err}"
    );
    assert!(matches!(err.root(), Error::ConfigurationRejected { .. }));
    Ok(())
  }

  #[compio::test]
  async fn suite_and_report() -> Void {
    let data = urls(3_000);
    let keys = gen_keys(1, 300);
    let mut conf = BenchConf::default();
    conf.folds = 3;
    conf.bloom_error_rates = vec![1e-2, 1e-3];

    let mut report = Report::new();
    report.sweep = sweep_suite(&conf, &data, &keys, open).await?;
    report.speed = speed_suite(&conf, &data, open).await?;
    // exact + 2 bloom + cuckoo / 精确 + 2 个布隆 + 布谷鸟
    assert_eq!(report.sweep.len(), 4);
    assert!(report.sweep.iter().all(|r| r.total_keys == 3_300));
    assert_eq!(report.sweep[0].collisions(), 0);

    let speed = report.speed_table();
    assert!(speed.contains("Insertion Time"));
    assert!(speed.contains("Bloom Filter"));
    let sweep = report.sweep_table();
    assert!(sweep.contains("# of Collisions"));
    assert!(sweep.contains("~0.03"));
    assert!(sweep.contains("0.001"));
    info!("\n{speed}\n{sweep}");

    let dir = std::env::temp_dir().join("amq_bench_report_test");
    let path = report.save(&dir)?;
    let back: Report = sonic_rs::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(back.sweep, report.sweep);
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
  }

  #[compio::test]
  async fn suite_fails_before_io_without_structures() -> Void {
    let conf = BenchConf::default().only(&[]);
    let err = sweep_suite(&conf, &[], &[], |_| -> Result<ExactSet> {
      panic!("no backend should be opened")
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
    Ok(())
  }

  /// An empty workload is refused once for every structure
  /// 空负载对所有结构统一拒绝
  #[compio::test]
  async fn suite_rejects_empty_workload() -> Void {
    let conf = BenchConf::default();
    let err = sweep_suite(&conf, &[], &[], |_| -> Result<ExactSet> {
      panic!("no backend should be opened")
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
    Ok(())
  }
}
