// AMQ benchmark library: exact set vs bloom vs cuckoo on a real dataset
// AMQ 基准测试库：在真实数据集上对比精确集合、布隆与布谷鸟过滤器

#![cfg_attr(docsrs, feature(doc_cfg))]

mod amq;
mod conf;
mod dataset;
mod error;
mod fold;
mod keygen;
mod latency;
mod metrics;
mod report;
mod speed;
mod suite;
mod sweep;

pub use amq::{
  AnyAmq, Amq, BloomFilter, CUCKOO_FPP, CuckooFilter, ErrorRate, ExactSet, MAX_CAPACITY,
  Structure,
};
pub use conf::BenchConf;
pub use dataset::{Columns, Record, load, parse};
pub use error::{Error, Result, Trial};
pub use fold::{Folds, Partition};
pub use keygen::{ALPHABET, KEY_LEN, SEED, gen_keys};
pub use latency::{LatencyStats, QueryLatency};
pub use metrics::{SpeedResult, SweepResult};
pub use report::{REPORT_JSON, Report};
pub use speed::{INPUT_QUERIES, Probe, QueryPlan, SpeedRunner};
pub use suite::{speed_suite, sweep_suite};
pub use sweep::SweepRunner;
