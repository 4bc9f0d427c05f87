// Synthetic key generator
// 合成 key 生成器

use log::info;

/// Default seed for synthetic keys / 合成 key 默认种子
pub const SEED: u64 = 1;

/// Length of every synthetic key / 合成 key 长度
pub const KEY_LEN: usize = 24;

/// a-z then A-Z / 小写字母后接大写字母
pub const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate `n` random ascii-letter keys. Same `(seed, n)`, same keys.
/// 生成 n 个随机字母 key，相同 (seed, n) 得到相同结果
pub fn gen_keys(seed: u64, n: usize) -> Vec<String> {
  info!("generating {n} synthetic keys (seed {seed})");
  let mut rng = fastrand::Rng::with_seed(seed);
  (0..n).map(|_| gen_key(&mut rng)).collect()
}

#[inline]
fn gen_key(rng: &mut fastrand::Rng) -> String {
  (0..KEY_LEN)
    .map(|_| char::from(ALPHABET[rng.usize(..ALPHABET.len())]))
    .collect()
}
