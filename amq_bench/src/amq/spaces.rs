// Namespace map shared by in-process adapters
// 进程内适配器共用的命名空间表

use std::collections::HashMap;

pub(crate) struct Spaces<T>(HashMap<String, T>);

impl<T> Default for Spaces<T> {
  fn default() -> Self {
    Self(HashMap::new())
  }
}

impl<T> Spaces<T> {
  /// Run `f` on namespace `ns`, creating it with `init` when missing.
  /// Avoids a key allocation on the hot path.
  /// 在 ns 上执行 f，不存在时用 init 创建；热路径不分配 key
  #[inline]
  pub fn with<R>(&mut self, ns: &str, init: impl FnOnce() -> T, f: impl FnOnce(&mut T) -> R) -> R {
    if let Some(t) = self.0.get_mut(ns) {
      return f(t);
    }
    let mut t = init();
    let r = f(&mut t);
    self.0.insert(ns.to_owned(), t);
    r
  }

  #[inline]
  pub fn get(&self, ns: &str) -> Option<&T> {
    self.0.get(ns)
  }

  /// Insert a fresh namespace, `false` if it already exists
  /// 新建命名空间，已存在时返回 false
  pub fn create(&mut self, ns: &str, t: T) -> bool {
    if self.0.contains_key(ns) {
      return false;
    }
    self.0.insert(ns.to_owned(), t);
    true
  }

  pub fn clear(&mut self) {
    self.0.clear();
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}
