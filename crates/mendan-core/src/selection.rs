//! Ordered selection sets keyed by backend identity.

/// Anything with a backend primary key.
pub trait Keyed {
  fn key(&self) -> i64;
}

/// Entities chosen by the user, in the order they were chosen, with at most
/// one entry per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T> {
  items: Vec<T>,
}

impl<T> Default for Selection<T> {
  fn default() -> Self { Self { items: Vec::new() } }
}

impl<T: Keyed> Selection<T> {
  pub fn new() -> Self { Self::default() }

  /// Append `item` unless an entry with the same key exists. Returns whether
  /// it was added.
  pub fn insert(&mut self, item: T) -> bool {
    if self.contains(item.key()) {
      return false;
    }
    self.items.push(item);
    true
  }

  /// Remove the entry with `key`, returning it if present.
  pub fn remove(&mut self, key: i64) -> Option<T> {
    let pos = self.items.iter().position(|i| i.key() == key)?;
    Some(self.items.remove(pos))
  }

  pub fn contains(&self, key: i64) -> bool {
    self.items.iter().any(|i| i.key() == key)
  }

  /// Keys in selection order.
  pub fn keys(&self) -> Vec<i64> { self.items.iter().map(Keyed::key).collect() }

  pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

  pub fn get(&self, index: usize) -> Option<&T> { self.items.get(index) }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl<T: Keyed> FromIterator<T> for Selection<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut selection = Self::new();
    for item in iter {
      selection.insert(item);
    }
    selection
  }
}
