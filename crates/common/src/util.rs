pub fn indicies_to_flags(indicies: &[usize], len: usize) -> Vec<bool> {
  let mut flags = vec![false; len];
  indicies.iter().for_each(|&i| flags[i] = true);
  flags
}

/// Union-find over `0..len` with path halving and union by size.
#[derive(Debug, Clone)]
pub struct DisjointSets {
  parents: Vec<usize>,
  sizes: Vec<usize>,
}
impl DisjointSets {
  pub fn new(len: usize) -> Self {
    Self {
      parents: (0..len).collect(),
      sizes: vec![1; len],
    }
  }

  pub fn find(&mut self, mut i: usize) -> usize {
    while self.parents[i] != i {
      self.parents[i] = self.parents[self.parents[i]];
      i = self.parents[i];
    }
    i
  }

  pub fn union(&mut self, a: usize, b: usize) {
    let mut a = self.find(a);
    let mut b = self.find(b);
    if a == b {
      return;
    }
    if self.sizes[a] < self.sizes[b] {
      std::mem::swap(&mut a, &mut b);
    }
    self.parents[b] = a;
    self.sizes[a] += self.sizes[b];
  }

  /// Labels every element with its set, numbering sets in order of their smallest element.
  pub fn labels(&mut self) -> (Vec<usize>, usize) {
    let len = self.parents.len();
    let mut root_labels = vec![usize::MAX; len];
    let mut labels = Vec::with_capacity(len);
    let mut nsets = 0;
    for i in 0..len {
      let root = self.find(i);
      if root_labels[root] == usize::MAX {
        root_labels[root] = nsets;
        nsets += 1;
      }
      labels.push(root_labels[root]);
    }
    (labels, nsets)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn flags() {
    let flags = indicies_to_flags(&[1, 3], 5);
    assert_eq!(flags, vec![false, true, false, true, false]);
  }

  #[test]
  fn disjoint_sets() {
    let mut sets = DisjointSets::new(6);
    sets.union(4, 1);
    sets.union(5, 3);
    sets.union(3, 0);
    let (labels, nsets) = sets.labels();
    assert_eq!(nsets, 3);
    assert_eq!(labels, vec![0, 1, 2, 0, 1, 0]);
  }
}
