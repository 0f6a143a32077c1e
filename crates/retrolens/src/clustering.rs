//! Centroid-based clustering of embedding vectors
//!
//! [`cluster`] is the entry point the theme pipeline uses. It never fails:
//! inputs smaller than the requested cluster count become singleton clusters,
//! and a fault inside the numeric routine degrades to a round-robin
//! assignment. Theme grouping is a best-effort feature, so a lower quality
//! grouping is preferred over surfacing an error to the caller.

use thiserror::Error;
use tracing::{debug, warn};

/// Default cluster count when the caller does not ask for one
pub const DEFAULT_CLUSTER_COUNT: usize = 3;

const DEFAULT_MAX_ITERATIONS: usize = 100;

#[derive(Error, Debug, PartialEq)]
pub enum ClusterError {
  #[error("Cannot form {k} clusters from {points} points")]
  TooFewPoints { points: usize, k: usize },

  #[error("Vector {index} has dimension {found}, expected {expected}")]
  DimensionMismatch { index: usize, expected: usize, found: usize },

  #[error("Vector {index} contains a non-finite component")]
  NonFiniteComponent { index: usize },

  #[error("Distance from vector {index} to centroid {centroid} is not finite")]
  NonFiniteDistance { index: usize, centroid: usize },
}

impl ClusterError {
  pub fn too_few_points(points: usize, k: usize) -> Self {
    Self::TooFewPoints { points, k }
  }

  pub fn dimension_mismatch(index: usize, expected: usize, found: usize) -> Self {
    Self::DimensionMismatch { index, expected, found }
  }
}

/// A numeric routine that partitions vectors into at most `k` groups
pub trait CentroidClustering: Send + Sync {
  /// Returns one cluster id per input vector
  fn fit(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<usize>, ClusterError>;
}

/// Deterministic k-means with farthest-point seeding
#[derive(Debug, Clone)]
pub struct KMeans {
  max_iterations: usize,
}

impl Default for KMeans {
  fn default() -> Self {
    Self { max_iterations: DEFAULT_MAX_ITERATIONS }
  }
}

impl KMeans {
  pub fn with_max_iterations(max_iterations: usize) -> Self {
    Self { max_iterations: max_iterations.max(1) }
  }
}

impl CentroidClustering for KMeans {
  fn fit(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<usize>, ClusterError> {
    if k == 0 || vectors.len() < k {
      return Err(ClusterError::too_few_points(vectors.len(), k));
    }
    validate(vectors)?;

    let mut centroids = seed_centroids(vectors, k);
    let mut assignment = assign(vectors, &centroids)?;

    for iteration in 1..=self.max_iterations {
      centroids = update_centroids(vectors, &assignment, &centroids);
      let next = assign(vectors, &centroids)?;
      if next == assignment {
        debug!(iteration, "k-means converged");
        break;
      }
      assignment = next;
    }

    Ok(compact_ids(&assignment))
  }
}

/// Cluster `vectors` into at most `k` groups with the default engine
pub fn cluster(vectors: &[Vec<f32>], k: usize) -> Vec<usize> {
  cluster_with(&KMeans::default(), vectors, k)
}

/// Cluster with an explicit engine, applying the degenerate and fault fallbacks
pub fn cluster_with(engine: &dyn CentroidClustering, vectors: &[Vec<f32>], k: usize) -> Vec<usize> {
  let k = k.max(1);

  if vectors.len() < k {
    debug!(points = vectors.len(), k, "fewer points than clusters, using singletons");
    return (0..vectors.len()).collect();
  }

  match engine.fit(vectors, k) {
    Ok(assignment) => assignment,
    Err(e) => {
      warn!(error = %e, "clustering failed, falling back to round-robin assignment");
      round_robin(vectors.len(), k)
    }
  }
}

/// `assignment[i] = i % k`
pub fn round_robin(points: usize, k: usize) -> Vec<usize> {
  let k = k.max(1);
  (0..points).map(|i| i % k).collect()
}

/// Clamp a requested cluster count so clusters average at least two items
pub fn optimal_cluster_count(item_count: usize, requested: usize) -> usize {
  requested.max(1).min((item_count / 2).max(1))
}

fn validate(vectors: &[Vec<f32>]) -> Result<(), ClusterError> {
  let expected = vectors[0].len();
  for (index, vector) in vectors.iter().enumerate() {
    if vector.len() != expected {
      return Err(ClusterError::dimension_mismatch(index, expected, vector.len()));
    }
    if vector.iter().any(|x| !x.is_finite()) {
      return Err(ClusterError::NonFiniteComponent { index });
    }
  }
  Ok(())
}

fn squared_distance(a: &[f32], b: &[f64]) -> f64 {
  a.iter().zip(b).map(|(x, c)| (f64::from(*x) - c).powi(2)).sum()
}

fn to_centroid(vector: &[f32]) -> Vec<f64> {
  vector.iter().map(|x| f64::from(*x)).collect()
}

// First centroid is vector 0; each next one is the point farthest from its
// nearest chosen centroid, lowest index on ties.
fn seed_centroids(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<f64>> {
  let mut chosen = vec![0usize];
  let mut centroids = vec![to_centroid(&vectors[0])];

  while centroids.len() < k {
    let mut best: Option<(usize, f64)> = None;
    for (index, vector) in vectors.iter().enumerate() {
      if chosen.contains(&index) {
        continue;
      }
      let nearest = centroids
        .iter()
        .map(|c| squared_distance(vector, c))
        .fold(f64::INFINITY, f64::min);
      if best.map_or(true, |(_, d)| nearest > d) {
        best = Some((index, nearest));
      }
    }

    match best {
      Some((index, _)) => {
        chosen.push(index);
        centroids.push(to_centroid(&vectors[index]));
      }
      None => break,
    }
  }

  centroids
}

fn assign(vectors: &[Vec<f32>], centroids: &[Vec<f64>]) -> Result<Vec<usize>, ClusterError> {
  vectors
    .iter()
    .enumerate()
    .map(|(index, vector)| {
      let mut nearest = 0;
      let mut nearest_distance = f64::INFINITY;
      for (centroid, position) in centroids.iter().enumerate() {
        let distance = squared_distance(vector, position);
        if !distance.is_finite() {
          return Err(ClusterError::NonFiniteDistance { index, centroid });
        }
        // strict comparison keeps the lowest cluster id on ties
        if distance < nearest_distance {
          nearest = centroid;
          nearest_distance = distance;
        }
      }
      Ok(nearest)
    })
    .collect()
}

fn update_centroids(vectors: &[Vec<f32>], assignment: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let dimension = previous.first().map_or(0, Vec::len);
  let mut sums = vec![vec![0.0f64; dimension]; previous.len()];
  let mut counts = vec![0usize; previous.len()];

  for (vector, &cluster) in vectors.iter().zip(assignment) {
    counts[cluster] += 1;
    for (sum, x) in sums[cluster].iter_mut().zip(vector) {
      *sum += f64::from(*x);
    }
  }

  sums
    .into_iter()
    .zip(counts)
    .zip(previous)
    .map(|((sum, count), old)| {
      if count == 0 {
        // an emptied cluster keeps its last position
        old.clone()
      } else {
        sum.into_iter().map(|s| s / count as f64).collect()
      }
    })
    .collect()
}

/// Renumber cluster ids to 0..m in order of first appearance
fn compact_ids(assignment: &[usize]) -> Vec<usize> {
  let mut seen: Vec<usize> = Vec::new();
  assignment
    .iter()
    .map(|id| match seen.iter().position(|s| s == id) {
      Some(position) => position,
      None => {
        seen.push(*id);
        seen.len() - 1
      }
    })
    .collect()
}
