use ndarray::{Array1, Array2};
use tracing::trace;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa. Iterating over it yields the pairs in
/// the order of `L`.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// Square matrix of transition probabilities, entry `(i, j)` is the probability of moving
/// from the state with index `i` to the state with index `j`.
pub type Matrix = Array2<f64>;

/// Probability vector indexed by states.
pub type Vector = Array1<f64>;

/// Computes `matrix^k` through exponentiation by squaring, which needs `O(log k)` matrix
/// products. For `k = 0` the identity is returned.
pub fn matrix_power(matrix: &Matrix, mut k: usize) -> Matrix {
    debug_assert!(matrix.is_square());
    let mut result = Matrix::eye(matrix.nrows());
    let mut base = matrix.clone();
    let mut squarings = 0;

    while k > 0 {
        if k & 1 == 1 {
            result = result.dot(&base);
        }
        k >>= 1;
        if k > 0 {
            base = base.dot(&base);
            squarings += 1;
        }
    }

    trace!("computed matrix power with {squarings} squarings");
    result
}

/// Computes `matrix^k` by `k` successive multiplications. This is the reference that
/// [`matrix_power`] is checked against and it is only sensible for small `k`.
pub fn matrix_power_naive(matrix: &Matrix, k: usize) -> Matrix {
    (0..k).fold(Matrix::eye(matrix.nrows()), |acc, _| acc.dot(matrix))
}

/// Builds a vector of length `size` that is `1` at `index` and `0` everywhere else.
pub fn one_hot(size: usize, index: usize) -> Vector {
    let mut v = Vector::zeros(size);
    v[index] = 1.0;
    v
}

/// Compares two floating point numbers for equality within an absolute `delta`.
/// # Example
/// ```
/// use pfa::prelude::*;
/// assert!(math::almost_equal(0.7, 0.71, 0.1));
/// assert!(!math::almost_equal(0.7, 0.91, 0.1));
/// ```
pub fn almost_equal(l: f64, r: f64, delta: f64) -> bool {
    l == r || (l - r).abs() <= delta
}

/// Accumulates mean and variance of a stream of samples in a single pass (Welford's method).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// The number of samples seen so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The sample mean, `0` if no sample was seen.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The (Bessel corrected) sample variance, `0` for fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// The sample standard deviation.
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The standard error of the mean, i.e. `stddev / sqrt(count)`.
    pub fn standard_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.stddev() / (self.count as f64).sqrt()
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        iter.into_iter().fold(Self::new(), |mut acc, x| {
            acc.push(x);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn fast_power_matches_naive_power() {
        let m: Matrix = array![[0.5, 0.5, 0.0], [0.3, 0.6, 0.1], [0.0, 0.25, 0.75]];
        for k in [0, 1, 2, 5, 16, 100] {
            let fast = matrix_power(&m, k);
            let naive = matrix_power_naive(&m, k);
            for (a, b) in fast.iter().zip(naive.iter()) {
                assert!((a - b).abs() < 1e-9, "k = {k}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn power_zero_is_identity() {
        let m: Matrix = array![[0.0, 1.0], [1.0, 0.0]];
        assert_eq!(matrix_power(&m, 0), Matrix::eye(2));
        assert_eq!(matrix_power(&m, 3), m);
    }

    #[test]
    fn running_stats() {
        let stats: RunningStats = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert_eq!(stats.count(), 4);
        assert!(almost_equal(stats.mean(), 2.5, 1e-12));
        assert!(almost_equal(stats.variance(), 5.0 / 3.0, 1e-12));
        assert!(almost_equal(
            stats.standard_error(),
            (5.0f64 / 3.0).sqrt() / 2.0,
            1e-12
        ));

        let single: RunningStats = [0.25].into_iter().collect();
        assert_eq!(single.variance(), 0.0);
        assert_eq!(RunningStats::new().standard_error(), 0.0);
    }
}
