use ndarray::ArrayView1;
use num_traits::{Float, FromPrimitive, ToPrimitive};

/// Pairwise similarity between two equal-length feature vectors.
pub trait SimilarityMeasure {
    fn calculate<T>(&self, a: ArrayView1<T>, b: ArrayView1<T>) -> f64
    where
        T: Float + FromPrimitive + ToPrimitive;
}

/// Absolute cosine similarity for unit-scaled vectors.
///
/// Inputs are expected to already be scaled to unit L2 norm, so the absolute
/// dot product is the full cosine and lands in [0, 1]. Used as a redundancy
/// signal: 1 means the two columns carry the same direction up to sign.
pub struct AbsoluteCosine;

impl SimilarityMeasure for AbsoluteCosine {
    fn calculate<T>(&self, a: ArrayView1<T>, b: ArrayView1<T>) -> f64
    where
        T: Float + FromPrimitive + ToPrimitive,
    {
        let mut dot = T::zero();
        for i in 0..a.len() {
            dot = dot + a[i] * b[i];
        }
        dot.to_f64().unwrap().abs()
    }
}
