//! # Weakly-supervised metric learning
//!
//! `metric-learn-weakly` learns Mahalanobis metrics from side information instead of class
//! labels. The supervision is attached to the records as the targets of the dataset:
//!
//! - Least Squared-residual Metric Learning ([`Lsml`]) from relative comparisons
//!   ([`Quadruplets`](metric_learn::constraints::Quadruplets))
//! - Information Theoretic Metric Learning ([`Itml`]) from similar and dissimilar
//!   [`Pairs`](metric_learn::constraints::Pairs)
//! - Sparse Determinant Metric Learning ([`Sdml`]) from a signed
//!   [`SimilarityGraph`](metric_learn::graph::SimilarityGraph), dense or sparse
//! - Relevant Components Analysis ([`Rca`]) from
//!   [`Chunklets`](metric_learn::constraints::Chunklets)
//!
//! The [`sampling`](metric_learn::sampling) module of `metric-learn` draws these constraints
//! from a labeled dataset.
//!
//! ## Example
//!
//! ```no_run
//! use metric_learn::prelude::*;
//! use metric_learn::sampling;
//! use metric_learn_weakly::Itml;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let iris = metric_learn_datasets::iris();
//! let mut rng = Xoshiro256Plus::seed_from_u64(1234);
//! let pairs = sampling::positive_negative_pairs(iris.targets().view(), 200, &mut rng).unwrap();
//!
//! let constrained = DatasetBase::new(iris.records().clone(), pairs);
//! let model = Itml::params().fit(&constrained).unwrap();
//! ```

mod error;
mod itml;
mod lsml;
mod rca;
mod sdml;

pub use error::{Result, WeaklySupervisedError};
pub use itml::*;
pub use lsml::*;
pub use rca::*;
pub use sdml::*;
