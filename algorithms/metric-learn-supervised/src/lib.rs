//! # Supervised metric learning
//!
//! `metric-learn-supervised` learns Mahalanobis metrics from class labels.
//!
//! ## The Big Picture
//!
//! `metric-learn-supervised` is a crate in the `metric-learn` workspace, a collection of
//! Mahalanobis metric learners written in pure Rust on top of `ndarray`.
//!
//! ## Current state
//!
//! `metric-learn-supervised` currently provides an implementation of the following methods:
//!
//! - Large Margin Nearest Neighbor ([`Lmnn`])
//! - Neighbourhood Components Analysis ([`Nca`])
//! - Local Fisher Discriminant Analysis ([`Lfda`])
//!
//! Every fitted model implements [`MahalanobisMetric`](metric_learn::metric::MahalanobisMetric)
//! and can be used as a [`Transformer`](metric_learn::traits::Transformer) of records.
//!
//! ## Example
//!
//! ```no_run
//! use metric_learn::prelude::*;
//! use metric_learn_supervised::Lfda;
//!
//! let iris = metric_learn_datasets::iris();
//! let model = Lfda::<f64>::params().n_components(2).k(2).fit(&iris).unwrap();
//!
//! let embedded = model.transform(iris.records());
//! assert_eq!(embedded.ncols(), 2);
//! ```

mod error;
mod lfda;
mod lmnn;
mod nca;
mod utils;

pub use error::{Result, SupervisedError};
pub use lfda::*;
pub use lmnn::*;
pub use nca::*;
