//! `metric-learn` provides the common ground for Mahalanobis metric learning in Rust.
//!
//! A metric learner consumes labeled points or weak supervision (pairs, relative comparisons,
//! similarity graphs, chunklets) and produces a linear map `L` such that the learned
//! Mahalanobis matrix is `M = LᵀL`. Points are embedded into the learned space with
//! `X·Lᵀ`, where plain Euclidean distances equal the learned distances.
//!
//! ## The Big Picture
//!
//! This crate holds everything the learners share:
//!
//! * the [`DatasetBase`](dataset::DatasetBase) container and the [`Fit`](traits::Fit) /
//! [`Transformer`](traits::Transformer) traits,
//! * hyperparameter validation through [`ParamGuard`],
//! * the fitted-model contract [`MahalanobisMetric`](metric::MahalanobisMetric),
//! * constraint containers and [`sampling`] helpers to draw them from labels,
//! * the small dense linear-algebra toolbox in [`linalg`],
//! * evaluation helpers in [`metrics`].
//!
//! The learners themselves live in `metric-learn-supervised` (LMNN, NCA, LFDA) and
//! `metric-learn-weakly` (LSML, ITML, SDML, RCA).

pub mod benchmarks;
pub mod constraints;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod linalg;
pub mod metric;
pub mod metrics;
mod param_guard;
pub mod prelude;
pub mod sampling;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, Label};
pub use error::Error;
pub use param_guard::ParamGuard;
