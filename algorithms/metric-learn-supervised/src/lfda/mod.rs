//! Local Fisher Discriminant Analysis
//!
//! LFDA combines Fisher discriminant analysis with locality preserving projections. Pairs of
//! the same class only count with their local affinity, which keeps multimodal classes apart
//! inside the embedding. The projection solves a generalized eigenproblem of the local
//! between-class and within-class scatter matrices.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
