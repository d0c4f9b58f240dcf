//! Newick tree parsing/writing, neighbor-joining, and the rerooted-tree
//! overlap tables used to map phylogenies onto covariance matrices.

mod error;
mod newick;
mod nj;
mod rerooted;

pub use error::TreeError;
pub use newick::{parse, Node};
pub use nj::neighbor_join;
pub use rerooted::{tree_to_c, RerootedTree};
