pub mod assemble;
pub mod bsp;
pub mod chain;
pub mod edge_list;
pub mod engine;
pub mod select;

pub(crate) mod face_edges;
pub(crate) mod intersect_curves;
pub(crate) mod probe;
pub(crate) mod split;
pub(crate) mod trim;

pub use assemble::make_from_assembly_of;
pub use engine::{make_from_difference_of, make_from_union_of};
pub use select::{BooleanKind, ShellClass};

pub(crate) use face_edges::ShellScratch;
