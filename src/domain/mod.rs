// Core aggregation engine: no I/O, no collaborators.

pub mod callgraph;
pub mod capture;
pub mod error;
pub mod highlight;
pub mod locals_table;
pub mod normalize;
