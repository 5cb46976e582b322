pub mod nodes;

pub use nodes::Program;
