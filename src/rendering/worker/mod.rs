//! A stand-in batch renderer running on its own thread. It doesn't evaluate graphs, every
//! output is filled with a pattern derived from the submitted input values, which is enough
//! to drive the scheduling and caching paths end to end.
pub mod renderer;
pub mod synthesis;
