pub mod clean;
pub mod detect;
pub mod load;
pub mod pipeline;
pub mod status;
