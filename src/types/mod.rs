pub mod date_span;
pub mod location;
pub mod observation;
pub mod processed;
