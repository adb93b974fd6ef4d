//! Error-estimation tests against a live session

// Argument resolution and the error taxonomy
pub mod arguments;

// Single-parameter estimates under every method
pub mod single_parameter;

// Joint fits over several datasets
pub mod multi_dataset;


// Session state: restoration, caching, guesses and reports
pub mod session_state;
