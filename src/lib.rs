pub mod console;
pub mod property_path;
pub mod scene;

// Concept graph + verb execution
pub mod graph;
pub mod matrix;
pub mod registry;
pub mod script_diagnostics;
pub mod scripting;
pub mod scripts;

// Animation + routing
pub mod oscillator;
pub mod router;

// Backend + AI fallback boundary
pub mod backend;
pub mod fallback;
pub mod knowledge;
pub mod retrieval;

pub mod cli;
