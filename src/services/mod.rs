// Intake
pub mod intake;
pub mod quantity;

// Task assignment
pub mod allocation;

// Labels and scanning
pub mod barcode;
pub mod labels;
pub mod scan;
