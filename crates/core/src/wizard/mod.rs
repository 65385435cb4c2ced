pub mod controller;
pub mod reducer;

pub use controller::{WizardController, WIZARD_STORE_KEY};
pub use reducer::{reduce, Reduction, StepChange, WizardAction};
