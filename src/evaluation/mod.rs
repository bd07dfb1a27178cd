// Evaluation — precision of learned posteriors against annotated core words.

pub mod ground_truth;
pub mod precision;
pub mod traits;
