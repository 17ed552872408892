//! The seam between callers and assessment methods.

use crate::assessment::{Assessment, SkillRequest};
use crate::error::AssessmentError;

/// A method that turns one test record and its training data into a skill
/// score.
///
/// Implementations must not keep state between calls; the batch engine runs
/// them concurrently from blocking worker threads.
pub trait AssessmentMethod: Send + Sync {
    /// Short method name recorded in reports (e.g. "fuzzy").
    fn name(&self) -> &str;

    /// Assess `request.test_record`.
    fn compute_skill(&self, request: &SkillRequest) -> Result<Assessment, AssessmentError>;
}
