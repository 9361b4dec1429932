/*!
 * Evaluator Module
 * Staged decision pipeline and its evaluation contexts
 */

pub mod context;
pub mod engine;

pub use context::{EvaluationContext, RequestContext};
pub use engine::{Evaluator, Stage, StageDecision};
