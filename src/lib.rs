//! # Elicit - Attribute Elicitation and Constraint Matching
//!
//! Elicit is a deterministic rule interpreter for guided recommendation
//! flows. A session asks configuration-driven questions, accumulates typed
//! answers into an attribute store, steers the remaining question set with
//! static rules, derives attributes with a forward production-rule pass,
//! and filters a catalog of candidate objects against the accumulated
//! constraints.
//!
//! ## Core Concepts
//!
//! - **AttrValue**: a tagged value - literal, boolean, number, or a range
//!   marker carrying a direction and a numeric threshold
//! - **AttributeStore**: attribute name to value set, owned by one session
//! - **KnowledgeBase**: the four immutable configuration tables (questions,
//!   objects, static rules, production rules)
//! - **Session**: the per-run state machine producing a `Recommendation`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use elicit::{KnowledgeBase, Session};
//!
//! let kb = KnowledgeBase::from_path("demos/keyboards.json")?;
//! let session = Session::new(kb)?;
//!
//! // Drive the flow with an AnswerSource (e.g. a terminal prompt loop),
//! // then collect the matches.
//! let report = session.run(&mut source)?;
//! println!("{:?}", report.matched);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod condition;
pub mod error;
pub mod knowledge;
pub mod object;
pub mod production;
pub mod question;
pub mod rule;
pub mod session;
pub mod store;
pub mod value;

// Re-export primary types at crate root for convenience
pub use condition::Condition;
pub use error::{ConfigError, ElicitError, ElicitResult, InputError, SessionError};
pub use knowledge::KnowledgeBase;
pub use object::{filter_catalog, CatalogObject};
pub use production::{run_production_pass, PremiseOperator, ProductionRule};
pub use question::{Answer, AnswerOption, Question, QuestionId, QuestionKind, ValueList};
pub use rule::{Rule, RuleId};
pub use session::{AnswerSource, Recommendation, Session, SessionId};
pub use store::AttributeStore;
pub use value::{AttrValue, RangeDirection};
