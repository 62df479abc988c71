//! Step template compilation for haibun.
//!
//! A template such as `set {what} to {value:number}` is compiled once into an
//! anchored matcher. Each placeholder accepts six textual forms, and the form
//! that matched decides where the value comes from at run time (see
//! [`Origin`]). The runtime crate layers variable population and domain
//! coercion on top of the [`Capture`] records produced here.

mod capture;
mod errors;
mod keyword;
mod origin;
mod pattern;

pub use capture::Capture;
pub use errors::{PatternError, PlaceholderErrorInfo};
pub use keyword::{StepKeyword, StepKeywordParseError, normalize_exact, strip_prefixes};
pub use origin::Origin;
pub use pattern::{
    CompiledTemplate, DEFAULT_DOMAIN, Placeholder, STATEMENT_DOMAIN, build_template_regex,
    compile_template,
};
