//! Email content preview: a literal MJML-subset to HTML rewrite plus the
//! debouncing that keeps re-rendering off the edit path.

pub mod debounce;
pub mod pipeline;
pub mod renderer;

pub use debounce::Debouncer;
pub use pipeline::PreviewPipeline;
pub use renderer::{render_preview, PLACEHOLDER_HTML};
