pub mod builder;
pub mod fallback;
pub mod images;
pub mod response;
pub mod variant;

pub use builder::PromptBuilder;
pub use fallback::fallback_document;
pub use images::ImageSet;
pub use response::{ extract_document, DOCTYPE_MARKER };
pub use variant::Variant;
