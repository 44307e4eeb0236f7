pub mod camera;
pub mod config;
pub mod errors;
pub mod features;
pub mod imgproc;
pub mod io;
pub mod matcher;
pub mod overlay;
pub mod preprocess;
pub mod recognizer;
pub mod runtime;
pub mod session;
pub mod status;
pub mod types;

pub use config::{PermissionPolicy, RecognizerConfig};
pub use matcher::SimilarityScore;
pub use recognizer::Recognizer;
pub use session::{RecognitionSession, RecognitionStatus};
