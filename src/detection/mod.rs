pub mod preprocessing;
pub mod segment;
pub mod classify;
pub mod merge;
pub mod grouping;
pub mod ocr;
pub mod rgroup;
pub mod structure;
pub mod validate;

pub use classify::{ClassifierKind, KMeansClassifier, KruskalClassifier, PanelClassifier};
pub use grouping::label_diags;
pub use merge::merge;
pub use ocr::{OcrsRecognizer, TextRecognizer, clean_output};
pub use rgroup::detect_r_group;
pub use segment::{clean, segment};
pub use structure::{OsraRecognizer, Recognition, StructureRecognizer};
