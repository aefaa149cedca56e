// Statistical classifiers: trait-based abstraction over trained models.
//
// The Classifier / CalibratedClassifier traits define the interface and
// Model tags a configured model with its calibration. OnnxUrlClassifier
// serves the URL pipeline; LinearTextClassifier serves the text pipeline.

pub mod linear;
pub mod onnx;
pub mod traits;

pub use traits::{
    CalibratedClassifier, ClassProbabilities, Classifier, Label, Model, Prediction, TextModel,
    UrlModel,
};
