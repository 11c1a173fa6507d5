/// Schema resolution module.
///
/// The resolver turns raw schema declarations into per-template storage
/// metadata once per load; the classifier answers cross-document questions
/// against that metadata afterwards.
mod classifier;
mod resolver;

pub use classifier::ReferenceClassifier;
pub use resolver::SchemaResolver;
