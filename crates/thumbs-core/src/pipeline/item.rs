use crate::fetcher::StagedImage;

/// Hand-off between the fetch and resize stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionItem {
    /// A fully staged file waiting to be resized.
    Work(StagedImage),
    /// Termination marker; each resize worker consumes exactly one and exits.
    Stop,
}
