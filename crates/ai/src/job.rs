/// A unit of model work over a prepared input snapshot.
///
/// Jobs consume **ledger windows** via their `Input` type. This crate stays
/// storage-agnostic: inputs are provided by callers (infra runners).
pub trait AiJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// The input snapshot the job will run inference on.
    fn input(&self) -> &Self::Input;

    /// Execute inference.
    ///
    /// Must not mutate shared state.
    fn run(&self) -> Result<Self::Output, crate::AiError>;
}
