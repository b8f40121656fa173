/// Fatal, non-diagnostic failures. Nearly everything in this crate reports
/// through [`crate::Diagnostics`] instead; this enum exists only for the
/// handful of truly unrecoverable conditions called out in the error
/// handling design (recursion limits, internal panics translated at a
/// public call's boundary).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("recursion limit exceeded while parsing")]
    RecursionLimitExceeded,

    #[error("internal error in {component}: {message}")]
    Internal { component: &'static str, message: String },
}
