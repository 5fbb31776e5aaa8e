/// Lifecycle of one client session.
///
/// `Loading` only occurs at startup while tokens are read back from durable
/// storage; `Refreshing` is a transient sub-state of an authenticated
/// session while the token pair rotates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Loading,
    Anonymous,
    Authenticated,
    Refreshing,
}
