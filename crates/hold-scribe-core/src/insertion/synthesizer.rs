use crate::InsertionResult;

use async_trait::async_trait;

/// Posts the platform paste chord (Cmd+V / Ctrl+V) to the OS input queue.
#[async_trait]
pub trait InputSynthesizer: Send + Sync {
    /// Emit one paste chord.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when input injection is not trusted, `InjectionBlocked`
    /// when the OS refuses the events.
    async fn post_paste_chord(&self) -> InsertionResult<()>;
}
