//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` so handlers can extract a single field.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<SynonymResolver>, resolver);
/// // Handlers can then take `State(resolver): State<Arc<SynonymResolver>>`.
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
