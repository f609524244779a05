//! Declarative macros for ergonomic effect construction
//!
//! Store reducers mostly emit one kind of effect: an async call against the
//! checklist service whose outcome is fed back as an action.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use checklist_core::async_effect;
///
/// async_effect! {
///     match api.delete_list(&token, &id).await {
///         Ok(()) => Some(ListsAction::ListDeleted { id, mutation }),
///         Err(error) => Some(ListsAction::DeleteFailed { id, mutation, error }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug)]
    enum TestAction {
        Fetched { count: usize },
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Fetched { count: 3 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_async_effect_macro_resolves() {
        let effect = async_effect! {
            Some(TestAction::Fetched { count: 3 })
        };

        let Effect::Future(fut) = effect else {
            panic!("expected a future effect");
        };
        let action = tokio_test::block_on(fut);
        assert!(matches!(action, Some(TestAction::Fetched { count: 3 })));
    }
}
