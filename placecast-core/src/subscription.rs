use tokio::task::JoinHandle;

/// Guard for a spawned listener. Dropping it unsubscribes.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the listener. Equivalent to dropping the guard.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn drop_aborts_listener() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let sub = Subscription::new(tokio::spawn(async move {
            let _tx = tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }));
        assert!(sub.is_active());

        drop(sub);
        // The sender is released once the aborted task is torn down.
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_with_drop() {
        let sub = Subscription::new(tokio::spawn(async {}));
        sub.unsubscribe();
    }
}
