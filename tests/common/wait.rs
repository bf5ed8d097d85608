//! Await a subscription until its render model satisfies a condition

use std::time::Duration;
use todosync::client::sync::{
    HealthRenderModel, HealthSubscription, TodoRenderModel, TodoSubscription,
};

/// Generous under a real clock, and still ahead of the poll timers under a
/// paused one
const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub async fn wait_for_todos(
    subscription: &mut TodoSubscription,
    done: impl Fn(&TodoRenderModel) -> bool,
) -> TodoRenderModel {
    let current = subscription.current();
    if done(&current) {
        return current;
    }
    tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let model = subscription.changed().await.expect("subscription closed");
            if done(&model) {
                return model;
            }
        }
    })
    .await
    .expect("timed out waiting for todo model")
}

pub async fn wait_for_health(
    subscription: &mut HealthSubscription,
    done: impl Fn(&HealthRenderModel) -> bool,
) -> HealthRenderModel {
    let current = subscription.current();
    if done(&current) {
        return current;
    }
    tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let model = subscription.changed().await.expect("subscription closed");
            if done(&model) {
                return model;
            }
        }
    })
    .await
    .expect("timed out waiting for health model")
}

/// Yield until `condition` holds; for counters bumped by spawned tasks
pub async fn settle_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
