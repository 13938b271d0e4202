use std::time::Duration;

use rpaflow_types::action::{ActionKind, WaitParams};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::ActionContext;

pub(super) async fn wait(ctx: &ActionContext<'_>, params: WaitParams) -> Result<Value, ActionError> {
    if !params.seconds.is_finite() || params.seconds < 0.0 {
        return Err(ActionError::invalid(
            ActionKind::Wait.as_str(),
            format!("`seconds` must be a non-negative number, got {}", params.seconds),
        ));
    }
    let millis = (params.seconds * 1000.0).round() as u64;
    ctx.info(format!("Waiting {millis}ms"));
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Ok(json!({ "waited": millis }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StepFixture;

    #[tokio::test(start_paused = true)]
    async fn waits_the_requested_time() {
        let fixture = StepFixture::new();
        let started = tokio::time::Instant::now();
        let result = wait(&fixture.ctx(), WaitParams { seconds: 1.5 }).await.unwrap();
        assert_eq!(result, json!({"waited": 1500}));
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn negative_wait_is_rejected() {
        let fixture = StepFixture::new();
        let err = wait(&fixture.ctx(), WaitParams { seconds: -1.0 }).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameters { .. }));
    }
}
