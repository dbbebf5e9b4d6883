#[cfg(test)]
mod tests {
    use crate::job::JobRunner;
    use chrono::{DateTime, TimeZone, Utc};
    use saunabook_common::SaunaError;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 17, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_successful_run_is_recorded() {
        let runner = JobRunner::<u32>::new("test_job", Duration::from_secs(60));

        assert_eq!(runner.run(started(), async { Ok(3) }).await, Ok(3));

        let status = runner.status().await;
        assert!(!status.is_running);
        assert_eq!(status.last_run, Some(started()));
        assert_eq!(status.last_result, Some(3));
        assert_eq!(status.error, None);
        assert!(status.last_duration_ms.is_some());
        assert_eq!(status.run_count, 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_cleared_by_next_success() {
        let runner = JobRunner::<u32>::new("test_job", Duration::from_secs(60));

        let failed = runner
            .run(started(), async { Err(SaunaError::Database("disk full".into())) })
            .await;
        assert!(failed.is_err());
        let status = runner.status().await;
        assert_eq!(status.last_result, None);
        assert!(status.error.unwrap().contains("disk full"));

        runner.run(started(), async { Ok(1) }).await.unwrap();
        let status = runner.status().await;
        assert_eq!(status.error, None);
        assert_eq!(status.last_result, Some(1));
        assert_eq!(status.run_count, 2);
    }

    #[tokio::test]
    async fn test_second_trigger_is_rejected_while_running() {
        let runner = Arc::new(JobRunner::<u32>::new("test_job", Duration::from_secs(60)));
        let (release, hold) = oneshot::channel::<()>();

        let first = {
            let runner = runner.clone();
            tokio::spawn(async move {
                runner
                    .run(started(), async move {
                        let _ = hold.await;
                        Ok(7)
                    })
                    .await
            })
        };
        while !runner.is_running() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            runner.run(started(), async { Ok(1) }).await,
            Err(SaunaError::JobAlreadyRunning("test_job".into()))
        );
        assert!(runner.status().await.is_running);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Ok(7));
        assert!(!runner.is_running());
        // The rejected trigger is not a run
        assert_eq!(runner.status().await.run_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_run_times_out_and_frees_the_job() {
        let runner = JobRunner::<u32>::new("test_job", Duration::from_secs(5));

        let outcome = runner
            .run(started(), async {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(1)
            })
            .await;
        assert!(matches!(outcome, Err(SaunaError::JobTimeout(_))));

        let status = runner.status().await;
        assert!(!status.is_running);
        assert!(status.error.is_some());
        assert!(status.last_duration_ms >= Some(5000));

        assert_eq!(runner.run(started(), async { Ok(2) }).await, Ok(2));
    }
}
