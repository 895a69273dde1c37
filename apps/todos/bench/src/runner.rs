use chrono::Utc;
use domain_todos::TodoDraft;
use futures::{StreamExt, stream};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::driver::Driver;
use crate::stats::{Operation, Summary};

#[derive(Debug)]
pub struct Report {
    pub protocol: &'static str,
    pub iterations: usize,
    pub failures: usize,
    pub elapsed: Duration,
    pub latencies: BTreeMap<Operation, Vec<Duration>>,
}

impl Report {
    pub fn summary(&self, operation: Operation) -> Option<Summary> {
        self.latencies
            .get(&operation)
            .and_then(|samples| Summary::from_samples(samples.clone()))
    }

    pub fn log(&self) {
        let throughput = self.iterations.saturating_sub(self.failures) as f64
            / self.elapsed.as_secs_f64().max(f64::EPSILON);

        info!(
            protocol = self.protocol,
            iterations = self.iterations,
            failures = self.failures,
            elapsed = ?self.elapsed,
            iterations_per_sec = throughput,
            "load run finished"
        );

        for operation in Operation::ALL {
            if let Some(s) = self.summary(operation) {
                info!(
                    %operation,
                    samples = s.samples,
                    min = ?s.min,
                    p50 = ?s.p50,
                    p95 = ?s.p95,
                    p99 = ?s.p99,
                    max = ?s.max,
                    mean = ?s.mean,
                    "latency"
                );
            }
        }
    }
}

/// Runs `count` iterations with at most `concurrency` in flight.
pub async fn run(driver: Arc<dyn Driver>, count: usize, concurrency: usize) -> Report {
    let run_id = Utc::now().timestamp_millis();
    let started = Instant::now();

    let outcomes: Vec<_> = stream::iter(0..count)
        .map(|i| {
            let driver = Arc::clone(&driver);
            async move { iteration(driver.as_ref(), run_id, i).await }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = Report {
        protocol: driver.protocol(),
        iterations: count,
        failures: 0,
        elapsed: started.elapsed(),
        latencies: BTreeMap::new(),
    };

    for outcome in outcomes {
        match outcome {
            Ok(timings) => {
                for (operation, latency) in timings {
                    report.latencies.entry(operation).or_default().push(latency);
                }
            }
            Err(e) => {
                if report.failures == 0 {
                    warn!(error = ?e, "iteration failed");
                }
                report.failures += 1;
            }
        }
    }

    report
}

async fn timed<T>(
    timings: &mut Vec<(Operation, Duration)>,
    operation: Operation,
    call: impl Future<Output = eyre::Result<T>>,
) -> eyre::Result<T> {
    let started = Instant::now();
    let value = call.await?;
    timings.push((operation, started.elapsed()));
    Ok(value)
}

async fn iteration(
    driver: &dyn Driver,
    run_id: i64,
    index: usize,
) -> eyre::Result<Vec<(Operation, Duration)>> {
    let mut timings = Vec::with_capacity(Operation::ALL.len());
    let draft = TodoDraft::new(
        format!("bench-{run_id}-{index}"),
        Utc::now() + chrono::Duration::days(1),
    )
    .with_description("load test");

    let id = timed(&mut timings, Operation::Create, driver.create(&draft)).await?;

    let rest = async {
        timed(&mut timings, Operation::Get, driver.get(id)).await?;
        timed(
            &mut timings,
            Operation::Update,
            driver.update(id, &draft.clone().completed(true)),
        )
        .await?;
        timed(&mut timings, Operation::List, driver.list()).await?;
        timed(&mut timings, Operation::Delete, driver.delete(id)).await
    };

    if let Err(e) = rest.await {
        // leave no bench rows behind
        let _ = driver.delete(id).await;
        return Err(e.wrap_err(format!("iteration {index} (todo {id})")));
    }

    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain_todos::{InMemoryTodoRepository, TodoRepository};

    struct InProcess(InMemoryTodoRepository);

    #[async_trait]
    impl Driver for InProcess {
        fn protocol(&self) -> &'static str {
            "in-process"
        }

        async fn create(&self, draft: &TodoDraft) -> eyre::Result<i32> {
            Ok(self.0.insert_todo(draft.clone()).await?)
        }

        async fn get(&self, id: i32) -> eyre::Result<()> {
            self.0.select_todo(id).await?;
            Ok(())
        }

        async fn update(&self, id: i32, draft: &TodoDraft) -> eyre::Result<()> {
            Ok(self.0.update_todo(id, draft.clone()).await?)
        }

        async fn list(&self) -> eyre::Result<usize> {
            Ok(self.0.select_todos(None).await?.len())
        }

        async fn delete(&self, id: i32) -> eyre::Result<()> {
            Ok(self.0.delete_todo(id).await?)
        }
    }

    /// Creates succeed, every read fails
    struct BrokenReads(InProcess);

    #[async_trait]
    impl Driver for BrokenReads {
        fn protocol(&self) -> &'static str {
            "broken"
        }

        async fn create(&self, draft: &TodoDraft) -> eyre::Result<i32> {
            self.0.create(draft).await
        }

        async fn get(&self, _id: i32) -> eyre::Result<()> {
            eyre::bail!("connection reset")
        }

        async fn update(&self, id: i32, draft: &TodoDraft) -> eyre::Result<()> {
            self.0.update(id, draft).await
        }

        async fn list(&self) -> eyre::Result<usize> {
            self.0.list().await
        }

        async fn delete(&self, id: i32) -> eyre::Result<()> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_run_records_every_operation() {
        let repository = InMemoryTodoRepository::new();
        let driver = Arc::new(InProcess(repository.clone()));

        let report = run(driver, 20, 4).await;

        assert_eq!(report.protocol, "in-process");
        assert_eq!(report.iterations, 20);
        assert_eq!(report.failures, 0);
        for operation in Operation::ALL {
            assert_eq!(report.summary(operation).unwrap().samples, 20);
        }
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_iterations_are_counted_and_cleaned_up() {
        let repository = InMemoryTodoRepository::new();
        let driver = Arc::new(BrokenReads(InProcess(repository.clone())));

        let report = run(driver, 5, 2).await;

        assert_eq!(report.failures, 5);
        assert_eq!(report.summary(Operation::Create).unwrap().samples, 5);
        assert!(report.summary(Operation::Get).is_none());
        assert!(repository.is_empty().await);
    }
}
