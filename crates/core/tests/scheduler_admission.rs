//! Scheduler admission control tests.
//!
//! Drives the scheduler by hand for several limits and backlog sizes and checks
//! the bookkeeping after every advance.

use std::collections::HashSet;
use std::time::Duration;

use bfbatch_core::job::{Job, JobCommand, JobOutcome, JobState};
use bfbatch_core::scheduler::Scheduler;

fn sleeper(i: usize) -> Job {
    // Stagger durations so jobs finish out of order.
    let secs = 0.01 * ((i % 3) + 1) as f32;
    Job::new(
        format!("job{}", i),
        JobCommand::new("sh")
            .arg("-c")
            .arg(format!("sleep {}", secs)),
    )
}

async fn drive(limit: usize, jobs: usize) {
    let mut scheduler = Scheduler::new(limit);
    let ids: Vec<_> = (0..jobs).map(|i| scheduler.submit(sleeper(i))).collect();
    assert_eq!(scheduler.counts().total, jobs);

    let mut seen = HashSet::new();
    let mut advances = 0;
    loop {
        let signal = scheduler.advance();
        advances += 1;

        let counts = scheduler.counts();
        assert!(counts.running <= limit, "limit {} exceeded", limit);
        assert_eq!(counts.backlog + counts.running + counts.done, counts.total);
        assert_eq!(signal == 0, counts.done == counts.total);
        if signal != 0 {
            assert_eq!(signal, counts.running + counts.backlog);
        }

        for id in scheduler.take_finished() {
            assert!(seen.insert(id), "{} reported twice", id);
            assert_eq!(scheduler.job(id).unwrap().state(), JobState::Done);
        }

        if signal == 0 {
            break;
        }
        assert!(advances < 2000, "scheduler made no progress");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(seen.len(), jobs);
    for id in ids {
        let job = scheduler.job_mut(id).unwrap();
        match job.result().await.unwrap() {
            JobOutcome::Exited(result) => assert!(result.success()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_limits_and_backlog_sizes() {
    for limit in [1, 2, 3, 5] {
        for jobs in [0, 1, 4, 7] {
            drive(limit, jobs).await;
        }
    }
}

#[tokio::test]
async fn test_done_jobs_are_never_restarted() {
    let mut scheduler = Scheduler::new(2);
    let id = scheduler.submit(sleeper(0));

    while scheduler.advance() != 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let job = scheduler.job_mut(id).unwrap();
    assert!(job.start().is_err());
    assert_eq!(job.state(), JobState::Done);

    // Settled jobs stay settled across further advances.
    for _ in 0..3 {
        assert_eq!(scheduler.advance(), 0);
        assert_eq!(scheduler.counts().done, 1);
        assert_eq!(scheduler.counts().running, 0);
    }
}

#[tokio::test]
async fn test_jobs_submitted_after_settling_are_picked_up() {
    let mut scheduler = Scheduler::new(1);
    scheduler.submit(sleeper(0));
    while scheduler.advance() != 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(scheduler.is_settled());

    scheduler.submit(sleeper(1));
    assert!(!scheduler.is_settled());
    assert_eq!(scheduler.advance(), 1);
    assert_eq!(scheduler.running_labels(), vec!["job1".to_string()]);
}
