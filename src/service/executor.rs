//! Background instruction execution: not_executed -> executing -> succeeded | failed.

use crate::config::TableRegistry;
use crate::error::AppError;
use crate::model::{ExecState, Instruction, NewOperationLog};
use crate::service::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

/// One accepted instruction waiting to run.
#[derive(Clone, Debug)]
pub struct ExecutionJob {
    /// The stored `not_executed` row.
    pub instruction: Instruction,
    pub operator: String,
    pub operator_ip: String,
}

/// Carries an instruction out. An `Err` marks the instruction failed.
#[async_trait]
pub trait InstructionRunner: Send + Sync {
    async fn run(&self, job: &ExecutionJob) -> Result<(), String>;
}

/// Waits a fixed delay and succeeds.
pub struct SimulatedRunner {
    delay: Duration,
}

impl SimulatedRunner {
    pub fn new(delay: Duration) -> Self {
        SimulatedRunner { delay }
    }
}

#[async_trait]
impl InstructionRunner for SimulatedRunner {
    async fn run(&self, _job: &ExecutionJob) -> Result<(), String> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Terminal state for a runner outcome.
pub fn outcome_state(outcome: &Result<(), String>) -> ExecState {
    match outcome {
        Ok(()) => ExecState::Succeeded,
        Err(_) => ExecState::Failed,
    }
}

/// Handle to the execution queue. Cheap to clone.
#[derive(Clone)]
pub struct InstructionExecutor {
    tx: mpsc::Sender<ExecutionJob>,
}

impl InstructionExecutor {
    /// Start the worker. At most `concurrency` jobs run at once; while all permits are
    /// taken the worker stops receiving, so `enqueue` waits once `capacity` jobs are queued.
    /// The worker ends after every handle is dropped and the jobs already started finish.
    pub fn spawn(
        pool: PgPool,
        registry: Arc<TableRegistry>,
        runner: Arc<dyn InstructionRunner>,
        capacity: usize,
        concurrency: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<ExecutionJob>(capacity.max(1));
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let worker = tokio::spawn(async move {
            let mut running = JoinSet::new();
            while let Some(job) = rx.recv().await {
                let permit = match permits.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                while let Some(done) = running.try_join_next() {
                    log_join(done);
                }
                running.spawn(run_job(pool.clone(), registry.clone(), runner.clone(), job, permit));
            }
            tracing::info!(in_flight = running.len(), "instruction queue closed, draining");
            while let Some(done) = running.join_next().await {
                log_join(done);
            }
            tracing::info!("instruction executor stopped");
        });
        (InstructionExecutor { tx }, worker)
    }

    /// Queue a job without waiting for it to run. Waits while the queue is full.
    pub async fn enqueue(&self, job: ExecutionJob) -> Result<(), AppError> {
        self.tx
            .send(job)
            .await
            .map_err(|_| AppError::Internal("instruction queue is closed".into()))
    }
}

fn log_join(done: Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        tracing::error!(error = %e, "instruction task did not complete");
    }
}

async fn run_job(
    pool: PgPool,
    registry: Arc<TableRegistry>,
    runner: Arc<dyn InstructionRunner>,
    job: ExecutionJob,
    _permit: OwnedSemaphorePermit,
) {
    let id = job.instruction.instruction_id.clone();
    if let Err(e) = execute(&pool, &registry, runner.as_ref(), job).await {
        tracing::error!(instruction = %id, error = %e, "instruction execution failed");
    }
}

async fn execute(
    pool: &PgPool,
    registry: &TableRegistry,
    runner: &dyn InstructionRunner,
    job: ExecutionJob,
) -> Result<(), AppError> {
    let started = Utc::now();
    let executing = RecordStore::insert(
        pool,
        registry,
        &job.instruction.transition(ExecState::Executing, Some(started)),
    )
    .await?;
    tracing::info!(instruction = %executing.instruction_id, "instruction executing");

    let outcome = runner.run(&job).await;
    let state = outcome_state(&outcome);
    if let Err(reason) = &outcome {
        tracing::warn!(instruction = %executing.instruction_id, reason = %reason, "instruction failed");
    }

    if let Err(e) = finish(pool, registry, &executing, state, job).await {
        // Every executing row gets a terminal row.
        if let Err(fallback) =
            RecordStore::insert(pool, registry, &executing.transition(ExecState::Failed, None)).await
        {
            tracing::error!(instruction = %executing.instruction_id, error = %fallback, "could not mark instruction failed");
        }
        return Err(e);
    }
    tracing::info!(instruction = %executing.instruction_id, state = %state, "instruction finished");
    Ok(())
}

/// Terminal row and its operation log, in one transaction.
async fn finish(
    pool: &PgPool,
    registry: &TableRegistry,
    executing: &Instruction,
    state: ExecState,
    job: ExecutionJob,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    RecordStore::insert(&mut *tx, registry, &executing.transition(state, None)).await?;
    RecordStore::insert(
        &mut *tx,
        registry,
        &NewOperationLog {
            operator: job.operator,
            operator_ip: job.operator_ip,
            operation_time: Utc::now(),
            record: format!("execute instruction {}", executing.instruction_id),
            satellite_id: executing.satellite_id.clone(),
            satellite_name: executing.satellite_name.clone(),
        },
    )
    .await?;
    tx.commit().await?;
    Ok(())
}
