//! C9: bounded-concurrency fan-out over a tabular source, one fresh
//! executor instance per task, incremental sink writes, optional digest-log
//! aggregation scoped to this run's task ids.

use crate::config::BatchConfig;
use crate::csv_io::{BatchResultRow, CsvSink, CsvSource, Record};
use crate::digest::{self, Aggregation};
use crate::error::{BatchError, Result};
use aworld_agents::AgentRegistry;
use aworld_core::{ChatResponse, Usage};
use aworld_executor::{Executor, LocalExecutor, RemoteExecutor};
use aworld_remote::RemoteClient;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Step 6 of the batch algorithm: pull `cost`/`tokens` out of whatever usage
/// shape the response carried, first hit wins. Only the `response.usage.*`
/// levels are reachable here — the executor-level aggregate levels the
/// cascade also names require introspecting a live agent-runtime session,
/// which is outside this crate's surface (see `LocalExecutor::chat`).
fn extract_cost_and_tokens(response: &ChatResponse) -> (Option<f64>, Option<u64>) {
    let Some(usage) = &response.usage else {
        return (None, None);
    };

    match usage {
        Usage {
            input_tokens: Some(input),
            output_tokens: Some(output),
            ..
        } => (usage.cost, Some(input + output)),
        Usage {
            total_tokens: Some(total), ..
        } => (usage.cost, Some(*total)),
        _ => (usage.cost, None),
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_cost: f64,
    pub duration_secs: f64,
    pub output_path: String,
    #[serde(skip)]
    pub digest: Option<Aggregation>,
}

fn generate_task_id(record_id: &str) -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("batch_{record_id}_{suffix:08x}")
}

async fn build_executor(
    registry: &Arc<AgentRegistry>,
    config: &BatchConfig,
    session_id: String,
) -> Result<Box<dyn Executor>> {
    if let Some(backend) = &config.agent.remote_backend {
        let client = RemoteClient::new(backend.clone(), "batch", session_id).with_live_display_disabled();
        return Ok(Box::new(RemoteExecutor::new(client, config.agent.name.clone())));
    }

    let executor = LocalExecutor::build(registry, &config.agent.name, None, session_id)
        .await
        .map_err(|_| BatchError::AgentNotFound(config.agent.name.clone()))?;
    Ok(Box::new(executor))
}

/// Run the whole batch described by `config`, resolving agents through
/// `registry`. Returns a summary; also consults the digest log (if
/// configured) filtered to this run's generated task ids when running
/// against a remote backend.
pub async fn run(config: &BatchConfig, registry: Arc<AgentRegistry>) -> Result<BatchSummary> {
    let started = Instant::now();
    let source = CsvSource::load(&config.input.path, config.input.delimiter, &config.input.query_column)?;
    let mut sink = CsvSink::new(&config.output.path, config.output.delimiter);

    let semaphore = Arc::new(Semaphore::new(config.execution.parallel.max(1)));
    let mut task_ids: HashSet<String> = HashSet::new();
    let mut handles = Vec::new();

    for record in source.records() {
        let record = record.clone();
        let record_id = record.get("row_id").cloned().unwrap_or_default();
        let prompt = record.get(&config.input.query_column).cloned().unwrap_or_default();
        let task_id = generate_task_id(&record_id);
        task_ids.insert(task_id.clone());

        let semaphore = semaphore.clone();
        let config = config.clone();
        let registry = registry.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
            run_one(&registry, &config, record, record_id, prompt, task_id).await
        });
        handles.push(handle);
    }

    let mut total_cost = 0.0;
    let mut success_count = 0;
    let mut failure_count = 0;

    for handle in handles {
        let row = match handle.await {
            Ok(row) => row,
            Err(join_err) => BatchResultRow {
                record_id: "unknown".to_string(),
                success: false,
                response: String::new(),
                error: Some(join_err.to_string()),
                cost: None,
                tokens: None,
                latency: None,
                original_record: Record::new(),
            },
        };

        if row.success {
            success_count += 1;
        } else {
            failure_count += 1;
        }
        total_cost += row.cost.unwrap_or(0.0);
        sink.write_row(row)?;
    }

    sink.finalize()?;

    let digest_aggregation = match &config.digest_log {
        Some(digest_config) if digest_config.path.is_file() => {
            let filter = config.agent.remote_backend.as_ref().map(|_| task_ids.clone());
            match digest::aggregate(&digest_config.path, 0, filter.as_ref()) {
                Ok((aggregation, _)) => Some(aggregation),
                Err(err) => {
                    warn!(error = %err, "failed to aggregate digest log");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(BatchSummary {
        total: success_count + failure_count,
        success_count,
        failure_count,
        total_cost,
        duration_secs: started.elapsed().as_secs_f64(),
        output_path: config.output.path.display().to_string(),
        digest: digest_aggregation,
    })
}

async fn run_one(
    registry: &Arc<AgentRegistry>,
    config: &BatchConfig,
    record: Record,
    record_id: String,
    prompt: String,
    task_id: String,
) -> BatchResultRow {
    let start = Instant::now();
    let executor = match build_executor(registry, config, task_id.clone()).await {
        Ok(executor) => executor,
        Err(err) => {
            return BatchResultRow {
                record_id,
                success: false,
                response: String::new(),
                error: Some(err.to_string()),
                cost: None,
                tokens: None,
                latency: Some(start.elapsed().as_secs_f64()),
                original_record: record,
            };
        }
    };

    debug!(record_id, task_id, "dispatching batch record");

    let chat_future = executor.chat(&prompt, Some(&task_id));
    let outcome = match config.execution.timeout_per_task {
        Some(seconds) => match tokio::time::timeout(Duration::from_secs(seconds), chat_future).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("Timeout after {seconds}s")),
        },
        None => chat_future.await.map_err(|e| e.to_string()),
    };

    let latency = start.elapsed().as_secs_f64();
    match outcome {
        Ok(response) => {
            let (cost, tokens) = extract_cost_and_tokens(&response);
            BatchResultRow {
                record_id,
                success: true,
                response: response.text,
                error: None,
                cost,
                tokens,
                latency: Some(latency),
                original_record: record,
            }
        }
        Err(error) => BatchResultRow {
            record_id,
            success: false,
            response: String::new(),
            error: Some(error),
            cost: None,
            tokens: None,
            latency: Some(latency),
            original_record: record,
        },
    }
}
