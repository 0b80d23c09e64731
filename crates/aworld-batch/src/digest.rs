//! C11: aggregates the three digest-event families emitted by the agent
//! runtime's logging pipe into counts/sums suitable for a CLI summary panel.
//! Supports incremental re-reads via a starting byte offset so a caller can
//! tail a growing log file.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

const PREFIXES: [&str; 3] = ["agent_run|", "run_task|", "llm_call|"];
const ERROR_PREVIEW_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub enum DigestEvent {
    AgentRun {
        agent: String,
        task: String,
        duration: f64,
    },
    RunTask {
        agent: String,
        task: String,
        status: String,
        duration: f64,
        error: Option<String>,
    },
    LlmCall {
        agent: String,
        model: String,
        task: String,
        total: u64,
        prompt: u64,
        completion: u64,
        duration: f64,
    },
}

impl DigestEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::AgentRun { task, .. } | Self::RunTask { task, .. } | Self::LlmCall { task, .. } => task,
        }
    }
}

/// Locate the earliest occurrence of a known metric prefix anywhere in
/// `line` and parse the positional fields that follow it.
fn parse_line(line: &str) -> Option<DigestEvent> {
    let (prefix, start) = PREFIXES.iter().filter_map(|p| line.find(p).map(|idx| (*p, idx))).min_by_key(|(_, idx)| *idx)?;

    let rest = &line[start + prefix.len()..];
    let rest = rest.trim_end_matches('}').trim_end();
    let fields: Vec<&str> = rest.split('|').collect();

    match prefix {
        "agent_run|" => {
            if fields.len() < 5 {
                return None;
            }
            Some(DigestEvent::AgentRun {
                agent: fields[0].to_string(),
                task: fields[3].to_string(),
                duration: fields[4].parse().ok()?,
            })
        }
        "run_task|" => {
            if fields.len() < 7 {
                return None;
            }
            Some(DigestEvent::RunTask {
                agent: fields[1].to_string(),
                task: fields[4].to_string(),
                status: fields[5].to_string(),
                duration: fields[6].parse().ok()?,
                error: fields.get(7).map(|s| s.chars().take(ERROR_PREVIEW_LIMIT).collect()),
            })
        }
        "llm_call|" => {
            if fields.len() < 9 {
                return None;
            }
            Some(DigestEvent::LlmCall {
                agent: fields[0].to_string(),
                model: fields[1].to_string(),
                task: fields[4].to_string(),
                total: fields[5].parse().ok()?,
                prompt: fields[6].parse().ok()?,
                completion: fields[7].parse().ok()?,
                duration: fields[8].parse().ok()?,
            })
        }
        _ => None,
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunTaskStats {
    pub by_status: HashMap<String, u64>,
    pub total_duration: f64,
    pub count: u64,
    pub by_agent_status: HashMap<String, HashMap<String, u64>>,
    pub errors: Vec<String>,
}

impl RunTaskStats {
    pub fn avg_duration(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_duration / self.count as f64
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct AgentRunStats {
    pub count: u64,
    pub total_duration: f64,
    pub by_agent: HashMap<String, (u64, f64)>,
}

impl AgentRunStats {
    pub fn avg_duration(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_duration / self.count as f64
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LlmCallBreakdown {
    pub calls: u64,
    pub tokens: u64,
    pub duration: f64,
}

#[derive(Debug, Default, Clone)]
pub struct LlmCallStats {
    pub count: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_duration: f64,
    pub by_model: HashMap<String, LlmCallBreakdown>,
    pub by_agent: HashMap<String, LlmCallBreakdown>,
}

#[derive(Debug, Default, Clone)]
pub struct Aggregation {
    pub run_task: RunTaskStats,
    pub agent_run: AgentRunStats,
    pub llm_call: LlmCallStats,
}

fn apply(aggregation: &mut Aggregation, event: DigestEvent) {
    match event {
        DigestEvent::AgentRun { agent, duration, .. } => {
            aggregation.agent_run.count += 1;
            aggregation.agent_run.total_duration += duration;
            let entry = aggregation.agent_run.by_agent.entry(agent).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += duration;
        }
        DigestEvent::RunTask { agent, status, duration, error, .. } => {
            aggregation.run_task.count += 1;
            aggregation.run_task.total_duration += duration;
            *aggregation.run_task.by_status.entry(status.clone()).or_insert(0) += 1;
            *aggregation
                .run_task
                .by_agent_status
                .entry(agent)
                .or_default()
                .entry(status)
                .or_insert(0) += 1;
            if let Some(error) = error.filter(|e| !e.is_empty()) {
                aggregation.run_task.errors.push(error);
            }
        }
        DigestEvent::LlmCall {
            agent,
            model,
            total,
            prompt,
            completion,
            duration,
            ..
        } => {
            aggregation.llm_call.count += 1;
            aggregation.llm_call.prompt_tokens += prompt;
            aggregation.llm_call.completion_tokens += completion;
            aggregation.llm_call.total_tokens += total;
            aggregation.llm_call.total_duration += duration;

            let by_model = aggregation.llm_call.by_model.entry(model).or_default();
            by_model.calls += 1;
            by_model.tokens += total;
            by_model.duration += duration;

            let by_agent = aggregation.llm_call.by_agent.entry(agent).or_default();
            by_agent.calls += 1;
            by_agent.tokens += total;
            by_agent.duration += duration;
        }
    }
}

/// Read `path` starting at `from_offset`, aggregate every parseable line
/// (optionally restricted to `filter`'s task ids), and return the
/// aggregation plus the new byte offset for a subsequent incremental read.
pub fn aggregate(path: &Path, from_offset: u64, filter: Option<&HashSet<String>>) -> std::io::Result<(Aggregation, u64)> {
    use std::io::{Read, Seek, SeekFrom};

    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(from_offset))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    let consumed = from_offset + buf.len() as u64;

    let mut aggregation = Aggregation::default();
    for line in buf.lines() {
        let Some(event) = parse_line(line) else { continue };
        if let Some(filter) = filter {
            if !filter.contains(event.task_id()) {
                continue;
            }
        }
        apply(&mut aggregation, event);
    }

    Ok((aggregation, consumed))
}

fn top5(entries: impl Iterator<Item = (String, u64)>) -> Vec<(String, u64)> {
    let mut items: Vec<_> = entries.collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    items.truncate(5);
    items
}

/// Fixed-order human-readable summary: run_task, then agent_run, then
/// llm_call, each "by-X" breakdown truncated to its top 5 entries by volume.
pub fn format_summary(aggregation: &Aggregation) -> String {
    let mut out = String::new();

    out.push_str("=== run_task ===\n");
    out.push_str(&format!("total: {}\n", aggregation.run_task.count));
    for (status, count) in &aggregation.run_task.by_status {
        out.push_str(&format!("  {status}: {count}\n"));
    }
    out.push_str(&format!(
        "duration: total={:.2}s avg={:.2}s\n",
        aggregation.run_task.total_duration,
        aggregation.run_task.avg_duration()
    ));
    let by_agent_totals = aggregation
        .run_task
        .by_agent_status
        .iter()
        .map(|(agent, statuses)| (agent.clone(), statuses.values().sum::<u64>()));
    for (agent, count) in top5(by_agent_totals) {
        out.push_str(&format!("  agent {agent}: {count}\n"));
    }
    for error in aggregation.run_task.errors.iter().take(5) {
        out.push_str(&format!("  error: {error}\n"));
    }

    out.push_str("\n=== agent_run ===\n");
    out.push_str(&format!("total: {}\n", aggregation.agent_run.count));
    out.push_str(&format!(
        "duration: total={:.2}s avg={:.2}s\n",
        aggregation.agent_run.total_duration,
        aggregation.agent_run.avg_duration()
    ));
    let by_agent = aggregation.agent_run.by_agent.iter().map(|(agent, (count, _))| (agent.clone(), *count));
    for (agent, count) in top5(by_agent) {
        out.push_str(&format!("  agent {agent}: {count}\n"));
    }

    out.push_str("\n=== llm_call ===\n");
    out.push_str(&format!("total: {}\n", aggregation.llm_call.count));
    out.push_str(&format!(
        "tokens: prompt={} completion={} total={}\n",
        aggregation.llm_call.prompt_tokens, aggregation.llm_call.completion_tokens, aggregation.llm_call.total_tokens
    ));
    let by_model = aggregation.llm_call.by_model.iter().map(|(model, b)| (model.clone(), b.calls));
    for (model, calls) in top5(by_model) {
        out.push_str(&format!("  model {model}: {calls} calls\n"));
    }

    out
}
