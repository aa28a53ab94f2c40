//! GuardScope Console
//!
//! Command-line front end over the library: tail the progress feed,
//! submit optimization jobs, run one-shot detection, check service
//! health. Long-running commands keep the stream open until Ctrl-C or
//! until the tracked run finishes.

use clap::{Args, Parser, Subcommand};
use guardscope::constants;
use guardscope::risk::{split_key, SAFE_CATEGORY};
use guardscope::{
    ApiClient, ApiConfig, ConnectionState, DetectResponse, Objective, OptimizationRequest,
    RetryPolicy, RunOutcome, RunTracker, StreamClient, StreamConfig, StreamEvent, StreamHandler,
    TcpTransport,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "guardscope",
    version,
    about = "Streaming console for prompt-safety evaluation jobs"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tail the job progress feed
    Watch(WatchArgs),
    /// Submit an optimization job and watch it to completion
    Submit(SubmitArgs),
    /// Score a prompt, or a prompt/response pair
    Detect(DetectArgs),
    /// Check evaluation service health
    Health(HealthArgs),
}

// ============================================================================
// ARGUMENTS
// ============================================================================

#[derive(Args, Debug, Clone)]
struct StreamOpts {
    /// Progress stream address (host:port)
    #[arg(
        long,
        env = "GUARDSCOPE_STREAM_ADDR",
        default_value = constants::DEFAULT_STREAM_ADDR
    )]
    addr: String,

    /// Delay between reconnect attempts (milliseconds)
    #[arg(
        long,
        env = "GUARDSCOPE_RECONNECT_DELAY_MS",
        default_value_t = constants::DEFAULT_RECONNECT_DELAY_MS
    )]
    reconnect_ms: u64,

    /// Give up after this many consecutive failed attempts (default: never)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Double the reconnect delay after each failed attempt, capped at 60s
    #[arg(long)]
    exponential_backoff: bool,

    /// Liveness probe interval (seconds)
    #[arg(
        long,
        env = "GUARDSCOPE_HEARTBEAT_INTERVAL",
        default_value_t = constants::DEFAULT_HEARTBEAT_INTERVAL
    )]
    heartbeat_secs: u64,

    /// Drop a session after this long with no inbound traffic (seconds)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

impl StreamOpts {
    fn to_config(&self) -> StreamConfig {
        let mut retry = if self.exponential_backoff {
            RetryPolicy::exponential(
                Duration::from_millis(self.reconnect_ms),
                Duration::from_secs(60),
            )
        } else {
            RetryPolicy::fixed(Duration::from_millis(self.reconnect_ms))
        };
        if let Some(n) = self.max_attempts {
            retry = retry.with_max_attempts(n);
        }

        StreamConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            retry,
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Args, Debug, Clone)]
struct ServerOpts {
    /// Evaluation service base URL
    #[arg(
        long,
        env = "GUARDSCOPE_SERVER_URL",
        default_value = constants::DEFAULT_SERVER_URL
    )]
    server: String,

    /// HTTP request timeout (seconds)
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl ServerOpts {
    fn to_client(&self) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: self.server.clone(),
            timeout_seconds: self.timeout_secs,
        })
    }
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Only track events carrying this run token, and exit once it finishes
    #[arg(long)]
    run_id: Option<Uuid>,

    #[command(flatten)]
    stream: StreamOpts,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// The behavior the optimizer should try to elicit
    intent: String,

    /// API key for the attacker model
    #[arg(long, env = "GUARDSCOPE_API_KEY")]
    api_key: String,

    /// Success criterion: goal1 (harmful answer, prompt passes detection),
    /// goal2 (prompt and answer both pass), goal3 (prompt detection only)
    #[arg(long, default_value = "goal1", value_parser = parse_objective)]
    objective: Objective,

    /// Attacker model name
    #[arg(long, default_value = constants::DEFAULT_MODEL_NAME)]
    model: String,

    /// Attacker model base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// API key for the downstream model (goal1/goal2)
    #[arg(long, env = "GUARDSCOPE_DOWNSTREAM_API_KEY")]
    downstream_api_key: Option<String>,

    /// Downstream model name (defaults to the attacker model)
    #[arg(long)]
    downstream_model: Option<String>,

    /// Downstream model base URL
    #[arg(long)]
    downstream_base_url: Option<String>,

    /// Iteration cap
    #[arg(long, default_value_t = constants::DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Candidates tested per iteration
    #[arg(long, default_value_t = constants::DEFAULT_CANDIDATES_PER_ITERATION)]
    candidates: u32,

    #[command(flatten)]
    server: ServerOpts,

    #[command(flatten)]
    stream: StreamOpts,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Prompt text to score
    #[arg(long)]
    prompt: String,

    /// Model response to score against the prompt
    #[arg(long)]
    response: Option<String>,

    /// Run the reasoning analysis instead of plain detection
    #[arg(long, requires = "response")]
    reasoning: bool,

    #[command(flatten)]
    server: ServerOpts,
}

#[derive(Args, Debug)]
struct HealthArgs {
    #[command(flatten)]
    server: ServerOpts,
}

fn parse_objective(s: &str) -> Result<Objective, String> {
    match s {
        "goal1" => Ok(Objective::Goal1),
        "goal2" => Ok(Objective::Goal2),
        "goal3" => Ok(Objective::Goal3),
        _ => Err(format!(
            "unknown objective '{}' (expected goal1, goal2 or goal3)",
            s
        )),
    }
}

// ============================================================================
// STREAM WIRING
// ============================================================================

/// Logs decoded events and feeds them into the shared tracker
struct ConsoleHandler {
    tracker: Arc<Mutex<RunTracker>>,
    finished: Arc<Notify>,
}

impl StreamHandler for ConsoleHandler {
    fn on_event(&mut self, event: StreamEvent) {
        match &event {
            StreamEvent::Progress { data } => {
                if let Some(reason) = &data.skipped {
                    log::info!(
                        "iter {:>3} cand {}: skipped ({})",
                        data.iteration,
                        data.candidate_index,
                        reason
                    );
                } else {
                    log::info!(
                        "iter {:>3} cand {}: score {:.3} (prompt safe {:.3})",
                        data.iteration,
                        data.candidate_index,
                        data.score,
                        data.prompt_safe_score
                    );
                }
            }
            StreamEvent::Result { data } => {
                if data.success {
                    log::info!("Run succeeded after {} iterations", data.iterations);
                } else {
                    log::warn!(
                        "Run failed after {} iterations: {}",
                        data.iterations,
                        data.message.as_deref().unwrap_or("no reason given")
                    );
                }
            }
            StreamEvent::Error { message } => {
                log::error!("Service error: {}", message);
            }
        }

        let mut tracker = self.tracker.lock();
        if tracker.observe(&event) && tracker.is_finished() {
            self.finished.notify_one();
        }
    }
}

fn open_stream(
    opts: &StreamOpts,
    tracker: Arc<Mutex<RunTracker>>,
) -> (StreamClient, Arc<Notify>) {
    let finished = Arc::new(Notify::new());
    let handler = ConsoleHandler {
        tracker,
        finished: finished.clone(),
    };

    log::info!("Watching progress feed at {}", opts.addr);
    let client = StreamClient::open_with(
        Arc::new(TcpTransport::new(opts.addr.clone())),
        opts.to_config(),
        handler,
    );
    (client, finished)
}

/// Block until Ctrl-C, reconnect exhaustion, or (optionally) the tracked
/// run finishing
async fn wait_for_stream(client: &StreamClient, finished: &Notify, exit_when_finished: bool) {
    let mut poll = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, closing stream");
                break;
            }
            _ = finished.notified(), if exit_when_finished => break,
            _ = poll.tick() => {
                if client.state() == ConnectionState::Closed {
                    log::warn!("Stream closed, no reconnects left");
                    break;
                }
            }
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

async fn cmd_watch(args: WatchArgs) -> anyhow::Result<()> {
    let tracker = Arc::new(Mutex::new(match args.run_id {
        Some(id) => RunTracker::for_run(id),
        None => RunTracker::new(),
    }));

    let (mut stream, finished) = open_stream(&args.stream, tracker.clone());
    wait_for_stream(&stream, &finished, args.run_id.is_some()).await;
    stream.close().await;

    print_summary(&tracker.lock());
    Ok(())
}

async fn cmd_submit(args: SubmitArgs) -> anyhow::Result<()> {
    let run_id = Uuid::new_v4();

    let mut request = OptimizationRequest::new(args.intent, args.api_key);
    request.objective = args.objective;
    request.model_name = args.model;
    request.base_url = args.base_url;
    request.downstream_api_key = args.downstream_api_key;
    request.downstream_model_name = args.downstream_model;
    request.downstream_base_url = args.downstream_base_url;
    request.max_iterations = args.max_iterations;
    request.candidates_per_iteration = args.candidates;
    request.run_id = Some(run_id);

    // The service rejects these later anyway; fail before opening anything
    if request.objective.needs_downstream() && request.downstream_api_key.is_none() {
        anyhow::bail!(
            "objective {} needs --downstream-api-key",
            request.objective.as_str()
        );
    }

    let tracker = Arc::new(Mutex::new(RunTracker::for_run(run_id)));

    // Attach to the feed first so no early events are missed
    let (mut stream, finished) = open_stream(&args.stream, tracker.clone());

    let api = args.server.to_client();
    let ack = match api.start_optimization(&request).await {
        Ok(ack) => ack,
        Err(e) => {
            stream.close().await;
            return Err(e.into());
        }
    };
    log::info!("Run {} submitted: {}", run_id, ack.message);

    wait_for_stream(&stream, &finished, true).await;
    stream.close().await;

    let tracker = tracker.lock();
    print_summary(&tracker);
    match tracker.outcome() {
        Some(RunOutcome::Failed { message }) => anyhow::bail!("run failed: {}", message),
        _ => Ok(()),
    }
}

async fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let api = args.server.to_client();

    let report = match (&args.response, args.reasoning) {
        (Some(response), true) => api.analyze_reasoning(&args.prompt, response).await?,
        (Some(response), false) => api.detect_response(&args.prompt, response).await?,
        (None, _) => api.detect_prompt(&args.prompt).await?,
    };

    print_report(&report);
    Ok(())
}

async fn cmd_health(args: HealthArgs) -> anyhow::Result<()> {
    let api = args.server.to_client();
    let health = api.health().await?;

    println!("Service:  {} ({})", api.base_url(), health.status);
    println!(
        "Detector: {}",
        if health.detector_loaded {
            "loaded"
        } else {
            "not loaded"
        }
    );
    println!("Streams:  {} active", health.active_ws_connections);
    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_summary(tracker: &RunTracker) {
    let stats = tracker.stats();

    println!();
    println!(
        "Candidates: {} received, {} evaluated, {} skipped",
        stats.received, stats.evaluated, stats.skipped
    );
    if let (Some(best), Some(avg)) = (stats.best_score, stats.avg_score) {
        println!("Scores:     best {:.3}, avg {:.3}", best, avg);
    }
    if let Some(iteration) = stats.last_iteration {
        println!("Iterations: {} reached", iteration);
    }

    match tracker.outcome() {
        Some(RunOutcome::Completed) => {
            if let Some(result) = tracker.result() {
                println!(
                    "Outcome:    success in {} iterations (score {:.3})",
                    result.iterations,
                    result.score.unwrap_or(0.0)
                );
                if let Some(prompt) = &result.jailbreak_prompt {
                    println!();
                    println!("Jailbreak prompt:");
                    println!("{}", prompt);
                }
                if let Some(response) = &result.final_response {
                    println!();
                    println!("Final response:");
                    println!("{}", response);
                }
            } else {
                println!("Outcome:    completed");
            }
        }
        Some(RunOutcome::Failed { message }) => {
            println!("Outcome:    failed ({})", message);
            if let Some(best) = tracker.result().and_then(|r| r.best_attempt.as_ref()) {
                println!();
                println!(
                    "Best attempt (iter {}, score {:.3}):",
                    best.iteration, best.score
                );
                println!("{}", best.candidate);
            }
        }
        None => println!("Outcome:    still running"),
    }
}

fn print_report(report: &DetectResponse) {
    match report.verdict() {
        Some(verdict) => {
            println!("Risk level: {}", verdict.level.as_str());
            if verdict.dominant_category == SAFE_CATEGORY {
                println!("Dominant:   none (safe baseline {:.3})", verdict.safe_score);
            } else {
                let (domain, subcategory) = split_key(&verdict.dominant_category);
                println!(
                    "Dominant:   {} / {} ({:.3})",
                    domain, subcategory, verdict.dominant_score
                );
                println!("Safe score: {:.3}", verdict.safe_score);
            }
        }
        None => println!("Risk level: unscored (service returned no scores)"),
    }

    let mut scored: Vec<(&str, f32)> = report
        .risk_score
        .iter()
        .map(|(key, &score)| (key.as_str(), score))
        .filter(|&(key, score)| key != SAFE_CATEGORY && score > 0.0)
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    if !scored.is_empty() {
        println!();
        println!("Category scores:");
        for (key, score) in scored {
            let (domain, subcategory) = split_key(key);
            println!("  {:>6.3}  {} / {}", score, domain, subcategory);
        }
    }

    if let Some(explanation) = &report.explanation {
        println!();
        println!("{}", explanation);
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::debug!("{} v{}", constants::APP_NAME, constants::APP_VERSION);

    let cli = Cli::parse();
    match cli.cmd {
        Command::Watch(args) => cmd_watch(args).await,
        Command::Submit(args) => cmd_submit(args).await,
        Command::Detect(args) => cmd_detect(args).await,
        Command::Health(args) => cmd_health(args).await,
    }
}
