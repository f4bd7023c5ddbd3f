//! Configuration constants.
//!
//! Defaults for thresholds, timeouts, and concurrency used throughout the scan.

/// Days of remaining validity below which a host is flagged as expiring soon.
pub const DEFAULT_THRESHOLD_DAYS: i64 = 45;

/// Port dialled for every ingress host unless overridden.
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Maximum concurrent host inspections.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Deadline for the whole scan in seconds.
/// Inspections still pending when it passes are reported as unreachable.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 300;
/// Upper bound on `--scan-timeout-secs` (one week).
pub const MAX_SCAN_TIMEOUT_SECS: u64 = 7 * 86_400;

// Network operation timeouts
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

// Retry strategy
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 10;
/// Upper bound on `--retries`; a single host never holds a worker for long.
pub const RETRY_MAX_ATTEMPTS: usize = 5;

/// Seconds in one day, used for whole-day remaining-validity arithmetic.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Timeout for alert and report deliveries over HTTP.
pub const SINK_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum alert deliveries in flight at once.
pub const DISPATCH_CONCURRENCY: usize = 8;
/// Budget for delivering every alert of one run.
pub const DISPATCH_TIMEOUT_SECS: u64 = 60;

/// Prometheus Pushgateway job name used by the metrics sink.
pub const PUSHGATEWAY_JOB: &str = "ingress_validator";

/// Process exit code when configuration, the ingress source, or TLS setup fails.
pub const EXIT_CODE_SETUP_FAILURE: i32 = 1;
/// Process exit code when `--fail-on` matches a completed report.
pub const EXIT_CODE_POLICY_TRIGGERED: i32 = 2;
